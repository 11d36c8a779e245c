use thiserror::Error;

/// Errors that abort an agent run.
///
/// Per-step problems (unparsable model output, hallucinated ids, failed
/// interactions) never surface here; see [`crate::tools::ActionFailure`].
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Page stamping failed: {0}")]
    StampFailed(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Image processing failed: {0}")]
    ImageFailed(#[from] image::ImageError),

    #[error("Model request failed: {0}")]
    ModelRequestFailed(String),

    #[error("Model returned an unexpected response: {0}")]
    ModelResponseInvalid(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Trace write failed: {0}")]
    TraceFailed(#[from] std::io::Error),

    #[error("Run ended without an outcome")]
    RunAborted,
}

pub type Result<T> = std::result::Result<T, AgentError>;
