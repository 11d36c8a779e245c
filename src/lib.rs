//! # groundhog
//!
//! A browser agent driven by a vision-language model over the Chrome DevTools Protocol (CDP).
//!
//! ## Features
//!
//! - **Page Distillation**: Stamp every element with an id, then reduce the page to a compact
//!   listing of visible, actionable elements the model can point at
//! - **Screenshot Normalization**: Resize and crop screenshots into the framing the model was trained on
//! - **Model Client**: Call an OpenAI-compatible vision endpoint with an image and a prompt
//! - **Validated Actions**: An action runs only if its id is in the listing the model was shown
//!
//! ## Command Line
//!
//! ```bash
//! # Watch the agent work in a visible browser
//! cargo run -- --goal "Find the pricing page" --url example.com
//!
//! # Headless, closing Chrome when done
//! cargo run -- --goal "Search for rust" --url duckduckgo.com --headless --auto-close
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use groundhog::{Agent, AgentConfig, BrowserSession, LaunchOptions, ModelConfig, ModelHandle, VisionModelClient};
//!
//! # fn main() -> groundhog::Result<()> {
//! // Load the model once and share it
//! let model = ModelHandle::new(VisionModelClient::new(ModelConfig::from_env()?)?);
//!
//! let mut session = BrowserSession::launch(LaunchOptions::default().headless(true))?;
//! let mut agent = Agent::new(&mut session, &model, AgentConfig::default());
//!
//! let outcome = agent.run_task("Find the pricing page", "example.com")?;
//! println!("Finished in {} steps: {:?}", outcome.steps(), outcome);
//! # Ok(())
//! # }
//! ```
//!
//! ### Watching Step by Step
//!
//! ```rust,no_run
//! # use groundhog::{Agent, AgentConfig, BrowserSession, LaunchOptions, ModelConfig, ModelHandle, VisionModelClient};
//! # fn main() -> groundhog::Result<()> {
//! # let model = ModelHandle::new(VisionModelClient::new(ModelConfig::from_env()?)?);
//! # let mut session = BrowserSession::launch(LaunchOptions::default())?;
//! let mut agent = Agent::new(&mut session, &model, AgentConfig::default().max_steps(5));
//!
//! for report in agent.start("Open the docs", "example.com")? {
//!     let report = report?;
//!     println!("step {}: {}", report.step, report.log);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`agent`]: The control loop, response parser, sessions and debug traces
//! - [`browser`]: Browser session management, stamping and the [`PageDriver`] surface
//! - [`dom`]: Listing distillation, valid-id maps and the prompt template
//! - [`model`]: The [`ActionModel`] boundary and the HTTP vision client
//! - [`tools`]: Click, type and select, with validation and reason codes
//! - [`vision`]: Screenshot normalization
//! - [`error`]: Error types and result aliases

pub mod agent;
pub mod browser;
pub mod dom;
pub mod error;
pub mod model;
pub mod tools;
pub mod vision;

pub use agent::{Agent, AgentConfig, AgentRun, StepReport, StopSignal, TaskOutcome, extract_action};
pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions, PageDriver, SettleDelays};
pub use dom::{DistilledDom, DomDistiller, ListedIds, distill, format_prompt};
pub use error::{AgentError, Result};
pub use model::{ActionModel, ModelConfig, ModelHandle, VisionModelClient};
pub use tools::{ActionFailure, ActionKind, ActionOutcome, ElementAction};
pub use vision::ImageNormalizer;
