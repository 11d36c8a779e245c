use crate::dom::DEFAULT_MAX_ELEMENTS;
use std::path::PathBuf;
use std::time::Duration;

/// Step budget used when the caller does not pick one
pub const DEFAULT_MAX_STEPS: u32 = 15;

/// Options for one agent run
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Inference calls allowed before the run fails
    pub max_steps: u32,

    /// Listing length cap, sentinel included
    pub max_elements: usize,

    /// Base directory for debug traces; `None` disables them
    pub trace_dir: Option<PathBuf>,

    /// Wait after a scroll before the next capture
    pub scroll_settle: Duration,

    /// Wait after an executed action, successful or not
    pub action_settle: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_elements: DEFAULT_MAX_ELEMENTS,
            trace_dir: None,
            scroll_settle: Duration::from_secs(2),
            action_settle: Duration::from_secs(2),
        }
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    pub fn trace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.trace_dir = Some(dir.into());
        self
    }

    /// Skip the loop's settle waits
    pub fn without_settling(mut self) -> Self {
        self.scroll_settle = Duration::ZERO;
        self.action_settle = Duration::ZERO;
        self
    }
}
