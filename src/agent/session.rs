use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Succeeded,
    Failed,
}

/// Why a run ended without success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Every step was used without the model declaring completion
    BudgetExhausted,
    /// The stop signal was raised between steps
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::BudgetExhausted => write!(f, "step budget exhausted"),
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How a run that did not error ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded { result: Option<String>, steps: u32 },
    Failed { reason: FailureReason, steps: u32 },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded { .. })
    }

    /// Steps consumed before the run ended
    pub fn steps(&self) -> u32 {
        match self {
            TaskOutcome::Succeeded { steps, .. } | TaskOutcome::Failed { steps, .. } => *steps,
        }
    }
}

/// Progress of one task, owned by the control loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSession {
    pub goal: String,

    /// 1-based step about to run, or the last step run once terminal
    pub current_step: u32,

    pub max_steps: u32,

    pub status: SessionStatus,
}

impl AgentSession {
    pub fn new(goal: impl Into<String>, max_steps: u32) -> Self {
        Self {
            goal: goal.into(),
            current_step: 1,
            max_steps,
            status: SessionStatus::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Whether the step just run was the last one the budget allows
    pub fn budget_spent(&self) -> bool {
        self.current_step >= self.max_steps
    }

    pub(crate) fn advance(&mut self) {
        self.current_step += 1;
    }

    pub(crate) fn succeed(&mut self) {
        self.status = SessionStatus::Succeeded;
    }

    pub(crate) fn fail(&mut self) {
        self.status = SessionStatus::Failed;
    }
}

/// Shared flag asking a run to stop at the next step boundary
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
