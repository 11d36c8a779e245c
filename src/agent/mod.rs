//! The perceive, infer, validate, act loop.
//!
//! Each step captures the page, shows the model a normalized screenshot plus
//! the distilled listing, parses one action out of its reply, and applies it
//! only if the id is present in the listing the model was shown. Unparsable
//! replies, hallucinated ids and failed interactions each cost one step.

pub mod action;
pub mod config;
pub mod controller;
pub mod parser;
pub mod session;
pub mod trace;

pub use action::{ActionPrediction, AgentAction};
pub use config::{AgentConfig, DEFAULT_MAX_STEPS};
pub use controller::{Agent, AgentRun, StepEvent, StepReport};
pub use parser::extract_action;
pub use session::{AgentSession, FailureReason, SessionStatus, StopSignal, TaskOutcome};
pub use trace::TraceWriter;
