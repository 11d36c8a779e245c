//! Element interactions: the only code that mutates the page on the model's behalf.
//!
//! Every tool validates its input before touching the DOM and reports failure as
//! an [`ActionFailure`] reason code instead of an error, so nothing raised by the
//! driver crosses into the agent loop.

pub mod click;
pub mod input;
pub mod select;
pub mod utils;

pub use click::ClickTool;
pub use input::TypeTool;
pub use select::SelectTool;

use crate::browser::stamped_selector;
use headless_chrome::{Element, Tab};
use std::fmt;
use std::sync::Arc;

/// What to do with a listed element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Click,
    Type,
    Select,
    /// Anything the model produced that is not an element interaction
    Other(String),
}

impl ActionKind {
    pub fn parse(action: &str) -> Self {
        match action.trim().to_ascii_lowercase().as_str() {
            "click" => ActionKind::Click,
            "type" => ActionKind::Type,
            "select" => ActionKind::Select,
            other => ActionKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Type => "type",
            ActionKind::Select => "select",
            ActionKind::Other(name) => name,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An interaction with a stamped element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementAction {
    pub kind: ActionKind,
    pub element_id: String,
    pub value: Option<String>,
}

impl ElementAction {
    pub fn new(kind: ActionKind, element_id: impl Into<String>) -> Self {
        Self {
            kind,
            element_id: element_id.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Non-empty value, if any
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }
}

/// Why an interaction was not performed or did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionFailure {
    /// The id is not an integer
    InvalidElementId(String),
    /// The id is larger than anything the last stamping pass assigned
    IdOutOfRange { id: u64, max_id: u32 },
    /// Not one of click/type/select
    UnsupportedAction(String),
    /// type/select without a value
    MissingValue(ActionKind),
    /// No element carries the stamped id
    ElementNotFound(String),
    /// The element exists but refused the interaction
    NotInteractable(String),
    /// No option matched the requested value
    OptionNotFound(String),
    /// Any other driver failure
    Driver(String),
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionFailure::InvalidElementId(id) => write!(f, "invalid element id '{}'", id),
            ActionFailure::IdOutOfRange { id, max_id } => {
                write!(f, "id {} exceeds max stamped id {}", id, max_id)
            }
            ActionFailure::UnsupportedAction(action) => {
                write!(f, "unsupported action '{}' (valid: click, type, select)", action)
            }
            ActionFailure::MissingValue(kind) => write!(f, "action '{}' requires a value", kind),
            ActionFailure::ElementNotFound(id) => write!(f, "element {} not found", id),
            ActionFailure::NotInteractable(reason) => write!(f, "element not interactable: {}", reason),
            ActionFailure::OptionNotFound(value) => write!(f, "no option matches '{}'", value),
            ActionFailure::Driver(reason) => write!(f, "driver failure: {}", reason),
        }
    }
}

/// Success, or the reason the interaction did not happen
pub type ActionOutcome = std::result::Result<(), ActionFailure>;

/// Validated input handed to a tool
#[derive(Debug, Clone, Copy)]
pub struct ToolInput<'a> {
    pub element_id: &'a str,
    pub value: Option<&'a str>,
}

/// Shared state for tool execution
pub struct ToolContext<'a> {
    /// Active tab
    pub tab: &'a Arc<Tab>,

    /// Highest id assigned by the most recent stamping pass
    pub max_id: u32,
}

impl<'a> ToolContext<'a> {
    pub fn new(tab: &'a Arc<Tab>, max_id: u32) -> Self {
        Self { tab, max_id }
    }

    /// Locate a stamped element by id
    pub fn find(&self, element_id: &str) -> std::result::Result<Element<'a>, ActionFailure> {
        self.tab
            .find_element(&stamped_selector(element_id))
            .map_err(|e| {
                log::debug!("Lookup of element {} failed: {}", element_id, e);
                ActionFailure::ElementNotFound(element_id.to_string())
            })
    }
}

/// An element interaction
pub trait Tool {
    fn name(&self) -> &str;

    /// Perform the interaction on an element that has already been scrolled into view.
    fn execute_on(&self, element: &Element<'_>, input: ToolInput<'_>, context: &ToolContext<'_>) -> ActionOutcome;
}

/// Check an action against the contract before any driver call.
pub fn validate(action: &ElementAction, max_id: u32) -> ActionOutcome {
    let id: u64 = action
        .element_id
        .trim()
        .parse()
        .map_err(|_| ActionFailure::InvalidElementId(action.element_id.clone()))?;

    if id > u64::from(max_id) {
        return Err(ActionFailure::IdOutOfRange { id, max_id });
    }

    match action.kind {
        ActionKind::Click => Ok(()),
        ActionKind::Type | ActionKind::Select => match action.value() {
            Some(_) => Ok(()),
            None => Err(ActionFailure::MissingValue(action.kind.clone())),
        },
        ActionKind::Other(ref name) => Err(ActionFailure::UnsupportedAction(name.clone())),
    }
}

/// Pick the tool for a validated action kind.
pub fn tool_for(kind: &ActionKind) -> Option<&'static dyn Tool> {
    match kind {
        ActionKind::Click => Some(&ClickTool),
        ActionKind::Type => Some(&TypeTool),
        ActionKind::Select => Some(&SelectTool),
        ActionKind::Other(_) => None,
    }
}
