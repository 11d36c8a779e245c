use crate::dom::SENTINEL_ID;
use crate::tools::{ActionKind, ElementAction};
use serde_json::Value;

/// Id strings models emit when they mean "nothing"
const NULLISH_IDS: [&str; 4] = ["none", "null", "nan", "undefined"];

/// The model's answer for one step, as parsed from its JSON payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPrediction {
    /// Lower-cased action name; may be outside click/type/select/scroll/finish
    pub action: String,

    /// Numeric id or the sentinel `"0"`
    pub element_id: String,

    pub value: Option<String>,

    pub is_finished: bool,
}

impl ActionPrediction {
    /// Read a prediction from a non-empty JSON object; anything else is unusable
    pub fn from_json(payload: &Value) -> Option<Self> {
        let object = payload.as_object().filter(|object| !object.is_empty())?;

        let action = match object.get("action") {
            Some(Value::String(action)) => action.trim().to_lowercase(),
            _ => String::new(),
        };

        Some(Self {
            action,
            element_id: normalize_element_id(object.get("element_id")),
            value: object.get("value").and_then(scalar_to_string),
            is_finished: object.get("is_finished").is_some_and(truthy),
        })
    }

    /// Resolve into the variant the loop dispatches on.
    ///
    /// Completion wins over everything; the sentinel id or an explicit scroll
    /// wins over element interactions.
    pub fn into_action(self) -> AgentAction {
        if self.is_finished {
            return AgentAction::Finish { result: self.value };
        }

        if self.element_id == SENTINEL_ID.to_string() || self.action == "scroll" {
            return AgentAction::Scroll;
        }

        AgentAction::Interact(ElementAction {
            kind: ActionKind::parse(&self.action),
            element_id: self.element_id,
            value: self.value,
        })
    }
}

/// What the loop does with a prediction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentAction {
    /// The model declared the task complete
    Finish { result: Option<String> },
    /// The target is not listed; reveal more of the page
    Scroll,
    /// Interact with a listed element, subject to validation
    Interact(ElementAction),
}

fn normalize_element_id(raw: Option<&Value>) -> String {
    let id = match raw {
        None | Some(Value::Null) => return SENTINEL_ID.to_string(),
        Some(Value::String(id)) => id.trim().to_string(),
        Some(other) => other.to_string(),
    };

    if NULLISH_IDS.contains(&id.to_lowercase().as_str()) {
        SENTINEL_ID.to_string()
    } else {
        id
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}
