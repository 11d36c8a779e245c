use crate::agent::action::ActionPrediction;
use regex::Regex;
use std::sync::LazyLock;

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("valid regex"));

/// First `{` through the last `}`
static BRACE_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)(\{.*\})").expect("valid regex"));

/// Pull an action out of raw model text.
///
/// Tries a fenced `json` block, then the widest brace span, then the whole
/// trimmed text. Returns `None` when nothing parses; never panics.
pub fn extract_action(raw: &str) -> Option<ActionPrediction> {
    capture(&FENCED_JSON, raw)
        .and_then(parse_payload)
        .or_else(|| capture(&BRACE_SPAN, raw).and_then(parse_payload))
        .or_else(|| parse_payload(raw.trim()))
}

fn capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

fn parse_payload(text: &str) -> Option<ActionPrediction> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => ActionPrediction::from_json(&value),
        Err(e) => {
            log::debug!("Candidate payload is not JSON ({}): {}", e, text);
            None
        }
    }
}
