use crate::tools::click::click_with_fallback;
use crate::tools::{ActionFailure, ActionKind, ActionOutcome, Tool, ToolContext, ToolInput};
use headless_chrome::Element;

/// Picks an option on a native `<select>`: visible text, then value, then a
/// numeric index. Reports `not-select` for anything else.
const SELECT_OPTION_JS: &str = r#"
function(wanted) {
    if (this.tagName.toLowerCase() !== 'select') {
        return 'not-select';
    }
    const options = Array.from(this.options);
    let index = options.findIndex(o => o.text.trim() === wanted.trim());
    if (index < 0) {
        index = options.findIndex(o => o.value === wanted);
    }
    if (index < 0 && /^\d+$/.test(wanted)) {
        const position = parseInt(wanted, 10);
        if (position < options.length) {
            index = position;
        }
    }
    if (index < 0) {
        return 'no-match';
    }
    this.selectedIndex = index;
    this.dispatchEvent(new Event('input', { bubbles: true }));
    this.dispatchEvent(new Event('change', { bubbles: true }));
    return 'selected';
}
"#;

#[derive(Debug, PartialEq, Eq)]
enum SelectResult {
    Selected,
    NoMatch,
    NotSelect,
}

impl SelectResult {
    fn from_script(value: Option<&serde_json::Value>) -> Option<Self> {
        match value.and_then(|v| v.as_str()) {
            Some("selected") => Some(SelectResult::Selected),
            Some("no-match") => Some(SelectResult::NoMatch),
            Some("not-select") => Some(SelectResult::NotSelect),
            _ => None,
        }
    }
}

/// Chooses an option, or opens a custom dropdown with a click
#[derive(Default)]
pub struct SelectTool;

impl Tool for SelectTool {
    fn name(&self) -> &str {
        "select"
    }

    fn execute_on(&self, element: &Element<'_>, input: ToolInput<'_>, _context: &ToolContext<'_>) -> ActionOutcome {
        let wanted = input.value.ok_or(ActionFailure::MissingValue(ActionKind::Select))?;

        let result = element
            .call_js_fn(SELECT_OPTION_JS, vec![serde_json::json!(wanted)], false)
            .map_err(|e| ActionFailure::Driver(e.to_string()))?;

        match SelectResult::from_script(result.value.as_ref()) {
            Some(SelectResult::Selected) => Ok(()),
            Some(SelectResult::NoMatch) => Err(ActionFailure::OptionNotFound(wanted.to_string())),
            Some(SelectResult::NotSelect) => {
                // custom dropdown: open it, the option is clicked on a later step
                log::info!("Element {} is not a native select, clicking it instead", input.element_id);
                click_with_fallback(element, input.element_id)
            }
            None => Err(ActionFailure::Driver(format!(
                "unexpected select script result: {:?}",
                result.value
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_tool_name() {
        assert_eq!(SelectTool.name(), "select");
    }

    #[test]
    fn test_select_result_parsing() {
        assert_eq!(SelectResult::from_script(Some(&json!("selected"))), Some(SelectResult::Selected));
        assert_eq!(SelectResult::from_script(Some(&json!("no-match"))), Some(SelectResult::NoMatch));
        assert_eq!(SelectResult::from_script(Some(&json!("not-select"))), Some(SelectResult::NotSelect));
        assert_eq!(SelectResult::from_script(Some(&json!(true))), None);
        assert_eq!(SelectResult::from_script(None), None);
    }

    #[test]
    fn test_match_order_in_script() {
        let text = SELECT_OPTION_JS.find("o.text.trim()").unwrap();
        let value = SELECT_OPTION_JS.find("o.value === wanted").unwrap();
        let index = SELECT_OPTION_JS.find("parseInt(wanted, 10)").unwrap();
        assert!(text < value && value < index);
    }
}
