use crate::tools::{ActionFailure, ActionOutcome, Tool, ToolContext, ToolInput};
use headless_chrome::Element;

const CLEAR_JS: &str = "function() { if ('value' in this) { this.value = ''; } return true; }";

/// Key sent after the text to submit the entry
const END_OF_ENTRY_KEY: &str = "Enter";

/// Types text into a field and submits it with Enter
#[derive(Default)]
pub struct TypeTool;

impl Tool for TypeTool {
    fn name(&self) -> &str {
        "type"
    }

    fn execute_on(&self, element: &Element<'_>, input: ToolInput<'_>, context: &ToolContext<'_>) -> ActionOutcome {
        let text = input
            .value
            .ok_or(ActionFailure::MissingValue(crate::tools::ActionKind::Type))?;

        // clearing is best effort
        if let Err(e) = element.call_js_fn(CLEAR_JS, vec![], false) {
            log::debug!("Could not clear element {}: {}", input.element_id, e);
        }

        element
            .type_into(text)
            .map_err(|e| ActionFailure::NotInteractable(e.to_string()))?;

        context
            .tab
            .press_key(END_OF_ENTRY_KEY)
            .map_err(|e| ActionFailure::Driver(e.to_string()))?;

        Ok(())
    }
}
