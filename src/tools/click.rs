use crate::tools::{ActionFailure, ActionOutcome, Tool, ToolContext, ToolInput};
use headless_chrome::Element;

/// Script-driven click that bypasses overlays and pointer interception
pub(crate) const FORCE_CLICK_JS: &str = "function() { this.click(); return true; }";

/// Clicks an element, falling back to a forced click
#[derive(Default)]
pub struct ClickTool;

impl Tool for ClickTool {
    fn name(&self) -> &str {
        "click"
    }

    fn execute_on(&self, element: &Element<'_>, input: ToolInput<'_>, _context: &ToolContext<'_>) -> ActionOutcome {
        click_with_fallback(element, input.element_id)
    }
}

/// Standard click first; a forced click when the interactive one throws.
pub(crate) fn click_with_fallback(element: &Element<'_>, element_id: &str) -> ActionOutcome {
    if let Err(e) = element.click() {
        log::warn!(
            "Standard click failed on {} ({}). Attempting forced click...",
            element_id,
            e
        );
        element
            .call_js_fn(FORCE_CLICK_JS, vec![], false)
            .map_err(|e| ActionFailure::NotInteractable(e.to_string()))?;
    }
    Ok(())
}
