/// Build the instruction the model was fine-tuned on.
///
/// The wording is part of the model's input distribution; change it only
/// together with the model.
pub fn format_prompt(goal: &str, distilled_dom: &str) -> String {
    format!(
        "You are a web agent. Analyze the screenshot and the list of elements.\n\
         The element list is formatted as: [element_id] <Tag> Text (Attributes).\n\
         If the target element is not in the list, select ID 0 to scroll down on the page.\n\
         Your task is to select the correct Element ID to perform the chosen action on.\n\n\
         TASK: {goal}\n\n\
         ELEMENTS:\n{distilled_dom}\n\n\
         Generate a JSON with keys: action, element_id, value, is_finished. \
         The action chosen can be either 'click', 'type', or 'select'.\n\
         IMPORTANT: Set 'is_finished' to true ONLY when the task is fully completed \
         and you have reached the final goal state. Do not set it to true after intermediate steps."
    )
}
