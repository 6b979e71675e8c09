//! The ReAct prompt sent to the completion model.
//!
//! The instructions are plain text and can be replaced from config. The
//! format block, tool catalog, history, question and scratchpad are always
//! appended in the same layout so the step parser can rely on it.

use fieldhand_core::tool::ToolRegistry;

use crate::memory::ConversationMemory;
use crate::scratchpad::Scratchpad;

/// Cuts the completion before the model invents its own observation.
pub const STOP_SEQUENCE: &str = "\nObservation:";

pub const ESTIMATION_WARNING: &str =
    "**WARNING: THIS RESPONSE IS NOT BASED ON DATA BUT RATHER AN ESTIMATION.**";

/// Default assistant instructions.
pub fn default_instructions() -> String {
    format!(
        "You are a precise AI assistant specializing in the analysis and modification of agricultural business data and weather information.
Your responses may influence important business decisions, so you always prioritize accuracy and base your answers on reliable data.
Your principles are:
1. Do not spread misinformation.
2. Be cautious with predictions when data is incomplete or uncertain.
3. Warn users if a response is based on general knowledge rather than verified data.

### Handling User Queries
- If the user's query is unrelated, conversational filler, or a simple greeting:
  1. Politely explain what you can assist with.
  2. Respond promptly without invoking any tools.
  3. Provide this response as your **Final Answer**.
- For relevant queries about crops, yield, employees, wages, or weather:
  1. Use the tools at your disposal to provide the most specific and accurate response.
  2. If no tool can help, inform the user politely about the limitations of your purpose.

### Important Instructions
- Do not attempt to engage in unrelated conversations. Politely redirect the user to relevant topics.
- Use tools whenever applicable to solve the user's query. Avoid guessing or relying solely on general knowledge.
- If you must provide a response based on general knowledge, begin your answer with:
  {ESTIMATION_WARNING}
- Keep responses concise and professional.
- If you have a response from the Data Visualizer tool, you have to proceed to the Final Answer."
    )
}

/// Assemble the full prompt for one reasoning call.
pub fn render_prompt(
    instructions: &str,
    tools: &ToolRegistry,
    memory: &ConversationMemory,
    input: &str,
    scratchpad: &Scratchpad,
) -> String {
    let tool_names = tools.names().join(", ");
    format!(
        "{instructions}

### Format for Responses
Always structure your response in the following format:

Question: the input question you must answer
Thought: think about the appropriate course of action
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (repeat Thought/Action/Action Input/Observation as needed)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

### Context
- Use context from the previous conversation to answer follow-up questions.
- Tools available to you:
{catalog}
- Previous conversation history:
{history}

Begin!

Question: {input}
Thought:{scratchpad}",
        instructions = instructions.trim_end(),
        catalog = tools.catalog(),
        history = memory.render(),
        scratchpad = scratchpad.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::echo_registry;
    use fieldhand_core::message::Message;

    #[test]
    fn instructions_cover_greetings_and_estimates() {
        let text = default_instructions();
        assert!(text.contains("simple greeting"));
        assert!(text.contains(ESTIMATION_WARNING));
        assert!(text.contains("Data Visualizer"));
    }

    #[test]
    fn prompt_layout() {
        let tools = echo_registry(&["SQL Executor", "Weather Checker"]);
        let memory = ConversationMemory::from_messages(&[
            Message::user("hi"),
            Message::assistant("hello"),
        ]);
        let prompt = render_prompt("Be helpful.", &tools, &memory, "How much wheat?", &Scratchpad::new());

        assert!(prompt.starts_with("Be helpful.\n\n### Format for Responses"));
        assert!(prompt.contains("should be one of [SQL Executor, Weather Checker]"));
        assert!(prompt.contains("SQL Executor: echoes its input"));
        assert!(prompt.contains("User: hi\nAssistant: hello"));
        assert!(prompt.ends_with("Question: How much wheat?\nThought:"));
    }
}
