//! The Fieldhand agent: a bounded ReAct loop over the farm tools.
//!
//! 1. **Rehydrate** conversation memory from the caller's history
//! 2. **Think**: render the prompt and ask the model for the next step
//! 3. **Act**: dispatch the named tool, counting calls against the limit
//! 4. **Observe**: record the observation and loop back to 2
//!
//! The loop ends on a final answer, on output it cannot parse, or when the
//! tool-call limit is reached. [`transcript::project`] turns the result into
//! display text.

pub mod engine;
pub mod formatter;
pub mod memory;
pub mod parser;
pub mod prompt;
pub mod runner;
pub mod scratchpad;
pub mod transcript;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use engine::ReasoningEngine;
pub use formatter::{ObservationSource, format_observation};
pub use memory::ConversationMemory;
pub use parser::{Decision, ParsedStep, parse_step, trim_at_action};
pub use runner::{
    AgentRunResult, AgentStep, BoundedAgent, DEFAULT_TOOL_CALL_LIMIT, PARSE_FAILURE_FALLBACK,
    RunOutcome, TOOL_LIMIT_FALLBACK,
};
pub use scratchpad::{Scratchpad, ScratchpadEntry};
pub use transcript::{ChartAttachment, Transcript, project};
