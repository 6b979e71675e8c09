//! The bounded agent loop.
//!
//! ```text
//! THINKING ──final answer──▶ FINISHED
//!    │  ▲
//!    │  └──── OBSERVING ◀── ACTING
//!    │                        │
//!    ├──unparseable──▶ ABORTED ◀──limit reached──┘
//! ```
//!
//! The loop owns the tool-call counter. A run makes at most `limit` tool
//! calls and `limit + 1` reasoning calls, and [`BoundedAgent::run`] always
//! returns a result: failures become observations or a fallback answer.

use fieldhand_core::error::{LoopError, ToolError};
use fieldhand_core::message::Message;
use fieldhand_core::tool::ToolRegistry;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::engine::ReasoningEngine;
use crate::formatter::{ObservationSource, format_observation};
use crate::memory::ConversationMemory;
use crate::parser::{Decision, parse_step};
use crate::scratchpad::{Scratchpad, ScratchpadEntry};
use fieldhand_tools::DATA_VISUALIZER;

pub const DEFAULT_TOOL_CALL_LIMIT: usize = 10;

/// Answer when the model's output cannot be understood.
pub const PARSE_FAILURE_FALLBACK: &str =
    "I'm sorry, but I cannot figure out how to respond to your request.";

/// Answer when the tool-call budget runs out.
pub const TOOL_LIMIT_FALLBACK: &str =
    "I'm sorry, but I reached the limit of tool calls before finding an answer to your request.";

/// One entry in a run's step list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentStep {
    /// The model's reasoning before an action, cut at the `Action:` marker.
    Thought { text: String },
    /// A tool invocation and what it returned.
    Tool {
        tool: String,
        input: String,
        observation: String,
        display: String,
    },
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Finished,
    ToolLimitExceeded,
    ParseFailure,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRunResult {
    pub steps: Vec<AgentStep>,
    /// The model's answer, or a fallback message. Never empty.
    pub final_answer: String,
    pub outcome: RunOutcome,
    pub tool_calls: usize,
    /// The chart the Data Visualizer produced, if any.
    pub side_payload: Option<serde_json::Value>,
}

impl AgentRunResult {
    pub fn is_finished(&self) -> bool {
        self.outcome == RunOutcome::Finished
    }
}

/// Runs the ReAct loop over a fixed tool registry with a hard tool-call cap.
///
/// Holds no per-request state; one instance can serve concurrent runs.
pub struct BoundedAgent {
    engine: ReasoningEngine,
    tools: Arc<ToolRegistry>,
    tool_call_limit: usize,
}

impl BoundedAgent {
    pub fn new(engine: ReasoningEngine, tools: Arc<ToolRegistry>) -> Self {
        Self {
            engine,
            tools,
            tool_call_limit: DEFAULT_TOOL_CALL_LIMIT,
        }
    }

    /// Set the maximum number of tool calls per run.
    pub fn with_tool_call_limit(mut self, limit: usize) -> Self {
        self.tool_call_limit = limit;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn tool_call_limit(&self) -> usize {
        self.tool_call_limit
    }

    /// Answer `input` given prior conversation turns.
    pub async fn run(&self, input: &str, history: &[Message]) -> AgentRunResult {
        let memory = ConversationMemory::from_messages(history);
        let mut run = RunState::default();

        info!(
            model = %self.engine.model(),
            limit = self.tool_call_limit,
            history = memory.len(),
            "Agent run starting"
        );

        loop {
            run.iteration += 1;
            debug!(iteration = run.iteration, tool_calls = run.tool_calls, "Thinking");

            // THINKING
            let raw = match self
                .engine
                .next_step(&self.tools, &memory, input, &run.scratchpad)
                .await
            {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(iteration = run.iteration, error = %e, "Reasoning call failed");
                    return run.abort(LoopError::ParseFailure(e.to_string()));
                }
            };

            let step = match parse_step(&raw) {
                Ok(step) => step,
                Err(e) => {
                    warn!(iteration = run.iteration, error = %e, "Could not parse model output");
                    return run.abort(e);
                }
            };

            let (tool, tool_input) = match step.decision {
                Decision::FinalAnswer(answer) => return run.finish(answer),
                Decision::Action { tool, input } => (tool, input),
            };

            // ACTING
            if run.tool_calls >= self.tool_call_limit {
                warn!(limit = self.tool_call_limit, tool = %tool, "Tool call limit reached");
                return run.abort(LoopError::ToolLimitExceeded {
                    limit: self.tool_call_limit,
                });
            }
            run.tool_calls += 1;
            debug!(iteration = run.iteration, tool = %tool, "Dispatching tool");

            let (observation, source) = match self.tools.dispatch(&tool, &tool_input).await {
                Ok(observation) => (observation, ObservationSource::Tool(&tool)),
                Err(ToolError::NotFound(_)) => {
                    warn!(tool = %tool, "Model requested unknown tool");
                    (self.unknown_tool_observation(&tool), unknown_source(&tool))
                }
                Err(e) => {
                    let err = LoopError::from(e.clone());
                    warn!(tool = %tool, error = %err, "Tool failed");
                    (format!("Error: {e}"), ObservationSource::Tool(&tool))
                }
            };

            // OBSERVING
            let display = format_observation(source, &observation);
            run.observe(raw, step.thought, tool, tool_input, observation, display);
        }
    }

    fn unknown_tool_observation(&self, tool: &str) -> String {
        format!(
            "{tool} is not a valid tool, try one of [{}].",
            self.tools.names().join(", ")
        )
    }
}

fn unknown_source(tool: &str) -> ObservationSource<'static> {
    if tool.is_empty() || tool.eq_ignore_ascii_case("none") {
        ObservationSource::Undecided
    } else {
        ObservationSource::Unavailable
    }
}

#[derive(Default)]
struct RunState {
    iteration: usize,
    tool_calls: usize,
    scratchpad: Scratchpad,
    side_payload: Option<serde_json::Value>,
}

impl RunState {
    fn observe(
        &mut self,
        log: String,
        thought: String,
        tool: String,
        input: String,
        observation: String,
        display: String,
    ) {
        if tool == DATA_VISUALIZER {
            if let Some(chart) = chart_payload(&observation) {
                self.side_payload = Some(chart);
            }
        }

        self.scratchpad.push(ScratchpadEntry {
            log,
            thought,
            tool,
            tool_input: input,
            observation,
            display,
        });
    }

    fn finish(self, answer: String) -> AgentRunResult {
        info!(
            iterations = self.iteration,
            tool_calls = self.tool_calls,
            outcome = "finished",
            "Agent run complete"
        );
        self.into_result(answer, RunOutcome::Finished)
    }

    fn abort(self, reason: LoopError) -> AgentRunResult {
        let (outcome, answer) = match reason {
            LoopError::ToolLimitExceeded { .. } => {
                (RunOutcome::ToolLimitExceeded, TOOL_LIMIT_FALLBACK)
            }
            _ => (RunOutcome::ParseFailure, PARSE_FAILURE_FALLBACK),
        };
        info!(
            iterations = self.iteration,
            tool_calls = self.tool_calls,
            outcome = ?outcome,
            reason = %reason,
            "Agent run aborted"
        );
        self.into_result(answer.to_string(), outcome)
    }

    fn into_result(self, final_answer: String, outcome: RunOutcome) -> AgentRunResult {
        AgentRunResult {
            steps: steps_from(&self.scratchpad),
            final_answer,
            outcome,
            tool_calls: self.tool_calls,
            side_payload: self.side_payload,
        }
    }
}

/// Each action cycle becomes a Thought step followed by its Tool step.
fn steps_from(scratchpad: &Scratchpad) -> Vec<AgentStep> {
    scratchpad
        .entries()
        .iter()
        .flat_map(|entry| {
            [
                AgentStep::Thought {
                    text: entry.thought.clone(),
                },
                AgentStep::Tool {
                    tool: entry.tool.clone(),
                    input: entry.tool_input.clone(),
                    observation: entry.observation.clone(),
                    display: entry.display.clone(),
                },
            ]
        })
        .collect()
}

/// The visualizer's `{"chart": ...}` object, when the observation is one.
fn chart_payload(observation: &str) -> Option<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(observation).ok()?;
    value.get("chart")?.as_str()?;
    Some(value)
}
