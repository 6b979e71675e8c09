//! Projects a run result into display-ready transcript text.
//!
//! Read-only: projecting the same result twice gives the same transcript.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::path::Path;

use crate::parser::trim_at_action;
use crate::runner::{AgentRunResult, AgentStep};
use fieldhand_tools::DATA_VISUALIZER;

pub const CHART_FAILURE: &str = "Sadly, I couldn't generate bar chart :(((";

/// A chart attached to the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartAttachment {
    /// A `data:` URI ready to embed.
    Image { data_uri: String },
    /// The visualizer ran but its chart could not be loaded.
    Unavailable { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub steps: Vec<String>,
    pub final_answer: String,
    pub chart: Option<ChartAttachment>,
}

/// Project a run, loading chart images from the filesystem.
pub fn project(result: &AgentRunResult) -> Transcript {
    project_with(result, load_data_uri)
}

/// Project a run, resolving chart references with `resolve_chart`.
pub fn project_with(
    result: &AgentRunResult,
    resolve_chart: impl Fn(&str) -> Option<String>,
) -> Transcript {
    let mut steps = Vec::with_capacity(result.steps.len());
    let mut chart = None;

    for step in &result.steps {
        match step {
            AgentStep::Thought { text } => {
                steps.push(format!(" **Thinking...** {}", trim_at_action(text)));
            }
            AgentStep::Tool {
                tool,
                observation,
                display,
                ..
            } => {
                steps.push(format!(" **{tool} Tool:** {display}"));
                if tool == DATA_VISUALIZER {
                    let resolved = chart_path(observation).and_then(|p| resolve_chart(&p));
                    chart = Some(match resolved {
                        Some(data_uri) => ChartAttachment::Image { data_uri },
                        None => ChartAttachment::Unavailable {
                            message: CHART_FAILURE.to_string(),
                        },
                    });
                }
            }
        }
    }

    Transcript {
        steps,
        final_answer: result.final_answer.clone(),
        chart,
    }
}

fn chart_path(observation: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(observation).ok()?;
    value.get("chart")?.as_str().map(str::to_string)
}

/// Read an image file into a base64 `data:` URI.
pub fn load_data_uri(path: &str) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    let mime = match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => return None,
    };
    Some(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

impl Transcript {
    /// Numbered steps, then the final answer, then the chart if any.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for (idx, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("**{}.** {}\n\n", idx + 1, step.trim()));
        }
        out.push_str(&format!("**Final Answer:**\n\n{}", self.final_answer.trim()));
        match &self.chart {
            Some(ChartAttachment::Image { data_uri }) => {
                out.push_str(&format!("\n**Requested chart:**\n\n![Bar chart]({data_uri})"));
            }
            Some(ChartAttachment::Unavailable { message }) => {
                out.push_str(&format!("\n**Requested chart:**\n\n{message}"));
            }
            None => {}
        }
        out
    }
}
