//! The per-run scratchpad: every completed reasoning cycle, in order.
//!
//! Append-only and owned by a single run. It is re-serialized into every
//! prompt so the model sees its own earlier actions and observations.

use serde::Serialize;

/// One completed Thought → Action → Observation cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScratchpadEntry {
    /// The model's completion for this cycle, verbatim.
    pub log: String,
    /// The reasoning before the action, without any `Thought:` prefix.
    pub thought: String,
    pub tool: String,
    pub tool_input: String,
    /// What the model is shown next cycle.
    pub observation: String,
    /// What the transcript shows.
    pub display: String,
}

#[derive(Debug, Clone, Default)]
pub struct Scratchpad {
    entries: Vec<ScratchpadEntry>,
}

impl Scratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ScratchpadEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ScratchpadEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialized to continue the prompt's trailing `Thought:`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.log);
            out.push_str("\nObservation: ");
            out.push_str(&entry.observation);
            out.push_str("\nThought: ");
        }
        out
    }
}
