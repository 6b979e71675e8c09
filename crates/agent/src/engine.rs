//! The reasoning engine: one completion call per reasoning step.

use fieldhand_core::error::ProviderError;
use fieldhand_core::provider::{CompletionRequest, Provider};
use fieldhand_core::tool::ToolRegistry;
use std::sync::Arc;
use tracing::debug;

use crate::memory::ConversationMemory;
use crate::prompt::{self, STOP_SEQUENCE};
use crate::scratchpad::Scratchpad;

pub struct ReasoningEngine {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    instructions: String,
}

impl ReasoningEngine {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            instructions: prompt::default_instructions(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Replace the assistant instructions that head the prompt.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for the next step. Returns the raw completion text,
    /// cut at the first `Observation:` the model may have invented.
    pub async fn next_step(
        &self,
        tools: &ToolRegistry,
        memory: &ConversationMemory,
        input: &str,
        scratchpad: &Scratchpad,
    ) -> Result<String, ProviderError> {
        let prompt = prompt::render_prompt(&self.instructions, tools, memory, input, scratchpad);

        let mut request = CompletionRequest::new(&self.model, prompt);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        request.stop = vec![STOP_SEQUENCE.to_string()];

        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Reasoning step complete"
            );
        }

        let mut text = response.content;
        if let Some(idx) = text.find(STOP_SEQUENCE) {
            text.truncate(idx);
        }
        Ok(text)
    }
}
