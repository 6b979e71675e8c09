//! SQL Query Generator: turns an instruction into a SQLite query with a
//! dedicated completion call.

use async_trait::async_trait;
use fieldhand_core::error::ToolError;
use fieldhand_core::provider::{CompletionRequest, Provider};
use fieldhand_core::tool::Tool;
use std::sync::Arc;
use tracing::debug;

use crate::SQL_QUERY_GENERATOR;

pub struct SqlQueryGeneratorTool {
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: Option<u32>,
}

impl SqlQueryGeneratorTool {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// The schema-describing prompt for one instruction.
pub fn generation_prompt(instruction: &str) -> String {
    format!(
        "You are an SQL assistant. Generate a valid SQLite query based on the user's instruction.\n\n\
         Available tables and columns:\n\
         - Crops: crop_name (TEXT), year (INTEGER), month (TEXT), yield_amount (REAL), target (REAL)\n\
         - Wages: employee_name (TEXT), wage (REAL), year (INTEGER), month (TEXT), time_worked (REAL)\n\n\
         Key Notes:\n\
         - Always format 'month' as a capitalized string (e.g., 'July').\n\
         - The year is an INTEGER.\n\
         - Ensure SQLite compatibility. Do not use unsupported syntax.\n\
         - Do not include semicolons or stray quotation marks.\n\n\
         Instruction: {instruction}\n\nSQL Query:"
    )
}

/// Remove a Markdown code fence (```sql ... ```) around the query, if any.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the info string (`sql`) on the opening line.
    let body = match body.find('\n') {
        Some(idx) => &body[idx + 1..],
        None => body,
    };
    body.trim_end().trim_end_matches("```").trim().to_string()
}

#[async_trait]
impl Tool for SqlQueryGeneratorTool {
    fn name(&self) -> &str {
        SQL_QUERY_GENERATOR
    }

    fn description(&self) -> &str {
        "Generates SQL queries for the Crops (with their yields) and Wages (from years 2022 - 2024 \
         for employees) tables based on natural language instructions. Wages are in PLN"
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let instruction = input.trim();
        if instruction.is_empty() {
            return Err(ToolError::InvalidArguments(
                "Describe the data you need in plain words".into(),
            ));
        }

        let mut request = CompletionRequest::new(&self.model, generation_prompt(instruction));
        request.max_tokens = self.max_tokens;

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: SQL_QUERY_GENERATOR.into(),
                reason: e.to_string(),
            })?;

        let query = strip_code_fence(&response.content);
        debug!(query = %query, "Generated SQL");
        Ok(query)
    }
}
