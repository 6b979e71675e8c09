//! SQL Executor: runs a query against the farm database and reports rows as
//! a literal list of tuples.

use async_trait::async_trait;
use fieldhand_core::capability::{QueryOutcome, SqlExecutor};
use fieldhand_core::error::ToolError;
use fieldhand_core::tool::Tool;
use std::sync::Arc;

use crate::SQL_EXECUTOR;
use crate::literal::rows_literal;

pub const NO_RESULTS: &str = "Query returned no results.";
pub const EXECUTED: &str = "Query executed successfully.";

pub struct SqlExecutorTool {
    executor: Arc<dyn SqlExecutor>,
}

impl SqlExecutorTool {
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Tool for SqlExecutorTool {
    fn name(&self) -> &str {
        SQL_EXECUTOR
    }

    fn description(&self) -> &str {
        "Executes provided SQL queries on the Crops and Wages tables and returns the results."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let outcome = self
            .executor
            .execute(input)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: SQL_EXECUTOR.into(),
                reason: e.to_string(),
            })?;

        Ok(match outcome {
            QueryOutcome::Rows { rows, .. } if rows.is_empty() => NO_RESULTS.to_string(),
            QueryOutcome::Rows { rows, .. } => rows_literal(&rows).to_string(),
            QueryOutcome::Affected { rows_affected } => {
                format!("{EXECUTED} Rows affected: {rows_affected}")
            }
        })
    }
}
