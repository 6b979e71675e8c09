//! Tool trait: the abstraction over agent capabilities.
//!
//! A tool is a named capability the model can invoke with a single line of
//! text, producing a text observation: generate SQL, run it, chart it, or
//! look up the weather.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use crate::error::ToolError;

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool, as the model must spell it.
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// Invoke the tool with the raw `Action Input` text.
    async fn invoke(&self, input: &str) -> std::result::Result<String, ToolError>;
}

/// An immutable, insertion-ordered set of tools.
///
/// Names are validated unique when the registry is built. After that the
/// registry is read-only and can be shared across concurrent runs.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry from tools in catalog order.
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> std::result::Result<Self, ToolError> {
        let mut index = HashMap::with_capacity(tools.len());
        for (i, tool) in tools.iter().enumerate() {
            if index.insert(tool.name().to_string(), i).is_some() {
                return Err(ToolError::DuplicateName(tool.name().to_string()));
            }
        }
        Ok(Self { tools, index })
    }

    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// All tools in registration order.
    pub fn list(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Get a tool by exact (case-sensitive) name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// List all registered tool names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// The `name: description` catalog shown to the model.
    pub fn catalog(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Dispatch an invocation by name.
    pub async fn dispatch(&self, name: &str, input: &str) -> std::result::Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.invoke(input).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::empty()
    }
}
