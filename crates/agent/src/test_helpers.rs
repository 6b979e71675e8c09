//! Shared test helpers: a scripted completion provider and stub tools.

use async_trait::async_trait;
use fieldhand_core::error::{ProviderError, ToolError};
use fieldhand_core::provider::{CompletionRequest, CompletionResponse, Provider, Usage};
use fieldhand_core::tool::{Tool, ToolRegistry};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns scripted completions in order, repeating the last one once the
/// script runs out. Records every request it receives.
pub struct ScriptedProvider {
    script: Vec<Result<String, ProviderError>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<&str>) -> Self {
        Self {
            script: script.into_iter().map(|s| Ok(s.to_string())).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            script: vec![Err(error)],
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let model = request.model.clone();
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        let idx = (requests.len() - 1).min(self.script.len().saturating_sub(1));

        let content = self
            .script
            .get(idx)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::NotConfigured("empty script".into())))?;
        Ok(CompletionResponse {
            content,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

/// How a stub tool answers.
pub enum StubBehavior {
    Echo,
    Fixed(String),
    Fail(String),
}

/// A tool that counts invocations and answers per its [`StubBehavior`].
pub struct StubTool {
    name: String,
    behavior: StubBehavior,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl StubTool {
    pub fn new(name: &str, behavior: StubBehavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "echoes its input"
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.to_string());
        match &self.behavior {
            StubBehavior::Echo => Ok(input.to_string()),
            StubBehavior::Fixed(out) => Ok(out.clone()),
            StubBehavior::Fail(reason) => Err(ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// A registry of echo tools with the given names.
pub fn echo_registry(names: &[&str]) -> ToolRegistry {
    let tools: Vec<Arc<dyn Tool>> = names
        .iter()
        .map(|n| StubTool::new(n, StubBehavior::Echo) as Arc<dyn Tool>)
        .collect();
    ToolRegistry::new(tools).unwrap()
}

/// A registry over the given stubs, in order.
pub fn registry_of(tools: &[Arc<StubTool>]) -> ToolRegistry {
    ToolRegistry::new(tools.iter().map(|t| t.clone() as Arc<dyn Tool>).collect()).unwrap()
}
