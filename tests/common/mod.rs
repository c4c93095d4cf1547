//! Deterministic stub model and capability layer shared by the
//! integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use blueprint::domain::models::config::{ModelConfig, RunConfig};
use blueprint::domain::models::conversation::{AssistantTurn, MessageEntry, ToolCall};
use blueprint::domain::ports::capability::{Capability, CapabilityError, CapabilityRegistry};
use blueprint::domain::ports::model_client::{CompletionRequest, ModelClient, ModelError};

pub type Reply = Result<AssistantTurn, ModelError>;
type DynamicHandler = Box<dyn Fn(&CompletionRequest) -> Reply + Send + Sync>;

/// Which pipeline stage a completion request came from, inferred from the
/// request shape. Routing by stage keeps scripted replies deterministic
/// even when analyzer units run concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Clarify,
    Brief,
    Plan,
    Think,
    Compress,
    Synthesize,
}

pub fn classify_request(request: &CompletionRequest) -> Role {
    if request
        .tools
        .iter()
        .any(|tool| tool.name == "AnalyzeRepository")
    {
        return Role::Plan;
    }
    if !request.tools.is_empty() {
        return Role::Think;
    }

    if let Some(MessageEntry::Human(text)) = request.history.entries().last() {
        if text.starts_with("All above messages") {
            return Role::Compress;
        }
        if text.contains("need_clarification") {
            return Role::Clarify;
        }
        if text.contains("\"repo_url\"") {
            return Role::Brief;
        }
    }
    Role::Synthesize
}

/// Scripted model client.
///
/// Each role has a FIFO queue of replies; when a queue runs dry, an
/// optional dynamic handler answers, then a deterministic default. Every
/// request is recorded with its classified role.
#[derive(Default)]
pub struct StubModel {
    scripts: Mutex<HashMap<Role, VecDeque<Reply>>>,
    dynamic: HashMap<Role, DynamicHandler>,
    log: Mutex<Vec<(Role, CompletionRequest)>>,
}

impl StubModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue replies for one role, in order.
    pub fn script(mut self, role: Role, replies: Vec<Reply>) -> Self {
        self.scripts
            .get_mut()
            .unwrap()
            .entry(role)
            .or_default()
            .extend(replies);
        self
    }

    /// Install a fallback handler for one role.
    pub fn dynamic(
        mut self,
        role: Role,
        handler: impl Fn(&CompletionRequest) -> Reply + Send + Sync + 'static,
    ) -> Self {
        self.dynamic.insert(role, Box::new(handler));
        self
    }

    pub fn requests(&self, role: Role) -> Vec<CompletionRequest> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(entry_role, _)| *entry_role == role)
            .map(|(_, request)| request.clone())
            .collect()
    }

    pub fn call_count(&self, role: Role) -> usize {
        self.requests(role).len()
    }

    fn default_reply(role: Role, request: &CompletionRequest) -> Reply {
        match role {
            Role::Clarify => Ok(AssistantTurn::text(
                json!({
                    "need_clarification": false,
                    "question": "",
                    "verification": "Starting the repository analysis now."
                })
                .to_string(),
            )),
            Role::Brief => Ok(AssistantTurn::text(
                json!({
                    "repo_url": "https://github.com/acme/widgets",
                    "design_brief": "Design the requested feature end to end."
                })
                .to_string(),
            )),
            Role::Plan => Ok(turn_with_calls(vec![complete_call("done")])),
            Role::Think => Ok(AssistantTurn::text("nothing further to inspect")),
            Role::Compress => {
                // Echo the topic so note ordering is observable in tests.
                let topic = request
                    .history
                    .entries()
                    .iter()
                    .find_map(|entry| match entry {
                        MessageEntry::Human(text) => Some(text.clone()),
                        _ => None,
                    })
                    .unwrap_or_default();
                Ok(AssistantTurn::text(format!("compressed: {topic}")))
            }
            Role::Synthesize => Ok(AssistantTurn::text("# Design Document\n\nstub synthesis")),
        }
    }
}

#[async_trait]
impl ModelClient for StubModel {
    async fn complete(&self, request: CompletionRequest) -> Result<AssistantTurn, ModelError> {
        let role = classify_request(&request);
        self.log.lock().unwrap().push((role, request.clone()));

        if let Some(reply) = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&role)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        if let Some(handler) = self.dynamic.get(&role) {
            return handler(&request);
        }
        Self::default_reply(role, &request)
    }
}

/// A capability that always returns the same report.
pub struct StaticCapability {
    pub name: String,
    pub reply: String,
}

#[async_trait]
impl Capability for StaticCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Inspect the repository."
    }

    async fn invoke(&self, _args: serde_json::Value) -> Result<String, CapabilityError> {
        Ok(self.reply.clone())
    }
}

/// A capability that always fails.
pub struct FailingCapability {
    pub name: String,
    pub message: String,
}

#[async_trait]
impl Capability for FailingCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Always raises."
    }

    async fn invoke(&self, _args: serde_json::Value) -> Result<String, CapabilityError> {
        Err(CapabilityError::Invocation(self.message.clone()))
    }
}

/// Registry with one static analysis capability.
pub fn stub_registry() -> CapabilityRegistry {
    CapabilityRegistry::with_capabilities(vec![Arc::new(StaticCapability {
        name: "inspect_repository".to_string(),
        reply: "three modules, one binary".to_string(),
    })])
}

/// A small, fast configuration for tests.
pub fn test_config() -> RunConfig {
    RunConfig {
        max_structured_output_retries: 2,
        allow_clarification: false,
        max_concurrent_analysis_units: 3,
        max_supervisor_iterations: 5,
        max_unit_tool_calls: 2,
        analysis_model: ModelConfig {
            id: "anthropic:claude-sonnet-4".to_string(),
            max_output_tokens: 1_000,
        },
        compression_model: ModelConfig {
            id: "anthropic:claude-3-5-haiku".to_string(),
            max_output_tokens: 1_000,
        },
        synthesis_model: ModelConfig {
            id: "anthropic:claude-sonnet-4".to_string(),
            max_output_tokens: 1_000,
        },
        ..RunConfig::default()
    }
}

pub fn context_limit_error(model: &str) -> ModelError {
    ModelError::ContextLimitExceeded {
        model: model.to_string(),
        message: "prompt is too long".to_string(),
    }
}

pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

pub fn analyze_call(id: &str, topic: &str) -> ToolCall {
    tool_call(id, "AnalyzeRepository", json!({ "analysis_topic": topic }))
}

pub fn complete_call(id: &str) -> ToolCall {
    tool_call(id, "AnalysisComplete", json!({}))
}

pub fn turn_with_calls(calls: Vec<ToolCall>) -> AssistantTurn {
    AssistantTurn {
        content: String::new(),
        tool_calls: calls,
    }
}
