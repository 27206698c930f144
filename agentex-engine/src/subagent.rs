//! Sub-agent as tool: embeds a peer agent as a plain tool entry.
//!
//! Differs from [`crate::agent::Handoff`]: a handoff transfers control and
//! the parent loop terminates, while a sub-agent tool's result is fed back
//! to the parent loop, which continues.

use crate::result::AgentResult;
use crate::traits::Interact;
use agentex_context::AgenticContext;
use agentex_tool::{BoxFuture, Tool, ToolCallError};
use serde_json::Value;
use std::sync::Arc;

/// How much of the parent's context a sub-agent call inherits.
#[derive(Clone, Default)]
pub enum ContextSharingPolicy {
    /// The sub-agent starts from a fresh, empty context (the default).
    #[default]
    Fresh,
    /// The sub-agent's context inherits the parent's state map, but not
    /// its history.
    InheritState(std::collections::HashMap<String, Value>),
}

/// Adapts a peer [`Interact`] agent into a [`Tool`]: invoking it runs a
/// full `interact` on the peer and returns its output text to the caller.
pub struct AgentAsTool {
    name: String,
    description: String,
    target: Arc<dyn Interact>,
    context_sharing: ContextSharingPolicy,
}

impl AgentAsTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, target: Arc<dyn Interact>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            target,
            context_sharing: ContextSharingPolicy::Fresh,
        }
    }

    pub fn with_context_sharing(mut self, policy: ContextSharingPolicy) -> Self {
        self.context_sharing = policy;
        self
    }

    fn build_context(&self, input_text: String) -> AgenticContext {
        match &self.context_sharing {
            ContextSharingPolicy::Fresh => AgenticContext::with_user_text(input_text),
            ContextSharingPolicy::InheritState(state) => {
                let mut context = AgenticContext::with_user_text(input_text);
                for (key, value) in state {
                    context.set_state(key.clone(), value.clone());
                }
                context
            }
        }
    }
}

impl Tool for AgentAsTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        Some(&self.description)
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "input": { "type": "string" } },
            "required": ["input"],
        })
    }

    fn requires_confirmation(&self) -> bool {
        false
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<String, ToolCallError>> {
        Box::pin(async move {
            let input_text = arguments
                .get("input")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| arguments.to_string());
            let context = self.build_context(input_text);
            match self.target.interact(context).await {
                AgentResult::Success { output, .. } => Ok(output),
                AgentResult::Handoff { inner, .. } => match inner.output_text() {
                    Some(text) => Ok(text.to_string()),
                    None => Err(ToolCallError::Invoke(format!(
                        "sub-agent '{}' handed off without a final textual result",
                        self.name
                    ))),
                },
                AgentResult::Paused { .. } => Err(ToolCallError::Invoke(format!(
                    "sub-agent '{}' paused on a confirmation-required tool; sub-agent-as-tool does not support nested pause/resume",
                    self.name
                ))),
                AgentResult::Error { error, .. } => Err(ToolCallError::Invoke(error.to_string())),
            }
        })
    }
}
