//! Wires [`Agent`] into the [`Interact`] contract, and the convenience
//! entry points that accept raw inputs.

use crate::agent::Agent;
use crate::loop_impl::{interact_impl, resume_impl};
use crate::result::{AgentResult, StructuredResult};
use crate::traits::Interact;
use agentex_context::AgenticContext;
use agentex_core::{AgentError, ContentItem};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

#[async_trait]
impl Interact for Agent {
    async fn interact(&self, context: AgenticContext) -> AgentResult {
        interact_impl(self, context).await
    }

    async fn resume(&self, run_state: crate::result::AgentRunState) -> AgentResult {
        resume_impl(self, run_state).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Agent {
    /// Appends `text` as a user message to a fresh context, then runs it.
    pub async fn interact_text(&self, text: impl Into<String>) -> AgentResult {
        self.interact(AgenticContext::with_user_text(text)).await
    }

    /// Appends arbitrary content items (image/file/text) as a user
    /// message to a fresh context, then runs it.
    pub async fn interact_items(&self, items: Vec<ContentItem>) -> AgentResult {
        let mut context = AgenticContext::new();
        context.append_user_content(items);
        self.interact(context).await
    }

    /// Runs `interact` and decodes the parsed output into `T`, for agents
    /// configured with an `outputType` schema. A thin typed surface over
    /// the untyped engine — it does not
    /// change loop behavior, only how the terminal success is surfaced.
    pub async fn interact_structured<T: DeserializeOwned>(
        &self,
        context: AgenticContext,
    ) -> Result<StructuredResult<T>, AgentError> {
        let result = self.interact(context).await;
        match &result {
            AgentResult::Success { parsed: Some(value), .. } => {
                let parsed: T = serde_json::from_value(value.clone()).map_err(|e| AgentError::ParsingFailed {
                    message: e.to_string(),
                })?;
                Ok(StructuredResult { parsed, raw: result })
            }
            AgentResult::Success { parsed: None, .. } => Err(AgentError::ParsingFailed {
                message: format!("agent '{}' has no outputType configured", self.name),
            }),
            AgentResult::Error { error, .. } => Err(error.clone()),
            AgentResult::Handoff { .. } => Err(AgentError::Other {
                message: "interact_structured does not support handoff results".into(),
            }),
            AgentResult::Paused { .. } => Err(AgentError::Other {
                message: "interact_structured does not support paused results; call interact directly".into(),
            }),
        }
    }
}
