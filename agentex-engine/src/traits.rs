//! The engine's public contract, implemented by [`crate::agent::Agent`]
//! and consumed wherever a peer agent needs to be invoked polymorphically
//! (handoff targets, sub-agent-as-tool, router routes, parallel fan-out).

use crate::result::{AgentResult, AgentRunState};
use agentex_context::AgenticContext;
use async_trait::async_trait;

#[async_trait]
pub trait Interact: Send + Sync {
    /// Runs the agentic loop over `context` to a terminal result.
    async fn interact(&self, context: AgenticContext) -> AgentResult;

    /// Continues a previously paused run, after the caller has set an
    /// approval decision on `run_state`.
    async fn resume(&self, run_state: AgentRunState) -> AgentResult;

    /// The agent's configured name, used for handoff/route matching and
    /// telemetry.
    fn name(&self) -> &str;
}
