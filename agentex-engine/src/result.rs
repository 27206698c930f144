//! `AgentResult`, the pause state it can carry, and the approval protocol
//! used to resume a paused run.

use agentex_context::AgenticContext;
use agentex_core::{AgentError, HistoryItem, ResponseEnvelope, ToolCallItem};
use agentex_tool::ToolExecution;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The terminal outcome of `interact`/`resume`.
#[derive(Debug, Clone)]
pub enum AgentResult {
    Success {
        output: String,
        parsed: Option<Value>,
        final_response: ResponseEnvelope,
        history: Vec<HistoryItem>,
        tool_executions: Vec<ToolExecution>,
        turns_used: u32,
    },
    Handoff {
        target_agent: String,
        inner: Box<AgentResult>,
        history: Vec<HistoryItem>,
    },
    Paused {
        run_state: AgentRunState,
    },
    Error {
        error: AgentError,
        history: Vec<HistoryItem>,
        turns_used: u32,
    },
}

impl AgentResult {
    pub fn output_text(&self) -> Option<&str> {
        match self {
            AgentResult::Success { output, .. } => Some(output),
            AgentResult::Handoff { inner, .. } => inner.output_text(),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AgentResult::Success { .. })
    }
}

/// A caller-set decision on a paused tool call, consumed by `resume`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApprovalDecision {
    Approved { output: String },
    Rejected { reason: String },
}

/// Serializable pause state: everything needed to continue a loop that
/// stopped on a `requiresConfirmation` tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRunState {
    /// The owning agent's name, checked at resume to catch state being
    /// handed to the wrong agent.
    pub agent_name: String,
    pub context: AgenticContext,
    pub pending_tool_call: ToolCallItem,
    pub last_response: ResponseEnvelope,
    pub tool_executions: Vec<ToolExecution>,
    pub turn: u32,
    pub approval: Option<ApprovalDecision>,
}

impl AgentRunState {
    pub fn approve_tool_call(&mut self, output: impl Into<String>) {
        self.approval = Some(ApprovalDecision::Approved {
            output: output.into(),
        });
    }

    pub fn reject_tool_call(&mut self, reason: impl Into<String>) {
        self.approval = Some(ApprovalDecision::Rejected {
            reason: reason.into(),
        });
    }
}

/// A typed result composed on top of the untyped engine, for agents
/// configured with an `outputType` schema.
#[derive(Debug, Clone)]
pub struct StructuredResult<T> {
    pub parsed: T,
    pub raw: AgentResult,
}
