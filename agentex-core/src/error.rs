//! Error taxonomy surfaced by the agent execution engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Which phase of tool dispatch produced a [`AgentError::ToolExecutionFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailurePhase {
    /// Raw arguments failed to decode into the tool's parameter record.
    Parse,
    /// The tool's own invocation returned or threw an error.
    Invoke,
}

/// Terminal and tool-level errors produced by the core.
///
/// Tool-level failures ([`AgentError::ToolExecutionFailed`]) are recovered
/// locally by the loop: they are recorded into `ToolExecution` and fed back
/// to the model as the tool's output, so the surrounding loop does not
/// fail. Every other variant here is terminal.
#[non_exhaustive]
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum AgentError {
    #[error("input guardrail violation: {reason}")]
    GuardrailInputViolation { reason: String },

    #[error("output guardrail violation: {reason}")]
    GuardrailOutputViolation { reason: String },

    #[error("transport call failed: {message}")]
    LlmCallFailed { message: String },

    #[error("exceeded max_turns ({max_turns})")]
    MaxTurnsExceeded { max_turns: u32 },

    #[error("tool '{tool_name}' failed during {phase:?} (call {call_id}): {cause}")]
    ToolExecutionFailed {
        phase: ToolFailurePhase,
        tool_name: String,
        call_id: String,
        raw_args: Value,
        cause: String,
    },

    #[error("handoff to '{target}' failed: {cause}")]
    HandoffFailed { target: String, cause: String },

    #[error("structured output parsing failed: {message}")]
    ParsingFailed { message: String },

    #[error("cancelled")]
    Cancelled,

    #[error("{message}")]
    Other { message: String },
}

impl AgentError {
    /// A short, stable discriminant used in telemetry broadcasts; avoids
    /// leaking free-form message text into structured events.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::GuardrailInputViolation { .. } => "guardrail_input_violation",
            AgentError::GuardrailOutputViolation { .. } => "guardrail_output_violation",
            AgentError::LlmCallFailed { .. } => "llm_call_failed",
            AgentError::MaxTurnsExceeded { .. } => "max_turns_exceeded",
            AgentError::ToolExecutionFailed { .. } => "tool_execution_failed",
            AgentError::HandoffFailed { .. } => "handoff_failed",
            AgentError::ParsingFailed { .. } => "parsing_failed",
            AgentError::Cancelled => "cancelled",
            AgentError::Other { .. } => "other",
        }
    }
}
