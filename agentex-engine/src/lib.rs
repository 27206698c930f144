//! Agent execution engine: the agentic control loop, guardrails, handoff,
//! pause/resume, and the streaming adapter built on top of the same loop.

pub mod agent;
pub mod guardrail;
pub mod result;
pub mod stream;
pub mod subagent;
pub mod traits;

mod engine;
mod loop_impl;

/// Test doubles shared by this crate's inline unit tests and by the
/// `tests/` integration suite. Enabled outside `#[cfg(test)]` builds only
/// via the `test-support` feature, which this crate's own dev-dependency
/// on itself turns on for `tests/*.rs`.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent::{Agent, AgentBuilder, ContextManagementConfig, Handoff, OutputTypeConfig};
pub use guardrail::{Guardrail, GuardrailViolation, PredicateGuardrail};
pub use result::{AgentResult, AgentRunState, ApprovalDecision, StructuredResult};
pub use stream::{interact_stream, resume_stream, AgentStream, StreamEvent};
pub use subagent::{AgentAsTool, ContextSharingPolicy};
pub use traits::Interact;
