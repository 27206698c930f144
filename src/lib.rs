#![deny(missing_docs)]
//! # agentex — umbrella crate
//!
//! A single import surface over the agent orchestration core: wire types
//! and the transport seam (`agentex_core`), conversation state and
//! context-window management (`agentex_context`), the tool contract and
//! registry (`agentex_tool`), the agentic control loop and streaming
//! adapter (`agentex_engine`), and routing/parallel-fan-out composites
//! (`agentex_orch`).

pub use agentex_context;
pub use agentex_core;
pub use agentex_engine;
pub use agentex_orch;
pub use agentex_tool;

/// Happy-path imports for composing agents.
pub mod prelude {
    pub use agentex_context::{
        AgenticContext, CompactionStrategy, FnTokenCounter, NoCompaction, SlidingWindow,
        Summarization, Summarizer, TokenCounter,
    };
    pub use agentex_core::{
        AgentError, ContentItem, HistoryItem, Message, Responder, Role, TelemetryProcessor,
        TelemetryProcessorRegistry,
    };
    pub use agentex_engine::{
        Agent, AgentAsTool, AgentBuilder, AgentResult, AgentRunState, ApprovalDecision,
        ContextManagementConfig, ContextSharingPolicy, Guardrail, GuardrailViolation, Handoff,
        Interact, OutputTypeConfig, PredicateGuardrail, StreamEvent,
    };
    pub use agentex_orch::{
        AgentClassifier, Branch, BranchOutcome, Classifier, FnClassifier, ParallelAgents,
        RouteDescriptor, Router,
    };
    pub use agentex_tool::{
        FnTool, Tool, ToolCallError, ToolPlan, ToolPlanMetaTool, ToolPlanStep, ToolRegistry,
    };
}
