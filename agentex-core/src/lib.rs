//! Shared vocabulary for the agent orchestration core: content and
//! history shapes, identifiers, the error taxonomy, telemetry
//! correlation, and the `Responder` transport seam.
//!
//! Everything in this crate is inert data plus the one trait
//! ([`responder::Responder`]) that the rest of the workspace is built
//! against but never implements.

pub mod content;
pub mod duration;
pub mod error;
pub mod id;
pub mod responder;
pub mod telemetry;

pub use content::{ContentItem, HistoryItem, Message, Role, ToolCallItem, ToolOutputItem, ToolOutputResult};
pub use duration::DurationMs;
pub use error::{AgentError, ToolFailurePhase};
pub use id::{CallId, RequestId, SpanId, TraceId};
pub use responder::{
    OutputItem, PartialToolCall, RequestPayload, Responder, ResponseEnvelope, SseDelta, SseStream,
    ToolSchema, TraceMeta,
};
pub use telemetry::{AgentFailedEvent, TelemetryContext, TelemetryEvent, TelemetryProcessor, TelemetryProcessorRegistry};
