//! Telemetry span naming, trace correlation and the processor registry.
//!
//! Registries broadcast synchronously from the calling thread — there is
//! no background dispatcher. A slow processor slows down the call that
//! triggered it. This mirrors the loop's own suspension model: every
//! suspension point in the engine is synchronous from the caller's view.
//!
//! Every broadcast also emits a [`tracing`] span/event ahead of the
//! caller-supplied processors, so a `tracing-subscriber`/`tracing-opentelemetry`
//! layer sees the same events without registering a `TelemetryProcessor`
//! at all.

use crate::error::AgentError;
use crate::id::{RequestId, SpanId, TraceId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Trace/span identifiers threaded through a single turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
}

impl TelemetryContext {
    pub fn span_name(agent_name: &str, turn: u32) -> String {
        format!("{agent_name}.turn-{turn}")
    }
}

/// Emitted when a call terminates with a terminal error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentFailedEvent {
    pub agent_name: String,
    pub turn_count: u32,
    pub error_kind: String,
    pub session_id: Option<RequestId>,
    pub parent_trace_id: Option<TraceId>,
    pub parent_span_id: Option<SpanId>,
}

impl AgentFailedEvent {
    pub fn from_error(
        agent_name: impl Into<String>,
        turn_count: u32,
        error: &AgentError,
        session_id: Option<RequestId>,
        parent_trace_id: Option<TraceId>,
        parent_span_id: Option<SpanId>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            turn_count,
            error_kind: error.kind().to_string(),
            session_id,
            parent_trace_id,
            parent_span_id,
        }
    }
}

/// An observable event broadcast to telemetry processors.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    TurnStarted { span_name: String, turn: u32 },
    AgentFailed(AgentFailedEvent),
    Custom {
        name: String,
        data: serde_json::Value,
    },
}

/// A telemetry sink. Implementations should not block appreciably; the
/// registry calls them synchronously on the driving thread.
#[async_trait]
pub trait TelemetryProcessor: Send + Sync {
    async fn on_event(&self, event: &TelemetryEvent);
}

/// An ordered collection of telemetry processors, broadcast in
/// registration order.
#[derive(Clone, Default)]
pub struct TelemetryProcessorRegistry {
    processors: Vec<Arc<dyn TelemetryProcessor>>,
}

impl TelemetryProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, processor: Arc<dyn TelemetryProcessor>) {
        self.processors.push(processor);
    }

    pub async fn broadcast(&self, event: TelemetryEvent) {
        emit_tracing(&event);
        for processor in &self.processors {
            processor.on_event(&event).await;
        }
    }
}

/// Mirrors `event` into `tracing` ahead of the registered processors.
fn emit_tracing(event: &TelemetryEvent) {
    match event {
        TelemetryEvent::TurnStarted { span_name, turn } => {
            tracing::info_span!("agentex.loop.turn", span_name = %span_name, turn).in_scope(|| {
                tracing::debug!(turn, "agentex.loop.turn_started");
            });
        }
        TelemetryEvent::AgentFailed(failed) => {
            tracing::info!(
                agent = %failed.agent_name,
                turn_count = failed.turn_count,
                error_kind = %failed.error_kind,
                session_id = ?failed.session_id,
                "agentex.agent.failed"
            );
        }
        TelemetryEvent::Custom { name, data } => {
            tracing::debug!(name = %name, data = %data, "agentex.custom");
        }
    }
}
