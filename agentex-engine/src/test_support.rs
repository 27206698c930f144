//! Test doubles shared across this crate's unit tests and its `tests/`
//! integration suite. Not part of the public surface proper — gated
//! behind `test-support`, a dev-only feature (see `lib.rs`).

#![cfg(any(test, feature = "test-support"))]

use agentex_core::{RequestPayload, Responder, ResponseEnvelope, SseDelta, SseStream, TelemetryContext, TraceMeta};
use agentex_core::AgentError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Replays a fixed sequence of canned responses, one per call to
/// `respond`. Panics if asked for more than were supplied.
pub struct StubResponder {
    responses: Mutex<Vec<ResponseEnvelope>>,
    pub call_count: AtomicUsize,
}

impl Default for StubResponder {
    fn default() -> Self {
        Self {
            responses: Mutex::new(vec![ResponseEnvelope::empty()]),
            call_count: AtomicUsize::new(0),
        }
    }
}

impl StubResponder {
    pub fn with_responses(responses: Vec<ResponseEnvelope>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Responder for StubResponder {
    async fn respond(
        &self,
        _payload: RequestPayload,
        _telemetry_ctx: &TelemetryContext,
        _trace_meta: Option<TraceMeta>,
    ) -> Result<ResponseEnvelope, AgentError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(AgentError::LlmCallFailed {
                message: "stub responder exhausted".into(),
            });
        }
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(responses.remove(0))
    }

    async fn respond_stream(
        &self,
        _payload: RequestPayload,
        _telemetry_ctx: &TelemetryContext,
        _trace_meta: Option<TraceMeta>,
    ) -> Result<SseStream, AgentError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(AgentError::LlmCallFailed {
                message: "stub responder exhausted".into(),
            });
        }
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let envelope = responses.remove(0);
        let text = envelope.output_text();
        let deltas = vec![
            SseDelta::TextDelta(text),
            SseDelta::ResponseCompleted(envelope),
        ];
        Ok(Box::pin(futures_util::stream::iter(deltas)))
    }
}
