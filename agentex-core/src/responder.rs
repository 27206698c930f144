//! The transport collaborator consumed (never implemented) by the core.
//!
//! `Responder` is the seam between the agent execution engine and the
//! "Responses"-protocol endpoint. HTTP transport, retries, backoff, and
//! JSON wire (de)serialization all live on the implementer's side of this
//! trait; the core only reads back the fields it needs to drive the loop.

use crate::content::{HistoryItem, ToolCallItem};
use crate::error::AgentError;
use crate::telemetry::TelemetryContext;
use async_trait::async_trait;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

/// A tool entry as rendered into the request's tool catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Value,
    pub strict: bool,
}

/// The request payload assembled once per turn and handed to the
/// transport. Every field not explicitly read back by the core
/// (`input`, `tools`, `instructions`, `temperature`, `stream`) is an
/// opaque forwarded bundle via `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPayload {
    pub model: String,
    pub instructions: String,
    pub input: Vec<HistoryItem>,
    pub tools: Vec<ToolSchema>,
    pub tool_choice: Option<Value>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub stream: bool,
    pub metadata: Option<Value>,
    pub response_format: Option<Value>,
    #[serde(default)]
    pub extra: Value,
}

/// One item in a response envelope's output list.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message { role: String, text: String },
    FunctionCall(ToolCallItem),
    Reasoning { text: String },
}

/// A decoded response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub output: Vec<OutputItem>,
}

impl ResponseEnvelope {
    pub fn empty() -> Self {
        Self { output: vec![] }
    }

    /// Aggregate text accessor: concatenates every `Message` item's text.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::Message { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn function_calls(&self) -> Vec<&ToolCallItem> {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::FunctionCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }
}

/// A partial function-tool-call as it streams in, keyed by its position
/// in the output list so deltas for distinct calls don't interleave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialToolCall {
    pub index: usize,
    pub call_id: Option<String>,
    pub name: Option<String>,
    pub arguments_delta: String,
}

/// A single server-sent-event delta from the streaming surface.
#[derive(Debug, Clone)]
pub enum SseDelta {
    TextDelta(String),
    ToolCallDelta(PartialToolCall),
    ResponseCompleted(ResponseEnvelope),
    Error(String),
}

pub type SseStream = Pin<Box<dyn Stream<Item = SseDelta> + Send>>;

/// Optional trace metadata forwarded to the transport for correlation
/// with its own spans.
#[derive(Debug, Clone, Default)]
pub struct TraceMeta {
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
}

/// The transport collaborator. Implementations own HTTP, retry/backoff,
/// and wire (de)serialization; the core only calls this trait.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(
        &self,
        payload: RequestPayload,
        telemetry_ctx: &TelemetryContext,
        trace_meta: Option<TraceMeta>,
    ) -> Result<ResponseEnvelope, AgentError>;

    async fn respond_stream(
        &self,
        payload: RequestPayload,
        telemetry_ctx: &TelemetryContext,
        trace_meta: Option<TraceMeta>,
    ) -> Result<SseStream, AgentError>;
}
