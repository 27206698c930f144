//! The `Tool` contract: a catalogue entry with a name, schema, and an
//! invocation capability.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Why a tool call did not produce a successful output. Distinguishes
/// argument decoding from the tool's own invocation, matching the two
/// failure phases the core reports in telemetry.
#[derive(Debug, Clone)]
pub enum ToolCallError {
    /// `rawArguments` could not be decoded into the tool's parameter record.
    Parse(String),
    /// The tool's own invocation returned or threw an error.
    Invoke(String),
}

impl std::fmt::Display for ToolCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolCallError::Parse(msg) => write!(f, "{msg}"),
            ToolCallError::Invoke(msg) => write!(f, "{msg}"),
        }
    }
}

/// A catalogue entry carrying a stable name, an optional description, a
/// parameter schema, and an invocation capability.
///
/// Referentially transparent w.r.t. the agent: a tool holds no hidden
/// state on the agent's behalf. Per-call state, if any, belongs in the
/// context's user map (`AgenticContext::set_state`/`get_state`), not
/// inside the tool.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    fn parameters_schema(&self) -> Value;

    /// Gates execution behind the pause protocol when true.
    fn requires_confirmation(&self) -> bool {
        false
    }

    /// Decodes `raw_arguments` and invokes the tool. Returns the success
    /// text payload, or a typed error distinguishing decode failure from
    /// invocation failure.
    fn call(&self, raw_arguments: Value) -> BoxFuture<'_, Result<String, ToolCallError>>;
}

/// Adapts a plain async closure into a [`Tool`], for callers who don't
/// want to name a type for every tool.
pub struct FnTool<F> {
    name: String,
    description: Option<String>,
    schema: Value,
    requires_confirmation: bool,
    func: F,
}

impl<F, Fut> FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ToolCallError>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, schema: Value, func: F) -> Self {
        Self {
            name: name.into(),
            description: None,
            schema,
            requires_confirmation: false,
            func,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_confirmation_required(mut self, required: bool) -> Self {
        self.requires_confirmation = required;
        self
    }
}

impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ToolCallError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn parameters_schema(&self) -> Value {
        self.schema.clone()
    }

    fn requires_confirmation(&self) -> bool {
        self.requires_confirmation
    }

    fn call(&self, raw_arguments: Value) -> BoxFuture<'_, Result<String, ToolCallError>> {
        Box::pin((self.func)(raw_arguments))
    }
}
