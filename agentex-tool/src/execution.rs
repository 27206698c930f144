//! Dispatching a single tool call and recording its execution.

use crate::registry::ToolRegistry;
use crate::tool::ToolCallError;
use agentex_core::{
    AgentError, DurationMs, TelemetryEvent, TelemetryProcessorRegistry, ToolCallItem,
    ToolFailurePhase, ToolOutputResult,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Post-hoc record of one tool invocation, kept for inspection and
/// telemetry and carried across the pause/resume boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecution {
    pub tool_name: String,
    pub call_id: String,
    pub raw_arguments: Value,
    pub output: ToolOutputResult,
    pub wall_clock_duration: DurationMs,
}

/// Looks up, decodes, and invokes a tool call, producing a
/// [`ToolExecution`] with its output and wall-clock duration.
///
/// Tool-level failures (missing tool, decode failure, invocation error)
/// are recovered here: they become an `Error` output fed back to the
/// model, not a terminal failure of the surrounding loop. A decode or
/// invocation failure is also broadcast to `telemetry` as an
/// [`agentex_core::AgentError::ToolExecutionFailed`], so the phase and
/// cause reach a caller's processors even though the loop itself keeps
/// running.
pub async fn dispatch(
    registry: &ToolRegistry,
    telemetry: &TelemetryProcessorRegistry,
    call: &ToolCallItem,
) -> ToolExecution {
    tracing::debug!(tool = %call.name, call_id = %call.call_id, "agentex.tool.dispatch");
    let started = Instant::now();

    let output = match registry.get(&call.name) {
        None => {
            tracing::warn!(tool = %call.name, call_id = %call.call_id, "agentex.tool.not_found");
            ToolOutputResult::Error {
                text: format!("no tool named '{}' is registered", call.name),
            }
        }
        Some(tool) => match tool.call(call.raw_arguments.clone()).await {
            Ok(text) => ToolOutputResult::Success { text },
            Err(ToolCallError::Parse(msg)) => {
                report_tool_execution_failed(telemetry, call, ToolFailurePhase::Parse, msg.clone()).await;
                ToolOutputResult::Error {
                    text: format!("{phase:?}: {msg}", phase = ToolFailurePhase::Parse),
                }
            }
            Err(ToolCallError::Invoke(msg)) => {
                report_tool_execution_failed(telemetry, call, ToolFailurePhase::Invoke, msg.clone()).await;
                ToolOutputResult::Error {
                    text: format!("{phase:?}: {msg}", phase = ToolFailurePhase::Invoke),
                }
            }
        },
    };

    let wall_clock_duration = started.elapsed().into();
    tracing::debug!(tool = %call.name, call_id = %call.call_id, is_error = output.is_error(), "agentex.tool.dispatched");

    ToolExecution {
        tool_name: call.name.clone(),
        call_id: call.call_id.clone(),
        raw_arguments: call.raw_arguments.clone(),
        output,
        wall_clock_duration,
    }
}

/// Constructs the terminal-shaped error for a recovered tool failure,
/// logs it, and broadcasts it as a `Custom` telemetry event so it's
/// reachable by a caller's processors without making the surrounding
/// loop fail.
async fn report_tool_execution_failed(
    telemetry: &TelemetryProcessorRegistry,
    call: &ToolCallItem,
    phase: ToolFailurePhase,
    cause: String,
) {
    let error = AgentError::ToolExecutionFailed {
        phase,
        tool_name: call.name.clone(),
        call_id: call.call_id.clone(),
        raw_args: call.raw_arguments.clone(),
        cause,
    };
    tracing::warn!(tool = %call.name, call_id = %call.call_id, phase = ?phase, error = %error, "agentex.tool.failed");
    telemetry
        .broadcast(TelemetryEvent::Custom {
            name: "agentex.tool.execution_failed".into(),
            data: serde_json::json!({
                "kind": error.kind(),
                "message": error.to_string(),
            }),
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::FnTool;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn dispatch_missing_tool_returns_error_output() {
        let registry = ToolRegistry::new();
        let call = ToolCallItem {
            name: "ghost".into(),
            call_id: "c1".into(),
            raw_arguments: Value::Null,
        };
        let execution = dispatch(&registry, &TelemetryProcessorRegistry::new(), &call).await;
        assert!(execution.output.is_error());
        assert!(execution.output.text().contains("ghost"));
    }

    #[tokio::test]
    async fn dispatch_successful_tool_records_output_and_duration() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FnTool::new("echo", json!({}), |args: Value| async move {
                Ok(args.to_string())
            })))
            .unwrap();
        let call = ToolCallItem {
            name: "echo".into(),
            call_id: "c1".into(),
            raw_arguments: json!({"x": 1}),
        };
        let execution = dispatch(&registry, &TelemetryProcessorRegistry::new(), &call).await;
        assert!(!execution.output.is_error());
        assert_eq!(execution.output.text(), r#"{"x":1}"#);
    }

    #[tokio::test]
    async fn dispatch_invoke_failure_is_recovered_as_error_output() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FnTool::new("boom", json!({}), |_| async move {
                Err(ToolCallError::Invoke("explosion".into()))
            })))
            .unwrap();
        let call = ToolCallItem {
            name: "boom".into(),
            call_id: "c1".into(),
            raw_arguments: Value::Null,
        };
        let execution = dispatch(&registry, &TelemetryProcessorRegistry::new(), &call).await;
        assert!(execution.output.is_error());
        assert!(execution.output.text().contains("explosion"));
    }

    struct CapturingProcessor(std::sync::Mutex<Vec<TelemetryEvent>>);

    #[async_trait::async_trait]
    impl agentex_core::TelemetryProcessor for CapturingProcessor {
        async fn on_event(&self, event: &TelemetryEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn dispatch_invoke_failure_broadcasts_tool_execution_failed() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FnTool::new("boom", json!({}), |_| async move {
                Err(ToolCallError::Invoke("explosion".into()))
            })))
            .unwrap();
        let captured = Arc::new(CapturingProcessor(std::sync::Mutex::new(vec![])));
        let mut telemetry = TelemetryProcessorRegistry::new();
        telemetry.add(captured.clone());
        let call = ToolCallItem {
            name: "boom".into(),
            call_id: "c1".into(),
            raw_arguments: Value::Null,
        };

        dispatch(&registry, &telemetry, &call).await;

        let events = captured.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            TelemetryEvent::Custom { name, data } => {
                assert_eq!(name, "agentex.tool.execution_failed");
                assert_eq!(data["kind"], "tool_execution_failed");
            }
            other => panic!("expected a Custom event, got {other:?}"),
        }
    }
}
