//! Stream adapter: the same loop as [`crate::loop_impl`], pushed
//! out as an ordered sequence of events instead of returned as a single
//! terminal value.
//!
//! Ordering guarantees mirror the blocking loop: within one turn,
//! `TurnStart` precedes every delta, every delta precedes `TurnComplete`,
//! and tool executions are emitted in declaration order. `Complete` is
//! emitted exactly once; `Error` and `Pause` are mutually exclusive with
//! it.

use crate::agent::Agent;
use crate::loop_impl::{
    append_response_to_history, assemble_request, broadcast_failure, extract_handoff_message,
    finalize_success, find_first_handoff,
};
use crate::result::{AgentResult, AgentRunState};
use agentex_context::AgenticContext;
use agentex_core::{
    AgentError, Message, ResponseEnvelope, SpanId, SseDelta, TelemetryContext, ToolCallItem,
    ToolOutputItem,
};
use agentex_tool::ToolExecution;
use futures_core::Stream;
use futures_util::StreamExt;
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One event pushed out of an [`AgentStream`].
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum StreamEvent {
    TurnStart(u32),
    TextDelta(String),
    TurnComplete(ResponseEnvelope),
    ToolCallPending(ToolCallItem),
    ToolExecuted(ToolExecution),
    Handoff(String),
    GuardrailFailed(String),
    Complete(Box<AgentResult>),
    ParsedComplete(Value),
    Error(AgentError),
    Pause(Box<AgentRunState>),
}

/// A push-based loop replay plus a cancel handle.
pub struct AgentStream {
    pub events: Pin<Box<dyn Stream<Item = StreamEvent> + Send>>,
    pub cancel: CancellationToken,
}

/// Starts streaming `interact` from a fresh context. Requires `Arc<Agent>`
/// because the produced stream outlives this call.
pub fn interact_stream(agent: Arc<Agent>, context: AgenticContext) -> AgentStream {
    let cancel = CancellationToken::new();
    let cancel_for_stream = cancel.clone();
    let events = Box::pin(async_stream::stream! {
        let mut context = context;
        context.ensure_trace_ids();

        for guardrail in &agent.input_guardrails {
            if let Err(violation) = guardrail.check(&context.user_text()).await {
                tracing::warn!(agent = %agent.name, guardrail = guardrail.name(), reason = %violation.reason, "agentex.guardrail.input_violation");
                yield StreamEvent::GuardrailFailed(violation.reason.clone());
                let error = AgentError::GuardrailInputViolation { reason: violation.reason };
                broadcast_failure(&agent, &context, context.turn_count(), &error).await;
                yield StreamEvent::Error(error);
                return;
            }
        }

        let mut all_executions: Vec<ToolExecution> = vec![];
        for await event in run_stream_loop(agent.clone(), context, all_executions.clone(), None, cancel_for_stream.clone()) {
            if let StreamEvent::ToolExecuted(ref exec) = event {
                all_executions.push(exec.clone());
            }
            yield event;
        }
    });
    AgentStream { events, cancel }
}

/// Starts streaming `resume` from a paused run state.
pub fn resume_stream(agent: Arc<Agent>, run_state: AgentRunState) -> AgentStream {
    let cancel = CancellationToken::new();
    let cancel_for_stream = cancel.clone();
    let events = Box::pin(async_stream::stream! {
        let approval = match run_state.approval.clone() {
            Some(a) => a,
            None => {
                let error = AgentError::Other { message: "resume called before an approval decision was set".into() };
                yield StreamEvent::Error(error);
                return;
            }
        };

        let mut context = run_state.context.clone();
        let pending_call = run_state.pending_tool_call.clone();
        let resolved = match approval {
            crate::result::ApprovalDecision::Approved { output } => {
                agentex_core::ToolOutputResult::Success { text: output }
            }
            crate::result::ApprovalDecision::Rejected { reason } => {
                agentex_core::ToolOutputResult::Error { text: reason }
            }
        };
        context.add_tool_result(ToolOutputItem { call_id: pending_call.call_id.clone(), result: resolved.clone() });
        let execution = ToolExecution {
            tool_name: pending_call.name.clone(),
            call_id: pending_call.call_id.clone(),
            raw_arguments: pending_call.raw_arguments.clone(),
            output: resolved,
            wall_clock_duration: agentex_core::DurationMs::ZERO,
        };
        yield StreamEvent::ToolExecuted(execution.clone());

        let mut all_executions = run_state.tool_executions.clone();
        all_executions.push(execution);

        let all_calls: Vec<ToolCallItem> = run_state.last_response.function_calls().into_iter().cloned().collect();
        let idx = all_calls.iter().position(|c| c.call_id == pending_call.call_id).map(|i| i + 1).unwrap_or(all_calls.len());
        let remaining = all_calls[idx..].to_vec();

        for await event in run_stream_loop(agent.clone(), context, all_executions, Some((remaining, run_state.last_response.clone())), cancel_for_stream.clone()) {
            yield event;
        }
    });
    AgentStream { events, cancel }
}

fn run_stream_loop(
    agent: Arc<Agent>,
    mut context: AgenticContext,
    mut all_executions: Vec<ToolExecution>,
    mut pending: Option<(Vec<ToolCallItem>, ResponseEnvelope)>,
    cancel: CancellationToken,
) -> impl Stream<Item = StreamEvent> + Send {
    async_stream::stream! {
        loop {
            if cancel.is_cancelled() {
                yield StreamEvent::Error(AgentError::Cancelled);
                return;
            }

            let (remaining_calls, response) = match pending.take() {
                Some(p) => p,
                None => {
                    let turn = context.increment_turn();
                    yield StreamEvent::TurnStart(turn);

                    if turn > agent.max_turns {
                        let error = AgentError::MaxTurnsExceeded { max_turns: agent.max_turns };
                        broadcast_failure(&agent, &context, turn, &error).await;
                        yield StreamEvent::Error(error);
                        return;
                    }

                    let history_copy = context.history_mutable();
                    let trimmed = match &agent.context_management {
                        Some(cm) if cm.strategy.should_compact(&history_copy, cm.token_counter.as_ref()) => {
                            match cm.strategy.compact(history_copy, cm.token_counter.as_ref()).await {
                                Ok(trimmed) => trimmed,
                                Err(error) => {
                                    broadcast_failure(&agent, &context, turn, &error).await;
                                    yield StreamEvent::Error(error);
                                    return;
                                }
                            }
                        }
                        _ => history_copy,
                    };

                    let payload = assemble_request(&agent, trimmed);
                    let telemetry_ctx = TelemetryContext {
                        trace_id: context.parent_trace_id.clone().unwrap_or_default(),
                        span_id: SpanId::new(),
                        parent_span_id: context.parent_span_id.clone(),
                    };

                    let mut sse = match agent.responder.respond_stream(payload, &telemetry_ctx, None).await {
                        Ok(sse) => sse,
                        Err(cause) => {
                            let error = AgentError::LlmCallFailed { message: cause.to_string() };
                            broadcast_failure(&agent, &context, turn, &error).await;
                            yield StreamEvent::Error(error);
                            return;
                        }
                    };

                    let mut response: Option<ResponseEnvelope> = None;
                    while let Some(delta) = sse.next().await {
                        if cancel.is_cancelled() {
                            yield StreamEvent::Error(AgentError::Cancelled);
                            return;
                        }
                        match delta {
                            SseDelta::TextDelta(chunk) => yield StreamEvent::TextDelta(chunk),
                            SseDelta::ToolCallDelta(_) => {}
                            SseDelta::ResponseCompleted(envelope) => {
                                response = Some(envelope);
                            }
                            SseDelta::Error(message) => {
                                let error = AgentError::LlmCallFailed { message };
                                broadcast_failure(&agent, &context, turn, &error).await;
                                yield StreamEvent::Error(error);
                                return;
                            }
                        }
                    }

                    let response = match response {
                        Some(r) => r,
                        None => {
                            let error = AgentError::LlmCallFailed {
                                message: "stream ended without a completed response".into(),
                            };
                            broadcast_failure(&agent, &context, turn, &error).await;
                            yield StreamEvent::Error(error);
                            return;
                        }
                    };

                    append_response_to_history(&mut context, &response);
                    yield StreamEvent::TurnComplete(response.clone());

                    let calls = response.function_calls().into_iter().cloned().collect::<Vec<_>>();
                    if calls.is_empty() {
                        let result = finalize_success(&agent, &context, response, all_executions.clone()).await;
                        if let AgentResult::Success { ref parsed, .. } = result {
                            if let Some(parsed) = parsed {
                                yield StreamEvent::ParsedComplete(parsed.clone());
                            }
                        }
                        yield StreamEvent::Complete(Box::new(result));
                        return;
                    }

                    if let Some((handoff, call)) = find_first_handoff(&agent, &calls) {
                        yield StreamEvent::Handoff(handoff.name.clone());
                        let message = extract_handoff_message(&call.raw_arguments);
                        let mut child = context.fork(SpanId::new());
                        child.add_message(Message::user_text(message));
                        let target = handoff.target.clone();
                        let target_name = handoff.name.clone();
                        let inner = target.interact(child).await;
                        let result = AgentResult::Handoff {
                            target_agent: target_name,
                            inner: Box::new(inner),
                            history: context.history().to_vec(),
                        };
                        yield StreamEvent::Complete(Box::new(result));
                        return;
                    }

                    (calls, response)
                }
            };

            let mut paused = None;
            for call in &remaining_calls {
                if cancel.is_cancelled() {
                    yield StreamEvent::Error(AgentError::Cancelled);
                    return;
                }
                if let Some(tool) = agent.tools.get(&call.name) {
                    if tool.requires_confirmation() {
                        yield StreamEvent::ToolCallPending(call.clone());
                        let run_state = AgentRunState {
                            agent_name: agent.name.clone(),
                            context: context.clone(),
                            pending_tool_call: call.clone(),
                            last_response: response.clone(),
                            tool_executions: all_executions.clone(),
                            turn: context.turn_count(),
                            approval: None,
                        };
                        paused = Some(run_state);
                        break;
                    }
                }

                let execution = agentex_tool::dispatch(&agent.tools, &agent.telemetry, call).await;
                context.add_tool_result(ToolOutputItem {
                    call_id: call.call_id.clone(),
                    result: execution.output.clone(),
                });
                yield StreamEvent::ToolExecuted(execution.clone());
                all_executions.push(execution);
            }

            if let Some(run_state) = paused {
                yield StreamEvent::Pause(Box::new(run_state));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::test_support::StubResponder;
    use agentex_core::OutputItem;

    fn message_response(text: &str) -> ResponseEnvelope {
        ResponseEnvelope {
            output: vec![OutputItem::Message {
                role: "assistant".into(),
                text: text.into(),
            }],
        }
    }

    #[tokio::test]
    async fn streams_text_deltas_then_completes_exactly_once() {
        let responder = Arc::new(StubResponder::with_responses(vec![message_response("Hello")]));
        let agent = Arc::new(Agent::builder("A", "M1", responder).build());

        let mut stream = interact_stream(agent, AgenticContext::with_user_text("hi"));
        let mut events = vec![];
        while let Some(event) = stream.events.next().await {
            events.push(event);
        }

        let completes = events
            .iter()
            .filter(|e| matches!(e, StreamEvent::Complete(_)))
            .count();
        assert_eq!(completes, 1);
        assert!(events.iter().any(|e| matches!(e, StreamEvent::TurnStart(1))));
        assert!(events.iter().any(|e| matches!(e, StreamEvent::TextDelta(t) if t == "Hello")));
    }

    #[tokio::test]
    async fn cancellation_yields_a_single_cancelled_error() {
        let responder = Arc::new(StubResponder::with_responses(vec![message_response("Hello")]));
        let agent = Arc::new(Agent::builder("A", "M1", responder).build());

        let stream = interact_stream(agent, AgenticContext::with_user_text("hi"));
        stream.cancel.cancel();
        let events: Vec<_> = stream.events.collect().await;
        assert!(matches!(events.last(), Some(StreamEvent::Error(AgentError::Cancelled))));
    }

    fn tool_call_response(name: &str, call_id: &str) -> ResponseEnvelope {
        ResponseEnvelope {
            output: vec![agentex_core::OutputItem::FunctionCall(ToolCallItem {
                name: name.into(),
                call_id: call_id.into(),
                raw_arguments: Value::Null,
            })],
        }
    }

    /// `MaxTurnsExceeded` yields exactly one terminal event (`Error`), not
    /// an `Error` followed by a `Complete` — the double-emission this
    /// module's doc comment rules out.
    #[tokio::test]
    async fn max_turns_exceeded_emits_a_single_terminal_error() {
        use agentex_tool::{FnTool, ToolRegistry};
        use serde_json::json;

        let mut tools = ToolRegistry::new();
        tools
            .register(Arc::new(FnTool::new("loop_tool", json!({}), |_| async move {
                Ok("keep going".to_string())
            })))
            .unwrap();

        let responses: Vec<ResponseEnvelope> = (0..3).map(|i| tool_call_response("loop_tool", &format!("c{i}"))).collect();
        let responder = Arc::new(StubResponder::with_responses(responses));
        let agent = Arc::new(Agent::builder("A", "M1", responder).tools(tools).max_turns(1).build());

        let events: Vec<_> = interact_stream(agent, AgenticContext::with_user_text("go")).events.collect().await;

        let terminal_events = events
            .iter()
            .filter(|e| matches!(e, StreamEvent::Error(_) | StreamEvent::Complete(_) | StreamEvent::Pause(_)))
            .count();
        assert_eq!(terminal_events, 1);
        assert!(matches!(events.last(), Some(StreamEvent::Error(AgentError::MaxTurnsExceeded { max_turns: 1 }))));
    }
}
