//! The agentic loop: the single algorithm behind `interact` and
//! `resume`, implemented once and entered either fresh or mid-turn.

use crate::agent::{Agent, Handoff};
use crate::result::{AgentResult, AgentRunState, ApprovalDecision};
use agentex_context::AgenticContext;
use agentex_core::{
    AgentFailedEvent, AgentError, DurationMs, HistoryItem, Message, OutputItem, RequestPayload,
    ResponseEnvelope, SpanId, TelemetryContext, TelemetryEvent, ToolCallItem, ToolOutputItem,
    ToolOutputResult, ToolSchema,
};
use agentex_tool::ToolExecution;
use serde_json::Value;

pub(crate) fn handoff_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": { "message": { "type": "string" } },
        "required": ["message"],
    })
}

pub(crate) fn find_first_handoff<'a>(agent: &'a Agent, calls: &'a [ToolCallItem]) -> Option<(&'a Handoff, &'a ToolCallItem)> {
    calls.iter().find_map(|call| agent.handoff_for(&call.name).map(|h| (h, call)))
}

pub(crate) fn extract_handoff_message(args: &Value) -> String {
    args.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| args.to_string())
}

pub(crate) fn assemble_request(agent: &Agent, input: Vec<HistoryItem>) -> RequestPayload {
    let mut tools = agent.tools.schemas();
    for handoff in &agent.handoffs {
        // Real tools take precedence on a name collision with a handoff name.
        if agent.tools.contains(&handoff.name) {
            continue;
        }
        tools.push(ToolSchema {
            name: handoff.name.clone(),
            description: Some(handoff.description.clone()),
            parameters: handoff_schema(),
            strict: true,
        });
    }
    RequestPayload {
        model: agent.model.clone(),
        instructions: agent.instructions.clone(),
        input,
        tools,
        tool_choice: None,
        temperature: agent.temperature,
        top_p: None,
        max_output_tokens: None,
        stream: false,
        metadata: None,
        response_format: None,
        extra: Value::Null,
    }
}

pub(crate) fn append_response_to_history(context: &mut AgenticContext, response: &ResponseEnvelope) {
    for item in &response.output {
        match item {
            OutputItem::Message { text, .. } => {
                context.add_message(Message::assistant_text(text.clone()));
            }
            OutputItem::FunctionCall(call) => {
                context.add_input(HistoryItem::ToolCall(call.clone()));
            }
            OutputItem::Reasoning { .. } => {}
        }
    }
}

pub(crate) async fn broadcast_failure(agent: &Agent, context: &AgenticContext, turn: u32, error: &AgentError) {
    let event = AgentFailedEvent::from_error(
        &agent.name,
        turn,
        error,
        context.request_id.clone(),
        context.parent_trace_id.clone(),
        context.parent_span_id.clone(),
    );
    agent.telemetry.broadcast(TelemetryEvent::AgentFailed(event)).await;
}

pub(crate) async fn finalize_success(
    agent: &Agent,
    context: &AgenticContext,
    response: ResponseEnvelope,
    tool_executions: Vec<ToolExecution>,
) -> AgentResult {
    let turn = context.turn_count();
    let output = response.output_text();

    for guardrail in &agent.output_guardrails {
        if let Err(violation) = guardrail.check(&output).await {
            tracing::warn!(agent = %agent.name, guardrail = guardrail.name(), reason = %violation.reason, "agentex.guardrail.output_violation");
            let error = AgentError::GuardrailOutputViolation {
                reason: violation.reason,
            };
            broadcast_failure(agent, context, turn, &error).await;
            return AgentResult::Error {
                error,
                history: context.history().to_vec(),
                turns_used: turn,
            };
        }
    }

    let parsed = match &agent.output_type {
        None => None,
        Some(output_type) => match (output_type.decode)(&output) {
            Ok(value) => Some(value),
            Err(message) => {
                let error = AgentError::ParsingFailed { message };
                broadcast_failure(agent, context, turn, &error).await;
                return AgentResult::Error {
                    error,
                    history: context.history().to_vec(),
                    turns_used: turn,
                };
            }
        },
    };

    AgentResult::Success {
        output,
        parsed,
        final_response: response,
        history: context.history().to_vec(),
        tool_executions,
        turns_used: turn,
    }
}

/// Runs turns until a terminal condition. `pending` carries a still-open
/// turn's unprocessed tool calls — `Some` when re-entering mid-turn from
/// `resume`, `None` to start a fresh turn (the normal loop continuation).
pub(crate) async fn run_loop(
    agent: &Agent,
    mut context: AgenticContext,
    mut all_executions: Vec<ToolExecution>,
    mut pending: Option<(Vec<ToolCallItem>, ResponseEnvelope)>,
) -> AgentResult {
    loop {
        let (remaining_calls, response) = match pending.take() {
            Some(p) => p,
            None => {
                let turn = context.increment_turn();
                if turn > agent.max_turns {
                    let error = AgentError::MaxTurnsExceeded {
                        max_turns: agent.max_turns,
                    };
                    broadcast_failure(agent, &context, turn, &error).await;
                    return AgentResult::Error {
                        error,
                        history: context.history().to_vec(),
                        turns_used: turn,
                    };
                }

                let span_name = TelemetryContext::span_name(&agent.name, turn);
                agent
                    .telemetry
                    .broadcast(TelemetryEvent::TurnStarted { span_name, turn })
                    .await;

                let history_copy = context.history_mutable();
                let trimmed = match &agent.context_management {
                    Some(cm) if cm.strategy.should_compact(&history_copy, cm.token_counter.as_ref()) => {
                        match cm.strategy.compact(history_copy, cm.token_counter.as_ref()).await {
                            Ok(trimmed) => trimmed,
                            Err(error) => {
                                broadcast_failure(agent, &context, turn, &error).await;
                                return AgentResult::Error {
                                    error,
                                    history: context.history().to_vec(),
                                    turns_used: turn,
                                };
                            }
                        }
                    }
                    _ => history_copy,
                };

                let payload = assemble_request(agent, trimmed);
                let telemetry_ctx = TelemetryContext {
                    trace_id: context.parent_trace_id.clone().unwrap_or_default(),
                    span_id: SpanId::new(),
                    parent_span_id: context.parent_span_id.clone(),
                };

                let response = match agent.responder.respond(payload, &telemetry_ctx, None).await {
                    Ok(response) => response,
                    Err(cause) => {
                        let error = AgentError::LlmCallFailed {
                            message: cause.to_string(),
                        };
                        broadcast_failure(agent, &context, turn, &error).await;
                        return AgentResult::Error {
                            error,
                            history: context.history().to_vec(),
                            turns_used: turn,
                        };
                    }
                };

                append_response_to_history(&mut context, &response);

                let calls = response.function_calls().into_iter().cloned().collect::<Vec<_>>();
                if calls.is_empty() {
                    return finalize_success(agent, &context, response, all_executions).await;
                }

                if let Some((handoff, call)) = find_first_handoff(agent, &calls) {
                    let message = extract_handoff_message(&call.raw_arguments);
                    let mut child = context.fork(SpanId::new());
                    child.add_message(Message::user_text(message));
                    let target = handoff.target.clone();
                    let target_name = handoff.name.clone();
                    let inner = target.interact(child).await;
                    return AgentResult::Handoff {
                        target_agent: target_name,
                        inner: Box::new(inner),
                        history: context.history().to_vec(),
                    };
                }

                (calls, response)
            }
        };

        for call in &remaining_calls {
            if let Some(tool) = agent.tools.get(&call.name) {
                if tool.requires_confirmation() {
                    let run_state = AgentRunState {
                        agent_name: agent.name.clone(),
                        context: context.clone(),
                        pending_tool_call: call.clone(),
                        last_response: response.clone(),
                        tool_executions: all_executions.clone(),
                        turn: context.turn_count(),
                        approval: None,
                    };
                    return AgentResult::Paused { run_state };
                }
            }

            let execution = agentex_tool::dispatch(&agent.tools, &agent.telemetry, call).await;
            context.add_tool_result(ToolOutputItem {
                call_id: call.call_id.clone(),
                result: execution.output.clone(),
            });
            all_executions.push(execution);
        }
    }
}

pub(crate) async fn interact_impl(agent: &Agent, mut context: AgenticContext) -> AgentResult {
    context.ensure_trace_ids();

    for guardrail in &agent.input_guardrails {
        if let Err(violation) = guardrail.check(&context.user_text()).await {
            tracing::warn!(agent = %agent.name, guardrail = guardrail.name(), reason = %violation.reason, "agentex.guardrail.input_violation");
            let error = AgentError::GuardrailInputViolation {
                reason: violation.reason,
            };
            broadcast_failure(agent, &context, context.turn_count(), &error).await;
            return AgentResult::Error {
                error,
                history: context.history().to_vec(),
                turns_used: context.turn_count(),
            };
        }
    }

    run_loop(agent, context, vec![], None).await
}

pub(crate) async fn resume_impl(agent: &Agent, run_state: AgentRunState) -> AgentResult {
    if run_state.agent_name != agent.name {
        let error = AgentError::Other {
            message: format!(
                "run state belongs to agent '{}', not '{}'",
                run_state.agent_name, agent.name
            ),
        };
        return AgentResult::Error {
            error,
            history: run_state.context.history().to_vec(),
            turns_used: run_state.turn,
        };
    }

    let approval = match run_state.approval.clone() {
        Some(approval) => approval,
        None => {
            let error = AgentError::Other {
                message: "resume called before an approval decision was set".into(),
            };
            return AgentResult::Error {
                error,
                history: run_state.context.history().to_vec(),
                turns_used: run_state.turn,
            };
        }
    };

    let mut context = run_state.context.clone();
    let pending_call = run_state.pending_tool_call.clone();
    let resolved = match approval {
        ApprovalDecision::Approved { output } => ToolOutputResult::Success { text: output },
        ApprovalDecision::Rejected { reason } => ToolOutputResult::Error { text: reason },
    };

    context.add_tool_result(ToolOutputItem {
        call_id: pending_call.call_id.clone(),
        result: resolved.clone(),
    });

    let execution = ToolExecution {
        tool_name: pending_call.name.clone(),
        call_id: pending_call.call_id.clone(),
        raw_arguments: pending_call.raw_arguments.clone(),
        output: resolved,
        wall_clock_duration: DurationMs::ZERO,
    };

    let mut all_executions = run_state.tool_executions.clone();
    all_executions.push(execution);

    let all_calls: Vec<ToolCallItem> = run_state
        .last_response
        .function_calls()
        .into_iter()
        .cloned()
        .collect();
    let idx = all_calls
        .iter()
        .position(|c| c.call_id == pending_call.call_id)
        .map(|i| i + 1)
        .unwrap_or(all_calls.len());
    let remaining = all_calls[idx..].to_vec();

    run_loop(agent, context, all_executions, Some((remaining, run_state.last_response.clone()))).await
}
