//! Cross-crate composition tests: these exercise the orchestration
//! composites (`agentex-orch`) and sub-agent-as-tool (`agentex-engine`)
//! layered on top of a real `Agent` and tool registry, against the stub
//! transport. Each test wires together components that live in different
//! crates, the way a caller actually would.

use agentex::prelude::*;
use agentex_engine::test_support::StubResponder;
use agentex_core::{OutputItem, ResponseEnvelope, ToolCallItem};
use serde_json::json;
use std::sync::Arc;

fn message_response(text: &str) -> ResponseEnvelope {
    ResponseEnvelope {
        output: vec![OutputItem::Message {
            role: "assistant".into(),
            text: text.into(),
        }],
    }
}

fn tool_call_response(name: &str, call_id: &str, args: serde_json::Value) -> ResponseEnvelope {
    ResponseEnvelope {
        output: vec![OutputItem::FunctionCall(ToolCallItem {
            name: name.into(),
            call_id: call_id.into(),
            raw_arguments: args,
        })],
    }
}

// A sub-agent embedded as a tool, invoked mid-loop by a parent agent, whose
// result re-enters the parent loop instead of terminating it (the
// distinction between sub-agent-as-tool and handoff).
#[tokio::test]
async fn parent_agent_calls_a_sub_agent_tool_and_keeps_looping() {
    let weather_responder = Arc::new(StubResponder::with_responses(vec![message_response("22\u{b0}C and clear")]));
    let weather_agent = Arc::new(Agent::builder("weather", "M1", weather_responder).build());
    let weather_tool = AgentAsTool::new("ask_weather_agent", "delegates to the weather sub-agent", weather_agent);

    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(weather_tool)).unwrap();

    let parent_responder = Arc::new(StubResponder::with_responses(vec![
        tool_call_response("ask_weather_agent", "c1", json!({"input": "how hot is Tokyo?"})),
        message_response("It's 22\u{b0}C and clear in Tokyo."),
    ]));
    let parent = Agent::builder("concierge", "M1", parent_responder).tools(tools).build();

    let result = parent.interact_text("what's the weather like?").await;
    match result {
        AgentResult::Success { output, turns_used, tool_executions, .. } => {
            assert_eq!(output, "It's 22\u{b0}C and clear in Tokyo.");
            assert_eq!(turns_used, 2);
            assert_eq!(tool_executions[0].output.text(), "22\u{b0}C and clear");
        }
        other => panic!("expected Success, got {other:?}"),
    }
}

// A classifier-based router picks between two peer agents, then a
// parallel fan-out over a different pair is synthesized into one answer.
// Two orchestration composites from agentex-orch, driven end to end.
#[tokio::test]
async fn router_selects_a_peer_then_a_parallel_fan_out_is_synthesized() {
    let billing_responder = Arc::new(StubResponder::with_responses(vec![message_response("refund issued")]));
    let billing = Arc::new(Agent::builder("billing", "M1", billing_responder).build());
    let support_responder = Arc::new(StubResponder::with_responses(vec![message_response("ticket opened")]));
    let support = Arc::new(Agent::builder("support", "M1", support_responder).build());

    let routes = vec![
        RouteDescriptor::new("billing", "billing and refunds", billing),
        RouteDescriptor::new("support", "technical support", support),
    ];
    let router = Router::new(
        routes,
        FnClassifier(|input: &str, routes: &[RouteDescriptor]| {
            routes.iter().position(|r| input.contains(&r.target_agent))
        }),
    );

    let routed = router.route("billing dispute please").await.unwrap();
    assert_eq!(routed.output_text(), Some("refund issued"));

    let weather_responder = Arc::new(StubResponder::with_responses(vec![message_response("sunny")]));
    let weather_branch = Arc::new(Agent::builder("weather", "M1", weather_responder).build());
    let news_responder = Arc::new(StubResponder::with_responses(vec![message_response("no major headlines")]));
    let news_branch = Arc::new(Agent::builder("news", "M1", news_responder).build());

    let fan_out = ParallelAgents::new(vec![
        Branch::new("weather", weather_branch),
        Branch::new("news", news_branch),
    ]);
    let synthesizer_responder = Arc::new(StubResponder::with_responses(vec![message_response(
        "Today: sunny, and no major headlines.",
    )]));
    let synthesizer = Agent::builder("synthesizer", "M1", synthesizer_responder).build();

    let synthesized = fan_out.run_and_synthesize("how's today?", &synthesizer).await;
    assert_eq!(synthesized.output_text(), Some("Today: sunny, and no major headlines."));
}

// The tool-plan meta-tool running inside a real agent loop: the
// model emits one function call carrying a declarative multi-step plan,
// and the aggregated result of the designated output steps feeds back in
// on the following turn.
#[tokio::test]
async fn tool_plan_meta_tool_runs_inside_a_real_agent_loop() {
    let mut tools = ToolRegistry::new();
    tools
        .register(Arc::new(FnTool::new("lookup_price", json!({}), |args: serde_json::Value| async move {
            let item = args.get("item").and_then(serde_json::Value::as_str).unwrap_or_default();
            Ok(format!("{item}:10"))
        })))
        .unwrap();
    tools
        .register(Arc::new(FnTool::new("lookup_stock", json!({}), |args: serde_json::Value| async move {
            let item = args.get("item").and_then(serde_json::Value::as_str).unwrap_or_default();
            Ok(format!("{item}:in-stock"))
        })))
        .unwrap();

    let plan = json!({
        "steps": [
            {"id": "price", "tool": "lookup_price", "arguments": {"item": "widget"}},
            {"id": "stock", "tool": "lookup_stock", "arguments": {"item": "widget"}},
        ],
        "output_steps": ["price", "stock"],
    });

    let responder = Arc::new(StubResponder::with_responses(vec![
        tool_call_response(agentex_tool::TOOL_PLAN_META_TOOL_NAME, "c1", plan),
        message_response("Widget is 10 and in stock."),
    ]));
    let agent = Agent::builder("catalog", "M1", responder)
        .tools(tools)
        .enable_tool_plan_meta_tool()
        .build();

    let result = agent.interact_text("tell me about the widget").await;
    match result {
        AgentResult::Success { output, tool_executions, .. } => {
            assert_eq!(output, "Widget is 10 and in stock.");
            assert_eq!(tool_executions.len(), 1);
            let aggregated: serde_json::Value = serde_json::from_str(tool_executions[0].output.text()).unwrap();
            assert_eq!(aggregated["price"], "widget:10");
            assert_eq!(aggregated["stock"], "widget:in-stock");
        }
        other => panic!("expected Success, got {other:?}"),
    }
}
