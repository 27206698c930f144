//! `Agent`: immutable configuration, safe to invoke concurrently from
//! multiple callers because it holds no per-call mutable state — all
//! per-call state lives in `AgenticContext`.

use crate::guardrail::Guardrail;
use crate::traits::Interact;
use agentex_context::{CompactionStrategy, TokenCounter};
use agentex_core::{Responder, TelemetryProcessorRegistry};
use agentex_tool::{ToolPlanMetaTool, ToolRegistry};
use serde_json::Value;
use std::sync::Arc;

/// A peer-agent reference rendered into the tool catalogue as a synthetic
/// tool whose "invocation" is in fact a transfer of control.
#[derive(Clone)]
pub struct Handoff {
    pub name: String,
    pub description: String,
    pub target: Arc<dyn Interact>,
}

impl Handoff {
    pub fn new(name: impl Into<String>, description: impl Into<String>, target: Arc<dyn Interact>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            target,
        }
    }
}

/// Decodes the final assistant text into a structured value when an
/// `outputType` schema is configured.
#[derive(Clone)]
pub struct OutputTypeConfig {
    pub decode: Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>,
}

/// Pairs a compaction strategy with the token counter it should use.
#[derive(Clone)]
pub struct ContextManagementConfig {
    pub strategy: Arc<dyn CompactionStrategy>,
    pub token_counter: Arc<dyn TokenCounter>,
}

/// Immutable agent configuration.
#[derive(Clone)]
pub struct Agent {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Arc<ToolRegistry>,
    pub handoffs: Vec<Handoff>,
    pub input_guardrails: Vec<Arc<dyn Guardrail>>,
    pub output_guardrails: Vec<Arc<dyn Guardrail>>,
    pub max_turns: u32,
    pub output_type: Option<OutputTypeConfig>,
    pub temperature: Option<f64>,
    pub context_management: Option<ContextManagementConfig>,
    pub responder: Arc<dyn Responder>,
    pub telemetry: Arc<TelemetryProcessorRegistry>,
}

/// A tool name that is also a configured handoff's synthetic name. Real
/// tools always win this collision: the handoff is simply not triggered
/// for that name.
impl Agent {
    pub fn handoff_for(&self, tool_name: &str) -> Option<&Handoff> {
        if self.tools.contains(tool_name) {
            return None;
        }
        self.handoffs.iter().find(|h| h.name == tool_name)
    }

    pub fn builder(name: impl Into<String>, model: impl Into<String>, responder: Arc<dyn Responder>) -> AgentBuilder {
        AgentBuilder::new(name, model, responder)
    }
}

/// Builds an [`Agent`] with sensible defaults (`maxTurns = 10`, as
/// specified).
pub struct AgentBuilder {
    name: String,
    instructions: String,
    model: String,
    tools: ToolRegistry,
    handoffs: Vec<Handoff>,
    input_guardrails: Vec<Arc<dyn Guardrail>>,
    output_guardrails: Vec<Arc<dyn Guardrail>>,
    max_turns: u32,
    output_type: Option<OutputTypeConfig>,
    temperature: Option<f64>,
    context_management: Option<ContextManagementConfig>,
    responder: Arc<dyn Responder>,
    telemetry: TelemetryProcessorRegistry,
    tool_plan_meta_tool_enabled: bool,
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>, model: impl Into<String>, responder: Arc<dyn Responder>) -> Self {
        Self {
            name: name.into(),
            instructions: String::new(),
            model: model.into(),
            tools: ToolRegistry::new(),
            handoffs: vec![],
            input_guardrails: vec![],
            output_guardrails: vec![],
            max_turns: 10,
            output_type: None,
            temperature: None,
            context_management: None,
            responder,
            telemetry: TelemetryProcessorRegistry::new(),
            tool_plan_meta_tool_enabled: false,
        }
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn handoff(mut self, handoff: Handoff) -> Self {
        self.handoffs.push(handoff);
        self
    }

    pub fn input_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.input_guardrails.push(guardrail);
        self
    }

    pub fn output_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.output_guardrails.push(guardrail);
        self
    }

    pub fn max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn output_type(mut self, output_type: OutputTypeConfig) -> Self {
        self.output_type = Some(output_type);
        self
    }

    /// Registers the tool-plan meta-tool alongside whatever
    /// tools have already been registered. The meta-tool dispatches
    /// against a snapshot of the registry as it stood at this point; it
    /// never references itself, so it cannot be nested inside its own
    /// plan.
    pub fn enable_tool_plan_meta_tool(mut self) -> Self {
        self.tool_plan_meta_tool_enabled = true;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn context_management(mut self, config: ContextManagementConfig) -> Self {
        self.context_management = Some(config);
        self
    }

    pub fn telemetry(mut self, telemetry: TelemetryProcessorRegistry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn build(self) -> Agent {
        let mut tools = self.tools;
        if self.tool_plan_meta_tool_enabled {
            let snapshot = Arc::new(tools.clone());
            tools
                .register(Arc::new(ToolPlanMetaTool::new(snapshot)))
                .expect("tool-plan meta-tool name collides with a registered tool");
        }

        Agent {
            name: self.name,
            instructions: self.instructions,
            model: self.model,
            tools: Arc::new(tools),
            handoffs: self.handoffs,
            input_guardrails: self.input_guardrails,
            output_guardrails: self.output_guardrails,
            max_turns: self.max_turns,
            output_type: self.output_type,
            temperature: self.temperature,
            context_management: self.context_management,
            responder: self.responder,
            telemetry: Arc::new(self.telemetry),
        }
    }
}
