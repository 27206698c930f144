//! The tool-plan meta-tool (GLOSSARY: "tool-plan meta-tool"): an optional
//! single tool exposing a declarative multi-step plan to the model.
//! Steps are locally topo-sorted by `$ref`-style dependencies; every
//! step in a wave with no unresolved dependency runs concurrently. Only
//! the plan's designated `output_steps` results re-enter the model's
//! context — intermediate steps stay internal to the plan.
//!
//! This is opt-in: the default loop runs a turn's tool calls
//! sequentially in declaration order. An agent adopts this by
//! registering [`ToolPlanMetaTool`] in its [`crate::ToolRegistry`] like
//! any other tool.

use crate::registry::ToolRegistry;
use crate::tool::{BoxFuture, Tool, ToolCallError};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

pub const TOOL_PLAN_META_TOOL_NAME: &str = "execute_tool_plan";

/// One step in a plan: call `tool` with `arguments`, whose string values
/// may reference an earlier step's text output via `"$ref:<step_id>"`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolPlanStep {
    pub id: String,
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

/// A declarative multi-step plan. `output_steps` names which steps'
/// results are fed back into the model; every other step's result stays
/// internal to the plan.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolPlan {
    pub steps: Vec<ToolPlanStep>,
    #[serde(default)]
    pub output_steps: Vec<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolPlanError {
    #[error("duplicate step id '{0}'")]
    DuplicateStepId(String),
    #[error("step '{0}' references unknown step '{1}'")]
    UnknownRef(String, String),
    #[error("plan contains a dependency cycle")]
    Cycle,
}

fn referenced_step_ids(value: &Value, out: &mut HashSet<String>) {
    match value {
        Value::String(s) => {
            if let Some(id) = s.strip_prefix("$ref:") {
                out.insert(id.to_string());
            }
        }
        Value::Array(items) => items.iter().for_each(|v| referenced_step_ids(v, out)),
        Value::Object(map) => map.values().for_each(|v| referenced_step_ids(v, out)),
        _ => {}
    }
}

fn resolve_refs(value: &Value, outputs: &HashMap<String, String>) -> Value {
    match value {
        Value::String(s) => match s.strip_prefix("$ref:").and_then(|id| outputs.get(id)) {
            Some(text) => Value::String(text.clone()),
            None => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve_refs(v, outputs)).collect()),
        Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), resolve_refs(v, outputs))).collect()),
        other => other.clone(),
    }
}

/// Groups step indices into waves: every step in a wave depends only on
/// steps from earlier waves, so a wave's steps can all run concurrently.
fn topo_waves(steps: &[ToolPlanStep]) -> Result<Vec<Vec<usize>>, ToolPlanError> {
    let mut seen_ids = HashSet::new();
    for step in steps {
        if !seen_ids.insert(step.id.clone()) {
            return Err(ToolPlanError::DuplicateStepId(step.id.clone()));
        }
    }

    let mut deps: Vec<HashSet<String>> = Vec::with_capacity(steps.len());
    for step in steps {
        let mut refs = HashSet::new();
        referenced_step_ids(&step.arguments, &mut refs);
        for id in &refs {
            if !seen_ids.contains(id) {
                return Err(ToolPlanError::UnknownRef(step.id.clone(), id.clone()));
            }
        }
        deps.push(refs);
    }

    let mut resolved: HashSet<String> = HashSet::new();
    let mut remaining: Vec<usize> = (0..steps.len()).collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
        let (ready, not_ready): (Vec<usize>, Vec<usize>) =
            remaining.iter().partition(|&&i| deps[i].iter().all(|d| resolved.contains(d)));
        if ready.is_empty() {
            return Err(ToolPlanError::Cycle);
        }
        for &i in &ready {
            resolved.insert(steps[i].id.clone());
        }
        waves.push(ready);
        remaining = not_ready;
    }

    Ok(waves)
}

/// Executes every step of `plan` against `registry`, running each wave's
/// independent steps in parallel, and returns the designated output
/// steps' text results keyed by step id. Steps not named in
/// `output_steps` still run (later steps may `$ref` their output) but
/// their result never re-enters the model's context.
pub async fn execute_plan(registry: &ToolRegistry, plan: &ToolPlan) -> Result<HashMap<String, String>, ToolPlanError> {
    let waves = topo_waves(&plan.steps)?;
    let mut outputs: HashMap<String, String> = HashMap::new();

    for wave in waves {
        let pending = wave.iter().map(|&i| {
            let step = &plan.steps[i];
            let resolved_args = resolve_refs(&step.arguments, &outputs);
            let step_id = step.id.clone();
            let tool_name = step.tool.clone();
            async move {
                let text = match registry.get(&tool_name) {
                    None => format!("error: no tool named '{tool_name}' is registered"),
                    Some(tool) => match tool.call(resolved_args).await {
                        Ok(text) => text,
                        Err(e) => format!("error: {e}"),
                    },
                };
                (step_id, text)
            }
        });
        for (id, text) in futures_util::future::join_all(pending).await {
            outputs.insert(id, text);
        }
    }

    Ok(plan
        .output_steps
        .iter()
        .filter_map(|id| outputs.get(id).map(|text| (id.clone(), text.clone())))
        .collect())
}

/// Adapts [`execute_plan`] into an ordinary [`Tool`], so an agent opts in
/// simply by registering it like any other tool.
pub struct ToolPlanMetaTool {
    registry: Arc<ToolRegistry>,
}

impl ToolPlanMetaTool {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

impl Tool for ToolPlanMetaTool {
    fn name(&self) -> &str {
        TOOL_PLAN_META_TOOL_NAME
    }

    fn description(&self) -> Option<&str> {
        Some(
            "Executes a declarative multi-step tool plan locally, running independent steps \
             in parallel. Only the named output_steps results are returned to you.",
        )
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "steps": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "tool": { "type": "string" },
                            "arguments": { "type": "object" }
                        },
                        "required": ["id", "tool"]
                    }
                },
                "output_steps": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["steps"]
        })
    }

    fn call(&self, raw_arguments: Value) -> BoxFuture<'_, Result<String, ToolCallError>> {
        Box::pin(async move {
            let plan: ToolPlan = serde_json::from_value(raw_arguments).map_err(|e| ToolCallError::Parse(e.to_string()))?;
            let outputs = execute_plan(&self.registry, &plan).await.map_err(|e| ToolCallError::Invoke(e.to_string()))?;
            serde_json::to_string(&outputs).map_err(|e| ToolCallError::Invoke(e.to_string()))
        })
    }
}
