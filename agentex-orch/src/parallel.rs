//! Parallel fan-out with synthesis: N independent agents run
//! concurrently over copies of the same query, and their outputs are
//! folded into a synthesizer agent's final answer.
//!
//! A failing branch is recorded, not propagated: siblings are never
//! cancelled, and the synthesizer receives a best-effort collection
//! annotated with per-branch success/error, per the fixed contract for
//! the source's under-specified aggregation policy.

use agentex_context::AgenticContext;
use agentex_engine::{Agent, AgentResult, Interact};
use std::sync::Arc;

/// One fan-out branch: a named peer agent run over an independent
/// context copy.
#[derive(Clone)]
pub struct Branch {
    pub name: String,
    pub agent: Arc<dyn Interact>,
}

impl Branch {
    pub fn new(name: impl Into<String>, agent: Arc<dyn Interact>) -> Self {
        Self {
            name: name.into(),
            agent,
        }
    }
}

/// One branch's best-effort outcome, annotated for the synthesizer.
#[derive(Debug, Clone)]
pub enum BranchOutcome {
    Success { branch: String, output: String },
    Error { branch: String, message: String },
}

impl BranchOutcome {
    fn render(&self) -> String {
        match self {
            BranchOutcome::Success { branch, output } => format!("[{branch}] succeeded: {output}"),
            BranchOutcome::Error { branch, message } => format!("[{branch}] failed: {message}"),
        }
    }
}

/// Runs every branch concurrently over its own context copy, then feeds
/// the collected outcomes into `synthesizer` as a single user message.
pub struct ParallelAgents {
    branches: Vec<Branch>,
}

impl ParallelAgents {
    pub fn new(branches: Vec<Branch>) -> Self {
        Self { branches }
    }

    /// Issues `interact` concurrently against every branch with `query`
    /// as the user message, waits for all to complete (a peer's failure
    /// never cancels its siblings), then hands the annotated collection
    /// to `synthesizer` for a final summary.
    pub async fn run_and_synthesize(&self, query: &str, synthesizer: &Agent) -> AgentResult {
        let outcomes = self.run_branches(query).await;
        let digest = outcomes.iter().map(BranchOutcome::render).collect::<Vec<_>>().join("\n");
        synthesizer
            .interact(AgenticContext::with_user_text(format!(
                "Original query: {query}\n\nBranch results:\n{digest}"
            )))
            .await
    }

    /// The fan-out alone, without synthesis — exposed for callers that
    /// want the raw per-branch outcomes.
    pub async fn run_branches(&self, query: &str) -> Vec<BranchOutcome> {
        let handles = self.branches.iter().cloned().map(|branch| {
            let query = query.to_string();
            tokio::spawn(async move {
                let result = branch.agent.interact(AgenticContext::with_user_text(query)).await;
                match result {
                    AgentResult::Success { output, .. } => BranchOutcome::Success {
                        branch: branch.name,
                        output,
                    },
                    AgentResult::Handoff { ref inner, .. } if inner.is_success() => BranchOutcome::Success {
                        branch: branch.name,
                        output: result.output_text().unwrap_or_default().to_string(),
                    },
                    AgentResult::Error { error, .. } => BranchOutcome::Error {
                        branch: branch.name,
                        message: error.to_string(),
                    },
                    other => BranchOutcome::Error {
                        branch: branch.name,
                        message: format!("branch did not reach a usable result: {other:?}"),
                    },
                }
            })
        });

        let mut outcomes = Vec::with_capacity(self.branches.len());
        for (index, handle) in handles.enumerate() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => BranchOutcome::Error {
                    branch: self.branches[index].name.clone(),
                    message: join_error.to_string(),
                },
            };
            match &outcome {
                BranchOutcome::Success { branch, .. } => {
                    tracing::debug!(branch = %branch, "agentex.parallel.branch_succeeded");
                }
                BranchOutcome::Error { branch, message } => {
                    tracing::warn!(branch = %branch, message = %message, "agentex.parallel.branch_failed");
                }
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}
