//! Classifier-based routing: a dedicated classifier picks a target from a
//! fixed set of route descriptors, then (optionally) runs it.

use agentex_context::AgenticContext;
use agentex_engine::{Agent, AgentResult, Interact};
use async_trait::async_trait;
use std::sync::Arc;

/// One candidate destination: a named, described peer agent.
#[derive(Clone)]
pub struct RouteDescriptor {
    pub target_agent: String,
    pub trigger_description: String,
    pub target: Arc<dyn Interact>,
}

impl RouteDescriptor {
    pub fn new(
        target_agent: impl Into<String>,
        trigger_description: impl Into<String>,
        target: Arc<dyn Interact>,
    ) -> Self {
        Self {
            target_agent: target_agent.into(),
            trigger_description: trigger_description.into(),
            target,
        }
    }
}

/// Picks which route descriptor, if any, matches a piece of free-form
/// input. A classifier is typically itself backed by a model call
/// against a route-selection prompt built from the descriptors' trigger
/// descriptions, so this is async rather than a pure predicate.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, input: &str, routes: &[RouteDescriptor]) -> Option<usize>;
}

/// Adapts a synchronous predicate into a [`Classifier`], for callers
/// whose routing decision needs no model call of its own (e.g. keyword
/// matching, a regex table).
pub struct FnClassifier<F>(pub F)
where
    F: Fn(&str, &[RouteDescriptor]) -> Option<usize> + Send + Sync;

#[async_trait]
impl<F> Classifier for FnClassifier<F>
where
    F: Fn(&str, &[RouteDescriptor]) -> Option<usize> + Send + Sync,
{
    async fn classify(&self, input: &str, routes: &[RouteDescriptor]) -> Option<usize> {
        (self.0)(input, routes)
    }
}

/// A real "classifier agent": runs a dedicated agent and matches
/// its final output text against each route's `target_agent` name. Falls
/// back to no match if the agent errors, pauses, or names a route that
/// isn't in the table.
pub struct AgentClassifier {
    pub agent: Agent,
}

impl AgentClassifier {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Classifier for AgentClassifier {
    async fn classify(&self, input: &str, routes: &[RouteDescriptor]) -> Option<usize> {
        let prompt = format!(
            "Routes available:\n{}\n\nUser input: {input}\n\nRespond with only the target_agent name of the best route.",
            routes
                .iter()
                .map(|r| format!("- {}: {}", r.target_agent, r.trigger_description))
                .collect::<Vec<_>>()
                .join("\n")
        );
        let result = self.agent.interact_text(prompt).await;
        let chosen = result.output_text()?.trim().to_string();
        routes.iter().position(|r| r.target_agent == chosen)
    }
}

/// Classifies free-form input into one of a fixed set of routes, using a
/// caller-supplied [`Classifier`]. Falls back to `default_route` when the
/// classifier returns no match.
pub struct Router {
    routes: Vec<RouteDescriptor>,
    classifier: Box<dyn Classifier>,
    default_route: Option<usize>,
}

impl Router {
    pub fn new(routes: Vec<RouteDescriptor>, classifier: impl Classifier + 'static) -> Self {
        Self {
            routes,
            classifier: Box::new(classifier),
            default_route: None,
        }
    }

    pub fn with_default(mut self, target_agent: &str) -> Self {
        self.default_route = self.routes.iter().position(|r| r.target_agent == target_agent);
        self
    }

    /// Classification only: which agent would handle `input`, without
    /// running it.
    pub async fn classify(&self, input: &str) -> Option<Arc<dyn Interact>> {
        let index = self.classifier.classify(input, &self.routes).await.or(self.default_route)?;
        let route = self.routes.get(index)?;
        tracing::debug!(target_agent = %route.target_agent, "agentex.router.classified");
        Some(route.target.clone())
    }

    /// Classifies, then runs the selected route. `None` when nothing
    /// matches and no default route is configured.
    pub async fn route(&self, input: &str) -> Option<AgentResult> {
        let target = self.classify(input).await?;
        Some(target.interact(AgenticContext::with_user_text(input)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentex_engine::AgentRunState;
    use async_trait::async_trait;

    struct EchoAgent(&'static str);

    #[async_trait]
    impl Interact for EchoAgent {
        async fn interact(&self, _context: AgenticContext) -> AgentResult {
            AgentResult::Success {
                output: self.0.to_string(),
                parsed: None,
                final_response: agentex_core::ResponseEnvelope::empty(),
                history: vec![],
                tool_executions: vec![],
                turns_used: 1,
            }
        }
        async fn resume(&self, _run_state: AgentRunState) -> AgentResult {
            unreachable!()
        }
        fn name(&self) -> &str {
            self.0
        }
    }

    fn routes() -> Vec<RouteDescriptor> {
        vec![
            RouteDescriptor::new("billing", "billing and refunds", Arc::new(EchoAgent("billing agent"))),
            RouteDescriptor::new("support", "technical support", Arc::new(EchoAgent("support agent"))),
        ]
    }

    #[tokio::test]
    async fn classify_picks_the_matching_route_without_running_it() {
        let router = Router::new(
            routes(),
            FnClassifier(|input: &str, routes: &[RouteDescriptor]| {
                routes.iter().position(|r| input.contains(&r.target_agent))
            }),
        );
        let target = router.classify("refund for billing please").await.unwrap();
        assert_eq!(target.name(), "billing agent");
    }

    #[tokio::test]
    async fn classify_falls_back_to_the_default_route() {
        let router = Router::new(routes(), FnClassifier(|_: &str, _: &[RouteDescriptor]| None)).with_default("support");
        let target = router.classify("anything").await.unwrap();
        assert_eq!(target.name(), "support agent");
    }

    #[tokio::test]
    async fn classify_returns_none_with_no_match_and_no_default() {
        let router = Router::new(routes(), FnClassifier(|_: &str, _: &[RouteDescriptor]| None));
        assert!(router.classify("anything").await.is_none());
    }

    #[tokio::test]
    async fn route_classifies_and_runs() {
        let router = Router::new(
            routes(),
            FnClassifier(|input: &str, routes: &[RouteDescriptor]| {
                routes.iter().position(|r| input.contains(&r.target_agent))
            }),
        );
        let result = router.route("support ticket").await.unwrap();
        assert_eq!(result.output_text(), Some("support agent"));
    }

    struct StubClassifierResponder {
        route_name: String,
    }

    #[async_trait]
    impl agentex_core::Responder for StubClassifierResponder {
        async fn respond(
            &self,
            _payload: agentex_core::RequestPayload,
            _telemetry_ctx: &agentex_core::TelemetryContext,
            _trace_meta: Option<agentex_core::TraceMeta>,
        ) -> Result<agentex_core::ResponseEnvelope, agentex_core::AgentError> {
            Ok(agentex_core::ResponseEnvelope {
                output: vec![agentex_core::OutputItem::Message {
                    role: "assistant".into(),
                    text: self.route_name.clone(),
                }],
            })
        }

        async fn respond_stream(
            &self,
            _payload: agentex_core::RequestPayload,
            _telemetry_ctx: &agentex_core::TelemetryContext,
            _trace_meta: Option<agentex_core::TraceMeta>,
        ) -> Result<agentex_core::SseStream, agentex_core::AgentError> {
            unimplemented!("classifier routing test does not stream")
        }
    }

    #[tokio::test]
    async fn agent_classifier_picks_route_named_by_the_model() {
        let responder = Arc::new(StubClassifierResponder {
            route_name: "billing".into(),
        });
        let classifier_agent = Agent::builder("router", "M1", responder).build();
        let router = Router::new(routes(), AgentClassifier::new(classifier_agent));

        let target = router.classify("I was double charged").await.unwrap();
        assert_eq!(target.name(), "billing agent");
    }
}
