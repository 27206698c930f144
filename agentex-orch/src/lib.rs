//! Orchestration composites built on top of the execution engine:
//! classifier-based routing and parallel fan-out with synthesis.

pub mod parallel;
pub mod router;

pub use parallel::{Branch, BranchOutcome, ParallelAgents};
pub use router::{AgentClassifier, Classifier, FnClassifier, RouteDescriptor, Router};
