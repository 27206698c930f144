//! Tool registry and dispatcher, plus the opt-in tool-plan meta-tool.

pub mod execution;
pub mod plan;
pub mod registry;
pub mod tool;

pub use execution::{dispatch, ToolExecution};
pub use plan::{ToolPlan, ToolPlanError, ToolPlanMetaTool, ToolPlanStep, TOOL_PLAN_META_TOOL_NAME};
pub use registry::{ToolRegistry, ToolRegistryError};
pub use tool::{BoxFuture, FnTool, Tool, ToolCallError};
