//! Tool system.
//!
//! Tools are the agent's interface to the outside world. The registry holds
//! the live set of callables; integrations such as the Composio bridge insert
//! and remove tools at runtime as accounts are connected and disconnected.

mod registry;
mod tool;

pub use registry::ToolRegistry;
pub use tool::{
    Tool, ToolError, ToolOutput, ToolSchema, empty_object_schema, validate_tool_schema,
};
