//! Tool descriptors for the MCP server.
//!
//! A tool is an explicit value: name, description, JSON Schema for its
//! arguments, and an executor. Tools are collected into a [`ToolSet`] once
//! at start-up and the server dispatches `tools/call` by name.

use crate::error::{McpError, McpResult};
use crate::protocol::McpTool;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool definition for the MCP server.
#[derive(Clone)]
pub struct McpServerTool {
    /// Tool name/ID.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for parameters.
    pub parameters: Value,
    /// Tool executor.
    pub executor: Arc<dyn McpToolExecutor>,
}

impl McpServerTool {
    /// Wire description of this tool for `tools/list`.
    pub fn to_mcp_tool(&self) -> McpTool {
        McpTool {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            input_schema: self.parameters.clone(),
        }
    }
}

impl std::fmt::Debug for McpServerTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServerTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Trait for tool execution.
///
/// `Err` carries text for the model; it is returned as a tool result with
/// `isError` set, not as a JSON-RPC error.
#[async_trait::async_trait]
pub trait McpToolExecutor: Send + Sync {
    /// Execute the tool with given arguments.
    async fn execute(&self, args: Value) -> Result<String, String>;
}

/// Builder for McpServerTool.
pub struct McpServerToolBuilder {
    name: String,
    description: String,
    parameters: Value,
}

impl McpServerToolBuilder {
    /// Create a new tool builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    /// Set the tool description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the parameters schema.
    pub fn parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Build the tool with an executor.
    pub fn build(self, executor: impl McpToolExecutor + 'static) -> McpServerTool {
        McpServerTool {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            executor: Arc::new(executor),
        }
    }
}

/// Named tools available to the server.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    tools: HashMap<String, McpServerTool>,
}

impl ToolSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: McpServerTool) -> McpResult<()> {
        if self.tools.contains_key(&tool.name) {
            return Err(McpError::DuplicateTool(tool.name));
        }
        self.tools.insert(tool.name.clone(), tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> McpResult<&McpServerTool> {
        self.tools
            .get(name)
            .ok_or_else(|| McpError::ToolNotFound(name.to_string()))
    }

    /// Tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Wire descriptions of all tools, sorted by name.
    pub fn describe(&self) -> Vec<McpTool> {
        let mut tools: Vec<McpTool> = self.tools.values().map(McpServerTool::to_mcp_tool).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Simple executor that wraps a closure.
pub struct ClosureExecutor<F>
where
    F: Fn(Value) -> Result<String, String> + Send + Sync,
{
    f: F,
}

impl<F> ClosureExecutor<F>
where
    F: Fn(Value) -> Result<String, String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait::async_trait]
impl<F> McpToolExecutor for ClosureExecutor<F>
where
    F: Fn(Value) -> Result<String, String> + Send + Sync,
{
    async fn execute(&self, args: Value) -> Result<String, String> {
        (self.f)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_tool(name: &str) -> McpServerTool {
        McpServerToolBuilder::new(name)
            .description("Echo the input")
            .build(ClosureExecutor::new(|args| {
                let msg = args
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("default");
                Ok(msg.to_string())
            }))
    }

    #[tokio::test]
    async fn test_closure_executor() {
        let tool = echo_tool("echo");
        let result = tool
            .executor
            .execute(serde_json::json!({"message": "hello"}))
            .await;
        assert_eq!(result.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_closure_executor_error() {
        let executor = ClosureExecutor::new(|_| Err("Something went wrong".to_string()));
        let result = executor.execute(serde_json::json!({})).await;
        assert_eq!(result.unwrap_err(), "Something went wrong");
    }

    #[test]
    fn test_builder_defaults() {
        let builder = McpServerToolBuilder::new("test-tool");
        assert_eq!(builder.name, "test-tool");
        assert!(builder.description.is_empty());
        assert_eq!(builder.parameters["type"], "object");
    }

    #[test]
    fn test_builder_parameters() {
        let params = serde_json::json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"}
            }
        });
        let tool = McpServerToolBuilder::new("param-tool")
            .parameters(params.clone())
            .build(ClosureExecutor::new(|_| Ok(String::new())));
        assert_eq!(tool.to_mcp_tool().input_schema, params);
    }

    #[test]
    fn test_tool_debug() {
        let debug_str = format!("{:?}", echo_tool("debug-tool"));
        assert!(debug_str.contains("debug-tool"));
        assert!(debug_str.contains("Echo the input"));
    }

    #[test]
    fn test_tool_set_rejects_duplicates() {
        let mut set = ToolSet::new();
        set.register(echo_tool("echo")).unwrap();
        let err = set.register(echo_tool("echo")).unwrap_err();
        assert!(matches!(err, McpError::DuplicateTool(name) if name == "echo"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_tool_set_is_sorted() {
        let mut set = ToolSet::new();
        for name in ["zeta", "alpha", "mid"] {
            set.register(echo_tool(name)).unwrap();
        }
        assert_eq!(set.names(), vec!["alpha", "mid", "zeta"]);
        let described: Vec<String> = set.describe().into_iter().map(|t| t.name).collect();
        assert_eq!(described, vec!["alpha", "mid", "zeta"]);
        assert!(set.get("mid").is_ok());
        assert!(matches!(
            set.get("missing"),
            Err(McpError::ToolNotFound(name)) if name == "missing"
        ));
    }
}
