//! Tool registry.
//!
//! Built once at start-up and turned into the MCP server's [`ToolSet`].

use crate::{BoxedTool, ToolContext, ToolSettings};
use ankimcp_connect::AnkiClient;
use ankimcp_mcp::{McpResult, McpServerToolBuilder, McpToolExecutor, ToolSet};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, BoxedTool>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with all built-in tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        // Review
        registry.register(Arc::new(crate::due::NumCardsDueTodayTool));
        registry.register(Arc::new(crate::due::GetDueCardsTool));
        registry.register(Arc::new(crate::submit::SubmitReviewsTool));

        // Authoring
        registry.register(Arc::new(crate::decks::ListDecksAndNotesTool));
        registry.register(Arc::new(crate::samples::GetExamplesTool));
        registry.register(Arc::new(crate::add_note::AddNoteTool));

        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: BoxedTool) {
        self.tools.insert(tool.id().to_string(), tool);
    }

    /// Turn every tool into an MCP descriptor bound to `ctx`.
    pub fn into_tool_set(self, ctx: ToolContext) -> McpResult<ToolSet> {
        let ctx = Arc::new(ctx);
        let mut set = ToolSet::new();

        for tool in self.tools.into_values() {
            let descriptor = McpServerToolBuilder::new(tool.id())
                .description(tool.description())
                .parameters(tool.parameters_schema())
                .build(ToolExecutor {
                    tool,
                    ctx: Arc::clone(&ctx),
                });
            set.register(descriptor)?;
        }

        Ok(set)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the MCP tool set for `client`.
pub fn registry(client: AnkiClient, settings: ToolSettings) -> McpResult<ToolSet> {
    ToolRegistry::with_builtins().into_tool_set(ToolContext::new(client, settings))
}

/// Runs a tool and renders its failure as model-facing text.
struct ToolExecutor {
    tool: BoxedTool,
    ctx: Arc<ToolContext>,
}

#[async_trait]
impl McpToolExecutor for ToolExecutor {
    async fn execute(&self, args: Value) -> Result<String, String> {
        let id = self.tool.id();
        debug!(tool = %id, "Executing tool");

        self.tool.execute(args, &self.ctx).await.map_err(|e| {
            error!(tool = %id, error = %e, "Tool failed");
            e.render(id)
        })
    }
}
