//! Model Context Protocol (MCP) server for ankimcp.
//!
//! A tools-only MCP server speaking newline-delimited JSON-RPC on stdio.
//! Tools are registered as explicit descriptors in a [`ToolSet`] and the
//! server dispatches `tools/call` by name.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ MCP client  │────▶│   McpServer    │────▶│   ToolSet   │
//! │ (assistant) │◀────│ stdio JSON-RPC │◀────│ (executors) │
//! └─────────────┘     └────────────────┘     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ankimcp_mcp::{ClosureExecutor, McpServer, McpServerToolBuilder, ToolSet};
//!
//! # async fn example() -> ankimcp_mcp::McpResult<()> {
//! let mut tools = ToolSet::new();
//! tools.register(
//!     McpServerToolBuilder::new("hello")
//!         .description("Say hello")
//!         .build(ClosureExecutor::new(|_| Ok("hello".to_string()))),
//! )?;
//!
//! McpServer::new("demo", "0.1.0", tools).serve_stdio().await
//! # }
//! ```

mod error;
pub mod protocol;
pub mod serve;
mod server;

pub use error::{McpError, McpResult};
pub use protocol::{McpTool, ToolCallResult, ToolContent};
pub use serve::{ClosureExecutor, McpServerTool, McpServerToolBuilder, McpToolExecutor, ToolSet};
pub use server::McpServer;
