//! Anki tools for ankimcp.
//!
//! This crate provides the tools an assistant uses to review due cards and
//! author new notes. Each tool turns model-facing arguments into AnkiConnect
//! calls and reshapes the answers into text for the model.

pub mod error;
pub mod registry;
pub mod settings;

// Tool implementations
pub mod add_note;
pub mod decks;
pub mod due;
pub mod prompts;
pub mod samples;
pub mod submit;

pub use error::{ToolError, ToolResult};
pub use registry::{registry, ToolRegistry};
pub use settings::ToolSettings;

use ankimcp_connect::AnkiClient;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Context shared by every tool call.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// AnkiConnect client.
    pub client: AnkiClient,
    /// Tool behaviour settings.
    pub settings: ToolSettings,
}

impl ToolContext {
    pub fn new(client: AnkiClient, settings: ToolSettings) -> Self {
        Self { client, settings }
    }
}

/// The main trait for tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool ID.
    fn id(&self) -> &str;

    /// Get the tool description (for the AI).
    fn description(&self) -> &str;

    /// Get the JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool, returning text for the model.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<String>;
}

/// A boxed tool for dynamic dispatch.
pub type BoxedTool = Arc<dyn Tool>;
