//! `serve` command: run the MCP server on stdio.

use ankimcp_connect::{AnkiClient, AnkiConfig};
use ankimcp_mcp::McpServer;
use ankimcp_tools::ToolSettings;
use anyhow::Context;
use tracing::info;

const INSTRUCTIONS: &str = "Tools for studying with Anki. Use num_cards_due_today and \
get_due_cards to start a review session, quiz the user one card at a time, then rate every \
card with submit_reviews. Before creating cards with add_note, look at list_decks_and_notes \
and get_examples and get the user's approval.";

/// Serve the Anki tools until stdin closes.
pub async fn serve(config: &AnkiConfig, settings: ToolSettings) -> anyhow::Result<()> {
    let client = AnkiClient::new(config).context("Failed to create AnkiConnect client")?;
    let tools = ankimcp_tools::registry(client, settings).context("Failed to register tools")?;

    info!(tools = ?tools.names(), "Starting ankimcp");

    McpServer::new("ankimcp", env!("CARGO_PKG_VERSION"), tools)
        .with_instructions(INSTRUCTIONS)
        .serve_stdio()
        .await
        .context("MCP server failed")?;

    info!("ankimcp stopped");
    Ok(())
}
