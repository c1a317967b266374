//! ankimcp - Anki flashcards for AI assistants.
//!
//! This is the main entry point for the ankimcp CLI. By default it serves
//! the Anki tools over MCP on stdio.

mod commands;

use ankimcp_connect::config::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HOST, DEFAULT_MAX_ATTEMPTS, DEFAULT_PORT,
    DEFAULT_RETRY_BACKOFF_MS, DEFAULT_TIMEOUT_SECS,
};
use ankimcp_connect::AnkiConfig;
use ankimcp_tools::settings::{DEFAULT_LIMIT, DEFAULT_MAX_FUTURE_DAYS};
use ankimcp_tools::ToolSettings;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ankimcp")]
#[command(author, version, about = "Anki flashcards over the Model Context Protocol", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    anki: AnkiArgs,

    #[command(flatten)]
    tools: ToolArgs,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the Anki tools over MCP on stdin/stdout (default)
    Serve,
    /// Check that AnkiConnect is reachable and print its API version
    Check,
}

/// Where to find AnkiConnect.
#[derive(Args, Debug)]
struct AnkiArgs {
    /// Full AnkiConnect URL; overrides --anki-host and --anki-port
    #[arg(long, global = true, env = "ANKI_CONNECT_URL")]
    anki_url: Option<String>,

    /// AnkiConnect host
    #[arg(long, global = true, env = "ANKI_CONNECT_HOST", default_value = DEFAULT_HOST)]
    anki_host: String,

    /// AnkiConnect port
    #[arg(long, global = true, env = "ANKI_CONNECT_PORT", default_value_t = DEFAULT_PORT)]
    anki_port: u16,

    /// AnkiConnect API key, if the add-on requires one
    #[arg(long, global = true, env = "ANKI_CONNECT_KEY", hide_env_values = true)]
    anki_key: Option<String>,

    /// Connection timeout in seconds
    #[arg(long, global = true, env = "ANKI_CONNECT_CONNECT_TIMEOUT", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout: u64,

    /// Whole-request timeout in seconds
    #[arg(long, global = true, env = "ANKI_CONNECT_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Attempts per AnkiConnect call before giving up
    #[arg(long, global = true, env = "ANKI_CONNECT_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Delay before the first retry in milliseconds; doubles on each retry
    #[arg(long, global = true, env = "ANKI_CONNECT_RETRY_BACKOFF_MS", default_value_t = DEFAULT_RETRY_BACKOFF_MS)]
    retry_backoff_ms: u64,
}

impl AnkiArgs {
    fn config(&self) -> AnkiConfig {
        AnkiConfig {
            url: self.anki_url.clone().filter(|url| !url.trim().is_empty()),
            host: self.anki_host.clone(),
            port: self.anki_port,
            api_key: self.anki_key.clone().filter(|key| !key.is_empty()),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            timeout: Duration::from_secs(self.timeout),
            max_attempts: self.max_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

/// Tool behaviour.
#[derive(Args, Debug)]
struct ToolArgs {
    /// Hide decks, note types and notes containing these strings (comma separated)
    #[arg(long, global = true, env = "ANKIMCP_EXCLUDE", value_delimiter = ',', default_value = "AnKing")]
    exclude: Vec<String>,

    /// Days ahead get_due_cards looks when not limited to today
    #[arg(long, global = true, env = "ANKIMCP_MAX_FUTURE_DAYS", default_value_t = DEFAULT_MAX_FUTURE_DAYS)]
    max_future_days: u32,
}

impl ToolArgs {
    fn settings(&self) -> ToolSettings {
        ToolSettings {
            exclude: self
                .exclude
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_future_days: self.max_future_days,
            default_limit: DEFAULT_LIMIT,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = cli.anki.config();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve(&config, cli.tools.settings()).await,
        Commands::Check => commands::check(&config).await,
    }
}

/// Initialize logging to stderr. stdout carries the MCP protocol.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "ankimcp=debug,ankimcp_connect=debug,ankimcp_mcp=debug,ankimcp_tools=debug"
    } else {
        "ankimcp=info,ankimcp_connect=info,ankimcp_mcp=info,ankimcp_tools=info"
    };

    // RUST_LOG wins over the built-in defaults
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}
