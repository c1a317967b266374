//! `check` command: verify AnkiConnect is reachable.

use ankimcp_connect::{AnkiClient, AnkiConfig};
use anyhow::Context;

/// Call the `version` action and print the result.
pub async fn check(config: &AnkiConfig) -> anyhow::Result<()> {
    let endpoint = config.endpoint()?;
    let client = AnkiClient::new(config).context("Failed to create AnkiConnect client")?;

    let version = client
        .version()
        .await
        .with_context(|| format!("AnkiConnect check failed at {endpoint}"))?;

    println!("AnkiConnect is reachable at {endpoint} (API version {version})");
    Ok(())
}
