//! AnkiConnect client for ankimcp.
//!
//! AnkiConnect is an Anki add-on that exposes the collection over a small
//! JSON-over-HTTP API. Every call posts an action envelope and receives an
//! `{error, result}` pair.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  AnkiClient │────▶│ AnkiTransport│────▶│ AnkiConnect  │
//! │ retry, shape│◀────│  (reqwest)   │◀────│ (Anki add-on)│
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Connection failures and timeouts are retried with a short exponential
//! backoff. Malformed responses and errors reported by Anki fail at once.
//!
//! # Example
//!
//! ```no_run
//! use ankimcp_connect::{AnkiClient, AnkiConfig};
//!
//! # async fn example() -> ankimcp_connect::AnkiResult<()> {
//! let client = AnkiClient::new(&AnkiConfig::default())?;
//! let due = client.find_cards("is:due").await?;
//! println!("{} cards due", due.len());
//! # Ok(())
//! # }
//! ```

pub mod action;
mod client;
pub mod config;
mod error;
pub mod retry;
pub mod transport;
pub mod types;

pub use action::{Action, ActionRequest, API_VERSION};
pub use client::AnkiClient;
pub use config::AnkiConfig;
pub use error::{AnkiError, AnkiResult};
pub use retry::RetryPolicy;
pub use transport::{AnkiTransport, HttpReply, HttpTransport, TransportError};
pub use types::{CardAnswer, CardInfo, FieldValue, NewNote, NoteInfo, NoteOptions};
