//! HTTP transport for AnkiConnect.
//!
//! The client talks to Anki through the [`AnkiTransport`] trait so the retry
//! and response handling can run against a scripted transport in tests.

use crate::config::AnkiConfig;
use crate::error::{AnkiError, AnkiResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Raw HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Failure to complete an HTTP round-trip.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The request did not complete in time.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Any other failure while sending or reading.
    #[error("Request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Transport trait for AnkiConnect communication.
#[async_trait]
pub trait AnkiTransport: Send + Sync {
    /// Post a JSON body and return the raw reply.
    async fn post(&self, body: &Value) -> Result<HttpReply, TransportError>;
}

/// `reqwest` based transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: Url,
}

impl HttpTransport {
    /// Create a transport from connection settings.
    pub fn new(config: &AnkiConfig) -> AnkiResult<Self> {
        let url = config.endpoint()?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(AnkiError::Client)?;

        Ok(Self { client, url })
    }

    /// Endpoint this transport posts to.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl AnkiTransport for HttpTransport {
    async fn post(&self, body: &Value) -> Result<HttpReply, TransportError> {
        let response = self.client.post(self.url.clone()).json(body).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status, body_len = body.len(), "AnkiConnect replied");
        Ok(HttpReply { status, body })
    }
}
