//! AnkiConnect request client.

use crate::action::{unwrap_response, Action, ActionRequest};
use crate::config::AnkiConfig;
use crate::error::{AnkiError, AnkiResult};
use crate::retry::RetryPolicy;
use crate::transport::{AnkiTransport, HttpReply, HttpTransport};
use crate::types::{CardAnswer, CardInfo, NewNote, NoteInfo};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Stateless client for the AnkiConnect API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct AnkiClient {
    transport: Arc<dyn AnkiTransport>,
    retry: RetryPolicy,
    api_key: Option<String>,
}

impl std::fmt::Debug for AnkiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnkiClient")
            .field("retry", &self.retry)
            .field("has_key", &self.api_key.is_some())
            .finish()
    }
}

impl AnkiClient {
    /// Create a client that talks HTTP to the configured endpoint.
    pub fn new(config: &AnkiConfig) -> AnkiResult<Self> {
        let transport = HttpTransport::new(config)?;
        info!(url = %transport.url(), "Initialized AnkiConnect client");
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn AnkiTransport>, config: &AnkiConfig) -> Self {
        Self {
            transport,
            retry: RetryPolicy::new(config.max_attempts, config.retry_backoff),
            api_key: config.api_key.clone(),
        }
    }

    /// Invoke an action and return its raw `result`.
    ///
    /// Connection failures and timeouts are retried within the configured
    /// budget. HTTP errors, malformed responses and Anki errors are not.
    pub async fn invoke(&self, action: Action, params: Map<String, Value>) -> AnkiResult<Value> {
        let body = ActionRequest::new(action, params, self.api_key.as_deref()).to_value();
        debug!(action = %action, params = %body["params"], "Invoking AnkiConnect action");

        let reply = self.send_with_retry(action, &body).await?;

        if !(200..300).contains(&reply.status) {
            error!(action = %action, status = reply.status, "AnkiConnect HTTP error");
            return Err(AnkiError::Http {
                action,
                status: reply.status,
            });
        }

        unwrap_response(action, &reply.body).map_err(|e| {
            error!(action = %action, error = %e, "AnkiConnect action failed");
            e
        })
    }

    async fn send_with_retry(&self, action: Action, body: &Value) -> AnkiResult<HttpReply> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.transport.post(body).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() => match self.retry.next_delay(attempt) {
                    Some(delay) => {
                        warn!(
                            action = %action,
                            attempt,
                            max = self.retry.max_attempts(),
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "AnkiConnect unreachable, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        return Err(AnkiError::Unreachable {
                            action,
                            attempts: attempt,
                            message: e.to_string(),
                        });
                    }
                },
                Err(e) => {
                    return Err(AnkiError::Transport {
                        action,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    /// Invoke an action and decode its result.
    async fn call<T: DeserializeOwned>(&self, action: Action, params: Value) -> AnkiResult<T> {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let result = self.invoke(action, params).await?;
        serde_json::from_value(result).map_err(|source| AnkiError::UnexpectedResult { action, source })
    }

    /// Invoke an action that answers a list, dropping entries that do not decode.
    ///
    /// `cardsInfo` and `notesInfo` answer `{}` for ids Anki no longer knows.
    async fn call_list<T>(&self, action: Action, params: Value) -> AnkiResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let entries: Vec<Value> = self.call(action, params).await?;
        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(action = %action, index, error = %e, "Skipping undecodable entry");
                    None
                }
            })
            .collect())
    }

    /// AnkiConnect API version reported by the add-on.
    pub async fn version(&self) -> AnkiResult<u32> {
        self.call(Action::Version, json!({})).await
    }

    /// All deck names.
    pub async fn deck_names(&self) -> AnkiResult<Vec<String>> {
        self.call(Action::DeckNames, json!({})).await
    }

    /// Card ids matching an Anki search query, in Anki's order.
    pub async fn find_cards(&self, query: &str) -> AnkiResult<Vec<i64>> {
        self.call(Action::FindCards, json!({ "query": query })).await
    }

    /// Details for the given card ids.
    pub async fn cards_info(&self, card_ids: &[i64]) -> AnkiResult<Vec<CardInfo>> {
        self.call_list(Action::CardsInfo, json!({ "cards": card_ids }))
            .await
    }

    /// Answer cards. Returns one success flag per answer.
    pub async fn answer_cards(&self, answers: &[CardAnswer]) -> AnkiResult<Vec<bool>> {
        self.call(Action::AnswerCards, json!({ "answers": answers })).await
    }

    /// All note type (model) names.
    pub async fn model_names(&self) -> AnkiResult<Vec<String>> {
        self.call(Action::ModelNames, json!({})).await
    }

    /// Field names of a note type, in order.
    pub async fn model_field_names(&self, model_name: &str) -> AnkiResult<Vec<String>> {
        self.call(Action::ModelFieldNames, json!({ "modelName": model_name }))
            .await
    }

    /// Note ids matching an Anki search query.
    pub async fn find_notes(&self, query: &str) -> AnkiResult<Vec<i64>> {
        self.call(Action::FindNotes, json!({ "query": query })).await
    }

    /// Details for the given note ids.
    pub async fn notes_info(&self, note_ids: &[i64]) -> AnkiResult<Vec<NoteInfo>> {
        self.call_list(Action::NotesInfo, json!({ "notes": note_ids }))
            .await
    }

    /// Add a note. Returns the new note id, or `None` if Anki did not create one.
    pub async fn add_note(&self, note: &NewNote) -> AnkiResult<Option<i64>> {
        let note = serde_json::to_value(note).map_err(|source| AnkiError::InvalidParams {
            action: Action::AddNote,
            source,
        })?;
        self.call(Action::AddNote, json!({ "note": note })).await
    }
}
