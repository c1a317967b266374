//! AnkiConnect action envelope.
//!
//! Every call is a POST of `{action, version, params[, key]}` and every
//! answer is an object with exactly two fields, `error` and `result`.
//! See: <https://git.foosoft.net/alex/anki-connect>

use crate::error::{AnkiError, AnkiResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// AnkiConnect API version spoken by this client.
pub const API_VERSION: u8 = 6;

/// Remote actions used by ankimcp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    DeckNames,
    FindCards,
    CardsInfo,
    AnswerCards,
    ModelNames,
    ModelFieldNames,
    AddNote,
    FindNotes,
    NotesInfo,
    Version,
}

impl Action {
    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeckNames => "deckNames",
            Self::FindCards => "findCards",
            Self::CardsInfo => "cardsInfo",
            Self::AnswerCards => "answerCards",
            Self::ModelNames => "modelNames",
            Self::ModelFieldNames => "modelFieldNames",
            Self::AddNote => "addNote",
            Self::FindNotes => "findNotes",
            Self::NotesInfo => "notesInfo",
            Self::Version => "version",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body sent to AnkiConnect.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRequest<'a> {
    pub action: Action,
    pub version: u8,
    pub params: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<&'a str>,
}

impl<'a> ActionRequest<'a> {
    /// Build a request for `action`.
    pub fn new(action: Action, params: Map<String, Value>, key: Option<&'a str>) -> Self {
        Self {
            action,
            version: API_VERSION,
            params,
            key,
        }
    }

    /// Serialize to a JSON value ready to post.
    pub fn to_value(&self) -> Value {
        serde_json::json!(self)
    }
}

/// Unwrap an AnkiConnect response body.
///
/// Returns `result` when `error` is null. The body must be a JSON object
/// with exactly the fields `error` and `result`.
pub fn unwrap_response(action: Action, body: &str) -> AnkiResult<Value> {
    let malformed = |reason: String| AnkiError::MalformedResponse { action, reason };

    let value: Value =
        serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {e}")))?;

    let Value::Object(mut fields) = value else {
        return Err(malformed("expected a JSON object".to_string()));
    };

    for required in ["error", "result"] {
        if !fields.contains_key(required) {
            return Err(malformed(format!("missing field '{required}'")));
        }
    }

    if fields.len() != 2 {
        let mut extra: Vec<&str> = fields
            .keys()
            .map(String::as_str)
            .filter(|k| *k != "error" && *k != "result")
            .collect();
        extra.sort_unstable();
        return Err(malformed(format!("unexpected fields: {}", extra.join(", "))));
    }

    match fields.remove("error") {
        Some(Value::Null) => Ok(fields.remove("result").unwrap_or(Value::Null)),
        Some(Value::String(message)) => Err(AnkiError::Api { action, message }),
        Some(other) => Err(malformed(format!("'error' must be null or a string, got {other}"))),
        None => Err(malformed("missing field 'error'".to_string())),
    }
}
