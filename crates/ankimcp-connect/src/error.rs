//! AnkiConnect error types.

use crate::action::Action;
use thiserror::Error;

/// Result type for AnkiConnect operations.
pub type AnkiResult<T> = Result<T, AnkiError>;

/// Errors returned by [`AnkiClient`](crate::AnkiClient).
///
/// Every variant that comes out of an action call carries the [`Action`]
/// that failed, so callers can log or report it without extra wrapping.
#[derive(Debug, Error)]
pub enum AnkiError {
    /// Anki could not be reached within the retry budget.
    #[error("Unable to connect to Anki after {attempts} attempts ({action}): {message}")]
    Unreachable {
        action: Action,
        attempts: u32,
        message: String,
    },

    /// The round-trip failed in a way another attempt will not fix.
    #[error("Failed to communicate with AnkiConnect ({action}): {message}")]
    Transport { action: Action, message: String },

    /// AnkiConnect answered with a non-success HTTP status.
    #[error("AnkiConnect returned HTTP {status} for {action}")]
    Http { action: Action, status: u16 },

    /// The response body does not follow the `{error, result}` contract.
    #[error("Malformed AnkiConnect response for {action}: {reason}")]
    MalformedResponse { action: Action, reason: String },

    /// AnkiConnect reported an error for the action.
    #[error("AnkiConnect error for {action}: {message}")]
    Api { action: Action, message: String },

    /// The `result` value has a different type than the action promises.
    #[error("Unexpected result for {action}: {source}")]
    UnexpectedResult {
        action: Action,
        #[source]
        source: serde_json::Error,
    },

    /// Request parameters could not be serialized.
    #[error("Invalid parameters for {action}: {source}")]
    InvalidParams {
        action: Action,
        #[source]
        source: serde_json::Error,
    },

    /// The configured endpoint is not a usable URL.
    #[error("Invalid AnkiConnect URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl AnkiError {
    /// The action this error belongs to, if it came out of an action call.
    pub fn action(&self) -> Option<Action> {
        match self {
            Self::Unreachable { action, .. }
            | Self::Transport { action, .. }
            | Self::Http { action, .. }
            | Self::MalformedResponse { action, .. }
            | Self::Api { action, .. }
            | Self::UnexpectedResult { action, .. }
            | Self::InvalidParams { action, .. } => Some(*action),
            Self::InvalidUrl { .. } | Self::Client(_) => None,
        }
    }

    /// The message Anki reported, verbatim, for application errors.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether Anki itself could not be reached.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (
                AnkiError::Unreachable {
                    action: Action::DeckNames,
                    attempts: 3,
                    message: "connection refused".to_string(),
                },
                "Unable to connect to Anki after 3 attempts (deckNames): connection refused",
            ),
            (
                AnkiError::Http {
                    action: Action::FindCards,
                    status: 500,
                },
                "AnkiConnect returned HTTP 500 for findCards",
            ),
            (
                AnkiError::MalformedResponse {
                    action: Action::CardsInfo,
                    reason: "missing field 'error'".to_string(),
                },
                "Malformed AnkiConnect response for cardsInfo: missing field 'error'",
            ),
            (
                AnkiError::Api {
                    action: Action::AddNote,
                    message: "cannot create note because it is a duplicate".to_string(),
                },
                "AnkiConnect error for addNote: cannot create note because it is a duplicate",
            ),
        ];

        for (error, expected) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_error_accessors() {
        let err = AnkiError::Api {
            action: Action::DeckNames,
            message: "deck was not found".to_string(),
        };
        assert_eq!(err.action(), Some(Action::DeckNames));
        assert_eq!(err.api_message(), Some("deck was not found"));
        assert!(!err.is_unreachable());

        let err = AnkiError::InvalidUrl {
            url: "nope".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert_eq!(err.action(), None);
        assert_eq!(err.api_message(), None);
    }
}
