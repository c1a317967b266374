//! Tool error types.

use ankimcp_connect::AnkiError;
use thiserror::Error;

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors that can occur during tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Invalid parameters.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// AnkiConnect call failed.
    #[error(transparent)]
    Anki(#[from] AnkiError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an execution failed error.
    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::ExecutionFailed(message.into())
    }

    /// Text shown to the model when `tool` fails.
    ///
    /// Every message starts with `SYSTEM_ERROR:` so the assistant relays it
    /// to the user instead of retrying blindly.
    pub fn render(&self, tool: &str) -> String {
        match self {
            Self::Anki(e) if e.is_unreachable() => format!(
                "SYSTEM_ERROR: Cannot connect to Anki. Please inform the user that they need to \
                 start their Anki application and ensure the AnkiConnect add-on is installed and \
                 enabled before proceeding. Details: {e}"
            ),
            Self::Anki(e @ AnkiError::Api { .. }) => format!(
                "SYSTEM_ERROR: An error occurred communicating with Anki: {e}. \
                 Please inform the user about the error."
            ),
            Self::Validation(message) | Self::ExecutionFailed(message) => {
                format!("SYSTEM_ERROR: {message}")
            }
            other => format!(
                "SYSTEM_ERROR: An unexpected error occurred while executing the Anki tool \
                 '{tool}'. Details: {other}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ankimcp_connect::Action;

    #[test]
    fn test_render_unreachable() {
        let err = ToolError::from(AnkiError::Unreachable {
            action: Action::FindCards,
            attempts: 3,
            message: "connection refused".to_string(),
        });
        let text = err.render("num_cards_due_today");
        assert!(text.starts_with("SYSTEM_ERROR: Cannot connect to Anki."));
        assert!(text.contains("start their Anki application"));
        assert!(text.contains("after 3 attempts"));
    }

    #[test]
    fn test_render_api_error() {
        let err = ToolError::from(AnkiError::Api {
            action: Action::AddNote,
            message: "cannot create note because it is a duplicate".to_string(),
        });
        let text = err.render("add_note");
        assert!(text.starts_with("SYSTEM_ERROR: An error occurred communicating with Anki:"));
        assert!(text.contains("cannot create note because it is a duplicate"));
        assert!(text.ends_with("Please inform the user about the error."));
    }

    #[test]
    fn test_render_validation() {
        let err = ToolError::validation("Invalid arguments: missing field `reviews`");
        assert_eq!(
            err.render("submit_reviews"),
            "SYSTEM_ERROR: Invalid arguments: missing field `reviews`"
        );
    }

    #[test]
    fn test_render_other_names_tool() {
        let err = ToolError::from(AnkiError::Http {
            action: Action::CardsInfo,
            status: 500,
        });
        let text = err.render("get_due_cards");
        assert!(text.contains("executing the Anki tool 'get_due_cards'"));
        assert!(text.contains("500"));
    }
}
