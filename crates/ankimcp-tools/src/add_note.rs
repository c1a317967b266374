//! `add_note` tool.

use crate::{Tool, ToolContext, ToolError, ToolResult};
use ankimcp_connect::{NewNote, NoteOptions};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Fenced code block with an optional language.
static FENCED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(\w+)?\s*\n?(.*?)```").expect("valid regex"));

/// Inline code span.
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));

/// Rewrite model-authored markup into what Anki renders.
///
/// `<math>..</math>` becomes MathJax `\(..\)`, fenced code becomes
/// `<pre><code>` (with a `language-*` class when tagged) and inline
/// backticks become `<code>`.
pub fn format_field(value: &str) -> String {
    let value = value.replace("<math>", "\\(").replace("</math>", "\\)");

    let value = FENCED_CODE.replace_all(&value, |caps: &Captures<'_>| {
        let code = caps.get(2).map_or("", |m| m.as_str());
        match caps.get(1) {
            Some(lang) => format!(
                "<pre><code class=\"language-{}\">{code}</code></pre>",
                lang.as_str()
            ),
            None => format!("<pre><code>{code}</code></pre>"),
        }
    });

    INLINE_CODE.replace_all(&value, "<code>$1</code>").into_owned()
}

/// Creates a note.
pub struct AddNoteTool;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddNoteArgs {
    deck_name: String,
    model_name: String,
    fields: BTreeMap<String, String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[async_trait]
impl Tool for AddNoteTool {
    fn id(&self) -> &str {
        "add_note"
    }

    fn description(&self) -> &str {
        r#"Add a flashcard to Anki. Ensure you have looked at examples before you do this, and that you have got approval from the user to add the flashcard.

For code examples, use <code> tags to format your code.
e.g. <code>def fibonacci(n):
    if n <= 1:
        return n
    return fibonacci(n-1) + fibonacci(n-2)</code>

For MathJax, use the <math> tag to format your math equations. This will automatically render the math equations in Anki.
e.g. <math>\frac{d}{dx}[3\sin(5x)] = 15\cos(5x)</math>"#
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["deckName", "modelName", "fields"],
            "properties": {
                "deckName": {
                    "type": "string",
                    "description": "The target deck name"
                },
                "modelName": {
                    "type": "string",
                    "description": "The note type (model) name"
                },
                "fields": {
                    "type": "object",
                    "additionalProperties": { "type": "string" },
                    "description": "Field names mapped to their content"
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional tags for the note"
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<String> {
        let args: AddNoteArgs = serde_json::from_value(args)
            .map_err(|e| ToolError::validation(format!("Invalid arguments: {e}")))?;

        let note = NewNote {
            deck_name: args.deck_name,
            model_name: args.model_name,
            fields: args
                .fields
                .into_iter()
                .map(|(name, value)| {
                    let value = format_field(&value);
                    (name, value)
                })
                .collect(),
            tags: args.tags.unwrap_or_default(),
            options: NoteOptions::default(),
        };

        info!(deck = %note.deck_name, model = %note.model_name, "Adding note");
        debug!(fields = ?note.fields, tags = ?note.tags, "Note payload");

        match ctx.client.add_note(&note).await? {
            Some(id) if id != 0 => {
                info!(note_id = id, deck = %note.deck_name, "Created note");
                Ok(format!(
                    "Successfully created note with ID: {id} in deck '{}'.",
                    note.deck_name
                ))
            }
            _ => {
                let message = format!(
                    "Failed to add note to deck '{}'. AnkiConnect did not return a note ID or indicated failure.",
                    note.deck_name
                );
                error!("{message}");
                Err(ToolError::execution_failed(message))
            }
        }
    }
}
