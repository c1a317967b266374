//! `list_decks_and_notes` tool.

use crate::{Tool, ToolContext, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Lists decks and note types, hiding excluded names.
pub struct ListDecksAndNotesTool;

#[async_trait]
impl Tool for ListDecksAndNotesTool {
    fn id(&self) -> &str {
        "list_decks_and_notes"
    }

    fn description(&self) -> &str {
        "Get all decks (excluding specified patterns) and note types with their fields."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> ToolResult<String> {
        let decks: Vec<String> = ctx
            .client
            .deck_names()
            .await?
            .into_iter()
            .filter(|deck| !ctx.settings.is_excluded(deck))
            .collect();
        info!(count = decks.len(), "Filtered decks");

        let mut note_types = Vec::new();
        for model in ctx.client.model_names().await? {
            if ctx.settings.is_excluded(&model) {
                continue;
            }
            match ctx.client.model_field_names(&model).await {
                Ok(fields) => note_types.push((model, fields)),
                Err(e) if e.is_unreachable() => return Err(e.into()),
                Err(e) => {
                    warn!(model = %model, error = %e, "Could not get fields for model, skipping");
                }
            }
        }

        let deck_text = if decks.is_empty() {
            "No filtered decks found.".to_string()
        } else {
            format!("You have {} filtered decks: {}", decks.len(), decks.join(", "))
        };

        let note_text = if note_types.is_empty() {
            "No filtered note types found.".to_string()
        } else {
            let lines: Vec<String> = note_types
                .iter()
                .map(|(model, fields)| {
                    let fields: Vec<String> =
                        fields.iter().map(|f| format!("\"{f}\": \"string\"")).collect();
                    format!("- {model}: {{ {} }}", fields.join(", "))
                })
                .collect();
            format!(
                "Your filtered note types and their fields are:\n{}",
                lines.join("\n")
            )
        };

        Ok(format!("{deck_text}\n\n{note_text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context_for, mock_action, requests_for};
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_lists_filtered_decks_and_models() {
        let server = MockServer::start().await;
        mock_action(
            &server,
            "deckNames",
            json!(["Default", "AnKing Step 1", "Spanish"]),
        )
        .await;
        mock_action(&server, "modelNames", json!(["Basic", "ANKING overhaul", "Cloze"])).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "action": "modelFieldNames",
                "params": {"modelName": "Cloze"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": null,
                "error": "model was not found: Cloze"
            })))
            .mount(&server)
            .await;
        mock_action(&server, "modelFieldNames", json!(["Front", "Back"])).await;
        let ctx = context_for(&server);

        let text = ListDecksAndNotesTool.execute(json!({}), &ctx).await.unwrap();

        assert_eq!(
            text,
            "You have 2 filtered decks: Default, Spanish\n\n\
             Your filtered note types and their fields are:\n\
             - Basic: { \"Front\": \"string\", \"Back\": \"string\" }"
        );

        // The excluded model is never queried.
        let field_requests = requests_for(&server, "modelFieldNames").await;
        assert_eq!(field_requests.len(), 2);
    }

    #[tokio::test]
    async fn test_nothing_left_after_filtering() {
        let server = MockServer::start().await;
        mock_action(&server, "deckNames", json!(["AnKing"])).await;
        mock_action(&server, "modelNames", json!([])).await;
        let ctx = context_for(&server);

        let text = ListDecksAndNotesTool.execute(json!({}), &ctx).await.unwrap();
        assert_eq!(
            text,
            "No filtered decks found.\n\nNo filtered note types found."
        );
    }
}
