//! Due-card tools: `num_cards_due_today` and `get_due_cards`.

use crate::prompts::review_prompt;
use crate::{Tool, ToolContext, ToolError, ToolResult};
use ankimcp_connect::{AnkiClient, AnkiResult, CardInfo};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info};

/// Search query for cards due today (`day == 0`) or up to `day` days ahead.
pub fn due_query(deck: Option<&str>, day: u32) -> String {
    let prop = if day == 0 {
        "prop:due=0".to_string()
    } else {
        format!("prop:due<={day}")
    };

    let mut query = format!("is:due -is:suspended {prop}");
    if let Some(deck) = deck {
        query.push_str(&format!(" \"deck:{deck}\""));
    }
    query
}

async fn find_due_card_ids(
    client: &AnkiClient,
    deck: Option<&str>,
    day: u32,
) -> AnkiResult<Vec<i64>> {
    let query = due_query(deck, day);
    debug!(query = %query, "Searching due cards");
    let ids = client.find_cards(&query).await?;
    info!(count = ids.len(), query = %query, "Found due cards");
    Ok(ids)
}

/// Treat a blank deck name as "all decks".
fn deck_filter(deck: &Option<String>) -> Option<&str> {
    deck.as_deref().map(str::trim).filter(|d| !d.is_empty())
}

/// Counts cards due today.
pub struct NumCardsDueTodayTool;

#[derive(Debug, Default, Deserialize)]
struct NumCardsDueTodayArgs {
    #[serde(default)]
    deck: Option<String>,
}

#[async_trait]
impl Tool for NumCardsDueTodayTool {
    fn id(&self) -> &str {
        "num_cards_due_today"
    }

    fn description(&self) -> &str {
        "Get the number of cards due exactly today, with an optional deck filter."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "deck": {
                    "type": "string",
                    "description": "Only count cards in this deck (exact name)"
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<String> {
        let args: NumCardsDueTodayArgs = serde_json::from_value(args)
            .map_err(|e| ToolError::validation(format!("Invalid arguments: {e}")))?;
        let deck = deck_filter(&args.deck);

        let ids = find_due_card_ids(&ctx.client, deck, 0).await?;
        let scope = match deck {
            Some(deck) => format!(" in deck '{deck}'"),
            None => " across all decks".to_string(),
        };

        Ok(format!("There are {} cards due today{scope}.", ids.len()))
    }
}

/// Fetches due cards and wraps them in review instructions.
pub struct GetDueCardsTool;

#[derive(Debug, Deserialize)]
struct GetDueCardsArgs {
    #[serde(default)]
    deck: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default = "default_today_only")]
    today_only: bool,
}

fn default_today_only() -> bool {
    true
}

#[async_trait]
impl Tool for GetDueCardsTool {
    fn id(&self) -> &str {
        "get_due_cards"
    }

    fn description(&self) -> &str {
        r#"Fetch cards due for review, formatted for you to quiz the user.

Usage:
- Returns review instructions followed by the cards, each with a <question> and an <answer>.
- Quiz the user one question at a time, then rate every card with submit_reviews.
- With today_only=false, cards due in the next few days are included too."#
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "deck": {
                    "type": "string",
                    "description": "Only fetch cards from this deck (exact name)"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "default": 5,
                    "description": "Maximum number of cards to fetch"
                },
                "today_only": {
                    "type": "boolean",
                    "default": true,
                    "description": "Only fetch cards due today; false also includes cards due in the next few days"
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<String> {
        let args: GetDueCardsArgs = serde_json::from_value(args)
            .map_err(|e| ToolError::validation(format!("Invalid arguments: {e}")))?;

        let limit = match args.limit {
            None => ctx.settings.default_limit,
            Some(limit) if limit >= 1 => usize::try_from(limit).unwrap_or(usize::MAX),
            Some(limit) => {
                return Err(ToolError::validation(format!(
                    "limit must be at least 1, got {limit}"
                )));
            }
        };

        let deck = deck_filter(&args.deck);
        let day = if args.today_only {
            0
        } else {
            ctx.settings.max_future_days
        };

        let mut ids = find_due_card_ids(&ctx.client, deck, day).await?;
        ids.truncate(limit);

        if ids.is_empty() {
            let when = if args.today_only {
                "today".to_string()
            } else {
                format!("within the next {day} days")
            };
            let scope = deck.map(|d| format!(" in deck '{d}'")).unwrap_or_default();
            return Ok(format!("No cards found due {when}{scope}."));
        }

        debug!(ids = ?ids, "Fetching card info");
        let cards = ctx.client.cards_info(&ids).await?;

        Ok(review_prompt(&render_cards(&ids, cards)))
    }
}

/// Render `cards` in the order of `ids`, separated by blank lines.
///
/// Cards Anki did not return are skipped.
pub fn render_cards(ids: &[i64], cards: Vec<CardInfo>) -> String {
    let mut by_id: HashMap<i64, CardInfo> = cards.into_iter().map(|c| (c.card_id, c)).collect();

    ids.iter()
        .filter_map(|id| by_id.remove(id))
        .map(|card| render_card(&card))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render one card as question/answer markup.
///
/// The question is the field shown on the card's front (`fieldOrder`); every
/// other field goes into the answer.
pub fn render_card(card: &CardInfo) -> String {
    let mut question = Vec::new();
    let mut answer = Vec::new();

    for (name, field) in card.ordered_fields() {
        let tag = field_tag(name);
        let part = format!("<{tag}>{}</{tag}>", field.value);
        if field.order == card.field_order {
            question.push(part);
        } else {
            answer.push(part);
        }
    }

    let question = if question.is_empty() {
        "<error>Question field not found</error>".to_string()
    } else {
        question.concat()
    };
    let answer = if answer.is_empty() {
        "<error>Answer fields not found</error>".to_string()
    } else {
        answer.join(" ")
    };

    format!(
        "<card id=\"{}\" deck=\"{}\">\n  <question>{question}</question>\n  <answer>{answer}</answer>\n</card>",
        card.card_id, card.deck_name
    )
}

fn field_tag(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        closed_port_url, context_for, context_with_url, mock_action, requests_for,
    };
    use ankimcp_connect::FieldValue;
    use std::collections::BTreeMap;
    use wiremock::MockServer;

    fn card(id: i64, field_order: i64) -> CardInfo {
        CardInfo {
            card_id: id,
            deck_name: "Default".to_string(),
            field_order,
            fields: BTreeMap::from([
                (
                    "Front".to_string(),
                    FieldValue {
                        value: format!("question {id}"),
                        order: 0,
                    },
                ),
                (
                    "Back Extra".to_string(),
                    FieldValue {
                        value: format!("answer {id}"),
                        order: 1,
                    },
                ),
            ]),
            question: String::new(),
            answer: String::new(),
        }
    }

    fn card_json(id: i64) -> Value {
        json!({
            "cardId": id,
            "deckName": "Default",
            "fieldOrder": 0,
            "fields": {
                "Front": {"value": format!("question {id}"), "order": 0},
                "Back": {"value": format!("answer {id}"), "order": 1}
            }
        })
    }

    #[test]
    fn test_due_query() {
        assert_eq!(due_query(None, 0), "is:due -is:suspended prop:due=0");
        assert_eq!(due_query(None, 5), "is:due -is:suspended prop:due<=5");
        assert_eq!(
            due_query(Some("Spanish Verbs"), 0),
            "is:due -is:suspended prop:due=0 \"deck:Spanish Verbs\""
        );
    }

    #[test]
    fn test_render_card() {
        let rendered = render_card(&card(42, 0));
        assert_eq!(
            rendered,
            "<card id=\"42\" deck=\"Default\">\n  <question><front>question 42</front></question>\n  <answer><back_extra>answer 42</back_extra></answer>\n</card>"
        );
    }

    #[test]
    fn test_render_card_uses_field_order() {
        let rendered = render_card(&card(7, 1));
        assert!(rendered.contains("<question><back_extra>answer 7</back_extra></question>"));
        assert!(rendered.contains("<answer><front>question 7</front></answer>"));
    }

    #[test]
    fn test_render_card_missing_fields() {
        let mut c = card(1, 5);
        c.fields.clear();
        let rendered = render_card(&c);
        assert!(rendered.contains("<error>Question field not found</error>"));
        assert!(rendered.contains("<error>Answer fields not found</error>"));
    }

    #[test]
    fn test_render_cards_follows_id_order() {
        let rendered = render_cards(&[3, 1, 99, 2], vec![card(1, 0), card(2, 0), card(3, 0)]);
        let positions: Vec<usize> = ["id=\"3\"", "id=\"1\"", "id=\"2\""]
            .iter()
            .map(|needle| rendered.find(needle).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(rendered.matches("<card ").count(), 3);
        assert_eq!(rendered.matches("</card>\n\n<card").count(), 2);
    }

    #[tokio::test]
    async fn test_num_cards_due_today() {
        let server = MockServer::start().await;
        mock_action(&server, "findCards", json!([1, 2, 3])).await;
        let ctx = context_for(&server);

        let text = NumCardsDueTodayTool.execute(json!({}), &ctx).await.unwrap();
        assert_eq!(text, "There are 3 cards due today across all decks.");

        let text = NumCardsDueTodayTool
            .execute(json!({"deck": "Spanish"}), &ctx)
            .await
            .unwrap();
        assert_eq!(text, "There are 3 cards due today in deck 'Spanish'.");

        let queries: Vec<Value> = requests_for(&server, "findCards")
            .await
            .into_iter()
            .map(|body| body["params"]["query"].clone())
            .collect();
        assert_eq!(
            queries,
            vec![
                json!("is:due -is:suspended prop:due=0"),
                json!("is:due -is:suspended prop:due=0 \"deck:Spanish\""),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_due_cards_respects_limit_and_order() {
        let server = MockServer::start().await;
        let ids: Vec<i64> = (101..=110).collect();
        mock_action(&server, "findCards", json!(ids)).await;
        // Anki returns cards in its own order.
        mock_action(
            &server,
            "cardsInfo",
            json!([card_json(103), card_json(101), card_json(102)]),
        )
        .await;
        let ctx = context_for(&server);

        let text = GetDueCardsTool
            .execute(json!({"limit": 3}), &ctx)
            .await
            .unwrap();

        assert_eq!(text.matches("<card ").count(), 3);
        let first = text.find("id=\"101\"").unwrap();
        let second = text.find("id=\"102\"").unwrap();
        let third = text.find("id=\"103\"").unwrap();
        assert!(first < second && second < third);
        assert!(text.contains("submit_reviews"));

        let info_requests = requests_for(&server, "cardsInfo").await;
        assert_eq!(info_requests.len(), 1);
        assert_eq!(info_requests[0]["params"]["cards"], json!([101, 102, 103]));
    }

    #[tokio::test]
    async fn test_get_due_cards_skips_deleted_cards() {
        let server = MockServer::start().await;
        mock_action(&server, "findCards", json!([1, 2])).await;
        // A card deleted between findCards and cardsInfo comes back as `{}`.
        mock_action(&server, "cardsInfo", json!([card_json(1), {}])).await;
        let ctx = context_for(&server);

        let text = GetDueCardsTool.execute(json!({}), &ctx).await.unwrap();

        assert_eq!(text.matches("<card ").count(), 1);
        assert!(text.contains("id=\"1\""));
        assert!(!text.starts_with("SYSTEM_ERROR"));
    }

    #[tokio::test]
    async fn test_get_due_cards_future_window() {
        let server = MockServer::start().await;
        mock_action(&server, "findCards", json!([])).await;
        let ctx = context_for(&server);

        let text = GetDueCardsTool
            .execute(json!({"today_only": false, "deck": "Rust"}), &ctx)
            .await
            .unwrap();
        assert_eq!(text, "No cards found due within the next 5 days in deck 'Rust'.");

        let find = requests_for(&server, "findCards").await;
        assert_eq!(
            find[0]["params"]["query"],
            "is:due -is:suspended prop:due<=5 \"deck:Rust\""
        );
        assert!(requests_for(&server, "cardsInfo").await.is_empty());
    }

    #[tokio::test]
    async fn test_get_due_cards_none_today() {
        let server = MockServer::start().await;
        mock_action(&server, "findCards", json!([])).await;
        let ctx = context_for(&server);

        let text = GetDueCardsTool.execute(json!({}), &ctx).await.unwrap();
        assert_eq!(text, "No cards found due today.");
    }

    #[tokio::test]
    async fn test_get_due_cards_rejects_zero_limit() {
        let server = MockServer::start().await;
        let ctx = context_for(&server);

        let err = GetDueCardsTool
            .execute(json!({"limit": 0}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
        assert!(requests_for(&server, "findCards").await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_anki() {
        let ctx = context_with_url(closed_port_url());

        let err = NumCardsDueTodayTool
            .execute(json!({}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(&err, ToolError::Anki(e) if e.is_unreachable()));
        assert!(err
            .render("num_cards_due_today")
            .starts_with("SYSTEM_ERROR: Cannot connect to Anki."));
    }
}
