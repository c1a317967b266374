//! `submit_reviews` tool.

use crate::{Tool, ToolContext, ToolError, ToolResult};
use ankimcp_connect::CardAnswer;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// How well the user recalled a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rating {
    Wrong,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Wrong, Rating::Hard, Rating::Good, Rating::Easy];

    /// Anki answer button for this rating.
    pub fn ease(self) -> u8 {
        match self {
            Self::Wrong => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wrong => "wrong",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|rating| rating.as_str() == lower)
            .ok_or_else(|| format!("unknown rating '{s}'"))
    }
}

/// A validated review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Review {
    pub card_id: i64,
    pub rating: Rating,
}

impl Review {
    fn answer(self) -> CardAnswer {
        CardAnswer {
            card_id: self.card_id,
            ease: self.rating.ease(),
        }
    }
}

/// Validate raw review entries, collecting every problem.
pub fn validate_reviews(entries: &[Value]) -> Result<Vec<Review>, Vec<String>> {
    let mut reviews = Vec::with_capacity(entries.len());
    let mut errors = Vec::new();

    for entry in entries {
        let card_id = entry.get("card_id").unwrap_or(&Value::Null);
        let Some(card_id) = card_id.as_i64() else {
            errors.push(format!(
                "Invalid card_id '{card_id}' in review: {entry}. Must be an integer."
            ));
            continue;
        };

        let raw_rating = match entry.get("rating") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        match raw_rating.parse::<Rating>() {
            Ok(rating) => reviews.push(Review { card_id, rating }),
            Err(_) => errors.push(format!(
                "Invalid rating '{}' for card_id {card_id}. Must be one of: wrong, hard, good, easy.",
                raw_rating.to_lowercase()
            )),
        }
    }

    if errors.is_empty() {
        Ok(reviews)
    } else {
        Err(errors)
    }
}

/// Submits review ratings, one `answerCards` call per card.
pub struct SubmitReviewsTool;

#[derive(Debug, Deserialize)]
struct SubmitReviewsArgs {
    reviews: Vec<Value>,
}

#[async_trait]
impl Tool for SubmitReviewsTool {
    fn id(&self) -> &str {
        "submit_reviews"
    }

    fn description(&self) -> &str {
        r#"Submit multiple card reviews to Anki using ratings ('wrong', 'hard', 'good', 'easy').

Usage:
- Each review needs the card_id from get_due_cards and a rating.
- "wrong": answer was wrong; "hard": struggled but got it; "good": got it (default); "easy": instant and confident.
- Reviews are submitted independently; the summary lists the outcome for each card."#
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["reviews"],
            "properties": {
                "reviews": {
                    "type": "array",
                    "description": "One entry per reviewed card",
                    "items": {
                        "type": "object",
                        "required": ["card_id", "rating"],
                        "properties": {
                            "card_id": {
                                "type": "integer",
                                "description": "ID of the reviewed card"
                            },
                            "rating": {
                                "type": "string",
                                "enum": ["wrong", "hard", "good", "easy"],
                                "description": "How well the user recalled the card"
                            }
                        }
                    }
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<String> {
        let args: SubmitReviewsArgs = serde_json::from_value(args)
            .map_err(|e| ToolError::validation(format!("Invalid arguments: {e}")))?;

        if args.reviews.is_empty() {
            return Ok("No reviews provided to submit.".to_string());
        }

        let reviews = validate_reviews(&args.reviews).map_err(|errors| {
            ToolError::validation(format!(
                "Could not submit reviews due to validation errors:\n{}",
                errors.join("\n")
            ))
        })?;

        info!(count = reviews.len(), "Submitting reviews");

        let mut lines = Vec::with_capacity(reviews.len());
        let mut succeeded = 0;
        let mut failed = 0;

        for review in reviews {
            let ok = match ctx.client.answer_cards(&[review.answer()]).await {
                Ok(results) => results.first().copied().unwrap_or(false),
                Err(e) if e.is_unreachable() => return Err(e.into()),
                Err(e) => {
                    warn!(card_id = review.card_id, error = %e, "Failed to answer card");
                    false
                }
            };

            if ok {
                succeeded += 1;
                lines.push(format!(
                    "Card {}: Marked as '{}' successfully.",
                    review.card_id, review.rating
                ));
            } else {
                failed += 1;
                lines.push(format!(
                    "Card {}: Failed to mark as '{}'.",
                    review.card_id, review.rating
                ));
            }
        }

        let summary = format!("Review submission summary: {succeeded} successful, {failed} failed.");
        info!(succeeded, failed, "Review submission finished");

        Ok(format!("{summary}\n{}", lines.join("\n")))
    }
}
