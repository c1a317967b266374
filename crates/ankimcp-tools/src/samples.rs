//! `get_examples` tool.
//!
//! Samples existing notes so the assistant can match the user's card style
//! before authoring new ones.

use crate::prompts::FLASHCARD_GUIDELINES;
use crate::{Tool, ToolContext, ToolError, ToolResult};
use ankimcp_connect::NoteInfo;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Strategy for picking example notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sample {
    #[default]
    Random,
    Recent,
    MostReviewed,
    BestPerformance,
    Mature,
    Young,
}

impl Sample {
    pub const ALL: [Sample; 6] = [
        Sample::Random,
        Sample::Recent,
        Sample::MostReviewed,
        Sample::BestPerformance,
        Sample::Mature,
        Sample::Young,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Recent => "recent",
            Self::MostReviewed => "most_reviewed",
            Self::BestPerformance => "best_performance",
            Self::Mature => "mature",
            Self::Young => "young",
        }
    }

    /// Search criteria and sort order for this strategy.
    fn criteria(self) -> (&'static str, Option<&'static str>) {
        match self {
            Self::Random => ("is:review", None),
            Self::Recent => ("added:7", Some("sort:added rev")),
            Self::MostReviewed => ("prop:reps>10", Some("sort:reps rev")),
            Self::BestPerformance => ("prop:lapses<3 is:review", Some("sort:lapses")),
            Self::Mature => ("prop:ivl>=21 -is:learn", Some("sort:ivl rev")),
            Self::Young => ("is:review prop:ivl<=7 -is:learn", Some("sort:ivl")),
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sample {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sample| sample.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                format!("Invalid sample '{s}'. Must be one of: {}", valid.join(", "))
            })
    }
}

/// `findNotes` query for example notes.
pub fn examples_query(sample: Sample, deck: Option<&str>, exclude: &[String]) -> String {
    let mut parts = vec!["-is:suspended".to_string()];
    parts.extend(
        exclude
            .iter()
            .filter(|ex| !ex.is_empty())
            .map(|ex| format!("-note:*{ex}*")),
    );
    if let Some(deck) = deck {
        parts.push(format!("\"deck:{deck}\""));
    }

    let (criteria, sort) = sample.criteria();
    parts.push(criteria.to_string());
    if let Some(sort) = sort {
        parts.push(sort.to_string());
    }
    parts.join(" ")
}

/// Pick at most `limit` ids: a random subset for [`Sample::Random`], the
/// leading ids otherwise.
fn pick_ids(ids: &[i64], sample: Sample, limit: usize) -> Vec<i64> {
    if sample == Sample::Random && ids.len() > limit {
        ids.choose_multiple(&mut rand::thread_rng(), limit)
            .copied()
            .collect()
    } else {
        ids.iter().take(limit).copied().collect()
    }
}

/// Example note as shown to the assistant.
#[derive(Debug, Serialize)]
struct ExampleNote {
    #[serde(rename = "modelName")]
    model_name: String,
    /// Field name and value, in the note type's field order.
    #[serde(serialize_with = "serialize_fields")]
    fields: Vec<(String, String)>,
    tags: Vec<String>,
}

/// Write `fields` as a JSON object, keeping their order.
fn serialize_fields<S>(fields: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(fields.iter().map(|(name, value)| (name, value)))
}

impl From<NoteInfo> for ExampleNote {
    fn from(note: NoteInfo) -> Self {
        let fields = note
            .ordered_fields()
            .into_iter()
            .map(|(name, field)| (name.to_string(), simplify_code(&field.value)))
            .collect();
        let model_name = if note.model_name.is_empty() {
            "UnknownModel".to_string()
        } else {
            note.model_name
        };
        Self {
            model_name,
            fields,
            tags: note.tags,
        }
    }
}

/// Collapse `<pre><code>` blocks into plain `<code>`.
fn simplify_code(value: &str) -> String {
    value
        .replace("<pre><code>", "<code>")
        .replace("</code></pre>", "</code>")
}

/// Returns example notes with authoring guidelines.
pub struct GetExamplesTool;

#[derive(Debug, Deserialize)]
struct GetExamplesArgs {
    #[serde(default)]
    deck: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    sample: Option<String>,
}

#[async_trait]
impl Tool for GetExamplesTool {
    fn id(&self) -> &str {
        "get_examples"
    }

    fn description(&self) -> &str {
        r#"Get example notes from Anki to guide your flashcard making. Limit the number of examples returned and provide a sampling technique:

- random: Randomly sample notes
- recent: Notes added in the last week
- most_reviewed: Notes with more than 10 reviews
- best_performance: Notes with less than 3 lapses
- mature: Notes with interval greater than 21 days
- young: Notes with interval less than 7 days"#
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "deck": {
                    "type": "string",
                    "description": "Filter by specific deck (use exact name)"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "default": 5,
                    "description": "Maximum number of examples to return"
                },
                "sample": {
                    "type": "string",
                    "enum": ["random", "recent", "most_reviewed", "best_performance", "mature", "young"],
                    "default": "random",
                    "description": "Sampling technique: random, recent (added last 7d), most_reviewed (>10 reps), best_performance (<3 lapses), mature (ivl>=21d), young (ivl<=7d)"
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<String> {
        let args: GetExamplesArgs = serde_json::from_value(args)
            .map_err(|e| ToolError::validation(format!("Invalid arguments: {e}")))?;

        let sample = match args.sample.as_deref() {
            None => Sample::default(),
            Some(s) => s.parse::<Sample>().map_err(ToolError::validation)?,
        };
        let limit = match args.limit {
            None => ctx.settings.default_limit,
            Some(limit) if limit >= 1 => usize::try_from(limit).unwrap_or(usize::MAX),
            Some(limit) => {
                return Err(ToolError::validation(format!(
                    "limit must be at least 1, got {limit}"
                )));
            }
        };
        let deck = args.deck.as_deref().map(str::trim).filter(|d| !d.is_empty());

        let query = examples_query(sample, deck, &ctx.settings.exclude);
        debug!(query = %query, "Finding example notes");
        let note_ids = ctx.client.find_notes(&query).await?;

        let picked = pick_ids(&note_ids, sample, limit);
        if picked.is_empty() {
            return Ok(format!(
                "No example notes found matching criteria (Sample: {sample}, Deck: {}).",
                deck.unwrap_or("Any")
            ));
        }

        debug!(ids = ?picked, "Fetching example notes");
        let examples: Vec<ExampleNote> = ctx
            .client
            .notes_info(&picked)
            .await?
            .into_iter()
            .map(ExampleNote::from)
            .collect();

        let examples_json = serde_json::to_string_pretty(&examples)?;
        Ok(format!(
            "{FLASHCARD_GUIDELINES}\n\nHere are some examples based on your criteria:\n{examples_json}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context_for, mock_action, requests_for};
    use wiremock::MockServer;

    fn exclude() -> Vec<String> {
        vec!["AnKing".to_string()]
    }

    #[test]
    fn test_examples_query_per_sample() {
        assert_eq!(
            examples_query(Sample::Random, None, &exclude()),
            "-is:suspended -note:*AnKing* is:review"
        );
        assert_eq!(
            examples_query(Sample::Recent, Some("Rust"), &exclude()),
            "-is:suspended -note:*AnKing* \"deck:Rust\" added:7 sort:added rev"
        );
        assert_eq!(
            examples_query(Sample::Mature, None, &[]),
            "-is:suspended prop:ivl>=21 -is:learn sort:ivl rev"
        );
        assert_eq!(
            examples_query(Sample::Young, None, &[]),
            "-is:suspended is:review prop:ivl<=7 -is:learn sort:ivl"
        );
    }

    #[test]
    fn test_sample_parse() {
        assert_eq!("most_reviewed".parse::<Sample>().unwrap(), Sample::MostReviewed);
        let err = "oldest".parse::<Sample>().unwrap_err();
        assert!(err.contains("best_performance"));
    }

    #[test]
    fn test_pick_ids() {
        let ids: Vec<i64> = (1..=20).collect();
        assert_eq!(pick_ids(&ids, Sample::Mature, 3), vec![1, 2, 3]);

        let random = pick_ids(&ids, Sample::Random, 5);
        assert_eq!(random.len(), 5);
        assert!(random.iter().all(|id| ids.contains(id)));

        assert_eq!(pick_ids(&ids[..2], Sample::Random, 5), vec![1, 2]);
    }

    #[test]
    fn test_simplify_code() {
        assert_eq!(
            simplify_code("<pre><code>let x = 1;</code></pre>"),
            "<code>let x = 1;</code>"
        );
    }

    #[tokio::test]
    async fn test_get_examples() {
        let server = MockServer::start().await;
        mock_action(&server, "findNotes", json!([11, 12, 13])).await;
        mock_action(
            &server,
            "notesInfo",
            json!([{
                "noteId": 11,
                "modelName": "Basic",
                "tags": ["rust"],
                "fields": {
                    "Front": {"value": "What does <pre><code>?</code></pre> do?", "order": 0},
                    "Back": {"value": "Propagates errors", "order": 1}
                }
            }]),
        )
        .await;
        let ctx = context_for(&server);

        let text = GetExamplesTool
            .execute(json!({"sample": "recent", "limit": 1}), &ctx)
            .await
            .unwrap();

        assert!(text.starts_with(FLASHCARD_GUIDELINES));
        assert!(text.contains("Here are some examples based on your criteria:\n["));
        assert!(text.contains("\"modelName\": \"Basic\""));
        assert!(text.contains("What does <code>?</code> do?"));
        assert!(text.find("\"Front\"").unwrap() < text.find("\"Back\"").unwrap());

        let notes_requests = requests_for(&server, "notesInfo").await;
        assert_eq!(notes_requests[0]["params"]["notes"], json!([11]));
        let find_requests = requests_for(&server, "findNotes").await;
        assert_eq!(
            find_requests[0]["params"]["query"],
            "-is:suspended -note:*AnKing* added:7 sort:added rev"
        );
    }

    #[test]
    fn test_example_fields_keep_note_type_order() {
        let note: NoteInfo = serde_json::from_value(json!({
            "noteId": 1,
            "modelName": "Basic",
            "fields": {
                "Front": {"value": "Q", "order": 0},
                "Back": {"value": "A", "order": 1},
                "Add Reverse": {"value": "", "order": 2}
            }
        }))
        .unwrap();

        let text = serde_json::to_string(&ExampleNote::from(note)).unwrap();
        assert_eq!(
            text,
            r#"{"modelName":"Basic","fields":{"Front":"Q","Back":"A","Add Reverse":""},"tags":[]}"#
        );
    }

    #[tokio::test]
    async fn test_get_examples_none_found() {
        let server = MockServer::start().await;
        mock_action(&server, "findNotes", json!([])).await;
        let ctx = context_for(&server);

        let text = GetExamplesTool
            .execute(json!({"deck": "Rust"}), &ctx)
            .await
            .unwrap();
        assert_eq!(
            text,
            "No example notes found matching criteria (Sample: random, Deck: Rust)."
        );
    }

    #[tokio::test]
    async fn test_get_examples_rejects_unknown_sample() {
        let server = MockServer::start().await;
        let ctx = context_for(&server);

        let err = GetExamplesTool
            .execute(json!({"sample": "oldest"}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }
}
