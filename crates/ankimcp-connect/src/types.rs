//! Typed views of AnkiConnect payloads.
//!
//! Only the fields ankimcp reads are modelled; everything else in Anki's
//! answers is ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A note field as reported by `cardsInfo` / `notesInfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub order: i64,
}

/// One entry of a `cardsInfo` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    pub card_id: i64,
    #[serde(default)]
    pub deck_name: String,
    /// Order of the field shown on the front of this card.
    #[serde(default)]
    pub field_order: i64,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

impl CardInfo {
    /// Fields sorted by their `order`.
    pub fn ordered_fields(&self) -> Vec<(&str, &FieldValue)> {
        let mut fields: Vec<_> = self.fields.iter().map(|(k, v)| (k.as_str(), v)).collect();
        fields.sort_by_key(|(_, field)| field.order);
        fields
    }
}

/// One entry of a `notesInfo` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    pub note_id: i64,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl NoteInfo {
    /// Fields sorted by their `order`.
    pub fn ordered_fields(&self) -> Vec<(&str, &FieldValue)> {
        let mut fields: Vec<_> = self.fields.iter().map(|(k, v)| (k.as_str(), v)).collect();
        fields.sort_by_key(|(_, field)| field.order);
        fields
    }
}

/// A single answer for `answerCards`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardAnswer {
    pub card_id: i64,
    /// Anki answer button: 1 again, 2 hard, 3 good, 4 easy.
    pub ease: u8,
}

/// Duplicate handling for `addNote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub allow_duplicate: bool,
    pub duplicate_scope: String,
}

impl Default for NoteOptions {
    fn default() -> Self {
        Self {
            allow_duplicate: false,
            duplicate_scope: "deck".to_string(),
        }
    }
}

/// Note payload for `addNote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub deck_name: String,
    pub model_name: String,
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub options: NoteOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_card_info_deserialization() {
        let card: CardInfo = serde_json::from_value(json!({
            "cardId": 1498938915662_i64,
            "deckName": "Default",
            "fieldOrder": 1,
            "fields": {
                "Front": {"value": "front content", "order": 0},
                "Back": {"value": "back content", "order": 1}
            },
            "modelName": "Basic",
            "interval": 16
        }))
        .unwrap();

        assert_eq!(card.card_id, 1498938915662);
        assert_eq!(card.field_order, 1);
        let ordered: Vec<&str> = card.ordered_fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(ordered, vec!["Front", "Back"]);
    }

    #[test]
    fn test_note_fields_follow_order() {
        let note: NoteInfo = serde_json::from_value(json!({
            "noteId": 5,
            "fields": {
                "Text": {"value": "x", "order": 0},
                "Extra": {"value": "y", "order": 1},
                "Back Extra": {"value": "z", "order": 2}
            }
        }))
        .unwrap();

        let names: Vec<&str> = note.ordered_fields().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Text", "Extra", "Back Extra"]);
        assert!(note.tags.is_empty());
    }

    #[test]
    fn test_card_answer_serialization() {
        let answer = CardAnswer { card_id: 7, ease: 3 };
        assert_eq!(
            serde_json::to_value(answer).unwrap(),
            json!({"cardId": 7, "ease": 3})
        );
    }

    #[test]
    fn test_new_note_serialization() {
        let note = NewNote {
            deck_name: "Default".to_string(),
            model_name: "Basic".to_string(),
            fields: BTreeMap::from([("Front".to_string(), "Q".to_string())]),
            tags: vec!["rust".to_string()],
            options: NoteOptions::default(),
        };
        assert_eq!(
            serde_json::to_value(&note).unwrap(),
            json!({
                "deckName": "Default",
                "modelName": "Basic",
                "fields": {"Front": "Q"},
                "tags": ["rust"],
                "options": {"allowDuplicate": false, "duplicateScope": "deck"}
            })
        );
    }
}
