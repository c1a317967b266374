//! Tool settings.

/// Default number of cards or examples returned.
pub const DEFAULT_LIMIT: usize = 5;

/// Default look-ahead window for `get_due_cards` with `today_only = false`.
pub const DEFAULT_MAX_FUTURE_DAYS: u32 = 5;

/// Deck and note type names hidden from the assistant by default.
pub const DEFAULT_EXCLUDE: &[&str] = &["AnKing"];

/// Behaviour knobs shared by the tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    /// Substrings (case-insensitive) of deck, note type and note content to hide.
    pub exclude: Vec<String>,
    /// How many days ahead `get_due_cards` looks when not limited to today.
    pub max_future_days: u32,
    /// Limit used when the caller does not pass one.
    pub default_limit: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            exclude: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
            max_future_days: DEFAULT_MAX_FUTURE_DAYS,
            default_limit: DEFAULT_LIMIT,
        }
    }
}

impl ToolSettings {
    /// Whether `name` matches any exclude pattern.
    pub fn is_excluded(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.exclude
            .iter()
            .filter(|pattern| !pattern.is_empty())
            .any(|pattern| name.contains(&pattern.to_lowercase()))
    }
}
