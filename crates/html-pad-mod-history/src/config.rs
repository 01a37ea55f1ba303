/// Configuration for the history system.
use html_pad_config::EditorConfig;

/// Default number of journal slots, one of which is the sentinel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Configuration for the undo journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Total slots in the circular buffer; usable depth is one less.
    pub capacity: usize,
    /// Whether consecutive typed insertions are merged.
    pub merge_typing: bool,
    /// Operation types eligible for merging.
    pub mergeable_op_types: Vec<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self::from_editor_config(&EditorConfig::default())
    }
}

impl HistoryConfig {
    /// Derives journal settings from the editor configuration.
    pub fn from_editor_config(config: &EditorConfig) -> Self {
        Self {
            capacity: config
                .history_capacity
                .max(html_pad_config::config::MIN_HISTORY_CAPACITY),
            merge_typing: config.merge_typing,
            mergeable_op_types: config.mergeable_op_types.clone(),
        }
    }

    /// A config with the given capacity and default merge settings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(html_pad_config::config::MIN_HISTORY_CAPACITY),
            ..Self::default()
        }
    }

    pub fn is_mergeable(&self, op_type: &str) -> bool {
        self.merge_typing && self.mergeable_op_types.iter().any(|op| op == op_type)
    }
}
