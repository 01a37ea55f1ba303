/// Editor configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "HTML_PAD_CONFIG";

/// Smallest journal capacity that still leaves one usable slot
/// next to the sentinel.
pub const MIN_HISTORY_CAPACITY: usize = 2;

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Number of slots in the circular undo journal (one is a sentinel).
    pub history_capacity: usize,
    /// Whether consecutive typed insertions collapse into one undo step.
    pub merge_typing: bool,
    /// Operation types eligible for the typing merge.
    pub mergeable_op_types: Vec<String>,
    /// Lowercase tag names treated as block-level elements.
    pub block_tags: Vec<String>,
    /// Default `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1024,
            merge_typing: true,
            mergeable_op_types: vec![
                "insertText".to_string(),
                "deleteContentBackward".to_string(),
                "deleteContentForward".to_string(),
            ],
            block_tags: default_block_tags(),
            log_filter: "info".to_string(),
        }
    }
}

/// The block-level tags recognized out of the box.
pub fn default_block_tags() -> Vec<String> {
    [
        "blockquote",
        "div",
        "p",
        "pre",
        "address",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "td",
        "th",
        "ul",
        "ol",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

impl EditorConfig {
    /// Returns the config file path.
    ///
    /// Resolution order:
    /// 1. `HTML_PAD_CONFIG` environment variable
    /// 2. `html-pad.json` next to the executable
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join("html-pad.json")))
            .unwrap_or_else(|| PathBuf::from("html-pad.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (unreadable file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<EditorConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Don't overwrite a broken file
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))
    }

    /// Clamps values to valid ranges and normalizes tag names.
    pub fn sanitize(&mut self) {
        self.history_capacity = self.history_capacity.max(MIN_HISTORY_CAPACITY);
        for tag in &mut self.block_tags {
            *tag = tag.trim().to_ascii_lowercase();
        }
        self.block_tags.retain(|t| !t.is_empty());
        self.block_tags.dedup();
        self.mergeable_op_types.retain(|op| !op.trim().is_empty());
        if self.log_filter.trim().is_empty() {
            self.log_filter = "info".to_string();
        }
    }

    /// Whether `op_type` takes part in the typing merge.
    pub fn is_mergeable(&self, op_type: &str) -> bool {
        self.merge_typing && self.mergeable_op_types.iter().any(|op| op == op_type)
    }
}
