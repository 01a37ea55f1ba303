pub mod config;

pub use config::{default_block_tags, EditorConfig};
