//! File I/O operations for documents.
//!
//! Handles opening HTML files from disk (with encoding detection) and saving
//! documents back. Only the body is edited; everything outside it is
//! regenerated on save.

use std::path::Path;

use anyhow::{Context, Result};
use html_pad_config::EditorConfig;

use crate::encoding::{decode_bytes, detect_encoding, encode_string, TextEncoding};

use super::Document;

impl Document {
    /// Opens an HTML file.
    ///
    /// The body's attributes and content are loaded; a file without a
    /// `<body>` tag is treated as a bare fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, decoded or parsed.
    pub fn open(path: &Path, config: &EditorConfig) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read file: {}", path.display()))?;

        let encoding = detect_encoding(&bytes);
        let text = decode_bytes(&bytes, encoding)
            .with_context(|| format!("failed to decode file: {}", path.display()))?;

        let mut doc = Self::with_config(config);
        doc.load_markup(&text)
            .with_context(|| format!("failed to parse file: {}", path.display()))?;
        doc.file_path = Some(path.to_path_buf());
        doc.encoding = encoding;
        doc.caret_to_start();

        tracing::info!(
            "Opened {} ({encoding}, {} top-level elements)",
            path.display(),
            doc.tree.element_child_count(doc.root())
        );
        Ok(doc)
    }

    fn load_markup(&mut self, text: &str) -> Result<()> {
        let (start_tag, content) = split_body(text);
        if let Some(start_tag) = start_tag {
            let parsed = self.tree.parse_fragment(&format!("{start_tag}</body>"))?;
            let root = self.root();
            for node in parsed {
                let attributes = self.tree.attributes(node).to_vec();
                for (name, value) in attributes {
                    self.tree.set_attribute(root, &name, &value)?;
                }
                self.tree.remove(node)?;
            }
        }
        self.set_body_html(content)?;
        Ok(())
    }

    /// Saves the document to its file path.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is set or the file cannot be written.
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .file_path
            .as_ref()
            .context("no file path set for this document")?
            .clone();
        self.save_to(&path)
    }

    /// Saves the document to a specific path, keeping its encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be encoded or written.
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        let markup = self.to_markup();
        let bytes = encode_string(&markup, self.encoding)
            .context("failed to encode document for saving")?;

        std::fs::write(path, &bytes)
            .with_context(|| format!("failed to write file: {}", path.display()))?;

        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// The complete file content written by [`Document::save_to`].
    pub fn to_markup(&self) -> String {
        let charset = match self.encoding {
            TextEncoding::Utf8 | TextEncoding::Utf8Bom => Some("utf-8"),
            TextEncoding::Legacy(name) => Some(name),
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => None,
        };
        let head = charset
            .map(|c| format!("<head><meta charset=\"{c}\"></head>"))
            .unwrap_or_default();
        format!(
            "<!DOCTYPE html>\n<html>{head}{}</html>\n",
            self.tree.outer_html(self.root())
        )
    }
}

/// Splits a full HTML file into the body start tag and the body content.
fn split_body(text: &str) -> (Option<&str>, &str) {
    let lower = text.to_ascii_lowercase();
    let start = lower.match_indices("<body").map(|(i, _)| i).find(|&i| {
        lower[i + 5..]
            .chars()
            .next()
            .is_some_and(|c| c == '>' || c == '/' || c.is_ascii_whitespace())
    });
    let Some(start) = start else {
        return (None, text);
    };
    let Some(tag_len) = lower[start..].find('>') else {
        return (None, text);
    };
    let content_start = start + tag_len + 1;
    let content_end = lower[content_start..]
        .rfind("</body")
        .map_or(text.len(), |i| content_start + i);
    (
        Some(&text[start..content_start]),
        &text[content_start..content_end],
    )
}
