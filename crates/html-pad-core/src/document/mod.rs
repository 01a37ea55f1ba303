//! Document model combining the HTML tree, the live selection and file
//! metadata.
//!
//! A `Document` is what the editing operations mutate. Block classification
//! comes from the configured block tag set. File I/O is in the `io`
//! submodule.

mod io;

use std::path::PathBuf;

use html_pad_config::EditorConfig;

use crate::dom::{NodeId, Tree};
use crate::encoding::TextEncoding;
use crate::error::Result;

/// One end of the live selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    /// Char offset inside a text node, or child-node index inside an element.
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// The live selection, expressed in node handles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomSelection {
    pub anchor: Option<Boundary>,
    /// `None` means a caret at the anchor.
    pub focus: Option<Boundary>,
}

impl DomSelection {
    pub fn caret(node: NodeId, offset: usize) -> Self {
        Self {
            anchor: Some(Boundary::new(node, offset)),
            focus: None,
        }
    }

    pub fn range(anchor: Boundary, focus: Boundary) -> Self {
        Self {
            anchor: Some(anchor),
            focus: Some(focus),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.focus.is_none() || self.focus == self.anchor
    }

    pub fn anchor_node(&self) -> Option<NodeId> {
        self.anchor.map(|b| b.node)
    }

    /// The focus node, falling back to the anchor for a caret.
    pub fn focus_node(&self) -> Option<NodeId> {
        self.focus.or(self.anchor).map(|b| b.node)
    }
}

/// A single HTML document with its selection and metadata.
#[derive(Debug, Clone)]
pub struct Document {
    pub tree: Tree,
    pub selection: DomSelection,
    /// File path on disk, if any.
    pub file_path: Option<PathBuf>,
    pub encoding: TextEncoding,
    /// Whether the body changed since the last load or save.
    pub modified: bool,
    block_tags: Vec<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document with the default block tag set.
    pub fn new() -> Self {
        Self::with_block_tags(html_pad_config::default_block_tags())
    }

    /// Creates an empty document using the configured block tags.
    pub fn with_config(config: &EditorConfig) -> Self {
        Self::with_block_tags(config.block_tags.clone())
    }

    pub fn with_block_tags(block_tags: Vec<String>) -> Self {
        Self {
            tree: Tree::new(),
            selection: DomSelection::default(),
            file_path: None,
            encoding: TextEncoding::default(),
            modified: false,
            block_tags: block_tags
                .into_iter()
                .map(|tag| tag.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Creates a document whose body holds `html`.
    ///
    /// # Errors
    ///
    /// Returns an error if `html` does not parse.
    pub fn from_html(html: &str) -> Result<Self> {
        let mut doc = Self::new();
        doc.set_body_html(html)?;
        Ok(doc)
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Whether `node` is an element whose tag is in the block set.
    pub fn is_block(&self, node: NodeId) -> bool {
        self.tree
            .tag(node)
            .is_some_and(|tag| self.block_tags.iter().any(|b| b == tag))
    }

    pub fn block_tags(&self) -> &[String] {
        &self.block_tags
    }

    /// Serialized children of the body.
    pub fn body_html(&self) -> String {
        self.tree.inner_html(self.root())
    }

    /// Replaces all children of the body with the parsed `html`.
    ///
    /// Body attributes are kept. The selection is cleared, since every
    /// node it could point at is gone.
    ///
    /// # Errors
    ///
    /// Returns an error if `html` does not parse; the body is left untouched.
    pub fn set_body_html(&mut self, html: &str) -> Result<()> {
        let root = self.root();
        let nodes = self.tree.parse_fragment(html)?;
        self.tree.clear_children(root)?;
        for node in nodes {
            self.tree.append_child(root, node)?;
        }
        self.selection = DomSelection::default();
        Ok(())
    }

    /// Places a caret.
    pub fn set_caret(&mut self, node: NodeId, offset: usize) {
        self.selection = DomSelection::caret(node, offset);
    }

    /// Places a caret at the start of the body.
    pub fn caret_to_start(&mut self) {
        let root = self.root();
        self.set_caret(root, 0);
    }

    /// Clears selection boundaries that point at removed or detached nodes.
    pub fn drop_stale_selection(&mut self) {
        let tree = &self.tree;
        let live = |b: Option<Boundary>| b.filter(|b| tree.is_attached(b.node));
        let anchor = live(self.selection.anchor);
        let focus = live(self.selection.focus);
        self.selection = match anchor {
            Some(anchor) => DomSelection {
                anchor: Some(anchor),
                focus,
            },
            None => DomSelection::default(),
        };
    }

    /// Returns the display title for this document.
    pub fn title(&self) -> String {
        self.file_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string())
    }
}
