/// Structural addresses: node paths and affected regions.
///
/// Both types are plain data with no tie to a live tree, so a record keeps
/// describing "where" an edit happened even after the nodes it touched are
/// gone. They are resolved against the current tree only at apply time.
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Route from the document root to an element: element-sibling indices,
/// root first. The empty path is the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// The path of the root element.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a path one level deeper.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

/// Formats as `[i,j,k]`, the form used by the selection string codec.
impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "]")
    }
}

impl FromStr for NodePath {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let inner = s
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .with_context(|| format!("path must be enclosed in brackets: {s:?}"))?;
        if inner.trim().is_empty() {
            return Ok(Self::root());
        }
        let indices = inner
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<usize>()
                    .with_context(|| format!("invalid path index {part:?} in {s:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(indices))
    }
}

/// Minimal bounding box of an edit.
///
/// `first_child_index` and `rest_children_count` count element children of
/// the element at `path`. A `None` first index means the whole content of
/// that element is affected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub path: NodePath,
    pub first_child_index: Option<usize>,
    /// Number of element children after the affected span.
    pub rest_children_count: usize,
    /// Text and comment nodes between the previous element child (or the
    /// start of the parent) and the first spanned element. Locates the span
    /// when an edit left no element in it.
    #[serde(default)]
    pub leading_text_nodes: usize,
}

impl Region {
    /// A region covering the entire content of the element at `path`.
    pub fn whole(path: NodePath) -> Self {
        Self {
            path,
            first_child_index: None,
            rest_children_count: 0,
            leading_text_nodes: 0,
        }
    }

    pub fn span(path: NodePath, first_child_index: usize, rest_children_count: usize) -> Self {
        Self {
            path,
            first_child_index: Some(first_child_index),
            rest_children_count,
            leading_text_nodes: 0,
        }
    }

    pub fn with_leading_text_nodes(mut self, count: usize) -> Self {
        self.leading_text_nodes = count;
        self
    }

    pub fn is_whole(&self) -> bool {
        self.first_child_index.is_none()
    }

    /// Half-open element-child index range this region covers in a parent
    /// that currently has `child_count` element children.
    ///
    /// Returns `None` when the stored bounds no longer fit.
    pub fn span_in(&self, child_count: usize) -> Option<std::ops::Range<usize>> {
        match self.first_child_index {
            None => Some(0..child_count),
            Some(first) => {
                let end = child_count.checked_sub(self.rest_children_count)?;
                (first <= end).then_some(first..end)
            }
        }
    }
}
