//! Arena-backed HTML tree.
//!
//! Nodes live in a slot vector and are addressed by generational `NodeId`s,
//! so a handle to a removed node is detected as stale instead of silently
//! pointing at a reused slot. The tree always has a fixed `body` root.
//! HTML parsing is in the `parse` submodule and serialization in `serialize`.

mod parse;
mod serialize;

use crate::error::{EditorError, Result};

/// Handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// A mutable HTML tree rooted at a `body` element.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree holding only the empty `body` root.
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        tree.root = tree.alloc(NodeKind::Element {
            tag: "body".to_string(),
            attributes: Vec::new(),
        });
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.data = Some(data);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                data: Some(data),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
            .ok_or_else(|| EditorError::StaleNode(id.to_string()))
    }

    fn live(&self, id: NodeId) -> Result<&NodeData> {
        self.data(id)
            .ok_or_else(|| EditorError::StaleNode(id.to_string()))
    }

    // --- inspection ---

    /// Whether `id` refers to a live node (attached or not).
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    /// Whether `id` is live and reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_alive(id) && self.contains(self.root, id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.data(id).map(|d| &d.kind)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element { .. }))
    }

    /// Lowercase tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    /// Length of a text node in chars; zero for elements.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map_or(0, |t| t.chars().count())
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.kind(id) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|d| d.parent)
    }

    /// All children, text included, in document order.
    pub fn child_nodes(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map_or(&[], |d| d.children.as_slice())
    }

    /// Element children only; these are what paths and regions index.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.child_nodes(id)
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    pub fn element_child_count(&self, id: NodeId) -> usize {
        self.child_nodes(id)
            .iter()
            .filter(|&&child| self.is_element(child))
            .count()
    }

    /// Position of `id` among all of its parent's children.
    pub fn child_node_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.child_nodes(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.child_node_index(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.child_nodes(parent).get(i).copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.child_node_index(id)?;
        self.child_nodes(parent).get(index + 1).copied()
    }

    /// Iterates from the parent of `id` up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&node| self.parent(node))
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Element { .. }) => {
                for &child in self.child_nodes(id) {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    // --- creation and mutation ---

    /// Creates a detached element. The tag is stored lowercase.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    /// Replaces the content of a text node.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is stale or not a text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Text(current) => {
                *current = text.to_string();
                Ok(())
            }
            NodeKind::Element { .. } => Err(EditorError::InvalidOperation(format!(
                "{id} is an element, not a text node"
            ))),
        }
    }

    /// Sets an attribute, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is stale or a text node.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<Option<String>> {
        let attributes = self.attributes_mut(id)?;
        let name = name.to_ascii_lowercase();
        match attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, current)) => Ok(Some(std::mem::replace(current, value.to_string()))),
            None => {
                attributes.push((name, value.to_string()));
                Ok(None)
            }
        }
    }

    /// Removes an attribute, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is stale or a text node.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>> {
        let attributes = self.attributes_mut(id)?;
        let name = name.to_ascii_lowercase();
        Ok(attributes
            .iter()
            .position(|(key, _)| *key == name)
            .map(|index| attributes.remove(index).1))
    }

    fn attributes_mut(&mut self, id: NodeId) -> Result<&mut Vec<(String, String)>> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            NodeKind::Text(_) => Err(EditorError::InvalidOperation(format!(
                "{id} is a text node and has no attributes"
            ))),
        }
    }

    /// Inserts `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`. A child that is already attached elsewhere is
    /// moved.
    ///
    /// # Errors
    ///
    /// Returns an error if any node is stale, `parent` is a text node,
    /// `reference` is not a child of `parent`, or the insertion would make
    /// a node its own ancestor.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        if !self.is_element(parent) {
            return Err(EditorError::InvalidOperation(format!(
                "cannot insert into {parent}: not a live element"
            )));
        }
        self.live(child)?;
        if child == self.root || self.contains(child, parent) {
            return Err(EditorError::InvalidOperation(format!(
                "inserting {child} into {parent} would create a cycle"
            )));
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(EditorError::InvalidOperation(format!(
                    "{reference} is not a child of {parent}"
                )));
            }
            if reference == child {
                return Ok(());
            }
        }

        self.detach(child)?;
        let index = match reference {
            Some(reference) => self
                .child_nodes(parent)
                .iter()
                .position(|&c| c == reference)
                .unwrap_or(self.child_nodes(parent).len()),
            None => self.child_nodes(parent).len(),
        };
        self.data_mut(parent)?.children.insert(index, child);
        self.data_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// See [`Tree::insert_before`].
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Unlinks `id` from its parent, keeping it alive.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is stale.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let Some(parent) = self.live(id)?.parent else {
            return Ok(());
        };
        self.data_mut(parent)?.children.retain(|&c| c != id);
        self.data_mut(id)?.parent = None;
        Ok(())
    }

    /// Detaches `id` and frees it along with its whole subtree.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is stale or is the root.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(EditorError::InvalidOperation(
                "the root cannot be removed".to_string(),
            ));
        }
        self.detach(id)?;
        let mut pending = vec![id];
        while let Some(node) = pending.pop() {
            let slot = &mut self.slots[node.index as usize];
            if let Some(data) = slot.data.take() {
                pending.extend(data.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(node.index);
            }
        }
        Ok(())
    }

    /// Removes every child of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is stale.
    pub fn clear_children(&mut self, id: NodeId) -> Result<()> {
        let children = self.live(id)?.children.clone();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }
}
