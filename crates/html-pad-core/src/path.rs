/// Structural addressing of nodes relative to the document root.
///
/// A path is the list of element-child indices from the root down to an
/// element. Text nodes are not addressable: they are located through their
/// parent element plus a character offset across the element's text run.
use crate::dom::{NodeId, Tree};
use crate::error::{EditorError, Result};
use crate::history::NodePath;

/// Computes the path from `root` to `node`.
///
/// A text node maps to its parent element. Returns `None` when the node is
/// stale or not inside `root`.
pub fn get_child_path(tree: &Tree, root: NodeId, node: NodeId) -> Option<NodePath> {
    let mut current = if tree.is_text(node) {
        tree.parent(node)?
    } else {
        node
    };
    if !tree.is_alive(current) {
        return None;
    }

    let mut indices = Vec::new();
    while current != root {
        let parent = tree.parent(current)?;
        indices.push(get_child_index(tree, parent, current)?);
        current = parent;
    }
    indices.reverse();
    Some(NodePath::new(indices))
}

/// Resolves `path` from `root`.
///
/// # Errors
///
/// Returns `EditorError::PathResolution` naming the first index that does
/// not exist.
pub fn find_element_by_path(tree: &Tree, root: NodeId, path: &NodePath) -> Result<NodeId> {
    let mut current = root;
    for (depth, &index) in path.indices().iter().enumerate() {
        let children = tree.element_children(current);
        current = *children
            .get(index)
            .ok_or_else(|| EditorError::PathResolution {
                path: path.clone(),
                depth,
                index,
                available: children.len(),
            })?;
    }
    Ok(current)
}

/// Number of characters in the text siblings that precede `node` within
/// its parent. Elements break a text run but do not reset the count, which
/// matches how offsets are resolved back in [`get_text_offset_node`].
/// Zero for element nodes.
pub fn get_overall_text_offset(tree: &Tree, node: NodeId) -> usize {
    if !tree.is_text(node) {
        return 0;
    }
    let Some(parent) = tree.parent(node) else {
        return 0;
    };
    tree.child_nodes(parent)
        .iter()
        .take_while(|&&child| child != node)
        .map(|&child| tree.text_len(child))
        .sum()
}

/// Finds the text child of `element` holding the overall text `offset`.
///
/// Walks the direct text children, consuming lengths until the remainder
/// fits. Returns `(element, offset)` unchanged when the element has no text
/// children, and clamps to the end of the last text child when the offset
/// exceeds the run.
pub fn get_text_offset_node(tree: &Tree, element: NodeId, offset: usize) -> (NodeId, usize) {
    let mut remaining = offset;
    let mut last_text = None;
    for &child in tree.child_nodes(element) {
        if !tree.is_text(child) {
            continue;
        }
        let len = tree.text_len(child);
        if remaining <= len {
            return (child, remaining);
        }
        remaining -= len;
        last_text = Some((child, len));
    }
    last_text.unwrap_or((element, offset))
}

/// Index of `child` among the element children of `parent`.
pub fn get_child_index(tree: &Tree, parent: NodeId, child: NodeId) -> Option<usize> {
    if tree.parent(child) != Some(parent) || !tree.is_element(child) {
        return None;
    }
    tree.child_nodes(parent)
        .iter()
        .filter(|&&c| tree.is_element(c))
        .position(|&c| c == child)
}

/// Lowest common ancestor of two nodes, below the root.
///
/// Text nodes stand for their parent element. If either node is the root,
/// or the nodes share no ancestor below it, the root is returned. Unless
/// `long_path` is set, both walks start from the parents, so a node is never
/// reported as its own common parent. `None` only for stale nodes.
pub fn get_common_parent(
    tree: &Tree,
    root: NodeId,
    first: NodeId,
    second: NodeId,
    long_path: bool,
) -> Option<NodeId> {
    let first = element_for(tree, first)?;
    let second = element_for(tree, second)?;
    if first == root || second == root {
        return Some(root);
    }

    let (first, second) = if long_path {
        (first, second)
    } else {
        (tree.parent(first)?, tree.parent(second)?)
    };
    let common = std::iter::successors(Some(first), |&node| tree.parent(node))
        .take_while(|&node| node != root)
        .find(|&ancestor| tree.contains(ancestor, second));
    Some(common.unwrap_or(root))
}

fn element_for(tree: &Tree, node: NodeId) -> Option<NodeId> {
    if tree.is_text(node) {
        tree.parent(node)
    } else {
        tree.is_alive(node).then_some(node)
    }
}

/// The child of `parent` on the path down to `node`.
///
/// Returns `None` when `node` is `parent` itself or not inside it.
pub fn get_direct_child(tree: &Tree, parent: NodeId, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        let up = tree.parent(current)?;
        if up == parent {
            return Some(current);
        }
        current = up;
    }
}
