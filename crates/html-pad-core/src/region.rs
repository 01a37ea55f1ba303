/// Affected-region capture and replay.
///
/// Before an edit runs, [`claim_affected_content`] decides which contiguous
/// run of element children the edit can touch and optionally serializes it.
/// Undo and redo put a serialized run back with [`replay_region`]. Regions
/// index element children only; text nodes between the first and the last
/// spanned element travel with the run.
use std::ops::{BitOr, ControlFlow, Range};

use crate::document::Document;
use crate::dom::NodeId;
use crate::error::{EditorError, Result};
use crate::history::{ChildrenBackup, Region};
use crate::path::{find_element_by_path, get_child_path, get_common_parent, get_direct_child};

/// Options for [`claim_affected_content`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClaimFlags {
    /// Widen the start node to its nearest block ancestor.
    pub use_parent_block_node: bool,
    /// Serialize the claimed run.
    pub save_html: bool,
}

impl ClaimFlags {
    pub const NONE: Self = Self {
        use_parent_block_node: false,
        save_html: false,
    };
    pub const USE_PARENT_BLOCK_NODE: Self = Self {
        use_parent_block_node: true,
        save_html: false,
    };
    pub const SAVE_HTML: Self = Self {
        use_parent_block_node: false,
        save_html: true,
    };
}

impl BitOr for ClaimFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            use_parent_block_node: self.use_parent_block_node || rhs.use_parent_block_node,
            save_html: self.save_html || rhs.save_html,
        }
    }
}

/// Result of [`claim_affected_content`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectedContent {
    pub region: Region,
    /// Serialized run, present only with [`ClaimFlags::SAVE_HTML`].
    pub html: Option<String>,
}

/// Walks up from `node` to the nearest block element, stopping at the root.
pub fn get_parent_block_node(doc: &Document, node: NodeId) -> NodeId {
    let root = doc.root();
    let mut current = node;
    while current != root && !doc.is_block(current) {
        match doc.tree.parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

/// Computes the region an edit between `start` and `end` can touch.
///
/// A missing `start` takes the selection's anchor and focus (the root if
/// there is no selection); a missing `end` takes the selection's focus, then
/// `start`. The run is the element children of the nodes' common parent
/// from the one holding `start` through the one holding `end`, in either
/// order. When neither lies under a single child, the whole common parent
/// is claimed. Table cells and rows are widened to their table when saving
/// HTML, because a lone `<td>` cannot be re-parsed in place.
///
/// # Errors
///
/// Returns an error if the nodes are stale or detached.
pub fn claim_affected_content(
    doc: &Document,
    start: Option<NodeId>,
    end: Option<NodeId>,
    flags: ClaimFlags,
) -> Result<AffectedContent> {
    let tree = &doc.tree;
    let root = doc.root();

    let (mut start, from_selection) = match start {
        Some(node) => (node, false),
        None => (doc.selection.anchor_node().unwrap_or(root), true),
    };
    let end = end.or_else(|| doc.selection.focus_node()).unwrap_or(start);

    if flags.use_parent_block_node && (!from_selection || !doc.is_block(start)) {
        if start != root {
            start = tree.parent(start).unwrap_or(root);
        }
        start = get_parent_block_node(doc, start);
    }

    if flags.save_html {
        let element = if tree.is_text(start) {
            tree.parent(start).unwrap_or(root)
        } else {
            start
        };
        if matches!(tree.tag(element), Some("td" | "th" | "tr")) {
            if let Some(table) = tree.ancestors(element).find(|&a| tree.tag(a) == Some("table")) {
                start = table;
            }
        }
    }

    let stale = |node: NodeId| EditorError::StaleNode(node.to_string());
    let common = get_common_parent(tree, root, start, end, false).ok_or_else(|| stale(start))?;
    let path = get_child_path(tree, root, common).ok_or_else(|| stale(common))?;
    let mut start_child = get_direct_child(tree, common, start);
    let mut end_child = get_direct_child(tree, common, end);

    let children = tree.element_children(common);
    let mut first = None;
    let mut after = children.len();
    for (index, &child) in children.iter().enumerate() {
        if first.is_none() {
            if Some(child) == start_child {
                first = Some(index);
            } else if Some(child) == end_child {
                // Selection made from the bottom up
                std::mem::swap(&mut start_child, &mut end_child);
                first = Some(index);
            }
        }
        if first.is_some() && Some(child) == end_child {
            after = index + 1;
            break;
        }
    }

    let region = match first {
        Some(first) => Region::span(path, first, children.len() - after)
            .with_leading_text_nodes(leading_text_nodes(doc, children[first])),
        None => Region::whole(path),
    };
    let html = flags.save_html.then(|| match first {
        Some(first) => tree.nodes_html(&span_nodes(doc, common, first..after)),
        None => tree.inner_html(common),
    });

    tracing::trace!(
        "Claimed region at {} (first={:?}, rest={})",
        region.path,
        region.first_child_index,
        region.rest_children_count
    );
    Ok(AffectedContent { region, html })
}

/// All child nodes from the element at `range.start` through the element at
/// `range.end - 1`, including interleaved text. Empty for an empty range.
fn span_nodes(doc: &Document, parent: NodeId, range: Range<usize>) -> Vec<NodeId> {
    if range.is_empty() {
        return Vec::new();
    }
    let elements = doc.tree.element_children(parent);
    let (Some(&first), Some(&last)) = (elements.get(range.start), elements.get(range.end - 1))
    else {
        return Vec::new();
    };
    let nodes = doc.tree.child_nodes(parent);
    let from = nodes.iter().position(|&n| n == first).unwrap_or(0);
    let to = nodes.iter().position(|&n| n == last).unwrap_or(from);
    nodes[from..=to].to_vec()
}

/// Non-element siblings directly before `element`.
fn leading_text_nodes(doc: &Document, element: NodeId) -> usize {
    let mut count = 0;
    let mut current = doc.tree.previous_sibling(element);
    while let Some(node) = current {
        if doc.tree.is_element(node) {
            break;
        }
        count += 1;
        current = doc.tree.previous_sibling(node);
    }
    count
}

/// Where an emptied span sits: after the previous element child and the
/// span's leading text nodes. `None` means the end of `parent`.
fn empty_span_anchor(
    doc: &Document,
    parent: NodeId,
    region: &Region,
    start: usize,
) -> Option<NodeId> {
    let nodes = doc.tree.child_nodes(parent);
    let mut index = match start.checked_sub(1) {
        Some(previous) => {
            let previous = doc.tree.element_children(parent).get(previous).copied()?;
            nodes.iter().position(|&n| n == previous)? + 1
        }
        None => 0,
    };
    for _ in 0..region.leading_text_nodes {
        match nodes.get(index) {
            Some(&node) if !doc.tree.is_element(node) => index += 1,
            _ => break,
        }
    }
    nodes.get(index).copied()
}

/// Resolves a region to its parent element and the node run it covers.
fn resolve(doc: &Document, region: &Region) -> Result<(NodeId, Vec<NodeId>, Range<usize>)> {
    let parent = find_element_by_path(&doc.tree, doc.root(), &region.path)?;
    let count = doc.tree.element_child_count(parent);
    let range = region
        .span_in(count)
        .ok_or_else(|| EditorError::RegionMismatch {
            path: region.path.clone(),
            expected: region.first_child_index.unwrap_or(0) + region.rest_children_count,
            found: count,
        })?;
    let nodes = if region.is_whole() {
        doc.tree.child_nodes(parent).to_vec()
    } else {
        span_nodes(doc, parent, range.clone())
    };
    Ok((parent, nodes, range))
}

/// Serializes the current content of a region.
///
/// # Errors
///
/// Returns an error if the region no longer fits the tree.
pub fn capture_region_html(doc: &Document, region: &Region) -> Result<String> {
    let (_, nodes, _) = resolve(doc, region)?;
    Ok(doc.tree.nodes_html(&nodes))
}

/// Replaces the content of a region with `html`.
///
/// The spanned run is removed and the parsed nodes are inserted where it
/// was; for an empty run they go after the previous element child and the
/// text nodes that led the span when it was claimed.
///
/// # Errors
///
/// Returns an error if the region no longer fits the tree or `html` does not
/// parse. The tree is unchanged when parsing fails.
pub fn replay_region(doc: &mut Document, region: &Region, html: &str) -> Result<()> {
    let (parent, nodes, range) = resolve(doc, region)?;
    let reference = match nodes.last() {
        Some(&last) => doc.tree.next_sibling(last),
        None if region.is_whole() => None,
        None => empty_span_anchor(doc, parent, region, range.start),
    };

    let replacement = doc.tree.parse_fragment(html)?;
    for node in nodes {
        doc.tree.remove(node)?;
    }
    for node in replacement {
        doc.tree.insert_before(parent, node, reference)?;
    }
    Ok(())
}

/// Traversal options for [`for_each_child_in_affected_content`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Traversal {
    /// Visit only the region's own children, not their descendants.
    pub flat: bool,
    /// Call the visitor only for block elements.
    pub only_block_elements: bool,
}

/// Visits the elements of a claimed region, children before their parent.
///
/// The visitor gets the region's parent element and the visited element,
/// and may mutate the document; each level's sibling list is captured
/// before its elements are visited. Returns `Ok(false)` when the visitor
/// stopped the walk.
///
/// # Errors
///
/// Returns an error if the region's parent no longer resolves.
pub fn for_each_child_in_affected_content<F>(
    doc: &mut Document,
    region: &Region,
    traversal: Traversal,
    mut visit: F,
) -> Result<bool>
where
    F: FnMut(&mut Document, NodeId, NodeId) -> ControlFlow<()>,
{
    let parent = find_element_by_path(&doc.tree, doc.root(), &region.path)?;
    let children = doc.tree.element_children(parent);
    let range = region
        .span_in(children.len())
        .unwrap_or(region.first_child_index.unwrap_or(0)..children.len());
    let level = children
        .get(range.start..range.end.min(children.len()))
        .unwrap_or_default()
        .to_vec();
    Ok(visit_level(doc, parent, &level, traversal, &mut visit).is_continue())
}

fn visit_level<F>(
    doc: &mut Document,
    top: NodeId,
    elements: &[NodeId],
    traversal: Traversal,
    visit: &mut F,
) -> ControlFlow<()>
where
    F: FnMut(&mut Document, NodeId, NodeId) -> ControlFlow<()>,
{
    for &element in elements {
        if !doc.tree.is_alive(element) {
            continue;
        }
        if !traversal.flat {
            let nested = doc.tree.element_children(element);
            if !nested.is_empty() {
                visit_level(doc, top, &nested, traversal, visit)?;
            }
        }
        if !traversal.only_block_elements || doc.is_block(element) {
            visit(doc, top, element)?;
        }
    }
    ControlFlow::Continue(())
}

/// Backs up the element children `first..=last` of `parent` before a
/// command restructures them.
///
/// # Errors
///
/// Returns an error if `parent` is not in the tree or the bounds do not fit.
pub fn backup_children_before(
    doc: &Document,
    parent: NodeId,
    first: usize,
    last: usize,
) -> Result<ChildrenBackup> {
    let path = get_child_path(&doc.tree, doc.root(), parent)
        .ok_or_else(|| EditorError::StaleNode(parent.to_string()))?;
    let count = doc.tree.element_child_count(parent);
    if first > last || last >= count {
        return Err(EditorError::RegionMismatch {
            path,
            expected: last + 1,
            found: count,
        });
    }
    let first_element = doc.tree.element_children(parent)[first];
    let region = Region::span(path, first, count - last - 1)
        .with_leading_text_nodes(leading_text_nodes(doc, first_element));
    let html_before = doc
        .tree
        .nodes_html(&span_nodes(doc, parent, first..last + 1));
    Ok(ChildrenBackup {
        region,
        html_before,
        html_after: None,
    })
}

/// Completes a backup with the content the command left in its region.
///
/// # Errors
///
/// Returns an error if the region no longer fits the tree.
pub fn backup_children_after(doc: &Document, backup: &mut ChildrenBackup) -> Result<()> {
    backup.html_after = Some(capture_region_html(doc, &backup.region)?);
    Ok(())
}

/// Puts back one side of a children backup.
///
/// # Errors
///
/// Returns an error if the backup is incomplete or the region no longer
/// fits the tree.
pub fn restore_children(doc: &mut Document, backup: &ChildrenBackup, is_undo: bool) -> Result<()> {
    let html = if is_undo {
        Some(backup.html_before.as_str())
    } else {
        backup.html_after.as_deref()
    };
    let html = html.ok_or_else(|| {
        EditorError::InvalidOperation(format!(
            "children backup at {} was never completed",
            backup.region.path
        ))
    })?;
    replay_region(doc, &backup.region, html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Boundary, DomSelection};
    use crate::history::NodePath;

    fn doc(html: &str) -> Document {
        Document::from_html(html).expect("parse")
    }

    fn children(d: &Document, node: NodeId) -> Vec<NodeId> {
        d.tree.element_children(node)
    }

    #[test]
    fn test_flags_combine() {
        let flags = ClaimFlags::USE_PARENT_BLOCK_NODE | ClaimFlags::SAVE_HTML;
        assert!(flags.use_parent_block_node);
        assert!(flags.save_html);
        assert_eq!(ClaimFlags::default(), ClaimFlags::NONE);
    }

    #[test]
    fn test_claim_caret_in_text() {
        let mut d = doc("<p>x</p><div>a</div><p>y</p>");
        let div = children(&d, d.root())[1];
        let text = d.tree.child_nodes(div)[0];
        d.set_caret(text, 1);

        let affected = claim_affected_content(&d, None, None, ClaimFlags::SAVE_HTML).expect("claim");
        assert_eq!(affected.region, Region::span(NodePath::root(), 1, 1));
        assert_eq!(affected.html.as_deref(), Some("<div>a</div>"));
    }

    #[test]
    fn test_claim_range_in_either_direction() {
        let mut d = doc("<p>1</p><p>2</p><p>3</p><p>4</p>");
        let ps = children(&d, d.root());
        let second = d.tree.child_nodes(ps[1])[0];
        let third = d.tree.child_nodes(ps[2])[0];

        for (a, f) in [(second, third), (third, second)] {
            d.selection = DomSelection::range(Boundary::new(a, 0), Boundary::new(f, 1));
            let affected =
                claim_affected_content(&d, None, None, ClaimFlags::SAVE_HTML).expect("claim");
            assert_eq!(affected.region, Region::span(NodePath::root(), 1, 1));
            assert_eq!(affected.html.as_deref(), Some("<p>2</p><p>3</p>"));
        }
    }

    #[test]
    fn test_claim_without_html() {
        let d = doc("<p>1</p>");
        let p = children(&d, d.root())[0];
        let affected = claim_affected_content(&d, Some(p), Some(p), ClaimFlags::NONE).expect("claim");
        assert_eq!(affected.html, None);
        assert_eq!(affected.region, Region::span(NodePath::root(), 0, 0));
    }

    #[test]
    fn test_claim_root_is_whole() {
        let d = doc("<p>1</p><p>2</p>");
        let root = d.root();
        let affected =
            claim_affected_content(&d, Some(root), Some(root), ClaimFlags::SAVE_HTML).expect("claim");
        assert!(affected.region.is_whole());
        assert_eq!(affected.html.as_deref(), Some("<p>1</p><p>2</p>"));
    }

    #[test]
    fn test_claim_without_selection_uses_root() {
        let d = doc("<p>1</p>");
        let affected = claim_affected_content(&d, None, None, ClaimFlags::SAVE_HTML).expect("claim");
        assert!(affected.region.is_whole());
    }

    #[test]
    fn test_claim_widens_to_parent_block() {
        let d = doc("<div><p><b>x</b></p></div>");
        let div = children(&d, d.root())[0];
        let p = children(&d, div)[0];
        let bold = children(&d, p)[0];

        let affected = claim_affected_content(
            &d,
            Some(bold),
            Some(bold),
            ClaimFlags::USE_PARENT_BLOCK_NODE | ClaimFlags::SAVE_HTML,
        )
        .expect("claim");
        // start widened to <p>; common parent of <p> and <b> is <div>
        assert_eq!(affected.region, Region::span(NodePath::new(vec![0]), 0, 0));
        assert_eq!(affected.html.as_deref(), Some("<p><b>x</b></p>"));
    }

    #[test]
    fn test_claim_table_cell_widens_to_table() {
        let mut d = doc("<p>a</p><table><tr><td>1</td><td>2</td></tr></table>");
        let table = children(&d, d.root())[1];
        let tr = children(&d, table)[0];
        let td = children(&d, tr)[1];
        let text = d.tree.child_nodes(td)[0];
        d.set_caret(text, 0);

        let affected = claim_affected_content(&d, None, None, ClaimFlags::SAVE_HTML).expect("claim");
        assert_eq!(affected.region, Region::span(NodePath::root(), 1, 0));
        assert!(affected.html.expect("html").starts_with("<table>"));
    }

    #[test]
    fn test_parent_block_node() {
        let d = doc("<div><span><b>x</b></span></div><i>y</i>");
        let div = children(&d, d.root())[0];
        let span = children(&d, div)[0];
        let bold = children(&d, span)[0];
        let italic = children(&d, d.root())[1];
        assert_eq!(get_parent_block_node(&d, bold), div);
        assert_eq!(get_parent_block_node(&d, div), div);
        assert_eq!(get_parent_block_node(&d, italic), d.root());
    }

    #[test]
    fn test_replay_region_swaps_span() {
        let mut d = doc("<p>1</p><p>2</p><p>3</p>");
        replay_region(&mut d, &Region::span(NodePath::root(), 1, 1), "<h1>x</h1><h2>y</h2>")
            .expect("replay");
        assert_eq!(d.body_html(), "<p>1</p><h1>x</h1><h2>y</h2><p>3</p>");

        // The region now spans two elements with one left after them
        replay_region(&mut d, &Region::span(NodePath::root(), 1, 1), "<p>2</p>").expect("replay");
        assert_eq!(d.body_html(), "<p>1</p><p>2</p><p>3</p>");
    }

    #[test]
    fn test_replay_moves_interleaved_text() {
        let mut d = doc("<b>1</b>mid<i>2</i>tail");
        replay_region(&mut d, &Region::span(NodePath::root(), 0, 0), "<u>x</u>").expect("replay");
        assert_eq!(d.body_html(), "<u>x</u>tail");
    }

    #[test]
    fn test_replay_empty_span_inserts() {
        let mut d = doc("<p>1</p><p>3</p>");
        replay_region(&mut d, &Region::span(NodePath::root(), 1, 1), "<p>2</p>").expect("replay");
        assert_eq!(d.body_html(), "<p>1</p><p>2</p><p>3</p>");

        let mut d = doc("<p>1</p>");
        replay_region(&mut d, &Region::span(NodePath::root(), 1, 0), "<p>2</p>").expect("replay");
        assert_eq!(d.body_html(), "<p>1</p><p>2</p>");
    }

    #[test]
    fn test_replay_empty_span_after_leading_text() {
        let mut d = doc("a<br>b<br>c");
        let second = children(&d, d.root())[1];
        d.tree.remove(second).expect("remove");
        assert_eq!(d.tree.child_nodes(d.root()).len(), 4);

        let region = Region::span(NodePath::root(), 1, 0).with_leading_text_nodes(1);
        replay_region(&mut d, &region, "<br>").expect("replay");
        assert_eq!(d.body_html(), "a<br>b<br>c");
    }

    #[test]
    fn test_claim_counts_leading_text() {
        let d = doc("a<br>b<br>c");
        let second = children(&d, d.root())[1];
        let affected =
            claim_affected_content(&d, Some(second), Some(second), ClaimFlags::SAVE_HTML)
                .expect("claim");
        assert_eq!(
            affected.region,
            Region::span(NodePath::root(), 1, 0).with_leading_text_nodes(1)
        );
        assert_eq!(affected.html.as_deref(), Some("<br>"));
    }

    #[test]
    fn test_replay_whole_region() {
        let mut d = doc("<div>a<b>b</b></div>");
        replay_region(&mut d, &Region::whole(NodePath::new(vec![0])), "z").expect("replay");
        assert_eq!(d.body_html(), "<div>z</div>");
    }

    #[test]
    fn test_replay_mismatch_is_error() {
        let mut d = doc("<p>1</p>");
        let err = replay_region(&mut d, &Region::span(NodePath::root(), 1, 3), "").unwrap_err();
        assert!(matches!(err, EditorError::RegionMismatch { .. }));
        let err = replay_region(&mut d, &Region::whole(NodePath::new(vec![4])), "").unwrap_err();
        assert!(matches!(err, EditorError::PathResolution { .. }));
    }

    #[test]
    fn test_replay_bad_html_leaves_tree() {
        let mut d = doc("<p>1</p>");
        assert!(replay_region(&mut d, &Region::span(NodePath::root(), 0, 0), "<b></i>").is_err());
        assert_eq!(d.body_html(), "<p>1</p>");
    }

    #[test]
    fn test_capture_region_html() {
        let d = doc("<p>1</p><p>2</p><p>3</p>");
        assert_eq!(
            capture_region_html(&d, &Region::span(NodePath::root(), 0, 2)).expect("capture"),
            "<p>1</p>"
        );
        assert_eq!(
            capture_region_html(&d, &Region::whole(NodePath::new(vec![2]))).expect("capture"),
            "3"
        );
    }

    #[test]
    fn test_for_each_visits_children_first() {
        let mut d = doc("<div><p>a</p><p>b</p></div><div><p>c</p></div><div>z</div>");
        let region = Region::span(NodePath::root(), 0, 1);
        let mut seen = Vec::new();
        let finished = for_each_child_in_affected_content(
            &mut d,
            &region,
            Traversal::default(),
            |doc, _, element| {
                seen.push(doc.tree.outer_html(element));
                ControlFlow::Continue(())
            },
        )
        .expect("walk");
        assert!(finished);
        assert_eq!(
            seen,
            vec![
                "<p>a</p>",
                "<p>b</p>",
                "<div><p>a</p><p>b</p></div>",
                "<p>c</p>",
                "<div><p>c</p></div>",
            ]
        );
    }

    #[test]
    fn test_for_each_flat_and_block_filter() {
        let mut d = doc("<div><b>a</b></div><span>x</span><p>b</p>");
        let region = Region::whole(NodePath::root());

        let mut tags = Vec::new();
        let traversal = Traversal {
            flat: true,
            only_block_elements: true,
        };
        for_each_child_in_affected_content(&mut d, &region, traversal, |doc, _, element| {
            tags.push(doc.tree.tag(element).unwrap_or_default().to_string());
            ControlFlow::Continue(())
        })
        .expect("walk");
        assert_eq!(tags, vec!["div", "p"]);
    }

    #[test]
    fn test_for_each_can_stop_and_mutate() {
        let mut d = doc("<p>1</p><p>2</p><p>3</p>");
        let region = Region::whole(NodePath::root());
        let mut visited = 0;
        let finished = for_each_child_in_affected_content(
            &mut d,
            &region,
            Traversal::default(),
            |doc, _, element| {
                visited += 1;
                if visited == 2 {
                    return ControlFlow::Break(());
                }
                doc.tree
                    .set_attribute(element, "align", "center")
                    .map_or(ControlFlow::Break(()), |_| ControlFlow::Continue(()))
            },
        )
        .expect("walk");
        assert!(!finished);
        assert_eq!(
            d.body_html(),
            "<p align=\"center\">1</p><p>2</p><p>3</p>"
        );
    }

    #[test]
    fn test_children_backup_round_trip() {
        let mut d = doc("<ul><li>1</li><li>2</li><li>3</li></ul>");
        let ul = children(&d, d.root())[0];
        let mut backup = backup_children_before(&d, ul, 1, 1).expect("backup");
        assert_eq!(backup.html_before, "<li>2</li>");

        // Split the middle item in two
        let li = children(&d, ul)[1];
        let extra = d.tree.create_element("li");
        let text = d.tree.create_text("2b");
        d.tree.append_child(extra, text).expect("append");
        let after = d.tree.next_sibling(li);
        d.tree.insert_before(ul, extra, after).expect("insert");
        backup_children_after(&d, &mut backup).expect("after");
        assert_eq!(backup.html_after.as_deref(), Some("<li>2</li><li>2b</li>"));

        restore_children(&mut d, &backup, true).expect("undo");
        assert_eq!(d.body_html(), "<ul><li>1</li><li>2</li><li>3</li></ul>");
        restore_children(&mut d, &backup, false).expect("redo");
        assert_eq!(
            d.body_html(),
            "<ul><li>1</li><li>2</li><li>2b</li><li>3</li></ul>"
        );
    }

    #[test]
    fn test_backup_bounds_checked() {
        let d = doc("<ul><li>1</li></ul>");
        let ul = children(&d, d.root())[0];
        assert!(backup_children_before(&d, ul, 0, 1).is_err());
        assert!(backup_children_before(&d, ul, 1, 0).is_err());
    }

    #[test]
    fn test_incomplete_backup_cannot_redo() {
        let mut d = doc("<ul><li>1</li></ul>");
        let ul = children(&d, d.root())[0];
        let backup = backup_children_before(&d, ul, 0, 0).expect("backup");
        assert!(restore_children(&mut d, &backup, false).is_err());
    }
}
