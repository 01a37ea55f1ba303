/// Conversion between the live selection and path-based snapshots.
///
/// Snapshots survive arbitrary tree mutation as long as the structure they
/// point at is restored, which is what undo and redo guarantee. The
/// [`SelectionUpdater`] covers the other case: a command that removes the
/// node holding the caret during the operation.
use crate::document::{Boundary, Document, DomSelection};
use crate::dom::NodeId;
use crate::history::{SelectionPoint, SelectionSnapshot};
use crate::path::{
    find_element_by_path, get_child_path, get_overall_text_offset, get_text_offset_node,
};

/// Body attribute used to carry a selection through serialization.
pub const SELECTION_ATTRIBUTE: &str = "data-html-pad-selection";

fn store_point(doc: &Document, boundary: Boundary) -> Option<SelectionPoint> {
    let root = doc.root();
    let path = get_child_path(&doc.tree, root, boundary.node)?;
    if doc.tree.is_text(boundary.node) {
        let offset = boundary.offset + get_overall_text_offset(&doc.tree, boundary.node);
        Some(SelectionPoint::text(path, offset))
    } else {
        Some(SelectionPoint::element(path, boundary.offset))
    }
}

fn restore_point(doc: &Document, point: &SelectionPoint) -> Option<Boundary> {
    let element = match find_element_by_path(&doc.tree, doc.root(), &point.path) {
        Ok(element) => element,
        Err(e) => {
            tracing::debug!("Selection point no longer resolves: {e}");
            return None;
        }
    };
    if point.is_element {
        let max = doc.tree.child_nodes(element).len();
        return Some(Boundary::new(element, point.offset.min(max)));
    }
    let (node, offset) = get_text_offset_node(&doc.tree, element, point.offset);
    Some(Boundary::new(node, offset))
}

/// Captures the live selection, or `None` when there is none or its anchor
/// is outside the tree.
pub fn store(doc: &Document) -> Option<SelectionSnapshot> {
    let anchor = store_point(doc, doc.selection.anchor?)?;
    let focus = match doc.selection.focus {
        Some(focus) if !doc.selection.is_collapsed() => store_point(doc, focus),
        _ => None,
    };
    Some(SelectionSnapshot { anchor, focus })
}

/// Applies a snapshot to the live selection.
///
/// Best effort: a snapshot whose anchor no longer resolves leaves the
/// selection untouched and returns `false`. An unresolvable focus collapses
/// the selection to the anchor.
pub fn restore(doc: &mut Document, snapshot: &SelectionSnapshot) -> bool {
    let Some(anchor) = restore_point(doc, &snapshot.anchor) else {
        return false;
    };
    let focus = snapshot
        .focus
        .as_ref()
        .and_then(|point| restore_point(doc, point));
    doc.selection = DomSelection {
        anchor: Some(anchor),
        focus,
    };
    true
}

/// Writes the current selection into a body attribute so it survives a
/// serialize and reparse cycle. Returns `false` when there is no selection.
///
/// # Errors
///
/// Returns an error if the attribute cannot be set.
pub fn stash_in_body(doc: &mut Document) -> crate::error::Result<bool> {
    let Some(snapshot) = store(doc) else {
        return Ok(false);
    };
    let root = doc.root();
    doc.tree
        .set_attribute(root, SELECTION_ATTRIBUTE, &snapshot.to_string())?;
    Ok(true)
}

/// Restores and removes a selection written by [`stash_in_body`].
///
/// Returns `false` when the attribute is missing, malformed or no longer
/// resolves; the attribute is removed in every case.
pub fn restore_from_body(doc: &mut Document) -> bool {
    let root = doc.root();
    let Ok(Some(encoded)) = doc.tree.remove_attribute(root, SELECTION_ATTRIBUTE) else {
        return false;
    };
    match encoded.parse::<SelectionSnapshot>() {
        Ok(snapshot) => restore(doc, &snapshot),
        Err(e) => {
            tracing::warn!("Ignoring malformed stored selection: {e}");
            false
        }
    }
}

/// Tracks one selection boundary across a node removal.
#[derive(Debug, Clone, Copy)]
struct Tracked {
    node: NodeId,
    offset: usize,
    /// Offset across the parent's text run for text nodes.
    run_offset: usize,
    moved: bool,
}

impl Tracked {
    fn new(doc: &Document, boundary: Boundary) -> Self {
        Self {
            node: boundary.node,
            offset: boundary.offset,
            run_offset: boundary.offset + get_overall_text_offset(&doc.tree, boundary.node),
            moved: false,
        }
    }

    fn resolve(&self, doc: &Document) -> Option<Boundary> {
        if !doc.tree.is_attached(self.node) {
            return None;
        }
        if !self.moved {
            return Some(Boundary::new(self.node, self.offset));
        }
        if doc.tree.is_text(self.node) {
            let parent = doc.tree.parent(self.node)?;
            let (node, offset) = get_text_offset_node(&doc.tree, parent, self.offset);
            Some(Boundary::new(node, offset))
        } else {
            Some(Boundary::new(self.node, self.offset))
        }
    }
}

/// Keeps the selection valid while a command removes nodes.
///
/// Usage: create before the mutation, call [`before_remove`] and
/// [`after_remove`] around each removal, then [`restore`].
///
/// [`before_remove`]: SelectionUpdater::before_remove
/// [`after_remove`]: SelectionUpdater::after_remove
/// [`restore`]: SelectionUpdater::restore
#[derive(Debug, Clone)]
pub struct SelectionUpdater {
    snapshot: Option<SelectionSnapshot>,
    anchor: Option<Tracked>,
    focus: Option<Tracked>,
    change_anchor: bool,
    change_focus: bool,
}

impl SelectionUpdater {
    /// Captures the current selection both as a snapshot and as node handles.
    pub fn new(doc: &Document) -> Self {
        let anchor = doc.selection.anchor.map(|b| Tracked::new(doc, b));
        let focus = doc
            .selection
            .focus
            .filter(|_| !doc.selection.is_collapsed())
            .map(|b| Tracked::new(doc, b));
        Self {
            snapshot: store(doc),
            anchor,
            focus,
            change_anchor: false,
            change_focus: false,
        }
    }

    /// Flags the tracked boundaries that `node` is about to take with it.
    pub fn before_remove(&mut self, doc: &Document, node: NodeId) {
        self.change_anchor = self
            .anchor
            .is_some_and(|t| doc.tree.contains(node, t.node));
        self.change_focus = self.focus.is_some_and(|t| doc.tree.contains(node, t.node));
    }

    /// Retargets flagged boundaries to `replacement`, shifting the offset by
    /// the replacement's position in its text run.
    pub fn after_remove(&mut self, doc: &Document, replacement: Option<NodeId>) {
        let retarget = |tracked: &mut Option<Tracked>| {
            *tracked = match (*tracked, replacement) {
                (Some(t), Some(node)) => {
                    let run_offset = t.run_offset + get_overall_text_offset(&doc.tree, node);
                    Some(Tracked {
                        node,
                        offset: run_offset,
                        run_offset,
                        moved: true,
                    })
                }
                _ => None,
            };
        };
        if std::mem::take(&mut self.change_anchor) {
            retarget(&mut self.anchor);
        }
        if std::mem::take(&mut self.change_focus) {
            retarget(&mut self.focus);
        }
    }

    /// Whether a removal retargeted either boundary.
    pub fn moved(&self) -> bool {
        self.anchor.is_some_and(|t| t.moved) || self.focus.is_some_and(|t| t.moved)
    }

    /// Applies the tracked selection.
    ///
    /// Once a boundary was retargeted, the tracked handles win if they are
    /// still attached; otherwise the snapshot taken at creation is restored.
    pub fn restore(self, doc: &mut Document) {
        if self.moved() {
            if let Some(anchor) = self.anchor.and_then(|t| t.resolve(doc)) {
                let focus = self.focus.and_then(|t| t.resolve(doc));
                doc.selection = DomSelection {
                    anchor: Some(anchor),
                    focus,
                };
                return;
            }
        }
        if let Some(snapshot) = &self.snapshot {
            restore(doc, snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::NodePath;

    fn doc(html: &str) -> Document {
        Document::from_html(html).expect("parse")
    }

    #[test]
    fn test_store_caret_in_text() {
        let mut d = doc("<div>a<b>x</b>cd</div>");
        let div = d.tree.element_children(d.root())[0];
        let last_text = d.tree.child_nodes(div)[2];
        d.set_caret(last_text, 1);

        let snapshot = store(&d).expect("snapshot");
        assert_eq!(
            snapshot,
            SelectionSnapshot::collapsed(SelectionPoint::text(NodePath::new(vec![0]), 2))
        );
    }

    #[test]
    fn test_store_element_boundary() {
        let mut d = doc("<div><p>a</p><p>b</p></div>");
        let div = d.tree.element_children(d.root())[0];
        d.set_caret(div, 1);
        let snapshot = store(&d).expect("snapshot");
        assert!(snapshot.anchor.is_element);
        assert_eq!(snapshot.anchor.offset, 1);
    }

    #[test]
    fn test_store_without_selection() {
        let d = doc("<p>a</p>");
        assert!(store(&d).is_none());
    }

    #[test]
    fn test_store_range_keeps_focus() {
        let mut d = doc("<p>abc</p><p>def</p>");
        let ps = d.tree.element_children(d.root());
        let a = d.tree.child_nodes(ps[0])[0];
        let b = d.tree.child_nodes(ps[1])[0];
        d.selection = DomSelection::range(Boundary::new(a, 1), Boundary::new(b, 2));

        let snapshot = store(&d).expect("snapshot");
        let focus = snapshot.focus.expect("focus");
        assert_eq!(focus.path, NodePath::new(vec![1]));
        assert_eq!(focus.offset, 2);
    }

    #[test]
    fn test_restore_after_reparse() {
        let mut d = doc("<div>ab<b>x</b>cd</div>");
        let div = d.tree.element_children(d.root())[0];
        let last_text = d.tree.child_nodes(div)[2];
        d.set_caret(last_text, 1);
        let snapshot = store(&d).expect("snapshot");

        // Rebuild the tree from its serialization: all handles change
        let html = d.body_html();
        d.set_body_html(&html).expect("reparse");
        assert!(restore(&mut d, &snapshot));

        let anchor = d.selection.anchor.expect("anchor");
        assert_eq!(d.tree.text(anchor.node), Some("cd"));
        assert_eq!(anchor.offset, 1);
    }

    #[test]
    fn test_restore_unresolvable_is_noop() {
        let mut d = doc("<p>a</p>");
        let p = d.tree.element_children(d.root())[0];
        d.set_caret(p, 0);
        let before = d.selection;
        let snapshot =
            SelectionSnapshot::collapsed(SelectionPoint::text(NodePath::new(vec![5, 1]), 0));
        assert!(!restore(&mut d, &snapshot));
        assert_eq!(d.selection, before);
    }

    #[test]
    fn test_restore_drops_unresolvable_focus() {
        let mut d = doc("<p>abc</p>");
        let snapshot = SelectionSnapshot {
            anchor: SelectionPoint::text(NodePath::new(vec![0]), 1),
            focus: Some(SelectionPoint::text(NodePath::new(vec![3]), 0)),
        };
        assert!(restore(&mut d, &snapshot));
        assert!(d.selection.is_collapsed());
    }

    #[test]
    fn test_stash_survives_serialization() {
        let mut d = doc("<p>abc</p>");
        let p = d.tree.element_children(d.root())[0];
        let text = d.tree.child_nodes(p)[0];
        d.set_caret(text, 2);
        assert!(stash_in_body(&mut d).expect("stash"));

        let markup = d.tree.outer_html(d.root());
        assert!(markup.contains(SELECTION_ATTRIBUTE));

        let mut reloaded = doc("<p>abc</p>");
        let root = reloaded.root();
        let value = d.tree.attribute(d.root(), SELECTION_ATTRIBUTE).expect("attr");
        reloaded
            .tree
            .set_attribute(root, SELECTION_ATTRIBUTE, value)
            .expect("attr");
        assert!(restore_from_body(&mut reloaded));
        assert_eq!(reloaded.tree.attribute(root, SELECTION_ATTRIBUTE), None);
        assert_eq!(reloaded.selection.anchor.expect("anchor").offset, 2);
    }

    #[test]
    fn test_restore_from_body_without_attribute() {
        let mut d = doc("<p>a</p>");
        assert!(!restore_from_body(&mut d));
    }

    #[test]
    fn test_updater_retargets_removed_anchor() {
        // <p>ab<b>cd</b></p>, caret inside "cd"; the <b> is replaced by its text
        let mut d = doc("<p>ab<b>cd</b></p>");
        let p = d.tree.element_children(d.root())[0];
        let bold = d.tree.element_children(p)[0];
        let inner = d.tree.child_nodes(bold)[0];
        d.set_caret(inner, 1);

        let mut updater = SelectionUpdater::new(&d);
        let replacement = d.tree.create_text("cd");
        d.tree.insert_before(p, replacement, Some(bold)).expect("insert");
        updater.before_remove(&d, bold);
        d.tree.remove(bold).expect("remove");
        updater.after_remove(&d, Some(replacement));
        updater.restore(&mut d);

        let anchor = d.selection.anchor.expect("anchor");
        assert_eq!(anchor.node, replacement);
        assert_eq!(anchor.offset, 1);
    }

    #[test]
    fn test_updater_untouched_selection_uses_snapshot() {
        let mut d = doc("<p>abc</p><p>x</p>");
        let ps = d.tree.element_children(d.root());
        let text = d.tree.child_nodes(ps[0])[0];
        d.set_caret(text, 2);

        let mut updater = SelectionUpdater::new(&d);
        updater.before_remove(&d, ps[1]);
        d.tree.remove(ps[1]).expect("remove");
        updater.after_remove(&d, None);
        updater.restore(&mut d);

        let anchor = d.selection.anchor.expect("anchor");
        assert_eq!(anchor.node, text);
        assert_eq!(anchor.offset, 2);
    }
}
