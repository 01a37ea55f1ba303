/// Editing commands that record themselves for undo.
///
/// Each command brackets its mutation with a start/stop record pair on the
/// `EditingContext`. The stop always runs, even when the mutation fails; a
/// failed mutation marks its record ignored so nothing half-done is kept.
use crate::document::{Boundary, Document};
use crate::dom::NodeId;
use crate::editing::EditingContext;
use crate::error::{EditorError, Result};
use crate::history::{ApplyKind, RecordKind};
use crate::path::get_child_path;
use crate::region::ClaimFlags;
use crate::selection::SelectionUpdater;

pub const INSERT_TEXT: &str = "insertText";
pub const DELETE_BACKWARD: &str = "deleteContentBackward";
pub const SET_CONTENT: &str = "setContent";

/// Closes the record opened for a command and surfaces the command's own
/// error first.
fn finish(
    ctx: &mut EditingContext,
    doc: &mut Document,
    kind: RecordKind,
    op_type: &str,
    result: Result<()>,
) -> Result<bool> {
    if result.is_err() {
        if let Some(record) = ctx.current_record() {
            record.ignore = true;
        }
    }
    let committed = ctx.stop_record(doc, kind, op_type);
    result?;
    let committed = committed?;
    if committed {
        doc.modified = true;
    }
    Ok(committed)
}

fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(index, _)| index)
}

fn caret(doc: &Document) -> Result<Boundary> {
    doc.selection
        .anchor
        .filter(|b| doc.tree.is_attached(b.node))
        .ok_or_else(|| EditorError::InvalidSelection("no caret in the document".to_string()))
}

/// Removes a selected run inside a single text node and collapses the
/// selection to its start. Returns whether anything was removed.
fn delete_selected_text(doc: &mut Document) -> Result<bool> {
    let (Some(anchor), Some(focus)) = (doc.selection.anchor, doc.selection.focus) else {
        return Ok(false);
    };
    if anchor == focus {
        return Ok(false);
    }
    if anchor.node != focus.node || !doc.tree.is_text(anchor.node) {
        tracing::debug!("Selection spans nodes; collapsing to the anchor");
        doc.selection.focus = None;
        return Ok(false);
    }

    let (from, to) = (anchor.offset.min(focus.offset), anchor.offset.max(focus.offset));
    let text = doc.tree.text(anchor.node).unwrap_or_default();
    let mut updated = String::with_capacity(text.len());
    updated.push_str(&text[..byte_index(text, from)]);
    updated.push_str(&text[byte_index(text, to)..]);
    doc.tree.set_text(anchor.node, &updated)?;
    doc.set_caret(anchor.node, from);
    Ok(true)
}

/// Resolves the caret to a text node and char offset, creating an empty
/// text node when the caret sits between elements.
fn text_caret(doc: &mut Document) -> Result<(NodeId, usize)> {
    let boundary = caret(doc)?;
    if doc.tree.is_text(boundary.node) {
        let len = doc.tree.text_len(boundary.node);
        return Ok((boundary.node, boundary.offset.min(len)));
    }

    let children = doc.tree.child_nodes(boundary.node);
    let index = boundary.offset.min(children.len());
    let previous = index.checked_sub(1).map(|i| children[i]);
    let reference = children.get(index).copied();
    if let Some(previous) = previous.filter(|&n| doc.tree.is_text(n)) {
        return Ok((previous, doc.tree.text_len(previous)));
    }
    let text = doc.tree.create_text("");
    doc.tree.insert_before(boundary.node, text, reference)?;
    Ok((text, 0))
}

/// Types `text` at the caret, replacing a selected run first.
///
/// Recorded as an `insertText` event so consecutive keystrokes merge into
/// one undo step. Returns whether a record was committed.
///
/// # Errors
///
/// Returns `EditorError::InvalidSelection` without a caret, or any error
/// raised while recording.
pub fn insert_text(ctx: &mut EditingContext, doc: &mut Document, text: &str) -> Result<bool> {
    if text.is_empty() {
        return Ok(false);
    }
    caret(doc)?;
    ctx.start_record(doc, RecordKind::Event, INSERT_TEXT, None, None, ClaimFlags::SAVE_HTML)?;
    let result = (|| {
        delete_selected_text(doc)?;
        let (node, offset) = text_caret(doc)?;
        let current = doc.tree.text(node).unwrap_or_default();
        let at = byte_index(current, offset);
        let updated = format!("{}{text}{}", &current[..at], &current[at..]);
        doc.tree.set_text(node, &updated)?;
        doc.set_caret(node, offset + text.chars().count());
        Ok(())
    })();
    finish(ctx, doc, RecordKind::Event, INSERT_TEXT, result)
}

/// Deletes the selected run, or the character before the caret.
///
/// At the start of a text node the last character of a preceding text
/// sibling is removed instead. Nothing happens (and nothing is recorded)
/// when there is no character to delete.
///
/// # Errors
///
/// Returns `EditorError::InvalidSelection` without a caret, or any error
/// raised while recording.
pub fn delete_backward(ctx: &mut EditingContext, doc: &mut Document) -> Result<bool> {
    caret(doc)?;
    ctx.start_record(doc, RecordKind::Event, DELETE_BACKWARD, None, None, ClaimFlags::SAVE_HTML)?;
    let result = (|| {
        if delete_selected_text(doc)? {
            return Ok(());
        }
        let boundary = caret(doc)?;
        let target = if doc.tree.is_text(boundary.node) && boundary.offset > 0 {
            Some((boundary.node, boundary.offset.min(doc.tree.text_len(boundary.node))))
                .filter(|&(_, offset)| offset > 0)
        } else {
            let previous = if doc.tree.is_text(boundary.node) {
                doc.tree.previous_sibling(boundary.node)
            } else {
                boundary
                    .offset
                    .checked_sub(1)
                    .and_then(|i| doc.tree.child_nodes(boundary.node).get(i).copied())
            };
            previous
                .filter(|&n| doc.tree.text_len(n) > 0)
                .map(|n| (n, doc.tree.text_len(n)))
        };
        let Some((node, offset)) = target else {
            return Ok(());
        };
        let current = doc.tree.text(node).unwrap_or_default();
        let updated = format!(
            "{}{}",
            &current[..byte_index(current, offset - 1)],
            &current[byte_index(current, offset)..]
        );
        doc.tree.set_text(node, &updated)?;
        doc.set_caret(node, offset - 1);
        Ok(())
    })();
    finish(ctx, doc, RecordKind::Event, DELETE_BACKWARD, result)
}

/// Sets (or with `None`, removes) an attribute as one undo step named
/// `"{op_prefix}::{name}"`.
///
/// Returns whether a record was committed. The element is left untouched
/// when the attribute already has the requested value.
///
/// # Errors
///
/// Returns an error if `element` is not an attached element.
pub fn set_attribute(
    ctx: &mut EditingContext,
    doc: &mut Document,
    op_prefix: &str,
    element: NodeId,
    name: &str,
    value: Option<&str>,
) -> Result<bool> {
    if !doc.tree.is_element(element) {
        return Err(EditorError::StaleNode(element.to_string()));
    }
    let name = name.to_ascii_lowercase();
    let before = doc.tree.attribute(element, &name).map(str::to_string);
    let after = value.map(str::to_string);
    if before == after {
        return Ok(false);
    }
    let path = get_child_path(&doc.tree, doc.root(), element)
        .ok_or_else(|| EditorError::StaleNode(element.to_string()))?;

    let op_type = format!("{op_prefix}::{name}");
    if let Some(record) = ctx.start_record(
        doc,
        RecordKind::Custom,
        &op_type,
        Some(element),
        Some(element),
        ClaimFlags::NONE,
    )? {
        record.apply = Some(ApplyKind::SetAttribute {
            path,
            name: name.clone(),
            before,
            after,
        });
    }

    let result = match value {
        Some(value) => doc.tree.set_attribute(element, &name, value).map(drop),
        None => doc.tree.remove_attribute(element, &name).map(drop),
    };
    finish(ctx, doc, RecordKind::Custom, &op_type, result)
}

/// Inserts a new `tag` element into `parent` before `before` (or at the
/// end), moves `content` into it and records the change as one step.
///
/// Returns the new element.
///
/// # Errors
///
/// Returns an error if any node is stale or the insertion is invalid; the
/// partial change is not recorded.
#[allow(clippy::too_many_arguments)]
pub fn add_element(
    ctx: &mut EditingContext,
    doc: &mut Document,
    op_type: &str,
    tag: &str,
    attributes: &[(&str, &str)],
    parent: NodeId,
    before: Option<NodeId>,
    content: &[NodeId],
) -> Result<NodeId> {
    ctx.start_record(
        doc,
        RecordKind::Custom,
        op_type,
        Some(parent),
        Some(parent),
        ClaimFlags::SAVE_HTML,
    )?;
    let element = doc.tree.create_element(tag);
    // Moved content keeps its node ids, so the live selection stays valid
    let result = (|| {
        for (name, value) in attributes {
            doc.tree.set_attribute(element, name, value)?;
        }
        doc.tree.insert_before(parent, element, before)?;
        for &node in content {
            doc.tree.append_child(element, node)?;
        }
        Ok(())
    })();
    finish(ctx, doc, RecordKind::Custom, op_type, result)?;
    Ok(element)
}

/// Replaces `element` with its children and records the change as one
/// step. A caret on the removed element follows its first child.
///
/// # Errors
///
/// Returns an error if `element` is stale, detached or the root.
pub fn remove_element(
    ctx: &mut EditingContext,
    doc: &mut Document,
    op_type: &str,
    element: NodeId,
) -> Result<bool> {
    let parent = doc
        .tree
        .parent(element)
        .filter(|_| doc.tree.is_attached(element))
        .ok_or_else(|| EditorError::StaleNode(element.to_string()))?;

    ctx.start_record(
        doc,
        RecordKind::Custom,
        op_type,
        Some(parent),
        Some(parent),
        ClaimFlags::SAVE_HTML,
    )?;
    let result = (|| {
        let mut updater = SelectionUpdater::new(doc);
        let first_child = doc.tree.child_nodes(element).first().copied();
        for child in doc.tree.child_nodes(element).to_vec() {
            doc.tree.insert_before(parent, child, Some(element))?;
        }
        // Only a boundary on the emptied element itself goes away
        updater.before_remove(doc, element);
        doc.tree.remove(element)?;
        updater.after_remove(doc, first_child);
        if updater.moved() {
            updater.restore(doc);
        }
        Ok(())
    })();
    finish(ctx, doc, RecordKind::Custom, op_type, result)
}

/// Replaces the whole body as one undoable step and puts the caret at the
/// start.
///
/// # Errors
///
/// Returns an error if `html` does not parse; the body is left untouched.
pub fn set_content(ctx: &mut EditingContext, doc: &mut Document, html: &str) -> Result<bool> {
    ctx.start_record(doc, RecordKind::Document, SET_CONTENT, None, None, ClaimFlags::NONE)?;
    let result = doc.set_body_html(html).map(|()| doc.caret_to_start());
    finish(ctx, doc, RecordKind::Document, SET_CONTENT, result)
}

/// Loads new content without recording it and drops all history.
///
/// # Errors
///
/// Returns an error if `html` does not parse; the body and the history are
/// left untouched.
pub fn load_html(ctx: &mut EditingContext, doc: &mut Document, html: &str) -> Result<()> {
    doc.set_body_html(html)?;
    doc.caret_to_start();
    doc.modified = false;
    ctx.clear();
    tracing::debug!("Loaded new content, history cleared");
    Ok(())
}
