//! Undo and redo application.
//!
//! Records are replayed with recording disabled while a copy of the
//! document is held back. A failed replay puts the copy back and the
//! journal cursor does not move, so the document and the journal stay in
//! step.

use crate::document::Document;
use crate::error::{EditorError, Result};
use crate::history::{ApplyKind, Record, RecordKind, SelectionSnapshot};
use crate::path::find_element_by_path;
use crate::region::{replay_region, restore_children};
use crate::selection;

use super::EditingContext;

/// Deepest group nesting replayed before giving up.
pub const MAX_APPLY_DEPTH: u32 = 32;

/// Nesting level of the record being applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyDepth(u32);

impl ApplyDepth {
    pub fn root() -> Self {
        Self(0)
    }

    pub fn level(self) -> u32 {
        self.0
    }

    /// One level deeper.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::ApplyDepthExceeded` past [`MAX_APPLY_DEPTH`].
    pub fn enter(self) -> Result<Self> {
        if self.0 >= MAX_APPLY_DEPTH {
            return Err(EditorError::ApplyDepthExceeded(MAX_APPLY_DEPTH));
        }
        Ok(Self(self.0 + 1))
    }
}

impl EditingContext {
    /// Reverts the newest record and restores the selection from before it.
    ///
    /// Returns `Ok(false)` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be replayed; the document and
    /// the journal are left as they were.
    pub fn undo(&mut self, doc: &mut Document) -> Result<bool> {
        let Some(record) = self.journal.peek_undo().cloned() else {
            return Ok(false);
        };
        self.apply_staged(doc, &record, true)?;
        self.journal.undo();
        restore_selection(doc, record.selection_before.as_ref());
        doc.modified = true;
        tracing::debug!("Undid {} record '{}'", record.kind, record.op_type);
        Ok(true)
    }

    /// Re-applies the next undone record and restores the selection from
    /// after it.
    ///
    /// Returns `Ok(false)` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be replayed; the document and
    /// the journal are left as they were.
    pub fn redo(&mut self, doc: &mut Document) -> Result<bool> {
        let Some(record) = self.journal.peek_redo().cloned() else {
            return Ok(false);
        };
        self.apply_staged(doc, &record, false)?;
        self.journal.redo();
        restore_selection(doc, record.selection_after.as_ref());
        doc.modified = true;
        tracing::debug!("Redid {} record '{}'", record.kind, record.op_type);
        Ok(true)
    }

    fn apply_staged(&mut self, doc: &mut Document, record: &Record, is_undo: bool) -> Result<()> {
        let staged = doc.clone();
        let result = self.with_recording_disabled(|ctx| {
            ctx.apply_record(doc, record, is_undo, ApplyDepth::root())
        })?;
        if let Err(e) = result {
            tracing::warn!(
                "Failed to {} '{}': {e}",
                if is_undo { "undo" } else { "redo" },
                record.op_type
            );
            *doc = staged;
            return Err(e);
        }
        Ok(())
    }

    /// Replays one record in the given direction.
    ///
    /// Groups replay their children in reverse order on undo. Event and
    /// custom records use their apply strategy when they have one and fall
    /// back to region snapshots otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not fit the document, names an
    /// unknown handler, or nests deeper than [`MAX_APPLY_DEPTH`].
    pub fn apply_record(
        &self,
        doc: &mut Document,
        record: &Record,
        is_undo: bool,
        depth: ApplyDepth,
    ) -> Result<()> {
        let depth = depth.enter()?;
        let incomplete = |reason| EditorError::IncompleteRecord {
            kind: record.kind,
            op_type: record.op_type.clone(),
            reason,
        };

        match record.kind {
            RecordKind::Group => {
                if is_undo {
                    for nested in record.records.iter().rev() {
                        self.apply_record(doc, nested, true, depth)?;
                    }
                } else {
                    for nested in &record.records {
                        self.apply_record(doc, nested, false, depth)?;
                    }
                }
            }
            RecordKind::Document => {
                let html = pick(record, is_undo).ok_or_else(|| incomplete("missing body snapshot"))?;
                doc.set_body_html(html)?;
            }
            RecordKind::Event | RecordKind::Custom => match &record.apply {
                Some(apply) => self.apply_strategy(doc, apply, is_undo)?,
                None => {
                    let region = record
                        .region
                        .as_ref()
                        .ok_or_else(|| incomplete("missing region"))?;
                    let html =
                        pick(record, is_undo).ok_or_else(|| incomplete("missing region snapshot"))?;
                    replay_region(doc, region, html)?;
                }
            },
        }
        Ok(())
    }

    fn apply_strategy(&self, doc: &mut Document, apply: &ApplyKind, is_undo: bool) -> Result<()> {
        match apply {
            ApplyKind::SetAttribute {
                path,
                name,
                before,
                after,
            } => {
                let element = find_element_by_path(&doc.tree, doc.root(), path)?;
                match if is_undo { before } else { after } {
                    Some(value) => doc.tree.set_attribute(element, name, value)?,
                    None => doc.tree.remove_attribute(element, name)?,
                };
            }
            ApplyKind::ReplaceChildren(backups) => {
                if is_undo {
                    for backup in backups.iter().rev() {
                        restore_children(doc, backup, true)?;
                    }
                } else {
                    for backup in backups {
                        restore_children(doc, backup, false)?;
                    }
                }
            }
            ApplyKind::Custom {
                handler,
                before,
                after,
            } => {
                let apply = self
                    .handlers
                    .get(handler)
                    .ok_or_else(|| EditorError::UnknownApplyHandler(handler.clone()))?;
                apply(doc, if is_undo { before } else { after }, is_undo)?;
            }
        }
        Ok(())
    }
}

fn restore_selection(doc: &mut Document, snapshot: Option<&SelectionSnapshot>) {
    let restored = snapshot.is_some_and(|s| selection::restore(doc, s));
    if !restored {
        doc.drop_stale_selection();
    }
}

fn pick(record: &Record, is_undo: bool) -> Option<&str> {
    if is_undo {
        record.html_before.as_deref()
    } else {
        record.html_after.as_deref()
    }
}
