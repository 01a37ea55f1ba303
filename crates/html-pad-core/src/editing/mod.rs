//! Recording session: turns document mutations into journal records.
//!
//! An `EditingContext` owns the undo journal, the stack of in-flight
//! records and the recording gate. Commands bracket their mutation with
//! [`EditingContext::start_record`] and [`EditingContext::stop_record`];
//! the context snapshots the affected region and selection on both sides
//! and decides whether the result is committed, nested into an open group
//! or discarded. Undo and redo application is in the `apply` submodule.

mod apply;

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use html_pad_config::EditorConfig;

use crate::document::Document;
use crate::dom::NodeId;
use crate::error::{EditorError, Result};
use crate::history::{HistoryConfig, Record, RecordKind, UndoJournal};
use crate::region::{capture_region_html, claim_affected_content, ClaimFlags};
use crate::selection;

pub use apply::{ApplyDepth, MAX_APPLY_DEPTH};

/// Replays an [`ApplyKind::Custom`](crate::history::ApplyKind::Custom)
/// payload. Receives the payload for the requested direction.
pub type ApplyHandler = fn(&mut Document, &str, bool) -> Result<()>;

/// Op type whose stop may legitimately arrive without a matching start.
const UNMATCHED_STOP_TOLERATED: &str = "deleteContentBackward";

/// Owns the journal and the recording state for one document.
pub struct EditingContext {
    journal: UndoJournal,
    /// In-flight records, innermost last.
    stack: Vec<Record>,
    /// Nesting depth of `disable()`; recording happens only at zero.
    disabled: u32,
    handlers: HashMap<String, ApplyHandler>,
}

/// Releases one `disable()` level when dropped.
struct RecordingPaused<'a>(&'a mut EditingContext);

impl Deref for RecordingPaused<'_> {
    type Target = EditingContext;

    fn deref(&self) -> &EditingContext {
        self.0
    }
}

impl DerefMut for RecordingPaused<'_> {
    fn deref_mut(&mut self) -> &mut EditingContext {
        self.0
    }
}

impl Drop for RecordingPaused<'_> {
    fn drop(&mut self) {
        if self.0.enable().is_err() {
            tracing::error!("Recording gate was re-enabled inside a disabled scope");
        }
    }
}

impl std::fmt::Debug for EditingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditingContext")
            .field("journal", &self.journal)
            .field("in_flight", &self.stack.len())
            .field("disabled", &self.disabled)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for EditingContext {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl EditingContext {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            journal: UndoJournal::new(config),
            stack: Vec::new(),
            disabled: 0,
            handlers: HashMap::new(),
        }
    }

    pub fn from_editor_config(config: &EditorConfig) -> Self {
        Self::new(HistoryConfig::from_editor_config(config))
    }

    pub fn journal(&self) -> &UndoJournal {
        &self.journal
    }

    /// Mutable access, e.g. to subscribe state listeners.
    pub fn journal_mut(&mut self) -> &mut UndoJournal {
        &mut self.journal
    }

    pub fn can_undo(&self) -> bool {
        self.journal.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.journal.can_redo()
    }

    // --- gate ---

    /// Whether recording is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.disabled == 0
    }

    /// Whether any record is in flight.
    pub fn is_recording(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Suspends recording. Calls nest.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::DisableOverflow` if nesting overflows.
    pub fn disable(&mut self) -> Result<()> {
        self.disabled = self
            .disabled
            .checked_add(1)
            .ok_or(EditorError::DisableOverflow)?;
        Ok(())
    }

    /// Undoes one `disable()`.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::UnbalancedEnable` if recording is already
    /// enabled.
    pub fn enable(&mut self) -> Result<()> {
        self.disabled = self
            .disabled
            .checked_sub(1)
            .ok_or(EditorError::UnbalancedEnable)?;
        Ok(())
    }

    /// Runs `f` with recording disabled, re-enabling afterwards even when
    /// `f` fails or panics.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate itself overflows.
    pub fn with_recording_disabled<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> Result<T> {
        self.disable()?;
        let mut paused = RecordingPaused(self);
        Ok(f(&mut *paused))
    }

    /// Registers a replay handler for custom records.
    pub fn register_apply_handler(&mut self, name: impl Into<String>, handler: ApplyHandler) {
        let name = name.into();
        tracing::debug!("Registered apply handler '{name}'");
        self.handlers.insert(name, handler);
    }

    // --- recording ---

    /// Opens a record and captures the "before" state.
    ///
    /// Document records snapshot the whole body; event and custom records
    /// claim the region between `start` and `end` (see
    /// [`claim_affected_content`]); groups capture only the selection.
    /// Returns the open record so the caller can attach an apply strategy
    /// or mark it ignored, or `None` while recording is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the region cannot be claimed.
    pub fn start_record(
        &mut self,
        doc: &Document,
        kind: RecordKind,
        op_type: &str,
        start: Option<NodeId>,
        end: Option<NodeId>,
        flags: ClaimFlags,
    ) -> Result<Option<&mut Record>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut record = Record::new(kind, op_type);
        record.selection_before = selection::store(doc);
        match kind {
            RecordKind::Document => record.html_before = Some(doc.body_html()),
            RecordKind::Event | RecordKind::Custom => {
                let affected = claim_affected_content(doc, start, end, flags)?;
                record.region = Some(affected.region);
                record.html_before = affected.html;
            }
            RecordKind::Group => {}
        }

        tracing::trace!(
            "Started {kind} record '{op_type}' (depth {})",
            self.stack.len() + 1
        );
        self.stack.push(record);
        Ok(self.stack.last_mut())
    }

    /// The innermost open record.
    pub fn current_record(&mut self) -> Option<&mut Record> {
        if self.is_enabled() {
            self.stack.last_mut()
        } else {
            None
        }
    }

    /// Closes the innermost record matching `kind` and `op_type`.
    ///
    /// Captures the "after" state, then discards the record if it was marked
    /// ignored, changed nothing, or has nothing to replay. Otherwise it is
    /// nested into an open group, or pushed into the journal (merging with
    /// its predecessor where allowed). Returns whether it was kept.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::StopWithoutStart` if no record matches, except
    /// for a stray `deleteContentBackward` event which is only logged, and
    /// an error if the claimed region no longer fits the tree.
    pub fn stop_record(&mut self, doc: &Document, kind: RecordKind, op_type: &str) -> Result<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let Some(position) = self.stack.iter().rposition(|r| r.matches(kind, op_type)) else {
            if kind == RecordKind::Event && op_type == UNMATCHED_STOP_TOLERATED {
                tracing::warn!("Ignoring stop of unstarted {kind} record '{op_type}'");
                return Ok(false);
            }
            tracing::error!("Stop of unstarted {kind} record '{op_type}'");
            return Err(EditorError::StopWithoutStart {
                kind,
                op_type: op_type.to_string(),
            });
        };
        if position + 1 != self.stack.len() {
            tracing::debug!(
                "Stopping {kind} record '{op_type}' out of order ({} newer still open)",
                self.stack.len() - position - 1
            );
        }
        let mut record = self.stack.remove(position);

        match record.kind {
            RecordKind::Document => record.html_after = Some(doc.body_html()),
            RecordKind::Event | RecordKind::Custom => {
                if let (Some(_), Some(region)) = (&record.html_before, &record.region) {
                    record.html_after = Some(capture_region_html(doc, region)?);
                }
            }
            RecordKind::Group => {}
        }

        if let Some(reason) = discard_reason(&record) {
            tracing::debug!("Discarded {kind} record '{op_type}': {reason}");
            return Ok(false);
        }

        record.selection_after = selection::store(doc);
        if let Some(parent) = self
            .stack
            .last_mut()
            .filter(|r| r.kind == RecordKind::Group)
        {
            parent.records.push(record);
            return Ok(true);
        }

        self.journal.push(record);
        self.journal.maybe_merge_consecutive();
        Ok(true)
    }

    /// Combines the newest `count` records into one group.
    ///
    /// The group takes `op_type`, or the newest record's op type when none
    /// is given. Returns `false` and leaves the journal as it was when fewer
    /// than two records are available.
    pub fn group_top_records(&mut self, count: usize, op_type: Option<&str>) -> bool {
        if count < 2 || !self.is_enabled() {
            return false;
        }

        if self.journal.undo_depth().min(count) < 2 {
            return false;
        }
        let popped = self.journal.take_newest(count);

        let op_type = match op_type {
            Some(op) => op.to_string(),
            None => popped
                .last()
                .map(|r| r.op_type.clone())
                .unwrap_or_default(),
        };
        tracing::debug!("Grouped {} records as '{op_type}'", popped.len());
        self.journal.push(Record::group(op_type, popped));
        true
    }

    /// Drops all history and any in-flight records.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.journal.clear();
    }
}

fn discard_reason(record: &Record) -> Option<&'static str> {
    if record.ignore {
        return Some("marked ignored");
    }
    match record.kind {
        RecordKind::Event | RecordKind::Custom => {
            if record.is_unchanged() {
                Some("content unchanged")
            } else if record.html_before.is_none() && record.apply.is_none() {
                Some("nothing to replay")
            } else {
                None
            }
        }
        RecordKind::Group if record.records.is_empty() => Some("empty group"),
        RecordKind::Group | RecordKind::Document => None,
    }
}
