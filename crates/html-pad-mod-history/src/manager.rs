/// Bounded circular undo/redo journal.
///
/// Records live in a fixed-size ring with three cursors. The slot at
/// `bottom` is a sentinel that never holds a record, so the usable depth is
/// one less than the capacity. Pushing after an undo drops the abandoned
/// redo branch; overflowing the ring evicts the oldest record.
use crate::config::HistoryConfig;
use crate::record::{Record, RecordKind};

/// Undo/redo availability, as shown by menu items and toolbar buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_op_type: Option<String>,
    pub redo_op_type: Option<String>,
}

/// Callback invoked whenever the `HistoryState` changes.
pub type StateListener = Box<dyn FnMut(&HistoryState)>;

/// The undo history of one document.
pub struct UndoJournal {
    slots: Vec<Option<Record>>,
    /// Sentinel slot; nothing to undo when `current` reaches it.
    bottom: usize,
    /// Newest record; nothing to redo when `current` reaches it.
    top: usize,
    /// Record that the next undo returns.
    current: usize,
    config: HistoryConfig,
    last_state: HistoryState,
    listeners: Vec<StateListener>,
}

impl std::fmt::Debug for UndoJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoJournal")
            .field("capacity", &self.slots.len())
            .field("bottom", &self.bottom)
            .field("top", &self.top)
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for UndoJournal {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl UndoJournal {
    /// Creates an empty journal.
    pub fn new(config: HistoryConfig) -> Self {
        let capacity = config
            .capacity
            .max(html_pad_config::config::MIN_HISTORY_CAPACITY);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            bottom: 0,
            top: 0,
            current: 0,
            config,
            last_state: HistoryState::default(),
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Number of slots, including the sentinel.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn next(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }

    fn prev(&self, index: usize) -> usize {
        (index + self.slots.len() - 1) % self.slots.len()
    }

    fn distance(&self, from: usize, to: usize) -> usize {
        (to + self.slots.len() - from) % self.slots.len()
    }

    /// Number of records currently undoable.
    pub fn undo_depth(&self) -> usize {
        self.distance(self.bottom, self.current)
    }

    /// Number of records currently redoable.
    pub fn redo_depth(&self) -> usize {
        self.distance(self.current, self.top)
    }

    /// Total records held (undoable plus redoable).
    pub fn len(&self) -> usize {
        self.distance(self.bottom, self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn can_undo(&self) -> bool {
        self.current != self.bottom
    }

    pub fn can_redo(&self) -> bool {
        self.current != self.top
    }

    /// Registers a listener for availability changes.
    pub fn subscribe(&mut self, listener: StateListener) {
        self.listeners.push(listener);
    }

    /// Current undo/redo availability.
    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_op_type: self.peek_undo().map(|r| r.op_type.clone()),
            redo_op_type: self.peek_redo().map(|r| r.op_type.clone()),
        }
    }

    fn notify_if_changed(&mut self) {
        let state = self.state();
        if state == self.last_state {
            return;
        }
        tracing::debug!(
            "History state changed: undo={} ({:?}) redo={} ({:?})",
            state.can_undo,
            state.undo_op_type,
            state.can_redo,
            state.redo_op_type
        );
        for listener in &mut self.listeners {
            listener(&state);
        }
        self.last_state = state;
    }

    /// Stores a committed record as the newest step.
    ///
    /// Discards any redo branch and evicts the oldest record when full.
    pub fn push(&mut self, record: Record) {
        if self.current != self.top {
            let mut index = self.next(self.current);
            let stop = self.next(self.top);
            let mut dropped = 0;
            while index != stop {
                self.slots[index] = None;
                dropped += 1;
                index = self.next(index);
            }
            self.top = self.current;
            tracing::debug!("Discarded {dropped} redo record(s)");
        }

        let next = self.next(self.current);
        if next == self.bottom {
            self.bottom = self.next(self.bottom);
            if let Some(evicted) = self.slots[self.bottom].take() {
                tracing::debug!("History full, evicted oldest '{}'", evicted.op_type);
            }
        }

        tracing::debug!("Pushed {} record '{}'", record.kind, record.op_type);
        self.slots[next] = Some(record);
        self.current = next;
        self.top = next;
        self.notify_if_changed();
    }

    /// Record the next `undo()` would return.
    pub fn peek_undo(&self) -> Option<&Record> {
        if self.can_undo() {
            self.slots[self.current].as_ref()
        } else {
            None
        }
    }

    /// Record the next `redo()` would return.
    pub fn peek_redo(&self) -> Option<&Record> {
        if self.can_redo() {
            self.slots[self.next(self.current)].as_ref()
        } else {
            None
        }
    }

    /// Steps back one record and returns it for reverting.
    ///
    /// Returns `None` if there's nothing to undo.
    pub fn undo(&mut self) -> Option<Record> {
        if !self.can_undo() {
            return None;
        }
        let record = self.slots[self.current].clone();
        self.current = self.prev(self.current);
        self.notify_if_changed();
        record
    }

    /// Steps forward one record and returns it for re-applying.
    ///
    /// Returns `None` if there's nothing to redo.
    pub fn redo(&mut self) -> Option<Record> {
        if !self.can_redo() {
            return None;
        }
        self.current = self.next(self.current);
        let record = self.slots[self.current].clone();
        self.notify_if_changed();
        record
    }

    /// Steps back over the newest `count` records and returns them oldest
    /// first, without notifying listeners.
    ///
    /// The records stay in the redo branch until the next `push()`, which
    /// is expected to follow and reports the settled state.
    pub fn take_newest(&mut self, count: usize) -> Vec<Record> {
        let mut taken = Vec::with_capacity(count.min(self.undo_depth()));
        while taken.len() < count && self.can_undo() {
            if let Some(record) = self.slots[self.current].clone() {
                taken.push(record);
            }
            self.current = self.prev(self.current);
        }
        taken.reverse();
        taken
    }

    /// Drops all history, e.g. when a new document is loaded.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.bottom = 0;
        self.top = 0;
        self.current = 0;
        self.notify_if_changed();
    }

    /// Collapses the newest record into its predecessor when both are
    /// contiguous typed insertions.
    ///
    /// Returns true if a merge happened.
    pub fn maybe_merge_consecutive(&mut self) -> bool {
        if self.current != self.top || !self.can_undo() {
            return false;
        }
        let prev = self.prev(self.current);
        if prev == self.bottom {
            return false;
        }

        let mergeable = match (&self.slots[prev], &self.slots[self.current]) {
            (Some(earlier), Some(later)) => self.can_merge(earlier, later),
            _ => false,
        };
        if !mergeable {
            return false;
        }

        let Some(later) = self.slots[self.current].take() else {
            return false;
        };
        if let Some(earlier) = self.slots[prev].as_mut() {
            earlier.html_after = later.html_after;
            earlier.selection_after = later.selection_after;
            tracing::debug!("Merged consecutive '{}' records", earlier.op_type);
        }
        self.current = prev;
        self.top = prev;
        self.notify_if_changed();
        true
    }

    fn can_merge(&self, earlier: &Record, later: &Record) -> bool {
        if earlier.kind != RecordKind::Event
            || later.kind != RecordKind::Event
            || earlier.op_type != later.op_type
            || !self.config.is_mergeable(&later.op_type)
            || earlier.apply.is_some()
            || later.apply.is_some()
        {
            return false;
        }
        if earlier.region.is_none() || earlier.region != later.region {
            return false;
        }
        if !earlier.has_collapsed_selections() || !later.has_collapsed_selections() {
            return false;
        }
        match (&earlier.selection_after, &later.selection_before) {
            (Some(after), Some(before)) => {
                after.anchor.path == before.anchor.path
                    && after.anchor.offset == before.anchor.offset
            }
            _ => false,
        }
    }
}
