/// Journal records: one undoable step each.
use serde::{Deserialize, Serialize};

use crate::region::{NodePath, Region};
use crate::snapshot::SelectionSnapshot;

/// What a record captured and how it is replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// A host input event; replayed from region snapshots.
    Event,
    /// A whole-document replacement; replayed from full body snapshots.
    Document,
    /// A container of nested records applied as one unit.
    Group,
    /// A command-specific change; replayed through its `ApplyKind` or,
    /// when it has none, from region snapshots.
    Custom,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event => write!(f, "event"),
            Self::Document => write!(f, "document"),
            Self::Group => write!(f, "group"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// A nested sub-region backup inside a custom record.
///
/// Used by commands that restructure only part of their claimed region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildrenBackup {
    pub region: Region,
    pub html_before: String,
    /// Filled in once the command finished restructuring.
    pub html_after: Option<String>,
}

/// Replay strategy attached to a custom record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyKind {
    /// Sets (or, with `None`, removes) one attribute on the element at `path`.
    SetAttribute {
        path: NodePath,
        name: String,
        before: Option<String>,
        after: Option<String>,
    },
    /// Replays a list of children backups; reverse order on undo.
    ReplaceChildren(Vec<ChildrenBackup>),
    /// Dispatches to an apply handler registered under `handler`.
    Custom {
        handler: String,
        before: String,
        after: String,
    },
}

/// One undoable step.
///
/// Created when an edit starts recording, filled in while the edit runs,
/// and frozen once it is pushed into the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub kind: RecordKind,
    pub op_type: String,
    pub region: Option<Region>,
    pub html_before: Option<String>,
    pub html_after: Option<String>,
    pub apply: Option<ApplyKind>,
    pub selection_before: Option<SelectionSnapshot>,
    pub selection_after: Option<SelectionSnapshot>,
    /// Set by a command that observed no effective change.
    pub ignore: bool,
    /// Nested records of a group, in chronological order.
    pub records: Vec<Record>,
}

impl Record {
    pub fn new(kind: RecordKind, op_type: impl Into<String>) -> Self {
        Self {
            kind,
            op_type: op_type.into(),
            region: None,
            html_before: None,
            html_after: None,
            apply: None,
            selection_before: None,
            selection_after: None,
            ignore: false,
            records: Vec::new(),
        }
    }

    /// Builds a group from records in chronological order.
    ///
    /// The group's selections span from the first record's "before" to the
    /// last record's "after".
    pub fn group(op_type: impl Into<String>, records: Vec<Record>) -> Self {
        let mut group = Self::new(RecordKind::Group, op_type);
        group.selection_before = records.first().and_then(|r| r.selection_before.clone());
        group.selection_after = records.last().and_then(|r| r.selection_after.clone());
        group.records = records;
        group
    }

    pub fn matches(&self, kind: RecordKind, op_type: &str) -> bool {
        self.kind == kind && self.op_type == op_type
    }

    /// Whether both stored selections are carets (or absent).
    pub fn has_collapsed_selections(&self) -> bool {
        self.selection_before
            .as_ref()
            .map_or(true, SelectionSnapshot::is_collapsed)
            && self
                .selection_after
                .as_ref()
                .map_or(true, SelectionSnapshot::is_collapsed)
    }

    /// Whether the region snapshots show no observable change.
    pub fn is_unchanged(&self) -> bool {
        self.html_before.is_some() && self.html_before == self.html_after
    }
}
