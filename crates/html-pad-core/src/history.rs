// Re-exports from html-pad-mod-history.
// The journal types address the tree only through paths; the editing module
// resolves them against a `Document`.
pub use html_pad_mod_history::{
    ApplyKind, ChildrenBackup, HistoryConfig, HistoryState, NodePath, Record, RecordKind, Region,
    SelectionPoint, SelectionSnapshot, StateListener, UndoJournal,
};
