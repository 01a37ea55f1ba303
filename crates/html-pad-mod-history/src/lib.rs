/// Undo/redo journal for a mutable document tree.
///
/// Provides an `UndoJournal` that keeps a bounded, circular history of
/// `Record`s. Records address the tree through structural `NodePath`s and
/// `Region`s instead of live node handles, so this crate has no dependency
/// on the tree itself; the editing core resolves and replays them.
pub mod config;
pub mod manager;
pub mod record;
pub mod region;
pub mod snapshot;

pub use config::HistoryConfig;
pub use manager::{HistoryState, StateListener, UndoJournal};
pub use record::{ApplyKind, ChildrenBackup, Record, RecordKind};
pub use region::{NodePath, Region};
pub use snapshot::{SelectionPoint, SelectionSnapshot};
