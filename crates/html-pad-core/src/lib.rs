/// Editing core for rich-text HTML documents.
///
/// Holds the document tree and its selection, the commands that mutate it,
/// and the recording session that turns each mutation into an undoable
/// record in an `UndoJournal`.
pub mod commands;
pub mod document;
pub mod dom;
pub mod editing;
pub mod encoding;
pub mod error;
pub mod history;
pub mod path;
pub mod region;
pub mod selection;

pub use document::{Boundary, Document, DomSelection};
pub use dom::{NodeId, NodeKind, Tree};
pub use editing::{ApplyDepth, ApplyHandler, EditingContext, MAX_APPLY_DEPTH};
pub use encoding::TextEncoding;
pub use error::{EditorError, Result};
pub use region::{AffectedContent, ClaimFlags, Traversal};
pub use selection::SelectionUpdater;
