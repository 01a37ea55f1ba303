/// Errors raised by the editing core.
///
/// Every variant is a broken invariant rather than a user-facing condition:
/// callers propagate them and treat them as bugs.
use thiserror::Error;

use crate::history::{NodePath, RecordKind};

#[derive(Debug, Error)]
pub enum EditorError {
    /// A stored path no longer fits the tree.
    #[error("path {path} does not resolve: index {index} out of range at depth {depth} ({available} element children)")]
    PathResolution {
        path: NodePath,
        depth: usize,
        index: usize,
        available: usize,
    },

    /// `stop_record` found no matching in-flight record.
    #[error("no {kind} record '{op_type}' is being recorded")]
    StopWithoutStart { kind: RecordKind, op_type: String },

    #[error("enable() called while recording is already enabled")]
    UnbalancedEnable,

    #[error("disable() nesting overflowed")]
    DisableOverflow,

    /// A region's child bounds do not fit the element it resolves to.
    #[error("region at {path} expects {expected} element children but found {found}")]
    RegionMismatch {
        path: NodePath,
        expected: usize,
        found: usize,
    },

    #[error("no apply handler registered as '{0}'")]
    UnknownApplyHandler(String),

    #[error("record nesting exceeds {0} levels")]
    ApplyDepthExceeded(u32),

    /// A record is missing the data its kind needs for replay.
    #[error("{kind} record '{op_type}' cannot be replayed: {reason}")]
    IncompleteRecord {
        kind: RecordKind,
        op_type: String,
        reason: &'static str,
    },

    #[error("HTML parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    /// A node id refers to a freed arena slot.
    #[error("node {0} no longer exists")]
    StaleNode(String),

    #[error("invalid tree operation: {0}")]
    InvalidOperation(String),

    #[error("invalid selection: {0}")]
    InvalidSelection(String),
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
