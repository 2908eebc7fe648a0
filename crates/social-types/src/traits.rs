//! Store traits and the error taxonomy shared by every layer.

use crate::{Attribute, RowError, UserId, ValueKind};

/// Read-only directed adjacency over dense user ids.
///
/// Implementations are frozen after build, so `&self` access from many threads
/// is the only access pattern.
pub trait GraphStore: Send + Sync {
    /// Number of user ids (`0..node_count()` are valid).
    fn node_count(&self) -> usize;

    /// Number of stored directed edges.
    fn edge_count(&self) -> usize;

    /// Outgoing neighbors in insertion order. Empty for unknown ids.
    fn neighbors(&self, id: UserId) -> &[UserId];

    fn contains(&self, id: UserId) -> bool {
        (id as usize) < self.node_count()
    }

    fn out_degree(&self, id: UserId) -> usize {
        self.neighbors(id).len()
    }
}

/// Query-phase failures. All recoverable; callers decide presentation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error("no directed path from {from} to {to}")]
    NotReachable { from: UserId, to: UserId },
    #[error("attribute not indexed: {0}")]
    InvalidAttribute(String),
    #[error("attribute {attribute} expects {expected} values")]
    TypeMismatch {
        attribute: Attribute,
        expected: ValueKind,
    },
    #[error("query cancelled")]
    Cancelled,
    #[error("store is still loading")]
    NotReady,
}

/// Build-phase failures. Any of these aborts the build.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("malformed row {row}: {reason}")]
    MalformedRow { row: u64, reason: RowError },
    #[error("duplicate user id {0}")]
    DuplicateUser(UserId),
    #[error("user ids are not dense: {0} is missing")]
    MissingUser(UserId),
    #[error("edge {from} -> {to} references an unknown user")]
    DanglingEdge { from: UserId, to: UserId },
    #[error("root {0} is not a known user")]
    InvalidRoot(UserId),
    #[error("dataset has no users")]
    EmptyDataset,
}
