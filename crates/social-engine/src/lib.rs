//! socialdb engine: build a frozen snapshot once, then query it from any thread.
//!
//! [`SnapshotBuilder`] is the Loading phase; [`SnapshotBuilder::finish`] yields
//! the immutable [`Snapshot`] that [`QueryEngine`] shares behind an `Arc`.

mod analytics;
mod builder;
mod engine;
mod records;

pub use builder::{BuildConfig, RootSelector, Snapshot, SnapshotBuilder};
pub use engine::QueryEngine;
pub use records::RecordStore;
pub use social_graph::{
    CancellationToken, DanglingEdges, DuplicateEdges, EdgePolicy, SelfLoops, TraversalOptions,
};
pub use social_types::{BuildError, QueryError};
