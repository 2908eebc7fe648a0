//! Friendship graph store and traversal.
//!
//! [`GraphBuilder`] collects edges during load and freezes them into an
//! [`AdjacencyGraph`]; [`shortest_path`] and [`reachable`] work against any
//! [`GraphStore`].

mod adjacency;
mod traversal;

pub use adjacency::{
    AdjacencyGraph, DanglingEdges, DuplicateEdges, EdgePolicy, EdgeStats, GraphBuilder, SelfLoops,
};
pub use social_types::{GraphStore, QueryError, UserId};
pub use tokio_util::sync::CancellationToken;
pub use traversal::{reachable, shortest_path, TraversalOptions};
