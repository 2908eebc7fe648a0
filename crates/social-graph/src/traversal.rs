//! Breadth-first traversal over any [`GraphStore`].
//!
//! Visited tracking is a dense bitset sized to the id space. The BFS queue is
//! a plain vector that is never popped, so each entry can point at its parent
//! by position and the path falls out of the queue without a separate map.

use bitvec::prelude::*;
use social_types::{GraphStore, QueryError, UserId};
use tokio_util::sync::CancellationToken;

/// Limits applied to a single traversal.
#[derive(Debug, Clone, Default)]
pub struct TraversalOptions {
    /// Give up (as not reachable) beyond this many hops.
    pub max_hops: Option<usize>,
    /// Checked between node expansions.
    pub cancel: Option<CancellationToken>,
}

impl TraversalOptions {
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = Some(max_hops);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn check_cancelled(&self) -> Result<(), QueryError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(QueryError::Cancelled),
            _ => Ok(()),
        }
    }

    fn allows(&self, depth: usize) -> bool {
        self.max_hops.map_or(true, |max| depth < max)
    }
}

#[derive(Clone, Copy)]
struct Visit {
    node: UserId,
    parent: usize,
    depth: u32,
}

/// Minimum-hop directed path `from -> ... -> to`, following outgoing edges.
///
/// Among equally short paths the one discovered first wins, i.e. the one
/// that follows earlier-inserted neighbors.
pub fn shortest_path<G: GraphStore + ?Sized>(
    graph: &G,
    from: UserId,
    to: UserId,
    opts: &TraversalOptions,
) -> Result<Vec<UserId>, QueryError> {
    if !graph.contains(from) {
        return Err(QueryError::NotFound(from));
    }
    if !graph.contains(to) {
        return Err(QueryError::NotFound(to));
    }
    if from == to {
        return Ok(vec![from]);
    }

    let n = graph.node_count();
    let mut visited = bitvec![0; n];
    visited.set(from as usize, true);
    let mut queue = vec![Visit {
        node: from,
        parent: usize::MAX,
        depth: 0,
    }];
    let mut head = 0;

    while head < queue.len() {
        opts.check_cancelled()?;
        let Visit { node, depth, .. } = queue[head];
        if !opts.allows(depth as usize) {
            // Depths never decrease along the queue.
            break;
        }
        for &next in graph.neighbors(node) {
            let slot = next as usize;
            if slot >= n || visited[slot] {
                continue;
            }
            visited.set(slot, true);
            queue.push(Visit {
                node: next,
                parent: head,
                depth: depth + 1,
            });
            if next == to {
                return Ok(unwind(&queue, queue.len() - 1));
            }
        }
        head += 1;
    }

    tracing::debug!(from, to, explored = queue.len(), "no path");
    Err(QueryError::NotReachable { from, to })
}

fn unwind(queue: &[Visit], mut at: usize) -> Vec<UserId> {
    let mut path = Vec::with_capacity(queue[at].depth as usize + 1);
    loop {
        let visit = queue[at];
        path.push(visit.node);
        if visit.parent == usize::MAX {
            break;
        }
        at = visit.parent;
    }
    path.reverse();
    path
}

/// Every node reachable from `start` with its hop distance, in BFS order.
pub fn reachable<G: GraphStore + ?Sized>(
    graph: &G,
    start: UserId,
    opts: &TraversalOptions,
) -> Result<Vec<(UserId, usize)>, QueryError> {
    if !graph.contains(start) {
        return Err(QueryError::NotFound(start));
    }
    let n = graph.node_count();
    let mut visited = bitvec![0; n];
    visited.set(start as usize, true);
    let mut order = vec![(start, 0usize)];
    let mut head = 0;
    while head < order.len() {
        opts.check_cancelled()?;
        let (node, depth) = order[head];
        head += 1;
        if !opts.allows(depth) {
            break;
        }
        for &next in graph.neighbors(node) {
            let slot = next as usize;
            if slot < n && !visited[slot] {
                visited.set(slot, true);
                order.push((next, depth + 1));
            }
        }
    }
    Ok(order)
}
