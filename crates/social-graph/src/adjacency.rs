//! Compressed-sparse-row adjacency over dense user ids.

use social_types::{BuildError, GraphStore, UserId};
use std::str::FromStr;

/// What to do with repeated `(from, to)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateEdges {
    /// Keep the first occurrence only.
    #[default]
    Collapse,
    Keep,
}

/// What to do with `from == to` edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfLoops {
    #[default]
    Drop,
    Keep,
}

/// What to do with edges whose endpoint is not a known user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DanglingEdges {
    /// Fail the build.
    #[default]
    Reject,
    /// Drop the edge and count it.
    Skip,
}

/// Edge clean-up policy applied once, at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgePolicy {
    pub duplicate_edges: DuplicateEdges,
    pub self_loops: SelfLoops,
    pub dangling_edges: DanglingEdges,
}

macro_rules! policy_from_str {
    ($ty:ty, $($text:literal => $variant:expr),+ $(,)?) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    other => Err(format!("unknown {} policy: {}", stringify!($ty), other)),
                }
            }
        }
    };
}

policy_from_str!(DuplicateEdges, "collapse" => DuplicateEdges::Collapse, "keep" => DuplicateEdges::Keep);
policy_from_str!(SelfLoops, "drop" => SelfLoops::Drop, "keep" => SelfLoops::Keep);
policy_from_str!(DanglingEdges, "reject" => DanglingEdges::Reject, "skip" => DanglingEdges::Skip);

/// Counters for edges the policy removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeStats {
    pub self_loops: u64,
    pub duplicates: u64,
    pub dangling: u64,
}

impl EdgeStats {
    pub fn removed(&self) -> u64 {
        self.self_loops + self.duplicates + self.dangling
    }
}

/// Collects edges during the build phase.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    edges: Vec<(UserId, UserId)>,
    policy: EdgePolicy,
}

impl GraphBuilder {
    pub fn new(policy: EdgePolicy) -> Self {
        Self {
            edges: Vec::new(),
            policy,
        }
    }

    pub fn add_edge(&mut self, from: UserId, to: UserId) {
        self.edges.push((from, to));
    }

    pub fn extend<I: IntoIterator<Item = (UserId, UserId)>>(&mut self, edges: I) {
        self.edges.extend(edges);
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Freeze into CSR form for `node_count` users.
    ///
    /// Neighbor lists keep ingestion order. Runs in O(N + E).
    pub fn build(self, node_count: usize) -> Result<(AdjacencyGraph, EdgeStats), BuildError> {
        let GraphBuilder { mut edges, policy } = self;
        let mut stats = EdgeStats::default();
        let known = |id: UserId| (id as usize) < node_count;

        if policy.dangling_edges == DanglingEdges::Reject {
            if let Some(&(from, to)) = edges.iter().find(|(f, t)| !known(*f) || !known(*t)) {
                return Err(BuildError::DanglingEdge { from, to });
            }
        }
        let drop_loops = policy.self_loops == SelfLoops::Drop;
        edges.retain(|&(from, to)| {
            if !known(from) || !known(to) {
                stats.dangling += 1;
                false
            } else if drop_loops && from == to {
                stats.self_loops += 1;
                false
            } else {
                true
            }
        });

        let mut offsets = vec![0usize; node_count + 1];
        for &(from, _) in &edges {
            offsets[from as usize + 1] += 1;
        }
        for i in 0..node_count {
            offsets[i + 1] += offsets[i];
        }
        let mut cursor = offsets.clone();
        let mut targets: Vec<UserId> = vec![0; edges.len()];
        for &(from, to) in &edges {
            let slot = &mut cursor[from as usize];
            targets[*slot] = to;
            *slot += 1;
        }
        drop(edges);

        if policy.duplicate_edges == DuplicateEdges::Collapse {
            stats.duplicates = collapse_duplicates(&mut offsets, &mut targets, node_count);
        }

        let mut in_degree = vec![0u32; node_count];
        for &to in &targets {
            in_degree[to as usize] += 1;
        }

        if stats.removed() > 0 {
            tracing::info!(
                self_loops = stats.self_loops,
                duplicates = stats.duplicates,
                dangling = stats.dangling,
                "edges removed by policy"
            );
        }
        Ok((
            AdjacencyGraph {
                offsets,
                targets,
                in_degree,
            },
            stats,
        ))
    }
}

/// Compact each neighbor list in place, keeping first occurrences.
/// Uses one stamp per node, so the whole pass is O(N + E).
fn collapse_duplicates(offsets: &mut [usize], targets: &mut Vec<UserId>, node_count: usize) -> u64 {
    const UNSEEN: UserId = UserId::MAX;
    let mut stamp = vec![UNSEEN; node_count];
    let mut write = 0usize;
    let mut start = offsets[0];
    for node in 0..node_count {
        let end = offsets[node + 1];
        offsets[node] = write;
        for read in start..end {
            let to = targets[read];
            if stamp[to as usize] != node as UserId {
                stamp[to as usize] = node as UserId;
                targets[write] = to;
                write += 1;
            }
        }
        start = end;
    }
    let removed = targets.len() - write;
    offsets[node_count] = write;
    targets.truncate(write);
    removed as u64
}

/// Frozen directed graph: `targets[offsets[u]..offsets[u + 1]]` are `u`'s neighbors.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    offsets: Vec<usize>,
    targets: Vec<UserId>,
    in_degree: Vec<u32>,
}

impl AdjacencyGraph {
    /// Convenience constructor for small graphs, using the default policy.
    pub fn from_edges(
        node_count: usize,
        edges: impl IntoIterator<Item = (UserId, UserId)>,
    ) -> Result<Self, BuildError> {
        let mut builder = GraphBuilder::new(EdgePolicy::default());
        builder.extend(edges);
        Ok(builder.build(node_count)?.0)
    }

    pub fn in_degree(&self, id: UserId) -> usize {
        self.in_degree.get(id as usize).map_or(0, |d| *d as usize)
    }

    /// Node with the most incoming edges; ties go to the smallest id.
    pub fn max_in_degree_node(&self) -> Option<UserId> {
        let mut best: Option<(UserId, u32)> = None;
        for (id, &deg) in self.in_degree.iter().enumerate() {
            if best.map_or(true, |(_, b)| deg > b) {
                best = Some((id as UserId, deg));
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn has_edge(&self, from: UserId, to: UserId) -> bool {
        self.neighbors(from).contains(&to)
    }
}

impl GraphStore for AdjacencyGraph {
    fn node_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    fn edge_count(&self) -> usize {
        self.targets.len()
    }

    fn neighbors(&self, id: UserId) -> &[UserId] {
        let i = id as usize;
        if i + 1 >= self.offsets.len() {
            return &[];
        }
        &self.targets[self.offsets[i]..self.offsets[i + 1]]
    }
}
