//! Build phase: collect rows, then freeze them into a [`Snapshot`].

use crate::records::RecordStore;
use social_graph::{AdjacencyGraph, EdgePolicy, EdgeStats, GraphBuilder, GraphStore};
use social_index::AttributeIndex;
use social_types::{Attribute, BuildError, ParsedRow, RawUserRow, UserId, UserRecord};
use std::str::FromStr;
use std::time::Instant;

/// How the root user is chosen once the graph is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootSelector {
    Fixed(UserId),
    /// Highest in-degree; ties go to the smallest id.
    #[default]
    MaxInDegree,
}

impl FromStr for RootSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "maxindegree" | "max" => Ok(RootSelector::MaxInDegree),
            _ => s
                .parse::<UserId>()
                .map(RootSelector::Fixed)
                .map_err(|_| format!("invalid root selector: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Attributes that get an ordered index.
    pub attributes: Vec<Attribute>,
    pub edge_policy: EdgePolicy,
    pub root: RootSelector,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            attributes: Attribute::ALL.to_vec(),
            edge_policy: EdgePolicy::default(),
            root: RootSelector::default(),
        }
    }
}

impl BuildConfig {
    pub fn with_root(mut self, root: RootSelector) -> Self {
        self.root = root;
        self
    }

    pub fn with_edge_policy(mut self, policy: EdgePolicy) -> Self {
        self.edge_policy = policy;
        self
    }

    pub fn with_attributes(mut self, attributes: &[Attribute]) -> Self {
        self.attributes = attributes.to_vec();
        self
    }
}

/// Single-writer accumulator for the Loading phase.
///
/// Nothing here is queryable; [`SnapshotBuilder::finish`] consumes the
/// builder and returns the only queryable form.
#[derive(Debug)]
pub struct SnapshotBuilder {
    config: BuildConfig,
    records: Vec<UserRecord>,
    graph: GraphBuilder,
    started: Instant,
}

impl SnapshotBuilder {
    pub fn new(config: BuildConfig) -> Self {
        let graph = GraphBuilder::new(config.edge_policy);
        Self {
            config,
            records: Vec::new(),
            graph,
            started: Instant::now(),
        }
    }

    /// Parse and register one raw row. A row that fails to parse registers nothing.
    pub fn add_row(&mut self, row_no: u64, row: &RawUserRow) -> Result<UserId, BuildError> {
        let parsed = row
            .parse()
            .map_err(|reason| BuildError::MalformedRow { row: row_no, reason })?;
        Ok(self.add_parsed(parsed))
    }

    /// Register a parsed record and its outgoing friend edges.
    pub fn add_parsed(&mut self, parsed: ParsedRow) -> UserId {
        let ParsedRow { record, friends } = parsed;
        let id = record.user_id;
        self.graph.extend(friends.into_iter().map(|to| (id, to)));
        self.add_record(record);
        id
    }

    pub fn add_record(&mut self, record: UserRecord) {
        self.records.push(record);
    }

    pub fn add_edge(&mut self, from: UserId, to: UserId) {
        self.graph.add_edge(from, to);
    }

    pub fn user_count(&self) -> usize {
        self.records.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Validate ids, freeze the graph, pick the root and build the indexes.
    ///
    /// User ids must be exactly `0..N` with no repeats.
    pub fn finish(self) -> Result<Snapshot, BuildError> {
        let SnapshotBuilder {
            config,
            mut records,
            graph,
            started,
        } = self;
        if records.is_empty() {
            return Err(BuildError::EmptyDataset);
        }
        records.sort_by_key(|r| r.user_id);
        for (pos, record) in records.iter().enumerate() {
            let expected = pos as UserId;
            if record.user_id < expected {
                return Err(BuildError::DuplicateUser(record.user_id));
            }
            if record.user_id > expected {
                return Err(BuildError::MissingUser(expected));
            }
        }

        let users = records.len();
        let (graph, edge_stats) = graph.build(users)?;
        let root = match config.root {
            RootSelector::Fixed(id) if (id as usize) < users => id,
            RootSelector::Fixed(id) => return Err(BuildError::InvalidRoot(id)),
            RootSelector::MaxInDegree => graph
                .max_in_degree_node()
                .ok_or(BuildError::EmptyDataset)?,
        };
        tracing::info!(
            root,
            in_degree = graph.in_degree(root),
            rule = ?config.root,
            "root selected"
        );

        let index = AttributeIndex::build(&config.attributes, &records);
        let snapshot = Snapshot {
            records: RecordStore::from_dense(records),
            index,
            graph,
            root,
            edge_stats,
        };
        tracing::info!(
            users,
            edges = snapshot.graph.edge_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "snapshot built"
        );
        Ok(snapshot)
    }
}

/// Immutable, `Send + Sync` view of a fully built dataset.
#[derive(Debug, Clone)]
pub struct Snapshot {
    records: RecordStore,
    index: AttributeIndex,
    graph: AdjacencyGraph,
    root: UserId,
    edge_stats: EdgeStats,
}

impl Snapshot {
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn index(&self) -> &AttributeIndex {
        &self.index
    }

    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    pub fn root(&self) -> UserId {
        self.root
    }

    /// Edges removed by the edge policy during build.
    pub fn edge_stats(&self) -> EdgeStats {
        self.edge_stats
    }

    pub fn user_count(&self) -> usize {
        self.records.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
