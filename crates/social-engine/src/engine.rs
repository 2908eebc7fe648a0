//! Read-only queries over a [`Snapshot`].

use crate::builder::Snapshot;
use crate::records::RecordStore;
use social_graph::{reachable, shortest_path, CancellationToken, GraphStore, TraversalOptions};
use social_types::{
    AttrValue, Attribute, Predicate, QueryError, ReachEntry, UserId, UserRecord,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// How many ids an attribute query collects between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Cheap-to-clone handle answering queries against one frozen snapshot.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    snapshot: Arc<Snapshot>,
    max_hops: Option<usize>,
}

impl From<Snapshot> for QueryEngine {
    fn from(snapshot: Snapshot) -> Self {
        Self::new(Arc::new(snapshot))
    }
}

impl QueryEngine {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self {
            snapshot,
            max_hops: None,
        }
    }

    /// Default hop ceiling for path queries that do not set their own.
    pub fn with_max_hops(mut self, max_hops: Option<usize>) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub(crate) fn store(&self) -> &RecordStore {
        self.snapshot.records()
    }

    pub fn root(&self) -> UserId {
        self.snapshot.root()
    }

    pub fn get_record(&self, id: UserId) -> Result<&UserRecord, QueryError> {
        self.store().get(id)
    }

    /// Hydrate ids in order, skipping unknown ones.
    pub fn records<I>(&self, ids: I) -> Vec<&UserRecord>
    where
        I: IntoIterator<Item = UserId>,
    {
        self.store().records(ids)
    }

    /// Records whose `attr` satisfies `predicate`, ascending by user id.
    pub fn find_by_attribute(
        &self,
        attr: Attribute,
        predicate: &Predicate,
    ) -> Result<Vec<&UserRecord>, QueryError> {
        self.find_by_attribute_with(attr, predicate, None)
    }

    /// [`Self::find_by_attribute`] that gives up with `Cancelled` once `cancel` fires.
    pub fn find_by_attribute_with(
        &self,
        attr: Attribute,
        predicate: &Predicate,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<&UserRecord>, QueryError> {
        let started = Instant::now();
        let mut ids = Vec::new();
        for (n, id) in self.snapshot.index().select(attr, predicate)?.enumerate() {
            if n % CANCEL_CHECK_INTERVAL == 0 && cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(QueryError::Cancelled);
            }
            ids.push(id);
        }
        ids.sort_unstable();
        if attr.is_multi_valued() {
            // one record can match on more than one token
            ids.dedup();
        }
        tracing::debug!(
            attribute = %attr,
            matches = ids.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "attribute query"
        );
        Ok(self.store().records(ids))
    }

    /// Lazy variant of [`Self::find_by_attribute`] for callers that stop early.
    ///
    /// Yields in index key order, ascending id within a key. For multi-valued
    /// attributes a record is yielded once per matching token.
    pub fn scan_by_attribute<'a>(
        &'a self,
        attr: Attribute,
        predicate: &'a Predicate,
    ) -> Result<impl Iterator<Item = &'a UserRecord> + 'a, QueryError> {
        let store = self.store();
        let ids = self.snapshot.index().select(attr, predicate)?;
        Ok(ids.filter_map(move |id| store.get(id).ok()))
    }

    /// Minimum-hop path from `user` to the root.
    pub fn path_to_root(&self, user: UserId) -> Result<Vec<UserId>, QueryError> {
        self.path_to_root_with(user, &TraversalOptions::default())
    }

    pub fn path_to_root_with(
        &self,
        user: UserId,
        opts: &TraversalOptions,
    ) -> Result<Vec<UserId>, QueryError> {
        self.shortest_path_with(user, self.root(), opts)
    }

    /// Minimum-hop path between any two users.
    pub fn shortest_path(&self, from: UserId, to: UserId) -> Result<Vec<UserId>, QueryError> {
        self.shortest_path_with(from, to, &TraversalOptions::default())
    }

    pub fn shortest_path_with(
        &self,
        from: UserId,
        to: UserId,
        opts: &TraversalOptions,
    ) -> Result<Vec<UserId>, QueryError> {
        let started = Instant::now();
        let opts = self.traversal_options(opts);
        let result = shortest_path(self.snapshot.graph(), from, to, &opts);
        tracing::debug!(
            from,
            to,
            hops = result.as_ref().map_or(0, |p| p.len().saturating_sub(1)),
            found = result.is_ok(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "path query"
        );
        result
    }

    /// Every user reachable from `user` over outgoing edges, in BFS order.
    ///
    /// `user` itself comes first at zero hops. The engine hop ceiling applies
    /// when `opts` sets none.
    pub fn reachable_from(
        &self,
        user: UserId,
        opts: &TraversalOptions,
    ) -> Result<Vec<ReachEntry>, QueryError> {
        let opts = self.traversal_options(opts);
        let order = reachable(self.snapshot.graph(), user, &opts)?;
        Ok(order
            .into_iter()
            .map(|(user_id, hops)| ReachEntry { user_id, hops })
            .collect())
    }

    fn traversal_options(&self, opts: &TraversalOptions) -> TraversalOptions {
        let mut opts = opts.clone();
        if opts.max_hops.is_none() {
            opts.max_hops = self.max_hops;
        }
        opts
    }

    /// Value -> number of users, read off the index buckets.
    pub fn distribution(&self, attr: Attribute) -> Result<BTreeMap<AttrValue, usize>, QueryError> {
        self.snapshot.index().distribution(attr)
    }

    /// Records `user` points at, in insertion order.
    pub fn friends(&self, user: UserId) -> Result<Vec<&UserRecord>, QueryError> {
        self.store().get(user)?;
        let graph = self.snapshot.graph();
        Ok(self.store().records(graph.neighbors(user).iter().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BuildConfig, RootSelector, SnapshotBuilder};
    use social_types::Gender;

    fn engine() -> QueryEngine {
        let mut b = SnapshotBuilder::new(BuildConfig::default().with_root(RootSelector::Fixed(3)));
        let ages = [25, 30, 25, 40];
        for (id, age) in ages.iter().enumerate() {
            b.add_record(UserRecord::new(id as UserId).with_age(*age));
        }
        b.add_record(
            UserRecord::new(4)
                .with_gender(Gender::Female)
                .with_text(Attribute::Languages, "English, French"),
        );
        b.add_edge(0, 1);
        b.add_edge(1, 2);
        b.add_edge(2, 3);
        QueryEngine::from(b.finish().unwrap())
    }

    fn ids(records: &[&UserRecord]) -> Vec<UserId> {
        records.iter().map(|r| r.user_id).collect()
    }

    #[test]
    fn path_to_root_scenario() {
        let e = engine();
        assert_eq!(e.path_to_root(0).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(
            e.path_to_root(4),
            Err(QueryError::NotReachable { from: 4, to: 3 })
        );
        assert_eq!(e.path_to_root(3).unwrap(), vec![3]);
        assert_eq!(e.path_to_root(42), Err(QueryError::NotFound(42)));
    }

    #[test]
    fn path_queries_are_idempotent() {
        let e = engine();
        let first = e.path_to_root(0).unwrap();
        let second = e.path_to_root(0).unwrap();
        assert_eq!(first, second);
        assert_eq!(e.path_to_root(4), e.path_to_root(4));
    }

    #[test]
    fn reachable_from_lists_hops_in_bfs_order() {
        let e = engine();
        let all = e.reachable_from(1, &TraversalOptions::default()).unwrap();
        let pairs: Vec<(UserId, usize)> = all.iter().map(|r| (r.user_id, r.hops)).collect();
        assert_eq!(pairs, vec![(1, 0), (2, 1), (3, 2)]);

        let capped = e.clone().with_max_hops(Some(1));
        assert_eq!(capped.reachable_from(0, &TraversalOptions::default()).unwrap().len(), 2);
        assert_eq!(
            e.reachable_from(42, &TraversalOptions::default()),
            Err(QueryError::NotFound(42))
        );
    }

    #[test]
    fn engine_hop_ceiling_applies_by_default() {
        let e = engine().with_max_hops(Some(2));
        assert!(matches!(
            e.path_to_root(0),
            Err(QueryError::NotReachable { .. })
        ));
        let wide = TraversalOptions::default().with_max_hops(3);
        assert_eq!(e.path_to_root_with(0, &wide).unwrap().len(), 4);
    }

    #[test]
    fn attribute_queries_are_sorted_and_idempotent() {
        let e = engine();
        let p = Predicate::equals(25i64);
        let first = ids(&e.find_by_attribute(Attribute::Age, &p).unwrap());
        assert_eq!(first, vec![0, 2]);
        let again = ids(&e.find_by_attribute(Attribute::Age, &p).unwrap());
        assert_eq!(first, again);

        let r = Predicate::range(Some(AttrValue::Int(26)), None);
        assert_eq!(ids(&e.find_by_attribute(Attribute::Age, &r).unwrap()), vec![1, 3]);
    }

    #[test]
    fn multi_valued_match_is_reported_once() {
        let e = engine();
        let p = Predicate::range(Some(AttrValue::from("A")), Some(AttrValue::from("Z")));
        let found = e.find_by_attribute(Attribute::Languages, &p).unwrap();
        assert_eq!(ids(&found), vec![4]);
        assert_eq!(e.scan_by_attribute(Attribute::Languages, &p).unwrap().count(), 2);
    }

    #[test]
    fn scan_short_circuits_in_key_order() {
        let e = engine();
        let p = Predicate::range(None, None);
        let first: Vec<UserId> = e
            .scan_by_attribute(Attribute::Age, &p)
            .unwrap()
            .take(3)
            .map(|r| r.user_id)
            .collect();
        assert_eq!(first, vec![0, 2, 1]);
    }

    #[test]
    fn cancelled_attribute_query() {
        let e = engine();
        let token = CancellationToken::new();
        token.cancel();
        let p = Predicate::equals(25i64);
        assert_eq!(
            e.find_by_attribute_with(Attribute::Age, &p, Some(&token)),
            Err(QueryError::Cancelled)
        );
    }

    #[test]
    fn distribution_scenario() {
        let e = engine();
        let dist = e.distribution(Attribute::Age).unwrap();
        let expected: BTreeMap<AttrValue, usize> = [(25i64, 2usize), (30, 1), (40, 1)]
            .into_iter()
            .map(|(v, c)| (AttrValue::Int(v), c))
            .collect();
        assert_eq!(dist, expected);
    }

    #[test]
    fn friends_and_lookup() {
        let e = engine();
        assert_eq!(ids(&e.friends(1).unwrap()), vec![2]);
        assert!(e.friends(3).unwrap().is_empty());
        assert_eq!(e.friends(9), Err(QueryError::NotFound(9)));
        assert_eq!(e.get_record(4).unwrap().gender, Gender::Female);
        assert_eq!(ids(&e.records([3, 0])), vec![3, 0]);
    }
}
