//! One AVL tree per indexed attribute, keyed by [`AttrValue`].

use crate::avl::{AvlTree, Range};
use social_types::{AttrValue, Attribute, Predicate, QueryError, UserId, UserRecord};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Ordered attribute index built once from the record store.
#[derive(Debug, Clone, Default)]
pub struct AttributeIndex {
    trees: BTreeMap<Attribute, AvlTree<AttrValue>>,
}

impl AttributeIndex {
    /// Index every record for every attribute in `attributes`.
    ///
    /// Each tree's node arena is sized up front from a first pass that counts
    /// distinct values, so insertion never reallocates.
    pub fn build(attributes: &[Attribute], records: &[UserRecord]) -> Self {
        let mut trees = BTreeMap::new();
        for &attr in attributes {
            let distinct: BTreeSet<AttrValue> =
                records.iter().flat_map(|r| r.attribute_values(attr)).collect();
            trees.insert(attr, AvlTree::with_capacity(distinct.len()));
        }
        let mut index = Self { trees };
        for record in records {
            index.insert_record(record);
        }
        for (attr, tree) in &index.trees {
            tracing::debug!(
                attribute = %attr,
                distinct = tree.len(),
                entries = tree.entry_count(),
                height = tree.height(),
                "attribute index built"
            );
        }
        index
    }

    /// Register `record` under each of its present values. Absent values are skipped.
    fn insert_record(&mut self, record: &UserRecord) {
        for (attr, tree) in self.trees.iter_mut() {
            for value in record.attribute_values(*attr) {
                tree.insert(value, record.user_id);
            }
        }
    }

    /// The tree for `attr`, or `InvalidAttribute` when it was not indexed.
    pub fn tree(&self, attr: Attribute) -> Result<&AvlTree<AttrValue>, QueryError> {
        self.trees
            .get(&attr)
            .ok_or_else(|| QueryError::InvalidAttribute(attr.to_string()))
    }

    /// Ids whose value for `attr` equals `value`, ascending.
    pub fn exact_match(&self, attr: Attribute, value: &AttrValue) -> Result<&[UserId], QueryError> {
        let tree = self.tree(attr)?;
        Predicate::equals(value.clone()).check_kind(attr)?;
        Ok(tree.get(value))
    }

    /// Ids with `low <= value <= high`; either bound may be open.
    ///
    /// Yields lazily, grouped by ascending value and ascending id within a value.
    pub fn range<'a>(
        &'a self,
        attr: Attribute,
        low: Option<&'a AttrValue>,
        high: Option<&'a AttrValue>,
    ) -> Result<Matches<'a>, QueryError> {
        let tree = self.tree(attr)?;
        Predicate::range(low.cloned(), high.cloned()).check_kind(attr)?;
        let low = low.map_or(Bound::Unbounded, Bound::Included);
        let high = high.map_or(Bound::Unbounded, Bound::Included);
        Ok(Matches::new(tree.range(low, high)))
    }

    /// Dispatch a predicate to [`Self::exact_match`] or [`Self::range`].
    pub fn select<'a>(
        &'a self,
        attr: Attribute,
        predicate: &'a Predicate,
    ) -> Result<Matches<'a>, QueryError> {
        match predicate {
            Predicate::Equals { value } => self.range(attr, Some(value), Some(value)),
            Predicate::Range { low, high } => self.range(attr, low.as_ref(), high.as_ref()),
        }
    }

    /// Count per distinct value, read off bucket sizes (O(distinct values)).
    pub fn distribution(&self, attr: Attribute) -> Result<BTreeMap<AttrValue, usize>, QueryError> {
        Ok(self
            .tree(attr)?
            .iter()
            .map(|(value, ids)| (value.clone(), ids.len()))
            .collect())
    }
}

/// Lazily flattened ids from a key range.
pub struct Matches<'a> {
    entries: Range<'a, AttrValue>,
    current: std::slice::Iter<'a, UserId>,
}

impl<'a> Matches<'a> {
    fn new(entries: Range<'a, AttrValue>) -> Self {
        let empty: &'a [UserId] = &[];
        Self {
            entries,
            current: empty.iter(),
        }
    }
}

impl Iterator for Matches<'_> {
    type Item = UserId;

    fn next(&mut self) -> Option<UserId> {
        loop {
            if let Some(id) = self.current.next() {
                return Some(*id);
            }
            let (_, ids) = self.entries.next()?;
            self.current = ids.iter();
        }
    }
}
