//! Dense record store: position `i` holds the record of user `i`.

use social_types::{Attribute, Predicate, QueryError, UserId, UserRecord};

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<UserRecord>,
}

impl RecordStore {
    /// `records` must already be sorted and dense (`records[i].user_id == i`).
    pub(crate) fn from_dense(records: Vec<UserRecord>) -> Self {
        debug_assert!(records
            .iter()
            .enumerate()
            .all(|(i, r)| r.user_id as usize == i));
        Self { records }
    }

    pub fn get(&self, id: UserId) -> Result<&UserRecord, QueryError> {
        self.records
            .get(id as usize)
            .ok_or(QueryError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, UserRecord> {
        self.records.iter()
    }

    /// Hydrate `ids` in the given order, skipping unknown ids.
    pub fn records<I>(&self, ids: I) -> Vec<&UserRecord>
    where
        I: IntoIterator<Item = UserId>,
    {
        ids.into_iter()
            .filter_map(|id| self.records.get(id as usize))
            .collect()
    }

    /// Full scan without the index. Used to cross-check indexed answers.
    pub fn scan_by<'a>(
        &'a self,
        attr: Attribute,
        predicate: &'a Predicate,
    ) -> impl Iterator<Item = &'a UserRecord> + 'a {
        self.records.iter().filter(move |r| {
            r.attribute_values(attr)
                .iter()
                .any(|v| predicate.matches(v))
        })
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a UserRecord;
    type IntoIter = std::slice::Iter<'a, UserRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
