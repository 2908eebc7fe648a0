//! Aggregate statistics over the snapshot.

use crate::engine::QueryEngine;
use social_graph::GraphStore;
use social_types::{
    AttrValue, Attribute, DegreeEntry, DegreeSummary, Gender, GenderAge, GenderCount, QueryError,
    UserId, ValueCount,
};
use std::cmp::Reverse;
use std::collections::BTreeMap;

const GENDERS: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Unknown];

impl QueryEngine {
    /// The `k` most common values of `attr`; ties ordered by value.
    pub fn top_values(&self, attr: Attribute, k: usize) -> Result<Vec<ValueCount>, QueryError> {
        let mut counts: Vec<ValueCount> = self
            .distribution(attr)?
            .into_iter()
            .map(|(value, count)| ValueCount { value, count })
            .collect();
        // stable sort keeps the ascending value order among equal counts
        counts.sort_by_key(|vc| Reverse(vc.count));
        counts.truncate(k);
        Ok(counts)
    }

    /// Users per gender, `unknown` included, always in male/female/unknown order.
    pub fn gender_counts(&self) -> Vec<GenderCount> {
        let total = self.snapshot().user_count();
        let mut counts = [0usize; 3];
        match self.snapshot().index().tree(Attribute::Gender) {
            Ok(tree) => {
                counts[0] = tree.get(&AttrValue::from(Gender::Male.as_str())).len();
                counts[1] = tree.get(&AttrValue::from(Gender::Female.as_str())).len();
                counts[2] = total - counts[0] - counts[1];
            }
            Err(_) => {
                for record in self.store().iter() {
                    counts[gender_slot(record.gender)] += 1;
                }
            }
        }
        GENDERS
            .into_iter()
            .zip(counts)
            .map(|(gender, users)| GenderCount { gender, users })
            .collect()
    }

    /// Mean age per gender over users that have an age. Genders with no aged users are omitted.
    pub fn average_age_by_gender(&self) -> Vec<GenderAge> {
        let mut sums = [(0u64, 0usize); 3];
        for record in self.store().iter() {
            if let Some(age) = record.age {
                let slot = &mut sums[gender_slot(record.gender)];
                slot.0 += u64::from(age);
                slot.1 += 1;
            }
        }
        GENDERS
            .into_iter()
            .zip(sums)
            .filter(|(_, (_, users))| *users > 0)
            .map(|(gender, (sum, users))| GenderAge {
                gender,
                users,
                average_age: sum as f64 / users as f64,
            })
            .collect()
    }

    /// Mean, median and max out-degree.
    pub fn degree_summary(&self) -> DegreeSummary {
        let graph = self.snapshot().graph();
        let users = graph.node_count();
        let edges = graph.edge_count();
        let mut degrees: Vec<usize> = (0..users as UserId).map(|id| graph.out_degree(id)).collect();
        degrees.sort_unstable();
        let median = match users {
            0 => 0.0,
            n if n % 2 == 1 => degrees[n / 2] as f64,
            n => (degrees[n / 2 - 1] + degrees[n / 2]) as f64 / 2.0,
        };
        DegreeSummary {
            users,
            edges,
            average: if users == 0 { 0.0 } else { edges as f64 / users as f64 },
            median,
            max: degrees.last().copied().unwrap_or(0),
        }
    }

    /// Out-degree -> number of users with that out-degree.
    pub fn degree_distribution(&self) -> BTreeMap<usize, usize> {
        let graph = self.snapshot().graph();
        let mut dist = BTreeMap::new();
        for id in 0..graph.node_count() as UserId {
            *dist.entry(graph.out_degree(id)).or_insert(0) += 1;
        }
        dist
    }

    /// The `k` users with the highest out-degree; ties go to the smaller id.
    pub fn most_connected(&self, k: usize) -> Vec<DegreeEntry> {
        let mut entries = self.degree_entries();
        entries.sort_by_key(|e| (Reverse(e.degree), e.user_id));
        entries.truncate(k);
        entries
    }

    /// The `k` users with the lowest out-degree; ties go to the smaller id.
    pub fn least_connected(&self, k: usize) -> Vec<DegreeEntry> {
        let mut entries = self.degree_entries();
        entries.sort_by_key(|e| (e.degree, e.user_id));
        entries.truncate(k);
        entries
    }

    fn degree_entries(&self) -> Vec<DegreeEntry> {
        let graph = self.snapshot().graph();
        (0..graph.node_count() as UserId)
            .map(|user_id| DegreeEntry {
                user_id,
                degree: graph.out_degree(user_id),
            })
            .collect()
    }
}

fn gender_slot(gender: Gender) -> usize {
    match gender {
        Gender::Male => 0,
        Gender::Female => 1,
        Gender::Unknown => 2,
    }
}
