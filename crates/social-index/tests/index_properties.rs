//! Property checks: balance after every insert, exact-match completeness, and
//! range queries against a linear scan.

use proptest::prelude::*;
use social_index::{AttributeIndex, AvlTree};
use social_types::{AttrValue, Attribute, UserId, UserRecord};
use std::collections::{BTreeMap, BTreeSet};

fn records_strategy() -> impl Strategy<Value = Vec<Option<u32>>> {
    prop::collection::vec(prop::option::weighted(0.8, 1u32..60), 0..200)
}

fn to_records(ages: &[Option<u32>]) -> Vec<UserRecord> {
    ages.iter()
        .enumerate()
        .map(|(id, age)| {
            let rec = UserRecord::new(id as UserId);
            match age {
                Some(a) => rec.with_age(*a),
                None => rec,
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn balanced_after_every_insert(keys in prop::collection::vec(-500i64..500, 1..300)) {
        let mut tree = AvlTree::new();
        let mut reference: BTreeMap<i64, BTreeSet<UserId>> = BTreeMap::new();
        for (i, key) in keys.iter().enumerate() {
            tree.insert(*key, i as UserId);
            reference.entry(*key).or_default().insert(i as UserId);
            prop_assert!(tree.is_balanced());
        }
        let in_order: Vec<i64> = tree.iter().map(|(k, _)| *k).collect();
        prop_assert!(in_order.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(in_order, reference.keys().copied().collect::<Vec<_>>());
        for (key, ids) in &reference {
            prop_assert_eq!(tree.get(key).to_vec(), ids.iter().copied().collect::<Vec<_>>());
        }
    }

    #[test]
    fn exact_match_is_sound_and_complete(ages in records_strategy(), wanted in 0u32..65) {
        let records = to_records(&ages);
        let index = AttributeIndex::build(&[Attribute::Age], &records);
        let got = index
            .exact_match(Attribute::Age, &AttrValue::Int(i64::from(wanted)))
            .unwrap()
            .to_vec();
        let expected: Vec<UserId> = records
            .iter()
            .filter(|r| r.age == Some(wanted))
            .map(|r| r.user_id)
            .collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn range_matches_linear_scan(
        ages in records_strategy(),
        low in prop::option::of(0i64..65),
        high in prop::option::of(0i64..65),
    ) {
        let records = to_records(&ages);
        let index = AttributeIndex::build(&[Attribute::Age], &records);
        let low_v = low.map(AttrValue::Int);
        let high_v = high.map(AttrValue::Int);
        let mut got: Vec<UserId> = index
            .range(Attribute::Age, low_v.as_ref(), high_v.as_ref())
            .unwrap()
            .collect();
        got.sort_unstable();
        let expected: Vec<UserId> = records
            .iter()
            .filter_map(|r| r.age.map(|a| (r.user_id, i64::from(a))))
            .filter(|(_, a)| low.map_or(true, |l| l <= *a) && high.map_or(true, |h| *a <= h))
            .map(|(id, _)| id)
            .collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn distribution_sums_to_indexed_records(ages in records_strategy()) {
        let records = to_records(&ages);
        let index = AttributeIndex::build(&[Attribute::Age], &records);
        let dist = index.distribution(Attribute::Age).unwrap();
        let total: usize = dist.values().sum();
        prop_assert_eq!(total, ages.iter().filter(|a| a.is_some()).count());
    }
}
