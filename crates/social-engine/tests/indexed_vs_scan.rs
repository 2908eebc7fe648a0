//! Indexed attribute queries agree with a full scan of the record store.

use proptest::prelude::*;
use social_engine::{BuildConfig, QueryEngine, RootSelector, SnapshotBuilder};
use social_types::{AttrValue, Attribute, Predicate, UserId, UserRecord};

const MUSIC: [&str; 4] = ["jazz", "rock", "pop", "metal"];

fn build(rows: &[(Option<u32>, Vec<usize>)]) -> QueryEngine {
    let mut b = SnapshotBuilder::new(BuildConfig::default().with_root(RootSelector::Fixed(0)));
    for (id, (age, music)) in rows.iter().enumerate() {
        let tokens: Vec<&str> = music.iter().map(|m| MUSIC[*m]).collect();
        let mut record = UserRecord::new(id as UserId).with_text(Attribute::Music, &tokens.join(","));
        record.age = *age;
        b.add_record(record);
    }
    QueryEngine::from(b.finish().unwrap())
}

fn rows() -> impl Strategy<Value = Vec<(Option<u32>, Vec<usize>)>> {
    prop::collection::vec(
        (
            prop::option::weighted(0.9, 1u32..80),
            prop::collection::vec(0usize..MUSIC.len(), 0..3),
        ),
        1..120,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn age_range_matches_scan(rows in rows(), low in 0i64..80, width in 0i64..40) {
        let engine = build(&rows);
        let p = Predicate::range(Some(AttrValue::Int(low)), Some(AttrValue::Int(low + width)));
        let indexed: Vec<UserId> = engine
            .find_by_attribute(Attribute::Age, &p)
            .unwrap()
            .iter()
            .map(|r| r.user_id)
            .collect();
        let scanned: Vec<UserId> = engine
            .snapshot()
            .records()
            .scan_by(Attribute::Age, &p)
            .map(|r| r.user_id)
            .collect();
        prop_assert_eq!(indexed, scanned);
    }

    #[test]
    fn music_equality_matches_scan(rows in rows(), wanted in 0usize..MUSIC.len()) {
        let engine = build(&rows);
        let p = Predicate::equals(MUSIC[wanted]);
        let indexed: Vec<UserId> = engine
            .find_by_attribute(Attribute::Music, &p)
            .unwrap()
            .iter()
            .map(|r| r.user_id)
            .collect();
        let scanned: Vec<UserId> = engine
            .snapshot()
            .records()
            .scan_by(Attribute::Music, &p)
            .map(|r| r.user_id)
            .collect();
        prop_assert_eq!(indexed, scanned);
    }
}
