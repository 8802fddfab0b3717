//! Property tests for hashing and deltas.

mod fixtures;

use std::collections::BTreeSet;

use fixtures::repo::{TestRepo, author};
use geoversion::{Attributes, Bpo, Geometry};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn attribute_pairs() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..8)
        .prop_map(|map| map.into_iter().collect())
}

fn object(pairs: impl Iterator<Item = (String, i64)>) -> Value {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert(k, json!(v));
    }
    Value::Object(map)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn hash_ignores_attribute_insertion_order(
        pairs in attribute_pairs(),
        lon in -180.0f64..=180.0,
        lat in -90.0f64..=90.0,
        seed in any::<u64>(),
    ) {
        let mut shuffled = pairs.clone();
        let len = shuffled.len();
        if len > 1 {
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();
        }
        let geometry = json!({ "type": "Point", "coordinates": [lon, lat] });
        let a = Bpo::from_json(geometry.clone(), object(pairs.into_iter())).unwrap();
        let b = Bpo::from_json(geometry, object(shuffled.into_iter())).unwrap();
        prop_assert_eq!(a.content_hash().unwrap(), b.content_hash().unwrap());
    }

    #[test]
    fn put_is_idempotent(lon in -180.0f64..=180.0, lat in -90.0f64..=90.0) {
        let t = TestRepo::new();
        let bpo = Bpo::new(Geometry::point(lon, lat), Attributes::new().with("k", "v")).unwrap();
        let first = t.repo.objects().put(&bpo).unwrap();
        let second = t.repo.objects().put(&bpo).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(t.repo.objects().count().unwrap(), 1);
    }

    #[test]
    fn committed_snapshots_diff_symmetrically(
        left in prop::collection::btree_set(0u8..12, 0..6),
        right in prop::collection::btree_set(0u8..12, 0..6),
        moved in prop::collection::btree_set(0u8..12, 0..6),
    ) {
        let t = TestRepo::new();
        let s = t.situation("prop");
        // Feature n sits at lon n; features in `moved` shift north on the right.
        let snapshot = |ids: &BTreeSet<u8>, shift: &BTreeSet<u8>| -> Vec<Bpo> {
            ids.iter()
                .map(|n| {
                    let lat = if shift.contains(n) { 1.0 } else { 0.0 };
                    Bpo::new(
                        Geometry::point(f64::from(*n), lat),
                        Attributes::new().with("feature_id", format!("f{n}")),
                    )
                    .unwrap()
                })
                .collect()
        };
        let reg = t.repo.registry();
        let a = reg.commit(&s, vec![], &snapshot(&left, &BTreeSet::new()), "", author("p")).unwrap();
        let b = reg.commit(&s, vec![], &snapshot(&right, &moved), "", author("p")).unwrap();

        let forward = t.repo.deltas().compute_delta(a, b).unwrap();
        let backward = t.repo.deltas().compute_delta(b, a).unwrap();
        prop_assert_eq!(&backward, &forward.clone().reversed());
        prop_assert!(forward.warnings.is_empty());
        prop_assert!(t.repo.deltas().compute_delta(b, b).unwrap().is_empty());

        let expected_modified = left.intersection(&right).filter(|n| moved.contains(n)).count();
        prop_assert_eq!(forward.modified.len(), expected_modified);
        prop_assert_eq!(forward.added.len(), right.difference(&left).count());
        prop_assert_eq!(forward.removed.len(), left.difference(&right).count());
    }
}
