//! Property-style invariants for `DaggerTable` that go beyond the unit
//! tests living alongside the implementation: survival across interleaved
//! insert/remove/resize traffic, and stats bounds holding under stress.

use zorya_core::dagger::{DaggerTable, PSL_THRESHOLD};

#[test]
fn interleaved_insert_remove_keeps_table_consistent_with_a_reference_map() {
    use std::collections::HashMap;

    let mut table: DaggerTable<i64> = DaggerTable::new(16);
    let mut reference: HashMap<String, i64> = HashMap::new();

    for round in 0..2000i64 {
        let key = format!("k-{}", round % 300);
        if round % 7 == 0 {
            table.remove(key.as_bytes());
            reference.remove(&key);
        } else {
            let _ = table.set(key.as_bytes(), round, true);
            reference.insert(key, round);
        }
    }

    assert_eq!(table.len(), reference.len());
    for (key, value) in &reference {
        assert_eq!(table.get(key.as_bytes()), Some(value));
    }
}

#[test]
fn max_probe_sequence_length_stays_bounded_under_load() {
    let mut table = DaggerTable::new(64);
    for i in 0..10_000u32 {
        table.set(format!("stress-key-{i}").as_bytes(), i, true).unwrap();
    }
    let stats = table.stats();
    assert!(stats.max_psl <= PSL_THRESHOLD + 1);
}

#[test]
fn clearing_then_reinserting_is_clean() {
    let mut table = DaggerTable::new(0);
    for i in 0..50u32 {
        table.set(format!("a-{i}").as_bytes(), i, true).unwrap();
    }
    table.clear();
    assert_eq!(table.len(), 0);
    for i in 0..50u32 {
        table.set(format!("b-{i}").as_bytes(), i, true).unwrap();
    }
    assert_eq!(table.len(), 50);
    for i in 0..50u32 {
        assert_eq!(table.get(format!("a-{i}").as_bytes()), None);
        assert_eq!(table.get(format!("b-{i}").as_bytes()), Some(&i));
    }
}

#[test]
fn distinct_seed_pairs_still_agree_on_contents() {
    let mut a = DaggerTable::with_seeds(0, 1, 2);
    let mut b = DaggerTable::with_seeds(0, 99, 100);
    for i in 0..500u32 {
        let key = format!("cross-seed-{i}");
        a.set(key.as_bytes(), i, true).unwrap();
        b.set(key.as_bytes(), i, true).unwrap();
    }
    for i in 0..500u32 {
        let key = format!("cross-seed-{i}");
        assert_eq!(a.get(key.as_bytes()), b.get(key.as_bytes()));
    }
}
