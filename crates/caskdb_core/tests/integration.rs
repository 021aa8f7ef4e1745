//! End-to-end store behavior: round-trips, file growth, rollover, and
//! merge.

use caskdb_core::{Config, Record};
use caskdb_testkit::prelude::*;
use std::fs;

#[test]
fn put_then_get_three_pairs() {
    with_temp_store(|store| {
        let pairs = [
            ("key1", "value1"),
            ("key2", "value2"),
            ("key3", "value3"),
        ];

        for (key, value) in pairs {
            store.put(key, value).unwrap();
            assert_eq!(store.get(key).unwrap(), value.as_bytes());
        }
    });
}

#[test]
fn overwrites_are_last_write_wins() {
    with_temp_store(|store| {
        for i in 0..10 {
            store.put("key", format!("value{i}")).unwrap();
        }
        assert_eq!(store.get("key").unwrap(), b"value9");
    });
}

#[test]
fn same_workload_twice_doubles_the_active_segment() {
    with_temp_store(|store| {
        let pairs = [
            ("key1", "value1"),
            ("key2", "value2"),
            ("key3", "value3"),
        ];

        let active = store.segment_paths().pop().unwrap();

        for (key, value) in pairs {
            store.put(key, value).unwrap();
        }
        let size_after_one_pass = fs::metadata(&active).unwrap().len();

        for (key, value) in pairs {
            store.put(key, value).unwrap();
        }
        let size_after_two_passes = fs::metadata(&active).unwrap().len();

        assert_eq!(size_after_two_passes, size_after_one_pass * 2);
    });
}

#[test]
fn active_segment_size_matches_record_sizes() {
    with_temp_store(|store| {
        store.put("key1", "value1").unwrap();
        store.put("key2", "value2").unwrap();

        let expected: u64 = [("key1", "value1"), ("key2", "value2")]
            .iter()
            .map(|(k, v)| Record::new(k.as_bytes().to_vec(), v.as_bytes().to_vec()).serialized_size())
            .sum();

        let active = store.segment_paths().pop().unwrap();
        assert_eq!(fs::metadata(active).unwrap().len(), expected);
    });
}

#[test]
fn tiny_threshold_rolls_and_merges_to_two_segments() {
    let fixture = TestStore::new();
    fixture.set_segment_size(16);

    assert_eq!(fixture.segment_count(), 1);

    fixture.put("aa", "aa").unwrap();
    assert_eq!(fixture.segment_count(), 2);

    // Two sealed segments would now exist; the merge after the roll
    // collapses them, keeping the count at two.
    fixture.put("bb", "bb").unwrap();
    assert_eq!(fixture.segment_count(), 2);

    fixture.put("cc", "cc").unwrap();
    assert_eq!(fixture.segment_count(), 2);

    fixture.put("dd", "dd").unwrap();
    assert_eq!(fixture.segment_count(), 2);

    for key in ["aa", "bb", "cc", "dd"] {
        assert_eq!(fixture.get(key).unwrap(), key.as_bytes());
    }
}

#[test]
fn segment_count_stays_bounded_under_sustained_writes() {
    let fixture = TestStore::with_config(Config::new().max_segment_size(64));

    for i in 0..200 {
        fixture.put(format!("key{i}"), format!("value{i}")).unwrap();
        assert!(
            fixture.segment_count() <= 2,
            "{} segments after put {i}",
            fixture.segment_count()
        );
    }

    for i in 0..200 {
        assert_eq!(
            fixture.get(format!("key{i}")).unwrap(),
            format!("value{i}").into_bytes()
        );
    }
}

#[test]
fn merge_preserves_every_pair() {
    let fixture = TestStore::new();
    fixture.set_segment_size(100);

    // Three records fill a segment, so the sixth put rolls to a third
    // segment and merges the two sealed ones.
    for i in 0..6 {
        fixture.put(format!("key{i}"), format!("value{i}")).unwrap();
    }

    fixture.put("trigger", "merge").unwrap();

    assert_eq!(fixture.segment_count(), 2);
    for i in 0..6 {
        assert_eq!(
            fixture.get(format!("key{i}")).unwrap(),
            format!("value{i}").into_bytes()
        );
    }
    assert_eq!(fixture.get("trigger").unwrap(), b"merge");
}

#[test]
fn merged_segment_holds_exactly_the_live_records() {
    let fixture = TestStore::new();
    fixture.set_segment_size(16);

    // Each put rolls; every second one merges. Overwrite one key so
    // the merged output must shrink to the live set.
    fixture.put("key", "old").unwrap();
    fixture.put("key", "new").unwrap();
    fixture.put("other", "x").unwrap();

    let merged = &fixture.segment_paths()[0];
    let live: u64 = [("key", "new"), ("other", "x")]
        .iter()
        .map(|(k, v)| Record::new(k.as_bytes().to_vec(), v.as_bytes().to_vec()).serialized_size())
        .sum();
    assert_eq!(fs::metadata(merged).unwrap().len(), live);

    assert_eq!(fixture.get("key").unwrap(), b"new");
    assert_eq!(fixture.get("other").unwrap(), b"x");
}

#[test]
fn empty_values_round_trip() {
    with_temp_store(|store| {
        store.put("key", "").unwrap();
        assert_eq!(store.get("key").unwrap(), b"");
    });
}
