//! End-to-end behaviour of the album store against real files.

use albumdb::codec;
use albumdb::{PartialRecord, PipelineConfig, Record, RewriteMode, Store, StoreConfig, StoreError};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn store_with(contents: &str, rewrite: RewriteMode) -> (TempDir, PathBuf, Store) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("albums");
    fs::write(&path, contents).unwrap();
    let store = Store::open_with(&path, StoreConfig::default().with_rewrite(rewrite)).unwrap();
    (dir, path, store)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

const MODES: [RewriteMode; 2] = [RewriteMode::InPlace, RewriteMode::Atomic];

#[test]
fn test_codec_round_trip() {
    let records = [
        Record::new("Kind of Blue", "Miles Davis", 42).with_id("a"),
        Record::new("", "", 0).with_id("b"),
        Record::new("Negative", "Price", -7).with_id("c"),
    ];
    for record in &records {
        let line = codec::encode(record);
        let decoded = codec::decode(line.trim_end_matches('\n')).unwrap().unwrap();
        assert_eq!(&decoded, record);
        assert_eq!(codec::encode(&decoded), line);
    }
}

#[test]
fn test_get_concrete_scenario() {
    let (_dir, _path, store) = store_with("a1;Song;Band;10\nbad-line\na2;Other;X;5\n", RewriteMode::InPlace);
    let records = store.get().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], Record::new("Song", "Band", 10).with_id("a1"));
    assert_eq!(records[1], Record::new("Other", "X", 5).with_id("a2"));
}

#[test]
fn test_get_large_file_with_small_pool() {
    let mut contents = String::new();
    for i in 0..2_000 {
        contents.push_str(&format!("id{i};title{i};artist;{i}\n"));
        if i % 100 == 0 {
            contents.push_str("noise\n");
        }
    }
    let dir = tempdir().unwrap();
    let path = dir.path().join("albums");
    fs::write(&path, contents).unwrap();

    let config = StoreConfig::default().with_pipeline(PipelineConfig::new(4).unwrap().with_workers(3).unwrap());
    let records = Store::open_with(&path, config).unwrap().get().unwrap();

    assert_eq!(records.len(), 2_000);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.id, format!("id{i}"));
        assert_eq!(record.price, i as i64);
    }
}

#[test]
fn test_get_fails_on_bad_price() {
    let (_dir, _path, store) = store_with("a1;Song;Band;10\na2;Other;X;five\n", RewriteMode::InPlace);
    let err = store.get().unwrap_err();
    assert!(matches!(err, StoreError::Malformed(_)));
}

#[test]
fn test_get_missing_file_is_io_error() {
    let (_dir, path, store) = store_with("", RewriteMode::InPlace);
    fs::remove_file(&path).unwrap();
    assert!(matches!(store.get().unwrap_err(), StoreError::Io(_)));
}

#[test]
fn test_add_then_get() {
    let (_dir, _path, store) = store_with("a1;Song;Band;10\n", RewriteMode::InPlace);
    let before = store.len().unwrap();

    let input = vec![
        Record::new("One", "A", 1),
        Record::new("Two", "B", 2).with_id("given"),
        Record::new("Three", "C", 3),
    ];
    let added = store.add(input).unwrap();

    assert_eq!(added.len(), 3);
    assert!(added.iter().all(Record::has_id));
    assert_eq!(added[1].id, "given");
    let generated: HashSet<&str> = added.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(generated.len(), 3);

    let all = store.get().unwrap();
    assert_eq!(all.len(), before + 3);
    for record in &added {
        assert!(all.contains(record));
    }
}

#[test]
fn test_delete_empty_or_disjoint_is_noop() {
    for mode in MODES {
        let original = "a1;Song;Band;10\na2;Other;X;5";
        let (_dir, path, store) = store_with(original, mode);

        assert!(store.delete(Vec::new()).unwrap().is_empty());
        assert!(store.delete(vec!["x".into(), "y".into()]).unwrap().is_empty());
        assert_eq!(read(&path), original);
    }
}

#[test]
fn test_delete_one() {
    for mode in MODES {
        let (_dir, _path, store) = store_with("a1;Song;Band;10\na2;Other;X;5\na3;Last;Z;8\n", mode);
        let before = store.get().unwrap();

        let deleted = store.delete(vec!["a2".into(), "missing".into()]).unwrap();
        assert_eq!(deleted, vec!["a2"]);

        let after = store.get().unwrap();
        let expected: Vec<Record> = before.into_iter().filter(|r| r.id != "a2").collect();
        assert_eq!(after, expected);
    }
}

#[test]
fn test_delete_returns_file_order() {
    let (_dir, _path, store) = store_with("c;T;A;1\na;T;A;2\nb;T;A;3\n", RewriteMode::InPlace);
    let deleted = store.delete(vec!["b".into(), "c".into()]).unwrap();
    assert_eq!(deleted, vec!["c", "b"]);
}

#[test]
fn test_update_title_only() {
    for mode in MODES {
        let (_dir, _path, store) = store_with("a1;Song;Band;10\na2;Other;X;5\n", mode);
        let updated = store
            .update(vec![
                PartialRecord::new("a1").with_title("Renamed"),
                PartialRecord::new("ghost").with_price(1),
            ])
            .unwrap();

        assert_eq!(updated, vec![Record::new("Renamed", "Band", 10).with_id("a1")]);
        let all = store.get().unwrap();
        assert_eq!(all[0], Record::new("Renamed", "Band", 10).with_id("a1"));
        assert_eq!(all[1], Record::new("Other", "X", 5).with_id("a2"));
    }
}

#[test]
fn test_update_concrete_scenario() {
    for mode in MODES {
        let (_dir, path, store) = store_with("a1;Song;Band;10\n", mode);
        let updated = store.update(vec![PartialRecord::new("a1").with_price(15)]).unwrap();
        assert_eq!(updated, vec![Record::new("Song", "Band", 15).with_id("a1")]);
        assert_eq!(read(&path), "a1;Song;Band;15\n");
    }
}

#[test]
fn test_update_no_match_is_noop() {
    let original = "a1;Song;Band;10\nnoise";
    let (_dir, path, store) = store_with(original, RewriteMode::InPlace);
    assert!(store.update(vec![PartialRecord::new("zz").with_title("x")]).unwrap().is_empty());
    assert!(store.update(Vec::new()).unwrap().is_empty());
    assert_eq!(read(&path), original);
}

#[test]
fn test_update_all_duplicates() {
    let (_dir, path, store) = store_with("d;A;B;1\nx;C;D;2\nd;E;F;3\n", RewriteMode::InPlace);
    let updated = store.update(vec![PartialRecord::new("d").with_artist("New")]).unwrap();
    assert_eq!(updated.len(), 2);
    assert_eq!(read(&path), "d;A;New;1\nx;C;D;2\nd;E;New;3\n");
}

#[test]
fn test_update_preserves_noise_and_order() {
    let (_dir, path, store) = store_with("first\na1;Song;Band;10\nmid;dle\na2;Other;X;5\n", RewriteMode::Atomic);
    store.update(vec![PartialRecord::new("a2").with_price(0)]).unwrap();
    assert_eq!(read(&path), "first\na1;Song;Band;10\nmid;dle\na2;Other;X;0\n");
}
