use docdrift_cache::{DriftCache, SnapshotLoad, SnapshotSave};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Verdict {
    drift_detected: bool,
    rationale: String,
}

fn verdict(drift: bool, rationale: &str) -> Verdict {
    Verdict {
        drift_detected: drift,
        rationale: rationale.to_string(),
    }
}

#[test]
fn save_clear_load_restores_entries_without_recomputing() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("nested").join("cache.json");

    let cache: DriftCache<Verdict> = DriftCache::new(10);
    let key_a = cache.key("ctx a", "doc a", "model");
    let key_b = cache.key("ctx b", "doc b", "model");
    cache.insert(key_a.clone(), verdict(true, "stale"));
    cache.insert(key_b.clone(), verdict(false, "fine"));

    let saved = cache.save_to_disk(&path);
    assert_eq!(saved, SnapshotSave::Saved { entries: 2 });
    let size_before = cache.stats().size;

    cache.clear();
    assert!(cache.is_empty());

    assert_eq!(
        cache.load_from_disk(&path),
        SnapshotLoad::Loaded { entries: 2 }
    );
    assert_eq!(cache.stats().size, size_before);
    assert_eq!(cache.keys(), vec![key_a.clone(), key_b]);

    let calls = AtomicUsize::new(0);
    let value = cache
        .get_or_compute(&key_a, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(verdict(false, "recomputed"))
        })
        .expect("cached");
    assert_eq!(value, verdict(true, "stale"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn snapshot_file_has_versioned_layout() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("cache.json");

    let cache: DriftCache<Verdict> = DriftCache::new(10);
    cache.insert("k1", verdict(true, "because"));
    assert!(cache.save_to_disk(&path).is_saved());

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("json");
    assert_eq!(raw["version"], 1);
    assert_eq!(raw["entries"]["k1"]["drift_detected"], true);
    assert_eq!(raw["entries"]["k1"]["rationale"], "because");

    let leftovers: Vec<_> = std::fs::read_dir(temp.path())
        .expect("read_dir")
        .flatten()
        .map(|e| e.file_name())
        .collect();
    assert_eq!(leftovers.len(), 1, "temp file must be renamed away");
}

#[test]
fn load_preserves_on_disk_order_for_fifo() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("cache.json");
    std::fs::write(
        &path,
        r#"{"version":1,"entries":{
            "zzz":{"drift_detected":false,"rationale":"first"},
            "aaa":{"drift_detected":true,"rationale":"second"},
            "mmm":{"drift_detected":false,"rationale":"third"}
        }}"#,
    )
    .expect("write");

    let cache: DriftCache<Verdict> = DriftCache::new(3);
    assert!(cache.load_from_disk(&path).is_loaded());
    assert_eq!(cache.keys(), vec!["zzz", "aaa", "mmm"]);

    cache.insert("new", verdict(false, "fourth"));
    assert!(!cache.contains("zzz"));
    assert_eq!(cache.keys(), vec!["aaa", "mmm", "new"]);
}

#[test]
fn unknown_version_is_ignored() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("cache.json");
    std::fs::write(
        &path,
        r#"{"version":2,"entries":{"k":{"drift_detected":true,"rationale":"x"}}}"#,
    )
    .expect("write");

    let cache: DriftCache<Verdict> = DriftCache::new(3);
    assert_eq!(
        cache.load_from_disk(&path),
        SnapshotLoad::UnsupportedVersion(2)
    );
    assert!(cache.is_empty());
}

#[test]
fn garbage_and_missing_files_leave_cache_untouched() {
    let temp = TempDir::new().expect("tempdir");
    let cache: DriftCache<Verdict> = DriftCache::new(3);
    cache.insert("keep", verdict(false, "kept"));

    assert_eq!(
        cache.load_from_disk(&temp.path().join("absent.json")),
        SnapshotLoad::Missing
    );

    let garbage = temp.path().join("garbage.json");
    std::fs::write(&garbage, b"{not json").expect("write");
    assert!(matches!(
        cache.load_from_disk(&garbage),
        SnapshotLoad::Malformed(_)
    ));

    let wrong_shape = temp.path().join("shape.json");
    std::fs::write(
        &wrong_shape,
        r#"{"version":1,"entries":{"k":{"unexpected":1}}}"#,
    )
    .expect("write");
    assert!(matches!(
        cache.load_from_disk(&wrong_shape),
        SnapshotLoad::Malformed(_)
    ));

    assert!(matches!(
        cache.load_from_disk(temp.path()),
        SnapshotLoad::Unreadable(_)
    ));

    assert_eq!(cache.keys(), vec!["keep"]);
}

#[test]
fn save_failure_is_reported_not_raised() {
    let temp = TempDir::new().expect("tempdir");
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, b"file, not a dir").expect("write");

    let cache: DriftCache<Verdict> = DriftCache::new(3);
    cache.insert("k", verdict(false, "x"));

    let outcome = cache.save_to_disk(&blocker.join("cache.json"));
    assert!(matches!(outcome, SnapshotSave::Failed(_)));
    assert_eq!(cache.stats().size, 1);
}

#[test]
fn concurrent_misses_keep_cache_consistent() {
    let cache: Arc<DriftCache<Verdict>> = Arc::new(DriftCache::new(8));
    let calls = Arc::new(AtomicUsize::new(0));

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            scope.spawn(move || {
                for round in 0..16 {
                    let key = format!("key-{}", (worker + round) % 12);
                    let got = cache
                        .get_or_compute(&key, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, Infallible>(verdict(false, &key))
                        })
                        .expect("infallible");
                    assert_eq!(got.rationale, key);
                }
            });
        }
    });

    let stats = cache.stats();
    assert!(stats.size <= stats.max_size);
    assert_eq!(cache.keys().len(), stats.size);
    assert!(calls.load(Ordering::SeqCst) >= 12);
}
