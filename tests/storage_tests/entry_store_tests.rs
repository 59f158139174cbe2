//! Tests for EntryStore
//!
//! These tests verify:
//! - Lazy directory creation and atomic replace on write
//! - Read variants (strict, default, optional)
//! - Corrupted entries are reported and left untouched
//! - Delete/destroy semantics on present and absent targets
//! - Key listing, timestamps and temp file cleanup

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use paperdb::storage::{EntryStore, HEADER_SIZE};
use paperdb::{BincodeCodec, PaperError, SyncStrategy};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    name: String,
    age: u32,
}

fn setup_temp_store() -> (TempDir, EntryStore<BincodeCodec>) {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(temp_dir.path().join("book"), SyncStrategy::EveryWrite);
    (temp_dir, store)
}

fn open_store(dir: PathBuf, sync_strategy: SyncStrategy) -> EntryStore<BincodeCodec> {
    EntryStore::new(
        dir,
        Arc::new(BincodeCodec::new()),
        sync_strategy,
        Duration::from_secs(300),
    )
}

fn dir_file_names(store: &EntryStore<BincodeCodec>) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(store.dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_write_creates_directory_lazily() {
    let (_temp, store) = setup_temp_store();

    assert!(!store.dir().exists());

    store.write("city", &"Lund".to_string()).unwrap();

    assert!(store.dir().is_dir());
    assert!(store.entry_path("city").is_file());
}

#[test]
fn test_write_creates_missing_parents() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(
        temp_dir.path().join("a").join("b").join("book"),
        SyncStrategy::EveryWrite,
    );

    store.write("k", &1u8).unwrap();

    assert!(store.entry_path("k").is_file());
}

#[test]
fn test_write_read_struct() {
    let (_temp, store) = setup_temp_store();
    let ada = Person {
        name: "Ada".to_string(),
        age: 36,
    };

    store.write("person", &ada).unwrap();
    let read: Person = store.read("person").unwrap();

    assert_eq!(read, ada);
}

#[test]
fn test_rewrite_replaces_content() {
    let (_temp, store) = setup_temp_store();

    store.write("data", &vec![7u8; 4096]).unwrap();
    let big = fs::metadata(store.entry_path("data")).unwrap().len();

    store.write("data", &vec![1u8; 2]).unwrap();
    let small = fs::metadata(store.entry_path("data")).unwrap().len();

    assert!(small < big);
    assert_eq!(store.read::<Vec<u8>>("data").unwrap(), vec![1u8; 2]);
}

#[test]
fn test_write_leaves_no_temp_files() {
    let (_temp, store) = setup_temp_store();

    for i in 0..5 {
        store.write("counter", &i).unwrap();
    }
    store.write("other", &"x".to_string()).unwrap();

    assert_eq!(dir_file_names(&store), vec!["counter.pt", "other.pt"]);
}

#[test]
fn test_entry_file_is_framed() {
    let (_temp, store) = setup_temp_store();

    store.write("n", &42u32).unwrap();

    let bytes = fs::read(store.entry_path("n")).unwrap();
    assert_eq!(&bytes[0..4], b"PAPR");
    assert_eq!(bytes.len(), HEADER_SIZE + 4);
}

#[test]
fn test_write_with_os_buffered_sync() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(temp_dir.path().join("fast"), SyncStrategy::OsBuffered);

    store.write("k", &"v".to_string()).unwrap();

    assert_eq!(store.read::<String>("k").unwrap(), "v");
}

#[test]
fn test_invalid_key_touches_nothing() {
    let (_temp, store) = setup_temp_store();

    let result = store.write("city/ads", &"Lund".to_string());

    assert!(matches!(result, Err(PaperError::InvalidKey { .. })));
    assert!(!store.dir().exists());
}

#[test]
fn test_write_absent_value_is_rejected() {
    let (_temp, store) = setup_temp_store();
    store.write("city", &"Lund".to_string()).unwrap();

    let result = store.write_optional::<String>("city", None);

    assert!(matches!(result, Err(PaperError::NullValue { ref key }) if key == "city"));
    assert_eq!(store.read::<String>("city").unwrap(), "Lund");
}

#[test]
fn test_write_present_optional_value() {
    let (_temp, store) = setup_temp_store();

    store
        .write_optional("city", Some(&"Kyiv".to_string()))
        .unwrap();

    assert_eq!(store.read::<String>("city").unwrap(), "Kyiv");
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_read_missing_key() {
    let (_temp, store) = setup_temp_store();

    let result = store.read::<String>("non-existed");

    assert!(matches!(result, Err(PaperError::KeyNotFound { ref key }) if key == "non-existed"));
}

#[test]
fn test_read_or_default() {
    let (_temp, store) = setup_temp_store();

    let value = store.read_or("non-existed", "default".to_string()).unwrap();
    assert_eq!(value, "default");

    store.write("existed", &"value".to_string()).unwrap();
    let value = store.read_or("existed", "default".to_string()).unwrap();
    assert_eq!(value, "value");
}

#[test]
fn test_read_optional() {
    let (_temp, store) = setup_temp_store();

    assert_eq!(store.read_optional::<u64>("n").unwrap(), None);
    store.write("n", &9u64).unwrap();
    assert_eq!(store.read_optional::<u64>("n").unwrap(), Some(9));
}

#[test]
fn test_corrupted_entry_is_kept() {
    let (_temp, store) = setup_temp_store();
    store.write("city", &"Lund".to_string()).unwrap();

    let path = store.entry_path("city");
    fs::write(&path, b"definitely not an entry").unwrap();

    let result = store.read::<String>("city");
    assert!(matches!(result, Err(PaperError::Deserialization { .. })));

    // Still there, byte for byte
    assert!(store.contains("city").unwrap());
    assert_eq!(fs::read(&path).unwrap(), b"definitely not an entry");
}

#[test]
fn test_flipped_bit_is_detected() {
    let (_temp, store) = setup_temp_store();
    store.write("city", &"Lund".to_string()).unwrap();

    let path = store.entry_path("city");
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x20;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        store.read::<String>("city"),
        Err(PaperError::Deserialization { .. })
    ));
    assert_eq!(fs::read(&path).unwrap(), bytes);
}

#[test]
fn test_read_or_still_fails_on_corruption() {
    let (_temp, store) = setup_temp_store();
    store.write("city", &"Lund".to_string()).unwrap();
    fs::write(store.entry_path("city"), b"").unwrap();

    let result = store.read_or("city", "default".to_string());

    assert!(matches!(result, Err(PaperError::Deserialization { .. })));
}

// =============================================================================
// Delete / Contains Tests
// =============================================================================

#[test]
fn test_contains_lifecycle() {
    let (_temp, store) = setup_temp_store();

    assert!(!store.contains("persons").unwrap());
    store.write("persons", &vec!["a".to_string()]).unwrap();
    assert!(store.contains("persons").unwrap());
    store.delete("persons").unwrap();
    assert!(!store.contains("persons").unwrap());
}

#[test]
fn test_delete_missing_key_is_noop() {
    let (_temp, store) = setup_temp_store();

    store.delete("persons").unwrap();
    store.write("x", &1u8).unwrap();
    store.delete("persons").unwrap();

    assert!(store.contains("x").unwrap());
}

#[test]
fn test_delete_invalid_key() {
    let (_temp, store) = setup_temp_store();
    assert!(matches!(store.delete(""), Err(PaperError::InvalidKey { .. })));
}

// =============================================================================
// Destroy Tests
// =============================================================================

#[test]
fn test_destroy_removes_everything() {
    let (_temp, store) = setup_temp_store();
    store.write("a", &1u8).unwrap();
    store.write("b", &2u8).unwrap();
    fs::create_dir_all(store.dir().join("nested").join("deeper")).unwrap();
    fs::write(store.dir().join("nested").join("deeper").join("f"), b"x").unwrap();

    store.destroy().unwrap();

    assert!(!store.dir().exists());
    assert!(!store.contains("a").unwrap());
    assert!(store.list_keys().unwrap().is_empty());
}

#[test]
fn test_destroy_missing_directory() {
    let (_temp, store) = setup_temp_store();
    store.destroy().unwrap();
    store.destroy().unwrap();
}

#[test]
fn test_write_after_destroy() {
    let (_temp, store) = setup_temp_store();
    store.write("a", &1u8).unwrap();
    store.destroy().unwrap();

    store.write("b", &2u8).unwrap();

    assert_eq!(store.read::<u8>("b").unwrap(), 2);
    assert!(!store.contains("a").unwrap());
}

// =============================================================================
// Listing Tests
// =============================================================================

#[test]
fn test_list_keys_of_missing_directory() {
    let (_temp, store) = setup_temp_store();
    assert!(store.list_keys().unwrap().is_empty());
}

#[test]
fn test_list_keys_after_writes_and_deletes() {
    let (_temp, store) = setup_temp_store();
    for key in ["city", "city1", "city2", "city.dasd&%"] {
        store.write(key, &key.to_string()).unwrap();
    }
    store.delete("city1").unwrap();

    let keys: Vec<String> = store.list_keys().unwrap().into_iter().collect();

    assert_eq!(keys, vec!["city", "city.dasd&%", "city2"]);
}

#[test]
fn test_list_keys_ignores_foreign_files() {
    let (_temp, store) = setup_temp_store();
    store.write("real", &1u8).unwrap();
    fs::write(store.dir().join("notes.txt"), b"x").unwrap();
    fs::write(store.dir().join("real.pt.tmp.1.0"), b"x").unwrap();
    fs::create_dir(store.dir().join("sub.pt")).unwrap();

    let keys: Vec<String> = store.list_keys().unwrap().into_iter().collect();

    assert_eq!(keys, vec!["real"]);
}

// =============================================================================
// Timestamp Tests
// =============================================================================

#[test]
fn test_last_modified_missing_key() {
    let (_temp, store) = setup_temp_store();
    assert_eq!(store.last_modified("city").unwrap(), -1);
}

#[test]
fn test_last_modified_tracks_write_time() {
    let (_temp, store) = setup_temp_store();
    let before = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;

    store.write("city", &"Lund".to_string()).unwrap();
    let modified = store.last_modified("city").unwrap();

    assert_ne!(modified, -1);
    // Coarse filesystems may round down to the second
    assert!(modified >= before - 1000);
    assert!(modified <= before + 60_000);
}

#[test]
fn test_last_modified_increases_on_rewrite() {
    let (_temp, store) = setup_temp_store();

    store.write("city", &"Lund".to_string()).unwrap();
    let first = store.last_modified("city").unwrap();

    std::thread::sleep(Duration::from_millis(1100));

    store.write("city", &"Kyiv".to_string()).unwrap();
    let second = store.last_modified("city").unwrap();

    assert!(second > first);
}

// =============================================================================
// Temp File Cleanup Tests
// =============================================================================

#[test]
fn test_purge_stale_temp() {
    let (_temp, store) = setup_temp_store();
    store.write("real", &1u8).unwrap();
    fs::write(store.dir().join("real.pt.tmp.999.0"), b"partial").unwrap();
    fs::write(store.dir().join("other.pt.tmp.999.1"), b"partial").unwrap();

    // Fresh files are not stale yet
    assert_eq!(store.purge_stale_temp(Duration::from_secs(3600)).unwrap(), 0);

    assert_eq!(store.purge_stale_temp(Duration::ZERO).unwrap(), 2);
    assert_eq!(dir_file_names(&store), vec!["real.pt"]);
}

#[test]
fn test_purge_missing_directory() {
    let (_temp, store) = setup_temp_store();
    assert_eq!(store.purge_stale_temp(Duration::ZERO).unwrap(), 0);
}

#[test]
fn test_first_write_sweeps_stale_temp() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("book");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("ghost.pt.tmp.1.0"), b"partial").unwrap();

    let store = EntryStore::new(
        dir,
        Arc::new(BincodeCodec::new()),
        SyncStrategy::EveryWrite,
        Duration::ZERO,
    );
    store.write("k", &1u8).unwrap();

    assert_eq!(dir_file_names(&store), vec!["k.pt"]);
}

#[test]
fn test_temp_lookalike_key_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("book");
    let sweeping_store = || {
        EntryStore::new(
            dir.clone(),
            Arc::new(BincodeCodec::new()),
            SyncStrategy::EveryWrite,
            Duration::ZERO,
        )
    };

    let first = sweeping_store();
    first.write("notes.pt.tmp.v1", &"kept".to_string()).unwrap();
    first.write("draft.pt.tmp.1.2", &7u32).unwrap();
    drop(first);

    // A fresh store sweeps the directory on its first write
    let second = sweeping_store();
    second.write("other", &1u8).unwrap();

    assert_eq!(second.read::<String>("notes.pt.tmp.v1").unwrap(), "kept");
    assert_eq!(second.read::<u32>("draft.pt.tmp.1.2").unwrap(), 7);
    let keys: Vec<String> = second.list_keys().unwrap().into_iter().collect();
    assert_eq!(keys, vec!["draft.pt.tmp.1.2", "notes.pt.tmp.v1", "other"]);
}

#[test]
fn test_purge_matches_only_temp_file_names() {
    let (_temp, store) = setup_temp_store();
    store.write("real", &1u8).unwrap();
    for name in ["a.pt.tmp.12.3", "a.pt.tmp.x.3", "a.pt.tmp.12", "a.pt.tmp.1.2.3", "a.pt.tmp."] {
        fs::write(store.dir().join(name), b"partial").unwrap();
    }

    assert_eq!(store.purge_stale_temp(Duration::ZERO).unwrap(), 1);
    assert_eq!(
        dir_file_names(&store),
        vec!["a.pt.tmp.", "a.pt.tmp.1.2.3", "a.pt.tmp.12", "a.pt.tmp.x.3", "real.pt"]
    );
}
