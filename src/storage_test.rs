use super::*;

// =============================================================================
// FileStore
// =============================================================================

#[tokio::test]
async fn file_store_round_trips_values() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state"));

    assert_eq!(store.get("user").await.unwrap(), None);
    store.set("user", r#"{"id":"U1"}"#).await.unwrap();
    assert_eq!(store.get("user").await.unwrap().as_deref(), Some(r#"{"id":"U1"}"#));
    assert!(dir.path().join("state").join("user.json").exists());
}

#[tokio::test]
async fn file_store_overwrite_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    store.set("user", "one").await.unwrap();
    store.set("user", "two").await.unwrap();
    assert_eq!(store.get("user").await.unwrap().as_deref(), Some("two"));

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("user.json")]);
}

#[tokio::test]
async fn file_store_remove_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    store.set("user", "x").await.unwrap();
    store.remove("user").await.unwrap();
    store.remove("user").await.unwrap();
    assert_eq!(store.get("user").await.unwrap(), None);
}

#[tokio::test]
async fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    FileStore::new(dir.path()).set("user", "persisted").await.unwrap();

    let reopened = FileStore::new(dir.path());
    assert_eq!(reopened.get("user").await.unwrap().as_deref(), Some("persisted"));
}

#[tokio::test]
async fn file_store_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    for key in ["", "../escape", "a/b", "user.json"] {
        let err = store.set(key, "x").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)), "key {key:?}");
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

#[tokio::test]
async fn memory_store_round_trips_and_removes() {
    let store = MemoryStore::new();
    store.set("user", "v").await.unwrap();
    assert_eq!(store.get("user").await.unwrap().as_deref(), Some("v"));
    store.remove("user").await.unwrap();
    assert_eq!(store.get("user").await.unwrap(), None);
}

#[tokio::test]
async fn memory_store_can_fail_writes() {
    let store = MemoryStore::new();
    store.set("user", "v").await.unwrap();
    store.set_fail_writes(true);

    assert!(matches!(store.set("user", "w").await, Err(StorageError::Unavailable(_))));
    assert!(store.remove("user").await.is_err());
    assert_eq!(store.get("user").await.unwrap().as_deref(), Some("v"));
}
