use std::fs;

use feedpost_core::SessionBlob;
use feedpost_engine::{
    ensure_dir, remove_if_exists, write_atomic, StateStore, StoreError, StorePaths, UserConfig,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn store(dir: &TempDir) -> StateStore {
    StateStore::new(StorePaths::in_dir(dir.path()))
}

#[test]
fn atomic_write_creates_parents_and_replaces() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("nested/dir/file.txt");

    write_atomic(&target, b"hello").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "hello");

    write_atomic(&target, b"world").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "world");
    assert_eq!(fs::read_dir(target.parent().unwrap()).unwrap().count(), 1);
}

#[test]
fn ensure_dir_refuses_a_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("not_a_dir");
    fs::write(&file, "x").unwrap();

    assert!(ensure_dir(&file).is_err());
    assert!(remove_if_exists(&file).is_ok());
    assert!(remove_if_exists(&file).is_ok());
}

#[test]
fn missing_config_falls_back_to_default_feed() {
    let temp = TempDir::new().unwrap();
    let config = store(&temp).load_config("https://default/feed").unwrap();
    assert_eq!(config, UserConfig::with_feed("https://default/feed"));
}

#[test]
fn config_round_trips_and_blank_feed_uses_default() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let saved = UserConfig {
        rss_url: "  ".to_string(),
        username: "editor".to_string(),
        password: "pw".to_string(),
        session_cookie: String::new(),
    };
    store.save_config(&saved).unwrap();

    let loaded = store.load_config("https://default/feed").unwrap();
    assert_eq!(loaded.username, "editor");
    assert_eq!(loaded.rss_url, "https://default/feed");
    assert!(loaded.credentials().has_password_login());
    assert!(!format!("{loaded:?}").contains("\"pw\""));
}

#[test]
fn marker_is_empty_until_set_and_stored_trimmed() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    assert_eq!(store.last_published().unwrap(), "");

    store.set_last_published("  https://site/a \n").unwrap();
    assert_eq!(store.last_published().unwrap(), "https://site/a");
    assert_eq!(
        fs::read_to_string(temp.path().join("last_post.txt")).unwrap(),
        "https://site/a"
    );
}

#[test]
fn session_blob_is_saved_and_cleared() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let blob = SessionBlob::new(json!({ "cookies": { "sessionid": "abc" } }));

    store.save_session(&blob).unwrap();
    assert_eq!(store.load_session().unwrap(), Some(blob));

    store.clear_session().unwrap();
    assert_eq!(store.load_session().unwrap(), None);
}

#[test]
fn corrupt_config_is_reported() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("config.json"), "{ broken").unwrap();

    let err = store(&temp).load_config("https://default/feed").unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}
