use super::*;

#[test]
fn get_returns_what_was_set() {
    let store = MemoryStore::new();
    assert_eq!(store.get("k"), None);
    store.set("k", "v");
    assert_eq!(store.get("k"), Some("v".to_owned()));
}

#[test]
fn set_overwrites_existing_value() {
    let store = MemoryStore::new();
    store.set("k", "old");
    store.set("k", "new");
    assert_eq!(store.get("k"), Some("new".to_owned()));
}

#[test]
fn remove_clears_the_key() {
    let store = MemoryStore::new();
    store.set("k", "v");
    store.remove("k");
    assert_eq!(store.get("k"), None);
    // Removing an absent key is a no-op.
    store.remove("k");
}

#[test]
fn clones_share_the_same_session() {
    let store = MemoryStore::new();
    let other = store.clone();
    store.set("k", "v");
    assert_eq!(other.get("k"), Some("v".to_owned()));
}
