//! Favorite ids persisted as a JSON list under one storage key.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, warn};

use crate::storage::KeyValueStore;

/// The favorites set plus the store it is mirrored to.
///
/// The in-memory set is authoritative: load failures start empty and write
/// failures are logged without rolling back the mutation.
pub struct FavoritesStore {
    store: Box<dyn KeyValueStore>,
    key: String,
    ids: BTreeSet<u64>,
}

impl fmt::Debug for FavoritesStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FavoritesStore")
            .field("key", &self.key)
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl FavoritesStore {
    /// Read the set stored under `key`. Missing, unreadable or malformed
    /// values yield an empty set.
    #[must_use]
    pub fn load(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let ids = match store.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<u64>>(&raw) {
                Ok(list) => list.into_iter().collect(),
                Err(err) => {
                    warn!(key = %key, error = %err, "stored favorites are malformed; starting empty");
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(err) => {
                warn!(key = %key, error = %err, "failed to read favorites; starting empty");
                BTreeSet::new()
            }
        };
        debug!(key = %key, count = ids.len(), "favorites loaded");
        Self { store, key, ids }
    }

    /// Whether `id` is a favorite.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Current favorites.
    #[must_use]
    pub const fn ids(&self) -> &BTreeSet<u64> {
        &self.ids
    }

    /// Number of favorites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no favorites are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Add `id` when absent, remove it when present, then write the full set.
    /// Returns whether `id` is a favorite afterwards.
    pub fn toggle(&mut self, id: u64) -> bool {
        let now_favorite = if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        };
        self.persist();
        now_favorite
    }

    fn persist(&mut self) {
        let list: Vec<u64> = self.ids.iter().copied().collect();
        let encoded = match serde_json::to_string(&list) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to encode favorites");
                return;
            }
        };
        if let Err(err) = self.store.set(&self.key, &encoded) {
            warn!(key = %self.key, error = %err, "failed to persist favorites");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStore;

    const KEY: &str = "cinedex.favorites";

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Json {
                operation: "parse document",
                source: serde_json::from_str::<u8>("x").unwrap_err(),
            })
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                operation: "replace",
                path: "favorites.json".into(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    fn seeded(raw: &str) -> Box<MemoryStore> {
        let mut store = MemoryStore::new();
        store.set(KEY, raw).unwrap();
        Box::new(store)
    }

    #[test]
    fn loads_stored_ids() {
        let favorites = FavoritesStore::load(seeded("[3, 1, 2]"), KEY);
        assert_eq!(favorites.ids().iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
        assert!(favorites.contains(2));
    }

    #[test]
    fn malformed_value_starts_empty() {
        assert!(FavoritesStore::load(seeded("{\"oops\":1}"), KEY).is_empty());
        assert!(FavoritesStore::load(Box::new(MemoryStore::new()), KEY).is_empty());
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut favorites = FavoritesStore::load(Box::new(MemoryStore::new()), KEY);
        assert!(favorites.toggle(42));
        assert_eq!(favorites.len(), 1);
        assert!(!favorites.toggle(42));
        assert!(favorites.is_empty());
    }

    #[test]
    fn failing_store_keeps_memory_authoritative() {
        let mut favorites = FavoritesStore::load(Box::new(BrokenStore), KEY);
        assert!(favorites.is_empty());
        assert!(favorites.toggle(7));
        assert!(favorites.contains(7));
    }
}
