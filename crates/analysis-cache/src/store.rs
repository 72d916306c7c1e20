use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// One cached value with its insertion time. Expiry is judged against
/// `stored_at + ttl` at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Entry<T> {
    pub payload: T,
    pub stored_at: DateTime<Utc>,
}

/// A single TTL namespace. Thread-safe; callers always receive clones of
/// the payload, never references into the map.
pub(crate) struct Store<T> {
    name: &'static str,
    ttl: Duration,
    entries: DashMap<String, Entry<T>>,
    path: Option<PathBuf>,
}

impl<T: Clone + Serialize + DeserializeOwned> Store<T> {
    pub fn new(name: &'static str, ttl: Duration, dir: Option<&PathBuf>) -> Self {
        let path = dir.map(|d| d.join(format!("{}.json", name)));
        let store = Self {
            name,
            ttl,
            entries: DashMap::new(),
            path,
        };
        store.load();
        store
    }

    fn is_expired(&self, entry: &Entry<T>, now: DateTime<Utc>) -> bool {
        entry.stored_at + self.ttl <= now
    }

    /// Load persisted entries. Any I/O or decode failure degrades to an
    /// empty namespace — redundant recompute is the accepted cost.
    fn load(&self) {
        let Some(path) = &self.path else { return };
        if !path.exists() {
            return;
        }
        let data = match std::fs::read(path) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Could not read cache file {:?}: {}", path, e);
                return;
            }
        };
        match serde_json::from_slice::<HashMap<String, Entry<T>>>(&data) {
            Ok(map) => {
                for (k, v) in map {
                    self.entries.insert(k, v);
                }
                tracing::info!("Loaded {} entries into '{}' cache", self.entries.len(), self.name);
            }
            Err(e) => {
                tracing::warn!("Could not decode cache file {:?}: {}", path, e);
            }
        }
    }

    /// Persist the namespace. Failures are logged and swallowed.
    pub fn persist(&self) {
        let Some(path) = &self.path else { return };
        let map: HashMap<String, Entry<T>> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let result = serde_json::to_vec(&map).map_err(|e| e.to_string()).and_then(|bytes| {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
            std::fs::write(path, bytes).map_err(|e| e.to_string())
        });
        if let Err(e) = result {
            tracing::error!("Could not save '{}' cache to {:?}: {}", self.name, path, e);
        }
    }

    /// Insert without persisting — batch callers persist once at the end.
    pub fn insert_only(&self, key: String, payload: T) {
        self.entries.insert(
            key,
            Entry {
                payload,
                stored_at: Utc::now(),
            },
        );
    }

    pub fn put(&self, key: String, payload: T) {
        self.insert_only(key, payload);
        self.persist();
    }

    /// Returns a copy of the live payload; an expired entry is removed on
    /// read so `len()` stays accurate.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Utc::now();
        // Scope the shard guard: removing while it is held would deadlock.
        {
            let entry = self.entries.get(key)?;
            if !self.is_expired(&entry, now) {
                return Some(entry.payload.clone());
            }
        }
        self.entries.remove(key);
        self.persist();
        tracing::debug!("Evicted expired '{}' entry: {}", self.name, key);
        None
    }

    /// Whether a live (non-expired) entry exists, without cloning it.
    /// Expired entries are evicted as a side effect, like `get`.
    pub fn contains_live(&self, key: &str) -> bool {
        let now = Utc::now();
        {
            let Some(entry) = self.entries.get(key) else {
                return false;
            };
            if !self.is_expired(&entry, now) {
                return true;
            }
        }
        self.entries.remove(key);
        self.persist();
        false
    }

    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.stored_at + self.ttl > now);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.persist();
            tracing::info!("Swept {} expired entries from '{}' cache", removed, self.name);
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.persist();
        tracing::info!("Cleared '{}' cache", self.name);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Test hook: back-date an entry so TTL expiry is observable without
    /// sleeping for the full window.
    #[cfg(test)]
    pub fn put_with_timestamp(&self, key: String, payload: T, stored_at: DateTime<Utc>) {
        self.entries.insert(key, Entry { payload, stored_at });
    }
}
