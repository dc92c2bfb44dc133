//! In-memory ephemeral store
//!
//! Single-node provider with the same atomicity guarantees as the Redis
//! provider: each mutation holds the key's shard entry for the duration of
//! the change, so concurrent increments never lose updates and `get_del`
//! yields the value to exactly one caller.
//!
//! Expiry uses the tokio clock, which lets tests drive TTLs deterministically
//! with a paused runtime.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::domain::error::{Error, Result};
use crate::domain::ports::EphemeralStore;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: String, expires_at: Option<Instant>) -> Self {
        Self { value, expires_at }
    }

    fn is_live(&self) -> bool {
        self.expires_at.is_none_or(|deadline| Instant::now() < deadline)
    }
}

/// In-memory provider for the shared ephemeral store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries. Reads already ignore dead entries; this only
    /// reclaims memory for long-lived processes.
    pub fn purge_expired(&self) {
        self.entries.retain(|_, entry| entry.is_live());
    }
}

#[async_trait]
impl EphemeralStore for MemoryStore {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let entry = Entry::new(value.to_string(), Some(Instant::now() + ttl));
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live() {
                return Ok(Some(entry.value.clone()));
            }
        }

        self.entries.remove_if(key, |_, entry| !entry.is_live());
        Ok(None)
    }

    async fn get_del(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .remove(key)
            .and_then(|(_, entry)| entry.is_live().then_some(entry.value)))
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        // The entry guard holds the shard lock, making the whole
        // read-modify-write one atomic step per key.
        let count = match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.is_live() {
                    let count: i64 = entry
                        .value
                        .parse()
                        .map_err(|_| Error::store("value is not an integer"))?;
                    let count = count + 1;
                    entry.value = count.to_string();
                    count
                } else {
                    *entry = Entry::new("1".to_string(), None);
                    1
                }
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry::new("1".to_string(), None));
                1
            }
        };

        Ok(count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.is_live() {
                entry.expires_at = Some(Instant::now() + ttl);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn set_get_del_roundtrip() {
        let store = MemoryStore::new();

        store.set_ex("k", "v", Duration::from_secs(10)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert!(store.exists("k").await.unwrap());

        store.del("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_on_the_tokio_clock() {
        let store = MemoryStore::new();

        store.set_ex("k", "v", Duration::from_secs(60)).await.unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.exists("k").await.unwrap());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!store.exists("k").await.unwrap());
        assert_eq!(store.get_del("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn incr_starts_at_one_and_counts_up() {
        let store = MemoryStore::new();

        assert_eq!(store.incr("ctr").await.unwrap(), 1);
        assert_eq!(store.incr("ctr").await.unwrap(), 2);
        assert_eq!(store.incr("ctr").await.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn incr_resets_after_window_expiry() {
        let store = MemoryStore::new();

        assert_eq!(store.incr("ctr").await.unwrap(), 1);
        store.expire("ctr", Duration::from_secs(30)).await.unwrap();
        assert_eq!(store.incr("ctr").await.unwrap(), 2);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.incr("ctr").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn incr_rejects_non_numeric_values() {
        let store = MemoryStore::new();

        store.set_ex("k", "not-a-number", Duration::from_secs(10)).await.unwrap();
        assert!(store.incr("k").await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn get_del_yields_to_exactly_one_caller() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_ex("once", "winner", Duration::from_secs(10))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.get_del("once").await.unwrap() }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                wins += 1;
            }
        }

        assert_eq!(wins, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_incr_never_loses_updates() {
        let store = Arc::new(MemoryStore::new());

        let mut handles = Vec::new();
        for _ in 0..64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.incr("ctr").await.unwrap() }));
        }

        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap());
        }

        seen.sort_unstable();
        let expected: Vec<i64> = (1..=64).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn purge_drops_only_dead_entries() {
        let store = MemoryStore::new();

        store.set_ex("live", "v", Duration::from_secs(600)).await.unwrap();
        store.set_ex("dead", "v", Duration::from_secs(600)).await.unwrap();

        // Force-expire one entry directly.
        store.entries.get_mut("dead").unwrap().expires_at = Some(Instant::now());

        store.purge_expired();
        assert!(store.entries.contains_key("live"));
        assert!(!store.entries.contains_key("dead"));
    }
}
