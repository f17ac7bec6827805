//! Thread-Safe Storage Engine with Expiry Support
//!
//! This module implements the store behind KVStor: a HashMap from key to
//! [`Entry`] guarded by a single mutex, with per-entry TTL.
//!
//! ## Design Decisions
//!
//! 1. **One Lock**: Every operation, including a full sweep pass, runs under the
//!    same `parking_lot::Mutex`. Operations are totally ordered by lock acquisition.
//! 2. **Lazy Expiry**: `get` treats an expired entry as absent and removes it.
//! 3. **Active Expiry**: `cleanup_expired` is called by the background sweeper
//!    so entries nobody reads again are still reclaimed.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               StorageEngine                 │
//! │   ┌─────────────────────────────────────┐   │
//! │   │ Mutex<HashMap<String, Entry>>       │   │
//! │   └─────────────────────────────────────┘   │
//! └─────────────────────────────────────────────┘
//!      ▲            ▲               ▲
//!      │            │               │
//!  connection   connection     ExpirySweeper
//!    task         task        (one pass / tick)
//! ```
//!
//! The lock is never held across network I/O or an `.await`.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors returned by store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// `delete` was called for a key that has no record.
    #[error("no such key")]
    KeyNotFound,
}

/// One stored record.
///
/// The key is the map key and is not duplicated here.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored value
    pub value: Bytes,
    /// When this entry was written
    pub created_at: Instant,
    /// How long the entry stays live after `created_at`
    pub ttl: Duration,
}

impl Entry {
    /// Creates an entry written now.
    pub fn new(value: Bytes, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    /// The instant at which this entry expires.
    ///
    /// `None` when `created_at + ttl` does not fit in an `Instant`, which
    /// means the entry never expires.
    #[inline]
    pub fn expires_at(&self) -> Option<Instant> {
        self.created_at.checked_add(self.ttl)
    }

    /// Checks whether this entry is expired at `now`.
    ///
    /// An entry is live while `now < created_at + ttl`; a zero TTL is expired
    /// immediately.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at().is_some_and(|exp| now >= exp)
    }

    /// Checks whether this entry is expired right now.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

/// Snapshot of store counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub keys: u64,
    pub get_ops: u64,
    pub set_ops: u64,
    pub del_ops: u64,
    /// Entries removed because they expired, lazily or by the sweeper
    pub expired: u64,
}

/// The shared key-value store.
///
/// Wrap it in an `Arc` and hand a clone to every connection task and to the
/// [`ExpirySweeper`](crate::storage::ExpirySweeper). The raw map is never
/// exposed, so every access path goes through the lock.
///
/// # Example
///
/// ```
/// use kvstor::storage::StorageEngine;
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// let engine = StorageEngine::new();
///
/// engine.set("name", Bytes::from("value"), Duration::from_secs(60));
/// assert_eq!(engine.get("name"), Some(Bytes::from("value")));
///
/// assert!(engine.delete("name").is_ok());
/// assert!(engine.delete("name").is_err());
/// ```
pub struct StorageEngine {
    data: Mutex<HashMap<String, Entry>>,

    get_count: AtomicU64,
    set_count: AtomicU64,
    del_count: AtomicU64,
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("keys", &self.len())
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .field("del_count", &self.del_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    /// Inserts or wholesale replaces the entry for `key`.
    ///
    /// The entry's creation time is taken now. A zero `ttl` stores an entry
    /// that is already expired.
    pub fn set(&self, key: impl Into<String>, value: Bytes, ttl: Duration) {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        let entry = Entry::new(value, ttl);
        self.data.lock().insert(key.into(), entry);
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired. An expired
    /// entry found here is removed (lazy expiry).
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let mut data = self.data.lock();
        let entry = data.get(key)?;

        if entry.is_expired() {
            data.remove(key);
            self.expired_count.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        Some(entry.value.clone())
    }

    /// Deletes a key.
    ///
    /// Only existence is checked: an entry that has expired but has not been
    /// evicted yet is still deleted successfully.
    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.del_count.fetch_add(1, Ordering::Relaxed);

        match self.data.lock().remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::KeyNotFound),
        }
    }

    /// Removes every expired entry in one pass under the lock.
    ///
    /// Called by the background expiry sweeper. Returns the number of
    /// entries removed.
    pub fn cleanup_expired(&self) -> u64 {
        let now = Instant::now();

        let mut data = self.data.lock();
        let before = data.len();
        data.retain(|_, entry| !entry.is_expired_at(now));
        let cleaned = (before - data.len()) as u64;
        drop(data);

        if cleaned > 0 {
            self.expired_count.fetch_add(cleaned, Ordering::Relaxed);
        }

        cleaned
    }

    /// Number of entries physically held, including expired ones not yet evicted.
    pub fn len(&self) -> u64 {
        self.data.lock().len() as u64
    }

    /// Returns true if no entries are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.len(),
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_set_and_get() {
        let engine = StorageEngine::new();

        engine.set("key", Bytes::from("value"), HOUR);
        assert_eq!(engine.get("key"), Some(Bytes::from("value")));
    }

    #[test]
    fn test_get_nonexistent() {
        let engine = StorageEngine::new();
        assert_eq!(engine.get("nonexistent"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let engine = StorageEngine::new();

        engine.set("key", Bytes::from("old"), Duration::from_millis(10));
        engine.set("key", Bytes::from("new"), HOUR);

        thread::sleep(Duration::from_millis(30));

        // The replacement carries its own TTL, nothing of the old record survives
        assert_eq!(engine.get("key"), Some(Bytes::from("new")));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_delete() {
        let engine = StorageEngine::new();

        engine.set("key", Bytes::from("value"), HOUR);
        assert_eq!(engine.delete("key"), Ok(()));
        assert_eq!(engine.get("key"), None);
        assert_eq!(engine.delete("key"), Err(StorageError::KeyNotFound));
    }

    #[test]
    fn test_delete_missing_leaves_store_unchanged() {
        let engine = StorageEngine::new();
        engine.set("other", Bytes::from("value"), HOUR);

        assert_eq!(engine.delete("zzz"), Err(StorageError::KeyNotFound));
        assert_eq!(engine.len(), 1);
        assert_eq!(StorageError::KeyNotFound.to_string(), "no such key");
    }

    #[test]
    fn test_delete_expired_but_present() {
        let engine = StorageEngine::new();

        engine.set("key", Bytes::from("value"), Duration::ZERO);
        assert_eq!(engine.delete("key"), Ok(()));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let engine = StorageEngine::new();

        engine.set("key", Bytes::from("value"), Duration::ZERO);
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.get("key"), None);
        assert_eq!(engine.len(), 0);
    }

    #[test]
    fn test_expiry() {
        let engine = StorageEngine::new();

        engine.set("key", Bytes::from("value"), Duration::from_millis(50));

        // Live before the TTL elapses
        assert_eq!(engine.get("key"), Some(Bytes::from("value")));

        thread::sleep(Duration::from_millis(100));

        // Gone afterwards, and removed by the read
        assert_eq!(engine.get("key"), None);
        assert!(engine.is_empty());
        assert_eq!(engine.stats().expired, 1);
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let engine = StorageEngine::new();

        engine.set("key", Bytes::from("value"), Duration::from_secs(u64::MAX));
        assert_eq!(engine.get("key"), Some(Bytes::from("value")));
        assert_eq!(engine.cleanup_expired(), 0);
    }

    #[test]
    fn test_entry_liveness_boundary() {
        let entry = Entry::new(Bytes::from("v"), Duration::from_secs(10));
        let exp = entry.expires_at().unwrap();

        assert!(!entry.is_expired_at(entry.created_at));
        assert!(!entry.is_expired_at(exp - Duration::from_nanos(1)));
        assert!(entry.is_expired_at(exp));
    }

    #[test]
    fn test_cleanup_expired() {
        let engine = StorageEngine::new();

        engine.set("key1", Bytes::from("value1"), Duration::from_millis(10));
        engine.set("key2", Bytes::from("value2"), Duration::from_millis(10));
        engine.set("key3", Bytes::from("value3"), HOUR);

        thread::sleep(Duration::from_millis(50));

        let cleaned = engine.cleanup_expired();
        assert_eq!(cleaned, 2);
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.get("key3"), Some(Bytes::from("value3")));
    }

    #[test]
    fn test_stats() {
        let engine = StorageEngine::new();

        engine.set("a", Bytes::from("1"), HOUR);
        engine.set("b", Bytes::from("2"), HOUR);
        engine.get("a");
        let _ = engine.delete("b");
        let _ = engine.delete("b");

        let stats = engine.stats();
        assert_eq!(stats.keys, 1);
        assert_eq!(stats.set_ops, 2);
        assert_eq!(stats.get_ops, 1);
        assert_eq!(stats.del_ops, 2);
        assert_eq!(stats.expired, 0);
    }

    #[test]
    fn test_concurrent_access() {
        let engine = Arc::new(StorageEngine::new());
        let mut handles = vec![];

        for i in 0..10 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    let value = Bytes::from(key.clone());
                    engine.set(key.as_str(), value, HOUR);

                    // Every lookup sees the value written under its own key
                    assert_eq!(engine.get(&key), Some(Bytes::from(key.clone())));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.len(), 1000);
    }

    #[test]
    fn test_concurrent_same_key() {
        let engine = Arc::new(StorageEngine::new());
        let mut handles = vec![];

        for i in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                for _ in 0..500 {
                    engine.set("shared", Bytes::from(format!("writer-{}", i)), HOUR);
                    if let Some(v) = engine.get("shared") {
                        assert!(v.starts_with(b"writer-"));
                    }
                    let _ = engine.delete("shared");
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(engine.len() <= 1);
    }
}
