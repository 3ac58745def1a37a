//! In-process key-value store.
//!
//! Mirrors the Redis semantics the repository depends on: `SET` clears an
//! expiry, `PEXPIRE 0` deletes, and a transaction aborts when its watched key
//! was written, deleted, or expired after the watch began. Every key carries
//! a version counter that any of those events bumps; a watch session
//! remembers the version it saw and `execute` compares.
//!
//! Reads inside a watch session yield to the scheduler first, the way a
//! network round-trip would, so concurrent operations on one runtime really
//! do overlap inside each other's watch windows.
//!
//! Used by the test suites and by `STORE_BACKEND=memory` for local runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::time::{Duration, Instant};
use tracing::trace;

use clipshare_core::{Error, KeyTtl, KvStore, Result, Transaction, TxOp, TxOutcome, WatchSession};

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    versions: HashMap<String, u64>,
    /// Writes that land right before the next transaction executes.
    interleaved: Vec<(String, Vec<u8>)>,
}

impl State {
    fn bump(&mut self, key: &str) {
        *self.versions.entry(key.to_string()).or_insert(0) += 1;
    }

    fn version(&self, key: &str) -> u64 {
        self.versions.get(key).copied().unwrap_or(0)
    }

    fn purge_if_expired(&mut self, key: &str, now: Instant) {
        let expired = matches!(
            self.entries.get(key),
            Some(Entry { expires_at: Some(at), .. }) if *at <= now
        );
        if expired {
            self.entries.remove(key);
            self.bump(key);
        }
    }

    fn live(&mut self, key: &str) -> Option<&Entry> {
        self.purge_if_expired(key, Instant::now());
        self.entries.get(key)
    }

    fn put(&mut self, key: &str, value: Vec<u8>, expires_at: Option<Instant>) {
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        self.bump(key);
    }

    fn remove(&mut self, key: &str) -> bool {
        let existed = self.live(key).is_some();
        if existed {
            self.entries.remove(key);
            self.bump(key);
        }
        existed
    }

    fn ttl(&mut self, key: &str) -> KeyTtl {
        let now = Instant::now();
        match self.live(key) {
            None => KeyTtl::Missing,
            Some(Entry { expires_at: None, .. }) => KeyTtl::NoExpiry,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => KeyTtl::Expires(at.saturating_duration_since(now)),
        }
    }

    fn expire(&mut self, key: &str, ttl: Duration) {
        if ttl.is_zero() {
            self.remove(key);
            return;
        }
        let deadline = Instant::now() + ttl;
        let touched = match self.entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(deadline);
                true
            }
            None => false,
        };
        if touched {
            self.bump(key);
        }
    }

    fn apply(&mut self, tx: &Transaction) {
        for op in tx.ops() {
            match op {
                TxOp::Set { key, value } => self.put(key, value.clone(), None),
                TxOp::Expire { key, ttl } => {
                    self.purge_if_expired(key, Instant::now());
                    self.expire(key, *ttl);
                }
            }
        }
    }
}

/// In-memory [`KvStore`] with Redis-compatible optimistic transactions.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    open_watches: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State is plain data; a panic mid-update cannot leave it half-written
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of watch sessions currently open.
    pub fn open_watches(&self) -> usize {
        self.open_watches.load(Ordering::SeqCst)
    }

    /// Write a value without touching its expiry, as another client would.
    pub fn write_raw(&self, key: &str, value: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        let expires_at = state.live(key).and_then(|entry| entry.expires_at);
        state.put(key, value.into(), expires_at);
    }

    /// Arrange for `value` to be written to `key` by a simulated concurrent
    /// client just before the next transaction executes.
    ///
    /// Lets tests place a competing write inside a repository operation's
    /// watch window deterministically.
    pub fn interleave_write(&self, key: &str, value: impl Into<Vec<u8>>) {
        self.lock()
            .interleaved
            .push((key.to_string(), value.into()));
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock().live(key).map(|entry| entry.value.clone()))
    }

    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<()> {
        if ttl_secs == 0 {
            return Err(Error::InvalidInput(
                "expiry must be at least one second".to_string(),
            ));
        }
        let deadline = Instant::now() + Duration::from_secs(ttl_secs);
        self.lock().put(key, value.to_vec(), Some(deadline));
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        Ok(self.lock().ttl(key))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.lock().remove(key))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn watch(&self, key: &str) -> Result<Box<dyn WatchSession>> {
        let version = {
            let mut state = self.lock();
            state.purge_if_expired(key, Instant::now());
            state.version(key)
        };
        self.open_watches.fetch_add(1, Ordering::SeqCst);
        trace!(key, version, "memory watch opened");
        Ok(Box::new(MemoryWatchSession {
            store: self.clone(),
            key: key.to_string(),
            version,
            _guard: WatchGuard(Arc::clone(&self.open_watches)),
        }))
    }
}

/// Decrements the open-watch count however the session ends.
struct WatchGuard(Arc<AtomicUsize>);

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MemoryWatchSession {
    store: MemoryStore,
    key: String,
    version: u64,
    _guard: WatchGuard,
}

#[async_trait]
impl WatchSession for MemoryWatchSession {
    fn key(&self) -> &str {
        &self.key
    }

    async fn get(&mut self) -> Result<Option<Vec<u8>>> {
        tokio::task::yield_now().await;
        self.store.get(&self.key).await
    }

    async fn ttl(&mut self) -> Result<KeyTtl> {
        self.store.ttl(&self.key).await
    }

    async fn execute(self: Box<Self>, tx: Transaction) -> Result<TxOutcome> {
        let mut state = self.store.lock();

        for (key, value) in std::mem::take(&mut state.interleaved) {
            let expires_at = state.live(&key).and_then(|entry| entry.expires_at);
            state.put(&key, value, expires_at);
        }

        state.purge_if_expired(&self.key, Instant::now());
        if state.version(&self.key) != self.version {
            trace!(key = %self.key, "memory transaction aborted");
            return Ok(TxOutcome::Aborted);
        }

        state.apply(&tx);
        Ok(TxOutcome::Committed)
    }

    async fn unwatch(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
