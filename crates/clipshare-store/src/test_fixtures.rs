//! Test fixtures for store integration tests.
//!
//! [`FaultyStore`] fails on demand, for connection-failure paths.
//!
//! The Redis URL for live tests is read from `REDIS_URL`. If not set,
//! defaults to [`DEFAULT_TEST_REDIS_URL`]. Live tests are `#[ignore]`d and
//! run with `cargo test -- --ignored`.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use clipshare_core::{Error, KeyTtl, KvStore, Result, Transaction, TxOutcome, WatchSession};

use crate::{ClipStore, MemoryStore, RedisStore};

/// Default test Redis URL when REDIS_URL is not set.
///
/// Uses database 15 to stay clear of data in the default database.
pub const DEFAULT_TEST_REDIS_URL: &str = "redis://localhost:6379/15";

/// Redis URL for live tests.
pub fn test_redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_TEST_REDIS_URL.to_string())
}

/// A live Redis store plus repositories, for `#[ignore]`d tests.
pub struct TestRedis {
    pub redis: RedisStore,
    pub clips: ClipStore,
    created: Vec<String>,
}

impl TestRedis {
    /// Connect to the test Redis.
    pub async fn connect() -> Result<Self> {
        let redis = RedisStore::connect(&test_redis_url()).await?;
        let clips = ClipStore::new(Arc::new(redis.clone()), "http://localhost:3000");
        Ok(Self {
            redis,
            clips,
            created: Vec::new(),
        })
    }

    /// Remember a key to delete in [`cleanup`](Self::cleanup).
    pub fn track(&mut self, key: impl Into<String>) {
        self.created.push(key.into());
    }

    /// Delete every tracked key.
    pub async fn cleanup(self) -> Result<()> {
        for key in &self.created {
            self.redis.delete(key).await?;
        }
        Ok(())
    }
}

/// Where a [`FaultyStore`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every call fails, as if the server were down.
    Unreachable,
    /// The read inside a watch session fails.
    WatchedGet,
    /// The TTL read inside a watch session fails.
    WatchedTtl,
}

/// A [`MemoryStore`] that returns [`Error::StoreUnavailable`] at an
/// injected point, for exercising connection-failure paths without Redis.
#[derive(Clone, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    fault: Arc<Mutex<Option<Fault>>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The backing store, for seeding data and counting open watches.
    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    /// Fail from now on at `fault`.
    pub fn inject(&self, fault: Fault) {
        *self.lock() = Some(fault);
    }

    /// Stop failing.
    pub fn heal(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> MutexGuard<'_, Option<Fault>> {
        self.fault
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, at: Fault) -> Result<()> {
        if *self.lock() == Some(at) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

fn unavailable() -> Error {
    Error::StoreUnavailable("connection refused".to_string())
}

#[async_trait]
impl KvStore for FaultyStore {
    fn backend_name(&self) -> &'static str {
        "faulty"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check(Fault::Unreachable)?;
        self.inner.get(key).await
    }

    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<()> {
        self.check(Fault::Unreachable)?;
        self.inner.set_with_expiry(key, value, ttl_secs).await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        self.check(Fault::Unreachable)?;
        self.inner.ttl(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check(Fault::Unreachable)?;
        self.inner.delete(key).await
    }

    async fn ping(&self) -> Result<()> {
        self.check(Fault::Unreachable)?;
        self.inner.ping().await
    }

    async fn watch(&self, key: &str) -> Result<Box<dyn WatchSession>> {
        self.check(Fault::Unreachable)?;
        Ok(Box::new(FaultySession {
            inner: self.inner.watch(key).await?,
            store: self.clone(),
        }))
    }
}

struct FaultySession {
    inner: Box<dyn WatchSession>,
    store: FaultyStore,
}

#[async_trait]
impl WatchSession for FaultySession {
    fn key(&self) -> &str {
        self.inner.key()
    }

    async fn get(&mut self) -> Result<Option<Vec<u8>>> {
        self.store.check(Fault::WatchedGet)?;
        self.inner.get().await
    }

    async fn ttl(&mut self) -> Result<KeyTtl> {
        self.store.check(Fault::WatchedTtl)?;
        self.inner.ttl().await
    }

    async fn execute(self: Box<Self>, tx: Transaction) -> Result<TxOutcome> {
        let session = *self;
        session.store.check(Fault::Unreachable)?;
        session.inner.execute(tx).await
    }

    async fn unwatch(self: Box<Self>) -> Result<()> {
        let session = *self;
        session.inner.unwatch().await
    }
}
