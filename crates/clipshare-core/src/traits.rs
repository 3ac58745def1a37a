//! Key-value store abstraction.
//!
//! These traits define the small surface the collection repository needs
//! from a store: plain reads and writes, TTL inspection, and an optimistic
//! transaction scope in the style of Redis `WATCH` / `MULTI` / `EXEC`.
//! Backends live in `clipshare-store`.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Remaining lifetime of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key exists and expires after this long (millisecond precision).
    Expires(Duration),
    /// Key exists without an expiry.
    NoExpiry,
    /// Key does not exist.
    Missing,
}

impl KeyTtl {
    /// Interpret a Redis `PTTL` reply (`-2` missing, `-1` no expiry).
    pub fn from_pttl_reply(reply: i64) -> Self {
        match reply {
            -1 => KeyTtl::NoExpiry,
            n if n >= 0 => KeyTtl::Expires(Duration::from_millis(n as u64)),
            _ => KeyTtl::Missing,
        }
    }

    /// Time left, if the key has an expiry.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            KeyTtl::Expires(left) => Some(*left),
            _ => None,
        }
    }

    /// Seconds left, rounded to the nearest second as Redis `TTL` reports it.
    pub fn seconds(&self) -> Option<u64> {
        self.remaining()
            .map(|left| ((left.as_millis() + 500) / 1000) as u64)
    }
}

/// A write queued inside a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOp {
    Set { key: String, value: Vec<u8> },
    Expire { key: String, ttl: Duration },
}

/// Writes queued for atomic execution against a watched key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    ops: Vec<TxOp>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `SET key value`. Like Redis, this clears any expiry on the key.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.ops.push(TxOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Queue `PEXPIRE key ttl`, in whole milliseconds.
    pub fn expire(mut self, key: impl Into<String>, ttl: Duration) -> Self {
        self.ops.push(TxOp::Expire {
            key: key.into(),
            ttl,
        });
        self
    }

    pub fn ops(&self) -> &[TxOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Result of executing a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    /// All queued writes were applied atomically.
    Committed,
    /// The watched key changed after the watch began; nothing was written.
    Aborted,
}

/// An open optimistic-transaction scope on a single key.
///
/// A session owns whatever connection state the watch lives on. Consuming
/// it through [`execute`](WatchSession::execute) or
/// [`unwatch`](WatchSession::unwatch) releases the watch, and so does
/// dropping it: implementations must not leave watch state behind when a
/// session is dropped on an error path or by a cancelled request.
#[async_trait]
pub trait WatchSession: Send {
    /// The watched key.
    fn key(&self) -> &str;

    /// Read the watched key's current value.
    async fn get(&mut self) -> Result<Option<Vec<u8>>>;

    /// Read the watched key's remaining lifetime, to the millisecond.
    async fn ttl(&mut self) -> Result<KeyTtl>;

    /// Atomically apply `tx` unless the watched key changed since the watch.
    async fn execute(self: Box<Self>, tx: Transaction) -> Result<TxOutcome>;

    /// Release the watch without writing.
    async fn unwatch(self: Box<Self>) -> Result<()>;
}

/// Key-value store operations used by the collection repository.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a value with an expiry in seconds.
    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<()>;

    /// Read a key's remaining lifetime.
    async fn ttl(&self, key: &str) -> Result<KeyTtl>;

    /// Delete a key, returning whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<()>;

    /// Begin watching `key` for concurrent modification.
    async fn watch(&self, key: &str) -> Result<Box<dyn WatchSession>>;
}
