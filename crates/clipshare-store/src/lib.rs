//! # clipshare-store
//!
//! Key-value store layer for clipshare.
//!
//! This crate provides:
//! - [`RedisStore`], the production [`KvStore`] backend
//! - [`MemoryStore`], an in-process backend with the same transaction semantics
//! - [`CollectionRepository`], the optimistic add/delete protocol
//! - [`CollectionLifecycle`], collection creation and reads
//!
//! ## Example
//!
//! ```rust,ignore
//! use clipshare_store::{ClipStore, RedisStore, NewClipItem};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RedisStore::connect("redis://localhost:6379").await?;
//!     let clips = ClipStore::new(std::sync::Arc::new(store), "https://clip.example.com");
//!
//!     let created = clips.lifecycle.create().await?;
//!     clips.collections.add_item(&created.id, NewClipItem::text("hello")).await?;
//!
//!     println!("Share: {}", created.url);
//!     Ok(())
//! }
//! ```

pub mod collections;
pub mod lifecycle;
pub mod memory;
pub mod record;
pub mod redis_store;

// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_REDIS_URL
pub mod test_fixtures;

use std::sync::Arc;

pub use collections::CollectionRepository;
pub use lifecycle::CollectionLifecycle;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

// Re-export core types
pub use clipshare_core::*;

/// Store handle plus the repositories built on it.
#[derive(Clone)]
pub struct ClipStore {
    /// The underlying key-value store.
    pub store: Arc<dyn KvStore>,
    /// Item add/delete protocol.
    pub collections: CollectionRepository,
    /// Collection creation and reads.
    pub lifecycle: CollectionLifecycle,
}

impl ClipStore {
    /// Build repositories over `store`, issuing share URLs under `base_url`.
    pub fn new(store: Arc<dyn KvStore>, base_url: impl Into<String>) -> Self {
        Self {
            collections: CollectionRepository::new(Arc::clone(&store)),
            lifecycle: CollectionLifecycle::new(Arc::clone(&store), base_url),
            store,
        }
    }

    /// Override the lifetime given to new collections.
    pub fn with_collection_ttl(mut self, ttl_secs: u64) -> Self {
        self.lifecycle = self.lifecycle.with_ttl_secs(ttl_secs);
        self
    }

    /// An in-memory store, for tests and local runs.
    pub fn in_memory(base_url: impl Into<String>) -> (Self, MemoryStore) {
        let memory = MemoryStore::new();
        (Self::new(Arc::new(memory.clone()), base_url), memory)
    }
}
