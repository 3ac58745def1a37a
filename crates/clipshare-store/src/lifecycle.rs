//! Collection lifecycle: creation and reads.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use clipshare_core::{
    collection_key, defaults, is_valid_collection_id, new_collection_id, share_url,
    CreatedCollection, Error, KeyTtl, KvStore, Result, SharedClipCollection,
};

use crate::record;

/// Creates collections and reads them back.
#[derive(Clone)]
pub struct CollectionLifecycle {
    store: Arc<dyn KvStore>,
    base_url: String,
    ttl_secs: u64,
}

impl CollectionLifecycle {
    /// Create a lifecycle manager issuing share URLs under `base_url` with
    /// the default 7-day lifetime.
    pub fn new(store: Arc<dyn KvStore>, base_url: impl Into<String>) -> Self {
        Self {
            store,
            base_url: base_url.into(),
            ttl_secs: defaults::COLLECTION_TTL_SECS,
        }
    }

    /// Override the lifetime given to new collections.
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Create an empty collection with a fresh id and persist it.
    #[instrument(skip_all, fields(subsystem = "store", component = "lifecycle", op = "create"))]
    pub async fn create(&self) -> Result<CreatedCollection> {
        let id = new_collection_id();
        let collection = SharedClipCollection::empty(id.clone());
        let bytes = record::encode(&collection)?;

        self.store
            .set_with_expiry(&collection_key(&id), &bytes, self.ttl_secs)
            .await?;

        let url = share_url(&self.base_url, &id);
        info!(collection_id = %id, ttl_secs = self.ttl_secs, "Collection created");
        Ok(CreatedCollection {
            id,
            url,
            collection,
        })
    }

    /// Fetch and decode a collection.
    #[instrument(
        skip_all,
        fields(subsystem = "store", component = "lifecycle", op = "read", collection_id = %collection_id)
    )]
    pub async fn read(&self, collection_id: &str) -> Result<SharedClipCollection> {
        if !is_valid_collection_id(collection_id) {
            return Err(Error::NotFound(collection_id.to_string()));
        }

        let raw = self
            .store
            .get(&collection_key(collection_id))
            .await?
            .ok_or_else(|| Error::NotFound(collection_id.to_string()))?;
        let collection = record::decode(&raw)?;
        debug!(item_count = collection.items.len(), "Collection read");
        Ok(collection)
    }

    /// Remaining lifetime of a collection.
    pub async fn expires_in(&self, collection_id: &str) -> Result<KeyTtl> {
        if !is_valid_collection_id(collection_id) {
            return Ok(KeyTtl::Missing);
        }
        self.store.ttl(&collection_key(collection_id)).await
    }
}
