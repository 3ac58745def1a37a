//! Collection repository: optimistic read-modify-write of collection records.
//!
//! Every mutation follows the same cycle against the record's key:
//!
//! 1. `WATCH` the key.
//! 2. Read and decode the record (`NotFound` / `Corrupted` on failure).
//! 3. Apply the change in memory.
//! 4. Read the remaining TTL (`PTTL`) so the rewrite keeps, and never
//!    extends, the collection's lifetime.
//! 5. `MULTI` / `SET` / `PEXPIRE` / `EXEC`. A nil `EXEC` means another writer
//!    got there first and the caller receives [`Error::Conflict`].
//!
//! The watch is released on every exit path: explicitly with `UNWATCH` when
//! the cycle stops early, by `EXEC` when it runs to the end, and by dropping
//! the session if the request itself is cancelled.
//!
//! Nothing here retries. A conflict is reported as-is so the caller can
//! decide whether to re-run the whole operation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, field, instrument, warn, Span};

use clipshare_core::{
    collection_key, is_valid_collection_id, logging, ClipboardItem, Error, KeyTtl, KvStore,
    NewClipItem, Result, SharedClipCollection, Transaction, TxOutcome, WatchSession,
};

use crate::record;

/// Applies single-item mutations to shared collections.
#[derive(Clone)]
pub struct CollectionRepository {
    store: Arc<dyn KvStore>,
}

impl CollectionRepository {
    /// Create a repository over the given store handle.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Prepend a new item to a collection.
    ///
    /// The item gets a fresh id and `createdAt` at the moment the record is
    /// rewritten. Items are never deduplicated and the list is not capped.
    #[instrument(
        skip_all,
        fields(
            subsystem = "store",
            component = "repository",
            op = "add_item",
            collection_id = %collection_id,
            item_id = field::Empty,
            outcome = field::Empty,
        )
    )]
    pub async fn add_item(
        &self,
        collection_id: &str,
        new_item: NewClipItem,
    ) -> Result<ClipboardItem> {
        new_item.validate()?;

        self.mutate(collection_id, move |collection| {
            let item = new_item.into_item();
            Span::current().record(logging::ITEM_ID, item.id.as_str());
            collection.prepend(item.clone());
            Ok(item)
        })
        .await
    }

    /// Remove an item from a collection by id.
    ///
    /// A missing item is [`Error::ItemNotFound`], so deleting the same id
    /// twice reports not-found the second time.
    #[instrument(
        skip_all,
        fields(
            subsystem = "store",
            component = "repository",
            op = "delete_item",
            collection_id = %collection_id,
            item_id = %item_id,
            outcome = field::Empty,
        )
    )]
    pub async fn delete_item(&self, collection_id: &str, item_id: &str) -> Result<()> {
        self.mutate(collection_id, |collection| {
            collection
                .remove_item(item_id)
                .map(|_| ())
                .ok_or_else(|| Error::ItemNotFound(item_id.to_string()))
        })
        .await
    }

    async fn mutate<T, F>(&self, collection_id: &str, apply: F) -> Result<T>
    where
        F: FnOnce(&mut SharedClipCollection) -> Result<T>,
    {
        if !is_valid_collection_id(collection_id) {
            return Err(Error::NotFound(collection_id.to_string()));
        }
        let key = collection_key(collection_id);

        let mut session = self.store.watch(&key).await?;
        let prepared = prepare(session.as_mut(), collection_id, apply).await;
        let (tx, value) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                release(session).await;
                return Err(e);
            }
        };

        match session.execute(tx).await? {
            TxOutcome::Committed => {
                Span::current().record(logging::OUTCOME, "committed");
                debug!("Collection record rewritten");
                Ok(value)
            }
            TxOutcome::Aborted => {
                Span::current().record(logging::OUTCOME, "aborted");
                warn!("Concurrent modification, transaction aborted");
                Err(Error::Conflict(format!(
                    "collection {} was modified concurrently; retry the operation",
                    collection_id
                )))
            }
        }
    }
}

/// Shortest expiry re-applied on rewrite; `PEXPIRE 0` would delete the key.
const MIN_CARRIED_TTL: Duration = Duration::from_millis(1);

/// Read, decode, and modify the watched record, then queue its rewrite.
async fn prepare<T, F>(
    session: &mut dyn WatchSession,
    collection_id: &str,
    apply: F,
) -> Result<(Transaction, T)>
where
    F: FnOnce(&mut SharedClipCollection) -> Result<T>,
{
    let raw = session
        .get()
        .await?
        .ok_or_else(|| Error::NotFound(collection_id.to_string()))?;
    let mut collection = record::decode(&raw)?;

    let value = apply(&mut collection)?;

    let ttl = match session.ttl().await? {
        // Expired between the read and now; EXEC would abort anyway
        KeyTtl::Missing => return Err(Error::NotFound(collection_id.to_string())),
        ttl => ttl,
    };
    debug!(
        ttl_ms = ?ttl.remaining().map(|left| left.as_millis()),
        item_count = collection.items.len(),
        "Queueing collection rewrite"
    );

    let key = session.key().to_string();
    let mut tx = Transaction::new().set(key.clone(), record::encode(&collection)?);
    if let KeyTtl::Expires(left) = ttl {
        // SET clears the expiry; re-apply what remains. A key in its final
        // millisecond reports 0, which must not turn into a persistent key.
        tx = tx.expire(key, left.max(MIN_CARRIED_TTL));
    }
    Ok((tx, value))
}

async fn release(session: Box<dyn WatchSession>) {
    let key = session.key().to_string();
    if let Err(e) = session.unwatch().await {
        warn!(key = %key, error = %e, "Failed to release watch");
    }
}
