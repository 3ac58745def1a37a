//! Structured logging field names for clipshare.
//!
//! Spans in the store and API layers share one field vocabulary so log
//! aggregation can query by the same names everywhere:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `request_id` | Correlation ID from the `x-request-id` header |
//! | `subsystem` | `"api"` or `"store"` |
//! | `component` | e.g. `"repository"`, `"lifecycle"`, `"redis"` |
//! | `op` | e.g. `"create"`, `"add_item"`, `"delete_item"` |
//! | `collection_id` | Collection being operated on |
//! | `item_id` | Item being operated on |
//! | `outcome` | Transaction outcome |
//!
//! Fields declared up front in `#[instrument]` use the literal names; the
//! constants below are for fields filled in later with [`Span::record`].
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Store unavailable, corrupted records, 5xx responses |
//! | WARN  | Recoverable issue (lost optimistic race, failed UNWATCH) |
//! | INFO  | Lifecycle events (startup, shutdown), collection creation |
//! | DEBUG | Mutation outcomes, 4xx responses, config choices |
//! | TRACE | Per-command store traffic |
//!
//! [`Span::record`]: https://docs.rs/tracing/latest/tracing/struct.Span.html#method.record

/// Item id, known only once the item has been built.
pub const ITEM_ID: &str = "item_id";

/// Transaction outcome ("committed", "aborted").
pub const OUTCOME: &str = "outcome";
