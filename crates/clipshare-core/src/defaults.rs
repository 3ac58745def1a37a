//! Centralized default constants for clipshare.
//!
//! **This module is the single source of truth** for shared default values.
//! The store and API crates reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// COLLECTIONS
// =============================================================================

/// Lifetime of a freshly created collection: 7 days.
pub const COLLECTION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Store key prefix for collection records (`clip:<id>`).
pub const COLLECTION_KEY_PREFIX: &str = "clip:";

/// Length of a generated collection id.
pub const COLLECTION_ID_LEN: usize = 16;

/// Longest collection id accepted from a request path.
pub const COLLECTION_ID_MAX_LEN: usize = 64;

/// Path segment between the base URL and the collection id in share URLs.
pub const SHARE_PATH: &str = "clip";

// =============================================================================
// STORE
// =============================================================================

/// Default Redis connection URL.
pub const REDIS_URL: &str = "redis://localhost:6379";

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default HTTP bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Maximum accepted request body (1 MiB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default rate limit: max requests per period.
pub const RATE_LIMIT_REQUESTS: u64 = 100;

/// Default rate limit: period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;
