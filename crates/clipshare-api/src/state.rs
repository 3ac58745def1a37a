//! Shared handler state.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{Quota, RateLimiter};

use clipshare_core::{Error, Result};
use clipshare_store::ClipStore;

use crate::config::RateLimitConfig;

/// Global rate limiter type (direct quota, no per-client bucketing).
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Collection repositories over the configured store.
    pub clips: ClipStore,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(clips: ClipStore) -> Self {
        Self {
            clips,
            rate_limiter: None,
        }
    }

    /// Install a global rate limiter if `config` enables one.
    pub fn with_rate_limit(mut self, config: &RateLimitConfig) -> Result<Self> {
        if !config.enabled {
            self.rate_limiter = None;
            return Ok(self);
        }

        self.rate_limiter = Some(Arc::new(RateLimiter::direct(quota(config)?)));
        Ok(self)
    }
}

/// `requests` per `period_secs`, refilled evenly across the period.
///
/// Up to `requests` may arrive at once; after that one cell comes back
/// every `period / requests`, so a full period restores the whole allowance.
fn quota(config: &RateLimitConfig) -> Result<Quota> {
    let burst = u32::try_from(config.requests)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| {
            Error::Config(format!(
                "RATE_LIMIT_REQUESTS must be between 1 and {}",
                u32::MAX
            ))
        })?;
    let replenish = Duration::from_secs(config.period_secs) / burst.get();
    let quota = Quota::with_period(replenish)
        .ok_or_else(|| Error::Config("RATE_LIMIT_PERIOD_SECS must be non-zero".to_string()))?
        .allow_burst(burst);
    Ok(quota)
}
