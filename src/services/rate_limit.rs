//! Store-backed rate limiting
//!
//! Bounds abuse of the sensitive endpoints (login, registration, reset)
//! with counters in the shared ephemeral store, so the limit holds across
//! every process serving the tenant. The increment is the store's atomic
//! `INCR`; only the caller that created the counter sets the window expiry,
//! so there is no caller-side read-then-write to race.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::error::{Error, Result};
use crate::domain::ports::EphemeralStore;
use crate::infrastructure::store::rate_limit_key;

/// Counter-based limiter over the shared ephemeral store
pub struct RateLimiter {
    store: Arc<dyn EphemeralStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn EphemeralStore>) -> Self {
        Self { store }
    }

    /// Count one attempt for `(purpose, identifier)` and fail with
    /// `RateLimited` once the window holds more than `limit` attempts.
    ///
    /// The first increment in a window starts the window's expiry; under N
    /// concurrent callers exactly `limit` succeed.
    pub async fn check_and_increment(
        &self,
        purpose: &str,
        identifier: &str,
        limit: u32,
        window: Duration,
    ) -> Result<()> {
        let key = rate_limit_key(purpose, identifier);
        let count = self.store.incr(&key).await?;

        if count == 1 {
            self.store.expire(&key, window).await?;
        }

        if count > i64::from(limit) {
            tracing::warn!(purpose, identifier, count, limit, "rate limit exceeded");
            return Err(Error::RateLimited);
        }

        Ok(())
    }
}
