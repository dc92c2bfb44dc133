//! Ephemeral store providers
//!
//! Two mutually exclusive providers back [`EphemeralStore`]:
//! 1. **Redis**: shared revocation state for multi-node deployments.
//! 2. **In-memory**: single-node and test deployments.
//!
//! Keys are namespaced strings (`purpose:identifier`); the builders here are
//! the only place the key scheme is spelled out.
//!
//! [`EphemeralStore`]: crate::domain::ports::EphemeralStore

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use crate::domain::error::Error;
use crate::infrastructure::constants::{
    PASSWORD_RESET_PREFIX, RATE_LIMIT_PREFIX, REFRESH_LIVENESS_PREFIX,
};

/// Convert Redis errors to domain errors in the infrastructure layer
impl From<::redis::RedisError> for Error {
    fn from(err: ::redis::RedisError) -> Self {
        Self::Store {
            message: err.to_string(),
        }
    }
}

/// Liveness record key for a refresh token id
pub fn refresh_key(token_id: &str) -> String {
    format!("{REFRESH_LIVENESS_PREFIX}:{token_id}")
}

/// Key for an outstanding password reset ticket
pub fn reset_key(ticket: &str) -> String {
    format!("{PASSWORD_RESET_PREFIX}:{ticket}")
}

/// Counter key for a rate-limited purpose and caller identity
pub fn rate_limit_key(purpose: &str, identifier: &str) -> String {
    format!("{RATE_LIMIT_PREFIX}:{purpose}:{identifier}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_builders_namespace_consistently() {
        assert_eq!(refresh_key("abc123"), "refresh:abc123");
        assert_eq!(reset_key("t0k"), "pwdreset:t0k");
        assert_eq!(rate_limit_key("login", "tenant:me@x.io"), "ratelimit:login:tenant:me@x.io");
    }
}
