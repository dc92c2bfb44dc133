//! Application-wide constants and default values
//!
//! Centralizes key prefixes, sizes, and timeouts so the store key scheme
//! and limits stay consistent across the codebase.

use std::time::Duration;

// ============================================================================
// Ephemeral store key scheme
// ============================================================================

/// Prefix for refresh token liveness records: `refresh:{jti}` -> user id.
///
/// The presence of this record is the sole authority on whether a refresh
/// token is still usable; the signed token alone is necessary but not
/// sufficient.
pub const REFRESH_LIVENESS_PREFIX: &str = "refresh";

/// Prefix for password reset tickets: `pwdreset:{ticket}` -> `{tenant}:{user}`
pub const PASSWORD_RESET_PREFIX: &str = "pwdreset";

/// Prefix for rate limit counters: `ratelimit:{purpose}:{identifier}`
pub const RATE_LIMIT_PREFIX: &str = "ratelimit";

// ============================================================================
// Credential material
// ============================================================================

/// Raw entropy of an opaque reset ticket before URL-safe encoding
pub const RESET_TICKET_BYTES: usize = 32;

/// Minimum signing secret length accepted by configuration validation
pub const MIN_SECRET_KEY_LENGTH: usize = 32;

// ============================================================================
// Store operation limits
// ============================================================================

/// Upper bound on acquiring a store connection before the operation fails
pub const STORE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
