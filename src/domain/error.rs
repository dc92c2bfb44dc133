//! Error handling types
//!
//! Every failure in this core is terminal for the current request; nothing
//! is retried internally. Resolution failures, token failures, and rate
//! limiting are distinct variants because the caller's recovery differs.

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tenancy and credential core
#[derive(Error, Debug)]
pub enum Error {
    #[error("tenant not found")]
    TenantNotFound,

    #[error("tenant mismatch")]
    TenantMismatch,

    #[error("tenant claim missing from token")]
    MissingTenantClaim,

    #[error("missing tenant identifier")]
    MissingTenantIdentifier,

    #[error("invalid token: {reason}")]
    InvalidToken { reason: String },

    /// The signed token verified but its liveness record is gone. Logged
    /// distinctly from `InvalidToken`; callers surface both the same way.
    #[error("token revoked")]
    TokenRevoked,

    #[error("rate limit exceeded")]
    RateLimited,

    /// Deliberately does not say which of the two cases occurred.
    #[error("reset ticket invalid or expired")]
    TicketExpiredOrConsumed,

    /// Deliberately covers both unknown user and wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user inactive")]
    UserInactive,

    #[error("invalid tenant slug")]
    InvalidTenantSlug,

    #[error("tenant slug already exists")]
    TenantSlugTaken,

    #[error("role {key} not provisioned for tenant")]
    RoleNotProvisioned { key: String },

    /// A scoped data operation ran with no tenant scope bound to the task.
    /// This is a programming error at the call site, not a request failure.
    #[error("no tenant scope bound to the current task")]
    MissingTenantScope,

    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("store error: {message}")]
    Store { message: String },

    #[error("password hashing error: {message}")]
    PasswordHash { message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create an invalid token error
    pub fn invalid_token<S: Into<String>>(reason: S) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a password hashing error
    pub fn password_hash<S: Into<String>>(message: S) -> Self {
        Self::PasswordHash {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
