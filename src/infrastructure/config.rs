//! Runtime configuration
//!
//! Settings are layered: compiled defaults, then an optional `tenantry.toml`
//! file, then `TENANTRY_`-prefixed environment variables. The resulting
//! struct is validated once at load time, and insecure-but-runnable choices
//! (a default signing secret in production) surface as logged security
//! warnings rather than hard failures.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::domain::error::{Error, Result};
use crate::infrastructure::constants::MIN_SECRET_KEY_LENGTH;

/// Development-only signing secret baked into the defaults
const DEV_SECRET_KEY: &str = "local-development-secret-change-this-in-production";

/// Runtime configuration for the tenancy and credential core
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    pub environment: String,

    /// Signing key for access/refresh tokens
    #[validate(length(min = 32))]
    pub secret_key: String,

    /// Signature algorithm name understood by the token codec
    #[validate(length(min = 1))]
    pub jwt_algorithm: String,

    #[validate(range(min = 1))]
    pub access_token_ttl_minutes: u64,

    #[validate(range(min = 1))]
    pub refresh_token_ttl_minutes: u64,

    #[validate(length(min = 1))]
    pub jwt_issuer: String,

    #[validate(length(min = 1))]
    pub jwt_audience: String,

    pub redis_url: String,

    #[validate(range(min = 1))]
    pub reset_ticket_ttl_seconds: u64,

    /// Login attempts allowed per `(tenant, email)` per minute
    #[validate(range(min = 1))]
    pub rate_limit_auth_per_minute: u32,

    /// Tenant registrations allowed per source address per hour
    #[validate(range(min = 1))]
    pub rate_limit_register_per_hour: u32,

    /// Reset requests allowed per `(tenant, email)` per reset window
    #[validate(range(min = 1))]
    pub rate_limit_reset_requests: u32,

    #[validate(range(min = 1))]
    pub rate_limit_reset_window_seconds: u64,

    pub billing_free_trial_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            secret_key: DEV_SECRET_KEY.to_string(),
            jwt_algorithm: "HS256".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_minutes: 60 * 24 * 30,
            jwt_issuer: "tenantry".to_string(),
            jwt_audience: "tenantry-clients".to_string(),
            redis_url: "redis://localhost:6379/0".to_string(),
            reset_ticket_ttl_seconds: 3600,
            rate_limit_auth_per_minute: 10,
            rate_limit_register_per_hour: 5,
            rate_limit_reset_requests: 5,
            rate_limit_reset_window_seconds: 900,
            billing_free_trial_days: 7,
        }
    }
}

impl Settings {
    /// Load settings from defaults, `tenantry.toml`, and the environment
    pub fn load() -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("tenantry.toml"))
            .merge(Env::prefixed("TENANTRY_"))
            .extract()
            .map_err(|e| Error::config(e.to_string()))?;

        settings
            .validate()
            .map_err(|e| Error::config(e.to_string()))?;

        Ok(settings)
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_minutes * 60)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_minutes * 60)
    }

    pub fn reset_ticket_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_ticket_ttl_seconds)
    }

    /// Validate configuration for production use
    ///
    /// Returns warnings when the configuration uses insecure defaults.
    /// Should be called at startup to alert operators of security issues.
    pub fn security_warnings(&self) -> Vec<SecurityWarning> {
        let mut warnings = Vec::new();

        if self.secret_key == DEV_SECRET_KEY {
            warnings.push(SecurityWarning {
                code: "DEFAULT_SECRET_KEY",
                message: "Using the development signing secret. Set TENANTRY_SECRET_KEY."
                    .to_string(),
                severity: WarningSeverity::Critical,
            });
        }

        if self.secret_key.len() < MIN_SECRET_KEY_LENGTH {
            warnings.push(SecurityWarning {
                code: "SECRET_KEY_TOO_SHORT",
                message: format!(
                    "Signing secret is {} bytes, minimum {} recommended",
                    self.secret_key.len(),
                    MIN_SECRET_KEY_LENGTH
                ),
                severity: WarningSeverity::High,
            });
        }

        if self.access_token_ttl_minutes > self.refresh_token_ttl_minutes {
            warnings.push(SecurityWarning {
                code: "ACCESS_TTL_EXCEEDS_REFRESH",
                message: "Access tokens outlive refresh tokens; rotation is pointless".to_string(),
                severity: WarningSeverity::Medium,
            });
        }

        warnings
    }

    /// Log all security warnings at startup
    pub fn log_security_warnings(&self) {
        for warning in self.security_warnings() {
            match warning.severity {
                WarningSeverity::Critical => {
                    tracing::error!("[SECURITY] {}: {}", warning.code, warning.message);
                }
                WarningSeverity::High => {
                    tracing::warn!("[SECURITY] {}: {}", warning.code, warning.message);
                }
                WarningSeverity::Medium => {
                    tracing::info!("[SECURITY] {}: {}", warning.code, warning.message);
                }
            }
        }
    }
}

/// Security warning from configuration validation
#[derive(Debug, Clone)]
pub struct SecurityWarning {
    /// Warning code for programmatic handling
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
    /// Severity level
    pub severity: WarningSeverity,
}

/// Warning severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    /// Should not run in production
    Critical,
    /// Significant security risk
    High,
    /// Potential security concern
    Medium,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_pass_validation() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn default_secret_is_flagged() {
        let settings = Settings::default();
        let warnings = settings.security_warnings();

        assert!(warnings.iter().any(|w| w.code == "DEFAULT_SECRET_KEY"));
    }

    #[test]
    fn strong_secret_has_no_critical_warnings() {
        let settings = Settings {
            secret_key: "f".repeat(48),
            ..Settings::default()
        };

        assert!(settings
            .security_warnings()
            .iter()
            .all(|w| w.severity != WarningSeverity::Critical));
    }

    #[test]
    fn inverted_ttls_are_flagged() {
        let settings = Settings {
            access_token_ttl_minutes: 100_000,
            ..Settings::default()
        };

        assert!(settings
            .security_warnings()
            .iter()
            .any(|w| w.code == "ACCESS_TTL_EXCEEDS_REFRESH"));
    }
}
