//! Ports
//!
//! Abstractions for the external collaborators of the core: the shared
//! ephemeral store and the billing/provisioning systems. Concrete providers
//! live in the infrastructure layer so tests can substitute deterministic
//! implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::error::Result;

/// Shared ephemeral key-value store.
///
/// Any store offering these atomic primitives over string keys with per-key
/// TTL satisfies the contract. Revocation state for refresh tokens, reset
/// tickets, and rate-limit counters lives exclusively here. Every method is
/// a single atomic store operation; callers never compose a read with a
/// separate write to mutate a key.
#[async_trait]
pub trait EphemeralStore: Send + Sync {
    /// Set `key` to `value` with a TTL (`SETEX`)
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Read a key (`GET`)
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Atomically read and delete a key (`GETDEL`). At most one of any
    /// number of concurrent callers observes the value.
    async fn get_del(&self, key: &str) -> Result<Option<String>>;

    /// Delete a key (`DEL`); deleting an absent key is a no-op
    async fn del(&self, key: &str) -> Result<()>;

    /// Key existence check (`EXISTS`)
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Atomically increment a counter, creating it at 1 (`INCR`).
    /// Returns the value after the increment.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Set a TTL on an existing key (`EXPIRE`); a no-op for absent keys
    async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;
}

/// Billing customer record returned by the billing provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingCustomer {
    pub customer_id: String,
    pub email: String,
    pub payment_provider: String,
    pub trial_ends_at: Option<DateTime<Utc>>,
}

/// Facade over the external billing provider
#[async_trait]
pub trait BillingGateway: Send + Sync {
    async fn create_customer(
        &self,
        email: &str,
        name: &str,
        trial_days: u32,
    ) -> Result<BillingCustomer>;
}

/// Provisioning event published to downstream systems after a tenant is
/// registered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningEvent {
    pub tenant_id: Uuid,
    pub customer_id: String,
    pub plan_code: Option<String>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

/// Publisher for provisioning events
#[async_trait]
pub trait ProvisioningNotifier: Send + Sync {
    async fn publish(&self, event: &ProvisioningEvent) -> Result<()>;
}
