//! Entity records and the ownership traits the scoping layer enforces on.
//!
//! The relational engine itself is external; these records give the
//! repository chokepoint real entity families to enforce against. Every
//! tenant-owned record implements [`TenantOwned`], the Rust analogue of a
//! `tenant_id` column mixin: the repository stamps and filters through it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::{RoleKey, UserStatus};

/// A record with a stable identity
pub trait Record: Send + Sync + 'static {
    fn id(&self) -> Uuid;
}

/// A record partitioned by tenant.
///
/// `tenant_id` is optional on the value so that a freshly constructed record
/// can be stamped by the repository from the bound scope; a persisted record
/// always carries `Some`.
pub trait TenantOwned: Record {
    fn tenant_id(&self) -> Option<Uuid>;
    fn set_tenant_id(&mut self, tenant_id: Uuid);
}

/// A customer tenant: the unit of data partitioning. Not itself
/// tenant-owned, it is the partition root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub contact_email: String,
    pub billing_customer_id: Option<String>,
    pub billing_provider: Option<String>,
    pub subscription_status: Option<String>,
    pub plan_code: Option<String>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn new(name: &str, slug: &str, contact_email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            contact_email: contact_email.to_string(),
            billing_customer_id: None,
            billing_provider: None,
            subscription_status: None,
            plan_code: None,
            trial_ends_at: None,
            created_at: Utc::now(),
        }
    }
}

impl Record for Tenant {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// A tenant user. Email is stored lowercased and is unique per tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// New active user with the tenant field left unset; the repository
    /// stamps it from the bound scope on insert.
    pub fn new(email: &str, password_hash: String, first_name: &str, last_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: None,
            email: email.to_string(),
            password_hash,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            status: UserStatus::Active,
            created_at: Utc::now(),
        }
    }
}

impl Record for User {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl TenantOwned for User {
    fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }

    fn set_tenant_id(&mut self, tenant_id: Uuid) {
        self.tenant_id = Some(tenant_id);
    }
}

/// A role provisioned inside a tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub key: RoleKey,
    pub name: String,
}

impl Role {
    /// Roles are provisioned before any scope exists for the tenant, so the
    /// owner is set explicitly here rather than stamped.
    pub fn new(tenant_id: Uuid, key: RoleKey, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: Some(tenant_id),
            key,
            name: name.to_string(),
        }
    }
}

impl Record for Role {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl TenantOwned for Role {
    fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }

    fn set_tenant_id(&mut self, tenant_id: Uuid) {
        self.tenant_id = Some(tenant_id);
    }
}

/// Join record between users and roles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub user_id: Uuid,
    pub role_id: Uuid,
}

impl UserRole {
    pub fn new(user_id: Uuid, role_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: None,
            user_id,
            role_id,
        }
    }
}

impl Record for UserRole {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl TenantOwned for UserRole {
    fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }

    fn set_tenant_id(&mut self, tenant_id: Uuid) {
        self.tenant_id = Some(tenant_id);
    }
}

/// Append-only audit trail entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub actor_user_id: Option<Uuid>,
    pub action: String,
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(actor_user_id: Option<Uuid>, action: &str, meta: Option<serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: None,
            actor_user_id,
            action: action.to_string(),
            meta,
            created_at: Utc::now(),
        }
    }
}

impl Record for AuditRecord {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl TenantOwned for AuditRecord {
    fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }

    fn set_tenant_id(&mut self, tenant_id: Uuid) {
        self.tenant_id = Some(tenant_id);
    }
}
