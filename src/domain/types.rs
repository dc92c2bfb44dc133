//! Shared domain types and enumerations

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role keys provisioned for every tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKey {
    Employee,
    Manager,
    Hr,
    It,
    Admin,
}

impl RoleKey {
    /// Stable wire/storage name for the role
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKey::Employee => "employee",
            RoleKey::Manager => "manager",
            RoleKey::Hr => "hr",
            RoleKey::It => "it",
            RoleKey::Admin => "admin",
        }
    }
}

impl std::fmt::Display for RoleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status of a tenant user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// The authenticated identity produced by resolving a validated access
/// token against the tenant-scoped user store. Read-only to this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub roles: Vec<RoleKey>,
    pub status: UserStatus,
}
