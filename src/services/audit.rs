//! Audit trail
//!
//! Append-only, tenant-scoped records of security-relevant events. Entries
//! are stamped with the bound tenant by the repository; a structured
//! tracing event mirrors each record for operators tailing logs.

use serde_json::Value;
use uuid::Uuid;

use crate::domain::entities::AuditRecord;
use crate::domain::error::Result;
use crate::repository::{Records, Repository};

/// Records audit trail entries for the bound tenant
#[derive(Clone)]
pub struct AuditService {
    records: Repository<AuditRecord>,
}

impl AuditService {
    pub fn new(records: &Records) -> Self {
        Self {
            records: Repository::new("audit", records.audit.clone()),
        }
    }

    /// Append one entry for the bound tenant
    pub fn log(
        &self,
        actor_user_id: Option<Uuid>,
        action: &str,
        meta: Option<Value>,
    ) -> Result<AuditRecord> {
        tracing::info!(action, actor = ?actor_user_id, "audit");
        self.records
            .insert(AuditRecord::new(actor_user_id, action, meta))
    }

    /// All entries of the bound tenant for one action
    pub fn entries_for(&self, action: &str) -> Result<Vec<AuditRecord>> {
        self.records.find(|r| r.action == action)
    }
}
