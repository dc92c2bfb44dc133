//! Scoped repositories: the tenant isolation chokepoint
//!
//! Every read and write of a tenant-owned record passes through
//! [`Repository`], which adds the tenant predicate from the bound scope and
//! stamps new rows with it. Call sites cannot forget the filter because
//! there is no unfiltered method with the same name: the only way around
//! isolation is the `unscoped_*` family, a deliberately separate and
//! audited code path reserved for the few legitimately cross-tenant
//! lookups (tenant directory resolution, billing identifier lookup, role
//! provisioning before any user exists).

pub mod memory;

pub use memory::InMemoryTable;

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{AuditRecord, Role, Tenant, TenantOwned, User, UserRole};
use crate::domain::error::{Error, Result};
use crate::tenancy::scope;

/// The persistence boundary for one entity family.
///
/// Implementations are plain record stores with no tenancy knowledge; the
/// scoping rules live entirely in [`Repository`]. The production
/// implementation wraps the relational engine; [`InMemoryTable`] backs
/// tests and single-process deployments.
pub trait RecordStore<T>: Send + Sync {
    fn insert(&self, record: T) -> Result<()>;
    fn update(&self, record: T) -> Result<()>;
    fn get(&self, id: Uuid) -> Result<Option<T>>;
    fn find(&self, pred: &dyn Fn(&T) -> bool) -> Result<Vec<T>>;
}

/// Scoped access to one tenant-owned entity family
pub struct Repository<T> {
    entity: &'static str,
    store: Arc<dyn RecordStore<T>>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity,
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: TenantOwned + Clone> Repository<T> {
    pub fn new(entity: &'static str, store: Arc<dyn RecordStore<T>>) -> Self {
        Self { entity, store }
    }

    /// Fetch by id within the bound scope. A row owned by another tenant is
    /// indistinguishable from an absent row.
    pub fn get(&self, id: Uuid) -> Result<Option<T>> {
        let scope = scope::require()?;

        Ok(self
            .store
            .get(id)?
            .filter(|record| record.tenant_id() == Some(scope.tenant_id)))
    }

    /// All records of the bound tenant matching `pred`
    pub fn find<P>(&self, pred: P) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool,
    {
        let scope = scope::require()?;

        self.store
            .find(&|record| record.tenant_id() == Some(scope.tenant_id) && pred(record))
    }

    /// First record of the bound tenant matching `pred`
    pub fn find_one<P>(&self, pred: P) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self.find(pred)?.into_iter().next())
    }

    /// Insert within the bound scope.
    ///
    /// An unset tenant field is stamped with the scope's tenant; a pre-set
    /// field must match it. Without a bound scope this fails rather than
    /// writing an owner-less row.
    pub fn insert(&self, mut record: T) -> Result<T> {
        let scope = scope::require()?;

        match record.tenant_id() {
            None => record.set_tenant_id(scope.tenant_id),
            Some(owner) if owner == scope.tenant_id => {}
            Some(_) => return Err(Error::TenantMismatch),
        }

        self.store.insert(record.clone())?;
        Ok(record)
    }

    /// Update a record of the bound tenant; rows of other tenants cannot be
    /// touched from this scope.
    pub fn update(&self, record: T) -> Result<()> {
        let scope = scope::require()?;

        if record.tenant_id() != Some(scope.tenant_id) {
            return Err(Error::TenantMismatch);
        }

        self.store.update(record)
    }

    /// Cross-tenant fetch by id. Deliberate isolation opt-out; audited.
    pub fn unscoped_get(&self, id: Uuid) -> Result<Option<T>> {
        tracing::debug!(entity = self.entity, "tenant isolation bypassed: get");
        self.store.get(id)
    }

    /// Cross-tenant search. Deliberate isolation opt-out; audited.
    pub fn unscoped_find<P>(&self, pred: P) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool,
    {
        tracing::debug!(entity = self.entity, "tenant isolation bypassed: find");
        self.store.find(&pred)
    }

    /// Cross-tenant insert for provisioning paths that run before any scope
    /// exists. The owner must already be set; an owner-less row is refused
    /// here just as in the scoped path.
    pub fn unscoped_insert(&self, record: T) -> Result<T> {
        if record.tenant_id().is_none() {
            return Err(Error::internal(format!(
                "refusing to insert owner-less {} row",
                self.entity
            )));
        }

        tracing::debug!(entity = self.entity, "tenant isolation bypassed: insert");
        self.store.insert(record.clone())?;
        Ok(record)
    }
}

/// The record stores for every entity family, bundled for injection.
///
/// Tenants are the partition root and are not behind a scoped repository;
/// the tenant service is the only consumer of that store.
#[derive(Clone)]
pub struct Records {
    pub tenants: Arc<dyn RecordStore<Tenant>>,
    pub users: Arc<dyn RecordStore<User>>,
    pub roles: Arc<dyn RecordStore<Role>>,
    pub user_roles: Arc<dyn RecordStore<UserRole>>,
    pub audit: Arc<dyn RecordStore<AuditRecord>>,
}

impl Records {
    /// Fresh in-memory tables for every family
    pub fn in_memory() -> Self {
        Self {
            tenants: Arc::new(InMemoryTable::new()),
            users: Arc::new(InMemoryTable::new()),
            roles: Arc::new(InMemoryTable::new()),
            user_roles: Arc::new(InMemoryTable::new()),
            audit: Arc::new(InMemoryTable::new()),
        }
    }
}
