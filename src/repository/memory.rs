//! In-memory record store
//!
//! Backs tests and single-process deployments. No tenancy knowledge lives
//! here; isolation is enforced one layer up, in the repository.

use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::Record;
use crate::domain::error::{Error, Result};
use crate::repository::RecordStore;

/// A single table of records keyed by id
pub struct InMemoryTable<T> {
    rows: RwLock<HashMap<Uuid, T>>,
}

impl<T> InMemoryTable<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Default for InMemoryTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record + Clone> RecordStore<T> for InMemoryTable<T> {
    fn insert(&self, record: T) -> Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| Error::internal("table lock poisoned"))?;
        rows.insert(record.id(), record);
        Ok(())
    }

    fn update(&self, record: T) -> Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| Error::internal("table lock poisoned"))?;

        match rows.get_mut(&record.id()) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(Error::not_found("record")),
        }
    }

    fn get(&self, id: Uuid) -> Result<Option<T>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| Error::internal("table lock poisoned"))?;
        Ok(rows.get(&id).cloned())
    }

    fn find(&self, pred: &dyn Fn(&T) -> bool) -> Result<Vec<T>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| Error::internal("table lock poisoned"))?;
        Ok(rows.values().filter(|r| pred(r)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Tenant;

    #[test]
    fn insert_get_update_roundtrip() {
        let table = InMemoryTable::new();
        let tenant = Tenant::new("Acme", "acme", "owner@acme.io");
        let id = tenant.id;

        table.insert(tenant.clone()).unwrap();
        assert_eq!(table.get(id).unwrap().unwrap().slug, "acme");

        let mut renamed = tenant;
        renamed.name = "Acme Corp".to_string();
        table.update(renamed).unwrap();
        assert_eq!(table.get(id).unwrap().unwrap().name, "Acme Corp");
    }

    #[test]
    fn update_of_absent_record_fails() {
        let table = InMemoryTable::new();

        let result = table.update(Tenant::new("Ghost", "ghost", "g@ghost.io"));

        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn find_filters_by_predicate() {
        let table = InMemoryTable::new();
        table.insert(Tenant::new("Acme", "acme", "a@acme.io")).unwrap();
        table.insert(Tenant::new("Widgets", "widgets", "w@widgets.io")).unwrap();

        let hits = table.find(&|t: &Tenant| t.slug == "widgets").unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Widgets");
    }
}
