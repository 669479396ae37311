//! Relational tables and the transactional store they live in.
//!
//! Every entity is a row in a typed [`Table`]. Services never hold rows across
//! calls: they read through [`Store::read`] and mutate through [`Store::write`],
//! which applies the closure to a working copy and commits it only on success.

mod ids;
mod json_file;
mod memory;

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::billing::{Payment, Rent};
use crate::documents::Document;
use crate::leases::{Charge, Lease};
use crate::mail::{EmailConfig, EmailTemplate};
use crate::portfolio::{Owner, Property};
use crate::tenants::{Guarantor, Tenant};

pub use ids::{
    ChargeId, DocumentId, EmailConfigId, EmailTemplateId, GuarantorId, LeaseId, OwnerId,
    PaymentId, PropertyId, RecordId, RentId, TenantId,
};
pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;

/// A row type stored in a [`Table`].
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned {
    type Id: RecordId;
    const ENTITY: &'static str;

    fn id(&self) -> Self::Id;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn not_found<I: RecordId>(entity: &'static str, id: I) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Ordered rows keyed by id, with a monotonic id allocator.
#[derive(Debug, Clone)]
pub struct Table<R: Record> {
    rows: BTreeMap<R::Id, R>,
    last_id: u64,
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<R: Record> Table<R> {
    /// Reserves the next id. Ids are never reused, even after deletes.
    pub fn allocate_id(&mut self) -> R::Id {
        self.last_id += 1;
        R::Id::from(self.last_id)
    }

    pub fn insert(&mut self, row: R) -> R {
        let id = row.id();
        self.last_id = self.last_id.max(id.into());
        self.rows.insert(id, row.clone());
        row
    }

    pub fn get(&self, id: R::Id) -> Option<&R> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: R::Id) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn require(&self, id: R::Id) -> Result<&R, RepositoryError> {
        self.rows
            .get(&id)
            .ok_or_else(|| RepositoryError::not_found(R::ENTITY, id))
    }

    pub fn require_mut(&mut self, id: R::Id) -> Result<&mut R, RepositoryError> {
        self.rows
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(R::ENTITY, id))
    }

    /// Overwrites an existing row.
    pub fn replace(&mut self, row: R) -> Result<R, RepositoryError> {
        let slot = self.require_mut(row.id())?;
        *slot = row.clone();
        Ok(row)
    }

    pub fn remove(&mut self, id: R::Id) -> Result<R, RepositoryError> {
        self.rows
            .remove(&id)
            .ok_or_else(|| RepositoryError::not_found(R::ENTITY, id))
    }

    /// Drops every row matching `predicate`, returning how many were removed.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&R) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|_, row| !predicate(row));
        before - self.rows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut R> {
        self.rows.values_mut()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Serialize)]
struct TableView<'a, R> {
    last_id: u64,
    rows: Vec<&'a R>,
}

#[derive(Deserialize)]
struct TableSnapshot<R> {
    #[serde(default)]
    last_id: u64,
    rows: Vec<R>,
}

impl<R: Record> Serialize for Table<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TableView {
            last_id: self.last_id,
            rows: self.rows.values().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, R: Record> Deserialize<'de> for Table<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = TableSnapshot::<R>::deserialize(deserializer)?;
        let mut table = Table {
            rows: BTreeMap::new(),
            last_id: snapshot.last_id,
        };
        for row in snapshot.rows {
            table.insert(row);
        }
        Ok(table)
    }
}

/// The full relational schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    pub owners: Table<Owner>,
    pub properties: Table<Property>,
    pub tenants: Table<Tenant>,
    pub guarantors: Table<Guarantor>,
    pub leases: Table<Lease>,
    pub charges: Table<Charge>,
    pub rents: Table<Rent>,
    pub payments: Table<Payment>,
    pub documents: Table<Document>,
    pub email_configs: Table<EmailConfig>,
    pub email_templates: Table<EmailTemplate>,
}

/// Storage abstraction so services can be exercised against any backend.
pub trait Store: Send + Sync {
    /// Runs `f` against a consistent view of the tables.
    fn read<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&Tables) -> T;

    /// Runs `f` as one transaction: its changes commit only when it returns `Ok`.
    fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Tables) -> Result<T, E>,
        E: From<RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::{OwnerDraft, OwnerKind};

    fn owner(id: u64, name: &str) -> Owner {
        Owner {
            id: OwnerId(id),
            details: OwnerDraft {
                kind: OwnerKind::Individual,
                name: name.to_string(),
                email: None,
                phone: None,
                address: None,
                registration_number: None,
            },
        }
    }

    #[test]
    fn ids_are_not_reused_after_remove() {
        let mut table = Table::<Owner>::default();
        let first = table.allocate_id();
        table.insert(owner(first.0, "Alice"));
        table.remove(first).expect("row exists");
        let second = table.allocate_id();
        assert_eq!(first, OwnerId(1));
        assert_eq!(second, OwnerId(2));
    }

    #[test]
    fn require_reports_entity_and_id() {
        let table = Table::<Owner>::default();
        let err = table.require(OwnerId(7)).expect_err("missing row");
        assert_eq!(err.to_string(), "owner 7 not found");
    }

    #[test]
    fn snapshot_restores_rows_and_allocator() {
        let mut tables = Tables::default();
        let id = tables.owners.allocate_id();
        tables.owners.insert(owner(id.0, "Alice"));
        tables.owners.allocate_id();

        let json = serde_json::to_string(&tables).expect("serializes");
        let mut restored: Tables = serde_json::from_str(&json).expect("deserializes");

        assert_eq!(restored.owners.len(), 1);
        assert_eq!(
            restored.owners.require(id).expect("row").details.name,
            "Alice"
        );
        assert_eq!(restored.owners.allocate_id(), OwnerId(3));
    }

    #[test]
    fn remove_where_counts_removed_rows() {
        let mut table = Table::<Owner>::default();
        for name in ["Alice", "Bob", "Alma"] {
            let id = table.allocate_id();
            table.insert(owner(id.0, name));
        }
        let removed = table.remove_where(|row| row.details.name.starts_with("Al"));
        assert_eq!(removed, 2);
        assert_eq!(table.len(), 1);
    }
}
