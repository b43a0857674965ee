//! Read snapshots handed to the engine by the persistence collaborator
//!
//! The engine never owns storage: it operates on a [`Snapshot`] fetched once
//! per batch and proposes mutations back. The stale-version check here is
//! the engine's half of the caller's optimistic check-then-commit loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::{AreaOfActivity, CompanyHierarchyEdge};

/// Kind of CRM entity a record represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Contact,
    Company,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Contact => "contact",
            EntityKind::Company => "company",
        }
    }
}

/// A contact or company record as read from storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: i64,
    pub kind: EntityKind,
    pub name: String,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub address: Option<String>,
    /// Last modification time, used for match tie-breaks and as the
    /// compare-and-swap field on commit
    pub updated_at: DateTime<Utc>,
}

impl EntityRecord {
    pub fn new(id: i64, kind: EntityKind, name: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        EntityRecord {
            id,
            kind,
            name: name.into(),
            phones: Vec::new(),
            emails: Vec::new(),
            address: None,
            updated_at,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phones.push(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.emails.push(email.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// A stable read view of the entity population and relationship sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Monotonic version reported by storage when the snapshot was taken
    pub version: i64,
    pub records: Vec<EntityRecord>,
    pub links: Vec<AreaOfActivity>,
    pub parent_edges: Vec<CompanyHierarchyEdge>,
}

impl Snapshot {
    pub fn contacts(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.iter().filter(|r| r.kind == EntityKind::Contact)
    }

    pub fn companies(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.iter().filter(|r| r.kind == EntityKind::Company)
    }

    pub fn find_record(&self, id: i64) -> Option<&EntityRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Highest entity id in the snapshot; provisional ids for records
    /// created within a batch start right above this
    pub fn max_entity_id(&self) -> i64 {
        self.records.iter().map(|r| r.id).max().unwrap_or(0)
    }

    /// The check-then-commit guard: fails when storage has moved on since
    /// this snapshot was taken. The retry loop belongs to the caller.
    pub fn ensure_current(&self, store_version: i64) -> Result<(), StaleSnapshotError> {
        if self.version != store_version {
            return Err(StaleSnapshotError {
                snapshot_version: self.version,
                store_version,
            });
        }
        Ok(())
    }
}

/// Version mismatch between a snapshot and storage at commit time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleSnapshotError {
    pub snapshot_version: i64,
    pub store_version: i64,
}

impl std::fmt::Display for StaleSnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "snapshot version {} is stale, storage is at {}",
            self.snapshot_version, self.store_version
        )
    }
}

impl std::error::Error for StaleSnapshotError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_current() {
        let snapshot = Snapshot {
            version: 7,
            ..Default::default()
        };
        assert!(snapshot.ensure_current(7).is_ok());

        let err = snapshot.ensure_current(9).unwrap_err();
        assert_eq!(err.snapshot_version, 7);
        assert_eq!(err.store_version, 9);
    }

    #[test]
    fn test_max_entity_id_empty() {
        assert_eq!(Snapshot::default().max_entity_id(), 0);
    }
}
