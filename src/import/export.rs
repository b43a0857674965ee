//! Shaping a snapshot back into exportable rows
//!
//! The inverse of the import row mapping: one key/value object per contact,
//! carrying its primary company and role. Encoding to CSV/Excel belongs to
//! the file collaborator.

use serde_json::{json, Value};

use crate::graph::AreaOfActivity;
use crate::snapshot::Snapshot;

/// One row object per contact, in id order.
///
/// The company column holds the contact's primary company, falling back to
/// its first link (by company id) when no primary is designated.
pub fn export_rows(snapshot: &Snapshot) -> Vec<Value> {
    let mut contacts: Vec<_> = snapshot.contacts().collect();
    contacts.sort_by_key(|c| c.id);

    contacts
        .into_iter()
        .map(|contact| {
            let mut links: Vec<&AreaOfActivity> = snapshot
                .links
                .iter()
                .filter(|l| l.contact_id == contact.id)
                .collect();
            links.sort_by_key(|l| l.company_id);
            let main = links
                .iter()
                .find(|l| l.is_primary_company)
                .or_else(|| links.first())
                .copied();

            let company = main
                .and_then(|l| snapshot.find_record(l.company_id))
                .map(|r| r.name.clone());

            json!({
                "name": contact.name,
                "phone": contact.phones.first(),
                "email": contact.emails.first(),
                "address": contact.address,
                "company": company,
                "role": main.and_then(|l| l.role.clone()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::snapshot::{EntityKind, EntityRecord};

    use super::*;

    #[test]
    fn test_export_uses_primary_company() {
        let snapshot = Snapshot {
            version: 1,
            records: vec![
                EntityRecord::new(1, EntityKind::Contact, "Marco Rossi", Utc::now())
                    .with_email("marco.rossi@gmail.com"),
                EntityRecord::new(10, EntityKind::Company, "Acme Srl", Utc::now()),
                EntityRecord::new(20, EntityKind::Company, "Beta SpA", Utc::now()),
            ],
            links: vec![
                AreaOfActivity::new(1, 10),
                AreaOfActivity {
                    is_primary_company: true,
                    role: Some("Sales".to_string()),
                    ..AreaOfActivity::new(1, 20)
                },
            ],
            parent_edges: vec![],
        };

        let rows = export_rows(&snapshot);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Marco Rossi");
        assert_eq!(rows[0]["company"], "Beta SpA");
        assert_eq!(rows[0]["role"], "Sales");
    }

    #[test]
    fn test_export_falls_back_to_first_link() {
        let snapshot = Snapshot {
            version: 1,
            records: vec![
                EntityRecord::new(1, EntityKind::Contact, "Marco Rossi", Utc::now()),
                EntityRecord::new(10, EntityKind::Company, "Acme Srl", Utc::now()),
            ],
            links: vec![AreaOfActivity::new(1, 10)],
            parent_edges: vec![],
        };

        let rows = export_rows(&snapshot);
        assert_eq!(rows[0]["company"], "Acme Srl");
    }

    #[test]
    fn test_export_unlinked_contact() {
        let snapshot = Snapshot {
            version: 1,
            records: vec![EntityRecord::new(1, EntityKind::Contact, "Marco Rossi", Utc::now())],
            links: vec![],
            parent_edges: vec![],
        };

        let rows = export_rows(&snapshot);
        assert_eq!(rows[0]["company"], Value::Null);
    }
}
