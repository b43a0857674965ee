//! Types produced and consumed by the matching service

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::normalize;
use crate::snapshot::{EntityKind, EntityRecord};

/// Kind of comparison field a signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Phone,
    EmailDomain,
    Name,
    Address,
}

impl FieldKind {
    /// Get display label for field kind
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Phone => "phone",
            FieldKind::EmailDomain => "email-domain",
            FieldKind::Name => "name",
            FieldKind::Address => "address",
        }
    }
}

/// A raw value together with its canonical comparison form.
///
/// Canonicalization is total: malformed input yields an empty canonical
/// value, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedField {
    pub kind: FieldKind,
    pub raw: String,
    pub canonical: String,
}

impl NormalizedField {
    pub fn new(kind: FieldKind, raw: impl Into<String>, canonical: impl Into<String>) -> Self {
        NormalizedField {
            kind,
            raw: raw.into(),
            canonical: canonical.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

/// An email split into comparable parts (both lower-cased)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub raw: String,
    pub local: String,
    pub domain: String,
}

impl EmailAddress {
    pub fn parse(raw: &str) -> Self {
        EmailAddress {
            raw: raw.trim().to_string(),
            local: normalize::email_local_part(raw),
            domain: normalize::extract_email_domain(raw),
        }
    }
}

/// Pre-normalized comparison view of a record, built once per batch.
///
/// Matching never touches raw untyped values: everything goes through this
/// tagged structure first.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFields {
    pub entity_id: i64,
    pub kind: EntityKind,
    pub name: NormalizedField,
    pub phones: Vec<NormalizedField>,
    pub emails: Vec<EmailAddress>,
    pub address: NormalizedField,
    pub updated_at: DateTime<Utc>,
}

impl RecordFields {
    pub fn from_record(record: &EntityRecord, config: &EngineConfig) -> Self {
        let phones = record
            .phones
            .iter()
            .map(|p| {
                NormalizedField::new(
                    FieldKind::Phone,
                    p.clone(),
                    normalize::normalize_phone(p, &config.default_country_code),
                )
            })
            .filter(|f| !f.is_empty())
            .collect();

        let emails = record
            .emails
            .iter()
            .map(|e| EmailAddress::parse(e))
            .filter(|e| !e.domain.is_empty())
            .collect();

        let address_raw = record.address.clone().unwrap_or_default();
        let address_canonical = address_raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();

        RecordFields {
            entity_id: record.id,
            kind: record.kind,
            name: NormalizedField::new(
                FieldKind::Name,
                record.name.clone(),
                record.name.trim().to_lowercase(),
            ),
            phones,
            emails,
            address: NormalizedField::new(FieldKind::Address, address_raw, address_canonical),
            updated_at: record.updated_at,
        }
    }

    /// Whether the record carries any phone or email evidence at all
    pub fn has_strong_fields(&self) -> bool {
        !self.phones.is_empty() || !self.emails.is_empty()
    }
}

/// A possible duplicate found during a matching pass. Transient, never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub entity_id: i64,
    /// Estimated probability the two records are the same real-world entity
    pub confidence: f64,
    /// Field kinds that contributed a signal
    pub matched_fields: HashSet<FieldKind>,
    /// Name similarity, kept for tie-breaking between equal confidences
    pub name_similarity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_fields_normalizes_and_drops_empty() {
        let record = EntityRecord::new(4, EntityKind::Contact, " Marco Rossi ", Utc::now())
            .with_phone("02 1234567 8")
            .with_phone("n/a")
            .with_email("Marco.Rossi@Gmail.com")
            .with_email("not-an-email");

        let fields = RecordFields::from_record(&record, &EngineConfig::default());

        assert_eq!(fields.name.canonical, "marco rossi");
        assert_eq!(fields.phones.len(), 1);
        assert_eq!(fields.phones[0].canonical, "+390212345678");
        assert_eq!(fields.emails.len(), 1);
        assert_eq!(fields.emails[0].local, "marco.rossi");
        assert_eq!(fields.emails[0].domain, "gmail.com");
        assert!(fields.has_strong_fields());
    }

    #[test]
    fn test_field_kind_labels() {
        assert_eq!(FieldKind::EmailDomain.label(), "email-domain");
        assert_eq!(FieldKind::Phone.label(), "phone");
    }
}
