//! Mapping of untyped import rows into a tagged structure
//!
//! Rows arrive as `serde_json::Value` objects from the file-decoding
//! collaborator. Matching never runs on raw untyped values, so everything
//! is pulled into [`ImportRow`] first. A small set of common header
//! aliases is accepted; unknown keys are ignored.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::snapshot::{EntityKind, EntityRecord};

const NAME_KEYS: &[&str] = &["name", "full name", "full_name", "fullname"];
const FIRST_NAME_KEYS: &[&str] = &["first name", "first_name", "firstname"];
const LAST_NAME_KEYS: &[&str] = &["last name", "last_name", "lastname", "surname"];
const EMAIL_KEYS: &[&str] = &["email", "e-mail", "email_address", "mail"];
const PHONE_KEYS: &[&str] = &["phone", "phone_number", "telephone", "mobile", "tel"];
const ADDRESS_KEYS: &[&str] = &["address", "street_address"];
const COMPANY_KEYS: &[&str] = &["company", "company_name", "organization", "organisation"];
const ROLE_KEYS: &[&str] = &["role", "position", "title"];
const JOB_KEYS: &[&str] = &["job_description", "job description", "job"];

/// One parsed import row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRow {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Company the contact should be linked to, by name
    pub company: Option<String>,
    pub role: Option<String>,
    pub job_description: Option<String>,
}

impl ImportRow {
    /// Parse a raw row object. Fails only when the value is not an object;
    /// missing or empty fields are simply absent.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(map) = value.as_object() else {
            bail!("import row is not an object: {}", value);
        };

        let name = match text(map, NAME_KEYS) {
            Some(name) => name,
            None => {
                let first = text(map, FIRST_NAME_KEYS);
                let last = text(map, LAST_NAME_KEYS);
                [first, last]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        };

        Ok(ImportRow {
            name,
            phone: text(map, PHONE_KEYS),
            email: text(map, EMAIL_KEYS),
            address: text(map, ADDRESS_KEYS),
            company: text(map, COMPANY_KEYS),
            role: text(map, ROLE_KEYS),
            job_description: text(map, JOB_KEYS),
        })
    }

    /// A row with no name, phone or email cannot be matched or created
    pub fn has_identity(&self) -> bool {
        !self.name.is_empty() || self.phone.is_some() || self.email.is_some()
    }

    /// Shape the row as a contact record for scoring/creation.
    /// The id is provisional and assigned by the orchestrator.
    pub fn to_contact_record(&self, id: i64, now: DateTime<Utc>) -> EntityRecord {
        let mut record = EntityRecord::new(id, EntityKind::Contact, self.name.clone(), now);
        if let Some(phone) = &self.phone {
            record.phones.push(phone.clone());
        }
        if let Some(email) = &self.email {
            record.emails.push(email.clone());
        }
        record.address = self.address.clone();
        record
    }
}

/// First non-empty value under any of the given keys, case-insensitive
fn text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        let hit = map
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v);
        let Some(value) = hit else { continue };
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}
