//! Engine configuration with sane defaults
//!
//! Every knob the matching and normalization layers consult lives here, so
//! callers can tune thresholds per tenant without touching engine code.

use serde::{Deserialize, Serialize};

/// Configuration for matching, normalization and import behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum confidence for a candidate to count as a duplicate match
    pub match_threshold: f64,
    /// Minimum name similarity for the name signal to contribute
    pub name_threshold: f64,
    /// Country code assumed for phone numbers without an international prefix
    pub default_country_code: String,
    /// Pairs of email domains treated as equivalent (order-insensitive)
    pub related_domains: Vec<(String, String)>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            match_threshold: 0.80,
            name_threshold: 0.82,
            default_country_code: "39".to_string(),
            related_domains: vec![
                ("gmail.com".to_string(), "googlemail.com".to_string()),
                ("hotmail.com".to_string(), "outlook.com".to_string()),
            ],
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML text; missing keys fall back to defaults
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Add a related-domain pair
    pub fn add_related_domains(&mut self, a: impl Into<String>, b: impl Into<String>) {
        self.related_domains.push((a.into(), b.into()));
    }
}
