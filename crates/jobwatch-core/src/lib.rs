//! Core job-record model and identifier helpers for jobwatch.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod entry_level;

pub use entry_level::{extract_min_years, is_entry_level};

pub const CRATE_NAME: &str = "jobwatch-core";

/// Normalized posting handed from source adapters to the poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub identifier: String,
    pub source_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub discovered_at: DateTime<Utc>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub qualifications: Option<String>,
}

impl JobRecord {
    /// Builds a record whose identifier is the canonical form of its posting URL.
    pub fn from_url(
        source_id: impl Into<String>,
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        url: impl Into<String>,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        let url = url.into();
        Self {
            identifier: canonical_identifier(&url),
            source_id: source_id.into(),
            title: title.into(),
            company: company.into(),
            location: location.into(),
            url,
            discovered_at,
            posted_at: None,
            description: None,
            qualifications: None,
        }
    }

    pub fn with_posted_at(mut self, posted_at: Option<DateTime<Utc>>) -> Self {
        self.posted_at = posted_at;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = text_or_none(description.into());
        self
    }

    pub fn with_qualifications(mut self, qualifications: impl Into<String>) -> Self {
        self.qualifications = text_or_none(qualifications.into());
        self
    }
}

/// Stable identifier for a posting URL: surrounding whitespace, the fragment and any
/// trailing slash are dropped so cosmetic link variations collapse to one key.
pub fn canonical_identifier(url: &str) -> String {
    let trimmed = url.trim();
    let without_fragment = trimmed.split('#').next().unwrap_or(trimmed);
    without_fragment.trim_end_matches('/').to_string()
}

pub fn slugify(input: &str) -> String {
    input
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Drops records whose identifier already appeared earlier in the list, keeping order.
pub fn dedupe_by_identifier(records: Vec<JobRecord>) -> Vec<JobRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.identifier.clone()))
        .collect()
}

fn text_or_none(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
