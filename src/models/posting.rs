//! Normalized job posting record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SourceId;

/// Where a posting is in its enrichment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    /// Only listing-card fields were extracted.
    Pending,
    /// A detail fetch was attempted and failed; the record should be revisited.
    NeedsEnrichment,
    /// Detail fields were extracted.
    Complete,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::NeedsEnrichment => "needs_enrichment",
            Self::Complete => "complete",
        }
    }
}

/// One normalized job listing.
///
/// Identity is `(source, external_id)`. Records are built once by a source
/// adapter and never mutated by the harvest pipeline afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub source: SourceId,
    /// Site-local identifier derived from `url`.
    pub external_id: String,
    /// Absolute canonical detail URL.
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    /// Short description from the listing card (or the detail page lead).
    pub description: String,
    pub full_description: String,
    pub requirements: String,
    pub tasks: String,
    pub conditions: String,
    pub benefits: String,
    pub employment_type: String,
    pub experience_level: String,
    pub remote_type: String,
    pub company_logo: String,
    pub company_url: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(rename = "created_at")]
    pub harvested_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: LifecycleStatus,
    /// True when only summary fields were filled.
    pub needs_formatting: bool,
}

impl Posting {
    /// Create a summary-only posting; detail fields start empty.
    pub fn new(source: SourceId, external_id: String, url: String) -> Self {
        let now = Utc::now();
        Self {
            source,
            external_id,
            url,
            title: String::new(),
            company: String::new(),
            location: String::new(),
            salary: String::new(),
            description: String::new(),
            full_description: String::new(),
            requirements: String::new(),
            tasks: String::new(),
            conditions: String::new(),
            benefits: String::new(),
            employment_type: String::new(),
            experience_level: String::new(),
            remote_type: String::new(),
            company_logo: String::new(),
            company_url: String::new(),
            published_at: None,
            harvested_at: now,
            updated_at: now,
            status: LifecycleStatus::Pending,
            needs_formatting: true,
        }
    }

    /// Identity key used for de-duplication and upserts.
    pub fn key(&self) -> (SourceId, &str) {
        (self.source, self.external_id.as_str())
    }

    /// Text the relevance classifier scans alongside the title.
    pub fn classification_text(&self) -> &str {
        if self.description.is_empty() {
            &self.full_description
        } else {
            &self.description
        }
    }

    /// Mark detail extraction as done.
    pub fn mark_complete(&mut self) {
        self.status = LifecycleStatus::Complete;
        self.needs_formatting = false;
    }

    /// Mark that the detail fetch failed and only summary data is present.
    pub fn mark_needs_enrichment(&mut self) {
        self.status = LifecycleStatus::NeedsEnrichment;
        self.needs_formatting = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_posting_is_pending_summary() {
        let p = Posting::new(SourceId::Hh, "123".into(), "https://hh.ru/vacancy/123".into());
        assert_eq!(p.status, LifecycleStatus::Pending);
        assert!(p.needs_formatting);
        assert!(p.published_at.is_none());
        assert_eq!(p.harvested_at, p.updated_at);
        assert_eq!(p.key(), (SourceId::Hh, "123"));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut p = Posting::new(SourceId::Habr, "1".into(), "https://career.habr.com/vacancies/1".into());
        p.mark_complete();
        assert_eq!(p.status, LifecycleStatus::Complete);
        assert!(!p.needs_formatting);

        p.mark_needs_enrichment();
        assert_eq!(p.status, LifecycleStatus::NeedsEnrichment);
        assert!(p.needs_formatting);
    }

    #[test]
    fn test_wire_names() {
        let p = Posting::new(SourceId::GetMatch, "abc".into(), "https://getmatch.ru/vacancy/abc".into());
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["source"], "getmatch");
        assert_eq!(json["status"], "pending");
        assert!(json.get("created_at").is_some());
        assert!(json.get("harvested_at").is_none());
    }

    #[test]
    fn test_classification_text_prefers_short_description() {
        let mut p = Posting::new(SourceId::Hh, "1".into(), "https://hh.ru/vacancy/1".into());
        p.full_description = "full".into();
        assert_eq!(p.classification_text(), "full");
        p.description = "short".into();
        assert_eq!(p.classification_text(), "short");
    }
}
