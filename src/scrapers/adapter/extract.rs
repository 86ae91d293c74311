//! Synchronous HTML to [`Posting`] extraction.
//!
//! `scraper::Html` is not `Send`, so documents are parsed and dropped inside
//! these functions and never held across an await point.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::debug;

use super::profile::{DetailFields, SiteProfile};
use crate::models::Posting;
use crate::scrapers::dates::parse_published;
use crate::scrapers::selector::{
    element_text, extract_document_field, extract_field, resolve_listing, FieldChain,
};
use crate::scrapers::text::collapse_whitespace;

/// An amount with a currency, e.g. "от 120 000 до 180 000 ₽" or "$3,000".
static SALARY_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:(?:от|до|from|up to)\s*)?(?:[$€]\s*\d[\d\s.,]*(?:(?:[-–—]|to)\s*[$€]?\s*\d[\d\s.,]*)?|\d[\d\s.,]*(?:(?:[-–—]|до|to)\s*\d[\d\s.,]*)?(?:₽|руб\.?|rub\b|usd\b|eur\b|\$|€))",
    )
    .unwrap()
});

/// Listing cards of one page, before detail enrichment and filtering.
#[derive(Debug, Default)]
pub struct ListingPage {
    /// Winning listing candidate, `None` when the chain found nothing.
    pub candidate: Option<String>,
    pub postings: Vec<Posting>,
    /// Cards whose link did not yield an ID.
    pub dropped_without_id: usize,
}

/// Find the salary-looking fragment in free text.
pub fn salary_from_text(text: &str) -> Option<String> {
    SALARY_IN_TEXT
        .find(text)
        .map(|m| collapse_whitespace(m.as_str().trim_end_matches([',', '.'])))
        .filter(|s| s.chars().any(|c| c.is_ascii_digit()))
}

fn optional(element: ElementRef<'_>, field: &Option<FieldChain>) -> String {
    field
        .as_ref()
        .map(|f| extract_field(element, f))
        .unwrap_or_default()
}

/// Turn listing HTML into summary postings.
///
/// Repeated links to one vacancy on the same page yield one posting. A later
/// titled card replaces an earlier untitled one (logo or badge links).
pub fn parse_listing(profile: &SiteProfile, html: &str) -> ListingPage {
    let document = Html::parse_document(html);
    let Some(found) = resolve_listing(&document, &profile.listing) else {
        return ListingPage::default();
    };

    let card = &profile.card;
    let mut page = ListingPage {
        candidate: Some(found.candidate.clone()),
        ..Default::default()
    };
    let mut seen: HashMap<String, usize> = HashMap::new();

    for element in found.elements {
        let href = extract_field(element, &card.link);
        let Some(url) = profile.canonical_url(&href) else {
            page.dropped_without_id += 1;
            continue;
        };
        let Some(external_id) = profile.extract_id(&url) else {
            debug!("{}: no ID in {}", profile.id, url);
            page.dropped_without_id += 1;
            continue;
        };
        let title = extract_field(element, &card.title);
        let slot = match seen.get(&url) {
            Some(&index) if page.postings[index].title.is_empty() && !title.is_empty() => {
                Some(index)
            }
            Some(_) => continue,
            None => None,
        };

        let mut posting = Posting::new(profile.id, external_id, url.clone());
        posting.title = title;
        posting.company = optional(element, &card.company);
        posting.location = optional(element, &card.location);
        posting.description = optional(element, &card.description);

        posting.salary = optional(element, &card.salary);
        if posting.salary.is_empty() && card.salary_from_text {
            posting.salary = salary_from_text(&element_text(element)).unwrap_or_default();
        }

        if let Some(ref published) = card.published {
            let raw = extract_field(element, published);
            posting.published_at = Some(parse_published(&raw, posting.harvested_at));
        }

        let logo = optional(element, &card.logo);
        if !logo.is_empty() {
            posting.company_logo = profile.absolute_url(&logo).unwrap_or(logo);
        }

        match slot {
            Some(index) => page.postings[index] = posting,
            None => {
                seen.insert(url, page.postings.len());
                page.postings.push(posting);
            }
        }
    }

    page
}

fn fill(target: &mut String, document: &Html, field: &Option<FieldChain>) {
    if let Some(field) = field {
        let value = extract_document_field(document, field);
        if !value.is_empty() {
            *target = value;
        }
    }
}

/// Merge a detail page into a summary posting and mark it complete.
pub fn apply_detail(profile: &SiteProfile, detail: &DetailFields, posting: &mut Posting, html: &str) {
    let document = Html::parse_document(html);

    fill(&mut posting.title, &document, &detail.title);
    fill(&mut posting.company, &document, &detail.company);
    fill(&mut posting.location, &document, &detail.location);
    fill(&mut posting.salary, &document, &detail.salary);
    fill(&mut posting.full_description, &document, &detail.description);
    fill(&mut posting.requirements, &document, &detail.requirements);
    fill(&mut posting.tasks, &document, &detail.tasks);
    fill(&mut posting.conditions, &document, &detail.conditions);
    fill(&mut posting.benefits, &document, &detail.benefits);
    fill(&mut posting.employment_type, &document, &detail.employment_type);
    fill(&mut posting.experience_level, &document, &detail.experience_level);
    fill(&mut posting.remote_type, &document, &detail.remote_type);

    let mut logo = String::new();
    fill(&mut logo, &document, &detail.company_logo);
    if !logo.is_empty() {
        posting.company_logo = profile.absolute_url(&logo).unwrap_or(logo);
    }
    let mut company_url = String::new();
    fill(&mut company_url, &document, &detail.company_url);
    if !company_url.is_empty() {
        posting.company_url = profile.absolute_url(&company_url).unwrap_or(company_url);
    }

    if posting.description.is_empty() {
        posting.description = posting.full_description.clone();
    }
    posting.mark_complete();
}
