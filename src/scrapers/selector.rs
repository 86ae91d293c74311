//! Ordered CSS selector fallback chains.
//!
//! Boards reshuffle their markup often, so every semantic role (listing card,
//! title, salary, ...) is described by several candidate selectors tried in
//! order. Resolution never fails: exhausting a chain yields "no match" for a
//! listing and an empty string for a field.

use scraper::{ElementRef, Html, Selector};

use super::error::ScrapeError;
use super::text::collapse_whitespace;

/// Ordered candidate selectors for one semantic role.
#[derive(Debug, Clone)]
pub struct SelectorChain {
    role: String,
    candidates: Vec<(String, Selector)>,
}

impl SelectorChain {
    /// Compile every candidate up front; a bad selector is a programming error
    /// in a site profile and is reported immediately.
    pub fn new(role: &str, candidates: &[&str]) -> Result<Self, ScrapeError> {
        let candidates = candidates
            .iter()
            .map(|css| {
                Selector::parse(css)
                    .map(|sel| (css.to_string(), sel))
                    .map_err(|e| ScrapeError::Selector {
                        selector: css.to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            role: role.to_string(),
            candidates,
        })
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|(css, _)| css.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// The listing candidate that won and the cards it matched.
#[derive(Debug)]
pub struct ListingMatch<'a> {
    pub candidate: String,
    pub elements: Vec<ElementRef<'a>>,
}

/// Text content with whitespace collapsed. Text nodes are space-separated so
/// block children (`<p>`, `<li>`) don't run together.
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Find the first candidate whose first match has non-empty text.
///
/// A candidate matching only empty wrappers is skipped. Returns `None` when
/// the chain is exhausted.
pub fn resolve_listing<'a>(document: &'a Html, chain: &SelectorChain) -> Option<ListingMatch<'a>> {
    for (css, selector) in &chain.candidates {
        let elements: Vec<ElementRef<'a>> = document.select(selector).collect();
        match elements.first() {
            Some(first) if !element_text(*first).is_empty() => {
                return Some(ListingMatch {
                    candidate: css.clone(),
                    elements,
                });
            }
            _ => continue,
        }
    }
    None
}

/// What to read from a matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Text,
    Attr(&'static str),
}

impl FieldSource {
    fn read(&self, element: ElementRef<'_>) -> String {
        match self {
            FieldSource::Text => element_text(element),
            FieldSource::Attr(name) => element
                .value()
                .attr(name)
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Fallback chain for one field of a card or detail page.
#[derive(Debug, Clone)]
pub struct FieldChain {
    pub chain: SelectorChain,
    pub source: FieldSource,
}

impl FieldChain {
    pub fn text(role: &str, candidates: &[&str]) -> Result<Self, ScrapeError> {
        Ok(Self {
            chain: SelectorChain::new(role, candidates)?,
            source: FieldSource::Text,
        })
    }

    pub fn attr(role: &str, attr: &'static str, candidates: &[&str]) -> Result<Self, ScrapeError> {
        Ok(Self {
            chain: SelectorChain::new(role, candidates)?,
            source: FieldSource::Attr(attr),
        })
    }
}

/// Extract a field from a card. The card itself is considered before its
/// descendants, so a chain like `a[href]` works when the card is the link.
pub fn extract_field(element: ElementRef<'_>, field: &FieldChain) -> String {
    for (_, selector) in &field.chain.candidates {
        let own = selector
            .matches(&element)
            .then(|| field.source.read(element))
            .filter(|v| !v.is_empty());
        if let Some(value) = own {
            return value;
        }

        let nested = element
            .select(selector)
            .map(|el| field.source.read(el))
            .find(|v| !v.is_empty());
        if let Some(value) = nested {
            return value;
        }
    }
    String::new()
}

/// Extract a field from a whole document (detail pages).
pub fn extract_document_field(document: &Html, field: &FieldChain) -> String {
    extract_field(document.root_element(), field)
}
