//! Geekjob: listings are assembled client-side, so pages are rendered.

use regex::Regex;
use url::Url;

use crate::models::SourceId;
use crate::scrapers::adapter::{CardFields, FetchMode, SearchUrl, SiteProfile};
use crate::scrapers::error::ScrapeError;
use crate::scrapers::selector::{FieldChain, SelectorChain};

pub fn profile() -> Result<SiteProfile, ScrapeError> {
    Ok(SiteProfile {
        id: SourceId::Geekjob,
        base_url: Url::parse("https://geekjob.ru").map_err(|e| ScrapeError::Other(e.to_string()))?,
        search: SearchUrl {
            endpoint: "https://geekjob.ru/vacancies",
            query_param: "q",
            page_param: "page",
            zero_based: false,
            extra: &[],
        },
        id_pattern: Regex::new(r"/vacancy/([0-9a-z]+)")?,
        listing: SelectorChain::new(
            "listing",
            &[
                ".vacancy-card",
                ".vacancy-item",
                ".job-card",
                ".vacancy",
                "[data-testid*='vacancy']",
                ".search-result-item",
                ".job-item",
            ],
        )?,
        card: CardFields {
            link: FieldChain::attr("link", "href", &["a[href*='/vacancy/']", "a[href]"])?,
            title: FieldChain::text("title", &["h3", ".title", ".job-title", ".vacancy-title", "a"])?,
            company: Some(FieldChain::text(
                "company",
                &[".company", ".employer", ".job-company", "span"],
            )?),
            location: Some(FieldChain::text("location", &[".location", ".city", ".job-location"])?),
            salary: Some(FieldChain::text("salary", &[".salary", ".job-salary", ".wage"])?),
            salary_from_text: false,
            description: Some(FieldChain::text("description", &[".description", ".job-description"])?),
            published: Some(FieldChain::text("date", &[".date", ".published", ".job-date"])?),
            logo: None,
        },
        detail: None,
        mode: FetchMode::Rendered,
    })
}
