//! HireHi: rendered job cards; salary often sits in unlabeled card text.

use regex::Regex;
use url::Url;

use crate::models::SourceId;
use crate::scrapers::adapter::{CardFields, FetchMode, SearchUrl, SiteProfile};
use crate::scrapers::error::ScrapeError;
use crate::scrapers::selector::{FieldChain, SelectorChain};

pub fn profile() -> Result<SiteProfile, ScrapeError> {
    Ok(SiteProfile {
        id: SourceId::HireHi,
        base_url: Url::parse("https://hirehi.com").map_err(|e| ScrapeError::Other(e.to_string()))?,
        search: SearchUrl {
            endpoint: "https://hirehi.com/jobs",
            query_param: "q",
            page_param: "page",
            zero_based: false,
            extra: &[],
        },
        id_pattern: Regex::new(r"/(?:job|vacancy)/([^/?#]+)")?,
        listing: SelectorChain::new(
            "listing",
            &[
                "div.job-card",
                "div.vacancy-card",
                "article.job-item",
                "div[data-testid=\"job-card\"]",
                "a[href*=\"/job/\"]",
                "a[href*=\"/vacancy/\"]",
            ],
        )?,
        card: CardFields {
            link: FieldChain::attr(
                "link",
                "href",
                &["a[href*=\"/vacancy/\"]", "a[href*=\"/job/\"]", "a[href]"],
            )?,
            title: FieldChain::text(
                "title",
                &[".job-title", ".vacancy-title", "[data-testid=\"job-title\"]", "h2", "h3"],
            )?,
            company: Some(FieldChain::text(
                "company",
                &[
                    ".company-name",
                    ".job-company-name",
                    ".job-company",
                    ".vacancy-company",
                    "[data-testid=\"company-name\"]",
                ],
            )?),
            location: Some(FieldChain::text(
                "location",
                &[".location", ".job-location", "[data-testid=\"location\"]"],
            )?),
            salary: Some(FieldChain::text(
                "salary",
                &[".salary", ".job-salary", ".vacancy-salary", "[data-testid=\"salary\"]"],
            )?),
            salary_from_text: true,
            description: Some(FieldChain::text(
                "description",
                &[".job-description", ".description", "[data-testid=\"job-description\"]"],
            )?),
            published: None,
            logo: Some(FieldChain::attr("logo", "src", &[".company-logo img", "img.company-logo"])?),
        },
        detail: None,
        mode: FetchMode::Rendered,
    })
}
