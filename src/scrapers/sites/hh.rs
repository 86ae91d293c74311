//! HH.ru: server-rendered search with a detail page per vacancy.

use regex::Regex;
use url::Url;

use crate::models::SourceId;
use crate::scrapers::adapter::{CardFields, DetailFields, FetchMode, SearchUrl, SiteProfile};
use crate::scrapers::error::ScrapeError;
use crate::scrapers::selector::{FieldChain, SelectorChain};

pub fn profile() -> Result<SiteProfile, ScrapeError> {
    Ok(SiteProfile {
        id: SourceId::Hh,
        base_url: Url::parse("https://hh.ru").map_err(|e| ScrapeError::Other(e.to_string()))?,
        search: SearchUrl {
            endpoint: "https://hh.ru/search/vacancy",
            query_param: "text",
            page_param: "page",
            zero_based: true,
            // Moscow, 50 per page.
            extra: &[("area", "1"), ("per_page", "50")],
        },
        id_pattern: Regex::new(r"/vacancy/(\d+)")?,
        listing: SelectorChain::new(
            "listing",
            &[
                "[data-qa='vacancy-serp__vacancy']",
                "[data-qa*='vacancy-serp__vacancy_']",
                ".vacancy-serp-item",
                ".serp-item",
            ],
        )?,
        card: CardFields {
            link: FieldChain::attr(
                "link",
                "href",
                &[
                    "a[data-qa='serp-item__title']",
                    "a[data-qa='vacancy-serp__vacancy-title']",
                    "a[href*='/vacancy/']",
                ],
            )?,
            title: FieldChain::text(
                "title",
                &[
                    "[data-qa='serp-item__title-text']",
                    "a[data-qa='serp-item__title']",
                    "a[data-qa='vacancy-serp__vacancy-title']",
                ],
            )?,
            company: Some(FieldChain::text(
                "company",
                &["[data-qa='vacancy-serp__vacancy-employer']", ".vacancy-serp-item__meta-info-company"],
            )?),
            location: Some(FieldChain::text(
                "location",
                &["[data-qa='vacancy-serp__vacancy-address']"],
            )?),
            salary: Some(FieldChain::text(
                "salary",
                &["[data-qa='vacancy-serp__vacancy-compensation']", ".compensation-text"],
            )?),
            salary_from_text: false,
            description: Some(FieldChain::text(
                "description",
                &[
                    "[data-qa='vacancy-serp__vacancy_snippet_responsibility']",
                    "[data-qa='vacancy-serp__vacancy_snippet_requirement']",
                ],
            )?),
            published: None,
            logo: Some(FieldChain::attr(
                "logo",
                "src",
                &["[data-qa='vacancy-serp__vacancy-employer-logo'] img", "img.vacancy-serp-item-logo"],
            )?),
        },
        detail: Some(DetailFields {
            title: Some(FieldChain::text("title", &["[data-qa='vacancy-title']", "h1"])?),
            company: Some(FieldChain::text("company", &["[data-qa='vacancy-company-name']"])?),
            location: Some(FieldChain::text(
                "location",
                &["[data-qa='vacancy-view-location']", "[data-qa='vacancy-location']"],
            )?),
            salary: Some(FieldChain::text(
                "salary",
                &["[data-qa='vacancy-salary']", "[data-qa='vacancy-salary-compensation-type-net']"],
            )?),
            description: Some(FieldChain::text("description", &["[data-qa='vacancy-description']"])?),
            requirements: Some(FieldChain::text("requirements", &["[data-qa='vacancy-requirements']"])?),
            tasks: Some(FieldChain::text("tasks", &["[data-qa='vacancy-tasks']"])?),
            conditions: Some(FieldChain::text("conditions", &["[data-qa='vacancy-conditions']"])?),
            benefits: None,
            employment_type: Some(FieldChain::text(
                "employment",
                &["[data-qa='vacancy-view-employment-mode']", "[data-qa='vacancy-employment-type']"],
            )?),
            experience_level: Some(FieldChain::text(
                "experience",
                &["[data-qa='vacancy-experience']"],
            )?),
            remote_type: Some(FieldChain::text(
                "remote",
                &["[data-qa='vacancy-view-accept-temporary']", "[data-qa='vacancy-work-format']"],
            )?),
            company_logo: Some(FieldChain::attr(
                "logo",
                "src",
                &["[data-qa='vacancy-company-logo'] img", "img[data-qa='vacancy-company-logo']"],
            )?),
            company_url: Some(FieldChain::attr(
                "company url",
                "href",
                &["[data-qa='vacancy-company-url'] a", "a[data-qa='vacancy-company-name']"],
            )?),
        }),
        mode: FetchMode::Direct,
    })
}
