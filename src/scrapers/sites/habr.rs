//! Habr Career: server-rendered cards, details on the vacancy page.

use regex::Regex;
use url::Url;

use crate::models::SourceId;
use crate::scrapers::adapter::{CardFields, DetailFields, FetchMode, SearchUrl, SiteProfile};
use crate::scrapers::error::ScrapeError;
use crate::scrapers::selector::{FieldChain, SelectorChain};

pub fn profile() -> Result<SiteProfile, ScrapeError> {
    Ok(SiteProfile {
        id: SourceId::Habr,
        base_url: Url::parse("https://career.habr.com")
            .map_err(|e| ScrapeError::Other(e.to_string()))?,
        search: SearchUrl {
            endpoint: "https://career.habr.com/vacancies",
            query_param: "q",
            page_param: "page",
            zero_based: false,
            extra: &[],
        },
        id_pattern: Regex::new(r"/vacancies/(\d+)")?,
        listing: SelectorChain::new(
            "listing",
            &[".vacancy-card", "a[href*='/vacancies/']"],
        )?,
        card: CardFields {
            link: FieldChain::attr(
                "link",
                "href",
                &["a.vacancy-card__title-link", "a[href*='/vacancies/']"],
            )?,
            title: FieldChain::text(
                "title",
                &[".vacancy-card__title", "a[href*='/vacancies/']"],
            )?,
            company: Some(FieldChain::text(
                "company",
                &[".vacancy-card__company-title", ".vacancy-card__company"],
            )?),
            location: Some(FieldChain::text(
                "location",
                &[".vacancy-card__meta", ".vacancy-card__location"],
            )?),
            salary: Some(FieldChain::text("salary", &[".vacancy-card__salary"])?),
            salary_from_text: false,
            description: Some(FieldChain::text("description", &[".vacancy-card__skills"])?),
            published: Some(FieldChain::text("date", &[".vacancy-card__date time", ".vacancy-card__date"])?),
            logo: Some(FieldChain::attr("logo", "src", &["img.vacancy-card__icon", ".vacancy-card__icon img"])?),
        },
        detail: Some(DetailFields {
            title: Some(FieldChain::text(
                "title",
                &[".vacancy-header__title", ".vacancy-card__title", ".vacancy-title", "h1"],
            )?),
            company: Some(FieldChain::text(
                "company",
                &[".company_name", ".vacancy-card__company", ".company-name", ".vacancy-company"],
            )?),
            location: Some(FieldChain::text(
                "location",
                &[".vacancy-card__location", ".location", ".vacancy-location"],
            )?),
            salary: Some(FieldChain::text(
                "salary",
                &[".vacancy-header__salary", ".vacancy-card__salary", ".salary", ".vacancy-salary"],
            )?),
            description: Some(FieldChain::text(
                "description",
                &[".vacancy-description__text", ".vacancy-card__description", ".description", ".vacancy-description"],
            )?),
            requirements: Some(FieldChain::text(
                "requirements",
                &[".vacancy-card__requirements", ".requirements", ".vacancy-requirements"],
            )?),
            tasks: Some(FieldChain::text(
                "tasks",
                &[".vacancy-card__tasks", ".tasks", ".vacancy-tasks"],
            )?),
            conditions: Some(FieldChain::text(
                "conditions",
                &[".vacancy-card__conditions", ".conditions", ".vacancy-conditions"],
            )?),
            benefits: Some(FieldChain::text("benefits", &[".vacancy-benefits", ".benefits"])?),
            employment_type: Some(FieldChain::text(
                "employment",
                &[".vacancy-card__employment", ".employment", ".vacancy-employment"],
            )?),
            experience_level: Some(FieldChain::text(
                "experience",
                &[".vacancy-card__experience", ".experience", ".vacancy-experience"],
            )?),
            remote_type: Some(FieldChain::text("remote", &[".vacancy-remote", ".remote"])?),
            company_logo: Some(FieldChain::attr(
                "logo",
                "src",
                &[".vacancy-card__logo img", ".company-logo img", ".vacancy-logo img"],
            )?),
            company_url: Some(FieldChain::attr(
                "company url",
                "href",
                &[".vacancy-card__company-url a", ".company-url a", ".vacancy-company-url a"],
            )?),
        }),
        mode: FetchMode::Direct,
    })
}
