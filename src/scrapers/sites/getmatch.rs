//! GetMatch: every field lives on the search card, no detail fetch.

use regex::Regex;
use url::Url;

use crate::models::SourceId;
use crate::scrapers::adapter::{CardFields, FetchMode, SearchUrl, SiteProfile};
use crate::scrapers::error::ScrapeError;
use crate::scrapers::selector::{FieldChain, SelectorChain};

pub fn profile() -> Result<SiteProfile, ScrapeError> {
    Ok(SiteProfile {
        id: SourceId::GetMatch,
        base_url: Url::parse("https://getmatch.ru").map_err(|e| ScrapeError::Other(e.to_string()))?,
        search: SearchUrl {
            endpoint: "https://getmatch.ru/vacancies",
            query_param: "q",
            page_param: "page",
            zero_based: false,
            extra: &[],
        },
        id_pattern: Regex::new(r"/vacancy/([^/?#]+)")?,
        listing: SelectorChain::new("listing", &[".b-vacancy-card", "a[href*='/vacancy/']"])?,
        card: CardFields {
            link: FieldChain::attr("link", "href", &["a[href*='/vacancy/']"])?,
            title: FieldChain::text("title", &[".vacancy-card__title", ".b-vacancy-card-title", "h3"])?,
            company: Some(FieldChain::text(
                "company",
                &[".vacancy-card__company", ".b-vacancy-card-subtitle__company"],
            )?),
            location: Some(FieldChain::text(
                "location",
                &[".vacancy-card__location", ".b-vacancy-card-subtitle__location"],
            )?),
            salary: Some(FieldChain::text(
                "salary",
                &[".vacancy-card__salary", ".b-vacancy-card-subtitle__salary"],
            )?),
            salary_from_text: true,
            description: Some(FieldChain::text("description", &[".vacancy-card__description", ".b-vacancy-card-description"])?),
            published: Some(FieldChain::text("date", &[".vacancy-card__date", ".b-vacancy-card-header__publish-date"])?),
            logo: Some(FieldChain::attr("logo", "src", &[".vacancy-card__logo img", "img"])?),
        },
        detail: None,
        mode: FetchMode::Direct,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::LifecycleStatus;
    use crate::scrapers::adapter::parse_listing;

    const LISTING: &str = r#"
        <a href="/vacancy/12345-senior-product-designer?s=search">
          <div class="vacancy-card__title">Senior Product Designer</div>
          <div class="vacancy-card__company">Fintech Co</div>
          <div class="vacancy-card__location">Remote</div>
          <div class="vacancy-card__salary">$4 000 – 5 500</div>
          <div class="vacancy-card__date">05.03.2024</div>
        </a>
        <a href="/vacancy/777-illustrator">
          <h3>Illustrator</h3>
          <span>250 000 ₽ на руки</span>
          <div class="vacancy-card__date">когда-то</div>
        </a>
    "#;

    #[test]
    fn test_summary_cards() {
        let profile = profile().unwrap();
        let page = parse_listing(&profile, LISTING);
        assert_eq!(page.postings.len(), 2);

        let first = &page.postings[0];
        assert_eq!(first.external_id, "12345-senior-product-designer");
        assert_eq!(first.url, "https://getmatch.ru/vacancy/12345-senior-product-designer");
        assert_eq!(first.company, "Fintech Co");
        assert_eq!(first.salary, "$4 000 – 5 500");
        assert_eq!(first.published_at, Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()));
        assert_eq!(first.status, LifecycleStatus::Pending);
        assert!(first.needs_formatting);

        let second = &page.postings[1];
        assert_eq!(second.title, "Illustrator");
        assert_eq!(second.salary, "250 000 ₽");
        // Unparsable date falls back to harvest time.
        assert_eq!(second.published_at, Some(second.harvested_at));
    }

    #[test]
    fn test_no_detail_fetch() {
        assert!(profile().unwrap().detail.is_none());
    }
}
