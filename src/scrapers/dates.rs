//! Publication date parsing for listing cards.
//!
//! Boards print dates in several shapes. Formats are tried in order and the
//! first hit wins; text nothing understands becomes "now", which is an
//! approximation callers accept rather than a precise timestamp.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// DD.MM.YYYY anywhere in the text.
static DOTTED_DMY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b").unwrap());

/// YYYY-MM-DD anywhere in the text.
static ISO_YMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());

/// "12 марта 2024", "3 мая" (year optional).
static RU_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})\s+(января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря)(?:\s+(\d{4}))?",
    )
    .unwrap()
});

const RU_MONTHS: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// Which rule produced a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRule {
    Rfc3339,
    DottedDmy,
    IsoYmd,
    MonthName,
    Relative,
    /// Nothing matched; the value is the harvest time.
    Fallback,
}

/// Parse a card's raw date text, falling back to `now`.
pub fn parse_published(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    parse_with_rule(raw, now).0
}

/// Like [`parse_published`], also reporting which rule matched.
pub fn parse_with_rule(raw: &str, now: DateTime<Utc>) -> (DateTime<Utc>, DateRule) {
    match try_parse(raw, now) {
        Some((date, rule)) => (date, rule),
        None => (now, DateRule::Fallback),
    }
}

/// Try every known format. `now` anchors relative words and year-less dates.
pub fn try_parse(raw: &str, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateRule)> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    // Full timestamps first so the ISO date rule doesn't drop their time part.
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some((dt.with_timezone(&Utc), DateRule::Rfc3339));
    }

    if let Some(caps) = DOTTED_DMY.captures(text) {
        if let Some(date) = ymd(&caps[3], &caps[2], &caps[1]) {
            return Some((date, DateRule::DottedDmy));
        }
    }

    if let Some(caps) = ISO_YMD.captures(text) {
        if let Some(date) = ymd(&caps[1], &caps[2], &caps[3]) {
            return Some((date, DateRule::IsoYmd));
        }
    }

    if let Some(date) = month_name_date(text, now) {
        return Some((date, DateRule::MonthName));
    }

    let lower = text.to_lowercase();
    if lower.contains("сегодня") || lower.contains("today") {
        return Some((now, DateRule::Relative));
    }
    if lower.contains("вчера") || lower.contains("yesterday") {
        return Some((now - Duration::days(1), DateRule::Relative));
    }

    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
    midnight(date)
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

fn month_name_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = RU_MONTH_DAY.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month_word = caps[2].to_lowercase();
    let month = RU_MONTHS.iter().position(|m| *m == month_word)? as u32 + 1;

    match caps.get(3) {
        Some(year) => midnight(NaiveDate::from_ymd_opt(year.as_str().parse().ok()?, month, day)?),
        None => {
            // Year-less dates refer to the most recent such day.
            let this_year = midnight(NaiveDate::from_ymd_opt(now.year(), month, day)?)?;
            if this_year > now {
                midnight(NaiveDate::from_ymd_opt(now.year() - 1, month, day)?)
            } else {
                Some(this_year)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_dotted_date() {
        assert_eq!(
            try_parse("12.03.2024", now()),
            Some((day(2024, 3, 12), DateRule::DottedDmy))
        );
        assert_eq!(parse_published("Опубликовано 01.02.2024", now()), day(2024, 2, 1));
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(
            try_parse("2024-01-15", now()),
            Some((day(2024, 1, 15), DateRule::IsoYmd))
        );
    }

    #[test]
    fn test_rfc3339_keeps_time() {
        let (date, rule) = try_parse("2024-03-18T09:30:00+03:00", now()).unwrap();
        assert_eq!(rule, DateRule::Rfc3339);
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 3, 18, 6, 30, 0).unwrap());
    }

    #[test]
    fn test_russian_month_names() {
        assert_eq!(parse_published("12 марта 2024", now()), day(2024, 3, 12));
        assert_eq!(parse_published("5 Января", now()), day(2024, 1, 5));
        // Later in the year than "now" means last year.
        assert_eq!(parse_published("25 декабря", now()), day(2023, 12, 25));
    }

    #[test]
    fn test_relative_words() {
        assert_eq!(parse_published("Сегодня", now()), now());
        assert_eq!(parse_published("yesterday", now()), now() - Duration::days(1));
    }

    #[test]
    fn test_unparsable_falls_back_to_now() {
        assert_eq!(parse_with_rule("недавно", now()), (now(), DateRule::Fallback));
        assert_eq!(parse_with_rule("", now()), (now(), DateRule::Fallback));
        // Impossible calendar dates are not accepted.
        assert_eq!(parse_with_rule("31.02.2024", now()).1, DateRule::Fallback);
    }
}
