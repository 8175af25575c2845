//! Business-calendar helpers
//!
//! "Today", day buckets and displayed dates follow the business timezone,
//! not the server clock's zone.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const MONTHS_PT: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Sunday-first single-letter weekday labels (pt-BR)
const WEEKDAY_LETTERS: [&str; 7] = ["D", "S", "T", "Q", "Q", "S", "S"];

/// Inclusive date range; `to = None` means open-ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
}

pub fn today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Calendar day of a timestamp in the business timezone
pub fn local_date(at: &DateTime<FixedOffset>, tz: Tz) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

fn localize(tz: Tz, naive: NaiveDateTime) -> DateTime<FixedOffset> {
    tz.from_local_datetime(&naive)
        .earliest()
        // Local time skipped by a DST jump: read it as UTC wall time
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive).with_timezone(&tz))
        .fixed_offset()
}

/// First instant of `date` in the business timezone
pub fn day_start(tz: Tz, date: NaiveDate) -> DateTime<FixedOffset> {
    localize(tz, date.and_time(chrono::NaiveTime::MIN))
}

/// Last millisecond of `date` in the business timezone
pub fn day_end(tz: Tz, date: NaiveDate) -> DateTime<FixedOffset> {
    match date.and_hms_milli_opt(23, 59, 59, 999) {
        Some(naive) => localize(tz, naive),
        None => day_start(tz, date),
    }
}

/// `date` shifted back by `days`, saturating at the calendar minimum
pub fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(chrono::Days::new(days))
        .unwrap_or(NaiveDate::MIN)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `18/10/2026`
pub fn short_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `18 de outubro de 2026`
pub fn long_date(date: NaiveDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        MONTHS_PT[date.month0() as usize],
        date.year()
    )
}

pub fn weekday_letter(date: NaiveDate) -> &'static str {
    WEEKDAY_LETTERS[date.weekday().num_days_from_sunday() as usize]
}

/// Parse a `YYYY-MM-DD` query value
pub fn parse_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn formats_dates_in_portuguese() {
        assert_eq!(long_date(d(2026, 10, 18)), "18 de outubro de 2026");
        assert_eq!(long_date(d(2026, 3, 5)), "5 de março de 2026");
        assert_eq!(short_date(d(2026, 3, 5)), "05/03/2026");
    }

    #[test]
    fn weekday_letters_start_on_sunday() {
        // 2026-10-18 is a Sunday
        assert_eq!(weekday_letter(d(2026, 10, 18)), "D");
        assert_eq!(weekday_letter(d(2026, 10, 20)), "T");
        assert_eq!(weekday_letter(d(2026, 10, 24)), "S");
    }

    #[test]
    fn day_bounds_use_business_offset() {
        let tz: Tz = "America/Sao_Paulo".parse().unwrap();
        let start = day_start(tz, d(2026, 10, 18));
        assert_eq!(start.to_rfc3339(), "2026-10-18T00:00:00-03:00");
        let end = day_end(tz, d(2026, 10, 18));
        assert_eq!(
            end.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
            "2026-10-18T23:59:59.999-03:00"
        );
    }

    #[test]
    fn local_date_crosses_midnight() {
        let tz: Tz = "America/Sao_Paulo".parse().unwrap();
        let at = DateTime::parse_from_rfc3339("2026-10-19T01:30:00Z").unwrap();
        assert_eq!(local_date(&at, tz), d(2026, 10, 18));
    }

    #[test]
    fn calendar_arithmetic() {
        assert_eq!(days_before(d(2026, 10, 18), 30), d(2026, 9, 18));
        assert_eq!(first_of_month(d(2026, 10, 18)), d(2026, 10, 1));
    }

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(parse_date("2026-10-18").unwrap(), d(2026, 10, 18));
        assert!(parse_date("18/10/2026").is_err());
        assert!(parse_date("2026-13-01").is_err());
    }
}
