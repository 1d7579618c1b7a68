//! Date helpers for stats queries and record timestamps.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::models::StatsResponse;

/// How far back stats queries look by default.
pub const DEFAULT_SINCE_MONTHS: u32 = 12;

/// Midnight UTC on the first day of the month `months_back` months before `now`.
pub fn since_date(now: DateTime<Utc>, months_back: u32) -> DateTime<Utc> {
    let first_of_month = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .unwrap_or_else(|| now.date_naive());
    let start = first_of_month
        .checked_sub_months(Months::new(months_back))
        .unwrap_or(first_of_month);
    Utc.from_utc_datetime(&start.and_time(chrono::NaiveTime::MIN))
}

/// ISO 8601 without fractional seconds, as the stats API expects for `from`.
pub fn iso_without_ms(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// `since_date` formatted for a query.
pub fn since_query_param(now: DateTime<Utc>, months_back: u32) -> String {
    iso_without_ms(since_date(now, months_back))
}

/// Parse a record date. The API returns RFC 3339, or a naive
/// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DD` that is taken as UTC.
pub fn parse_record_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| Utc.from_utc_datetime(&d.and_time(chrono::NaiveTime::MIN)))
}

/// Latest parseable date among `data`.
pub fn max_date(data: &[StatsResponse]) -> Option<DateTime<Utc>> {
    data.iter().filter_map(|d| d.parsed_date()).max()
}

pub fn older_than(ts: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - ts > ttl
}

pub fn more_than_one_hour_ago(ts: DateTime<Utc>) -> bool {
    older_than(ts, Utc::now(), Duration::hours(1))
}
