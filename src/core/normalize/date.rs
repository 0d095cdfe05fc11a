//! Date, timestamp, and year parsing
//!
//! Accepts the formats staff type (`09/08/2025`) and the ones spreadsheet
//! tools write back (`2025-08-09 06:50:00`). Everything else is `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parses a calendar date, day-first for slash and dash forms
///
/// # Examples
///
/// ```
/// use radicacion::core::normalize::parse_date;
/// use chrono::NaiveDate;
///
/// assert_eq!(parse_date("09/08/2025"), NaiveDate::from_ymd_opt(2025, 8, 9));
/// assert_eq!(parse_date("31/02/2025"), None);
/// ```
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| parse_naive_datetime(trimmed).map(|dt| dt.date()))
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}

/// Parses a timestamp; naive values are taken as UTC, bare dates as midnight
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    parse_naive_datetime(trimmed)
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Parses a four-digit coverage year, tolerating a float rendering (`2024.0`)
pub fn parse_year(text: &str) -> Option<i32> {
    let trimmed = text.trim();
    let digits = match trimmed.split_once('.') {
        Some((whole, fraction)) if !fraction.is_empty() && fraction.bytes().all(|b| b == b'0') => {
            whole
        }
        Some(_) => return None,
        None => trimmed,
    };

    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits
        .parse()
        .ok()
        .filter(|year| (1900..=2100).contains(year))
}

fn parse_naive_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    #[test_case("2025-08-09", 2025, 8, 9)]
    #[test_case("09/08/2025", 2025, 8, 9)]
    #[test_case("09-08-2025", 2025, 8, 9)]
    #[test_case("2025/08/09", 2025, 8, 9)]
    #[test_case("2025-08-09 06:50:00", 2025, 8, 9)]
    #[test_case("2025-08-09T06:50:00", 2025, 8, 9)]
    #[test_case("2025-08-09T06:50:00Z", 2025, 8, 9)]
    fn test_parse_date_accepts(input: &str, y: i32, m: u32, d: u32) {
        assert_eq!(parse_date(input), NaiveDate::from_ymd_opt(y, m, d));
    }

    #[test_case("")]
    #[test_case("NaT")]
    #[test_case("32/01/2025")]
    #[test_case("agosto")]
    fn test_parse_date_rejects(input: &str) {
        assert_eq!(parse_date(input), None);
    }

    #[test]
    fn test_parse_timestamp_naive_is_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 8, 9, 6, 50, 0).unwrap();
        assert_eq!(parse_timestamp("2025-08-09 06:50:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-08-09T06:50:00+00:00"), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_date_only_is_midnight() {
        let expected = Utc.with_ymd_and_hms(2025, 8, 9, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-08-09"), Some(expected));
    }

    #[test_case("2024", Some(2024))]
    #[test_case(" 2025 ", Some(2025))]
    #[test_case("2024.0", Some(2024))]
    #[test_case("2024.5", None)]
    #[test_case("24", None)]
    #[test_case("year", None)]
    #[test_case("1800", None)]
    #[test_case("", None)]
    fn test_parse_year(input: &str, expected: Option<i32>) {
        assert_eq!(parse_year(input), expected);
    }
}
