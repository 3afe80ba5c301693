//! Best-effort timestamp normalization.
//!
//! GitHub and the stores report timestamps in RFC 3339, but overrides and
//! older payloads sometimes carry plain dates or naive times. Parsing never
//! fails loudly here: a string that cannot be understood is passed through
//! unchanged.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Parses an RFC 3339 instant, a naive date-time (taken as UTC) or a plain
/// `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Formats an instant as `2025-01-09T15:30:00.000Z`.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reduces a timestamp to its UTC calendar date, e.g. `2025-01-10`.
pub fn to_calendar_date(value: &str) -> String {
    parse_timestamp(value)
        .map(|instant| instant.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Rewrites a timestamp in full ISO-8601 instant form.
pub fn to_iso_instant(value: &str) -> String {
    parse_timestamp(value)
        .map(format_instant)
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_date_from_instant() {
        assert_eq!(to_calendar_date("2025-01-10T14:30:00Z"), "2025-01-10");
    }

    #[test]
    fn test_calendar_date_uses_utc() {
        assert_eq!(to_calendar_date("2025-01-10T01:30:00+09:00"), "2025-01-09");
    }

    #[test]
    fn test_calendar_date_is_idempotent() {
        assert_eq!(to_calendar_date("2025-01-10"), "2025-01-10");
    }

    #[test]
    fn test_iso_instant_adds_millis() {
        assert_eq!(
            to_iso_instant("2025-01-09T15:30:00Z"),
            "2025-01-09T15:30:00.000Z"
        );
        assert_eq!(
            to_iso_instant("2025-01-09T15:30:00.123456+00:00"),
            "2025-01-09T15:30:00.123Z"
        );
    }

    #[test]
    fn test_naive_inputs_are_utc() {
        assert_eq!(to_iso_instant("2025-01-09T15:30:00"), "2025-01-09T15:30:00.000Z");
        assert_eq!(to_iso_instant("2025-01-09"), "2025-01-09T00:00:00.000Z");
    }

    #[test]
    fn test_unparseable_values_pass_through() {
        assert_eq!(to_calendar_date("next tuesday"), "next tuesday");
        assert_eq!(to_iso_instant("soon"), "soon");
        assert_eq!(to_iso_instant(""), "");
    }

    #[test]
    fn test_parse_timestamp_orders_instants() {
        let earlier = parse_timestamp("2025-01-14T15:30:00Z").unwrap();
        let later = parse_timestamp("2025-01-15T10:00:00Z").unwrap();
        assert!(earlier < later);
        assert!(parse_timestamp("garbage").is_none());
    }
}
