//! Text forms of temporal values
//!
//! Dump profile: UTC, RFC 3339 with a `+00:00` offset. A zero fraction is
//! left out, whole microseconds take six digits and anything finer takes
//! nine, so every `DateTime<Utc>` survives a round trip. Dates are
//! `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub(crate) fn format_datetime(value: &DateTime<Utc>) -> String {
    let nanos = value.nanosecond();
    let format = if nanos == 0 {
        "%Y-%m-%dT%H:%M:%S+00:00"
    } else if nanos % 1_000 == 0 {
        "%Y-%m-%dT%H:%M:%S%.6f+00:00"
    } else {
        "%Y-%m-%dT%H:%M:%S%.9f+00:00"
    };
    value.format(format).to_string()
}

pub(crate) fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// Any RFC 3339 offset, or a naive timestamp taken as UTC
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, NAIVE_DATETIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_whole_seconds_have_no_fraction() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(format_datetime(&dt), "2024-03-01T12:30:00+00:00");
    }

    #[test]
    fn test_fraction_is_six_digits() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
            + chrono::Duration::microseconds(1500);
        assert_eq!(format_datetime(&dt), "2024-03-01T12:30:00.001500+00:00");
    }

    #[test]
    fn test_sub_microsecond_fraction_is_nine_digits() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(1500);
        let text = format_datetime(&dt);
        assert_eq!(text, "2024-01-01T00:00:00.000001500+00:00");
        assert_eq!(parse_datetime(&text), Some(dt));

        let tiny = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(7);
        assert_eq!(format_datetime(&tiny), "2024-01-01T00:00:00.000000007+00:00");
    }

    #[test]
    fn test_parse_offsets_normalise_to_utc() {
        let parsed = parse_datetime("2024-03-01T14:30:00+02:00").unwrap();
        assert_eq!(format_datetime(&parsed), "2024-03-01T12:30:00+00:00");

        let naive = parse_datetime("2024-03-01T12:30:00.25").unwrap();
        assert_eq!(format_datetime(&naive), "2024-03-01T12:30:00.250000+00:00");
    }

    #[test]
    fn test_date_round_trip() {
        let date = parse_date("2024-02-29").unwrap();
        assert_eq!(format_date(&date), "2024-02-29");
        assert!(parse_date("29/02/2024").is_none());
    }
}
