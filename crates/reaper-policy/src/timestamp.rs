//! Update-timestamp parsing.

use std::borrow::Cow;

use chrono::{DateTime, ParseError, Utc};

/// Rewrite a trailing `Z`/`z` UTC designator as an explicit `+00:00` offset.
pub fn normalize_utc_designator(ts: &str) -> Cow<'_, str> {
    let trimmed = ts.trim();
    match trimmed.strip_suffix(['Z', 'z']) {
        Some(base) => Cow::Owned(format!("{base}+00:00")),
        None => Cow::Borrowed(trimmed),
    }
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_update_time(ts: &str) -> Result<DateTime<Utc>, ParseError> {
    let normalized = normalize_utc_designator(ts);
    DateTime::parse_from_rfc3339(&normalized).map(|dt| dt.with_timezone(&Utc))
}

/// Seconds from `since` to `now`, with sub-second precision.
///
/// Negative when `since` lies in the future.
pub fn elapsed_seconds(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let delta = now.signed_duration_since(since);
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        // Out of i64 nanosecond range (~292 years); millis are plenty.
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_suffix_is_normalized() {
        assert_eq!(
            normalize_utc_designator("2024-05-01T10:00:00Z"),
            "2024-05-01T10:00:00+00:00"
        );
        assert_eq!(
            normalize_utc_designator("2024-05-01T10:00:00.5z"),
            "2024-05-01T10:00:00.5+00:00"
        );
    }

    #[test]
    fn explicit_offset_is_untouched() {
        let ts = "2024-05-01T10:00:00-07:00";
        assert!(matches!(normalize_utc_designator(ts), Cow::Borrowed(_)));
    }

    #[test]
    fn z_and_offset_parse_to_same_instant() {
        let z = parse_update_time("2024-05-01T10:00:00.123456Z").unwrap();
        let offset = parse_update_time("2024-05-01T10:00:00.123456+00:00").unwrap();
        assert_eq!(z, offset);
    }

    #[test]
    fn non_utc_offsets_convert_to_utc() {
        let pacific = parse_update_time("2024-05-01T03:00:00-07:00").unwrap();
        let utc = parse_update_time("2024-05-01T10:00:00Z").unwrap();
        assert_eq!(pacific, utc);
    }

    #[test]
    fn garbage_fails_to_parse() {
        assert!(parse_update_time("yesterday").is_err());
        assert!(parse_update_time("").is_err());
        // No offset at all: ambiguous, rejected.
        assert!(parse_update_time("2024-05-01T10:00:00").is_err());
    }

    #[test]
    fn elapsed_keeps_fractions_and_sign() {
        let earlier = parse_update_time("2024-05-01T10:00:00Z").unwrap();
        let later = parse_update_time("2024-05-01T10:00:01.5Z").unwrap();
        assert_eq!(elapsed_seconds(earlier, later), 1.5);
        assert_eq!(elapsed_seconds(later, earlier), -1.5);
    }
}
