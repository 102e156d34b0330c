//! Date parsing and normalization for stored log dates.
//!
//! Logs are canonically ISO-8601, but older records carry strings like
//! `"14/02/2023 - Leg Day"`. Anything that cannot be read becomes
//! [`NormalizedDate::Unknown`] rather than an error.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::trace;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Legacy separator between the date and a trailing human annotation.
const LEGACY_ANNOTATION_SEPARATOR: &str = " - ";

/// Calendar day of a log, or `Unknown` when its date cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "status", content = "date", rename_all = "snake_case")]
pub enum NormalizedDate {
    Valid(NaiveDate),
    Unknown,
}

impl NormalizedDate {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Valid(d) => Some(*d),
            Self::Unknown => None,
        }
    }

    /// Calendar year, or 0 for `Unknown`. 0 means "unparseable", never a real year.
    pub fn year(&self) -> i32 {
        self.date().map_or(0, |d| d.year())
    }

    /// Zero-based month.
    pub fn month0(&self) -> Option<u32> {
        self.date().map(|d| d.month0())
    }

    pub fn day(&self) -> Option<u32> {
        self.date().map(|d| d.day())
    }

    /// Short month name, `"--"` when unknown.
    pub fn month_label(&self) -> &'static str {
        match self.date() {
            Some(d) => MONTH_LABELS[d.month0() as usize],
            None => "--",
        }
    }

    /// Day of month, `"---"` when unknown.
    pub fn day_label(&self) -> String {
        match self.date() {
            Some(d) => d.day().to_string(),
            None => "---".to_string(),
        }
    }

    /// Zero-padded `YYYY-MM-DD`.
    pub fn day_key(&self) -> Option<String> {
        self.date().map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// Zero-padded `YYYY-MM-DD` key for a calendar position with a zero-based month.
pub fn day_key(year: i32, month0: u32, day: u32) -> String {
    format!("{:04}-{:02}-{:02}", year, month0.saturating_add(1), day)
}

/// Parse an ISO-style timestamp.
///
/// Accepts RFC 3339, naive date-times (interpreted in `tz`), and bare
/// `YYYY-MM-DD` dates (UTC midnight).
pub fn parse_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Calendar day of a stored date string, as seen in `tz`.
pub fn normalize<Tz: TimeZone>(raw: &str, tz: &Tz) -> NormalizedDate {
    // A bare date is already a calendar day; do not shift it through UTC
    if let Ok(d) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        return NormalizedDate::Valid(d);
    }

    if let Some(ts) = parse_timestamp(raw, tz) {
        return NormalizedDate::Valid(ts.with_timezone(tz).date_naive());
    }

    if raw.contains('/') {
        let head = raw
            .split(LEGACY_ANNOTATION_SEPARATOR)
            .next()
            .unwrap_or(raw)
            .trim()
            .replace('/', "-");

        if let Some(d) = parse_legacy(&head, tz) {
            return NormalizedDate::Valid(d);
        }
    }

    trace!(raw, "Unparseable log date");
    NormalizedDate::Unknown
}

/// Instant used to place a log on the timeline.
///
/// A parseable timestamp wins; otherwise a readable legacy date is placed at
/// its local midnight.
pub fn timeline_instant<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    parse_timestamp(raw, tz).or_else(|| {
        let naive = normalize(raw, tz).date()?.and_hms_opt(0, 0, 0)?;
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

fn parse_legacy<Tz: TimeZone>(candidate: &str, tz: &Tz) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(candidate, "%d-%m-%Y")
        .or_else(|_| NaiveDate::parse_from_str(candidate, "%Y-%m-%d"))
        .ok()
        .or_else(|| parse_timestamp(candidate, tz).map(|ts| ts.with_timezone(tz).date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_parse_timestamp_formats() {
        let utc = Utc;
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2024-03-01T10:00:00Z", &utc), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01T10:00:00.000Z", &utc),
            Some(expected)
        );
        assert_eq!(
            parse_timestamp("2024-03-01T12:00:00+02:00", &utc),
            Some(expected)
        );
        assert_eq!(parse_timestamp("2024-03-01T10:00:00", &utc), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01", &utc),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("not-a-date", &utc), None);
        assert_eq!(parse_timestamp("14/02/2023 - Leg Day", &utc), None);
    }

    #[test]
    fn test_naive_timestamp_uses_timezone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            parse_timestamp("2024-03-01T10:00:00", &tz),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_normalize_iso_in_timezone() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        // 02:00 UTC on the 1st is still the 29th of February in UTC-5
        let date = normalize("2024-03-01T02:00:00Z", &tz);
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month0(), Some(1));
        assert_eq!(date.day(), Some(29));
    }

    #[test]
    fn test_normalize_bare_date_is_not_shifted() {
        let tz = FixedOffset::west_opt(8 * 3600).unwrap();
        assert_eq!(
            normalize("2024-03-01", &tz).date(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn test_normalize_legacy_slash_date() {
        let date = normalize("14/02/2023 - Leg Day", &Utc);
        assert!(date.is_valid());
        assert_eq!(date.year(), 2023);
        assert_eq!(date.month0(), Some(1));
        assert_eq!(date.day(), Some(14));
        assert_eq!(date.month_label(), "Feb");
        assert_eq!(date.day_label(), "14");
        assert_eq!(date.day_key().as_deref(), Some("2023-02-14"));
    }

    #[test]
    fn test_normalize_legacy_without_annotation() {
        assert_eq!(
            normalize("2023/02/14", &Utc).date(),
            NaiveDate::from_ymd_opt(2023, 2, 14)
        );
        assert_eq!(
            normalize("01/12/2022", &Utc).date(),
            NaiveDate::from_ymd_opt(2022, 12, 1)
        );
    }

    #[test]
    fn test_normalize_unknown_sentinel() {
        for raw in ["not-a-date", "", "99/99/9999 - ???", "Leg Day"] {
            let date = normalize(raw, &Utc);
            assert_eq!(date, NormalizedDate::Unknown, "{raw:?}");
            assert_eq!(date.year(), 0);
            assert_eq!(date.month_label(), "--");
            assert_eq!(date.day_label(), "---");
            assert_eq!(date.day_key(), None);
        }
    }

    #[test]
    fn test_timeline_instant_places_legacy_dates() {
        assert_eq!(
            timeline_instant("14/02/2023 - Leg Day", &Utc),
            Some(Utc.with_ymd_and_hms(2023, 2, 14, 0, 0, 0).unwrap())
        );
        assert_eq!(timeline_instant("not-a-date", &Utc), None);
    }

    #[test]
    fn test_day_key_padding() {
        assert_eq!(day_key(2024, 0, 5), "2024-01-05");
        assert_eq!(day_key(987, 11, 31), "0987-12-31");
    }
}
