//! Ordering of a log collection for display.

use std::cmp::Reverse;

use chrono::{DateTime, TimeZone, Utc};
use liftlog_core::SessionLog;

use crate::date::{normalize, timeline_instant};

/// Sort key for one log. Dated logs always rank above undated ones, so the
/// descending order stays total even when some dates cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum TimelineKey {
    Undated(String),
    Dated(DateTime<Utc>, String),
}

impl TimelineKey {
    fn of<Tz: TimeZone>(log: &SessionLog, tz: &Tz) -> Self {
        match timeline_instant(&log.date, tz) {
            Some(ts) => Self::Dated(ts, log.date.clone()),
            None => Self::Undated(log.date.clone()),
        }
    }
}

/// Sort newest first.
///
/// Logs with a readable date come first, descending by instant. Legacy
/// dates without a time sit at local midnight. Logs whose date cannot be
/// read follow, ordered by the raw string descending. Equal keys keep their
/// input order.
pub fn sort_history<Tz: TimeZone>(history: &mut [SessionLog], tz: &Tz) {
    history.sort_by_cached_key(|log| Reverse(TimelineKey::of(log, tz)));
}

/// Borrowing variant of [`sort_history`].
pub fn sorted<'a, Tz: TimeZone>(history: &'a [SessionLog], tz: &Tz) -> Vec<&'a SessionLog> {
    let mut logs: Vec<&SessionLog> = history.iter().collect();
    logs.sort_by_cached_key(|log| Reverse(TimelineKey::of(log, tz)));
    logs
}

/// True when a year header belongs between two adjacent logs.
///
/// Logs with an unknown date never trigger a header.
pub fn needs_year_separator<Tz: TimeZone>(prev: &SessionLog, next: &SessionLog, tz: &Tz) -> bool {
    let prev_year = normalize(&prev.date, tz).year();
    let next_year = normalize(&next.date, tz).year();
    prev_year != 0 && next_year != 0 && prev_year != next_year
}

/// Positions in an already sorted list that start a new year.
pub fn year_separator_indices<Tz: TimeZone>(logs: &[&SessionLog], tz: &Tz) -> Vec<usize> {
    logs.windows(2)
        .enumerate()
        .filter(|(_, pair)| needs_year_separator(pair[0], pair[1], tz))
        .map(|(i, _)| i + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftlog_core::{LogId, SessionKey};
    use std::collections::BTreeMap;

    fn log(id: &str, date: &str) -> SessionLog {
        SessionLog {
            id: LogId::from(id),
            date: date.to_string(),
            session_key: SessionKey {
                year: 2024,
                month_num: 1,
                week: 1,
                session_code: "1".to_string(),
            },
            exercises: Vec::new(),
            duration_minutes: Some(45),
            comments: BTreeMap::new(),
        }
    }

    fn ids(logs: &[&SessionLog]) -> Vec<String> {
        logs.iter().map(|l| l.id.to_string()).collect()
    }

    #[test]
    fn test_sorted_puts_unparseable_last() {
        let history = vec![
            log("a", "2024-03-01T10:00:00Z"),
            log("b", "not-a-date"),
            log("c", "2024-01-01T10:00:00Z"),
        ];
        assert_eq!(ids(&sorted(&history, &Utc)), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_sorted_compares_instants_not_strings() {
        let history = vec![
            log("early", "2024-03-01T09:00:00Z"),
            // 10:00 at +05:00 is 05:00 UTC, earlier than 09:00 UTC
            log("offset", "2024-03-01T10:00:00+05:00"),
            log("late", "2024-03-01T23:00:00Z"),
        ];
        assert_eq!(
            ids(&sorted(&history, &Utc)),
            vec!["late", "early", "offset"]
        );
    }

    #[test]
    fn test_legacy_dates_take_their_calendar_place() {
        let history = vec![
            log("x", "01/02/2020 - Push"),
            log("y", "garbage"),
            log("z", "2021-05-05T12:00:00Z"),
            log("w", "05/02/2020 - Pull"),
            log("v", "2020-02-03T08:00:00Z"),
        ];
        assert_eq!(
            ids(&sorted(&history, &Utc)),
            vec!["z", "w", "v", "x", "y"]
        );
    }

    #[test]
    fn test_undated_ordered_by_raw_string_descending() {
        let history = vec![
            log("a", "garbage"),
            log("b", "zzz"),
            log("c", "???"),
        ];
        assert_eq!(ids(&sorted(&history, &Utc)), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_sort_history_in_place() {
        let mut history = vec![
            log("old", "2022-06-01T10:00:00Z"),
            log("new", "2024-06-01T10:00:00Z"),
        ];
        sort_history(&mut history, &Utc);
        assert_eq!(history[0].id.as_str(), "new");
    }

    #[test]
    fn test_year_separators() {
        let history = vec![
            log("a", "2024-01-02T10:00:00Z"),
            log("b", "2023-12-30T10:00:00Z"),
            log("c", "2023-06-01T10:00:00Z"),
            log("d", "nonsense"),
        ];
        let ordered = sorted(&history, &Utc);
        assert_eq!(year_separator_indices(&ordered, &Utc), vec![1]);
        assert!(!needs_year_separator(ordered[2], ordered[3], &Utc));
    }

    #[test]
    fn test_empty_history() {
        let history: Vec<SessionLog> = Vec::new();
        assert!(sorted(&history, &Utc).is_empty());
        assert!(year_separator_indices(&[], &Utc).is_empty());
    }
}
