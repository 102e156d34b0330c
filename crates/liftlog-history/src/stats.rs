//! Dashboard aggregates over a log collection.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use liftlog_core::SessionLog;

use crate::date::{normalize, parse_timestamp};
use crate::timeline::sorted;

/// Sessions and minutes in the current calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub count: usize,
    pub total_minutes: u32,
}

/// Sessions count for a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: String,
    pub count: usize,
}

/// How often one exercise shows up across the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseStats {
    pub exercise: String,
    pub sessions: usize,
}

/// Aggregate statistics across all logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_sessions: usize,
    pub this_week: usize,
    pub this_month: MonthlySummary,
    pub streak: usize,
    pub avg_duration_minutes: f64,
    pub unknown_dates: usize,
    pub sessions_over_time: Vec<DayCount>,
    pub by_exercise: Vec<ExerciseStats>,
}

/// Logs whose timestamp lies in the trailing 7×24h window ending at `now`.
pub fn weekly_count<Tz: TimeZone>(history: &[SessionLog], now: &DateTime<Tz>) -> usize {
    let tz = now.timezone();
    let end = now.with_timezone(&Utc);
    let start = end - Duration::days(7);

    history
        .iter()
        .filter_map(|log| parse_timestamp(&log.date, &tz))
        .filter(|ts| *ts >= start && *ts <= end)
        .count()
}

/// Logs in the same calendar month and year as `now`, with their total duration.
pub fn monthly_summary<Tz: TimeZone>(history: &[SessionLog], now: &DateTime<Tz>) -> MonthlySummary {
    let tz = now.timezone();
    let today = now.date_naive();

    history
        .iter()
        .filter(|log| {
            normalize(&log.date, &tz)
                .date()
                .is_some_and(|d| d.year() == today.year() && d.month() == today.month())
        })
        .fold(MonthlySummary::default(), |mut acc, log| {
            acc.count += 1;
            acc.total_minutes = acc
                .total_minutes
                .saturating_add(log.duration_minutes.unwrap_or(0));
            acc
        })
}

/// Lenient consecutive-day streak.
///
/// Walking logs newest first, the `i`th log's local midnight must lie within
/// 24 hours of `now - i days`. The first log outside that window, or with an
/// unreadable date, ends the streak.
pub fn streak<Tz: TimeZone>(history: &[SessionLog], now: &DateTime<Tz>) -> usize {
    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);
    let tolerance = Duration::hours(24);

    let mut count = 0;
    for (i, log) in sorted(history, &tz).into_iter().enumerate() {
        let Some(midnight) = local_midnight(&log.date, &tz) else {
            break;
        };
        let diff = midnight - (now_utc - Duration::days(i as i64));
        if diff > tolerance || diff < -tolerance {
            break;
        }
        count += 1;
    }
    count
}

fn local_midnight<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let date = normalize(raw, tz).date()?;
    let naive = date.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Everything the dashboard shows, computed in one pass per aggregate.
pub fn history_stats<Tz: TimeZone>(history: &[SessionLog], now: &DateTime<Tz>) -> HistoryStats {
    let tz = now.timezone();
    let total_sessions = history.len();

    let durations: Vec<u32> = history.iter().filter_map(|l| l.duration_minutes).collect();
    let avg_duration_minutes = if durations.is_empty() {
        0.0
    } else {
        durations.iter().map(|&d| d as f64).sum::<f64>() / durations.len() as f64
    };

    // Sessions over time (group by local day)
    let mut day_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut unknown_dates = 0;
    for log in history {
        match normalize(&log.date, &tz).day_key() {
            Some(key) => *day_counts.entry(key).or_insert(0) += 1,
            None => unknown_dates += 1,
        }
    }
    let sessions_over_time: Vec<DayCount> = day_counts
        .into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect();

    // By exercise, counting each log once per exercise name
    let mut exercise_map: HashMap<&str, usize> = HashMap::new();
    for log in history {
        let mut seen: Vec<&str> = Vec::new();
        for e in &log.exercises {
            let name = e.exercise_name.as_str();
            if !seen.contains(&name) {
                seen.push(name);
                *exercise_map.entry(name).or_insert(0) += 1;
            }
        }
    }
    let mut by_exercise: Vec<ExerciseStats> = exercise_map
        .into_iter()
        .map(|(exercise, sessions)| ExerciseStats {
            exercise: exercise.to_string(),
            sessions,
        })
        .collect();
    by_exercise.sort_by(|a, b| {
        b.sessions
            .cmp(&a.sessions)
            .then_with(|| a.exercise.cmp(&b.exercise))
    });

    HistoryStats {
        total_sessions,
        this_week: weekly_count(history, now),
        this_month: monthly_summary(history, now),
        streak: streak(history, now),
        avg_duration_minutes,
        unknown_dates,
        sessions_over_time,
        by_exercise,
    }
}
