//! Calendar views: day lookups and grouping by day, month or year.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, TimeZone};

use liftlog_core::SessionLog;

use crate::date::{day_key, normalize};
use crate::timeline::sorted;

/// Logs grouped under a calendar key, newest first within each group.
///
/// Logs whose date cannot be read are kept aside in `unknown` instead of
/// being dropped.
#[derive(Debug, Clone)]
pub struct Buckets<'a, K: Ord> {
    pub dated: BTreeMap<K, Vec<&'a SessionLog>>,
    pub unknown: Vec<&'a SessionLog>,
}

impl<K: Ord> Default for Buckets<'_, K> {
    fn default() -> Self {
        Self {
            dated: BTreeMap::new(),
            unknown: Vec::new(),
        }
    }
}

impl<'a, K: Ord> Buckets<'a, K> {
    pub fn len(&self) -> usize {
        self.dated.values().map(Vec::len).sum::<usize>() + self.unknown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &K) -> &[&'a SessionLog] {
        self.dated.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn bucket_by<'a, K, Tz, F>(history: &'a [SessionLog], tz: &Tz, key: F) -> Buckets<'a, K>
where
    K: Ord,
    Tz: TimeZone,
    F: Fn(NaiveDate) -> K,
{
    let mut buckets = Buckets::default();
    for log in sorted(history, tz) {
        match normalize(&log.date, tz).date() {
            Some(d) => buckets.dated.entry(key(d)).or_insert_with(Vec::new).push(log),
            None => buckets.unknown.push(log),
        }
    }
    buckets
}

pub fn bucket_by_day<'a, Tz: TimeZone>(history: &'a [SessionLog], tz: &Tz) -> Buckets<'a, NaiveDate> {
    bucket_by(history, tz, |d| d)
}

/// Keyed by `(year, zero-based month)`.
pub fn bucket_by_month<'a, Tz: TimeZone>(
    history: &'a [SessionLog],
    tz: &Tz,
) -> Buckets<'a, (i32, u32)> {
    bucket_by(history, tz, |d| (d.year(), d.month0()))
}

pub fn bucket_by_year<'a, Tz: TimeZone>(history: &'a [SessionLog], tz: &Tz) -> Buckets<'a, i32> {
    bucket_by(history, tz, |d| d.year())
}

/// True when any log falls on the given day. `month0` is zero-based.
pub fn has_entry_on<Tz: TimeZone>(
    history: &[SessionLog],
    year: i32,
    month0: u32,
    day: u32,
    tz: &Tz,
) -> bool {
    let wanted = day_key(year, month0, day);
    history
        .iter()
        .any(|log| normalize(&log.date, tz).day_key().as_deref() == Some(wanted.as_str()))
}

/// Logs on the given day, newest first. `month0` is zero-based.
pub fn entries_on<'a, Tz: TimeZone>(
    history: &'a [SessionLog],
    year: i32,
    month0: u32,
    day: u32,
    tz: &Tz,
) -> Vec<&'a SessionLog> {
    let wanted = day_key(year, month0, day);
    sorted(history, tz)
        .into_iter()
        .filter(|log| normalize(&log.date, tz).day_key().as_deref() == Some(wanted.as_str()))
        .collect()
}
