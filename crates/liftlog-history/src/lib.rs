//! # liftlog-history
//!
//! Pure queries over an athlete's collection of session logs: date
//! normalization across legacy encodings, timeline ordering, calendar
//! lookups, last-occurrence of an exercise, and dashboard aggregates.
//!
//! Every query takes the timezone it should interpret calendar days in.

pub mod calendar;
pub mod date;
pub mod lookup;
pub mod stats;
pub mod timeline;

pub use calendar::{bucket_by_day, bucket_by_month, bucket_by_year, entries_on, has_entry_on, Buckets};
pub use date::{normalize, parse_timestamp, timeline_instant, NormalizedDate};
pub use lookup::{last_occurrence, previous_performance, LastOccurrence};
pub use stats::{history_stats, monthly_summary, streak, weekly_count, DayCount, HistoryStats, MonthlySummary};
pub use timeline::{needs_year_separator, sort_history, sorted, year_separator_indices};
