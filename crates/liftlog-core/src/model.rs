use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One row of a coach-authored training plan: a single exercise prescription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub exercise: String,
    /// The plan's label for the workout day ("1", "2", ...)
    pub session_code: String,
    /// Either a plain integer or a hyphen-separated progression such as "3-4-5"
    pub target_sets: String,
    #[serde(default)]
    pub target_reps: String,
    #[serde(default)]
    pub rest_seconds: Option<u32>,
    #[serde(default)]
    pub tempo: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub video_url: Option<String>,
    pub year: i32,
    pub month_num: u32,
    pub week: u32,
    #[serde(default)]
    pub order: i32,
}

/// A single recorded set. `reps` and `weight` are free text ("AMRAP", "BW").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLog {
    pub set_number: u32,
    #[serde(default)]
    pub reps: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub completed: bool,
}

impl SetLog {
    pub fn empty(set_number: u32) -> Self {
        Self {
            set_number,
            reps: String::new(),
            weight: String::new(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    pub exercise_name: String,
    /// Plan session code this exercise came from; a recording may merge several.
    pub original_session: String,
    #[serde(default)]
    pub notes: String,
    pub sets: Vec<SetLog>,
}

/// Display and grouping key of a recorded session. Not unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    pub year: i32,
    pub month_num: u32,
    pub week: u32,
    /// Distinct plan session codes joined with `+` in first-seen order
    pub session_code: String,
}

impl SessionKey {
    /// Individual plan session codes merged into this key.
    pub fn session_codes(&self) -> impl Iterator<Item = &str> {
        self.session_code.split('+').filter(|c| !c.is_empty())
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/M{}/W{} S{}",
            self.year, self.month_num, self.week, self.session_code
        )
    }
}

/// Identity of a session log.
///
/// `Unsaved` is the "not yet persisted" sentinel carried by fresh drafts.
/// Both variants serialize as a plain string so stored records keep the
/// shape the datastore expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LogId {
    #[default]
    Unsaved,
    Persisted(String),
}

impl LogId {
    pub const SENTINEL: &'static str = "new";

    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }

    pub fn as_persisted(&self) -> Option<&str> {
        match self {
            Self::Persisted(id) => Some(id),
            Self::Unsaved => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Persisted(id) => id,
            Self::Unsaved => Self::SENTINEL,
        }
    }
}

impl From<&str> for LogId {
    fn from(s: &str) -> Self {
        if s.is_empty() || s == Self::SENTINEL {
            Self::Unsaved
        } else {
            Self::Persisted(s.to_string())
        }
    }
}

impl From<String> for LogId {
    fn from(s: String) -> Self {
        if s.is_empty() || s == Self::SENTINEL {
            Self::Unsaved
        } else {
            Self::Persisted(s)
        }
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw))
    }
}

/// A finalized workout record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLog {
    pub id: LogId,
    /// Canonically ISO-8601; legacy records may hold other encodings
    pub date: String,
    pub session_key: SessionKey,
    pub exercises: Vec<ExerciseLog>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Free-text per-exercise comments keyed by exercise name
    #[serde(default)]
    pub comments: BTreeMap<String, String>,
}

/// Which field of a set `update_set` writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetField {
    Reps,
    Weight,
}

impl std::str::FromStr for SetField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reps" => Ok(SetField::Reps),
            "weight" => Ok(SetField::Weight),
            _ => Err(format!("Unknown set field: {}", s)),
        }
    }
}
