use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::validation::ValidationError;

/// Stage of a job application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Applied,
        JobStatus::Interview,
        JobStatus::Offer,
        JobStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Applied => "Applied",
            JobStatus::Interview => "Interview",
            JobStatus::Offer => "Offer",
            JobStatus::Rejected => "Rejected",
        }
    }

    /// Exact, case-sensitive match against the stored representation.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Applied
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted job application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    pub company: String,
    pub role: String,
    pub status: JobStatus,
    #[serde(with = "millis_timestamp")]
    pub applied_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_link: Option<String>,
    #[serde(with = "millis_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "millis_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// RFC 3339 with exactly three fractional digits and a `Z` suffix,
/// e.g. `2024-03-15T00:00:00.000Z`.
mod millis_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// A timestamp as accepted in request payloads: either a date string
/// (RFC 3339, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`) or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    EpochMillis(i64),
    Text(String),
}

/// Unvalidated payload for a new job. Every field is optional at this level
/// so that missing values surface as field-level validation errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub company: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub applied_date: Option<DateInput>,
    pub job_link: Option<String>,
}

/// Partial update payload. Absent fields are left untouched; `jobLink: null`
/// clears the stored link.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    pub company: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub applied_date: Option<DateInput>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub job_link: Option<Option<String>>,
}

// Distinguishes an explicit `null` from a missing field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A compiled, case-insensitive partial match on a text field.
///
/// The source string is handed to the store as-is; it is always a valid
/// regular expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPattern {
    source: String,
}

impl TextPattern {
    /// Builds a case-insensitive pattern from user input. Input that is not a
    /// valid regular expression is matched literally.
    pub fn case_insensitive(raw: &str) -> Self {
        let source = match regex::Regex::new(raw) {
            Ok(_) => format!("(?i){}", raw),
            Err(_) => format!("(?i){}", regex::escape(raw)),
        };
        TextPattern { source }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Inclusive bounds on a timestamp field; either side may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Conjunction of record conditions. The default predicate matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    /// Exact match on the raw status value; unknown values match nothing.
    pub status: Option<String>,
    pub company: Option<TextPattern>,
    pub role: Option<TextPattern>,
    pub applied_date: DateRange,
}

impl Predicate {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn is_match_all(&self) -> bool {
        self.status.is_none()
            && self.company.is_none()
            && self.role.is_none()
            && self.applied_date.is_unbounded()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordering for `find`. Ties are always broken by insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSort {
    AppliedDate(SortDirection),
}

impl Default for JobSort {
    fn default() -> Self {
        JobSort::AppliedDate(SortDirection::Descending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// The raw status value.
    Status,
    /// Calendar (year, month) of `appliedDate`, in UTC.
    AppliedYearMonth,
}

/// A single grouping stage followed by optional sort-by-key and limit stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregation {
    pub group_by: GroupKey,
    pub sort: Option<SortDirection>,
    pub limit: Option<usize>,
}

impl Aggregation {
    pub fn group_by(key: GroupKey) -> Self {
        Aggregation {
            group_by: key,
            sort: None,
            limit: None,
        }
    }

    pub fn sorted(mut self, direction: SortDirection) -> Self {
        self.sort = Some(direction);
        self
    }

    pub fn limited(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupValue {
    Status(String),
    YearMonth { year: i32, month: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub key: GroupValue,
    pub count: u64,
}

/// An input of `insert_many` that failed validation.
#[derive(Debug, Clone)]
pub struct RejectedJob {
    /// Position of the input in the submitted batch.
    pub index: usize,
    pub error: ValidationError,
}

#[derive(Debug, Clone, Default)]
pub struct BulkInsertOutcome {
    pub inserted: Vec<JobRecord>,
    pub rejected: Vec<RejectedJob>,
}
