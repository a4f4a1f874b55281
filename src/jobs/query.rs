//! Typed request inputs for the listing operations and their translation into
//! store predicates.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::JobError;
use crate::job_store::validation::resolve_date_input;
use crate::job_store::{DateInput, DateRange, Predicate, TextPattern};

/// Query string of `GET /api/jobs`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ListQuery {
    pub fn predicate(&self) -> Result<Predicate, JobError> {
        Ok(Predicate {
            status: non_empty(self.status.as_deref()).map(str::to_string),
            company: None,
            role: None,
            applied_date: DateRange {
                start: parse_text_bound("startDate", self.start_date.as_deref())?,
                end: parse_text_bound("endDate", self.end_date.as_deref())?,
            },
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilters {
    pub company: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<DateInput>,
    pub end_date: Option<DateInput>,
}

impl JobFilters {
    pub fn predicate(&self) -> Result<Predicate, JobError> {
        Ok(Predicate {
            status: non_empty(self.status.as_deref()).map(str::to_string),
            company: non_empty(self.company.as_deref()).map(TextPattern::case_insensitive),
            role: non_empty(self.role.as_deref()).map(TextPattern::case_insensitive),
            applied_date: DateRange {
                start: parse_input_bound("startDate", self.start_date.as_ref())?,
                end: parse_input_bound("endDate", self.end_date.as_ref())?,
            },
        })
    }
}

/// Body of `POST /api/jobs/filter`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBody {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub filters: Option<JobFilters>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn invalid_date(field: &str, raw: impl std::fmt::Display) -> JobError {
    JobError::bad_request(format!("Invalid {} '{}'", field, raw))
}

fn parse_text_bound(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, JobError> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => {
            let input = DateInput::Text(raw.to_string());
            resolve_date_input(&input)
                .map(Some)
                .ok_or_else(|| invalid_date(field, raw))
        }
    }
}

fn parse_input_bound(
    field: &str,
    value: Option<&DateInput>,
) -> Result<Option<DateTime<Utc>>, JobError> {
    match value {
        None => Ok(None),
        Some(DateInput::Text(raw)) => parse_text_bound(field, Some(raw)),
        Some(input @ DateInput::EpochMillis(millis)) => resolve_date_input(input)
            .map(Some)
            .ok_or_else(|| invalid_date(field, millis)),
    }
}
