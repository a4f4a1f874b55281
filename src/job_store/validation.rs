//! Schema enforcement for job records.
//!
//! Every write that reaches the store goes through these functions: inputs are
//! trimmed, defaulted and checked, and all violated constraints are reported
//! together so clients can highlight each offending field.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::models::{DateInput, JobPatch, JobRecord, JobStatus, NewJob};

pub const COMPANY_MAX_CHARS: usize = 50;
pub const ROLE_MAX_CHARS: usize = 100;

const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

lazy_static! {
    /// Anchored at both ends: the whole link must be a URL, so a valid URL
    /// followed by free text is rejected rather than accepted on a prefix match.
    static ref JOB_LINK_REGEX: Regex = Regex::new(
        r"^https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b[-a-zA-Z0-9()@:%_+.~#?&/=]*$"
    )
    .expect("job link pattern must compile");
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// One or more violated record constraints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Job validation failed: {}", join_field_errors(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// A fully validated set of record fields, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidJob {
    pub company: String,
    pub role: String,
    pub status: JobStatus,
    pub applied_date: DateTime<Utc>,
    pub job_link: Option<String>,
}

/// Parses the timestamp formats accepted by the API. Date-only strings are
/// read as midnight UTC, naive date-times as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Resolves a request date. Only years 0000 through 9999 are accepted, since
/// stored timestamps must keep a fixed-width, sortable text form.
pub fn resolve_date_input(input: &DateInput) -> Option<DateTime<Utc>> {
    let date = match input {
        DateInput::EpochMillis(millis) => Utc.timestamp_millis_opt(*millis).single(),
        DateInput::Text(text) => parse_timestamp(text),
    }?;
    (MIN_YEAR..=MAX_YEAR).contains(&date.year()).then_some(date)
}

fn check_required_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
    required_message: &str,
    too_long_message: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, required_message));
        return None;
    }
    if trimmed.chars().count() > max_chars {
        errors.push(FieldError::new(field, too_long_message));
        return None;
    }
    Some(trimmed.to_string())
}

fn check_company(value: Option<&str>, errors: &mut Vec<FieldError>) -> Option<String> {
    check_required_text(
        "company",
        value,
        COMPANY_MAX_CHARS,
        "Please provide a company name",
        "Company name cannot exceed 50 characters",
        errors,
    )
}

fn check_role(value: Option<&str>, errors: &mut Vec<FieldError>) -> Option<String> {
    check_required_text(
        "role",
        value,
        ROLE_MAX_CHARS,
        "Please provide a job role",
        "Job role cannot exceed 100 characters",
        errors,
    )
}

fn check_status(value: &str, errors: &mut Vec<FieldError>) -> Option<JobStatus> {
    let status = JobStatus::parse(value);
    if status.is_none() {
        errors.push(FieldError::new(
            "status",
            format!(
                "'{}' is not a valid status (expected one of Applied, Interview, Offer, Rejected)",
                value
            ),
        ));
    }
    status
}

fn check_applied_date(input: &DateInput, errors: &mut Vec<FieldError>) -> Option<DateTime<Utc>> {
    let date = resolve_date_input(input);
    if date.is_none() {
        errors.push(FieldError::new("appliedDate", "Please provide a valid date"));
    }
    date
}

/// Empty links are treated as absent. `Err(())` means the link was rejected
/// and an error was recorded.
fn check_job_link(value: Option<&str>, errors: &mut Vec<FieldError>) -> Result<Option<String>, ()> {
    let trimmed = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(trimmed) => trimmed,
    };
    if JOB_LINK_REGEX.is_match(trimmed) {
        Ok(Some(trimmed.to_string()))
    } else {
        errors.push(FieldError::new(
            "jobLink",
            "Please provide a valid URL (http/https)",
        ));
        Err(())
    }
}

/// Validates a creation payload, applying the `status` and `appliedDate`
/// defaults.
pub fn validate_new_job(job: &NewJob, now: DateTime<Utc>) -> Result<ValidJob, ValidationError> {
    let mut errors = Vec::new();

    let company = check_company(job.company.as_deref(), &mut errors);
    let role = check_role(job.role.as_deref(), &mut errors);
    let status = match job.status.as_deref() {
        None => Some(JobStatus::default()),
        Some(value) => check_status(value, &mut errors),
    };
    let applied_date = match &job.applied_date {
        None => Some(now),
        Some(input) => check_applied_date(input, &mut errors),
    };
    let job_link = check_job_link(job.job_link.as_deref(), &mut errors);

    match (company, role, status, applied_date, job_link) {
        (Some(company), Some(role), Some(status), Some(applied_date), Ok(job_link))
            if errors.is_empty() =>
        {
            Ok(ValidJob {
                company,
                role,
                status,
                applied_date,
                job_link,
            })
        }
        _ => Err(ValidationError { errors }),
    }
}

/// Merges `patch` into `existing`, validating only the supplied fields.
/// `updatedAt` is the only field touched besides the patched ones.
pub fn apply_patch(
    existing: &JobRecord,
    patch: &JobPatch,
    now: DateTime<Utc>,
) -> Result<JobRecord, ValidationError> {
    let mut errors = Vec::new();
    let mut updated = existing.clone();

    if let Some(company) = patch.company.as_deref() {
        if let Some(company) = check_company(Some(company), &mut errors) {
            updated.company = company;
        }
    }
    if let Some(role) = patch.role.as_deref() {
        if let Some(role) = check_role(Some(role), &mut errors) {
            updated.role = role;
        }
    }
    if let Some(status) = patch.status.as_deref() {
        if let Some(status) = check_status(status, &mut errors) {
            updated.status = status;
        }
    }
    if let Some(input) = &patch.applied_date {
        if let Some(applied_date) = check_applied_date(input, &mut errors) {
            updated.applied_date = applied_date;
        }
    }
    if let Some(job_link) = &patch.job_link {
        if let Ok(job_link) = check_job_link(job_link.as_deref(), &mut errors) {
            updated.job_link = job_link;
        }
    }

    if !errors.is_empty() {
        return Err(ValidationError { errors });
    }
    updated.updated_at = now;
    Ok(updated)
}
