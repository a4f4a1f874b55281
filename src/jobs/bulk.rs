use serde::Deserialize;
use serde_json::Value;

use super::error::JobError;
use crate::job_store::{DateInput, JobStatus, NewJob, ValidationError};

pub const MISSING_JOBS_MESSAGE: &str = "Please provide an array of jobs";

/// One entry of a bulk creation request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkItem {
    Job(NewJob),
    /// The entry could not be read as a job payload at all.
    Malformed(ValidationError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkCreateRequest {
    pub items: Vec<BulkItem>,
}

impl BulkCreateRequest {
    /// Reads `{ "jobs": [...] }`. Fails unless `jobs` is a non-empty array;
    /// individual entries are checked later, one by one.
    pub fn from_json(body: &Value) -> Result<Self, JobError> {
        let jobs = body
            .get("jobs")
            .and_then(Value::as_array)
            .filter(|jobs| !jobs.is_empty())
            .ok_or_else(|| JobError::bad_request(MISSING_JOBS_MESSAGE))?;

        let items = jobs
            .iter()
            .map(|entry| match NewJob::deserialize(entry) {
                Ok(job) => BulkItem::Job(normalize(job)),
                Err(e) => BulkItem::Malformed(ValidationError::single(
                    "job",
                    format!("Malformed job entry: {}", e),
                )),
            })
            .collect();
        Ok(BulkCreateRequest { items })
    }
}

/// Bulk defaults: empty or missing `status` becomes `Applied`, and an empty
/// `jobLink` is omitted. An `appliedDate` that is an empty string or epoch
/// `0` is dropped, so the store stamps the current time instead of 1970.
pub fn normalize(job: NewJob) -> NewJob {
    NewJob {
        status: Some(
            job.status
                .filter(|status| !status.is_empty())
                .unwrap_or_else(|| JobStatus::default().to_string()),
        ),
        applied_date: job.applied_date.filter(|date| match date {
            DateInput::Text(text) => !text.is_empty(),
            DateInput::EpochMillis(millis) => *millis != 0,
        }),
        job_link: job.job_link.filter(|link| !link.is_empty()),
        ..job
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_missing_or_empty_jobs() {
        for body in [
            json!({}),
            json!({"jobs": []}),
            json!({"jobs": "not an array"}),
            json!({"jobs": {"company": "A"}}),
            json!([{"company": "A", "role": "B"}]),
        ] {
            match BulkCreateRequest::from_json(&body) {
                Err(JobError::BadRequest(message)) => assert_eq!(message, MISSING_JOBS_MESSAGE),
                other => panic!("unexpected result for {}: {:?}", body, other),
            }
        }
    }

    #[test]
    fn normalizes_each_entry() {
        let body = json!({"jobs": [
            {"company": "A", "role": "B"},
            {"company": "C", "role": "D", "status": "", "appliedDate": "", "jobLink": ""},
            {"company": "E", "role": "F", "status": "Offer", "appliedDate": "2024-01-01"},
            {"company": "G", "role": "H", "appliedDate": 0},
        ]});
        let request = BulkCreateRequest::from_json(&body).unwrap();
        let jobs: Vec<_> = request
            .items
            .into_iter()
            .map(|item| match item {
                BulkItem::Job(job) => job,
                other => panic!("unexpected item {:?}", other),
            })
            .collect();

        assert_eq!(jobs[0].status.as_deref(), Some("Applied"));
        assert_eq!(jobs[0].applied_date, None);
        assert_eq!(jobs[1].status.as_deref(), Some("Applied"));
        assert_eq!(jobs[1].applied_date, None);
        assert_eq!(jobs[1].job_link, None);
        assert_eq!(jobs[2].status.as_deref(), Some("Offer"));
        assert_eq!(
            jobs[2].applied_date,
            Some(DateInput::Text("2024-01-01".to_string()))
        );
        assert_eq!(jobs[3].applied_date, None);
    }

    #[test]
    fn malformed_entries_do_not_fail_the_request() {
        let body = json!({"jobs": [{"company": "A", "role": "B"}, 42, {"company": 7}]});
        let request = BulkCreateRequest::from_json(&body).unwrap();
        assert!(matches!(request.items[0], BulkItem::Job(_)));
        assert!(matches!(request.items[1], BulkItem::Malformed(_)));
        assert!(matches!(request.items[2], BulkItem::Malformed(_)));
    }
}
