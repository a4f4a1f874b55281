use crate::job_store::{JobStoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Validation(ValidationError),

    #[error("No job found with id {0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Job store failure: {0}")]
    Store(#[source] JobStoreError),
}

impl JobError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        JobError::BadRequest(message.into())
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Validation(_) => "validation",
            JobError::NotFound(_) => "not_found",
            JobError::BadRequest(_) => "bad_request",
            JobError::Store(_) => "store",
        }
    }
}

impl From<ValidationError> for JobError {
    fn from(error: ValidationError) -> Self {
        JobError::Validation(error)
    }
}

impl From<JobStoreError> for JobError {
    fn from(error: JobStoreError) -> Self {
        match error {
            JobStoreError::Validation(validation) => JobError::Validation(validation),
            other => JobError::Store(other),
        }
    }
}
