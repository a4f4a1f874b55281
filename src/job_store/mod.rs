mod models;
mod schema;
mod sqlite_job_store;
pub mod validation;

pub use models::*;
pub use schema::JOB_VERSIONED_SCHEMAS;
pub use sqlite_job_store::SqliteJobStore;
pub use validation::{FieldError, ValidationError};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

pub type JobStoreResult<T> = Result<T, JobStoreError>;

/// Persistence capability for job records.
///
/// Implementations assign ids and timestamps, enforce the record schema on
/// every write and are safe to share between concurrent requests.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn count(&self, predicate: &Predicate) -> JobStoreResult<u64>;

    /// Returns at most `limit` records matching `predicate`, in `sort` order,
    /// after skipping the first `skip`.
    async fn find(
        &self,
        predicate: &Predicate,
        sort: JobSort,
        skip: u64,
        limit: u64,
    ) -> JobStoreResult<Vec<JobRecord>>;

    async fn find_by_id(&self, id: &str) -> JobStoreResult<Option<JobRecord>>;

    async fn insert_one(&self, job: NewJob) -> JobStoreResult<JobRecord>;

    /// Inserts every valid input, skipping the invalid ones. The relative order
    /// of the inserted records follows the input.
    async fn insert_many(&self, jobs: Vec<NewJob>) -> JobStoreResult<BulkInsertOutcome>;

    /// Applies `patch` to the record with the given id. Returns `None` if no
    /// such record exists.
    async fn update_by_id(&self, id: &str, patch: JobPatch) -> JobStoreResult<Option<JobRecord>>;

    /// Returns whether a record was removed.
    async fn delete_by_id(&self, id: &str) -> JobStoreResult<bool>;

    async fn aggregate(&self, aggregation: Aggregation) -> JobStoreResult<Vec<GroupCount>>;
}
