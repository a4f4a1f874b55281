//! The job query engine: listing, filtering, statistics and CRUD on top of a
//! [`JobStore`](crate::job_store::JobStore).

mod bulk;
mod engine;
mod error;
mod pagination;
mod query;
mod stats;

pub use bulk::{normalize, BulkCreateRequest, BulkItem, MISSING_JOBS_MESSAGE};
pub use engine::{JobQueryEngine, QuerySettings};
pub use error::JobError;
pub use pagination::{total_pages, JobPage, PageRequest};
pub use query::{FilterBody, JobFilters, ListQuery};
pub use stats::{JobStats, MonthlyCount, StatusCount};
