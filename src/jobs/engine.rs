use std::sync::Arc;

use tracing::{debug, info, warn};

use super::bulk::{BulkCreateRequest, BulkItem};
use super::error::JobError;
use super::pagination::{total_pages, JobPage, PageRequest};
use super::query::{FilterBody, ListQuery};
use super::stats::JobStats;
use crate::job_store::{
    Aggregation, GroupKey, JobPatch, JobRecord, JobSort, JobStore, NewJob, Predicate,
    SortDirection,
};
use crate::server::metrics::record_jobs_created;

/// Tunables for listing and statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySettings {
    pub default_page_size: u64,
    /// Upper bound on the `totalPages` reported to clients.
    pub max_pages: u64,
    pub monthly_stats_buckets: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        QuerySettings {
            default_page_size: 10,
            max_pages: 10,
            monthly_stats_buckets: 6,
        }
    }
}

/// Application-level operations on job records, on top of a [`JobStore`].
#[derive(Clone)]
pub struct JobQueryEngine {
    store: Arc<dyn JobStore>,
    settings: QuerySettings,
}

impl JobQueryEngine {
    pub fn new(store: Arc<dyn JobStore>, settings: QuerySettings) -> Self {
        JobQueryEngine { store, settings }
    }

    pub async fn list(&self, query: ListQuery) -> Result<JobPage, JobError> {
        let predicate = query.predicate()?;
        let request =
            PageRequest::resolve(query.page, query.limit, self.settings.default_page_size);
        self.paginate(&predicate, request).await
    }

    pub async fn filter(&self, body: FilterBody) -> Result<JobPage, JobError> {
        let predicate = match &body.filters {
            Some(filters) => filters.predicate()?,
            None => Predicate::match_all(),
        };
        let request = PageRequest::resolve(body.page, body.limit, self.settings.default_page_size);
        self.paginate(&predicate, request).await
    }

    async fn paginate(
        &self,
        predicate: &Predicate,
        request: PageRequest,
    ) -> Result<JobPage, JobError> {
        let total_jobs = self.store.count(predicate).await?;
        let total_pages = total_pages(total_jobs, request.limit, self.settings.max_pages);

        if request.page > total_pages {
            debug!(
                "Page {} is past the last page ({}), returning no data",
                request.page, total_pages
            );
            return Ok(JobPage::new(request, total_jobs, total_pages, Vec::new()));
        }

        let data = self
            .store
            .find(predicate, JobSort::default(), request.skip(), request.limit)
            .await?;
        Ok(JobPage::new(request, total_jobs, total_pages, data))
    }

    pub async fn stats(&self) -> Result<JobStats, JobError> {
        let by_status = self.store.aggregate(Aggregation::group_by(GroupKey::Status));
        let by_month = self.store.aggregate(
            Aggregation::group_by(GroupKey::AppliedYearMonth)
                .sorted(SortDirection::Descending)
                .limited(self.settings.monthly_stats_buckets),
        );
        let (status_groups, monthly_groups) = tokio::try_join!(by_status, by_month)?;
        Ok(JobStats::from_groups(status_groups, monthly_groups))
    }

    pub async fn get(&self, id: &str) -> Result<JobRecord, JobError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    pub async fn create(&self, job: NewJob) -> Result<JobRecord, JobError> {
        let record = self.store.insert_one(job).await?;
        record_jobs_created(1);
        info!("Created job {} ({} / {})", record.id, record.company, record.role);
        Ok(record)
    }

    pub async fn update(&self, id: &str, patch: JobPatch) -> Result<JobRecord, JobError> {
        let record = self
            .store
            .update_by_id(id, patch)
            .await?
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;
        debug!("Updated job {}", record.id);
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> Result<(), JobError> {
        if !self.store.delete_by_id(id).await? {
            return Err(JobError::NotFound(id.to_string()));
        }
        info!("Deleted job {}", id);
        Ok(())
    }

    /// Inserts every acceptable entry and returns the created records.
    /// Rejected entries are logged and left out of the result.
    pub async fn bulk_create(&self, request: BulkCreateRequest) -> Result<Vec<JobRecord>, JobError> {
        let submitted = request.items.len();
        let mut positions = Vec::with_capacity(submitted);
        let mut jobs = Vec::with_capacity(submitted);
        for (index, item) in request.items.into_iter().enumerate() {
            match item {
                BulkItem::Job(job) => {
                    positions.push(index);
                    jobs.push(job);
                }
                BulkItem::Malformed(error) => {
                    warn!("Bulk job #{} rejected: {}", index, error);
                }
            }
        }

        let outcome = if jobs.is_empty() {
            Default::default()
        } else {
            self.store.insert_many(jobs).await?
        };
        for rejected in &outcome.rejected {
            warn!(
                "Bulk job #{} rejected: {}",
                positions[rejected.index], rejected.error
            );
        }

        record_jobs_created(outcome.inserted.len() as u64);
        info!(
            "Bulk create inserted {} of {} jobs",
            outcome.inserted.len(),
            submitted
        );
        Ok(outcome.inserted)
    }
}
