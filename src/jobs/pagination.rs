use crate::job_store::JobRecord;
use serde::Serialize;

/// A resolved page position. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Applies defaults to client-supplied values, clamping anything below 1.
    pub fn resolve(page: Option<i64>, limit: Option<i64>, default_limit: u64) -> Self {
        PageRequest {
            page: page.map_or(1, clamp_positive),
            limit: limit.map_or(default_limit.max(1), clamp_positive),
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }
}

fn clamp_positive(value: i64) -> u64 {
    value.max(1) as u64
}

/// Number of pages reported to clients, never more than `max_pages`.
pub fn total_pages(total: u64, limit: u64, max_pages: u64) -> u64 {
    total.div_ceil(limit.max(1)).min(max_pages)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPage {
    pub count: usize,
    pub total_jobs: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub data: Vec<JobRecord>,
}

impl JobPage {
    pub fn new(request: PageRequest, total_jobs: u64, total_pages: u64, data: Vec<JobRecord>) -> Self {
        JobPage {
            count: data.len(),
            total_jobs,
            total_pages,
            current_page: request.page,
            data,
        }
    }
}
