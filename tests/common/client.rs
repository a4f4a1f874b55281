//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per job tracker endpoint.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn jobs_url(&self, path: &str) -> String {
        format!("{}/api/jobs{}", self.base_url, path)
    }

    // ========================================================================
    // Service
    // ========================================================================

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Listing
    // ========================================================================

    /// GET /api/jobs?{query}
    pub async fn list_jobs(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.jobs_url(""))
            .query(query)
            .send()
            .await
            .expect("List jobs request failed")
    }

    /// POST /api/jobs/filter
    pub async fn filter_jobs(&self, body: Value) -> Response {
        self.client
            .post(self.jobs_url("/filter"))
            .json(&body)
            .send()
            .await
            .expect("Filter jobs request failed")
    }

    /// GET /api/jobs/stats
    pub async fn job_stats(&self) -> Response {
        self.client
            .get(self.jobs_url("/stats"))
            .send()
            .await
            .expect("Job stats request failed")
    }

    // ========================================================================
    // Single job
    // ========================================================================

    /// POST /api/jobs/create-job
    pub async fn create_job(&self, body: Value) -> Response {
        self.client
            .post(self.jobs_url("/create-job"))
            .json(&body)
            .send()
            .await
            .expect("Create job request failed")
    }

    /// Creates a job and returns the stored record, asserting success
    pub async fn create_job_ok(&self, company: &str, role: &str, status: &str, applied: &str) -> Value {
        let response = self
            .create_job(json!({
                "company": company,
                "role": role,
                "status": status,
                "appliedDate": applied,
            }))
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: Value = response.json().await.expect("Invalid create response");
        body["data"].clone()
    }

    /// GET /api/jobs/{id}
    pub async fn get_job(&self, id: &str) -> Response {
        self.client
            .get(self.jobs_url(&format!("/{}", id)))
            .send()
            .await
            .expect("Get job request failed")
    }

    /// PATCH /api/jobs/{id}
    pub async fn update_job(&self, id: &str, body: Value) -> Response {
        self.client
            .patch(self.jobs_url(&format!("/{}", id)))
            .json(&body)
            .send()
            .await
            .expect("Update job request failed")
    }

    /// DELETE /api/jobs/{id}
    pub async fn delete_job(&self, id: &str) -> Response {
        self.client
            .delete(self.jobs_url(&format!("/{}", id)))
            .send()
            .await
            .expect("Delete job request failed")
    }

    // ========================================================================
    // Bulk
    // ========================================================================

    /// POST /api/jobs/bulk-jobs
    pub async fn bulk_create_jobs(&self, body: Value) -> Response {
        self.client
            .post(self.jobs_url("/bulk-jobs"))
            .json(&body)
            .send()
            .await
            .expect("Bulk create request failed")
    }

    /// Sends a raw body with a JSON content type
    pub async fn post_raw(&self, path: &str, body: &'static str) -> Response {
        self.client
            .post(self.jobs_url(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .expect("Raw request failed")
    }
}
