//! HTTP routes for job records, mounted under `/api/jobs`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::job_store::{FieldError, JobPatch, JobRecord, NewJob};
use crate::jobs::{
    BulkCreateRequest, FilterBody, JobError, JobPage, JobQueryEngine, JobStats, ListQuery,
};

use super::metrics::record_error;
use super::state::ServerState;

// =============================================================================
// Response envelopes
// =============================================================================

#[derive(Debug, Serialize)]
struct DataResponse<T> {
    success: bool,
    data: T,
}

impl<T> DataResponse<T> {
    fn new(data: T) -> Self {
        DataResponse {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
struct PageResponse {
    success: bool,
    #[serde(flatten)]
    page: JobPage,
}

#[derive(Debug, Serialize)]
struct BulkResponse {
    success: bool,
    count: usize,
    data: Vec<JobRecord>,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    success: bool,
    data: Option<JobRecord>,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        record_error(self.kind(), "/api/jobs");
        let message = self.to_string();
        let (status, error, errors) = match self {
            JobError::Validation(validation) => {
                (StatusCode::BAD_REQUEST, message, validation.errors)
            }
            JobError::NotFound(_) => (StatusCode::NOT_FOUND, message, Vec::new()),
            JobError::BadRequest(_) => (StatusCode::BAD_REQUEST, message, Vec::new()),
            JobError::Store(source) => {
                error!("Job store failure: {}", source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Vec::new(),
                )
            }
        };
        debug!("Responding {} with error: {}", status, error);
        (
            status,
            Json(ErrorResponse {
                success: false,
                error,
                errors,
            }),
        )
            .into_response()
    }
}

fn json_rejection(rejection: JsonRejection) -> JobError {
    JobError::bad_request(rejection.body_text())
}

// =============================================================================
// Handlers
// =============================================================================

/// GET / - Paginated listing with optional status and date range
async fn list_jobs(
    State(engine): State<JobQueryEngine>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<PageResponse>, JobError> {
    let Query(query) = query.map_err(|e| JobError::bad_request(e.body_text()))?;
    let page = engine.list(query).await?;
    Ok(Json(PageResponse {
        success: true,
        page,
    }))
}

/// POST /filter - Paginated listing with filters taken from the body
async fn filter_jobs(
    State(engine): State<JobQueryEngine>,
    body: Result<Json<FilterBody>, JsonRejection>,
) -> Result<Json<PageResponse>, JobError> {
    let Json(body) = body.map_err(json_rejection)?;
    let page = engine.filter(body).await?;
    Ok(Json(PageResponse {
        success: true,
        page,
    }))
}

/// GET /stats
async fn job_stats(
    State(engine): State<JobQueryEngine>,
) -> Result<Json<DataResponse<JobStats>>, JobError> {
    Ok(Json(DataResponse::new(engine.stats().await?)))
}

async fn get_job(
    State(engine): State<JobQueryEngine>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<JobRecord>>, JobError> {
    Ok(Json(DataResponse::new(engine.get(&id).await?)))
}

/// POST /create-job
async fn create_job(
    State(engine): State<JobQueryEngine>,
    body: Result<Json<NewJob>, JsonRejection>,
) -> Result<impl IntoResponse, JobError> {
    let Json(job) = body.map_err(json_rejection)?;
    let record = engine.create(job).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(record))))
}

async fn update_job(
    State(engine): State<JobQueryEngine>,
    Path(id): Path<String>,
    body: Result<Json<JobPatch>, JsonRejection>,
) -> Result<Json<DataResponse<JobRecord>>, JobError> {
    let Json(patch) = body.map_err(json_rejection)?;
    Ok(Json(DataResponse::new(engine.update(&id, patch).await?)))
}

async fn delete_job(
    State(engine): State<JobQueryEngine>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, JobError> {
    engine.delete(&id).await?;
    Ok(Json(DeleteResponse {
        success: true,
        data: None,
        message: "Job deleted successfully",
    }))
}

/// POST /bulk-jobs - Best-effort creation of several jobs
async fn bulk_create_jobs(
    State(engine): State<JobQueryEngine>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<impl IntoResponse, JobError> {
    let Json(body) = body.map_err(json_rejection)?;
    let request = BulkCreateRequest::from_json(&body)?;
    let created = engine.bulk_create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(BulkResponse {
            success: true,
            count: created.len(),
            data: created,
        }),
    ))
}

pub fn job_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list_jobs))
        .route("/filter", post(filter_jobs))
        .route("/stats", get(job_stats))
        .route("/create-job", post(create_job))
        .route("/bulk-jobs", post(bulk_create_jobs))
        .route("/{id}", get(get_job).patch(update_job).delete(delete_job))
}
