use super::scheduler::JobScheduler;
use super::types::{Job, JobFilter};

use axum::{Extension, Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct JobResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<Job>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteJobsResponse {
    pub deleted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn handle_create_job(
    Extension(scheduler): Extension<Arc<JobScheduler>>,
    Json(job): Json<Job>,
) -> (StatusCode, Json<JobResponse>) {
    match scheduler.create_job(job).await {
        Ok(stored) => (
            StatusCode::OK,
            Json(JobResponse {
                job: Some(stored),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!("Job creation rejected: {}", e);
            (
                e.status_code(),
                Json(JobResponse {
                    job: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_delete_jobs(
    Extension(scheduler): Extension<Arc<JobScheduler>>,
    Json(filter): Json<JobFilter>,
) -> (StatusCode, Json<DeleteJobsResponse>) {
    match scheduler.delete_jobs(filter).await {
        Ok(deleted) => (
            StatusCode::OK,
            Json(DeleteJobsResponse {
                deleted,
                error: None,
            }),
        ),
        Err(e) => (
            e.status_code(),
            Json(DeleteJobsResponse {
                deleted: 0,
                error: Some(e.to_string()),
            }),
        ),
    }
}

pub async fn handle_list_jobs(
    Extension(scheduler): Extension<Arc<JobScheduler>>,
) -> (StatusCode, Json<Vec<Job>>) {
    match scheduler.list_jobs(JobFilter::default()).await {
        Ok(jobs) => (StatusCode::OK, Json(jobs)),
        Err(e) => (e.status_code(), Json(Vec::new())),
    }
}

pub async fn handle_query_jobs(
    Extension(scheduler): Extension<Arc<JobScheduler>>,
    Json(filter): Json<JobFilter>,
) -> (StatusCode, Json<Vec<Job>>) {
    match scheduler.list_jobs(filter).await {
        Ok(jobs) => (StatusCode::OK, Json(jobs)),
        Err(e) => (e.status_code(), Json(Vec::new())),
    }
}

/// Observability view of the pending queue; nothing is drained.
pub async fn handle_queue(
    Extension(scheduler): Extension<Arc<JobScheduler>>,
) -> (StatusCode, Json<Vec<Job>>) {
    (StatusCode::OK, Json(scheduler.queued_jobs().await))
}
