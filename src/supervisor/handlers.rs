use super::protocol::{
    AppendLogRequest, CreateSupervisorRequest, CreateSupervisorResponse, UpdateSupervisorRequest,
};
use super::types::{SupervisorFilter, SupervisorRecord};
use crate::error::OrchestratorError;
use crate::orchestrator::actor::Gateway;
use crate::orchestrator::messages::{OrchestratorRequest, OrchestratorResponse};
use crate::registry::protocol::AckResponse;

use axum::{Extension, Json, extract::Path, http::StatusCode};

pub async fn handle_create_supervisor(
    Extension(gateway): Extension<Gateway>,
    Json(req): Json<CreateSupervisorRequest>,
) -> (StatusCode, Json<CreateSupervisorResponse>) {
    let reply = gateway
        .call(OrchestratorRequest::CreateSupervisor {
            module: req.module,
            cluster: req.cluster,
            metadata: req.metadata,
        })
        .await;

    match reply {
        Ok(OrchestratorResponse::SupervisorCreated { id }) => (
            StatusCode::OK,
            Json(CreateSupervisorResponse {
                id: Some(id),
                error: None,
            }),
        ),
        // The record exists and is Cancelled; the caller still gets its id.
        Err(OrchestratorError::ProvisioningFailed { id, reason }) => {
            tracing::warn!("Supervisor {} provisioning failed: {}", id, reason);
            (
                StatusCode::BAD_GATEWAY,
                Json(CreateSupervisorResponse {
                    id: Some(id),
                    error: Some(reason),
                }),
            )
        }
        Ok(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CreateSupervisorResponse {
                id: None,
                error: Some("unexpected reply".to_string()),
            }),
        ),
        Err(e) => {
            tracing::warn!("Supervisor creation rejected: {}", e);
            (
                e.status_code(),
                Json(CreateSupervisorResponse {
                    id: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_query_supervisors(
    Extension(gateway): Extension<Gateway>,
    Json(filter): Json<SupervisorFilter>,
) -> (StatusCode, Json<Vec<SupervisorRecord>>) {
    match gateway
        .call(OrchestratorRequest::GetSupervisors { filter })
        .await
    {
        Ok(OrchestratorResponse::Supervisors(records)) => (StatusCode::OK, Json(records)),
        Ok(_) => (StatusCode::INTERNAL_SERVER_ERROR, Json(Vec::new())),
        Err(e) => (e.status_code(), Json(Vec::new())),
    }
}

/// Lifecycle callback from a remote processor node.
pub async fn handle_update_supervisor(
    Extension(gateway): Extension<Gateway>,
    Json(req): Json<UpdateSupervisorRequest>,
) -> (StatusCode, Json<AckResponse>) {
    match gateway
        .call(OrchestratorRequest::UpdateSupervisor {
            id: req.id,
            status: req.status,
            statistics: req.statistics,
        })
        .await
    {
        Ok(_) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => {
            tracing::warn!("Supervisor update failed: {}", e);
            (e.status_code(), Json(AckResponse::failed(&e)))
        }
    }
}

pub async fn handle_append_log(
    Extension(gateway): Extension<Gateway>,
    Path(id): Path<u64>,
    Json(req): Json<AppendLogRequest>,
) -> (StatusCode, Json<AckResponse>) {
    match gateway
        .call(OrchestratorRequest::AppendSupervisorLog {
            id,
            level: req.level,
            message: req.message,
        })
        .await
    {
        Ok(_) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => (e.status_code(), Json(AckResponse::failed(&e))),
    }
}
