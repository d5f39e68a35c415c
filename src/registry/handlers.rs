use super::protocol::{
    AckResponse, DeregisterModuleRequest, RegisterModuleRequest, RegisterProcessorRequest,
};
use crate::orchestrator::actor::Gateway;
use crate::orchestrator::messages::{OrchestratorRequest, OrchestratorResponse};

use axum::{Extension, Json, extract::Path, http::StatusCode};

pub async fn handle_register_processor(
    Extension(gateway): Extension<Gateway>,
    Json(req): Json<RegisterProcessorRequest>,
) -> (StatusCode, Json<AckResponse>) {
    ack(
        gateway
            .call(OrchestratorRequest::RegisterProcessor {
                host: req.host,
                port: req.port,
            })
            .await,
    )
}

pub async fn handle_deregister_processor(
    Extension(gateway): Extension<Gateway>,
    Json(req): Json<RegisterProcessorRequest>,
) -> (StatusCode, Json<AckResponse>) {
    ack(
        gateway
            .call(OrchestratorRequest::DeregisterProcessor {
                host: req.host,
                port: req.port,
            })
            .await,
    )
}

pub async fn handle_register_module(
    Extension(gateway): Extension<Gateway>,
    Json(req): Json<RegisterModuleRequest>,
) -> (StatusCode, Json<AckResponse>) {
    ack(
        gateway
            .call(OrchestratorRequest::RegisterModule {
                host: req.host,
                port: req.port,
                config: req.module,
            })
            .await,
    )
}

pub async fn handle_deregister_module(
    Extension(gateway): Extension<Gateway>,
    Json(req): Json<DeregisterModuleRequest>,
) -> (StatusCode, Json<AckResponse>) {
    ack(
        gateway
            .call(OrchestratorRequest::DeregisterModule {
                host: req.host,
                port: req.port,
                module: req.module,
            })
            .await,
    )
}

pub async fn handle_mount_module(
    Extension(gateway): Extension<Gateway>,
    Path(module): Path<String>,
) -> (StatusCode, Json<AckResponse>) {
    ack(gateway.call(OrchestratorRequest::MountModule { module }).await)
}

pub async fn handle_unmount_module(
    Extension(gateway): Extension<Gateway>,
    Path(module): Path<String>,
) -> (StatusCode, Json<AckResponse>) {
    ack(gateway.call(OrchestratorRequest::UnmountModule { module }).await)
}

pub async fn handle_mount_cluster(
    Extension(gateway): Extension<Gateway>,
    Path((module, cluster)): Path<(String, String)>,
) -> (StatusCode, Json<AckResponse>) {
    ack(
        gateway
            .call(OrchestratorRequest::MountCluster { module, cluster })
            .await,
    )
}

pub async fn handle_unmount_cluster(
    Extension(gateway): Extension<Gateway>,
    Path((module, cluster)): Path<(String, String)>,
) -> (StatusCode, Json<AckResponse>) {
    ack(
        gateway
            .call(OrchestratorRequest::UnmountCluster { module, cluster })
            .await,
    )
}

pub async fn handle_list_processors(
    Extension(gateway): Extension<Gateway>,
) -> (StatusCode, Json<serde_json::Value>) {
    listing(gateway.call(OrchestratorRequest::ListProcessors).await, |reply| {
        match reply {
            OrchestratorResponse::Processors(processors) => {
                serde_json::to_value(processors).ok()
            }
            _ => None,
        }
    })
}

pub async fn handle_list_modules(
    Extension(gateway): Extension<Gateway>,
) -> (StatusCode, Json<serde_json::Value>) {
    listing(gateway.call(OrchestratorRequest::ListModules).await, |reply| {
        match reply {
            OrchestratorResponse::Modules(modules) => serde_json::to_value(modules).ok(),
            _ => None,
        }
    })
}

pub async fn handle_list_clusters(
    Extension(gateway): Extension<Gateway>,
    Path(module): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    listing(
        gateway.call(OrchestratorRequest::ListClusters { module }).await,
        |reply| match reply {
            OrchestratorResponse::Clusters(clusters) => serde_json::to_value(clusters).ok(),
            _ => None,
        },
    )
}

fn ack(
    reply: Result<OrchestratorResponse, crate::error::OrchestratorError>,
) -> (StatusCode, Json<AckResponse>) {
    match reply {
        Ok(_) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => {
            tracing::warn!("Registry operation failed: {}", e);
            (e.status_code(), Json(AckResponse::failed(&e)))
        }
    }
}

fn listing(
    reply: Result<OrchestratorResponse, crate::error::OrchestratorError>,
    extract: impl FnOnce(OrchestratorResponse) -> Option<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    match reply {
        Ok(response) => match extract(response) {
            Some(value) => (StatusCode::OK, Json(value)),
            None => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "unexpected reply" })),
            ),
        },
        Err(e) => (
            e.status_code(),
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}
