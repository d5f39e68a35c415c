use super::actor::{StorageReply, StorageRequest, StorageResponse};
use super::memory::Config;
use super::protocol::{ConfigRequest, DeleteConfigRequest};
use crate::bus::CorrelationBus;
use crate::config::Timeouts;
use crate::registry::protocol::AckResponse;

use axum::{Extension, Json, extract::Path, http::StatusCode};
use std::sync::Arc;

type StorageGateway = CorrelationBus<StorageRequest, StorageReply>;

pub async fn handle_store_config(
    Extension(storage): Extension<StorageGateway>,
    Extension(timeouts): Extension<Arc<Timeouts>>,
    Json(req): Json<ConfigRequest>,
) -> (StatusCode, Json<AckResponse>) {
    let request = StorageRequest::StoreConfig {
        module: req.module,
        cluster: req.cluster,
        config: req.config,
    };
    ack(storage.call(request, timeouts.bus_call).await)
}

pub async fn handle_replace_config(
    Extension(storage): Extension<StorageGateway>,
    Extension(timeouts): Extension<Arc<Timeouts>>,
    Json(req): Json<ConfigRequest>,
) -> (StatusCode, Json<AckResponse>) {
    let request = StorageRequest::ReplaceConfig {
        module: req.module,
        cluster: req.cluster,
        config: req.config,
    };
    ack(storage.call(request, timeouts.bus_call).await)
}

pub async fn handle_delete_config(
    Extension(storage): Extension<StorageGateway>,
    Extension(timeouts): Extension<Arc<Timeouts>>,
    Json(req): Json<DeleteConfigRequest>,
) -> (StatusCode, Json<AckResponse>) {
    let request = StorageRequest::DeleteConfig {
        module: req.module,
        cluster: req.cluster,
    };
    ack(storage.call(request, timeouts.bus_call).await)
}

pub async fn handle_get_config(
    Extension(storage): Extension<StorageGateway>,
    Extension(timeouts): Extension<Arc<Timeouts>>,
    Path((module, cluster)): Path<(String, String)>,
) -> (StatusCode, Json<Option<Config>>) {
    let request = StorageRequest::GetConfig { module, cluster };
    match storage.call(request, timeouts.bus_call).await {
        Ok(Ok(StorageResponse::Config(config))) => (StatusCode::OK, Json(Some(config))),
        Ok(Err(e)) => (e.status_code(), Json(None)),
        Err(e) => (e.status_code(), Json(None)),
        Ok(Ok(_)) => (StatusCode::INTERNAL_SERVER_ERROR, Json(None)),
    }
}

fn ack(
    reply: Result<StorageReply, crate::error::OrchestratorError>,
) -> (StatusCode, Json<AckResponse>) {
    match reply {
        Ok(Ok(_)) => (StatusCode::OK, Json(AckResponse::ok())),
        Ok(Err(e)) => {
            tracing::warn!("Config operation failed: {}", e);
            (e.status_code(), Json(AckResponse::failed(&e)))
        }
        Err(e) => {
            tracing::warn!("Config operation failed: {}", e);
            (e.status_code(), Json(AckResponse::failed(&e)))
        }
    }
}
