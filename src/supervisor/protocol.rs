//! Provisioning wire body and boundary DTOs.
//!
//! `ProvisionRequest` is what the control plane POSTs to a remote processor
//! node; the node later calls back with `UpdateSupervisorRequest` to report
//! lifecycle transitions.

use super::types::SupervisorStatus;
use crate::storage::logging::LogLevel;
use crate::storage::memory::Config;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_SUPERVISOR: &str = "/supervisor";
pub const ENDPOINT_SUPERVISOR_QUERY: &str = "/supervisor/query";

/// Body of the provisioning call to a remote processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub module: String,
    pub cluster: String,
    pub config: Config,
    pub id: u64,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSupervisorRequest {
    pub module: String,
    pub cluster: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// The id is present whenever a record was allocated, including a record the
/// failed provisioning attempt left `Cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSupervisorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lifecycle report pushed by the remote node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSupervisorRequest {
    pub id: u64,
    pub status: SupervisorStatus,
    #[serde(default)]
    pub statistics: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendLogRequest {
    pub level: LogLevel,
    pub message: String,
}
