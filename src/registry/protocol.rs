//! Boundary DTOs for the processor registry.
//!
//! Request bodies for registration and mount operations, plus the snapshot
//! views (`*Info`) that reporting reads hand out instead of live references.
//! Constants define the routes the control plane serves them under.

use super::types::{Cluster, ClusterMode, Module, ModuleConfig, Processor};
use crate::error::OrchestratorError;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_PROCESSOR: &str = "/processor";
pub const ENDPOINT_PROCESSOR_MODULE: &str = "/processor/module";
pub const ENDPOINT_PROCESSORS: &str = "/processors";
pub const ENDPOINT_MODULES: &str = "/modules";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterProcessorRequest {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterModuleRequest {
    pub host: String,
    pub port: u16,
    pub module: ModuleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeregisterModuleRequest {
    pub host: String,
    pub port: u16,
    pub module: String,
}

/// Uniform acknowledgement for mutations.
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failed(err: &OrchestratorError) -> Self {
        Self {
            ok: false,
            error: Some(err.to_string()),
        }
    }
}

/// Reporting view of one processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorInfo {
    pub host: String,
    pub port: u16,
    pub connected: bool,
    pub last_seen: u64,
    pub modules: Vec<String>,
}

impl From<&Processor> for ProcessorInfo {
    fn from(processor: &Processor) -> Self {
        Self {
            host: processor.addr.host.clone(),
            port: processor.addr.port,
            connected: processor.connected,
            last_seen: processor.last_seen,
            modules: processor.modules.clone(),
        }
    }
}

/// Reporting view of one cluster: owners are listed as "host:port" strings in
/// registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub name: String,
    pub mounted: bool,
    pub mode: ClusterMode,
    pub owners: Vec<String>,
}

impl From<&Cluster> for ClusterInfo {
    fn from(cluster: &Cluster) -> Self {
        Self {
            name: cluster.name.clone(),
            mounted: cluster.mounted,
            mode: cluster.mode,
            owners: cluster.owners.iter().map(|owner| owner.to_string()).collect(),
        }
    }
}

/// Reporting view of one module and its clusters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub version: String,
    pub contact: String,
    pub mounted: bool,
    pub clusters: Vec<ClusterInfo>,
}

impl From<&Module> for ModuleInfo {
    fn from(module: &Module) -> Self {
        let mut clusters: Vec<ClusterInfo> = module.clusters.values().map(ClusterInfo::from).collect();
        clusters.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            name: module.name.clone(),
            version: module.version.clone(),
            contact: module.contact.clone(),
            mounted: module.mounted,
            clusters,
        }
    }
}
