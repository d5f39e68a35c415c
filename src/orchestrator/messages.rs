//! Requests the orchestrator actor accepts, and the replies it records.

use crate::error::OrchestratorError;
use crate::registry::protocol::{ClusterInfo, ModuleInfo, ProcessorInfo};
use crate::registry::types::ModuleConfig;
use crate::storage::logging::LogLevel;
use crate::supervisor::types::{SupervisorFilter, SupervisorRecord, SupervisorStatus};

#[derive(Debug)]
pub enum OrchestratorRequest {
    RegisterProcessor {
        host: String,
        port: u16,
    },
    DeregisterProcessor {
        host: String,
        port: u16,
    },
    RegisterModule {
        host: String,
        port: u16,
        config: ModuleConfig,
    },
    DeregisterModule {
        host: String,
        port: u16,
        module: String,
    },
    MountModule {
        module: String,
    },
    UnmountModule {
        module: String,
    },
    MountCluster {
        module: String,
        cluster: String,
    },
    UnmountCluster {
        module: String,
        cluster: String,
    },
    ListProcessors,
    ListModules,
    ListClusters {
        module: String,
    },
    CreateSupervisor {
        module: String,
        cluster: String,
        metadata: serde_json::Value,
    },
    GetSupervisors {
        filter: SupervisorFilter,
    },
    UpdateSupervisor {
        id: u64,
        status: SupervisorStatus,
        statistics: serde_json::Value,
    },
    AppendSupervisorLog {
        id: u64,
        level: LogLevel,
        message: String,
    },
}

#[derive(Debug)]
pub enum OrchestratorResponse {
    Done,
    Processors(Vec<ProcessorInfo>),
    Modules(Vec<ModuleInfo>),
    Clusters(Vec<ClusterInfo>),
    SupervisorCreated { id: u64 },
    Supervisors(Vec<SupervisorRecord>),
}

pub type OrchestratorReply = Result<OrchestratorResponse, OrchestratorError>;
