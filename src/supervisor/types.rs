use crate::registry::types::ProcessorAddr;
use crate::storage::memory::Config;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one running job instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupervisorStatus {
    /// Record allocated, remote provisioning not yet confirmed.
    Created,
    /// The remote processor accepted the instance.
    Active,
    /// Finished successfully. Terminal.
    Completed,
    /// The remote node reported an abnormal end. Terminal.
    Crashed,
    /// Abandoned before or during execution. Terminal.
    Cancelled,
    /// Deprecated terminal state, kept for persisted data from older nodes.
    Terminated,
}

impl SupervisorStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Crashed | Self::Cancelled | Self::Terminated
        )
    }

    /// The only legal moves of the state machine. Terminal states have no
    /// outgoing transitions.
    pub fn can_transition_to(&self, next: SupervisorStatus) -> bool {
        match self {
            Self::Created => matches!(next, Self::Active | Self::Cancelled),
            Self::Active => matches!(
                next,
                Self::Completed | Self::Crashed | Self::Cancelled | Self::Terminated
            ),
            _ => false,
        }
    }
}

impl fmt::Display for SupervisorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Crashed => "crashed",
            Self::Cancelled => "cancelled",
            Self::Terminated => "terminated",
        };
        write!(f, "{}", name)
    }
}

/// One instance of a cluster being executed somewhere.
///
/// Retained after completion so its statistics survive until archival.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorRecord {
    pub id: u64,
    pub processor: ProcessorAddr,
    pub module: String,
    pub cluster: String,
    /// The configuration snapshot the instance was launched with.
    pub config: Config,
    pub metadata: serde_json::Value,
    pub status: SupervisorStatus,
    pub statistics: serde_json::Value,
    pub created_at: u64,
}

/// Selects supervisors by identifier, by module, or by (module, cluster).
///
/// More specific constraints win: a non-zero `id` makes every other field
/// irrelevant; module+cluster beats module alone; no constraints selects
/// everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupervisorFilter {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub cluster: Option<String>,
}

impl SupervisorFilter {
    pub fn by_id(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn by_module(module: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            ..Self::default()
        }
    }

    pub fn by_cluster(module: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            cluster: Some(cluster.into()),
            ..Self::default()
        }
    }

    /// Applies the precedence order to one record.
    pub fn matches(&self, record: &SupervisorRecord) -> bool {
        if self.id != 0 {
            return record.id == self.id;
        }
        match (&self.module, &self.cluster) {
            (Some(module), Some(cluster)) => {
                record.module == *module && record.cluster == *cluster
            }
            (Some(module), None) => record.module == *module,
            _ => true,
        }
    }
}
