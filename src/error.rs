//! Error Taxonomy
//!
//! Every failure the control plane can produce, as a distinguishable value.
//! Validation errors are resolved synchronously inside the owning registry and
//! returned directly to the caller; `NoResponseReceived` is the only error that
//! crosses an asynchronous boundary (a bus call that timed out). The boundary
//! layer maps each variant to a stable response code.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestratorError {
    /// A processor with this (host, port) identity is already registered.
    #[error("processor {host}:{port} already exists")]
    AlreadyExists { host: String, port: u16 },

    /// No processor with this (host, port) identity is registered.
    #[error("processor {host}:{port} does not exist")]
    DoesNotExist { host: String, port: u16 },

    /// The calling processor already advertised this module.
    #[error("module {0} already registered by this processor")]
    ModuleAlreadyRegistered(String),

    /// A registration offered a version different from the one on record.
    #[error("module {module} is registered at version {existing}, refusing {offered}")]
    ModuleVersionClash {
        module: String,
        existing: String,
        offered: String,
    },

    /// A registration offered contact metadata different from the one on record.
    #[error("module {module} is registered with contact {existing}, refusing {offered}")]
    ModuleContactClash {
        module: String,
        existing: String,
        offered: String,
    },

    #[error("module {0} does not exist")]
    ModuleDoesNotExist(String),

    #[error("module {0} is not mounted")]
    ModuleNotMounted(String),

    #[error("cluster {module}/{cluster} does not exist")]
    ClusterDoesNotExist { module: String, cluster: String },

    #[error("cluster {module}/{cluster} is not mounted")]
    ClusterNotMounted { module: String, cluster: String },

    /// Stream-mode clusters are provisioned once at deployment, never on demand.
    #[error("cluster {module}/{cluster} runs in stream mode and cannot be provisioned on demand")]
    CanNotProvisionStreamCluster { module: String, cluster: String },

    /// A bus call expired before the callee recorded a response.
    #[error("no response received after {waited_ms}ms")]
    NoResponseReceived { waited_ms: u64 },

    /// No record matches the given identifier or filter.
    #[error("no matching record found")]
    NotFound,

    /// The supervisor record was allocated (and is now `Cancelled`), but the
    /// remote processor could not be reached or refused the instance. Carries
    /// the identifier so the caller can still inspect the cancelled record.
    #[error("provisioning of supervisor {id} failed: {reason}")]
    ProvisioningFailed { id: u64, reason: String },

    /// The requested status change leaves a terminal state or skips a step.
    #[error("illegal supervisor status transition {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// A job duplicates an existing definition (same identifier, or same
    /// module + cluster + interval binding).
    #[error("job duplicates an existing definition: {0}")]
    DuplicateJob(String),

    /// The persistence collaborator rejected or failed an operation.
    #[error("storage operation failed: {0}")]
    StorageFailed(String),

    /// A reply arrived that the caller has no handling for.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OrchestratorError {
    /// Stable response code for the HTTP boundary.
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            Self::AlreadyExists { .. }
            | Self::ModuleAlreadyRegistered(_)
            | Self::ModuleVersionClash { .. }
            | Self::ModuleContactClash { .. }
            | Self::DuplicateJob(_)
            | Self::InvalidStatusTransition { .. } => StatusCode::CONFLICT,

            Self::DoesNotExist { .. }
            | Self::ModuleDoesNotExist(_)
            | Self::ClusterDoesNotExist { .. }
            | Self::NotFound => StatusCode::NOT_FOUND,

            Self::ModuleNotMounted(_)
            | Self::ClusterNotMounted { .. }
            | Self::CanNotProvisionStreamCluster { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            Self::NoResponseReceived { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::ProvisioningFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::StorageFailed(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
