//! The supervisor registry and its actor loop.
//!
//! The registry owns the record table and the identifier counter. `create`
//! performs the remote provisioning call, which can block for the full
//! network timeout, so the actor loop spawns one handler task per inbound
//! message instead of serializing behind a slow create.

use super::protocol::ProvisionRequest;
use super::types::{SupervisorFilter, SupervisorRecord, SupervisorStatus};
use crate::bus::{CorrelationBus, Inbox};
use crate::config::Timeouts;
use crate::error::OrchestratorError;
use crate::registry::types::{ProcessorAddr, now_ms};
use crate::storage::actor::{StorageReply, StorageRequest};
use crate::storage::logging::{LogLevel, SupervisorLog};
use crate::storage::memory::Config;

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Requests the registry serves over the bus.
#[derive(Debug)]
pub enum SupervisorRequest {
    Create {
        processor: ProcessorAddr,
        module: String,
        cluster: String,
        config: Config,
        metadata: serde_json::Value,
    },
    Get {
        filter: SupervisorFilter,
    },
    Update {
        id: u64,
        status: SupervisorStatus,
        statistics: serde_json::Value,
    },
    LogAppend {
        id: u64,
        level: LogLevel,
        message: String,
    },
}

#[derive(Debug)]
pub enum SupervisorResponse {
    Created { id: u64 },
    Records(Vec<SupervisorRecord>),
    Done,
}

pub type SupervisorReply = Result<SupervisorResponse, OrchestratorError>;

pub struct SupervisorRegistry {
    records: DashMap<u64, SupervisorRecord>,
    next_id: AtomicU64,
    storage: CorrelationBus<StorageRequest, StorageReply>,
    log: Arc<dyn SupervisorLog>,
    http_client: reqwest::Client,
    timeouts: Timeouts,
}

impl SupervisorRegistry {
    pub fn new(
        storage: CorrelationBus<StorageRequest, StorageReply>,
        log: Arc<dyn SupervisorLog>,
        timeouts: Timeouts,
    ) -> Arc<Self> {
        Arc::new(Self {
            records: DashMap::new(),
            next_id: AtomicU64::new(0),
            storage,
            log,
            http_client: reqwest::Client::new(),
            timeouts,
        })
    }

    /// Message loop; one handler task per inbound message.
    pub async fn serve(self: Arc<Self>, mut inbox: Inbox<SupervisorRequest, SupervisorReply>) {
        tracing::info!("Supervisor registry started");

        while let Some((token, request, responder)) = inbox.recv().await {
            let registry = self.clone();
            tokio::spawn(async move {
                let reply = registry.handle(request).await;
                responder.complete(token, reply);
            });
        }

        tracing::info!("Supervisor registry inbound queue closed, stopping");
    }

    async fn handle(&self, request: SupervisorRequest) -> SupervisorReply {
        match request {
            SupervisorRequest::Create {
                processor,
                module,
                cluster,
                config,
                metadata,
            } => {
                let id = self
                    .create(processor, module, cluster, config, metadata)
                    .await?;
                Ok(SupervisorResponse::Created { id })
            }
            SupervisorRequest::Get { filter } => {
                Ok(SupervisorResponse::Records(self.get_by(&filter)?))
            }
            SupervisorRequest::Update {
                id,
                status,
                statistics,
            } => {
                self.update(id, status, statistics).await?;
                Ok(SupervisorResponse::Done)
            }
            SupervisorRequest::LogAppend { id, level, message } => {
                self.log_append(id, level, &message)?;
                Ok(SupervisorResponse::Done)
            }
        }
    }

    /// Allocates the next identifier, stores the record in `Created` state
    /// and provisions it on the owning processor.
    ///
    /// Mount validation happened before this registry was contacted; by the
    /// time a record exists, only the network can still say no.
    pub async fn create(
        &self,
        processor: ProcessorAddr,
        module: String,
        cluster: String,
        config: Config,
        metadata: serde_json::Value,
    ) -> Result<u64, OrchestratorError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;

        let record = SupervisorRecord {
            id,
            processor: processor.clone(),
            module: module.clone(),
            cluster: cluster.clone(),
            config: config.clone(),
            metadata: metadata.clone(),
            status: SupervisorStatus::Created,
            statistics: serde_json::Value::Null,
            created_at: now_ms(),
        };
        self.records.insert(id, record);
        tracing::info!(
            "Supervisor {} created for {}/{} on {}",
            id,
            module,
            cluster,
            processor
        );

        match self
            .provision(&processor, &module, &cluster, &config, id, &metadata)
            .await
        {
            Ok(()) => {
                self.set_status(id, SupervisorStatus::Active);
                tracing::info!("Supervisor {} active on {}", id, processor);
                Ok(id)
            }
            Err(reason) => {
                self.set_status(id, SupervisorStatus::Cancelled);
                tracing::warn!("Supervisor {} cancelled: {}", id, reason);
                Err(OrchestratorError::ProvisioningFailed { id, reason })
            }
        }
    }

    /// The remote provisioning call. A single attempt bounded by the request
    /// timeout; HTTP 200 is success, anything else is failure.
    async fn provision(
        &self,
        processor: &ProcessorAddr,
        module: &str,
        cluster: &str,
        config: &Config,
        id: u64,
        metadata: &serde_json::Value,
    ) -> Result<(), String> {
        let url = format!(
            "http://{}{}",
            processor,
            super::protocol::ENDPOINT_SUPERVISOR
        );
        let payload = ProvisionRequest {
            module: module.to_string(),
            cluster: cluster.to_string(),
            config: config.clone(),
            id,
            metadata: metadata.clone(),
        };

        let response = self
            .http_client
            .post(url)
            .json(&payload)
            .timeout(self.timeouts.provision)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("processor replied {}", response.status()));
        }

        Ok(())
    }

    pub fn get(&self, id: u64) -> Result<SupervisorRecord, OrchestratorError> {
        self.records
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(OrchestratorError::NotFound)
    }

    /// Filter resolution is strict: a non-zero id is an exact lookup (and a
    /// miss is `NotFound`); otherwise the filter selects a (possibly empty)
    /// set, ordered by id.
    pub fn get_by(
        &self,
        filter: &SupervisorFilter,
    ) -> Result<Vec<SupervisorRecord>, OrchestratorError> {
        if filter.id != 0 {
            return Ok(vec![self.get(filter.id)?]);
        }

        let mut records: Vec<SupervisorRecord> = self
            .records
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    /// Applies a lifecycle report from the remote node.
    ///
    /// The in-memory record always reflects the report once the transition is
    /// legal; on a terminal transition the final statistics are archived and
    /// the supervisor's log is closed, and a failed archive fails the update
    /// even though the status already changed.
    pub async fn update(
        &self,
        id: u64,
        status: SupervisorStatus,
        statistics: serde_json::Value,
    ) -> Result<(), OrchestratorError> {
        let (module, cluster) = {
            let mut entry = self.records.get_mut(&id).ok_or(OrchestratorError::NotFound)?;

            if !entry.status.can_transition_to(status) {
                return Err(OrchestratorError::InvalidStatusTransition {
                    from: entry.status.to_string(),
                    to: status.to_string(),
                });
            }

            entry.status = status;
            entry.statistics = statistics.clone();
            (entry.module.clone(), entry.cluster.clone())
        };

        tracing::info!("Supervisor {} now {}", id, status);

        if status.is_terminal() {
            self.storage
                .call(
                    StorageRequest::StoreStatistic {
                        module: module.clone(),
                        cluster: cluster.clone(),
                        snapshot: statistics,
                    },
                    self.timeouts.bus_call,
                )
                .await??;
            self.log.close(&module, &cluster, id);
        }

        Ok(())
    }

    /// Pass-through to the supervisor's append-only log buffer.
    pub fn log_append(
        &self,
        id: u64,
        level: LogLevel,
        message: &str,
    ) -> Result<(), OrchestratorError> {
        let record = self.records.get(&id).ok_or(OrchestratorError::NotFound)?;
        self.log
            .append(&record.module, &record.cluster, id, level, message);
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    fn set_status(&self, id: u64, status: SupervisorStatus) {
        if let Some(mut entry) = self.records.get_mut(&id) {
            entry.status = status;
        }
    }
}
