use super::messages::{OrchestratorReply, OrchestratorRequest, OrchestratorResponse};
use crate::bus::{CorrelationBus, Inbox};
use crate::config::Timeouts;
use crate::error::OrchestratorError;
use crate::registry::table::ProcessorTable;
use crate::registry::types::ProcessorAddr;
use crate::storage::actor::{StorageReply, StorageRequest, StorageResponse};
use crate::storage::memory::Config;
use crate::supervisor::registry::{SupervisorReply, SupervisorRequest, SupervisorResponse};

use std::sync::Arc;
use std::time::Duration;

pub struct OrchestratorActor {
    table: Arc<ProcessorTable>,
    supervisors: CorrelationBus<SupervisorRequest, SupervisorReply>,
    storage: CorrelationBus<StorageRequest, StorageReply>,
    timeouts: Timeouts,
}

impl OrchestratorActor {
    pub fn new(
        table: Arc<ProcessorTable>,
        supervisors: CorrelationBus<SupervisorRequest, SupervisorReply>,
        storage: CorrelationBus<StorageRequest, StorageReply>,
        timeouts: Timeouts,
    ) -> Arc<Self> {
        Arc::new(Self {
            table,
            supervisors,
            storage,
            timeouts,
        })
    }

    /// Message loop; one handler task per inbound message.
    pub async fn run(self: Arc<Self>, mut inbox: Inbox<OrchestratorRequest, OrchestratorReply>) {
        tracing::info!("Orchestrator actor started");

        while let Some((token, request, responder)) = inbox.recv().await {
            let actor = self.clone();
            tokio::spawn(async move {
                let reply = actor.handle(request).await;
                responder.complete(token, reply);
            });
        }

        tracing::info!("Orchestrator inbound queue closed, stopping");
    }

    async fn handle(&self, request: OrchestratorRequest) -> OrchestratorReply {
        match request {
            OrchestratorRequest::RegisterProcessor { host, port } => {
                self.table.add_processor(&host, port).await?;
                Ok(OrchestratorResponse::Done)
            }
            OrchestratorRequest::DeregisterProcessor { host, port } => {
                self.table.remove_processor(&host, port).await?;
                Ok(OrchestratorResponse::Done)
            }
            OrchestratorRequest::RegisterModule { host, port, config } => {
                self.table
                    .add_module(&ProcessorAddr::new(host, port), config)
                    .await?;
                Ok(OrchestratorResponse::Done)
            }
            OrchestratorRequest::DeregisterModule { host, port, module } => {
                self.table
                    .remove_module(&ProcessorAddr::new(host, port), &module)
                    .await?;
                Ok(OrchestratorResponse::Done)
            }
            OrchestratorRequest::MountModule { module } => {
                self.table.mount_module(&module).await?;
                Ok(OrchestratorResponse::Done)
            }
            OrchestratorRequest::UnmountModule { module } => {
                self.table.unmount_module(&module).await?;
                Ok(OrchestratorResponse::Done)
            }
            OrchestratorRequest::MountCluster { module, cluster } => {
                self.table.mount_cluster(&module, &cluster).await?;
                Ok(OrchestratorResponse::Done)
            }
            OrchestratorRequest::UnmountCluster { module, cluster } => {
                self.table.unmount_cluster(&module, &cluster).await?;
                Ok(OrchestratorResponse::Done)
            }
            OrchestratorRequest::ListProcessors => {
                Ok(OrchestratorResponse::Processors(self.table.processors().await))
            }
            OrchestratorRequest::ListModules => Ok(OrchestratorResponse::Modules(
                self.table.registered_modules().await,
            )),
            OrchestratorRequest::ListClusters { module } => Ok(OrchestratorResponse::Clusters(
                self.table.get_clusters(&module).await?,
            )),
            OrchestratorRequest::CreateSupervisor {
                module,
                cluster,
                metadata,
            } => self.create_supervisor(module, cluster, metadata).await,
            OrchestratorRequest::GetSupervisors { filter } => {
                let reply = self
                    .supervisors
                    .call(SupervisorRequest::Get { filter }, self.timeouts.bus_call)
                    .await??;
                match reply {
                    SupervisorResponse::Records(records) => {
                        Ok(OrchestratorResponse::Supervisors(records))
                    }
                    other => Err(unexpected_reply("supervisor query", &other)),
                }
            }
            OrchestratorRequest::UpdateSupervisor {
                id,
                status,
                statistics,
            } => {
                self.supervisors
                    .call(
                        SupervisorRequest::Update {
                            id,
                            status,
                            statistics,
                        },
                        self.timeouts.bus_call,
                    )
                    .await??;
                Ok(OrchestratorResponse::Done)
            }
            OrchestratorRequest::AppendSupervisorLog { id, level, message } => {
                self.supervisors
                    .call(
                        SupervisorRequest::LogAppend { id, level, message },
                        self.timeouts.bus_call,
                    )
                    .await??;
                Ok(OrchestratorResponse::Done)
            }
        }
    }

    /// The provisioning path shared by the boundary and the scheduler:
    /// validate mount flags and cluster mode before anything is allocated,
    /// pick the next owner round-robin, fetch the config snapshot, and hand
    /// creation to the supervisor registry.
    async fn create_supervisor(
        &self,
        module: String,
        cluster: String,
        metadata: serde_json::Value,
    ) -> OrchestratorReply {
        self.table.ensure_provisionable(&module, &cluster).await?;
        let processor = self.table.select_processor(&module, &cluster).await?;
        let config = self.fetch_config(&module, &cluster).await?;

        // The create call spans the remote provisioning request, so it gets
        // the provisioning budget on top of the usual bus allowance.
        let wait = self.timeouts.provision + self.timeouts.bus_call;
        let reply = self
            .supervisors
            .call(
                SupervisorRequest::Create {
                    processor,
                    module,
                    cluster,
                    config,
                    metadata,
                },
                wait,
            )
            .await??;

        match reply {
            SupervisorResponse::Created { id } => {
                Ok(OrchestratorResponse::SupervisorCreated { id })
            }
            other => Err(unexpected_reply("supervisor create", &other)),
        }
    }

    async fn fetch_config(
        &self,
        module: &str,
        cluster: &str,
    ) -> Result<Config, OrchestratorError> {
        let reply = self
            .storage
            .call(
                StorageRequest::GetConfig {
                    module: module.to_string(),
                    cluster: cluster.to_string(),
                },
                self.timeouts.bus_call,
            )
            .await??;

        match reply {
            StorageResponse::Config(config) => Ok(config),
            other => Err(OrchestratorError::Internal(format!(
                "unexpected reply to config fetch: {:?}",
                other
            ))),
        }
    }
}

fn unexpected_reply(context: &str, reply: &SupervisorResponse) -> OrchestratorError {
    OrchestratorError::Internal(format!("unexpected reply to {}: {:?}", context, reply))
}

/// Cloneable handle the HTTP layer uses to reach the actor: one bus call per
/// request, with the operator-configured boundary timeout.
#[derive(Clone)]
pub struct Gateway {
    bus: CorrelationBus<OrchestratorRequest, OrchestratorReply>,
    timeouts: Timeouts,
}

impl Gateway {
    pub fn new(
        bus: CorrelationBus<OrchestratorRequest, OrchestratorReply>,
        timeouts: Timeouts,
    ) -> Self {
        Self { bus, timeouts }
    }

    /// Budget for one boundary call. Supervisor creation waits out the whole
    /// provisioning chain; everything else gets the plain bus allowance.
    pub fn wait_for(&self, request: &OrchestratorRequest) -> Duration {
        match request {
            OrchestratorRequest::CreateSupervisor { .. } => {
                self.timeouts.provision + 2 * self.timeouts.bus_call
            }
            _ => self.timeouts.bus_call,
        }
    }

    pub async fn call(
        &self,
        request: OrchestratorRequest,
    ) -> Result<OrchestratorResponse, OrchestratorError> {
        let wait = self.wait_for(&request);
        self.bus.call(request, wait).await?
    }
}
