//! The queue, the tick pass and the dispatch loop.

use super::types::{Job, JobFilter};
use crate::bus::CorrelationBus;
use crate::config::Timeouts;
use crate::error::OrchestratorError;
use crate::orchestrator::messages::{OrchestratorReply, OrchestratorRequest, OrchestratorResponse};
use crate::registry::types::ClusterMode;
use crate::storage::actor::{StorageReply, StorageRequest, StorageResponse};

use chrono::Timelike;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// How long the dispatch loop sleeps when the queue is empty.
const DRAIN_IDLE: Duration = Duration::from_millis(500);

pub struct JobScheduler {
    storage: CorrelationBus<StorageRequest, StorageReply>,
    orchestrator: CorrelationBus<OrchestratorRequest, OrchestratorReply>,
    queue: Mutex<VecDeque<Job>>,
    /// Jobs with a dispatch in flight (queued or mid-create). Keyed by job id.
    running: DashMap<String, ()>,
    timeouts: Timeouts,
}

impl JobScheduler {
    pub fn new(
        storage: CorrelationBus<StorageRequest, StorageReply>,
        orchestrator: CorrelationBus<OrchestratorRequest, OrchestratorReply>,
        timeouts: Timeouts,
    ) -> Arc<Self> {
        Arc::new(Self {
            storage,
            orchestrator,
            queue: Mutex::new(VecDeque::new()),
            running: DashMap::new(),
            timeouts,
        })
    }

    /// Spawns the eligibility watch and the dispatch loop.
    pub fn start(self: &Arc<Self>) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(scheduler.timeouts.tick);
            loop {
                interval.tick().await;
                let minute = chrono::Local::now().minute();
                scheduler.tick(minute).await;
            }
        });

        let scheduler = self.clone();
        tokio::spawn(async move {
            tracing::info!("Dispatch loop started");
            loop {
                match scheduler.dispatch_next().await {
                    Ok(true) => {}
                    Ok(false) => tokio::time::sleep(DRAIN_IDLE).await,
                    Err(e) => {
                        tracing::error!(
                            "Dispatch loop stopped: {}; operator intervention required",
                            e
                        );
                        break;
                    }
                }
            }
        });
    }

    /// Stores a new job definition after duplicate and cluster-mode checks.
    /// An empty identifier gets a generated one; the stored job is returned.
    pub async fn create_job(&self, mut job: Job) -> Result<Job, OrchestratorError> {
        if job.id.is_empty() {
            job.id = Uuid::new_v4().to_string();
        }

        let existing = self.fetch_jobs(JobFilter::default()).await?;
        if let Some(clashing) = existing.iter().find(|stored| stored.duplicates(&job)) {
            return Err(OrchestratorError::DuplicateJob(clashing.id.clone()));
        }

        self.reject_stream_cluster(&job).await?;

        self.storage
            .call(
                StorageRequest::CreateJob { job: job.clone() },
                self.timeouts.bus_call,
            )
            .await??;

        tracing::info!(
            "Job {} stored: {}/{} every {} minute(s)",
            job.id,
            job.module,
            job.cluster,
            job.interval.minute
        );
        Ok(job)
    }

    /// A job must not target a cluster currently registered as stream-mode.
    /// An unregistered module is fine; the definition may predate it.
    async fn reject_stream_cluster(&self, job: &Job) -> Result<(), OrchestratorError> {
        let reply = self
            .orchestrator
            .call(
                OrchestratorRequest::ListClusters {
                    module: job.module.clone(),
                },
                self.timeouts.bus_call,
            )
            .await?;

        let clusters = match reply {
            Ok(OrchestratorResponse::Clusters(clusters)) => clusters,
            Ok(other) => {
                return Err(OrchestratorError::Internal(format!(
                    "unexpected reply to cluster listing: {:?}",
                    other
                )));
            }
            Err(OrchestratorError::ModuleDoesNotExist(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        match clusters.iter().find(|cluster| cluster.name == job.cluster) {
            Some(cluster) if cluster.mode == ClusterMode::Stream => {
                Err(OrchestratorError::CanNotProvisionStreamCluster {
                    module: job.module.clone(),
                    cluster: job.cluster.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    pub async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<Job>, OrchestratorError> {
        self.fetch_jobs(filter).await
    }

    pub async fn delete_jobs(&self, filter: JobFilter) -> Result<usize, OrchestratorError> {
        let reply = self
            .storage
            .call(StorageRequest::DeleteJobs { filter }, self.timeouts.bus_call)
            .await??;
        match reply {
            StorageResponse::Deleted(count) => Ok(count),
            other => Err(OrchestratorError::Internal(format!(
                "unexpected reply to job deletion: {:?}",
                other
            ))),
        }
    }

    /// Snapshot copy of the pending queue, without draining it.
    pub async fn queued_jobs(&self) -> Vec<Job> {
        self.queue.lock().await.iter().cloned().collect()
    }

    /// One eligibility pass. Eligible jobs enter the FIFO queue in store
    /// order and are marked in-flight so later passes skip them.
    pub async fn tick(&self, current_minute: u32) {
        let jobs = match self.fetch_jobs(JobFilter::default()).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!("Eligibility pass skipped, job fetch failed: {}", e);
                return;
            }
        };

        let mut queue = self.queue.lock().await;
        for job in jobs {
            let running = self.running.contains_key(&job.id);
            if job.is_time_to_run(current_minute, running) {
                tracing::info!("Job {} eligible at minute {}", job.id, current_minute);
                self.running.insert(job.id.clone(), ());
                queue.push_back(job);
            }
        }
    }

    /// Pops and dispatches the front job.
    ///
    /// `Ok(true)` dispatched (or failed recoverably), `Ok(false)` empty
    /// queue, `Err` one of the two systemic conditions that stop the loop.
    pub async fn dispatch_next(&self) -> Result<bool, OrchestratorError> {
        let job = { self.queue.lock().await.pop_front() };
        let Some(job) = job else {
            return Ok(false);
        };

        let result = self.dispatch(&job).await;
        self.running.remove(&job.id);

        match result {
            Ok(id) => {
                tracing::info!("Job {} dispatched as supervisor {}", job.id, id);
                Ok(true)
            }
            Err(e)
                if matches!(
                    e,
                    OrchestratorError::CanNotProvisionStreamCluster { .. }
                        | OrchestratorError::NoResponseReceived { .. }
                ) =>
            {
                tracing::error!("Job {} hit a systemic failure: {}", job.id, e);
                Err(e)
            }
            Err(e) => {
                tracing::warn!(
                    "Job {} dispatch failed: {}; retrying on its next eligible tick",
                    job.id,
                    e
                );
                Ok(true)
            }
        }
    }

    /// The same create-supervisor path the boundary uses.
    async fn dispatch(&self, job: &Job) -> Result<u64, OrchestratorError> {
        // The call spans the remote provisioning request.
        let wait = self.timeouts.provision + 2 * self.timeouts.bus_call;
        let reply = self
            .orchestrator
            .call(
                OrchestratorRequest::CreateSupervisor {
                    module: job.module.clone(),
                    cluster: job.cluster.clone(),
                    metadata: job.metadata.clone(),
                },
                wait,
            )
            .await??;

        match reply {
            OrchestratorResponse::SupervisorCreated { id } => Ok(id),
            other => Err(OrchestratorError::Internal(format!(
                "unexpected reply to supervisor create: {:?}",
                other
            ))),
        }
    }

    async fn fetch_jobs(&self, filter: JobFilter) -> Result<Vec<Job>, OrchestratorError> {
        let reply = self
            .storage
            .call(StorageRequest::GetJobs { filter }, self.timeouts.bus_call)
            .await??;
        match reply {
            StorageResponse::Jobs(jobs) => Ok(jobs),
            other => Err(OrchestratorError::Internal(format!(
                "unexpected reply to job fetch: {:?}",
                other
            ))),
        }
    }
}
