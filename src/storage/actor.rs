//! Storage actor.
//!
//! Serves the in-memory store over the Correlation Bus. One request at a
//! time: every operation is a cheap map access, so the loop never blocks long
//! enough to need per-message handler tasks.

use super::memory::{Config, MemoryStore};
use crate::bus::Inbox;
use crate::error::OrchestratorError;
use crate::scheduler::types::{Job, JobFilter};

use std::sync::Arc;

#[derive(Debug)]
pub enum StorageRequest {
    GetConfig { module: String, cluster: String },
    StoreConfig { module: String, cluster: String, config: Config },
    ReplaceConfig { module: String, cluster: String, config: Config },
    DeleteConfig { module: String, cluster: String },
    StoreStatistic { module: String, cluster: String, snapshot: serde_json::Value },
    GetJobs { filter: JobFilter },
    CreateJob { job: Job },
    DeleteJobs { filter: JobFilter },
}

#[derive(Debug)]
pub enum StorageResponse {
    Config(Config),
    Jobs(Vec<Job>),
    Deleted(usize),
    Done,
}

pub type StorageReply = Result<StorageResponse, OrchestratorError>;

pub struct StorageActor {
    store: Arc<MemoryStore>,
}

impl StorageActor {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Message loop. Runs until every caller handle is dropped.
    pub async fn run(self, mut inbox: Inbox<StorageRequest, StorageReply>) {
        tracing::info!("Storage actor started");

        while let Some((token, request, responder)) = inbox.recv().await {
            responder.complete(token, self.handle(request));
        }

        tracing::info!("Storage actor inbound queue closed, stopping");
    }

    fn handle(&self, request: StorageRequest) -> StorageReply {
        match request {
            StorageRequest::GetConfig { module, cluster } => self
                .store
                .get_config(&module, &cluster)
                .map(StorageResponse::Config)
                .ok_or(OrchestratorError::NotFound),
            StorageRequest::StoreConfig { module, cluster, config } => {
                self.store.store_config(&module, &cluster, config)?;
                Ok(StorageResponse::Done)
            }
            StorageRequest::ReplaceConfig { module, cluster, config } => {
                self.store.replace_config(&module, &cluster, config)?;
                Ok(StorageResponse::Done)
            }
            StorageRequest::DeleteConfig { module, cluster } => {
                self.store.delete_config(&module, &cluster)?;
                Ok(StorageResponse::Done)
            }
            StorageRequest::StoreStatistic { module, cluster, snapshot } => {
                self.store.store_statistic(&module, &cluster, snapshot);
                Ok(StorageResponse::Done)
            }
            StorageRequest::GetJobs { filter } => {
                Ok(StorageResponse::Jobs(self.store.get_jobs(&filter)))
            }
            StorageRequest::CreateJob { job } => {
                self.store.create_job(job)?;
                Ok(StorageResponse::Done)
            }
            StorageRequest::DeleteJobs { filter } => {
                let deleted = self.store.delete_jobs(&filter)?;
                Ok(StorageResponse::Deleted(deleted))
            }
        }
    }
}
