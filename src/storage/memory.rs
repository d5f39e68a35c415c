//! In-memory persistence adapter.
//!
//! Holds configuration snapshots keyed by (module, cluster), the statistics
//! archive appended on supervisor completion, and the scheduler's job
//! definitions. The on-disk/Mongo adapters of a production deployment sit
//! behind the same operations.

use crate::error::OrchestratorError;
use crate::scheduler::types::{Job, JobFilter};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration snapshot used to launch a cluster instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    #[serde(default)]
    pub content: serde_json::Value,
}

pub struct MemoryStore {
    configs: DashMap<(String, String), Config>,
    statistics: DashMap<(String, String), Vec<serde_json::Value>>,
    jobs: DashMap<String, Job>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            configs: DashMap::new(),
            statistics: DashMap::new(),
            jobs: DashMap::new(),
        })
    }

    pub fn get_config(&self, module: &str, cluster: &str) -> Option<Config> {
        self.configs
            .get(&(module.to_string(), cluster.to_string()))
            .map(|entry| entry.clone())
    }

    /// Stores a new config; refuses to overwrite (that is `replace_config`).
    pub fn store_config(
        &self,
        module: &str,
        cluster: &str,
        config: Config,
    ) -> Result<(), OrchestratorError> {
        let key = (module.to_string(), cluster.to_string());
        if self.configs.contains_key(&key) {
            return Err(OrchestratorError::StorageFailed(format!(
                "config for {}/{} already exists",
                module, cluster
            )));
        }
        self.configs.insert(key, config);
        tracing::debug!("Stored config for {}/{}", module, cluster);
        Ok(())
    }

    pub fn replace_config(
        &self,
        module: &str,
        cluster: &str,
        config: Config,
    ) -> Result<(), OrchestratorError> {
        let key = (module.to_string(), cluster.to_string());
        if !self.configs.contains_key(&key) {
            return Err(OrchestratorError::NotFound);
        }
        self.configs.insert(key, config);
        tracing::debug!("Replaced config for {}/{}", module, cluster);
        Ok(())
    }

    pub fn delete_config(&self, module: &str, cluster: &str) -> Result<(), OrchestratorError> {
        self.configs
            .remove(&(module.to_string(), cluster.to_string()))
            .map(|_| ())
            .ok_or(OrchestratorError::NotFound)
    }

    /// Archives one final statistics snapshot for a finished supervisor.
    pub fn store_statistic(&self, module: &str, cluster: &str, snapshot: serde_json::Value) {
        self.statistics
            .entry((module.to_string(), cluster.to_string()))
            .or_default()
            .push(snapshot);
        tracing::debug!("Archived statistics snapshot for {}/{}", module, cluster);
    }

    pub fn statistics(&self, module: &str, cluster: &str) -> Vec<serde_json::Value> {
        self.statistics
            .get(&(module.to_string(), cluster.to_string()))
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    pub fn get_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .jobs
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        jobs
    }

    pub fn create_job(&self, job: Job) -> Result<(), OrchestratorError> {
        if self.jobs.contains_key(&job.id) {
            return Err(OrchestratorError::StorageFailed(format!(
                "job {} already stored",
                job.id
            )));
        }
        tracing::info!("Stored job {} ({}/{})", job.id, job.module, job.cluster);
        self.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    /// Deletes every job the filter selects; `NotFound` when nothing matches.
    pub fn delete_jobs(&self, filter: &JobFilter) -> Result<usize, OrchestratorError> {
        let matching: Vec<String> = self
            .jobs
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.key().clone())
            .collect();

        if matching.is_empty() {
            return Err(OrchestratorError::NotFound);
        }

        for id in &matching {
            self.jobs.remove(id);
        }
        tracing::info!("Deleted {} job(s)", matching.len());
        Ok(matching.len())
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}
