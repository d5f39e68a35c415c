//! The shared capability table.
//!
//! One structure holds every processor, module and cluster record. Mutations
//! (registration, deregistration, mount flips, owner selection) take the write
//! lock; reporting reads take the read lock and return copies. Cascades that
//! touch multiple modules run under a single write guard, so readers never
//! observe a half-cleaned table.

use super::protocol::{ClusterInfo, ModuleInfo, ProcessorInfo};
use super::types::{
    Cluster, ClusterMode, Module, ModuleConfig, Processor, ProcessorAddr, now_ms,
};
use crate::error::OrchestratorError;

use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct TableInner {
    processors: HashMap<ProcessorAddr, Processor>,
    modules: HashMap<String, Module>,
}

/// The capability table. Constructed once by the orchestrator process and
/// injected wherever it is needed; tests build isolated instances.
#[derive(Default)]
pub struct ProcessorTable {
    inner: RwLock<TableInner>,
}

impl ProcessorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new processor under its (host, port) identity.
    pub async fn add_processor(&self, host: &str, port: u16) -> Result<(), OrchestratorError> {
        let mut inner = self.inner.write().await;
        let addr = ProcessorAddr::new(host, port);

        if inner.processors.contains_key(&addr) {
            return Err(OrchestratorError::AlreadyExists {
                host: host.to_string(),
                port,
            });
        }

        tracing::info!("Processor {} registered", addr);
        inner.processors.insert(addr.clone(), Processor::new(addr));
        Ok(())
    }

    /// Deregisters a processor and cascades: the processor leaves every
    /// cluster's owner list, ownerless clusters are deleted, and clusterless
    /// modules follow.
    pub async fn remove_processor(&self, host: &str, port: u16) -> Result<(), OrchestratorError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let addr = ProcessorAddr::new(host, port);

        if inner.processors.remove(&addr).is_none() {
            return Err(OrchestratorError::DoesNotExist {
                host: host.to_string(),
                port,
            });
        }

        inner.modules.retain(|_, module| {
            module.clusters.retain(|_, cluster| {
                drop_owner(cluster, &addr);
                !cluster.owners.is_empty()
            });
            !module.clusters.is_empty()
        });

        tracing::info!("Processor {} removed, ownerless records cleaned up", addr);
        Ok(())
    }

    /// Registers one module advertisement from a processor.
    ///
    /// The module record is created on first advertisement and mounted by
    /// default; later advertisements must match its version and contact
    /// exactly. Exported clusters either gain the caller as a further owner
    /// or are created with the caller as their first.
    pub async fn add_module(
        &self,
        addr: &ProcessorAddr,
        config: ModuleConfig,
    ) -> Result<(), OrchestratorError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let processor =
            inner
                .processors
                .get_mut(addr)
                .ok_or_else(|| OrchestratorError::DoesNotExist {
                    host: addr.host.clone(),
                    port: addr.port,
                })?;

        if processor.modules.iter().any(|name| name == &config.name) {
            return Err(OrchestratorError::ModuleAlreadyRegistered(config.name));
        }

        if let Some(module) = inner.modules.get(&config.name) {
            if module.version != config.version {
                return Err(OrchestratorError::ModuleVersionClash {
                    module: config.name,
                    existing: module.version.clone(),
                    offered: config.version,
                });
            }
            if module.contact != config.contact {
                return Err(OrchestratorError::ModuleContactClash {
                    module: config.name,
                    existing: module.contact.clone(),
                    offered: config.contact,
                });
            }
        }

        let module = inner
            .modules
            .entry(config.name.clone())
            .or_insert_with(|| Module::new(&config));

        for export in &config.clusters {
            match module.clusters.get_mut(&export.name) {
                Some(cluster) => {
                    cluster.owners.push(addr.clone());
                }
                None => {
                    module
                        .clusters
                        .insert(export.name.clone(), Cluster::new(export, addr.clone()));
                }
            }
        }

        processor.modules.push(config.name.clone());
        processor.last_seen = now_ms();

        tracing::info!(
            "Processor {} registered module {} with {} cluster(s)",
            addr,
            config.name,
            config.clusters.len()
        );
        Ok(())
    }

    /// Withdraws one module advertisement from a processor, cascading exactly
    /// as processor removal does within that module.
    pub async fn remove_module(
        &self,
        addr: &ProcessorAddr,
        module_name: &str,
    ) -> Result<(), OrchestratorError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let processor =
            inner
                .processors
                .get_mut(addr)
                .ok_or_else(|| OrchestratorError::DoesNotExist {
                    host: addr.host.clone(),
                    port: addr.port,
                })?;

        let module_emptied = {
            let module = inner
                .modules
                .get_mut(module_name)
                .ok_or_else(|| OrchestratorError::ModuleDoesNotExist(module_name.to_string()))?;

            module.clusters.retain(|_, cluster| {
                drop_owner(cluster, addr);
                !cluster.owners.is_empty()
            });
            module.clusters.is_empty()
        };

        if module_emptied {
            inner.modules.remove(module_name);
            tracing::info!("Module {} removed with its last cluster", module_name);
        }

        processor.modules.retain(|name| name != module_name);
        processor.last_seen = now_ms();

        tracing::info!("Processor {} withdrew module {}", addr, module_name);
        Ok(())
    }

    pub async fn mount_module(&self, module: &str) -> Result<(), OrchestratorError> {
        self.set_module_mount(module, true).await
    }

    pub async fn unmount_module(&self, module: &str) -> Result<(), OrchestratorError> {
        self.set_module_mount(module, false).await
    }

    pub async fn mount_cluster(&self, module: &str, cluster: &str) -> Result<(), OrchestratorError> {
        self.set_cluster_mount(module, cluster, true).await
    }

    pub async fn unmount_cluster(
        &self,
        module: &str,
        cluster: &str,
    ) -> Result<(), OrchestratorError> {
        self.set_cluster_mount(module, cluster, false).await
    }

    async fn set_module_mount(&self, name: &str, mounted: bool) -> Result<(), OrchestratorError> {
        let mut inner = self.inner.write().await;
        let module = inner
            .modules
            .get_mut(name)
            .ok_or_else(|| OrchestratorError::ModuleDoesNotExist(name.to_string()))?;
        module.mounted = mounted;
        tracing::info!("Module {} mounted={}", name, mounted);
        Ok(())
    }

    async fn set_cluster_mount(
        &self,
        module_name: &str,
        cluster_name: &str,
        mounted: bool,
    ) -> Result<(), OrchestratorError> {
        let mut inner = self.inner.write().await;
        let module = inner
            .modules
            .get_mut(module_name)
            .ok_or_else(|| OrchestratorError::ModuleDoesNotExist(module_name.to_string()))?;
        let cluster = module.clusters.get_mut(cluster_name).ok_or_else(|| {
            OrchestratorError::ClusterDoesNotExist {
                module: module_name.to_string(),
                cluster: cluster_name.to_string(),
            }
        })?;
        cluster.mounted = mounted;
        tracing::info!("Cluster {}/{} mounted={}", module_name, cluster_name, mounted);
        Ok(())
    }

    /// Checks everything `create supervisor` requires before any record is
    /// allocated: the pair exists, both mount flags are set, and the cluster
    /// is not stream-mode.
    pub async fn ensure_provisionable(
        &self,
        module_name: &str,
        cluster_name: &str,
    ) -> Result<(), OrchestratorError> {
        let inner = self.inner.read().await;

        let module = inner
            .modules
            .get(module_name)
            .ok_or_else(|| OrchestratorError::ModuleDoesNotExist(module_name.to_string()))?;
        let cluster = module.clusters.get(cluster_name).ok_or_else(|| {
            OrchestratorError::ClusterDoesNotExist {
                module: module_name.to_string(),
                cluster: cluster_name.to_string(),
            }
        })?;

        if !module.mounted {
            return Err(OrchestratorError::ModuleNotMounted(module_name.to_string()));
        }
        if !cluster.mounted {
            return Err(OrchestratorError::ClusterNotMounted {
                module: module_name.to_string(),
                cluster: cluster_name.to_string(),
            });
        }
        if cluster.mode == ClusterMode::Stream {
            return Err(OrchestratorError::CanNotProvisionStreamCluster {
                module: module_name.to_string(),
                cluster: cluster_name.to_string(),
            });
        }

        Ok(())
    }

    /// Round-robin selection of the next owner for a cluster. N consecutive
    /// calls visit each of N owners exactly once, in registration order.
    pub async fn select_processor(
        &self,
        module_name: &str,
        cluster_name: &str,
    ) -> Result<ProcessorAddr, OrchestratorError> {
        let mut inner = self.inner.write().await;

        let module = inner
            .modules
            .get_mut(module_name)
            .ok_or_else(|| OrchestratorError::ModuleDoesNotExist(module_name.to_string()))?;
        let cluster = module.clusters.get_mut(cluster_name).ok_or_else(|| {
            OrchestratorError::ClusterDoesNotExist {
                module: module_name.to_string(),
                cluster: cluster_name.to_string(),
            }
        })?;
        if cluster.owners.is_empty() {
            return Err(OrchestratorError::ClusterDoesNotExist {
                module: module_name.to_string(),
                cluster: cluster_name.to_string(),
            });
        }

        let picked = cluster.owners[cluster.cursor % cluster.owners.len()].clone();
        cluster.cursor = (cluster.cursor + 1) % cluster.owners.len();

        tracing::debug!(
            "Selected {} for {}/{} (cursor now {})",
            picked,
            module_name,
            cluster_name,
            cluster.cursor
        );
        Ok(picked)
    }

    /// Snapshot copy of every registered module, for reporting.
    pub async fn registered_modules(&self) -> Vec<ModuleInfo> {
        let inner = self.inner.read().await;
        let mut modules: Vec<ModuleInfo> = inner.modules.values().map(ModuleInfo::from).collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        modules
    }

    /// Snapshot copy of one module's clusters.
    pub async fn get_clusters(
        &self,
        module_name: &str,
    ) -> Result<Vec<ClusterInfo>, OrchestratorError> {
        let inner = self.inner.read().await;
        let module = inner
            .modules
            .get(module_name)
            .ok_or_else(|| OrchestratorError::ModuleDoesNotExist(module_name.to_string()))?;

        let mut clusters: Vec<ClusterInfo> = module.clusters.values().map(ClusterInfo::from).collect();
        clusters.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clusters)
    }

    /// Snapshot copy of every connected processor.
    pub async fn processors(&self) -> Vec<ProcessorInfo> {
        let inner = self.inner.read().await;
        let mut processors: Vec<ProcessorInfo> =
            inner.processors.values().map(ProcessorInfo::from).collect();
        processors.sort_by(|a, b| (&a.host, a.port).cmp(&(&b.host, b.port)));
        processors
    }

    pub async fn processor_count(&self) -> usize {
        self.inner.read().await.processors.len()
    }

    pub async fn module_count(&self) -> usize {
        self.inner.read().await.modules.len()
    }
}

/// Removes one owner from a cluster, keeping the round-robin cursor inside
/// the shrunk list.
fn drop_owner(cluster: &mut Cluster, addr: &ProcessorAddr) {
    cluster.owners.retain(|owner| owner != addr);
    if cluster.cursor >= cluster.owners.len() {
        cluster.cursor = 0;
    }
}
