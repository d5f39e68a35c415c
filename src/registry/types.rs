use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identity of a remote execution node. Unique within the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProcessorAddr {
    pub host: String,
    pub port: u16,
}

impl ProcessorAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ProcessorAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One remote execution node: where it lives, whether it is currently
/// connected, and which modules it advertises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Processor {
    pub addr: ProcessorAddr,
    pub connected: bool,
    /// Timestamp (ms) of the last registration activity from this node.
    pub last_seen: u64,
    pub modules: Vec<String>,
}

impl Processor {
    pub fn new(addr: ProcessorAddr) -> Self {
        Self {
            addr,
            connected: true,
            last_seen: now_ms(),
            modules: Vec::new(),
        }
    }
}

/// Execution mode of a cluster. Batch clusters are provisioned on demand;
/// stream clusters run continuously and are deployed out of band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClusterMode {
    Batch,
    Stream,
}

/// Registration payload a processor sends for one module it can run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    pub version: String,
    pub contact: String,
    pub clusters: Vec<ClusterExport>,
}

/// One cluster exported by a module registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterExport {
    pub name: String,
    pub mode: ClusterMode,
    /// Mount the cluster immediately on creation instead of waiting for an
    /// operator to mount it.
    #[serde(default)]
    pub static_mount: bool,
}

/// One schedulable unit of work inside a module.
///
/// Exists only while at least one processor advertises it; the owner list is
/// kept in registration order because `select_processor` walks it round-robin.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub name: String,
    pub mounted: bool,
    pub mode: ClusterMode,
    pub owners: Vec<ProcessorAddr>,
    /// Round-robin position of the next owner to hand out.
    pub cursor: usize,
}

impl Cluster {
    pub fn new(export: &ClusterExport, first_owner: ProcessorAddr) -> Self {
        Self {
            name: export.name.clone(),
            mounted: export.static_mount,
            mode: export.mode,
            owners: vec![first_owner],
            cursor: 0,
        }
    }
}

/// A named deployable unit of work. Created lazily the first time any
/// processor advertises it; one version/contact per name at a time.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub version: String,
    pub contact: String,
    pub mounted: bool,
    pub clusters: HashMap<String, Cluster>,
}

impl Module {
    /// A freshly created module is mounted by default; clusters mount only on
    /// request via `static_mount`.
    pub fn new(config: &ModuleConfig) -> Self {
        Self {
            name: config.name.clone(),
            version: config.version.clone(),
            contact: config.contact.clone(),
            mounted: true,
            clusters: HashMap::new(),
        }
    }
}

/// Current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
