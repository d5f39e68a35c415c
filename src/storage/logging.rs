//! Logging/notification collaborator.
//!
//! Each supervisor accumulates an append-only log while it runs; when it
//! reaches a terminal state the registry closes the log, which in a full
//! deployment triggers persistence and the optional email fan-out. The core
//! only depends on the `SupervisorLog` interface.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Narrow interface to the logging subsystem.
pub trait SupervisorLog: Send + Sync {
    /// Appends one line to the supervisor's accumulated log.
    fn append(&self, module: &str, cluster: &str, supervisor_id: u64, level: LogLevel, message: &str);

    /// Seals the supervisor's log; called once on its terminal transition.
    fn close(&self, module: &str, cluster: &str, supervisor_id: u64);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub at: u64,
}

#[derive(Default)]
struct LogBuffer {
    entries: Vec<LogEntry>,
    closed: bool,
}

/// In-memory log buffer, one per supervisor id.
#[derive(Default)]
pub struct MemoryLog {
    buffers: DashMap<u64, LogBuffer>,
}

impl MemoryLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self, supervisor_id: u64) -> Vec<LogEntry> {
        self.buffers
            .get(&supervisor_id)
            .map(|buffer| buffer.entries.clone())
            .unwrap_or_default()
    }

    pub fn is_closed(&self, supervisor_id: u64) -> bool {
        self.buffers
            .get(&supervisor_id)
            .map(|buffer| buffer.closed)
            .unwrap_or(false)
    }
}

impl SupervisorLog for MemoryLog {
    fn append(&self, module: &str, cluster: &str, supervisor_id: u64, level: LogLevel, message: &str) {
        let mut buffer = self.buffers.entry(supervisor_id).or_default();
        if buffer.closed {
            tracing::trace!(
                "Dropping log line for closed supervisor {} of {}/{}",
                supervisor_id,
                module,
                cluster
            );
            return;
        }

        buffer.entries.push(LogEntry {
            level,
            message: message.to_string(),
            at: crate::registry::types::now_ms(),
        });
        tracing::debug!(
            "Supervisor {} [{}/{}] {}: {}",
            supervisor_id,
            module,
            cluster,
            level,
            message
        );
    }

    fn close(&self, module: &str, cluster: &str, supervisor_id: u64) {
        let mut buffer = self.buffers.entry(supervisor_id).or_default();
        buffer.closed = true;
        tracing::info!(
            "Closed log for supervisor {} of {}/{} ({} entries)",
            supervisor_id,
            module,
            cluster,
            buffer.entries.len()
        );
    }
}
