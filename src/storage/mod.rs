//! Persistence and Logging Collaborators
//!
//! The control plane core treats persistence and notification as external
//! systems reached through narrow interfaces. This module provides those
//! interfaces and the in-memory adapters behind them:
//!
//! - **`memory`**: configuration snapshots, statistics archives and job
//!   definitions in an in-memory store.
//! - **`actor`**: the storage actor serving the store over the Correlation
//!   Bus, so every caller gets the same timeout discipline as internal calls.
//! - **`logging`**: the per-supervisor log buffer collaborator
//!   (`SupervisorLog`), whose `close` seals a finished supervisor's log.
//! - **`handlers`**: boundary entry points for seeding and editing configs.

pub mod actor;
pub mod handlers;
pub mod logging;
pub mod memory;
pub mod protocol;

pub use actor::{StorageActor, StorageReply, StorageRequest, StorageResponse};
pub use logging::{LogLevel, MemoryLog, SupervisorLog};
pub use memory::{Config, MemoryStore};
