//! Supervisor Registry
//!
//! One record per running job instance, tracked through its lifecycle state
//! machine:
//!
//! ```text
//! Created ──► Active ──► Completed
//!    │           │   └──► Crashed
//!    └────────► Cancelled ◄┘
//! ```
//!
//! `Terminated` is a legacy terminal state accepted from remote updates for
//! backward compatibility; the control plane never produces it. No state
//! leaves a terminal.
//!
//! ## Responsibilities
//! - **Identity**: identifiers are monotonic from 1 and never reused, even
//!   after a record is archived away.
//! - **Provisioning**: `create` stores the record and POSTs it to the owning
//!   processor; network success activates it, failure cancels it (the id is
//!   surfaced either way).
//! - **Lifecycle reports**: remote nodes push status/statistics updates;
//!   terminal transitions archive the final statistics and close the
//!   supervisor's accumulated log.
//!
//! ## Submodules
//! - **`types`**: status machine, record, filter.
//! - **`registry`**: the registry itself plus its bus-served actor loop.
//! - **`protocol`**: the provisioning wire body and boundary DTOs.
//! - **`handlers`**: HTTP entry points.

pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod types;
