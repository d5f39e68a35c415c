//! Processor Capability Registry
//!
//! Tracks the remote execution nodes ("processors") connected to the control
//! plane and the work they advertise: modules, each holding a set of named
//! clusters, each owned by the processors able to run it.
//!
//! ## Responsibilities
//! - **Registration**: processors join by (host, port) identity; modules are
//!   created lazily on first advertisement and must keep one version/contact
//!   per name.
//! - **Cascading removal**: deregistering a processor drops it from every
//!   cluster's owner list; clusters left ownerless are deleted, and modules
//!   left clusterless follow.
//! - **Load balancing**: `select_processor` hands out cluster owners
//!   round-robin, in registration order.
//! - **Mount gating**: modules and clusters carry an administrative mount
//!   flag that must be set before anything is provisioned.
//!
//! ## Submodules
//! - **`types`**: processor, module and cluster records.
//! - **`table`**: the shared capability table and all its operations.
//! - **`protocol`**: boundary DTOs and snapshot views for reporting.
//! - **`handlers`**: the HTTP entry points, thin wrappers over bus calls.

pub mod handlers;
pub mod protocol;
pub mod table;
pub mod types;

#[cfg(test)]
mod tests;
