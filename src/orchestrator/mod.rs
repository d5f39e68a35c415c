//! Orchestrator Actor
//!
//! The mediator of the control plane. Boundary requests arrive on its inbound
//! queue; it applies capability-table logic directly and reaches the
//! supervisor registry and the storage actor through the Correlation Bus.
//!
//! Each inbound message is handled in its own task, so a handler blocking on
//! a bus round-trip (supervisor creation spans a remote provisioning call)
//! never stalls the message loop. Table mutations stay serialized by the
//! table's own write lock.
//!
//! ## Submodules
//! - **`messages`**: the request/reply enums carried on the actor's queue.
//! - **`actor`**: the message loop, the provisioning path, and the `Gateway`
//!   handle the HTTP layer calls through.

pub mod actor;
pub mod messages;

pub use actor::{Gateway, OrchestratorActor};
pub use messages::{OrchestratorReply, OrchestratorRequest, OrchestratorResponse};
