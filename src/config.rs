//! Operator-configured timing and capacity knobs.
//!
//! Every cross-component call carries a timeout; a timeout always resolves to
//! a local failure for the caller and is never retried automatically.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Timeouts {
    /// How long a caller waits on a correlation token before the call fails
    /// with `NoResponseReceived`.
    pub bus_call: Duration,
    /// Request timeout for the provisioning POST to a remote processor. This
    /// is the only bound on how long a supervisor create can take.
    pub provision: Duration,
    /// Cadence of the scheduler's eligibility pass (one wall-clock minute in
    /// production, shortened in tests).
    pub tick: Duration,
    /// Depth of each actor's inbound message queue.
    pub queue_capacity: usize,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            bus_call: Duration::from_secs(5),
            provision: Duration::from_secs(10),
            tick: Duration::from_secs(60),
            queue_capacity: 64,
        }
    }
}
