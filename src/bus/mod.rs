//! Correlation Bus
//!
//! Request/response matching over asynchronous channels. Every other component
//! talks through this module: a caller sends a request onto an actor's inbound
//! queue, receives a correlation token, and blocks on that token alone until
//! the actor records a response or the timeout elapses.
//!
//! The bus carries no business logic. Its correctness guarantees are what the
//! rest of the system leans on:
//! - one correlation token per outstanding call, never shared,
//! - a timeout always resolves the waiter (with `NoResponseReceived`),
//! - a response arriving after the waiter gave up is silently discarded,
//! - concurrent unrelated calls never block each other.

pub mod correlation;

pub use correlation::{CorrelationBus, Envelope, Inbox, PendingReply, Responder, Token, channel};

#[cfg(test)]
mod tests;
