//! The request/future core of the bus.
//!
//! A `CorrelationBus` is the caller-side handle bound to one actor's inbound
//! queue. `send` stamps the request with a fresh token and hands back a
//! `PendingReply` future; the actor answers through a `Responder`, which
//! writes into the shared token table. Whoever holds the `PendingReply`
//! blocks on its own token only.

use crate::error::OrchestratorError;

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Per-call correlation token. Monotonic within one bus, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(pub u64);

/// What travels on an actor's inbound queue: the request plus the token the
/// response must carry back.
#[derive(Debug)]
pub struct Envelope<Req> {
    pub token: Token,
    pub request: Req,
}

/// Creates a connected caller handle and actor inbox.
pub fn channel<Req, Res>(capacity: usize) -> (CorrelationBus<Req, Res>, Inbox<Req, Res>) {
    let (tx, rx) = mpsc::channel(capacity);
    let pending = Arc::new(DashMap::new());

    let bus = CorrelationBus {
        queue: tx,
        pending: pending.clone(),
        next_token: Arc::new(AtomicU64::new(0)),
    };
    let inbox = Inbox { queue: rx, pending };

    (bus, inbox)
}

/// Caller-side handle: pushes requests onto the target queue and tracks the
/// waiters for their responses.
pub struct CorrelationBus<Req, Res> {
    queue: mpsc::Sender<Envelope<Req>>,
    pending: Arc<DashMap<u64, oneshot::Sender<Res>>>,
    next_token: Arc<AtomicU64>,
}

impl<Req, Res> Clone for CorrelationBus<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            pending: self.pending.clone(),
            next_token: self.next_token.clone(),
        }
    }
}

impl<Req, Res> CorrelationBus<Req, Res> {
    /// Assigns the request a fresh correlation token, registers a waiter for
    /// it and pushes the envelope onto the target's inbound queue.
    ///
    /// A closed queue (the actor is gone) resolves the call immediately: no
    /// response can ever arrive, which to the caller is `NoResponseReceived`.
    pub async fn send(&self, request: Req) -> Result<PendingReply<Res>, OrchestratorError> {
        let token = Token(self.next_token.fetch_add(1, Ordering::SeqCst) + 1);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.insert(token.0, reply_tx);

        if self.queue.send(Envelope { token, request }).await.is_err() {
            self.pending.remove(&token.0);
            tracing::warn!("Bus target queue closed, call {} unanswerable", token.0);
            return Err(OrchestratorError::NoResponseReceived { waited_ms: 0 });
        }

        Ok(PendingReply {
            token,
            reply: reply_rx,
            pending: self.pending.clone(),
        })
    }

    /// Convenience for the send-then-await pattern every caller uses.
    pub async fn call(&self, request: Req, timeout: Duration) -> Result<Res, OrchestratorError> {
        self.send(request).await?.await_response(timeout).await
    }

    /// Number of calls still waiting for a response (observability only).
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }
}

/// The outstanding half of one call: the token plus the slot its response
/// will land in.
pub struct PendingReply<Res> {
    token: Token,
    reply: oneshot::Receiver<Res>,
    pending: Arc<DashMap<u64, oneshot::Sender<Res>>>,
}

impl<Res> PendingReply<Res> {
    pub fn token(&self) -> Token {
        self.token
    }

    /// Blocks the caller until a response carrying this token is recorded, or
    /// the timeout elapses.
    ///
    /// On timeout the waiter is unregistered, so the (eventually late)
    /// response is dropped by `Responder::complete` instead of leaking.
    pub async fn await_response(self, timeout: Duration) -> Result<Res, OrchestratorError> {
        match tokio::time::timeout(timeout, self.reply).await {
            Ok(Ok(response)) => Ok(response),
            // Responder dropped without answering: the actor loop is gone.
            Ok(Err(_)) => Err(OrchestratorError::NoResponseReceived { waited_ms: 0 }),
            Err(_) => {
                self.pending.remove(&self.token.0);
                tracing::debug!("Call {} timed out after {:?}", self.token.0, timeout);
                Err(OrchestratorError::NoResponseReceived {
                    waited_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}

/// Actor-side receiving end of the queue.
pub struct Inbox<Req, Res> {
    queue: mpsc::Receiver<Envelope<Req>>,
    pending: Arc<DashMap<u64, oneshot::Sender<Res>>>,
}

impl<Req, Res> Inbox<Req, Res> {
    /// Next inbound request, with the responder the handler answers through.
    /// Returns `None` once every caller handle is dropped.
    pub async fn recv(&mut self) -> Option<(Token, Req, Responder<Res>)> {
        let envelope = self.queue.recv().await?;
        Some((envelope.token, envelope.request, self.responder()))
    }

    pub fn responder(&self) -> Responder<Res> {
        Responder {
            pending: self.pending.clone(),
        }
    }
}

/// Writes responses into the token table. Cloneable, so a handler task spawned
/// per message can answer without holding the inbox.
pub struct Responder<Res> {
    pending: Arc<DashMap<u64, oneshot::Sender<Res>>>,
}

impl<Res> Clone for Responder<Res> {
    fn clone(&self) -> Self {
        Self {
            pending: self.pending.clone(),
        }
    }
}

impl<Res> Responder<Res> {
    /// Records the response for `token` and wakes its waiter.
    ///
    /// If the waiter already timed out, the token is no longer in the table
    /// and the response is discarded without touching any other call.
    pub fn complete(&self, token: Token, response: Res) {
        match self.pending.remove(&token.0) {
            Some((_, reply)) => {
                // The waiter may drop between the remove and this send; that
                // race is the same "late response" case and is ignored.
                let _ = reply.send(response);
            }
            None => {
                tracing::trace!("Discarding late response for call {}", token.0);
            }
        }
    }
}
