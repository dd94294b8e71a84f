//! Correlation table: request id to single-shot waiter.
//!
//! An explicit mapping with removal, not a broadcast bus, so the
//! at-most-once guarantee stays auditable: whoever removes the entry
//! (reply dispatch, timeout watchdog, or close) is the one completion that
//! fires. DashMap's atomic `remove` is the serialization point; first
//! remover wins.

use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::bridge::protocol::{Reply, ReplyBody, RequestId};
use crate::error::BridgeError;

pub(crate) type ReplyResult = Result<ReplyBody, BridgeError>;

/// The registered, single-shot completion for one outstanding request.
pub(crate) struct Waiter {
    tx: oneshot::Sender<ReplyResult>,
    watchdog: JoinHandle<()>,
}

impl Waiter {
    pub fn new(tx: oneshot::Sender<ReplyResult>, watchdog: JoinHandle<()>) -> Self {
        Self { tx, watchdog }
    }
}

pub(crate) struct CorrelationTable {
    entries: DashMap<RequestId, Waiter>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Record the waiter for an id. Registering a second waiter for an id
    /// already pending is a programmer error; ids come from a private
    /// monotonic counter, so this cannot happen through the public API.
    pub fn register(&self, id: RequestId, waiter: Waiter) {
        let previous = self.entries.insert(id, waiter);
        if previous.is_some() {
            tracing::error!(%id, "duplicate waiter registered, dropping the earlier one");
            debug_assert!(false, "duplicate waiter for request id {id}");
        }
    }

    /// Route a decoded inbound frame to its waiter, if one is still pending.
    ///
    /// A frame for an unknown id is a silent no-op: it may be the
    /// legitimately-late reply of an already-timed-out request.
    pub fn resolve_reply(&self, reply: &Reply) {
        let Some(id) = RequestId::parse(&reply.id) else {
            tracing::warn!(id = %reply.id, "inbound frame id is not numeric, dropping");
            return;
        };
        let result = match &reply.result {
            Ok(body) => Ok(body.clone()),
            Err(code) => Err(BridgeError::protocol(*code)),
        };
        self.complete(id, result);
    }

    /// Timeout watchdog path: remove-then-complete with a timeout error.
    /// No-op when the reply already won the race.
    pub fn cancel_on_timeout(&self, id: RequestId) {
        // The watchdog is the caller here, so there is no handle to abort.
        if let Some((_, waiter)) = self.entries.remove(&id) {
            tracing::debug!(%id, "request timed out");
            let _ = waiter.tx.send(Err(BridgeError::Timeout));
        }
    }

    /// Fail one pending waiter, e.g. when the transport writer disappears
    /// between registration and send.
    pub fn fail(&self, id: RequestId, err: BridgeError) {
        self.complete(id, Err(err));
    }

    /// Fail every pending waiter. Used when the bridge is torn down with
    /// requests still in flight.
    pub fn fail_all(&self, err: BridgeError) {
        let ids: Vec<RequestId> = self.entries.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            self.complete(id, Err(err.clone()));
        }
    }

    pub fn is_pending(&self, id: RequestId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    fn complete(&self, id: RequestId, result: ReplyResult) {
        // Remove before invoking the completion: at most one outcome per id.
        if let Some((_, waiter)) = self.entries.remove(&id) {
            waiter.watchdog.abort();
            if waiter.tx.send(result).is_err() {
                tracing::debug!(%id, "waiter dropped before completion");
            }
        }
    }
}
