//! Request scheduler: id assignment, pacing, timeout watchdogs, and the two
//! caller-facing completion styles.
//!
//! Ids are allocated synchronously at submit time, before the pacing sleep,
//! so ordering and uniqueness hold even when dispatch is delayed. The pacing
//! delay exists to keep bursts from overrunning the transport's outbound
//! queue; it delays the send, never the id.
//!
//! Both calling conventions, deferred (`submit` then await) and callback
//! (`submit_with`), sit on one internal oneshot completion sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};

use crate::bridge::protocol::{Command, ReplyBody, RequestId, RequestVerb};
use crate::connection::ConnectionTracker;
use crate::correlation::{CorrelationTable, ReplyResult, Waiter};
use crate::error::BridgeError;

pub(crate) struct RequestScheduler {
    next_id: AtomicU64,
    table: Arc<CorrelationTable>,
    tracker: Arc<ConnectionTracker>,
    outbound: mpsc::Sender<Command>,
    pacing_delay: Duration,
    request_timeout: Duration,
}

impl RequestScheduler {
    pub fn new(
        table: Arc<CorrelationTable>,
        tracker: Arc<ConnectionTracker>,
        outbound: mpsc::Sender<Command>,
        pacing_delay: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            table,
            tracker,
            outbound,
            pacing_delay,
            request_timeout,
        }
    }

    /// Deferred style: allocate the next id, gate on connection state, and
    /// hand back a pending handle that resolves exactly once.
    ///
    /// On a gate failure the handle fails immediately: no watchdog is
    /// armed and nothing is sent. Otherwise a dispatch task sleeps the
    /// pacing delay, arms the watchdog, registers the waiter, then hands
    /// the command to the transport.
    pub fn submit(&self, verb: RequestVerb, args: &[&str]) -> PendingRequest {
        let id = RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed));

        if let Err(e) = self.tracker.gate() {
            tracing::debug!(%id, verb = %verb, error = %e, "request gated");
            return PendingRequest::failed(id, e);
        }

        let (tx, rx) = oneshot::channel();
        let command = Command::new(id, verb, args.iter().map(|s| s.to_string()).collect());

        let table = Arc::clone(&self.table);
        let outbound = self.outbound.clone();
        let pacing_delay = self.pacing_delay;
        let request_timeout = self.request_timeout;

        tokio::spawn(async move {
            tokio::time::sleep(pacing_delay).await;

            let watchdog = {
                let table = Arc::clone(&table);
                tokio::spawn(async move {
                    tokio::time::sleep(request_timeout).await;
                    table.cancel_on_timeout(id);
                })
            };
            table.register(id, Waiter::new(tx, watchdog));

            tracing::trace!(%id, verb = %command.verb, "dispatching request");
            if outbound.send(command).await.is_err() {
                // Transport writer is gone; the bridge was closed between
                // submit and dispatch.
                table.fail(id, BridgeError::Closed);
            }
        });

        PendingRequest::armed(id, rx)
    }

    /// Callback style: same path as `submit`, with the completion delivered
    /// to `callback` from a spawned task.
    pub fn submit_with<F>(&self, verb: RequestVerb, args: &[&str], callback: F) -> RequestId
    where
        F: FnOnce(Result<ReplyBody, BridgeError>) + Send + 'static,
    {
        let pending = self.submit(verb, args);
        let id = pending.id();
        tokio::spawn(async move {
            callback(pending.wait().await);
        });
        id
    }
}

/// Handle to a submitted request.
///
/// Resolves exactly once: success, protocol failure, connection-gate
/// failure, timeout, or closed. Await it directly or call
/// [`PendingRequest::wait`]; the id is available before the reply.
pub struct PendingRequest {
    id: RequestId,
    rx: Option<oneshot::Receiver<ReplyResult>>,
    gate_error: Option<BridgeError>,
}

impl PendingRequest {
    fn armed(id: RequestId, rx: oneshot::Receiver<ReplyResult>) -> Self {
        Self {
            id,
            rx: Some(rx),
            gate_error: None,
        }
    }

    fn failed(id: RequestId, err: BridgeError) -> Self {
        Self {
            id,
            rx: None,
            gate_error: Some(err),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub async fn wait(mut self) -> Result<ReplyBody, BridgeError> {
        if let Some(err) = self.gate_error.take() {
            return Err(err);
        }
        match self.rx.take() {
            // A dropped sender means the bridge was torn down mid-flight.
            Some(rx) => rx.await.map_err(|_| BridgeError::Closed)?,
            None => Err(BridgeError::Closed),
        }
    }
}

impl std::future::IntoFuture for PendingRequest {
    type Output = Result<ReplyBody, BridgeError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        self.wait().boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::protocol::Reply;
    use crate::connection::ChannelKind;

    struct Harness {
        scheduler: RequestScheduler,
        table: Arc<CorrelationTable>,
        tracker: Arc<ConnectionTracker>,
        outbound_rx: mpsc::Receiver<Command>,
    }

    fn harness(pacing: Duration, timeout: Duration) -> Harness {
        let table = Arc::new(CorrelationTable::new());
        let tracker = Arc::new(ConnectionTracker::new());
        let (tx, rx) = mpsc::channel(16);
        let scheduler = RequestScheduler::new(
            Arc::clone(&table),
            Arc::clone(&tracker),
            tx,
            pacing,
            timeout,
        );
        Harness {
            scheduler,
            table,
            tracker,
            outbound_rx: rx,
        }
    }

    fn both_up(tracker: &ConnectionTracker) {
        tracker.set(ChannelKind::Command, true);
        tracker.set(ChannelKind::Event, true);
    }

    #[tokio::test]
    async fn ids_are_monotonic_even_when_gated() {
        let h = harness(Duration::from_millis(1), Duration::from_secs(5));
        // Both legs down: every submit fails, yet ids keep increasing.
        let ids: Vec<u64> = (0..4)
            .map(|_| h.scheduler.submit(RequestVerb::Ping, &[]).id().as_u64())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn gate_failure_resolves_immediately_and_sends_nothing() {
        let mut h = harness(Duration::from_millis(1), Duration::from_secs(5));
        let pending = h.scheduler.submit(RequestVerb::Ping, &[]);
        let id = pending.id();
        assert_eq!(
            pending.wait().await,
            Err(BridgeError::ChannelDown(ChannelKind::Command))
        );
        assert!(!h.table.is_pending(id));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(h.outbound_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dispatch_registers_waiter_then_sends_frame() {
        let mut h = harness(Duration::from_millis(1), Duration::from_secs(5));
        both_up(&h.tracker);

        let pending = h.scheduler.submit(RequestVerb::Rates, &["USDJPY"]);
        let id = pending.id();

        let command = h.outbound_rx.recv().await.unwrap();
        assert_eq!(command.id, id);
        assert_eq!(command.verb, RequestVerb::Rates);
        assert_eq!(command.args, vec!["USDJPY".to_string()]);
        assert!(h.table.is_pending(id));

        h.table
            .resolve_reply(&Reply::ok(id.to_string(), ReplyBody::Values(vec!["1".into()])));
        assert_eq!(
            pending.wait().await,
            Ok(ReplyBody::Values(vec!["1".into()]))
        );
    }

    #[tokio::test]
    async fn unanswered_request_times_out_and_leaves_the_table() {
        let mut h = harness(Duration::from_millis(1), Duration::from_millis(50));
        both_up(&h.tracker);

        let pending = h.scheduler.submit(RequestVerb::Account, &[]);
        let id = pending.id();
        let _ = h.outbound_rx.recv().await.unwrap();

        assert_eq!(pending.wait().await, Err(BridgeError::Timeout));
        assert!(!h.table.is_pending(id));
    }

    #[tokio::test]
    async fn callback_style_delivers_the_same_completion() {
        let mut h = harness(Duration::from_millis(1), Duration::from_secs(5));
        both_up(&h.tracker);

        let (done_tx, done_rx) = oneshot::channel();
        let id = h.scheduler.submit_with(RequestVerb::Ping, &[], move |result| {
            let _ = done_tx.send(result);
        });
        assert_eq!(id.as_u64(), 1);

        let command = h.outbound_rx.recv().await.unwrap();
        h.table
            .resolve_reply(&Reply::ok(command.id.to_string(), ReplyBody::Empty));

        assert_eq!(done_rx.await.unwrap(), Ok(ReplyBody::Empty));
    }

    #[tokio::test]
    async fn pending_request_awaits_directly() {
        let mut h = harness(Duration::from_millis(1), Duration::from_secs(5));
        both_up(&h.tracker);

        let pending = h.scheduler.submit(RequestVerb::Ping, &[]);
        let table = Arc::clone(&h.table);
        let command = h.outbound_rx.recv().await.unwrap();
        table.resolve_reply(&Reply::ok(command.id.to_string(), ReplyBody::Empty));

        // IntoFuture: `.await` the handle itself.
        assert_eq!(pending.await, Ok(ReplyBody::Empty));
    }

    #[tokio::test]
    async fn closed_outbound_fails_the_waiter() {
        let h = harness(Duration::from_millis(1), Duration::from_secs(5));
        both_up(&h.tracker);

        drop(h.outbound_rx);
        let pending = h.scheduler.submit(RequestVerb::Ping, &[]);
        assert_eq!(pending.wait().await, Err(BridgeError::Closed));
    }
}
