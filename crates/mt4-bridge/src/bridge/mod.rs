//! Bridge facade: composes the codec, transport legs, connection tracker,
//! correlation table, and scheduler into one handle.
//!
//! Flow:
//! 1. `Bridge::connect` validates both addresses and spawns a channel task
//!    plus a dispatch pump per leg
//! 2. `request` / `request_with` go through the scheduler (gate, pacing,
//!    watchdog, send)
//! 3. Inbound frames from either leg are decoded and routed through the
//!    correlation table; whichever leg answers first wins
//! 4. `close` fails every still-pending waiter and tears the tasks down

pub mod codec;
pub mod protocol;
pub(crate) mod transport;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::connection::{ChannelKind, ConnectProbe, ConnectionTracker};
use crate::correlation::CorrelationTable;
use crate::error::BridgeError;
use crate::scheduler::{PendingRequest, RequestScheduler};
use protocol::{Reply, ReplyBody, RequestId, RequestVerb};
use transport::{ChannelEvent, open_channel};

/// Observer for decoded inbound frames on one leg, called regardless of
/// correlation outcome.
pub type FrameHook = Box<dyn Fn(&Reply) + Send + Sync + 'static>;

type SharedHook = Arc<RwLock<Option<FrameHook>>>;

/// Tunables for one bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Fixed wait before dispatch, smoothing bursts against the transport's
    /// outbound queue. Delays the send, never the id.
    pub pacing_delay: Duration,
    /// Deadline after which an unanswered request fails with `Timeout`.
    pub request_timeout: Duration,
    /// Backoff between TCP connect attempts.
    pub reconnect_delay: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            pacing_delay: Duration::from_millis(5),
            request_timeout: Duration::from_secs(15),
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

impl BridgeConfig {
    pub fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// Handle to one connected bridge instance.
///
/// Created by [`Bridge::connect`], torn down by [`Bridge::close`] or drop.
/// Cheap operations only; all I/O runs on spawned tasks.
pub struct Bridge {
    scheduler: RequestScheduler,
    tracker: Arc<ConnectionTracker>,
    table: Arc<CorrelationTable>,
    command_hook: SharedHook,
    event_hook: SharedHook,
    tasks: Vec<JoinHandle<()>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Open both legs with default tunables.
    ///
    /// Validates the addresses synchronously (`tcp://host:port`); connection
    /// itself happens in the background; poll the flags or
    /// [`Bridge::wait_until_connected`]. Must be called within a Tokio
    /// runtime.
    pub fn connect(command_addr: &str, event_addr: &str) -> Result<Self, BridgeError> {
        Self::connect_with(command_addr, event_addr, BridgeConfig::default())
    }

    pub fn connect_with(
        command_addr: &str,
        event_addr: &str,
        config: BridgeConfig,
    ) -> Result<Self, BridgeError> {
        let command_target = validate_addr(ChannelKind::Command, command_addr)?;
        let event_target = validate_addr(ChannelKind::Event, event_addr)?;

        let tracker = Arc::new(ConnectionTracker::new());
        let table = Arc::new(CorrelationTable::new());
        let (outbound_tx, outbound_rx) = mpsc::channel(64);

        let scheduler = RequestScheduler::new(
            Arc::clone(&table),
            Arc::clone(&tracker),
            outbound_tx,
            config.pacing_delay,
            config.request_timeout,
        );

        let (command_events, command_task) = open_channel(
            ChannelKind::Command,
            command_target,
            Some(outbound_rx),
            config.reconnect_delay,
        );
        let (event_events, event_task) = open_channel(
            ChannelKind::Event,
            event_target,
            None,
            config.reconnect_delay,
        );

        let command_hook: SharedHook = Arc::new(RwLock::new(None));
        let event_hook: SharedHook = Arc::new(RwLock::new(None));

        let command_pump = tokio::spawn(run_pump(
            ChannelKind::Command,
            command_addr.to_string(),
            command_events,
            Arc::clone(&tracker),
            Arc::clone(&table),
            Arc::clone(&command_hook),
        ));
        let event_pump = tokio::spawn(run_pump(
            ChannelKind::Event,
            event_addr.to_string(),
            event_events,
            Arc::clone(&tracker),
            Arc::clone(&table),
            Arc::clone(&event_hook),
        ));

        Ok(Self {
            scheduler,
            tracker,
            table,
            command_hook,
            event_hook,
            tasks: vec![command_task, event_task, command_pump, event_pump],
            closed: AtomicBool::new(false),
        })
    }

    /// Deferred style: returns a handle that resolves exactly once. The id
    /// is assigned before this returns.
    pub fn request(&self, verb: RequestVerb, args: &[&str]) -> PendingRequest {
        self.scheduler.submit(verb, args)
    }

    /// Callback style: the completion is delivered to `callback` instead.
    pub fn request_with<F>(&self, verb: RequestVerb, args: &[&str], callback: F) -> RequestId
    where
        F: FnOnce(Result<ReplyBody, BridgeError>) + Send + 'static,
    {
        self.scheduler.submit_with(verb, args, callback)
    }

    pub fn command_connected(&self) -> bool {
        self.tracker.is_up(ChannelKind::Command)
    }

    pub fn event_connected(&self) -> bool {
        self.tracker.is_up(ChannelKind::Event)
    }

    /// Wait for both legs to come up, bounded by `timeout` per leg.
    pub async fn wait_until_connected(&self, timeout: Duration) -> Result<(), BridgeError> {
        self.tracker.wait_up(ChannelKind::Command, timeout).await?;
        self.tracker.wait_up(ChannelKind::Event, timeout).await?;
        Ok(())
    }

    /// Whether a reply for `id` is still awaited.
    pub fn is_pending(&self, id: RequestId) -> bool {
        self.table.is_pending(id)
    }

    /// Observe every decoded command-channel frame.
    pub fn on_command_frame<F>(&self, hook: F)
    where
        F: Fn(&Reply) + Send + Sync + 'static,
    {
        set_hook(&self.command_hook, Box::new(hook));
    }

    /// Observe every decoded event-channel frame, including server-pushed
    /// completions for requests this handle did not initiate.
    pub fn on_event_frame<F>(&self, hook: F)
    where
        F: Fn(&Reply) + Send + Sync + 'static,
    {
        set_hook(&self.event_hook, Box::new(hook));
    }

    /// Tear the bridge down: abort the channel tasks and pumps, fail every
    /// still-pending waiter with `Closed`, drop both flags. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("closing bridge");
        for task in &self.tasks {
            task.abort();
        }
        self.table.fail_all(BridgeError::Closed);
        self.tracker.set(ChannelKind::Command, false);
        self.tracker.set(ChannelKind::Event, false);
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.close();
    }
}

fn set_hook(slot: &SharedHook, hook: FrameHook) {
    if let Ok(mut guard) = slot.write() {
        *guard = Some(hook);
    }
}

/// Require `tcp://host:port` with a non-empty host.
fn validate_addr(which: ChannelKind, addr: &str) -> Result<String, BridgeError> {
    let parsed = Url::parse(addr)
        .map_err(|e| BridgeError::invalid_address(which, e.to_string()))?;
    let host = match parsed.host_str() {
        Some(host) if !host.is_empty() => host,
        _ => return Err(BridgeError::invalid_address(which, "missing host")),
    };
    let port = parsed
        .port()
        .ok_or_else(|| BridgeError::invalid_address(which, "missing port"))?;
    Ok(format!("{host}:{port}"))
}

/// Per-leg dispatch pump: connection events feed the tracker and probe,
/// frames are parsed, routed through the correlation table, and handed to
/// the leg's hook.
async fn run_pump(
    kind: ChannelKind,
    addr: String,
    mut events: mpsc::Receiver<ChannelEvent>,
    tracker: Arc<ConnectionTracker>,
    table: Arc<CorrelationTable>,
    hook: SharedHook,
) {
    let mut probe = ConnectProbe::new(kind, addr);

    while let Some(event) = events.recv().await {
        match event {
            ChannelEvent::Up => {
                tracker.set(kind, true);
                probe.note_connected();
            }
            ChannelEvent::Down => tracker.set(kind, false),
            ChannelEvent::ConnectDelay => probe.note_delay(),
            ChannelEvent::Frame(line) => match Reply::parse(&line) {
                Ok(reply) => {
                    table.resolve_reply(&reply);
                    if let Ok(guard) = hook.read()
                        && let Some(hook) = guard.as_ref()
                    {
                        hook(&reply);
                    }
                }
                Err(e) => {
                    // Malformed frames must not stall dispatch for the
                    // other in-flight requests.
                    tracing::warn!(channel = %kind, error = %e, frame = %line, "dropping malformed frame");
                }
            },
        }
    }
    tracing::debug!(channel = %kind, "dispatch pump exiting");
}
