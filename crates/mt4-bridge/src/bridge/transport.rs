//! TCP channel task for one transport leg.
//!
//! Each leg runs an independent connect-with-retry loop. While connected it
//! pumps inbound lines and outbound commands through `WireCodec`; on EOF or
//! an I/O error it reports Down and reconnects. Every failed connect
//! attempt emits one ConnectDelay for the slow-connect probe.
//!
//! The command leg carries an outbound queue; the event leg is
//! receive-only and gets `None`.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};

use super::codec::WireCodec;
use super::protocol::Command;
use crate::connection::ChannelKind;

/// Transport signals consumed by the bridge's dispatch pump.
#[derive(Debug)]
pub(crate) enum ChannelEvent {
    /// Socket connected.
    Up,
    /// Socket lost; a reconnect attempt follows.
    Down,
    /// One connect attempt failed and the loop is backing off.
    ConnectDelay,
    /// One raw inbound line, not yet parsed.
    Frame(String),
}

/// Spawn the channel task for one leg. Returns the event stream and the
/// task handle (aborted on bridge close).
pub(crate) fn open_channel(
    kind: ChannelKind,
    target: String,
    outbound: Option<mpsc::Receiver<Command>>,
    reconnect_delay: Duration,
) -> (mpsc::Receiver<ChannelEvent>, JoinHandle<()>) {
    let (events_tx, events_rx) = mpsc::channel(64);
    let handle = tokio::spawn(run_channel(kind, target, outbound, reconnect_delay, events_tx));
    (events_rx, handle)
}

async fn run_channel(
    kind: ChannelKind,
    target: String,
    mut outbound: Option<mpsc::Receiver<Command>>,
    reconnect_delay: Duration,
    events: mpsc::Sender<ChannelEvent>,
) {
    loop {
        let stream = match TcpStream::connect(&target).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::debug!(channel = %kind, target = %target, error = %e, "connect attempt failed");
                if events.send(ChannelEvent::ConnectDelay).await.is_err() {
                    return;
                }
                tokio::time::sleep(reconnect_delay).await;
                continue;
            }
        };

        tracing::debug!(channel = %kind, target = %target, "connected");
        if events.send(ChannelEvent::Up).await.is_err() {
            return;
        }

        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, WireCodec::new());
        let mut writer = FramedWrite::new(write_half, WireCodec::new());

        loop {
            tokio::select! {
                frame = reader.next() => {
                    match frame {
                        Some(Ok(line)) => {
                            if events.send(ChannelEvent::Frame(line)).await.is_err() {
                                return;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(channel = %kind, error = %e, "socket read error");
                            break;
                        }
                        None => {
                            tracing::debug!(channel = %kind, "socket closed by peer");
                            break;
                        }
                    }
                }

                command = recv_outbound(&mut outbound), if outbound.is_some() => {
                    match command {
                        Some(command) => {
                            if let Err(e) = writer.send(command).await {
                                // The in-flight request is lost; its waiter
                                // times out, per the at-most-once model.
                                tracing::warn!(channel = %kind, error = %e, "socket write error");
                                break;
                            }
                        }
                        None => {
                            // Scheduler gone; stop draining, keep reading.
                            outbound = None;
                        }
                    }
                }
            }
        }

        if events.send(ChannelEvent::Down).await.is_err() {
            return;
        }
    }
}

async fn recv_outbound(outbound: &mut Option<mpsc::Receiver<Command>>) -> Option<Command> {
    match outbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
