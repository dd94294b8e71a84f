//! Connection-state tracking for the two transport legs.
//!
//! Each leg has an independent up/down flag fed by transport events. Both
//! must be up for a request to pass the submit gate. The tracker never
//! blocks request flow; the slow-connect probe is advisory logging only.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::BridgeError;

/// The two logical transport legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Request dispatch + direct replies.
    Command,
    /// Decoupled/pushed replies and notifications.
    Event,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command => write!(f, "command"),
            Self::Event => write!(f, "event"),
        }
    }
}

/// Up/down flags for both legs, initialized down, mutated only by transport
/// connect/disconnect events.
pub(crate) struct ConnectionTracker {
    command: watch::Sender<bool>,
    event: watch::Sender<bool>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self {
            command: watch::Sender::new(false),
            event: watch::Sender::new(false),
        }
    }

    fn leg(&self, kind: ChannelKind) -> &watch::Sender<bool> {
        match kind {
            ChannelKind::Command => &self.command,
            ChannelKind::Event => &self.event,
        }
    }

    pub fn set(&self, kind: ChannelKind, up: bool) {
        let was = self.leg(kind).send_replace(up);
        if was != up {
            tracing::debug!(channel = %kind, up, "connection state changed");
        }
    }

    pub fn is_up(&self, kind: ChannelKind) -> bool {
        *self.leg(kind).borrow()
    }

    /// Fail fast unless both legs are currently up. Checked before every
    /// outgoing request.
    pub fn gate(&self) -> Result<(), BridgeError> {
        if !self.is_up(ChannelKind::Command) {
            return Err(BridgeError::ChannelDown(ChannelKind::Command));
        }
        if !self.is_up(ChannelKind::Event) {
            return Err(BridgeError::ChannelDown(ChannelKind::Event));
        }
        Ok(())
    }

    /// Wait until one leg reports up, bounded by `timeout`.
    pub async fn wait_up(&self, kind: ChannelKind, timeout: Duration) -> Result<(), BridgeError> {
        let mut rx = self.leg(kind).subscribe();
        tokio::time::timeout(timeout, rx.wait_for(|up| *up))
            .await
            .map_err(|_| BridgeError::Timeout)?
            .map_err(|_| BridgeError::Closed)?;
        Ok(())
    }
}

/// One-shot diagnostic for the initial connect of a leg.
///
/// Two consecutive retry delays without an intervening success emit a single
/// warning, then the probe disarms for good.
pub(crate) struct ConnectProbe {
    kind: ChannelKind,
    addr: String,
    delays: u8,
    armed: bool,
}

impl ConnectProbe {
    pub fn new(kind: ChannelKind, addr: impl Into<String>) -> Self {
        Self {
            kind,
            addr: addr.into(),
            delays: 0,
            armed: true,
        }
    }

    pub fn note_delay(&mut self) {
        if !self.armed {
            return;
        }
        self.delays += 1;
        if self.delays == 2 {
            tracing::warn!(channel = %self.kind, addr = %self.addr, "cannot connect to terminal");
            self.armed = false;
        }
    }

    pub fn note_connected(&mut self) {
        self.armed = false;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
