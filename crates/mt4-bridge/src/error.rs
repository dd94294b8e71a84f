//! Error taxonomy surfaced to callers of `request`.
//!
//! Every failure mode a submit can resolve with is a distinct variant, so
//! callers can tell "server said no" (`Protocol`) from "server never
//! answered" (`Timeout`) from "the call never left" (`ChannelDown`).

use crate::catalog;
use crate::connection::ChannelKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Malformed connect address. Fails synchronously, before any channel
    /// is opened.
    #[error("invalid {which} channel address: {reason}")]
    InvalidAddress { which: ChannelKind, reason: String },

    /// One of the legs was down at submit time. Nothing was sent and no
    /// watchdog was armed.
    #[error("{0} channel is not connected")]
    ChannelDown(ChannelKind),

    /// The terminal answered with a FAILED status. The message comes from
    /// the error catalog.
    #[error("{message}")]
    Protocol { code: u32, message: String },

    /// No reply arrived within the configured deadline.
    #[error("request timed out")]
    Timeout,

    /// The bridge was closed while the request was still in flight.
    #[error("bridge closed")]
    Closed,
}

impl BridgeError {
    pub(crate) fn invalid_address(which: ChannelKind, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            which,
            reason: reason.into(),
        }
    }

    /// Build a protocol error from a terminal error code, falling back to
    /// "unknown error <code>" for codes outside the catalog.
    pub fn protocol(code: u32) -> Self {
        let message = match catalog::error_message(code) {
            Some(message) => message.to_string(),
            None => format!("unknown error {code}"),
        };
        Self::Protocol { code, message }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}
