//! Client-side bridge to a remote MT4 trading terminal.
//!
//! The terminal speaks a pipe-delimited line protocol over two TCP legs: a
//! command channel that carries requests and most replies, and an event
//! channel for pushed completions. This crate turns that byte stream into a
//! correlated request/response API:
//!
//! ```no_run
//! use mt4_bridge::{Bridge, RequestVerb};
//!
//! # async fn run() -> Result<(), mt4_bridge::BridgeError> {
//! let bridge = Bridge::connect("tcp://127.0.0.1:5555", "tcp://127.0.0.1:5556")?;
//! bridge.wait_until_connected(std::time::Duration::from_secs(5)).await?;
//!
//! let account = bridge.request(RequestVerb::Account, &[]).wait().await?;
//! println!("account: {account:?}");
//! bridge.close();
//! # Ok(())
//! # }
//! ```
//!
//! Every request gets a unique monotonic id, resolves exactly once (reply,
//! protocol failure, timeout, or close), and can complete through either
//! leg. Failed replies carry the terminal's numeric error code, translated
//! through the built-in message catalog.

pub mod bridge;

mod catalog;
mod connection;
mod correlation;
mod error;
mod scheduler;

pub use bridge::protocol::{
    Command, Reply, ReplyBody, RequestId, RequestVerb, TradeOp, Unit,
};
pub use bridge::{Bridge, BridgeConfig, FrameHook};
pub use catalog::{error_message, error_name};
pub use connection::ChannelKind;
pub use error::BridgeError;
pub use scheduler::PendingRequest;
