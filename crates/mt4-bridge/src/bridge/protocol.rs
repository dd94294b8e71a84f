//! Wire vocabulary for the terminal protocol.
//!
//! Two channels:
//! - **Command channel**: request dispatch + direct replies
//! - **Event channel**: decoupled/pushed replies, may resolve requests
//!   independently of the command channel
//!
//! Frames are pipe-delimited text: `<id>|<verb>|<args...>` outbound,
//! `<id>|<status>|<fields...>` inbound.

use serde::{Deserialize, Serialize};

/// Inbound status field: request succeeded.
pub const STATUS_OK: u32 = 0;
/// Inbound status field: request failed, next field carries the error code.
pub const STATUS_FAILED: u32 = 1;

/// Unique identifier for one outstanding request.
///
/// Monotonic counter starting at 1, allocated at submit time, so ordering and
/// uniqueness hold even when dispatch is delayed by pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok().map(Self)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request operations understood by the remote terminal.
///
/// Argument arity and meaning per verb are a contract with the terminal,
/// not enforced by the bridge beyond frame arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestVerb {
    Ping,
    TradeOpen,
    TradeModify,
    TradeDelete,
    DeleteAllPendingOrders,
    CloseMarketOrder,
    CloseAllMarketOrders,
    Rates,
    Account,
    Orders,
}

impl RequestVerb {
    /// Numeric opcode carried on the wire.
    pub fn code(&self) -> u32 {
        match self {
            Self::Ping => 1,
            Self::TradeOpen => 11,
            Self::TradeModify => 12,
            Self::TradeDelete => 13,
            Self::DeleteAllPendingOrders => 21,
            Self::CloseMarketOrder => 22,
            Self::CloseAllMarketOrders => 23,
            Self::Rates => 31,
            Self::Account => 41,
            Self::Orders => 51,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Ping),
            11 => Some(Self::TradeOpen),
            12 => Some(Self::TradeModify),
            13 => Some(Self::TradeDelete),
            21 => Some(Self::DeleteAllPendingOrders),
            22 => Some(Self::CloseMarketOrder),
            23 => Some(Self::CloseAllMarketOrders),
            31 => Some(Self::Rates),
            41 => Some(Self::Account),
            51 => Some(Self::Orders),
            _ => None,
        }
    }
}

impl std::fmt::Display for RequestVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Trade operation codes (MQL4 order properties).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOp {
    Buy,
    Sell,
    BuyLimit,
    SellLimit,
    BuyStop,
    SellStop,
}

impl TradeOp {
    pub fn code(&self) -> u32 {
        match self {
            Self::Buy => 0,
            Self::Sell => 1,
            Self::BuyLimit => 2,
            Self::SellLimit => 3,
            Self::BuyStop => 4,
            Self::SellStop => 5,
        }
    }
}

impl std::fmt::Display for TradeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Volume unit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Contracts,
    Currency,
}

impl Unit {
    pub fn code(&self) -> u32 {
        match self {
            Self::Contracts => 0,
            Self::Currency => 1,
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One outbound request frame, owned by the scheduler's dispatch task from
/// creation until it is handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: RequestId,
    pub verb: RequestVerb,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(id: RequestId, verb: RequestVerb, args: Vec<String>) -> Self {
        Self { id, verb, args }
    }
}

/// Successful reply payload.
///
/// `Empty` is the explicit "no data" sentinel the terminal encodes as
/// `<id>|0|`, distinct from `Values(vec![])` and from a list of empty
/// strings (`<id>|0||` decodes to `Values(["", ""])`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyBody {
    Values(Vec<String>),
    Empty,
}

impl ReplyBody {
    pub fn values(&self) -> &[String] {
        match self {
            Self::Values(v) => v,
            Self::Empty => &[],
        }
    }

    pub fn is_empty_sentinel(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// One decoded inbound frame. Stateless, with no lifecycle beyond a single
/// decode call.
///
/// The id stays an opaque string at this layer; the correlation table
/// reparses it when routing. A failed reply carries the raw terminal error
/// code, translated through the catalog only when a waiter is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub result: Result<ReplyBody, u32>,
}

impl Reply {
    pub fn ok(id: impl Into<String>, body: ReplyBody) -> Self {
        Self {
            id: id.into(),
            result: Ok(body),
        }
    }

    pub fn failed(id: impl Into<String>, code: u32) -> Self {
        Self {
            id: id.into(),
            result: Err(code),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_codes_roundtrip() {
        for verb in [
            RequestVerb::Ping,
            RequestVerb::TradeOpen,
            RequestVerb::TradeModify,
            RequestVerb::TradeDelete,
            RequestVerb::DeleteAllPendingOrders,
            RequestVerb::CloseMarketOrder,
            RequestVerb::CloseAllMarketOrders,
            RequestVerb::Rates,
            RequestVerb::Account,
            RequestVerb::Orders,
        ] {
            assert_eq!(RequestVerb::from_code(verb.code()), Some(verb));
        }
    }

    #[test]
    fn verb_from_unknown_code() {
        assert_eq!(RequestVerb::from_code(99), None);
    }

    #[test]
    fn trade_op_codes_match_terminal_constants() {
        assert_eq!(TradeOp::Buy.code(), 0);
        assert_eq!(TradeOp::SellStop.code(), 5);
        assert_eq!(Unit::Contracts.code(), 0);
        assert_eq!(Unit::Currency.code(), 1);
    }

    #[test]
    fn empty_sentinel_distinct_from_empty_values() {
        assert_ne!(ReplyBody::Empty, ReplyBody::Values(vec![]));
        assert!(ReplyBody::Empty.is_empty_sentinel());
        assert!(!ReplyBody::Values(vec![]).is_empty_sentinel());
    }

    #[test]
    fn request_id_displays_raw_counter() {
        let id = RequestId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(RequestId::parse("42"), Some(id));
        assert_eq!(RequestId::parse("nope"), None);
    }

    #[test]
    fn reply_serializes() {
        let reply = Reply::ok("7", ReplyBody::Values(vec!["1".into()]));
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["id"], "7");

        let failed = Reply::failed("8", 130);
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["result"]["Err"], 130);
    }
}
