//! Framed codec for the pipe-delimited terminal protocol.
//!
//! Uses LinesCodec for framing + pipe-delimited field formatting. Works over
//! any AsyncRead/AsyncWrite.
//!
//! Decoding is split in two: `WireCodec` only frames raw lines, and
//! `Reply::parse` turns a line into a typed frame. A malformed line is a
//! `ParseError` the dispatch pump logs and drops; it must never tear down
//! the stream, since frames for other in-flight requests follow it.

use std::io;

use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use super::protocol::{Command, Reply, ReplyBody, STATUS_FAILED, STATUS_OK};

/// Field separator. Arguments must not contain it: the terminal protocol
/// offers no escaping, so embedded delimiters are the caller's bug.
pub const DELIMITER: char = '|';

/// Codec that frames newline-terminated lines and formats outbound commands
/// as pipe-delimited fields.
pub struct WireCodec {
    inner: LinesCodec,
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl WireCodec {
    pub fn new() -> Self {
        Self {
            inner: LinesCodec::new(),
        }
    }
}

fn map_lines_error(e: LinesCodecError) -> io::Error {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            io::Error::new(io::ErrorKind::InvalidData, "frame too long")
        }
        LinesCodecError::Io(e) => e,
    }
}

impl Decoder for WireCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.inner.decode(src).map_err(map_lines_error)
    }
}

impl Encoder<Command> for WireCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = encode_command(&item);
        tracing::trace!(id = %item.id, verb = %item.verb, "encoding frame");
        self.inner.encode(line, dst).map_err(map_lines_error)
    }
}

/// Join id, verb, and each argument with the delimiter: `<id>|<verb>|<args...>`.
pub fn encode_command(cmd: &Command) -> String {
    let mut line = format!("{}{}{}", cmd.id, DELIMITER, cmd.verb);
    for arg in &cmd.args {
        line.push(DELIMITER);
        line.push_str(arg);
    }
    line
}

/// A frame that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("frame has no status field")]
    MissingStatus,
    #[error("unrecognized status {0:?}")]
    BadStatus(String),
    #[error("failed reply carries no error code")]
    MissingErrorCode,
    #[error("unrecognized error code {0:?}")]
    BadErrorCode(String),
}

impl Reply {
    /// Decode one inbound line into `(id, status, payload)`.
    ///
    /// The first field is the id (opaque string, not reparsed here). The
    /// second is the numeric status. On OK the remaining fields are the
    /// payload, except the exact shape `<id>|0|` which decodes to the
    /// `Empty` sentinel. On FAILED the field after the status is the
    /// terminal error code; any other status is a parse error.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut fields = line.split(DELIMITER);
        let id = fields.next().unwrap_or_default().to_string();
        let rest: Vec<&str> = fields.collect();

        let status_field = rest.first().ok_or(ParseError::MissingStatus)?;
        let status: u32 = status_field
            .parse()
            .map_err(|_| ParseError::BadStatus(status_field.to_string()))?;

        match status {
            STATUS_OK => {
                // `<id>|0|` is the terminal's "no data" acknowledgement.
                if rest.len() == 2 && rest[1].is_empty() {
                    return Ok(Reply::ok(id, ReplyBody::Empty));
                }
                let values = rest[1..].iter().map(|s| s.to_string()).collect();
                Ok(Reply::ok(id, ReplyBody::Values(values)))
            }
            STATUS_FAILED => {
                let code_field = rest.get(1).ok_or(ParseError::MissingErrorCode)?;
                let code: u32 = code_field
                    .parse()
                    .map_err(|_| ParseError::BadErrorCode(code_field.to_string()))?;
                Ok(Reply::failed(id, code))
            }
            _ => Err(ParseError::BadStatus(status_field.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::protocol::{RequestId, RequestVerb};

    fn cmd(id: u64, verb: RequestVerb, args: &[&str]) -> Command {
        Command::new(
            RequestId::new(id),
            verb,
            args.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn encodes_id_verb_and_args() {
        let c = cmd(3, RequestVerb::Rates, &["USDJPY"]);
        assert_eq!(encode_command(&c), "3|31|USDJPY");
    }

    #[test]
    fn encodes_without_args() {
        let c = cmd(1, RequestVerb::Ping, &[]);
        assert_eq!(encode_command(&c), "1|1");
    }

    #[test]
    fn codec_frames_one_line_per_command() {
        let mut codec = WireCodec::new();
        let mut buf = BytesMut::new();

        codec.encode(cmd(2, RequestVerb::Account, &[]), &mut buf).unwrap();
        assert_eq!(&buf[..], b"2|41\n");

        // Echo it back through the decoder.
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line, "2|41");
    }

    #[test]
    fn decode_waits_for_full_line() {
        let mut codec = WireCodec::new();
        let mut buf = BytesMut::from("5|0|1");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"23\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "5|0|123");
    }

    #[test]
    fn parses_ok_reply_with_values() {
        let reply = Reply::parse("7|0|135.22|135.25|1700000000").unwrap();
        assert_eq!(reply.id, "7");
        assert_eq!(
            reply.result,
            Ok(ReplyBody::Values(vec![
                "135.22".into(),
                "135.25".into(),
                "1700000000".into()
            ]))
        );
    }

    #[test]
    fn values_stay_strings() {
        let reply = Reply::parse("1|0|1").unwrap();
        assert_eq!(reply.result, Ok(ReplyBody::Values(vec!["1".into()])));
    }

    #[test]
    fn parses_no_payload_sentinel() {
        let reply = Reply::parse("9|0|").unwrap();
        assert_eq!(reply.result, Ok(ReplyBody::Empty));
    }

    #[test]
    fn sentinel_does_not_collapse_with_two_empty_values() {
        // `<id>|0|` is "no data"; `<id>|0||` is a list of two empty strings.
        let sentinel = Reply::parse("9|0|").unwrap();
        let two_empty = Reply::parse("9|0||").unwrap();
        assert_eq!(sentinel.result, Ok(ReplyBody::Empty));
        assert_eq!(
            two_empty.result,
            Ok(ReplyBody::Values(vec![String::new(), String::new()]))
        );
        assert_ne!(sentinel, two_empty);
    }

    #[test]
    fn parses_failed_reply_code() {
        let reply = Reply::parse("4|1|130").unwrap();
        assert_eq!(reply.id, "4");
        assert_eq!(reply.result, Err(130));
    }

    #[test]
    fn roundtrips_through_parse() {
        let c = cmd(12, RequestVerb::TradeOpen, &["USDJPY", "2", "0.01"]);
        let line = encode_command(&c);
        // A loopback stub echoes the request shape back with an OK status.
        let echoed = format!("{}|0|{}", c.id, c.args.join("|"));
        let reply = Reply::parse(&echoed).unwrap();
        assert_eq!(reply.id, "12");
        assert_eq!(
            reply.result,
            Ok(ReplyBody::Values(vec![
                "USDJPY".into(),
                "2".into(),
                "0.01".into()
            ]))
        );
        assert_eq!(line, "12|11|USDJPY|2|0.01");
    }

    #[test]
    fn rejects_unknown_status() {
        assert_eq!(
            Reply::parse("3|7|whatever"),
            Err(ParseError::BadStatus("7".into()))
        );
    }

    #[test]
    fn rejects_missing_status() {
        assert_eq!(Reply::parse("3"), Err(ParseError::MissingStatus));
        assert_eq!(
            Reply::parse(""),
            Err(ParseError::MissingStatus)
        );
    }

    #[test]
    fn rejects_non_numeric_status_and_code() {
        assert!(matches!(
            Reply::parse("3|ok|1"),
            Err(ParseError::BadStatus(_))
        ));
        assert_eq!(Reply::parse("3|1"), Err(ParseError::MissingErrorCode));
        assert!(matches!(
            Reply::parse("3|1|oops"),
            Err(ParseError::BadErrorCode(_))
        ));
    }
}
