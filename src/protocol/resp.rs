//! RESP2 parser and encoder
//!
//! The parser reads one reply at a time out of a growing read buffer and
//! only consumes bytes once a complete value is available. The encoder
//! writes command frames (arrays of bulk strings) and, for tests and
//! fakes, arbitrary values.

use super::types::{RespValue, RespError};
use bytes::{Buf, BufMut, Bytes, BytesMut};

const CRLF: &[u8] = b"\r\n";

/// RESP2 Parser
pub struct RespParser;

impl RespParser {
    /// Parse a RESP value from a buffer
    ///
    /// Returns Ok(Some(value)) and advances the buffer if a complete value
    /// was available, Ok(None) if more data is needed.
    pub fn parse(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        match Self::parse_at(&buf[..], 0)? {
            Some((value, consumed)) => {
                buf.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Parse the value starting at `pos`, returning it with the offset just past it
    fn parse_at(buf: &[u8], pos: usize) -> Result<Option<(RespValue, usize)>, RespError> {
        let Some((line, next)) = Self::line_at(buf, pos) else {
            return Ok(None);
        };
        if line.is_empty() {
            return Err(RespError::InvalidProtocol("empty line".to_string()));
        }

        let body = &line[1..];
        match line[0] {
            b'+' => Ok(Some((RespValue::SimpleString(Self::text(body)?), next))),
            b'-' => Ok(Some((RespValue::Error(Self::text(body)?), next))),
            b':' => Ok(Some((RespValue::Integer(Self::number(body)?), next))),
            b'$' => {
                let len = Self::number(body)?;
                if len == -1 {
                    return Ok(Some((RespValue::Null, next)));
                }
                let len = usize::try_from(len).map_err(|_| {
                    RespError::InvalidProtocol(format!("invalid bulk string length: {}", len))
                })?;
                let end = next + len;
                if buf.len() < end + 2 {
                    return Ok(None);
                }
                if &buf[end..end + 2] != CRLF {
                    return Err(RespError::InvalidProtocol(
                        "missing CRLF after bulk string data".to_string(),
                    ));
                }
                let data = Bytes::copy_from_slice(&buf[next..end]);
                Ok(Some((RespValue::BulkString(data), end + 2)))
            }
            b'*' => {
                let count = Self::number(body)?;
                if count == -1 {
                    return Ok(Some((RespValue::Null, next)));
                }
                let count = usize::try_from(count).map_err(|_| {
                    RespError::InvalidProtocol(format!("invalid array count: {}", count))
                })?;
                let mut elements = Vec::with_capacity(count.min(1024));
                let mut cursor = next;
                for _ in 0..count {
                    match Self::parse_at(buf, cursor)? {
                        Some((value, after)) => {
                            elements.push(value);
                            cursor = after;
                        }
                        None => return Ok(None),
                    }
                }
                Ok(Some((RespValue::Array(elements), cursor)))
            }
            other => Err(RespError::InvalidProtocol(format!(
                "unknown type prefix: {}",
                other as char
            ))),
        }
    }

    /// Line starting at `pos` without its CRLF, and the offset after the CRLF
    fn line_at(buf: &[u8], pos: usize) -> Option<(&[u8], usize)> {
        let rest = buf.get(pos..)?;
        let end = rest.windows(2).position(|w| w == CRLF)?;
        Some((&rest[..end], pos + end + 2))
    }

    fn text(raw: &[u8]) -> Result<String, RespError> {
        String::from_utf8(raw.to_vec()).map_err(|_| RespError::InvalidUtf8)
    }

    fn number(raw: &[u8]) -> Result<i64, RespError> {
        std::str::from_utf8(raw)
            .map_err(|_| RespError::InvalidUtf8)?
            .parse::<i64>()
            .map_err(|_| RespError::IntegerOverflow)
    }
}

/// RESP2 Encoder
pub struct RespEncoder;

impl RespEncoder {
    /// Encode a command frame as an array of bulk strings
    pub fn encode_command(buf: &mut BytesMut, args: &[Bytes]) {
        buf.put_u8(b'*');
        buf.put_slice(args.len().to_string().as_bytes());
        buf.put_slice(CRLF);
        for arg in args {
            Self::put_bulk(buf, arg);
        }
    }

    /// Encode a RESP value to bytes
    pub fn encode(value: &RespValue) -> Bytes {
        let mut buf = BytesMut::new();
        Self::encode_to(&mut buf, value);
        buf.freeze()
    }

    /// Encode a RESP value into an existing buffer
    pub fn encode_to(buf: &mut BytesMut, value: &RespValue) {
        match value {
            RespValue::SimpleString(s) => {
                buf.put_u8(b'+');
                buf.put_slice(s.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Error(e) => {
                buf.put_u8(b'-');
                buf.put_slice(e.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Integer(i) => {
                buf.put_u8(b':');
                buf.put_slice(i.to_string().as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::BulkString(bytes) => Self::put_bulk(buf, bytes),
            RespValue::Null => buf.put_slice(b"$-1\r\n"),
            RespValue::Array(arr) => {
                buf.put_u8(b'*');
                buf.put_slice(arr.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                for elem in arr {
                    Self::encode_to(buf, elem);
                }
            }
        }
    }

    fn put_bulk(buf: &mut BytesMut, bytes: &[u8]) {
        buf.put_u8(b'$');
        buf.put_slice(bytes.len().to_string().as_bytes());
        buf.put_slice(CRLF);
        buf.put_slice(bytes);
        buf.put_slice(CRLF);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_string() {
        let mut buf = BytesMut::from("+OK\r\n");
        let result = RespParser::parse(&mut buf).unwrap();
        assert_eq!(result, Some(RespValue::SimpleString("OK".to_string())));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let mut buf = BytesMut::from("-ERR no such key\r\n");
        let result = RespParser::parse(&mut buf).unwrap();
        assert_eq!(result, Some(RespValue::Error("ERR no such key".to_string())));
    }

    #[test]
    fn test_parse_null_bulk_and_array() {
        let mut buf = BytesMut::from("$-1\r\n*-1\r\n");
        assert_eq!(RespParser::parse(&mut buf).unwrap(), Some(RespValue::Null));
        assert_eq!(RespParser::parse(&mut buf).unwrap(), Some(RespValue::Null));
    }

    #[test]
    fn test_parse_scan_reply() {
        let mut buf = BytesMut::from("*2\r\n$2\r\n17\r\n*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n");
        let result = RespParser::parse(&mut buf).unwrap();
        assert_eq!(result, Some(RespValue::Array(vec![
            RespValue::BulkString(Bytes::from("17")),
            RespValue::Array(vec![
                RespValue::BulkString(Bytes::from("foo")),
                RespValue::BulkString(Bytes::from("bar")),
            ]),
        ])));
    }

    #[test]
    fn test_partial_array_consumes_nothing() {
        let mut buf = BytesMut::from("*2\r\n$3\r\nfoo\r\n$3\r\nba");
        assert_eq!(RespParser::parse(&mut buf).unwrap(), None);
        assert_eq!(buf.len(), 19);

        buf.extend_from_slice(b"r\r\n");
        assert!(RespParser::parse(&mut buf).unwrap().is_some());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_binary_bulk_string_with_crlf_inside() {
        let mut buf = BytesMut::from(&b"$4\r\na\r\nb\r\n"[..]);
        let result = RespParser::parse(&mut buf).unwrap();
        assert_eq!(result, Some(RespValue::BulkString(Bytes::from_static(b"a\r\nb"))));
    }

    #[test]
    fn test_unknown_prefix() {
        let mut buf = BytesMut::from("?what\r\n");
        assert!(matches!(
            RespParser::parse(&mut buf),
            Err(RespError::InvalidProtocol(_))
        ));
    }

    #[test]
    fn test_encode_command() {
        let mut buf = BytesMut::new();
        RespEncoder::encode_command(&mut buf, &[Bytes::from("GET"), Bytes::from("k")]);
        assert_eq!(&buf[..], b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n");
    }

    #[test]
    fn test_encode_bulk_string() {
        let value = RespValue::BulkString(Bytes::from("foobar"));
        let encoded = RespEncoder::encode(&value);
        assert_eq!(encoded, Bytes::from("$6\r\nfoobar\r\n"));
    }
}
