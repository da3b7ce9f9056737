//! RESP2 value types
//!
//! Defines the reply values a server can send and the conversions the
//! command layer uses to shape them into typed payloads.

use crate::error::{Error, Result};
use bytes::Bytes;
use std::fmt;

/// RESP2 value types
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// Simple strings: +OK\r\n
    SimpleString(String),

    /// Errors: -Error message\r\n
    Error(String),

    /// Integers: :1000\r\n
    Integer(i64),

    /// Bulk strings: $6\r\nfoobar\r\n
    BulkString(Bytes),

    /// Null bulk string or null array: $-1\r\n, *-1\r\n
    Null,

    /// Arrays: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    pub fn integer(i: i64) -> Self {
        RespValue::Integer(i)
    }

    pub fn bulk_string(b: impl Into<Bytes>) -> Self {
        RespValue::BulkString(b.into())
    }

    pub fn null() -> Self {
        RespValue::Null
    }

    pub fn array(v: Vec<RespValue>) -> Self {
        RespValue::Array(v)
    }

    /// Short name of the value kind, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            RespValue::SimpleString(_) => "simple string",
            RespValue::Error(_) => "error",
            RespValue::Integer(_) => "integer",
            RespValue::BulkString(_) => "bulk string",
            RespValue::Null => "null",
            RespValue::Array(_) => "array",
        }
    }

    /// Try to extract array elements
    pub fn as_array(&self) -> Option<&Vec<RespValue>> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to extract bulk string bytes
    pub fn as_bulk_string(&self) -> Option<&Bytes> {
        match self {
            RespValue::BulkString(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Turn an error reply into [`Error::Server`], pass anything else through
    pub fn into_result(self) -> Result<RespValue> {
        match self {
            RespValue::Error(msg) => Err(Error::Server(msg)),
            other => Ok(other),
        }
    }

    /// Status reply such as `+OK`
    pub fn into_ok(self) -> Result<()> {
        match self {
            RespValue::SimpleString(_) => Ok(()),
            other => Err(Error::unexpected("status", other)),
        }
    }

    pub fn into_integer(self) -> Result<i64> {
        match self {
            RespValue::Integer(i) => Ok(i),
            RespValue::BulkString(ref b) => std::str::from_utf8(b)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| Error::unexpected("integer", &self)),
            other => Err(Error::unexpected("integer", other)),
        }
    }

    /// Integer reply where null means "absent" (ZRANK on a missing member)
    pub fn into_optional_integer(self) -> Result<Option<i64>> {
        match self {
            RespValue::Null => Ok(None),
            other => other.into_integer().map(Some),
        }
    }

    /// Boolean outcome: `:1`/`:0`, `+OK` for applied, null for not applied
    pub fn into_bool(self) -> Result<bool> {
        match self {
            RespValue::Integer(i) => Ok(i != 0),
            RespValue::SimpleString(_) => Ok(true),
            RespValue::Null => Ok(false),
            other => Err(Error::unexpected("boolean", other)),
        }
    }

    pub fn into_bulk(self) -> Result<Option<Bytes>> {
        match self {
            RespValue::BulkString(b) => Ok(Some(b)),
            RespValue::SimpleString(s) => Ok(Some(Bytes::from(s))),
            RespValue::Integer(i) => Ok(Some(Bytes::from(i.to_string()))),
            RespValue::Null => Ok(None),
            other => Err(Error::unexpected("bulk string", other)),
        }
    }

    /// Bulk reply where null collapses to empty bytes
    pub fn into_bytes(self) -> Result<Bytes> {
        Ok(self.into_bulk()?.unwrap_or_default())
    }

    pub fn into_text(self) -> Result<String> {
        let bytes = self.into_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::unexpected("utf-8 text", "binary bulk string"))
    }

    /// Array reply; a null array is an empty one
    pub fn into_array(self) -> Result<Vec<RespValue>> {
        match self {
            RespValue::Array(items) => Ok(items),
            RespValue::Null => Ok(Vec::new()),
            other => Err(Error::unexpected("array", other)),
        }
    }

    pub fn into_bulk_list(self) -> Result<Vec<Bytes>> {
        self.into_array()?
            .into_iter()
            .map(RespValue::into_bytes)
            .collect()
    }

    pub fn into_optional_bulk_list(self) -> Result<Vec<Option<Bytes>>> {
        self.into_array()?
            .into_iter()
            .map(RespValue::into_bulk)
            .collect()
    }

    pub fn into_double(self) -> Result<f64> {
        match self {
            RespValue::Integer(i) => Ok(i as f64),
            other => {
                let text = other.into_text()?;
                text.parse::<f64>()
                    .map_err(|_| Error::unexpected("double", text))
            }
        }
    }

    pub fn into_optional_double(self) -> Result<Option<f64>> {
        match self {
            RespValue::Null => Ok(None),
            other => other.into_double().map(Some),
        }
    }

    /// Flat `[field, value, field, value, ...]` array
    pub fn into_pairs(self) -> Result<Vec<(Bytes, Bytes)>> {
        let items = self.into_array()?;
        if items.len() % 2 != 0 {
            return Err(Error::unexpected("even-length array", items.len()));
        }
        let mut pairs = Vec::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(first), Some(second)) = (iter.next(), iter.next()) {
            pairs.push((first.into_bytes()?, second.into_bytes()?));
        }
        Ok(pairs)
    }

    /// Flat `[member, score, ...]` array from a WITHSCORES reply
    pub fn into_scored(self) -> Result<Vec<(Bytes, f64)>> {
        self.into_pairs()?
            .into_iter()
            .map(|(member, score)| {
                RespValue::BulkString(score)
                    .into_double()
                    .map(|score| (member, score))
            })
            .collect()
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "SimpleString({})", s),
            RespValue::Error(e) => write!(f, "Error({})", e),
            RespValue::Integer(i) => write!(f, "Integer({})", i),
            RespValue::BulkString(b) => write!(f, "BulkString({} bytes)", b.len()),
            RespValue::Null => write!(f, "Null"),
            RespValue::Array(arr) => write!(f, "Array({} elements)", arr.len()),
        }
    }
}

/// RESP parsing errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RespError {
    /// Invalid protocol format
    #[error("invalid protocol: {0}")]
    InvalidProtocol(String),

    /// Invalid UTF-8 in a line
    #[error("invalid UTF-8")]
    InvalidUtf8,

    /// Length or integer did not fit
    #[error("integer overflow")]
    IntegerOverflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reply_becomes_server_error() {
        let reply = RespValue::error("WRONGTYPE Operation against a key holding the wrong kind of value");
        match reply.into_result() {
            Err(Error::Server(msg)) => assert!(msg.starts_with("WRONGTYPE")),
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_bool_outcomes() {
        assert!(RespValue::simple_string("OK").into_bool().unwrap());
        assert!(!RespValue::Null.into_bool().unwrap());
        assert!(RespValue::integer(1).into_bool().unwrap());
        assert!(!RespValue::integer(0).into_bool().unwrap());
    }

    #[test]
    fn test_scored_pairs() {
        let reply = RespValue::array(vec![
            RespValue::bulk_string("alice"),
            RespValue::bulk_string("1.5"),
            RespValue::bulk_string("bob"),
            RespValue::bulk_string("inf"),
        ]);
        let scored = reply.into_scored().unwrap();
        assert_eq!(scored[0], (Bytes::from("alice"), 1.5));
        assert_eq!(scored[1].1, f64::INFINITY);
    }

    #[test]
    fn test_odd_pairs_rejected() {
        let reply = RespValue::array(vec![RespValue::bulk_string("lonely")]);
        assert!(reply.into_pairs().is_err());
    }

    #[test]
    fn test_null_array_is_empty() {
        assert!(RespValue::Null.into_bulk_list().unwrap().is_empty());
    }
}
