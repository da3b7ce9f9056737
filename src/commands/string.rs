//! String commands (SET, GET, MSET, bit operations, counters)

use super::{millis, require, CacheCommand, Family, Frame};
use crate::backend::native::{NativeBitOp, NativeCondition};
use crate::error::Result;
use crate::numeric::{self, Counter, NumericTarget};
use crate::options::{Bitwise, When};
use crate::protocol::RespValue;
use bytes::Bytes;
use std::time::Duration;

/// SET key value [PX ms] [NX|XX]
///
/// Payload: whether the value was written
#[derive(Debug, Clone, PartialEq)]
pub struct StringSet {
    pub key: Bytes,
    pub value: Bytes,
    pub expiry: Option<Duration>,
    pub when: When,
}

impl StringSet {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        StringSet {
            key: key.into(),
            value: value.into(),
            expiry: None,
            when: When::Always,
        }
    }

    pub fn expiry(mut self, expiry: Duration) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn when(mut self, when: When) -> Self {
        self.when = when;
        self
    }
}

impl CacheCommand for StringSet {
    type Output = bool;
    const NAME: &'static str = "StringSet";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let mut frame = Frame::command("SET").key(&self.key).arg(self.value.clone());
        if let Some(expiry) = self.expiry {
            require(!expiry.is_zero(), "expiry must be greater than zero")?;
            frame = frame.arg("PX").uint(millis(expiry));
        }
        Ok(frame.token(NativeCondition::from(self.when).token()).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        reply.into_bool()
    }
}

/// MSET / MSETNX
///
/// Payload: whether the values were written
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringSetMany {
    pub items: Vec<(Bytes, Bytes)>,
    pub when: When,
}

impl StringSetMany {
    pub fn new(items: Vec<(Bytes, Bytes)>) -> Self {
        StringSetMany { items, when: When::Always }
    }

    pub fn when(mut self, when: When) -> Self {
        self.when = when;
        self
    }
}

impl CacheCommand for StringSetMany {
    type Output = bool;
    const NAME: &'static str = "StringSetMany";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.items.is_empty(), "no items to set")?;
        let name = match self.when {
            When::Always => "MSET",
            When::NotExists => "MSETNX",
            When::Exists => return Err("multi-key set does not support the 'exists' condition".to_string()),
        };
        let mut frame = Frame::command(name);
        for (key, value) in &self.items {
            frame = frame.key(key).arg(value.clone());
        }
        Ok(frame.finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        reply.into_bool()
    }
}

/// GET key
#[derive(Debug, Clone, PartialEq)]
pub struct StringGet {
    pub key: Bytes,
}

impl StringGet {
    pub fn new(key: impl Into<Bytes>) -> Self {
        StringGet { key: key.into() }
    }
}

impl CacheCommand for StringGet {
    type Output = Option<Bytes>;
    const NAME: &'static str = "StringGet";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("GET").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<Bytes>> {
        reply.into_bulk()
    }
}

/// MGET key [key ...]
///
/// Payload: one slot per key, in caller order
#[derive(Debug, Clone, PartialEq)]
pub struct StringGetMany {
    pub keys: Vec<Bytes>,
}

impl StringGetMany {
    pub fn new(keys: Vec<Bytes>) -> Self {
        StringGetMany { keys }
    }
}

impl CacheCommand for StringGetMany {
    type Output = Vec<Option<Bytes>>;
    const NAME: &'static str = "StringGetMany";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.keys.is_empty(), "no keys to get")?;
        Ok(Frame::command("MGET").keys(&self.keys).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Option<Bytes>>> {
        reply.into_optional_bulk_list()
    }
}

/// GETSET key value
///
/// Payload: the previous value
#[derive(Debug, Clone, PartialEq)]
pub struct StringGetSet {
    pub key: Bytes,
    pub value: Bytes,
}

impl StringGetSet {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        StringGetSet {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl CacheCommand for StringGetSet {
    type Output = Option<Bytes>;
    const NAME: &'static str = "StringGetSet";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("GETSET").key(&self.key).arg(self.value.clone()).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<Bytes>> {
        reply.into_bulk()
    }
}

/// APPEND key value
///
/// Payload: length after the append
#[derive(Debug, Clone, PartialEq)]
pub struct StringAppend {
    pub key: Bytes,
    pub value: Bytes,
}

impl StringAppend {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        StringAppend {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl CacheCommand for StringAppend {
    type Output = i64;
    const NAME: &'static str = "StringAppend";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("APPEND").key(&self.key).arg(self.value.clone()).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// GETRANGE key start end (inclusive, negative from the end)
#[derive(Debug, Clone, PartialEq)]
pub struct StringGetRange {
    pub key: Bytes,
    pub start: i64,
    pub end: i64,
}

impl StringGetRange {
    pub fn new(key: impl Into<Bytes>, start: i64, end: i64) -> Self {
        StringGetRange { key: key.into(), start, end }
    }
}

impl CacheCommand for StringGetRange {
    type Output = Bytes;
    const NAME: &'static str = "StringGetRange";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("GETRANGE").key(&self.key).int(self.start).int(self.end).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Bytes> {
        reply.into_bytes()
    }
}

/// SETRANGE key offset value
///
/// Payload: length after the write
#[derive(Debug, Clone, PartialEq)]
pub struct StringSetRange {
    pub key: Bytes,
    pub offset: u64,
    pub value: Bytes,
}

impl StringSetRange {
    pub fn new(key: impl Into<Bytes>, offset: u64, value: impl Into<Bytes>) -> Self {
        StringSetRange {
            key: key.into(),
            offset,
            value: value.into(),
        }
    }
}

impl CacheCommand for StringSetRange {
    type Output = i64;
    const NAME: &'static str = "StringSetRange";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("SETRANGE")
            .key(&self.key)
            .uint(self.offset)
            .arg(self.value.clone())
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// STRLEN key
#[derive(Debug, Clone, PartialEq)]
pub struct StringLength {
    pub key: Bytes,
}

impl StringLength {
    pub fn new(key: impl Into<Bytes>) -> Self {
        StringLength { key: key.into() }
    }
}

impl CacheCommand for StringLength {
    type Output = i64;
    const NAME: &'static str = "StringLength";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("STRLEN").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// BITCOUNT key start end (byte offsets)
#[derive(Debug, Clone, PartialEq)]
pub struct StringBitCount {
    pub key: Bytes,
    pub start: i64,
    pub end: i64,
}

impl StringBitCount {
    /// Count over the whole value
    pub fn new(key: impl Into<Bytes>) -> Self {
        StringBitCount { key: key.into(), start: 0, end: -1 }
    }

    pub fn range(mut self, start: i64, end: i64) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

impl CacheCommand for StringBitCount {
    type Output = i64;
    const NAME: &'static str = "StringBitCount";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("BITCOUNT").key(&self.key).int(self.start).int(self.end).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// BITOP op destination key [key ...]
///
/// NOT takes only the first key. Payload: length of the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct StringBitOperation {
    pub operation: Bitwise,
    pub destination: Bytes,
    pub keys: Vec<Bytes>,
}

impl StringBitOperation {
    pub fn new(operation: Bitwise, destination: impl Into<Bytes>, keys: Vec<Bytes>) -> Self {
        StringBitOperation {
            operation,
            destination: destination.into(),
            keys,
        }
    }
}

impl CacheCommand for StringBitOperation {
    type Output = i64;
    const NAME: &'static str = "StringBitOperation";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.keys.is_empty(), "no source keys")?;
        let native = NativeBitOp::from(self.operation);
        let sources = match native {
            NativeBitOp::Not => &self.keys[..1],
            _ => &self.keys[..],
        };
        Ok(Frame::command("BITOP")
            .arg(native.token())
            .key(&self.destination)
            .keys(sources)
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// BITPOS key bit start end
///
/// Payload: bit position, -1 when not found
#[derive(Debug, Clone, PartialEq)]
pub struct StringBitPosition {
    pub key: Bytes,
    pub bit: bool,
    pub start: i64,
    pub end: i64,
}

impl StringBitPosition {
    pub fn new(key: impl Into<Bytes>, bit: bool) -> Self {
        StringBitPosition { key: key.into(), bit, start: 0, end: -1 }
    }

    pub fn range(mut self, start: i64, end: i64) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

impl CacheCommand for StringBitPosition {
    type Output = i64;
    const NAME: &'static str = "StringBitPosition";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("BITPOS")
            .key(&self.key)
            .arg(if self.bit { "1" } else { "0" })
            .int(self.start)
            .int(self.end)
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// GETBIT key offset
#[derive(Debug, Clone, PartialEq)]
pub struct StringGetBit {
    pub key: Bytes,
    pub offset: u64,
}

impl StringGetBit {
    pub fn new(key: impl Into<Bytes>, offset: u64) -> Self {
        StringGetBit { key: key.into(), offset }
    }
}

impl CacheCommand for StringGetBit {
    type Output = bool;
    const NAME: &'static str = "StringGetBit";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("GETBIT").key(&self.key).uint(self.offset).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        reply.into_bool()
    }
}

/// SETBIT key offset bit
///
/// Payload: the previous bit
#[derive(Debug, Clone, PartialEq)]
pub struct StringSetBit {
    pub key: Bytes,
    pub offset: u64,
    pub bit: bool,
}

impl StringSetBit {
    pub fn new(key: impl Into<Bytes>, offset: u64, bit: bool) -> Self {
        StringSetBit { key: key.into(), offset, bit }
    }
}

impl CacheCommand for StringSetBit {
    type Output = bool;
    const NAME: &'static str = "StringSetBit";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("SETBIT")
            .key(&self.key)
            .uint(self.offset)
            .arg(if self.bit { "1" } else { "0" })
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        reply.into_bool()
    }
}

/// INCRBY / INCRBYFLOAT, chosen by the target's numeric family
///
/// `amount` is text; anything that does not parse counts as zero.
#[derive(Debug, Clone)]
pub struct StringIncrement<N> {
    pub key: Bytes,
    pub amount: String,
    pub target: N,
}

impl<N: NumericTarget> StringIncrement<N> {
    pub fn new(key: impl Into<Bytes>, amount: impl Into<String>, target: N) -> Self {
        StringIncrement {
            key: key.into(),
            amount: amount.into(),
            target,
        }
    }
}

impl<N: NumericTarget> CacheCommand for StringIncrement<N> {
    type Output = N::Value;
    const NAME: &'static str = "StringIncrement";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        numeric::frame(
            &self.target,
            Counter::String { key: &self.key },
            &self.amount,
            false,
        )
    }

    fn parse_reply(&self, reply: RespValue) -> Result<N::Value> {
        numeric::read(&self.target, reply)
    }
}

/// DECRBY / INCRBYFLOAT with a negated amount
#[derive(Debug, Clone)]
pub struct StringDecrement<N> {
    pub key: Bytes,
    pub amount: String,
    pub target: N,
}

impl<N: NumericTarget> StringDecrement<N> {
    pub fn new(key: impl Into<Bytes>, amount: impl Into<String>, target: N) -> Self {
        StringDecrement {
            key: key.into(),
            amount: amount.into(),
            target,
        }
    }
}

impl<N: NumericTarget> CacheCommand for StringDecrement<N> {
    type Output = N::Value;
    const NAME: &'static str = "StringDecrement";
    const FAMILY: Family = Family::String;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        numeric::frame(
            &self.target,
            Counter::String { key: &self.key },
            &self.amount,
            true,
        )
    }

    fn parse_reply(&self, reply: RespValue) -> Result<N::Value> {
        numeric::read(&self.target, reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::frame_text;
    use crate::numeric::{typed, NamedKind};

    #[test]
    fn test_set_frames() {
        assert_eq!(frame_text(&StringSet::new("k", "v")), "SET k v");
        let cmd = StringSet::new("k", "v")
            .expiry(Duration::from_secs(2))
            .when(When::NotExists);
        assert_eq!(frame_text(&cmd), "SET k v PX 2000 NX");
        assert_eq!(frame_text(&StringSet::new("k", "v").when(When::Exists)), "SET k v XX");
    }

    #[test]
    fn test_set_expiry_is_never_zero() {
        let cmd = StringSet::new("k", "v").expiry(Duration::from_micros(250));
        assert_eq!(frame_text(&cmd), "SET k v PX 1");
        assert!(StringSet::new("k", "v").expiry(Duration::ZERO).frame().is_err());
    }

    #[test]
    fn test_set_reply_null_means_not_written() {
        let cmd = StringSet::new("k", "v").when(When::NotExists);
        assert!(!cmd.parse_reply(RespValue::null()).unwrap());
        assert!(cmd.parse_reply(RespValue::simple_string("OK")).unwrap());
    }

    #[test]
    fn test_set_many_conditions() {
        let items = vec![(Bytes::from("a"), Bytes::from("1")), (Bytes::from("b"), Bytes::from("2"))];
        assert_eq!(frame_text(&StringSetMany::new(items.clone())), "MSET a 1 b 2");
        assert_eq!(
            frame_text(&StringSetMany::new(items.clone()).when(When::NotExists)),
            "MSETNX a 1 b 2"
        );
        assert!(StringSetMany::new(items).when(When::Exists).frame().is_err());
        assert_eq!(StringSetMany::new(Vec::new()).frame().unwrap_err(), "no items to set");
    }

    #[test]
    fn test_get_many_keeps_order_and_misses() {
        let cmd = StringGetMany::new(vec![Bytes::from("a"), Bytes::from("b")]);
        assert_eq!(frame_text(&cmd), "MGET a b");
        let reply = RespValue::array(vec![RespValue::null(), RespValue::bulk_string("2")]);
        assert_eq!(cmd.parse_reply(reply).unwrap(), vec![None, Some(Bytes::from("2"))]);
    }

    #[test]
    fn test_bit_not_uses_first_key_only() {
        let keys = vec![Bytes::from("a"), Bytes::from("b")];
        let cmd = StringBitOperation::new(Bitwise::Not, "dest", keys.clone());
        assert_eq!(frame_text(&cmd), "BITOP NOT dest a");
        let cmd = StringBitOperation::new(Bitwise::Xor, "dest", keys);
        assert_eq!(frame_text(&cmd), "BITOP XOR dest a b");
        assert!(StringBitOperation::new(Bitwise::And, "dest", Vec::new()).frame().is_err());
    }

    #[test]
    fn test_ranges_keep_negative_indexes() {
        assert_eq!(frame_text(&StringGetRange::new("k", 0, -1)), "GETRANGE k 0 -1");
        assert_eq!(frame_text(&StringBitCount::new("k")), "BITCOUNT k 0 -1");
        assert_eq!(frame_text(&StringBitPosition::new("k", true).range(2, -2)), "BITPOS k 1 2 -2");
    }

    #[test]
    fn test_counters_pick_primitive_by_target() {
        assert_eq!(frame_text(&StringIncrement::new("n", "4", typed::<i32>())), "INCRBY n 4");
        assert_eq!(frame_text(&StringDecrement::new("n", "4", typed::<i32>())), "DECRBY n 4");
        assert_eq!(frame_text(&StringIncrement::new("n", "0.5", typed::<f64>())), "INCRBYFLOAT n 0.5");
        assert_eq!(frame_text(&StringDecrement::new("n", "0.5", typed::<f32>())), "INCRBYFLOAT n -0.5");

        let named = StringIncrement::new("n", "1", NamedKind("Guid".into()));
        assert!(named.frame().unwrap_err().contains("Guid"));
    }

    #[test]
    fn test_counter_reply_is_coerced() {
        let cmd = StringIncrement::new("n", "1", typed::<u8>());
        assert_eq!(cmd.parse_reply(RespValue::integer(512)).unwrap(), 255u8);
    }
}
