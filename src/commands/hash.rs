//! Hash commands (HSET, HGET, HGETALL, HDEL, counters, ...)

use super::{require, CacheCommand, Family, Frame};
use crate::error::Result;
use crate::numeric::{self, Counter, NumericTarget};
use crate::options::When;
use crate::protocol::RespValue;
use bytes::Bytes;

/// HSET key field value [field value ...]
///
/// Fields are written in the given order. Payload: number of new fields.
#[derive(Debug, Clone, PartialEq)]
pub struct HashSet {
    pub key: Bytes,
    pub entries: Vec<(Bytes, Bytes)>,
}

impl HashSet {
    pub fn new(key: impl Into<Bytes>, entries: Vec<(Bytes, Bytes)>) -> Self {
        HashSet { key: key.into(), entries }
    }
}

impl CacheCommand for HashSet {
    type Output = i64;
    const NAME: &'static str = "HashSet";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.entries.is_empty(), "no fields to set")?;
        let mut frame = Frame::command("HSET").key(&self.key);
        for (field, value) in &self.entries {
            frame = frame.arg(field.clone()).arg(value.clone());
        }
        Ok(frame.finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// HSET / HSETNX key field value
///
/// Payload: whether the field was written
#[derive(Debug, Clone, PartialEq)]
pub struct HashSetField {
    pub key: Bytes,
    pub field: Bytes,
    pub value: Bytes,
    pub when: When,
}

impl HashSetField {
    pub fn new(key: impl Into<Bytes>, field: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        HashSetField {
            key: key.into(),
            field: field.into(),
            value: value.into(),
            when: When::Always,
        }
    }

    pub fn when(mut self, when: When) -> Self {
        self.when = when;
        self
    }
}

impl CacheCommand for HashSetField {
    type Output = bool;
    const NAME: &'static str = "HashSetField";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let name = match self.when {
            When::Always => "HSET",
            When::NotExists => "HSETNX",
            When::Exists => return Err("hash field set does not support the 'exists' condition".to_string()),
        };
        Ok(Frame::command(name)
            .key(&self.key)
            .arg(self.field.clone())
            .arg(self.value.clone())
            .finish())
    }

    /// HSET answers 0 when it overwrote an existing field, which still counts as written
    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        match self.when {
            When::NotExists => reply.into_bool(),
            _ => reply.into_integer().map(|_| true),
        }
    }
}

/// HGET key field
#[derive(Debug, Clone, PartialEq)]
pub struct HashGet {
    pub key: Bytes,
    pub field: Bytes,
}

impl HashGet {
    pub fn new(key: impl Into<Bytes>, field: impl Into<Bytes>) -> Self {
        HashGet { key: key.into(), field: field.into() }
    }
}

impl CacheCommand for HashGet {
    type Output = Option<Bytes>;
    const NAME: &'static str = "HashGet";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("HGET").key(&self.key).arg(self.field.clone()).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<Bytes>> {
        reply.into_bulk()
    }
}

/// HMGET key field [field ...]
#[derive(Debug, Clone, PartialEq)]
pub struct HashGetMany {
    pub key: Bytes,
    pub fields: Vec<Bytes>,
}

impl HashGetMany {
    pub fn new(key: impl Into<Bytes>, fields: Vec<Bytes>) -> Self {
        HashGetMany { key: key.into(), fields }
    }
}

impl CacheCommand for HashGetMany {
    type Output = Vec<Option<Bytes>>;
    const NAME: &'static str = "HashGetMany";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.fields.is_empty(), "no fields to get")?;
        Ok(Frame::command("HMGET").key(&self.key).keys(&self.fields).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Option<Bytes>>> {
        reply.into_optional_bulk_list()
    }
}

/// HGETALL key
///
/// Payload: field/value pairs in server order
#[derive(Debug, Clone, PartialEq)]
pub struct HashGetAll {
    pub key: Bytes,
}

impl HashGetAll {
    pub fn new(key: impl Into<Bytes>) -> Self {
        HashGetAll { key: key.into() }
    }
}

impl CacheCommand for HashGetAll {
    type Output = Vec<(Bytes, Bytes)>;
    const NAME: &'static str = "HashGetAll";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("HGETALL").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<(Bytes, Bytes)>> {
        reply.into_pairs()
    }
}

/// HDEL key field [field ...]
#[derive(Debug, Clone, PartialEq)]
pub struct HashDelete {
    pub key: Bytes,
    pub fields: Vec<Bytes>,
}

impl HashDelete {
    pub fn new(key: impl Into<Bytes>, fields: Vec<Bytes>) -> Self {
        HashDelete { key: key.into(), fields }
    }
}

impl CacheCommand for HashDelete {
    type Output = i64;
    const NAME: &'static str = "HashDelete";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.fields.is_empty(), "no fields to delete")?;
        Ok(Frame::command("HDEL").key(&self.key).keys(&self.fields).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// HEXISTS key field
#[derive(Debug, Clone, PartialEq)]
pub struct HashExists {
    pub key: Bytes,
    pub field: Bytes,
}

impl HashExists {
    pub fn new(key: impl Into<Bytes>, field: impl Into<Bytes>) -> Self {
        HashExists { key: key.into(), field: field.into() }
    }
}

impl CacheCommand for HashExists {
    type Output = bool;
    const NAME: &'static str = "HashExists";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("HEXISTS").key(&self.key).arg(self.field.clone()).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        reply.into_bool()
    }
}

/// HKEYS key
#[derive(Debug, Clone, PartialEq)]
pub struct HashKeys {
    pub key: Bytes,
}

impl HashKeys {
    pub fn new(key: impl Into<Bytes>) -> Self {
        HashKeys { key: key.into() }
    }
}

impl CacheCommand for HashKeys {
    type Output = Vec<Bytes>;
    const NAME: &'static str = "HashKeys";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("HKEYS").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Bytes>> {
        reply.into_bulk_list()
    }
}

/// HVALS key
#[derive(Debug, Clone, PartialEq)]
pub struct HashValues {
    pub key: Bytes,
}

impl HashValues {
    pub fn new(key: impl Into<Bytes>) -> Self {
        HashValues { key: key.into() }
    }
}

impl CacheCommand for HashValues {
    type Output = Vec<Bytes>;
    const NAME: &'static str = "HashValues";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("HVALS").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Bytes>> {
        reply.into_bulk_list()
    }
}

/// HLEN key
#[derive(Debug, Clone, PartialEq)]
pub struct HashLength {
    pub key: Bytes,
}

impl HashLength {
    pub fn new(key: impl Into<Bytes>) -> Self {
        HashLength { key: key.into() }
    }
}

impl CacheCommand for HashLength {
    type Output = i64;
    const NAME: &'static str = "HashLength";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("HLEN").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// HSTRLEN key field
#[derive(Debug, Clone, PartialEq)]
pub struct HashStringLength {
    pub key: Bytes,
    pub field: Bytes,
}

impl HashStringLength {
    pub fn new(key: impl Into<Bytes>, field: impl Into<Bytes>) -> Self {
        HashStringLength { key: key.into(), field: field.into() }
    }
}

impl CacheCommand for HashStringLength {
    type Output = i64;
    const NAME: &'static str = "HashStringLength";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("HSTRLEN").key(&self.key).arg(self.field.clone()).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// HINCRBY / HINCRBYFLOAT, chosen by the target's numeric family
#[derive(Debug, Clone)]
pub struct HashIncrement<N> {
    pub key: Bytes,
    pub field: Bytes,
    pub amount: String,
    pub target: N,
}

impl<N: NumericTarget> HashIncrement<N> {
    pub fn new(key: impl Into<Bytes>, field: impl Into<Bytes>, amount: impl Into<String>, target: N) -> Self {
        HashIncrement {
            key: key.into(),
            field: field.into(),
            amount: amount.into(),
            target,
        }
    }
}

impl<N: NumericTarget> CacheCommand for HashIncrement<N> {
    type Output = N::Value;
    const NAME: &'static str = "HashIncrement";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let counter = Counter::Hash { key: &self.key, field: &self.field };
        numeric::frame(&self.target, counter, &self.amount, false)
    }

    fn parse_reply(&self, reply: RespValue) -> Result<N::Value> {
        numeric::read(&self.target, reply)
    }
}

/// HINCRBY / HINCRBYFLOAT with a negated amount
#[derive(Debug, Clone)]
pub struct HashDecrement<N> {
    pub key: Bytes,
    pub field: Bytes,
    pub amount: String,
    pub target: N,
}

impl<N: NumericTarget> HashDecrement<N> {
    pub fn new(key: impl Into<Bytes>, field: impl Into<Bytes>, amount: impl Into<String>, target: N) -> Self {
        HashDecrement {
            key: key.into(),
            field: field.into(),
            amount: amount.into(),
            target,
        }
    }
}

impl<N: NumericTarget> CacheCommand for HashDecrement<N> {
    type Output = N::Value;
    const NAME: &'static str = "HashDecrement";
    const FAMILY: Family = Family::Hash;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let counter = Counter::Hash { key: &self.key, field: &self.field };
        numeric::frame(&self.target, counter, &self.amount, true)
    }

    fn parse_reply(&self, reply: RespValue) -> Result<N::Value> {
        numeric::read(&self.target, reply)
    }
}
