//! Set commands (SADD, SREM, SMEMBERS, set algebra, ...)

use super::{bulk_or_list, require, CacheCommand, Family, Frame};
use crate::backend::native::NativeSetOp;
use crate::error::Result;
use crate::options::SetOperation;
use crate::protocol::RespValue;
use bytes::Bytes;

/// SADD key member [member ...]
///
/// Payload: number of members added
#[derive(Debug, Clone, PartialEq)]
pub struct SetAdd {
    pub key: Bytes,
    pub members: Vec<Bytes>,
}

impl SetAdd {
    pub fn new(key: impl Into<Bytes>, members: Vec<Bytes>) -> Self {
        SetAdd { key: key.into(), members }
    }
}

impl CacheCommand for SetAdd {
    type Output = i64;
    const NAME: &'static str = "SetAdd";
    const FAMILY: Family = Family::Set;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.members.is_empty(), "no members to add")?;
        Ok(Frame::command("SADD").key(&self.key).keys(&self.members).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// SREM key member [member ...]
#[derive(Debug, Clone, PartialEq)]
pub struct SetRemove {
    pub key: Bytes,
    pub members: Vec<Bytes>,
}

impl SetRemove {
    pub fn new(key: impl Into<Bytes>, members: Vec<Bytes>) -> Self {
        SetRemove { key: key.into(), members }
    }
}

impl CacheCommand for SetRemove {
    type Output = i64;
    const NAME: &'static str = "SetRemove";
    const FAMILY: Family = Family::Set;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.members.is_empty(), "no members to remove")?;
        Ok(Frame::command("SREM").key(&self.key).keys(&self.members).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// SMEMBERS key
#[derive(Debug, Clone, PartialEq)]
pub struct SetMembers {
    pub key: Bytes,
}

impl SetMembers {
    pub fn new(key: impl Into<Bytes>) -> Self {
        SetMembers { key: key.into() }
    }
}

impl CacheCommand for SetMembers {
    type Output = Vec<Bytes>;
    const NAME: &'static str = "SetMembers";
    const FAMILY: Family = Family::Set;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("SMEMBERS").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Bytes>> {
        reply.into_bulk_list()
    }
}

/// SISMEMBER key member
#[derive(Debug, Clone, PartialEq)]
pub struct SetContains {
    pub key: Bytes,
    pub member: Bytes,
}

impl SetContains {
    pub fn new(key: impl Into<Bytes>, member: impl Into<Bytes>) -> Self {
        SetContains { key: key.into(), member: member.into() }
    }
}

impl CacheCommand for SetContains {
    type Output = bool;
    const NAME: &'static str = "SetContains";
    const FAMILY: Family = Family::Set;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("SISMEMBER").key(&self.key).arg(self.member.clone()).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        reply.into_bool()
    }
}

/// SCARD key
#[derive(Debug, Clone, PartialEq)]
pub struct SetLength {
    pub key: Bytes,
}

impl SetLength {
    pub fn new(key: impl Into<Bytes>) -> Self {
        SetLength { key: key.into() }
    }
}

impl CacheCommand for SetLength {
    type Output = i64;
    const NAME: &'static str = "SetLength";
    const FAMILY: Family = Family::Set;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("SCARD").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// SPOP key [count]
///
/// Payload: the popped members (at most one without a count)
#[derive(Debug, Clone, PartialEq)]
pub struct SetPop {
    pub key: Bytes,
    pub count: Option<u64>,
}

impl SetPop {
    pub fn new(key: impl Into<Bytes>) -> Self {
        SetPop { key: key.into(), count: None }
    }

    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }
}

impl CacheCommand for SetPop {
    type Output = Vec<Bytes>;
    const NAME: &'static str = "SetPop";
    const FAMILY: Family = Family::Set;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let frame = Frame::command("SPOP").key(&self.key);
        Ok(match self.count {
            Some(count) => frame.uint(count),
            None => frame,
        }
        .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Bytes>> {
        bulk_or_list(reply)
    }
}

/// SRANDMEMBER key count
///
/// A negative count may return the same member several times.
#[derive(Debug, Clone, PartialEq)]
pub struct SetRandomMembers {
    pub key: Bytes,
    pub count: i64,
}

impl SetRandomMembers {
    pub fn new(key: impl Into<Bytes>, count: i64) -> Self {
        SetRandomMembers { key: key.into(), count }
    }
}

impl CacheCommand for SetRandomMembers {
    type Output = Vec<Bytes>;
    const NAME: &'static str = "SetRandomMembers";
    const FAMILY: Family = Family::Set;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("SRANDMEMBER").key(&self.key).int(self.count).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Bytes>> {
        bulk_or_list(reply)
    }
}

/// SMOVE source destination member
#[derive(Debug, Clone, PartialEq)]
pub struct SetMove {
    pub source: Bytes,
    pub destination: Bytes,
    pub member: Bytes,
}

impl SetMove {
    pub fn new(source: impl Into<Bytes>, destination: impl Into<Bytes>, member: impl Into<Bytes>) -> Self {
        SetMove {
            source: source.into(),
            destination: destination.into(),
            member: member.into(),
        }
    }
}

impl CacheCommand for SetMove {
    type Output = bool;
    const NAME: &'static str = "SetMove";
    const FAMILY: Family = Family::Set;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("SMOVE")
            .key(&self.source)
            .key(&self.destination)
            .arg(self.member.clone())
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        reply.into_bool()
    }
}

/// SUNION / SINTER / SDIFF key [key ...]
///
/// Difference is taken left to right, so key order matters.
#[derive(Debug, Clone, PartialEq)]
pub struct SetCombine {
    pub operation: SetOperation,
    pub keys: Vec<Bytes>,
}

impl SetCombine {
    pub fn new(operation: SetOperation, keys: Vec<Bytes>) -> Self {
        SetCombine { operation, keys }
    }
}

impl CacheCommand for SetCombine {
    type Output = Vec<Bytes>;
    const NAME: &'static str = "SetCombine";
    const FAMILY: Family = Family::Set;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.keys.is_empty(), "no keys to combine")?;
        let name = NativeSetOp::from(self.operation).set_command(false);
        Ok(Frame::command(name).keys(&self.keys).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Bytes>> {
        reply.into_bulk_list()
    }
}

/// SUNIONSTORE / SINTERSTORE / SDIFFSTORE destination key [key ...]
///
/// Payload: size of the stored set
#[derive(Debug, Clone, PartialEq)]
pub struct SetCombineAndStore {
    pub operation: SetOperation,
    pub destination: Bytes,
    pub keys: Vec<Bytes>,
}

impl SetCombineAndStore {
    pub fn new(operation: SetOperation, destination: impl Into<Bytes>, keys: Vec<Bytes>) -> Self {
        SetCombineAndStore {
            operation,
            destination: destination.into(),
            keys,
        }
    }
}

impl CacheCommand for SetCombineAndStore {
    type Output = i64;
    const NAME: &'static str = "SetCombineAndStore";
    const FAMILY: Family = Family::Set;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.keys.is_empty(), "no keys to combine")?;
        let name = NativeSetOp::from(self.operation).set_command(true);
        Ok(Frame::command(name).key(&self.destination).keys(&self.keys).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::frame_text;

    fn keys(names: &[&'static str]) -> Vec<Bytes> {
        names.iter().map(|s| Bytes::from(*s)).collect()
    }

    #[test]
    fn test_combine_names() {
        assert_eq!(frame_text(&SetCombine::new(SetOperation::Intersect, keys(&["a", "b"]))), "SINTER a b");
        assert_eq!(
            frame_text(&SetCombineAndStore::new(SetOperation::Difference, "out", keys(&["a", "b"]))),
            "SDIFFSTORE out a b"
        );
        assert!(SetCombine::new(SetOperation::Union, Vec::new()).frame().is_err());
    }

    #[test]
    fn test_pop_accepts_single_or_array_reply() {
        let one = SetPop::new("s").parse_reply(RespValue::bulk_string("x")).unwrap();
        assert_eq!(one, keys(&["x"]));
        let none = SetPop::new("s").parse_reply(RespValue::null()).unwrap();
        assert!(none.is_empty());
        let many = SetPop::new("s")
            .count(2)
            .parse_reply(RespValue::array(vec![RespValue::bulk_string("x"), RespValue::bulk_string("y")]))
            .unwrap();
        assert_eq!(many, keys(&["x", "y"]));
        assert_eq!(frame_text(&SetPop::new("s").count(2)), "SPOP s 2");
    }

    #[test]
    fn test_empty_member_lists_are_rejected() {
        assert!(SetAdd::new("s", Vec::new()).frame().is_err());
        assert!(SetRemove::new("s", Vec::new()).frame().is_err());
        assert_eq!(frame_text(&SetAdd::new("s", keys(&["a", "b"]))), "SADD s a b");
    }
}
