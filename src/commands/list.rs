//! List commands (LPUSH, RPUSH, LPOP, RPOP, LRANGE, ...)

use super::{require, CacheCommand, Family, Frame};
use crate::error::Result;
use crate::options::When;
use crate::protocol::RespValue;
use bytes::Bytes;

fn push_name(when: When, plain: &'static str, existing: &'static str) -> std::result::Result<&'static str, String> {
    match when {
        When::Always => Ok(plain),
        When::Exists => Ok(existing),
        When::NotExists => Err("list push does not support the 'not exists' condition".to_string()),
    }
}

/// LPUSH / LPUSHX key value [value ...]
///
/// Payload: list length after the push
#[derive(Debug, Clone, PartialEq)]
pub struct ListLeftPush {
    pub key: Bytes,
    pub values: Vec<Bytes>,
    pub when: When,
}

impl ListLeftPush {
    pub fn new(key: impl Into<Bytes>, values: Vec<Bytes>) -> Self {
        ListLeftPush { key: key.into(), values, when: When::Always }
    }

    pub fn when(mut self, when: When) -> Self {
        self.when = when;
        self
    }
}

impl CacheCommand for ListLeftPush {
    type Output = i64;
    const NAME: &'static str = "ListLeftPush";
    const FAMILY: Family = Family::List;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.values.is_empty(), "no values to push")?;
        let name = push_name(self.when, "LPUSH", "LPUSHX")?;
        Ok(Frame::command(name).key(&self.key).keys(&self.values).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// RPUSH / RPUSHX key value [value ...]
#[derive(Debug, Clone, PartialEq)]
pub struct ListRightPush {
    pub key: Bytes,
    pub values: Vec<Bytes>,
    pub when: When,
}

impl ListRightPush {
    pub fn new(key: impl Into<Bytes>, values: Vec<Bytes>) -> Self {
        ListRightPush { key: key.into(), values, when: When::Always }
    }

    pub fn when(mut self, when: When) -> Self {
        self.when = when;
        self
    }
}

impl CacheCommand for ListRightPush {
    type Output = i64;
    const NAME: &'static str = "ListRightPush";
    const FAMILY: Family = Family::List;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.values.is_empty(), "no values to push")?;
        let name = push_name(self.when, "RPUSH", "RPUSHX")?;
        Ok(Frame::command(name).key(&self.key).keys(&self.values).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// LPOP key
#[derive(Debug, Clone, PartialEq)]
pub struct ListLeftPop {
    pub key: Bytes,
}

impl ListLeftPop {
    pub fn new(key: impl Into<Bytes>) -> Self {
        ListLeftPop { key: key.into() }
    }
}

impl CacheCommand for ListLeftPop {
    type Output = Option<Bytes>;
    const NAME: &'static str = "ListLeftPop";
    const FAMILY: Family = Family::List;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("LPOP").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<Bytes>> {
        reply.into_bulk()
    }
}

/// RPOP key
#[derive(Debug, Clone, PartialEq)]
pub struct ListRightPop {
    pub key: Bytes,
}

impl ListRightPop {
    pub fn new(key: impl Into<Bytes>) -> Self {
        ListRightPop { key: key.into() }
    }
}

impl CacheCommand for ListRightPop {
    type Output = Option<Bytes>;
    const NAME: &'static str = "ListRightPop";
    const FAMILY: Family = Family::List;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("RPOP").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<Bytes>> {
        reply.into_bulk()
    }
}

/// LRANGE key start stop (inclusive, negative from the tail)
#[derive(Debug, Clone, PartialEq)]
pub struct ListRange {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
}

impl ListRange {
    pub fn new(key: impl Into<Bytes>, start: i64, stop: i64) -> Self {
        ListRange { key: key.into(), start, stop }
    }

    /// The whole list
    pub fn all(key: impl Into<Bytes>) -> Self {
        Self::new(key, 0, -1)
    }
}

impl CacheCommand for ListRange {
    type Output = Vec<Bytes>;
    const NAME: &'static str = "ListRange";
    const FAMILY: Family = Family::List;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("LRANGE").key(&self.key).int(self.start).int(self.stop).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Bytes>> {
        reply.into_bulk_list()
    }
}

/// LTRIM key start stop
#[derive(Debug, Clone, PartialEq)]
pub struct ListTrim {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
}

impl ListTrim {
    pub fn new(key: impl Into<Bytes>, start: i64, stop: i64) -> Self {
        ListTrim { key: key.into(), start, stop }
    }
}

impl CacheCommand for ListTrim {
    type Output = ();
    const NAME: &'static str = "ListTrim";
    const FAMILY: Family = Family::List;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("LTRIM").key(&self.key).int(self.start).int(self.stop).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<()> {
        reply.into_ok()
    }
}

/// LLEN key
#[derive(Debug, Clone, PartialEq)]
pub struct ListLength {
    pub key: Bytes,
}

impl ListLength {
    pub fn new(key: impl Into<Bytes>) -> Self {
        ListLength { key: key.into() }
    }
}

impl CacheCommand for ListLength {
    type Output = i64;
    const NAME: &'static str = "ListLength";
    const FAMILY: Family = Family::List;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("LLEN").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// LINDEX key index
#[derive(Debug, Clone, PartialEq)]
pub struct ListGetByIndex {
    pub key: Bytes,
    pub index: i64,
}

impl ListGetByIndex {
    pub fn new(key: impl Into<Bytes>, index: i64) -> Self {
        ListGetByIndex { key: key.into(), index }
    }
}

impl CacheCommand for ListGetByIndex {
    type Output = Option<Bytes>;
    const NAME: &'static str = "ListGetByIndex";
    const FAMILY: Family = Family::List;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("LINDEX").key(&self.key).int(self.index).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<Bytes>> {
        reply.into_bulk()
    }
}

/// LSET key index value
#[derive(Debug, Clone, PartialEq)]
pub struct ListSetByIndex {
    pub key: Bytes,
    pub index: i64,
    pub value: Bytes,
}

impl ListSetByIndex {
    pub fn new(key: impl Into<Bytes>, index: i64, value: impl Into<Bytes>) -> Self {
        ListSetByIndex {
            key: key.into(),
            index,
            value: value.into(),
        }
    }
}

impl CacheCommand for ListSetByIndex {
    type Output = ();
    const NAME: &'static str = "ListSetByIndex";
    const FAMILY: Family = Family::List;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("LSET")
            .key(&self.key)
            .int(self.index)
            .arg(self.value.clone())
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<()> {
        reply.into_ok()
    }
}

/// Side of the pivot for [`ListInsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertPosition {
    #[default]
    Before,
    After,
}

/// LINSERT key BEFORE|AFTER pivot value
///
/// Payload: list length after the insert, -1 when the pivot is missing
#[derive(Debug, Clone, PartialEq)]
pub struct ListInsert {
    pub key: Bytes,
    pub position: InsertPosition,
    pub pivot: Bytes,
    pub value: Bytes,
}

impl ListInsert {
    pub fn before(key: impl Into<Bytes>, pivot: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        ListInsert {
            key: key.into(),
            position: InsertPosition::Before,
            pivot: pivot.into(),
            value: value.into(),
        }
    }

    pub fn after(key: impl Into<Bytes>, pivot: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        ListInsert {
            position: InsertPosition::After,
            ..Self::before(key, pivot, value)
        }
    }
}

impl CacheCommand for ListInsert {
    type Output = i64;
    const NAME: &'static str = "ListInsert";
    const FAMILY: Family = Family::List;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let side = match self.position {
            InsertPosition::Before => "BEFORE",
            InsertPosition::After => "AFTER",
        };
        Ok(Frame::command("LINSERT")
            .key(&self.key)
            .arg(side)
            .arg(self.pivot.clone())
            .arg(self.value.clone())
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// LREM key count value
///
/// `count` > 0 removes from the head, < 0 from the tail, 0 removes all.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRemove {
    pub key: Bytes,
    pub value: Bytes,
    pub count: i64,
}

impl ListRemove {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>, count: i64) -> Self {
        ListRemove {
            key: key.into(),
            value: value.into(),
            count,
        }
    }
}

impl CacheCommand for ListRemove {
    type Output = i64;
    const NAME: &'static str = "ListRemove";
    const FAMILY: Family = Family::List;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("LREM")
            .key(&self.key)
            .int(self.count)
            .arg(self.value.clone())
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// RPOPLPUSH source destination
#[derive(Debug, Clone, PartialEq)]
pub struct ListRightPopLeftPush {
    pub source: Bytes,
    pub destination: Bytes,
}

impl ListRightPopLeftPush {
    pub fn new(source: impl Into<Bytes>, destination: impl Into<Bytes>) -> Self {
        ListRightPopLeftPush {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl CacheCommand for ListRightPopLeftPush {
    type Output = Option<Bytes>;
    const NAME: &'static str = "ListRightPopLeftPush";
    const FAMILY: Family = Family::List;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("RPOPLPUSH").key(&self.source).key(&self.destination).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<Bytes>> {
        reply.into_bulk()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::frame_text;

    fn values(items: &[&'static str]) -> Vec<Bytes> {
        items.iter().map(|s| Bytes::from(*s)).collect()
    }

    #[test]
    fn test_push_conditions() {
        assert_eq!(frame_text(&ListLeftPush::new("q", values(&["a", "b"]))), "LPUSH q a b");
        assert_eq!(
            frame_text(&ListRightPush::new("q", values(&["a"])).when(When::Exists)),
            "RPUSHX q a"
        );
        assert!(ListLeftPush::new("q", values(&["a"])).when(When::NotExists).frame().is_err());
        assert!(ListRightPush::new("q", Vec::new()).frame().is_err());
    }

    #[test]
    fn test_range_and_trim_keep_negative_indexes() {
        assert_eq!(frame_text(&ListRange::all("q")), "LRANGE q 0 -1");
        assert_eq!(frame_text(&ListTrim::new("q", 1, -2)), "LTRIM q 1 -2");
    }

    #[test]
    fn test_insert_sides() {
        assert_eq!(frame_text(&ListInsert::before("q", "p", "v")), "LINSERT q BEFORE p v");
        assert_eq!(frame_text(&ListInsert::after("q", "p", "v")), "LINSERT q AFTER p v");
        let missing = ListInsert::after("q", "p", "v").parse_reply(RespValue::integer(-1)).unwrap();
        assert_eq!(missing, -1);
    }

    #[test]
    fn test_remove_puts_count_before_value() {
        assert_eq!(frame_text(&ListRemove::new("q", "x", -2)), "LREM q -2 x");
    }

    #[test]
    fn test_pop_on_empty_list() {
        assert_eq!(ListLeftPop::new("q").parse_reply(RespValue::null()).unwrap(), None);
        let moved = ListRightPopLeftPush::new("a", "b")
            .parse_reply(RespValue::bulk_string("x"))
            .unwrap();
        assert_eq!(moved, Some(Bytes::from("x")));
    }
}
