//! Sorted-set commands (ZADD, ZRANGE family, ZCOUNT, ZUNIONSTORE, ...)
//!
//! Score and lexical ranges carry their own exclusion; descending
//! variants use the ZREV* commands with the bounds swapped.

use super::{require, CacheCommand, Family, Frame};
use crate::backend::native::{NativeAggregate, NativeCondition, NativeOrder, NativeRangeBounds, NativeSetOp};
use crate::error::Result;
use crate::options::{Aggregate, Exclude, Order, SetOperation, When};
use crate::protocol::RespValue;
use bytes::Bytes;

/// Score interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
    pub exclude: Exclude,
}

impl ScoreRange {
    pub fn new(min: f64, max: f64) -> Self {
        ScoreRange { min, max, exclude: Exclude::None }
    }

    /// `-inf` to `+inf`
    pub fn all() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn exclude(mut self, exclude: Exclude) -> Self {
        self.exclude = exclude;
        self
    }

    fn is_all(&self) -> bool {
        self.min == f64::NEG_INFINITY && self.max == f64::INFINITY
    }

    /// (min, max) arguments, swapped for descending commands
    fn args(&self, order: NativeOrder) -> (Bytes, Bytes) {
        let bounds = NativeRangeBounds::from(self.exclude);
        let min = NativeRangeBounds::score(bounds.start, self.min);
        let max = NativeRangeBounds::score(bounds.stop, self.max);
        match order {
            NativeOrder::Asc => (min, max),
            NativeOrder::Desc => (max, min),
        }
    }
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self::all()
    }
}

/// Lexical interval; `None` is unbounded on that side
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueRange {
    pub min: Option<Bytes>,
    pub max: Option<Bytes>,
    pub exclude: Exclude,
}

impl ValueRange {
    pub fn new(min: Option<Bytes>, max: Option<Bytes>) -> Self {
        ValueRange { min, max, exclude: Exclude::None }
    }

    pub fn exclude(mut self, exclude: Exclude) -> Self {
        self.exclude = exclude;
        self
    }

    fn args(&self, order: NativeOrder) -> (Bytes, Bytes) {
        let bounds = NativeRangeBounds::from(self.exclude);
        let min = NativeRangeBounds::lex(bounds.start, self.min.as_deref(), true);
        let max = NativeRangeBounds::lex(bounds.stop, self.max.as_deref(), false);
        match order {
            NativeOrder::Asc => (min, max),
            NativeOrder::Desc => (max, min),
        }
    }
}

/// LIMIT offset count, only when it narrows anything
fn limit(frame: Frame, skip: i64, take: i64) -> Frame {
    if skip != 0 || take != -1 {
        frame.arg("LIMIT").int(skip).int(take)
    } else {
        frame
    }
}

/// ZADD key [NX|XX] score member [score member ...]
///
/// Payload: number of members added
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetAdd {
    pub key: Bytes,
    pub entries: Vec<(Bytes, f64)>,
    pub when: When,
}

impl SortedSetAdd {
    pub fn new(key: impl Into<Bytes>, entries: Vec<(Bytes, f64)>) -> Self {
        SortedSetAdd { key: key.into(), entries, when: When::Always }
    }

    pub fn when(mut self, when: When) -> Self {
        self.when = when;
        self
    }
}

impl CacheCommand for SortedSetAdd {
    type Output = i64;
    const NAME: &'static str = "SortedSetAdd";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.entries.is_empty(), "no members to add")?;
        let mut frame = Frame::command("ZADD")
            .key(&self.key)
            .token(NativeCondition::from(self.when).token());
        for (member, score) in &self.entries {
            frame = frame.double(*score).arg(member.clone());
        }
        Ok(frame.finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// ZREM key member [member ...]
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetRemove {
    pub key: Bytes,
    pub members: Vec<Bytes>,
}

impl SortedSetRemove {
    pub fn new(key: impl Into<Bytes>, members: Vec<Bytes>) -> Self {
        SortedSetRemove { key: key.into(), members }
    }
}

impl CacheCommand for SortedSetRemove {
    type Output = i64;
    const NAME: &'static str = "SortedSetRemove";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.members.is_empty(), "no members to remove")?;
        Ok(Frame::command("ZREM").key(&self.key).keys(&self.members).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

fn rank_frame(key: &Bytes, start: i64, stop: i64, order: Order, with_scores: bool) -> Vec<Bytes> {
    let name = match NativeOrder::from(order) {
        NativeOrder::Asc => "ZRANGE",
        NativeOrder::Desc => "ZREVRANGE",
    };
    Frame::command(name)
        .key(key)
        .int(start)
        .int(stop)
        .token(with_scores.then_some("WITHSCORES"))
        .finish()
}

/// ZRANGE / ZREVRANGE key start stop
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetRangeByRank {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
    pub order: Order,
}

impl SortedSetRangeByRank {
    pub fn new(key: impl Into<Bytes>, start: i64, stop: i64) -> Self {
        SortedSetRangeByRank { key: key.into(), start, stop, order: Order::Ascending }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }
}

impl CacheCommand for SortedSetRangeByRank {
    type Output = Vec<Bytes>;
    const NAME: &'static str = "SortedSetRangeByRank";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(rank_frame(&self.key, self.start, self.stop, self.order, false))
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Bytes>> {
        reply.into_bulk_list()
    }
}

/// ZRANGE / ZREVRANGE key start stop WITHSCORES
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetRangeByRankWithScores {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
    pub order: Order,
}

impl SortedSetRangeByRankWithScores {
    pub fn new(key: impl Into<Bytes>, start: i64, stop: i64) -> Self {
        SortedSetRangeByRankWithScores { key: key.into(), start, stop, order: Order::Ascending }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }
}

impl CacheCommand for SortedSetRangeByRankWithScores {
    type Output = Vec<(Bytes, f64)>;
    const NAME: &'static str = "SortedSetRangeByRankWithScores";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(rank_frame(&self.key, self.start, self.stop, self.order, true))
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<(Bytes, f64)>> {
        reply.into_scored()
    }
}

fn score_frame(key: &Bytes, range: &ScoreRange, order: Order, skip: i64, take: i64, with_scores: bool) -> Vec<Bytes> {
    let order = NativeOrder::from(order);
    let name = match order {
        NativeOrder::Asc => "ZRANGEBYSCORE",
        NativeOrder::Desc => "ZREVRANGEBYSCORE",
    };
    let (first, second) = range.args(order);
    let frame = Frame::command(name)
        .key(key)
        .arg(first)
        .arg(second)
        .token(with_scores.then_some("WITHSCORES"));
    limit(frame, skip, take).finish()
}

/// ZRANGEBYSCORE / ZREVRANGEBYSCORE key min max [LIMIT skip take]
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetRangeByScore {
    pub key: Bytes,
    pub range: ScoreRange,
    pub order: Order,
    pub skip: i64,
    /// -1 takes everything
    pub take: i64,
}

impl SortedSetRangeByScore {
    pub fn new(key: impl Into<Bytes>, range: ScoreRange) -> Self {
        SortedSetRangeByScore {
            key: key.into(),
            range,
            order: Order::Ascending,
            skip: 0,
            take: -1,
        }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, skip: i64, take: i64) -> Self {
        self.skip = skip;
        self.take = take;
        self
    }
}

impl CacheCommand for SortedSetRangeByScore {
    type Output = Vec<Bytes>;
    const NAME: &'static str = "SortedSetRangeByScore";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(score_frame(&self.key, &self.range, self.order, self.skip, self.take, false))
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Bytes>> {
        reply.into_bulk_list()
    }
}

/// Score range with scores in the payload
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetRangeByScoreWithScores {
    pub key: Bytes,
    pub range: ScoreRange,
    pub order: Order,
    pub skip: i64,
    pub take: i64,
}

impl SortedSetRangeByScoreWithScores {
    pub fn new(key: impl Into<Bytes>, range: ScoreRange) -> Self {
        SortedSetRangeByScoreWithScores {
            key: key.into(),
            range,
            order: Order::Ascending,
            skip: 0,
            take: -1,
        }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, skip: i64, take: i64) -> Self {
        self.skip = skip;
        self.take = take;
        self
    }
}

impl CacheCommand for SortedSetRangeByScoreWithScores {
    type Output = Vec<(Bytes, f64)>;
    const NAME: &'static str = "SortedSetRangeByScoreWithScores";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(score_frame(&self.key, &self.range, self.order, self.skip, self.take, true))
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<(Bytes, f64)>> {
        reply.into_scored()
    }
}

/// ZRANGEBYLEX / ZREVRANGEBYLEX key min max [LIMIT skip take]
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetRangeByValue {
    pub key: Bytes,
    pub range: ValueRange,
    pub order: Order,
    pub skip: i64,
    pub take: i64,
}

impl SortedSetRangeByValue {
    pub fn new(key: impl Into<Bytes>, range: ValueRange) -> Self {
        SortedSetRangeByValue {
            key: key.into(),
            range,
            order: Order::Ascending,
            skip: 0,
            take: -1,
        }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, skip: i64, take: i64) -> Self {
        self.skip = skip;
        self.take = take;
        self
    }
}

impl CacheCommand for SortedSetRangeByValue {
    type Output = Vec<Bytes>;
    const NAME: &'static str = "SortedSetRangeByValue";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let order = NativeOrder::from(self.order);
        let name = match order {
            NativeOrder::Asc => "ZRANGEBYLEX",
            NativeOrder::Desc => "ZREVRANGEBYLEX",
        };
        let (first, second) = self.range.args(order);
        let frame = Frame::command(name).key(&self.key).arg(first).arg(second);
        Ok(limit(frame, self.skip, self.take).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Bytes>> {
        reply.into_bulk_list()
    }
}

/// ZCARD key, or ZCOUNT key min max when a score range is given
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetLength {
    pub key: Bytes,
    pub range: Option<ScoreRange>,
}

impl SortedSetLength {
    pub fn new(key: impl Into<Bytes>) -> Self {
        SortedSetLength { key: key.into(), range: None }
    }

    pub fn range(mut self, range: ScoreRange) -> Self {
        self.range = Some(range);
        self
    }
}

impl CacheCommand for SortedSetLength {
    type Output = i64;
    const NAME: &'static str = "SortedSetLength";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        match &self.range {
            Some(range) if !(range.is_all() && range.exclude == Exclude::None) => {
                let (min, max) = range.args(NativeOrder::Asc);
                Ok(Frame::command("ZCOUNT").key(&self.key).arg(min).arg(max).finish())
            }
            _ => Ok(Frame::command("ZCARD").key(&self.key).finish()),
        }
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// ZLEXCOUNT key min max
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetLengthByValue {
    pub key: Bytes,
    pub range: ValueRange,
}

impl SortedSetLengthByValue {
    pub fn new(key: impl Into<Bytes>, range: ValueRange) -> Self {
        SortedSetLengthByValue { key: key.into(), range }
    }
}

impl CacheCommand for SortedSetLengthByValue {
    type Output = i64;
    const NAME: &'static str = "SortedSetLengthByValue";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let (min, max) = self.range.args(NativeOrder::Asc);
        Ok(Frame::command("ZLEXCOUNT").key(&self.key).arg(min).arg(max).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// ZSCORE key member
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetScore {
    pub key: Bytes,
    pub member: Bytes,
}

impl SortedSetScore {
    pub fn new(key: impl Into<Bytes>, member: impl Into<Bytes>) -> Self {
        SortedSetScore { key: key.into(), member: member.into() }
    }
}

impl CacheCommand for SortedSetScore {
    type Output = Option<f64>;
    const NAME: &'static str = "SortedSetScore";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("ZSCORE").key(&self.key).arg(self.member.clone()).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<f64>> {
        reply.into_optional_double()
    }
}

/// ZRANK / ZREVRANK key member
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetRank {
    pub key: Bytes,
    pub member: Bytes,
    pub order: Order,
}

impl SortedSetRank {
    pub fn new(key: impl Into<Bytes>, member: impl Into<Bytes>) -> Self {
        SortedSetRank { key: key.into(), member: member.into(), order: Order::Ascending }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }
}

impl CacheCommand for SortedSetRank {
    type Output = Option<i64>;
    const NAME: &'static str = "SortedSetRank";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let name = match NativeOrder::from(self.order) {
            NativeOrder::Asc => "ZRANK",
            NativeOrder::Desc => "ZREVRANK",
        };
        Ok(Frame::command(name).key(&self.key).arg(self.member.clone()).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<i64>> {
        reply.into_optional_integer()
    }
}

/// ZINCRBY key amount member
///
/// Payload: the new score
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetIncrement {
    pub key: Bytes,
    pub member: Bytes,
    pub amount: f64,
}

impl SortedSetIncrement {
    pub fn new(key: impl Into<Bytes>, member: impl Into<Bytes>, amount: f64) -> Self {
        SortedSetIncrement { key: key.into(), member: member.into(), amount }
    }
}

impl CacheCommand for SortedSetIncrement {
    type Output = f64;
    const NAME: &'static str = "SortedSetIncrement";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("ZINCRBY")
            .key(&self.key)
            .double(self.amount)
            .arg(self.member.clone())
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<f64> {
        reply.into_double()
    }
}

/// ZUNIONSTORE / ZINTERSTORE / ZDIFFSTORE destination numkeys key [key ...]
///
/// Weights pair positionally with keys. Difference takes neither weights
/// nor an aggregate. Payload: size of the stored set.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetCombineAndStore {
    pub operation: SetOperation,
    pub destination: Bytes,
    pub keys: Vec<Bytes>,
    pub weights: Option<Vec<f64>>,
    pub aggregate: Aggregate,
}

impl SortedSetCombineAndStore {
    pub fn new(operation: SetOperation, destination: impl Into<Bytes>, keys: Vec<Bytes>) -> Self {
        SortedSetCombineAndStore {
            operation,
            destination: destination.into(),
            keys,
            weights: None,
            aggregate: Aggregate::Sum,
        }
    }

    pub fn weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }
}

impl CacheCommand for SortedSetCombineAndStore {
    type Output = i64;
    const NAME: &'static str = "SortedSetCombineAndStore";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.keys.is_empty(), "no keys to combine")?;
        let operation = NativeSetOp::from(self.operation);
        if let Some(weights) = &self.weights {
            require(
                weights.len() == self.keys.len(),
                "weights must pair one to one with source keys",
            )?;
            require(operation != NativeSetOp::Diff, "difference does not take weights")?;
        }

        let mut frame = Frame::command(operation.sorted_set_store_command())
            .key(&self.destination)
            .uint(self.keys.len() as u64)
            .keys(&self.keys);
        if operation == NativeSetOp::Diff {
            return Ok(frame.finish());
        }
        if let Some(weights) = &self.weights {
            frame = frame.arg("WEIGHTS");
            for weight in weights {
                frame = frame.double(*weight);
            }
        }
        let aggregate = NativeAggregate::from(self.aggregate);
        if aggregate != NativeAggregate::Sum {
            frame = frame.arg("AGGREGATE").arg(aggregate.token());
        }
        Ok(frame.finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// ZREMRANGEBYRANK key start stop
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetRemoveRangeByRank {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
}

impl SortedSetRemoveRangeByRank {
    pub fn new(key: impl Into<Bytes>, start: i64, stop: i64) -> Self {
        SortedSetRemoveRangeByRank { key: key.into(), start, stop }
    }
}

impl CacheCommand for SortedSetRemoveRangeByRank {
    type Output = i64;
    const NAME: &'static str = "SortedSetRemoveRangeByRank";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("ZREMRANGEBYRANK")
            .key(&self.key)
            .int(self.start)
            .int(self.stop)
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// ZREMRANGEBYSCORE key min max
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetRemoveRangeByScore {
    pub key: Bytes,
    pub range: ScoreRange,
}

impl SortedSetRemoveRangeByScore {
    pub fn new(key: impl Into<Bytes>, range: ScoreRange) -> Self {
        SortedSetRemoveRangeByScore { key: key.into(), range }
    }
}

impl CacheCommand for SortedSetRemoveRangeByScore {
    type Output = i64;
    const NAME: &'static str = "SortedSetRemoveRangeByScore";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let (min, max) = self.range.args(NativeOrder::Asc);
        Ok(Frame::command("ZREMRANGEBYSCORE").key(&self.key).arg(min).arg(max).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// ZREMRANGEBYLEX key min max
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetRemoveRangeByValue {
    pub key: Bytes,
    pub range: ValueRange,
}

impl SortedSetRemoveRangeByValue {
    pub fn new(key: impl Into<Bytes>, range: ValueRange) -> Self {
        SortedSetRemoveRangeByValue { key: key.into(), range }
    }
}

impl CacheCommand for SortedSetRemoveRangeByValue {
    type Output = i64;
    const NAME: &'static str = "SortedSetRemoveRangeByValue";
    const FAMILY: Family = Family::SortedSet;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let (min, max) = self.range.args(NativeOrder::Asc);
        Ok(Frame::command("ZREMRANGEBYLEX").key(&self.key).arg(min).arg(max).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}
