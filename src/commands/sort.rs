//! SORT and SORT ... STORE

use super::{CacheCommand, Family, Frame};
use crate::backend::native::{NativeOrder, NativeSortType};
use crate::error::Result;
use crate::options::{Order, SortType};
use crate::protocol::RespValue;
use bytes::Bytes;

/// Options shared by [`Sort`] and [`SortAndStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct SortOptions {
    pub skip: i64,
    /// -1 takes everything
    pub take: i64,
    pub order: Order,
    pub sort_type: SortType,
    /// BY pattern, e.g. `weight_*`
    pub by: Option<Bytes>,
    /// GET patterns, in order
    pub get: Vec<Bytes>,
}

impl Default for SortOptions {
    fn default() -> Self {
        SortOptions {
            skip: 0,
            take: -1,
            order: Order::Ascending,
            sort_type: SortType::Numeric,
            by: None,
            get: Vec::new(),
        }
    }
}

impl SortOptions {
    fn apply(&self, key: &Bytes) -> Frame {
        let mut frame = Frame::command("SORT").key(key);
        if let Some(by) = &self.by {
            frame = frame.arg("BY").arg(by.clone());
        }
        if self.skip != 0 || self.take != -1 {
            frame = frame.arg("LIMIT").int(self.skip).int(self.take);
        }
        for pattern in &self.get {
            frame = frame.arg("GET").arg(pattern.clone());
        }
        let order = NativeOrder::from(self.order);
        if order == NativeOrder::Desc {
            frame = frame.arg(order.token());
        }
        frame.token(NativeSortType::from(self.sort_type).token())
    }
}

/// SORT key [BY pattern] [LIMIT skip take] [GET pattern ...] [DESC] [ALPHA]
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub key: Bytes,
    pub options: SortOptions,
}

impl Sort {
    pub fn new(key: impl Into<Bytes>) -> Self {
        Sort { key: key.into(), options: SortOptions::default() }
    }

    pub fn options(mut self, options: SortOptions) -> Self {
        self.options = options;
        self
    }
}

impl CacheCommand for Sort {
    type Output = Vec<Bytes>;
    const NAME: &'static str = "Sort";
    const FAMILY: Family = Family::Sort;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(self.options.apply(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<Bytes>> {
        reply.into_bulk_list()
    }
}

/// SORT ... STORE destination
///
/// Payload: number of elements stored
#[derive(Debug, Clone, PartialEq)]
pub struct SortAndStore {
    pub key: Bytes,
    pub destination: Bytes,
    pub options: SortOptions,
}

impl SortAndStore {
    pub fn new(key: impl Into<Bytes>, destination: impl Into<Bytes>) -> Self {
        SortAndStore {
            key: key.into(),
            destination: destination.into(),
            options: SortOptions::default(),
        }
    }

    pub fn options(mut self, options: SortOptions) -> Self {
        self.options = options;
        self
    }
}

impl CacheCommand for SortAndStore {
    type Output = i64;
    const NAME: &'static str = "SortAndStore";
    const FAMILY: Family = Family::Sort;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(self
            .options
            .apply(&self.key)
            .arg("STORE")
            .key(&self.destination)
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::frame_text;

    #[test]
    fn test_plain_sort() {
        assert_eq!(frame_text(&Sort::new("ids")), "SORT ids");
    }

    #[test]
    fn test_full_sort_options() {
        let options = SortOptions {
            skip: 5,
            take: 10,
            order: Order::Descending,
            sort_type: SortType::Alphabetic,
            by: Some(Bytes::from("weight_*")),
            get: vec![Bytes::from("#"), Bytes::from("name_*")],
        };
        assert_eq!(
            frame_text(&Sort::new("ids").options(options.clone())),
            "SORT ids BY weight_* LIMIT 5 10 GET # GET name_* DESC ALPHA"
        );
        assert_eq!(
            frame_text(&SortAndStore::new("ids", "sorted").options(options)),
            "SORT ids BY weight_* LIMIT 5 10 GET # GET name_* DESC ALPHA STORE sorted"
        );
    }
}
