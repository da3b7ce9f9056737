//! Canonical command vocabulary
//!
//! Every operation is one value type implementing [`CacheCommand`]. A
//! command knows its name and family, checks its own preconditions while
//! building the native frame, and turns the raw reply into its payload.
//! The dispatcher drives all of them the same way. Each family lives in a
//! separate file.

mod hash;
mod key;
mod list;
mod server;
mod set;
mod sort;
mod sorted_set;
mod string;

pub use hash::*;
pub use key::*;
pub use list::*;
pub use server::*;
pub use set::*;
pub use sort::*;
pub use sorted_set::*;
pub use string::*;

use crate::backend::native::format_double;
use crate::error::Result;
use crate::options::CommandFlags;
use crate::protocol::RespValue;
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Data-structure family a command belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    String,
    List,
    Hash,
    Set,
    SortedSet,
    Key,
    Sort,
    Server,
}

impl Family {
    pub fn name(self) -> &'static str {
        match self {
            Family::String => "string",
            Family::List => "list",
            Family::Hash => "hash",
            Family::Set => "set",
            Family::SortedSet => "sorted-set",
            Family::Key => "key",
            Family::Sort => "sort",
            Family::Server => "server",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A canonical operation
pub trait CacheCommand: Send + Sync + 'static {
    /// Payload of a successful response; failures carry its default
    type Output: Default + Send + 'static;

    /// Operation name (for logging)
    const NAME: &'static str;

    const FAMILY: Family;

    /// Whether the identity must allow admin commands
    fn requires_admin(&self) -> bool {
        false
    }

    /// Build the native command frame
    ///
    /// `Err` is a precondition failure: the message is reported to the
    /// caller and the backend is never contacted.
    fn frame(&self) -> std::result::Result<Vec<Bytes>, String>;

    /// Shape the raw reply into the payload
    fn parse_reply(&self, reply: RespValue) -> Result<Self::Output>;
}

/// Command plus the options shared by every operation
#[derive(Debug, Clone, PartialEq)]
pub struct Request<C> {
    pub command: C,
    pub flags: CommandFlags,
}

/// Anything the dispatcher accepts: a bare command or a [`Request`]
pub trait IntoRequest {
    type Command: CacheCommand;

    fn into_request(self) -> Request<Self::Command>;
}

impl<C: CacheCommand> IntoRequest for C {
    type Command = C;

    fn into_request(self) -> Request<C> {
        Request {
            command: self,
            flags: CommandFlags::default(),
        }
    }
}

impl<C: CacheCommand> IntoRequest for Request<C> {
    type Command = C;

    fn into_request(self) -> Request<C> {
        self
    }
}

/// `command.with_flags(..)` for any command
pub trait WithFlags: CacheCommand + Sized {
    fn with_flags(self, flags: CommandFlags) -> Request<Self> {
        Request { command: self, flags }
    }
}

impl<C: CacheCommand> WithFlags for C {}

/// Outcome of one dispatch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub payload: T,
}

impl<T: Default> Response<T> {
    pub fn ok(payload: T) -> Self {
        Response {
            success: true,
            message: None,
            payload,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Response {
            success: false,
            message: Some(message.into()),
            payload: T::default(),
        }
    }

    /// Same outcome with the payload transformed
    pub fn map<U: Default>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        if self.success {
            Response {
                success: true,
                message: self.message,
                payload: f(self.payload),
            }
        } else {
            Response {
                success: false,
                message: self.message,
                payload: U::default(),
            }
        }
    }
}

/// Native frame under construction
pub(crate) struct Frame(Vec<Bytes>);

impl Frame {
    pub fn command(name: &'static str) -> Self {
        Frame(vec![Bytes::from_static(name.as_bytes())])
    }

    pub fn arg(mut self, arg: impl Into<Bytes>) -> Self {
        self.0.push(arg.into());
        self
    }

    pub fn key(self, key: &Bytes) -> Self {
        self.arg(key.clone())
    }

    pub fn keys<'a>(mut self, keys: impl IntoIterator<Item = &'a Bytes>) -> Self {
        self.0.extend(keys.into_iter().cloned());
        self
    }

    pub fn int(self, value: i64) -> Self {
        self.arg(value.to_string())
    }

    pub fn uint(self, value: u64) -> Self {
        self.arg(value.to_string())
    }

    pub fn double(self, value: f64) -> Self {
        self.arg(format_double(value))
    }

    /// Keyword that is only present for some option values
    pub fn token(self, token: Option<&'static str>) -> Self {
        match token {
            Some(token) => self.arg(token),
            None => self,
        }
    }

    pub fn finish(self) -> Vec<Bytes> {
        self.0
    }
}

pub(crate) fn require(condition: bool, message: &str) -> std::result::Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(message.to_string())
    }
}

/// Whole milliseconds for a PX/PEXPIRE style argument
///
/// A non-zero duration shorter than a millisecond rounds up to 1 so it
/// never reads as 0.
pub(crate) fn millis(duration: Duration) -> u64 {
    let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    if ms == 0 && !duration.is_zero() {
        1
    } else {
        ms
    }
}

/// Optional reply that may be a single bulk or an array of bulks
pub(crate) fn bulk_or_list(reply: RespValue) -> Result<Vec<Bytes>> {
    match reply {
        RespValue::Array(_) => reply.into_bulk_list(),
        RespValue::Null => Ok(Vec::new()),
        other => Ok(vec![other.into_bytes()?]),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::CacheCommand;

    /// Frame as space separated text
    pub fn frame_text<C: CacheCommand>(command: &C) -> String {
        command
            .frame()
            .unwrap()
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
