//! ferrumlink - one request/response vocabulary over a Redis-compatible cache
//!
//! Callers build canonical commands (one type per operation) and hand them
//! to a [`Dispatcher`], which translates them into native RESP commands,
//! sends them over a connection taken from the [`ConnectionRegistry`] and
//! shapes the reply into a [`Response`]. Backend faults come back as
//! failure responses rather than errors.
//!
//! The layers are:
//! - `protocol`: RESP2 codec
//! - `backend`: the connection seam and the TCP/TLS client behind it
//! - `registry`: server identities and the connection cache
//! - `options` and `numeric`: canonical enums and counter coercion
//! - `commands`: the operation vocabulary, grouped by family
//! - `dispatch`: the single execution path
//! - `introspection` and `web`: admin tooling over the same path

pub mod backend;
pub mod commands;
pub mod dispatch;
pub mod error;
pub mod introspection;
pub mod numeric;
pub mod options;
pub mod protocol;
pub mod registry;
pub mod web;

pub use commands::{CacheCommand, Family, IntoRequest, Request, Response, WithFlags};
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use introspection::Introspection;
pub use protocol::{RespError, RespValue};
pub use registry::{ConnectionRegistry, ServerIdentity};
