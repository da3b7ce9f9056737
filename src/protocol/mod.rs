//! RESP2 protocol implementation
//!
//! Encodes outgoing command frames and parses server replies.
//! The module knows nothing about connections or commands.

mod types;
mod resp;

pub use types::{RespValue, RespError};
pub use resp::{RespParser, RespEncoder};
