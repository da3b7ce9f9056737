//! Error types for the adapter
//!
//! Every fallible step below the dispatcher returns [`Result`]. The
//! dispatcher is the only place these errors are turned into failure
//! responses.

use crate::protocol::RespError;
use std::time::Duration;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to the backing store
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket level failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed RESP data on the wire
    #[error("protocol error: {0}")]
    Protocol(#[from] RespError),

    /// The server answered with an error reply
    #[error("server error: {0}")]
    Server(String),

    /// The reply shape did not match the operation
    #[error("unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        expected: &'static str,
        actual: String,
    },

    /// The peer closed the connection
    #[error("connection closed")]
    ConnectionClosed,

    /// Connect or reply deadline exceeded
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// AUTH was rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// TLS could not be negotiated
    #[error("tls error: {0}")]
    Tls(String),

    /// A caller supplied value could not be encoded
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Build an [`Error::UnexpectedResponse`] from the reply that was received
    pub fn unexpected(expected: &'static str, actual: impl std::fmt::Display) -> Self {
        Error::UnexpectedResponse {
            expected,
            actual: actual.to_string(),
        }
    }
}
