//! Backend connection seam
//!
//! The core talks to the store only through [`Connection`] (an established,
//! shareable handle) and [`Connector`] (how handles are opened). The TCP
//! implementation lives in [`tcp`]; tests substitute scripted fakes.

pub mod native;
mod tcp;

#[cfg(test)]
pub(crate) mod testing;

pub use tcp::{TcpConnection, TcpConnector};

use crate::error::Result;
use crate::protocol::RespValue;
use async_trait::async_trait;
use bytes::Bytes;
use native::NativeCommandFlags;
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to one server
///
/// Implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run one command frame against logical database `db` and return the raw reply
    async fn call(&self, db: u32, flags: NativeCommandFlags, frame: Vec<Bytes>) -> Result<RespValue>;
}

/// Opens connections from fully assembled options
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn Connection>>;
}

/// Everything needed to open a connection to one server
///
/// Built by the registry from a [`crate::registry::ServerIdentity`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub client_name: Option<String>,
    /// Server name to verify when TLS is enabled
    pub tls_server_name: Option<String>,
    pub connect_timeout: Duration,
    pub sync_timeout: Duration,
    pub tie_breaker: Option<String>,
    pub allow_admin: bool,
    pub resolve_dns: bool,
}

impl ConnectOptions {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
