//! Logical server identity

use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};
use std::time::Duration;

fn default_port() -> u16 {
    6379
}

fn default_timeout_ms() -> u64 {
    5000
}

/// Everything that names one server and how to talk to it
///
/// Only `host` is required when deserializing. The database index selects
/// a logical database per call and does not take part in connection
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerIdentity {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub database: u32,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub tls: bool,
    /// Name to verify instead of `host` during the TLS handshake
    #[serde(default)]
    pub tls_host: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub sync_timeout_ms: u64,
    #[serde(default)]
    pub allow_admin: bool,
    #[serde(default)]
    pub resolve_dns: bool,
    #[serde(default)]
    pub tie_breaker: Option<String>,
}

impl ServerIdentity {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ServerIdentity {
            host: host.into(),
            port,
            database: 0,
            password: None,
            client_name: None,
            tls: false,
            tls_host: None,
            connect_timeout_ms: default_timeout_ms(),
            sync_timeout_ms: default_timeout_ms(),
            allow_admin: false,
            resolve_dns: false,
            tie_breaker: None,
        }
    }

    pub fn with_database(mut self, database: u32) -> Self {
        self.database = database;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_admin(mut self, allow_admin: bool) -> Self {
        self.allow_admin = allow_admin;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }

    /// Canonical registry key
    ///
    /// `host:port` followed by every field that changes the connection
    /// itself. The password only appears as a SipHash fingerprint.
    pub fn registry_key(&self) -> String {
        let auth = match &self.password {
            Some(password) => {
                let mut hasher = SipHasher13::new();
                password.hash(&mut hasher);
                format!("{:016x}", hasher.finish())
            }
            None => "-".to_string(),
        };
        format!(
            "{}:{},tls={},tlsHost={},name={},connectTimeout={},syncTimeout={},allowAdmin={},resolveDns={},tieBreaker={},auth={}",
            self.host.to_ascii_lowercase(),
            self.port,
            self.tls,
            self.tls_host.as_deref().unwrap_or("-"),
            self.client_name.as_deref().unwrap_or("-"),
            self.connect_timeout_ms,
            self.sync_timeout_ms,
            self.allow_admin,
            self.resolve_dns,
            self.tie_breaker.as_deref().unwrap_or("-"),
            auth,
        )
    }
}

impl Default for ServerIdentity {
    fn default() -> Self {
        ServerIdentity::new("127.0.0.1", default_port())
    }
}
