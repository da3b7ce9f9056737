//! Connection registry
//!
//! Maps server identities to established connection handles. A handle is
//! created on first use and reused for every later request with an equal
//! identity; concurrent first uses share one connect attempt.

mod identity;

pub use identity::ServerIdentity;

use crate::backend::{ConnectOptions, Connection, Connector, TcpConnector};
use crate::error::Result;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

type Slot = Arc<OnceCell<Arc<dyn Connection>>>;
type SlotMap = HashMap<String, Slot, BuildHasherDefault<SipHasher13>>;

/// Owner of every live connection handle
pub struct ConnectionRegistry {
    connector: Arc<dyn Connector>,
    slots: Mutex<SlotMap>,
}

impl ConnectionRegistry {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        ConnectionRegistry {
            connector,
            slots: Mutex::new(SlotMap::default()),
        }
    }

    /// Registry opening plain RESP/TCP connections
    pub fn tcp() -> Self {
        Self::new(Arc::new(TcpConnector))
    }

    /// Get the handle for `identity`, connecting on first use
    ///
    /// A failed attempt leaves nothing behind, so the next call retries.
    pub async fn acquire(&self, identity: &ServerIdentity) -> Result<Arc<dyn Connection>> {
        let key = identity.registry_key();
        let slot = self.slot(&key);

        if let Some(connection) = slot.get() {
            return Ok(connection.clone());
        }

        let options = Self::options_for(identity);
        let connection = slot
            .get_or_try_init(|| async {
                debug!("Opening connection to {}", options.endpoint());
                self.connector.connect(&options).await
            })
            .await;

        match connection {
            Ok(connection) => Ok(connection.clone()),
            Err(e) => {
                warn!("Connection to {} failed: {}", options.endpoint(), e);
                Err(e)
            }
        }
    }

    /// Drop the handle for `identity`; returns whether one was registered
    pub fn invalidate(&self, identity: &ServerIdentity) -> bool {
        let removed = self.lock().remove(&identity.registry_key()).is_some();
        if removed {
            info!("Invalidated connection to {}:{}", identity.host, identity.port);
        }
        removed
    }

    /// Drop every handle
    pub fn clear(&self) {
        let mut slots = self.lock();
        let count = slots.len();
        slots.clear();
        info!("Cleared {} registered connections", count);
    }

    /// Number of established handles
    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Assemble the connect options for `identity`
    ///
    /// This is the only place credentials and endpoint settings are put
    /// together.
    pub fn options_for(identity: &ServerIdentity) -> ConnectOptions {
        let tls_server_name = identity
            .tls
            .then(|| identity.tls_host.clone().unwrap_or_else(|| identity.host.clone()));

        ConnectOptions {
            host: identity.host.clone(),
            port: identity.port,
            password: identity.password.clone(),
            client_name: identity.client_name.clone(),
            tls_server_name,
            connect_timeout: identity.connect_timeout(),
            sync_timeout: identity.sync_timeout(),
            tie_breaker: identity.tie_breaker.clone(),
            allow_admin: identity.allow_admin,
            resolve_dns: identity.resolve_dns,
        }
    }

    fn slot(&self, key: &str) -> Slot {
        self.lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    fn lock(&self) -> MutexGuard<'_, SlotMap> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{MockConnection, MockConnector};
    use std::time::Duration;
    use tokio_test::assert_ok;

    fn registry() -> (Arc<ConnectionRegistry>, Arc<MockConnector>) {
        let connector = Arc::new(MockConnector::new(MockConnection::ok()));
        (Arc::new(ConnectionRegistry::new(connector.clone())), connector)
    }

    #[tokio::test]
    async fn test_acquire_reuses_handle() {
        let (registry, connector) = registry();
        let identity = ServerIdentity::new("cache", 6379);

        let first = assert_ok!(registry.acquire(&identity).await);
        let second = assert_ok!(registry.acquire(&identity.clone().with_database(3)).await);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(connector.connects(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_connects_once() {
        let connector = Arc::new(
            MockConnector::new(MockConnection::ok()).with_delay(Duration::from_millis(50)),
        );
        let registry = Arc::new(ConnectionRegistry::new(connector.clone()));
        let identity = ServerIdentity::new("cache", 6379);

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            let identity = identity.clone();
            tasks.push(tokio::spawn(async move { registry.acquire(&identity).await }));
        }
        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap().unwrap());
        }

        assert_eq!(connector.connects(), 1);
        assert!(handles.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[tokio::test]
    async fn test_failed_connect_is_not_cached() {
        let connector = Arc::new(MockConnector::new(MockConnection::ok()).failing(1));
        let registry = ConnectionRegistry::new(connector.clone());
        let identity = ServerIdentity::new("cache", 6379);

        assert!(registry.acquire(&identity).await.is_err());
        assert!(registry.is_empty());
        assert_ok!(registry.acquire(&identity).await);
        assert_eq!(connector.connects(), 2);
    }

    #[tokio::test]
    async fn test_distinct_identities_get_distinct_handles() {
        let (registry, connector) = registry();

        registry.acquire(&ServerIdentity::new("cache", 6379)).await.unwrap();
        registry
            .acquire(&ServerIdentity::new("cache", 6379).with_password("secret"))
            .await
            .unwrap();
        registry.acquire(&ServerIdentity::new("cache", 6380)).await.unwrap();

        assert_eq!(connector.connects(), 3);
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reconnect() {
        let (registry, connector) = registry();
        let identity = ServerIdentity::new("cache", 6379);

        registry.acquire(&identity).await.unwrap();
        assert!(registry.invalidate(&identity));
        assert!(!registry.invalidate(&identity));
        registry.acquire(&identity).await.unwrap();
        assert_eq!(connector.connects(), 2);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_options_are_assembled_from_identity() {
        let (registry, connector) = registry();
        let mut identity = ServerIdentity::new("cache.internal", 6380).with_password("secret");
        identity.tls = true;
        identity.client_name = Some("api".to_string());
        identity.connect_timeout_ms = 250;

        registry.acquire(&identity).await.unwrap();
        let options = connector.last_options().unwrap();

        assert_eq!(options.endpoint(), "cache.internal:6380");
        assert_eq!(options.password.as_deref(), Some("secret"));
        assert_eq!(options.tls_server_name.as_deref(), Some("cache.internal"));
        assert_eq!(options.client_name.as_deref(), Some("api"));
        assert_eq!(options.connect_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_tls_host_overrides_server_name() {
        let mut identity = ServerIdentity::new("10.0.0.5", 6379);
        assert_eq!(ConnectionRegistry::options_for(&identity).tls_server_name, None);

        identity.tls = true;
        identity.tls_host = Some("cache.internal".to_string());
        let options = ConnectionRegistry::options_for(&identity);
        assert_eq!(options.tls_server_name.as_deref(), Some("cache.internal"));
    }
}
