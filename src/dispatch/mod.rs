//! Command dispatcher
//!
//! Drives every canonical command through the same steps: precondition
//! checks, connection lookup, one backend call, reply shaping. Backend
//! faults never escape; they come back as failure responses.

use crate::backend::native::NativeCommandFlags;
use crate::commands::{CacheCommand, IntoRequest, Request, Response};
use crate::error::Result;
use crate::protocol::RespValue;
use crate::registry::{ConnectionRegistry, ServerIdentity};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};

/// Dispatcher bound to one server identity
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
    identity: ServerIdentity,
}

impl Dispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>, identity: ServerIdentity) -> Self {
        Dispatcher { registry, identity }
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Dispatch a command and wrap the outcome
    ///
    /// Accepts either a bare command or a [`Request`] carrying flags.
    pub async fn dispatch<R: IntoRequest>(
        &self,
        request: R,
    ) -> Response<<R::Command as CacheCommand>::Output> {
        self.dispatch_request(request.into_request()).await
    }

    async fn dispatch_request<C: CacheCommand>(&self, request: Request<C>) -> Response<C::Output> {
        let Request { command, flags } = request;

        if command.requires_admin() && !self.identity.allow_admin {
            debug!("Refusing admin command {} on {}:{}", C::NAME, self.identity.host, self.identity.port);
            return Response::failure(format!(
                "{} is an admin command and admin mode is disabled for {}:{}",
                C::NAME,
                self.identity.host,
                self.identity.port
            ));
        }

        let frame = match command.frame() {
            Ok(frame) => frame,
            Err(message) => {
                debug!("{} {} rejected: {}", C::FAMILY, C::NAME, message);
                return Response::failure(message);
            }
        };

        debug!(
            "Dispatching {} command {} on db {}",
            C::FAMILY,
            C::NAME,
            self.identity.database
        );

        match self.execute(&command, NativeCommandFlags::from(flags), frame).await {
            Ok(payload) => Response::ok(payload),
            Err(e) => {
                warn!("{} command {} failed: {}", C::FAMILY, C::NAME, e);
                Response::failure(e.to_string())
            }
        }
    }

    async fn execute<C: CacheCommand>(
        &self,
        command: &C,
        flags: NativeCommandFlags,
        frame: Vec<Bytes>,
    ) -> Result<C::Output> {
        let connection = self.registry.acquire(&self.identity).await?;
        let db = self.identity.database;

        if flags == NativeCommandFlags::FireAndForget {
            let name = C::NAME;
            tokio::spawn(async move {
                let outcome = connection.call(db, flags, frame).await.and_then(RespValue::into_result);
                if let Err(e) = outcome {
                    warn!("Fire-and-forget command {} failed: {}", name, e);
                }
            });
            return Ok(C::Output::default());
        }

        let reply = connection.call(db, flags, frame).await?.into_result()?;
        command.parse_reply(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{MockConnection, MockConnector};
    use crate::commands::*;
    use crate::numeric::{typed, NamedKind};
    use crate::options::{CommandFlags, Order};
    use std::time::Duration;

    fn dispatcher_with(
        connection: Arc<MockConnection>,
        identity: ServerIdentity,
    ) -> (Dispatcher, Arc<MockConnector>) {
        let connector = Arc::new(MockConnector::new(connection));
        let registry = Arc::new(ConnectionRegistry::new(connector.clone()));
        (Dispatcher::new(registry, identity), connector)
    }

    fn identity() -> ServerIdentity {
        ServerIdentity::new("cache", 6379)
    }

    #[tokio::test]
    async fn test_empty_multi_set_never_reaches_backend() {
        let connection = MockConnection::ok();
        let (dispatcher, connector) = dispatcher_with(connection.clone(), identity());

        let response = dispatcher.dispatch(StringSetMany::new(Vec::new())).await;

        assert!(!response.success);
        assert!(!response.payload);
        assert_eq!(connector.connects(), 0);
        assert!(connection.calls().is_empty());
    }

    #[tokio::test]
    async fn test_admin_commands_need_admin_identity() {
        let connection = MockConnection::ok();
        let (dispatcher, _) = dispatcher_with(connection.clone(), identity());
        let response = dispatcher.dispatch(FlushDatabase).await;
        assert!(!response.success);
        assert!(response.message.unwrap().contains("admin"));
        assert!(connection.calls().is_empty());

        let (dispatcher, _) = dispatcher_with(connection.clone(), identity().with_admin(true));
        assert!(dispatcher.dispatch(FlushDatabase).await.success);
        assert_eq!(connection.command_names(), ["FLUSHDB"]);
    }

    #[tokio::test]
    async fn test_server_error_is_wrapped() {
        let connection = MockConnection::new(|_| {
            RespValue::error("WRONGTYPE Operation against a key holding the wrong kind of value")
        });
        let (dispatcher, _) = dispatcher_with(connection, identity());

        let response = dispatcher.dispatch(ListRange::all("not-a-list")).await;

        assert!(!response.success);
        assert!(response.message.unwrap().contains("WRONGTYPE"));
        assert!(response.payload.is_empty());
    }

    #[tokio::test]
    async fn test_connect_failure_is_wrapped_and_retried() {
        let connector = Arc::new(MockConnector::new(MockConnection::ok()).failing(1));
        let registry = Arc::new(ConnectionRegistry::new(connector.clone()));
        let dispatcher = Dispatcher::new(registry, identity());

        assert!(!dispatcher.dispatch(Ping).await.success);
        let response = dispatcher.dispatch(Ping).await;
        assert!(response.success);
        assert_eq!(response.payload, "OK");
        assert_eq!(connector.connects(), 2);
    }

    #[tokio::test]
    async fn test_identity_database_is_selected() {
        let connection = MockConnection::new(|_| RespValue::bulk_string("v"));
        let (dispatcher, _) = dispatcher_with(connection.clone(), identity().with_database(4));

        let response = dispatcher.dispatch(StringGet::new("k")).await;

        assert_eq!(response.payload, Some(Bytes::from("v")));
        assert_eq!(connection.calls()[0].db, 4);
    }

    #[tokio::test]
    async fn test_routing_flags_reach_the_connection() {
        let connection = MockConnection::new(|_| RespValue::integer(3));
        let (dispatcher, _) = dispatcher_with(connection.clone(), identity());

        let request = ListLength::new("q").with_flags(CommandFlags::PreferReplica);
        assert_eq!(dispatcher.dispatch(request).await.payload, 3);
        assert_eq!(connection.calls()[0].flags, NativeCommandFlags::PreferReplica);
    }

    #[tokio::test]
    async fn test_fire_and_forget_returns_default_immediately() {
        let connection = MockConnection::new(|_| RespValue::integer(9));
        let (dispatcher, _) = dispatcher_with(connection.clone(), identity());

        let request = ListLeftPush::new("q", vec![Bytes::from("a")]).with_flags(CommandFlags::FireAndForget);
        let response = dispatcher.dispatch(request).await;
        assert!(response.success);
        assert_eq!(response.payload, 0);

        for _ in 0..50 {
            if !connection.calls().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let calls = connection.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].flags, NativeCommandFlags::FireAndForget);
        assert_eq!(calls[0].args, ["LPUSH", "q", "a"]);
    }

    #[tokio::test]
    async fn test_unsupported_numeric_kind_fails_without_backend() {
        let connection = MockConnection::ok();
        let (dispatcher, connector) = dispatcher_with(connection.clone(), identity());

        let response = dispatcher
            .dispatch(StringIncrement::new("n", "1", NamedKind("TimeSpan".into())))
            .await;

        assert!(!response.success);
        assert_eq!(connector.connects(), 0);
    }

    #[tokio::test]
    async fn test_numeric_round_trip_through_backend() {
        let connection = MockConnection::new(|args| match args[0].as_str() {
            "INCRBY" => RespValue::integer(41),
            "INCRBYFLOAT" => RespValue::bulk_string("2.75"),
            _ => RespValue::error("ERR unexpected"),
        });
        let (dispatcher, _) = dispatcher_with(connection.clone(), identity());

        let integral = dispatcher.dispatch(StringIncrement::new("n", "1", typed::<i8>())).await;
        assert_eq!(integral.payload, 41i8);
        let floating = dispatcher.dispatch(StringIncrement::new("f", "0.25", typed::<f64>())).await;
        assert_eq!(floating.payload, 2.75);
        assert_eq!(connection.command_names(), ["INCRBY", "INCRBYFLOAT"]);
    }

    #[tokio::test]
    async fn test_reply_shape_mismatch_is_failure() {
        let connection = MockConnection::new(|_| RespValue::simple_string("OK"));
        let (dispatcher, _) = dispatcher_with(connection, identity());

        let response = dispatcher
            .dispatch(SortedSetRangeByRank::new("z", 0, -1).order(Order::Descending))
            .await;

        assert!(!response.success);
        assert!(response.message.unwrap().contains("unexpected response"));
    }
}
