//! TCP (and optionally TLS) connection to a RESP server
//!
//! One socket per handle. Calls are serialized on the socket so each
//! request is paired with its reply; the handle remembers which logical
//! database is selected and only issues SELECT when a call needs another.
//! A socket that lost track of its replies is replaced on the next call.

use super::native::NativeCommandFlags;
use super::{ConnectOptions, Connection, Connector};
use crate::error::{Error, Result};
use crate::protocol::{RespEncoder, RespParser, RespValue};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

const BUFFER_SIZE: usize = 8 * 1024;

/// Plain TCP or TLS stream
enum Stream {
    Tcp(TcpStream),
    #[cfg(feature = "tls")]
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl Stream {
    async fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        match self {
            Stream::Tcp(tcp) => {
                tcp.write_all(data).await?;
                tcp.flush().await
            }
            #[cfg(feature = "tls")]
            Stream::Tls(tls) => {
                tls.write_all(data).await?;
                tls.flush().await
            }
        }
    }

    async fn read_buf(&mut self, buf: &mut BytesMut) -> std::io::Result<usize> {
        match self {
            Stream::Tcp(tcp) => tcp.read_buf(buf).await,
            #[cfg(feature = "tls")]
            Stream::Tls(tls) => tls.read_buf(buf).await,
        }
    }
}

/// Socket state guarded by the handle's mutex
struct Wire {
    stream: Stream,
    read_buffer: BytesMut,
    write_buffer: BytesMut,
    selected_db: u32,
    /// Raised for the whole exchange and lowered once its reply is parsed.
    /// Still raised afterwards means a reply may be left on the socket.
    broken: bool,
}

impl Wire {
    /// Dial, secure, authenticate and name a fresh socket
    async fn establish(options: &ConnectOptions) -> Result<Self> {
        let stream = match tokio::time::timeout(options.connect_timeout, TcpConnection::dial(options)).await {
            Ok(stream) => stream?,
            Err(_) => return Err(Error::Timeout(options.connect_timeout)),
        };

        let mut wire = Wire {
            stream,
            read_buffer: BytesMut::with_capacity(BUFFER_SIZE),
            write_buffer: BytesMut::with_capacity(BUFFER_SIZE),
            selected_db: 0,
            broken: false,
        };

        if let Some(ref password) = options.password {
            let reply = wire
                .round_trip(&[Bytes::from_static(b"AUTH"), Bytes::from(password.clone())], options.sync_timeout)
                .await?;
            if let RespValue::Error(msg) = reply {
                return Err(Error::Auth(msg));
            }
        }

        if let Some(ref name) = options.client_name {
            wire.round_trip(
                &[Bytes::from_static(b"CLIENT"), Bytes::from_static(b"SETNAME"), Bytes::from(name.clone())],
                options.sync_timeout,
            )
            .await?
            .into_result()?
            .into_ok()?;
        }

        info!(
            "Connected to {} (tls: {}, tie-breaker: {:?})",
            options.endpoint(),
            options.tls_server_name.is_some(),
            options.tie_breaker
        );
        Ok(wire)
    }

    async fn round_trip(&mut self, args: &[Bytes], deadline: Duration) -> Result<RespValue> {
        if self.broken {
            return Err(Error::ConnectionClosed);
        }

        self.write_buffer.clear();
        RespEncoder::encode_command(&mut self.write_buffer, args);

        // A dropped future leaves the flag raised
        self.broken = true;
        let reply = match tokio::time::timeout(deadline, self.exchange()).await {
            Ok(outcome) => outcome?,
            Err(_) => return Err(Error::Timeout(deadline)),
        };
        self.broken = false;
        Ok(reply)
    }

    /// Flush the encoded frame and read exactly one reply
    async fn exchange(&mut self) -> Result<RespValue> {
        self.stream.write_all(&self.write_buffer).await?;
        loop {
            if let Some(value) = RespParser::parse(&mut self.read_buffer)? {
                return Ok(value);
            }
            let n = self.stream.read_buf(&mut self.read_buffer).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
        }
    }
}

/// Handle over one TCP socket
///
/// A socket whose exchange failed, timed out or was cancelled is discarded.
/// The next call dials again and replays AUTH, CLIENT SETNAME and SELECT.
pub struct TcpConnection {
    endpoint: String,
    options: ConnectOptions,
    wire: Mutex<Option<Wire>>,
}

impl TcpConnection {
    /// Dial, secure, authenticate and name the connection
    pub async fn open(options: &ConnectOptions) -> Result<Self> {
        let wire = Wire::establish(options).await?;
        Ok(TcpConnection {
            endpoint: options.endpoint(),
            options: options.clone(),
            wire: Mutex::new(Some(wire)),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn dial(options: &ConnectOptions) -> Result<Stream> {
        let endpoint = options.endpoint();
        let tcp = if options.resolve_dns {
            let addrs: Vec<_> = tokio::net::lookup_host(&endpoint).await?.collect();
            debug!("Resolved {} to {:?}", endpoint, addrs);
            let mut last_error = None;
            let mut connected = None;
            for addr in addrs {
                match TcpStream::connect(addr).await {
                    Ok(tcp) => {
                        connected = Some(tcp);
                        break;
                    }
                    Err(e) => {
                        warn!("Connect to {} failed: {}", addr, e);
                        last_error = Some(e);
                    }
                }
            }
            match (connected, last_error) {
                (Some(tcp), _) => tcp,
                (None, Some(e)) => return Err(Error::Io(e)),
                (None, None) => {
                    return Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("no address found for {}", endpoint),
                    )))
                }
            }
        } else {
            TcpStream::connect(&endpoint).await?
        };
        tcp.set_nodelay(true)?;

        match options.tls_server_name {
            Some(ref server_name) => Self::secure(tcp, server_name).await,
            None => Ok(Stream::Tcp(tcp)),
        }
    }

    #[cfg(feature = "tls")]
    async fn secure(tcp: TcpStream, server_name: &str) -> Result<Stream> {
        use tokio_rustls::TlsConnector;

        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        let domain = rustls::pki_types::ServerName::try_from(server_name.to_string())
            .map_err(|e| Error::Tls(format!("invalid server name {}: {}", server_name, e)))?;
        let stream = TlsConnector::from(Arc::new(config))
            .connect(domain, tcp)
            .await
            .map_err(|e| Error::Tls(e.to_string()))?;
        Ok(Stream::Tls(Box::new(stream)))
    }

    #[cfg(not(feature = "tls"))]
    async fn secure(_tcp: TcpStream, server_name: &str) -> Result<Stream> {
        Err(Error::Tls(format!(
            "TLS to {} requires the `tls` feature",
            server_name
        )))
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn call(&self, db: u32, flags: NativeCommandFlags, frame: Vec<Bytes>) -> Result<RespValue> {
        if flags != NativeCommandFlags::None {
            trace!("{}: flags {:?} have no effect on a direct connection", self.endpoint, flags);
        }

        let mut guard = self.wire.lock().await;
        if guard.as_ref().map_or(true, |wire| wire.broken) {
            *guard = None;
            info!("Reconnecting to {}", self.endpoint);
            *guard = Some(Wire::establish(&self.options).await?);
        }
        let wire = guard.as_mut().ok_or(Error::ConnectionClosed)?;

        let deadline = self.options.sync_timeout;
        if wire.selected_db != db {
            wire.round_trip(&[Bytes::from_static(b"SELECT"), Bytes::from(db.to_string())], deadline)
                .await?
                .into_result()?
                .into_ok()?;
            wire.selected_db = db;
        }
        wire.round_trip(&frame, deadline).await
    }
}

/// Opens [`TcpConnection`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn Connection>> {
        let connection = TcpConnection::open(options).await?;
        Ok(Arc::new(connection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use tokio::net::TcpListener;

    /// In-process RESP server answering AUTH/CLIENT/SELECT/PING/ECHO/GET and logging every command
    ///
    /// `GET slow` answers after 300ms and `KILL` drops the socket without a reply.
    async fn fake_server(password: Option<&'static str>) -> (u16, Arc<StdMutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let log = Arc::new(StdMutex::new(Vec::new()));
        let server_log = log.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let log = server_log.clone();
                tokio::spawn(async move {
                    let mut buf = BytesMut::new();
                    loop {
                        while let Ok(Some(value)) = RespParser::parse(&mut buf) {
                            let args: Vec<String> = value
                                .as_array()
                                .unwrap()
                                .iter()
                                .map(|a| String::from_utf8(a.as_bulk_string().unwrap().to_vec()).unwrap())
                                .collect();
                            log.lock().unwrap().push(args.join(" "));
                            if args[0] == "KILL" {
                                return;
                            }
                            if args[0] == "GET" && args[1] == "slow" {
                                tokio::time::sleep(Duration::from_millis(300)).await;
                            }
                            let reply = match args[0].as_str() {
                                "AUTH" if Some(args[1].as_str()) == password => RespValue::simple_string("OK"),
                                "AUTH" => RespValue::error("WRONGPASS invalid password"),
                                "CLIENT" | "SELECT" => RespValue::simple_string("OK"),
                                "PING" => RespValue::simple_string("PONG"),
                                "ECHO" => RespValue::bulk_string(args[1].clone()),
                                "GET" => RespValue::bulk_string(format!("value-of-{}", args[1])),
                                _ => RespValue::error("ERR unknown command"),
                            };
                            if socket.write_all(&RespEncoder::encode(&reply)).await.is_err() {
                                return;
                            }
                        }
                        if socket.read_buf(&mut buf).await.unwrap_or(0) == 0 {
                            return;
                        }
                    }
                });
            }
        });

        (port, log)
    }

    fn options(port: u16) -> ConnectOptions {
        ConnectOptions {
            host: "127.0.0.1".to_string(),
            port,
            password: None,
            client_name: None,
            tls_server_name: None,
            connect_timeout: Duration::from_secs(2),
            sync_timeout: Duration::from_secs(2),
            tie_breaker: None,
            allow_admin: false,
            resolve_dns: false,
        }
    }

    #[tokio::test]
    async fn test_open_authenticates_and_names_connection() {
        let (port, log) = fake_server(Some("secret")).await;
        let mut opts = options(port);
        opts.password = Some("secret".to_string());
        opts.client_name = Some("ferrumlink-test".to_string());

        let conn = TcpConnection::open(&opts).await.unwrap();
        let reply = conn
            .call(0, NativeCommandFlags::None, vec![Bytes::from("ECHO"), Bytes::from("hi")])
            .await
            .unwrap();
        assert_eq!(reply, RespValue::bulk_string("hi"));

        let log = log.lock().unwrap().clone();
        assert_eq!(log, vec!["AUTH secret", "CLIENT SETNAME ferrumlink-test", "ECHO hi"]);
    }

    #[tokio::test]
    async fn test_select_only_when_database_changes() {
        let (port, log) = fake_server(None).await;
        let conn = TcpConnection::open(&options(port)).await.unwrap();

        for _ in 0..2 {
            conn.call(3, NativeCommandFlags::None, vec![Bytes::from("PING")]).await.unwrap();
        }
        conn.call(0, NativeCommandFlags::None, vec![Bytes::from("PING")]).await.unwrap();

        let log = log.lock().unwrap().clone();
        assert_eq!(log, vec!["SELECT 3", "PING", "PING", "SELECT 0", "PING"]);
    }

    fn get(key: &str) -> Vec<Bytes> {
        vec![Bytes::from("GET"), Bytes::from(key.to_string())]
    }

    #[tokio::test]
    async fn test_cancelled_call_never_hands_out_its_reply() {
        let (port, log) = fake_server(None).await;
        let conn = TcpConnection::open(&options(port)).await.unwrap();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            conn.call(0, NativeCommandFlags::None, get("slow")),
        )
        .await;
        assert!(abandoned.is_err());

        let reply = conn.call(0, NativeCommandFlags::None, get("user:1")).await.unwrap();
        assert_eq!(reply, RespValue::bulk_string("value-of-user:1"));
        assert_eq!(log.lock().unwrap().clone(), vec!["GET slow", "GET user:1"]);
    }

    #[tokio::test]
    async fn test_timed_out_call_reconnects_and_reselects() {
        let (port, log) = fake_server(Some("secret")).await;
        let mut opts = options(port);
        opts.password = Some("secret".to_string());
        opts.sync_timeout = Duration::from_millis(100);
        let conn = TcpConnection::open(&opts).await.unwrap();

        let timed_out = conn.call(3, NativeCommandFlags::None, get("slow")).await;
        assert!(matches!(timed_out, Err(Error::Timeout(_))));

        let reply = conn.call(3, NativeCommandFlags::None, get("user:2")).await.unwrap();
        assert_eq!(reply, RespValue::bulk_string("value-of-user:2"));
        assert_eq!(
            log.lock().unwrap().clone(),
            vec!["AUTH secret", "SELECT 3", "GET slow", "AUTH secret", "SELECT 3", "GET user:2"]
        );
    }

    #[tokio::test]
    async fn test_peer_close_is_reported_then_recovered() {
        let (port, _log) = fake_server(None).await;
        let conn = TcpConnection::open(&options(port)).await.unwrap();

        let closed = conn.call(0, NativeCommandFlags::None, vec![Bytes::from("KILL")]).await;
        assert!(matches!(closed, Err(Error::ConnectionClosed)));

        let reply = conn.call(0, NativeCommandFlags::None, vec![Bytes::from("PING")]).await.unwrap();
        assert_eq!(reply, RespValue::simple_string("PONG"));
    }

    #[tokio::test]
    async fn test_server_error_keeps_the_socket() {
        let (port, log) = fake_server(Some("secret")).await;
        let mut opts = options(port);
        opts.password = Some("secret".to_string());
        let conn = TcpConnection::open(&opts).await.unwrap();

        let reply = conn.call(0, NativeCommandFlags::None, vec![Bytes::from("NOPE")]).await.unwrap();
        assert!(matches!(reply, RespValue::Error(_)));
        conn.call(0, NativeCommandFlags::None, vec![Bytes::from("PING")]).await.unwrap();

        assert_eq!(log.lock().unwrap().clone(), vec!["AUTH secret", "NOPE", "PING"]);
    }

    #[tokio::test]
    async fn test_rejected_password_is_auth_error() {
        let (port, _log) = fake_server(Some("secret")).await;
        let mut opts = options(port);
        opts.password = Some("wrong".to_string());

        match TcpConnection::open(&opts).await {
            Err(Error::Auth(msg)) => assert!(msg.starts_with("WRONGPASS")),
            Err(other) => panic!("expected auth error, got {}", other),
            Ok(_) => panic!("expected auth error"),
        }
    }

    #[tokio::test]
    async fn test_refused_connection_is_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = TcpConnector.connect(&options(port)).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[cfg(not(feature = "tls"))]
    #[tokio::test]
    async fn test_tls_without_feature_is_rejected() {
        let (port, _log) = fake_server(None).await;
        let mut opts = options(port);
        opts.tls_server_name = Some("cache.internal".to_string());

        assert!(matches!(TcpConnection::open(&opts).await, Err(Error::Tls(_))));
    }
}
