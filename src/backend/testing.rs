//! Scripted fakes for tests

use super::native::NativeCommandFlags;
use super::{ConnectOptions, Connection, Connector};
use crate::error::{Error, Result};
use crate::protocol::RespValue;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Handler = dyn Fn(&[String]) -> RespValue + Send + Sync;

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub db: u32,
    pub flags: NativeCommandFlags,
    pub args: Vec<String>,
}

/// Connection that answers through a closure and records every frame
pub(crate) struct MockConnection {
    handler: Box<Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockConnection {
    pub fn new(handler: impl Fn(&[String]) -> RespValue + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(MockConnection {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Answers `+OK` to everything
    pub fn ok() -> Arc<Self> {
        Self::new(|_| RespValue::simple_string("OK"))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Arguments of every call, joined with spaces
    pub fn frames(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.args.join(" ")).collect()
    }

    /// First argument of every call
    pub fn command_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.args[0].clone()).collect()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn call(&self, db: u32, flags: NativeCommandFlags, frame: Vec<Bytes>) -> Result<RespValue> {
        let args: Vec<String> = frame
            .iter()
            .map(|a| String::from_utf8_lossy(a).into_owned())
            .collect();
        self.calls.lock().unwrap().push(RecordedCall {
            db,
            flags,
            args: args.clone(),
        });
        Ok((self.handler)(&args))
    }
}

/// Connector handing out one shared [`MockConnection`]
pub(crate) struct MockConnector {
    connection: Arc<MockConnection>,
    connects: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Duration,
    last_options: Mutex<Option<ConnectOptions>>,
}

impl MockConnector {
    pub fn new(connection: Arc<MockConnection>) -> Self {
        MockConnector {
            connection,
            connects: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            delay: Duration::ZERO,
            last_options: Mutex::new(None),
        }
    }

    /// Fail the first `n` attempts with a connection error
    pub fn failing(mut self, n: usize) -> Self {
        self.failures_left = AtomicUsize::new(n);
        self
    }

    /// Sleep before completing each attempt
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of attempts, successful or not
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<ConnectOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn Connection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::ConnectionClosed);
        }
        Ok(self.connection.clone())
    }
}
