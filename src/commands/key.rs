//! Key management commands (DEL, EXISTS, EXPIRE, TYPE, RENAME, DUMP, MIGRATE, ...)

use super::{millis, require, CacheCommand, Family, Frame};
use crate::backend::native::{NativeKeyType, NativeMigrateMode};
use crate::error::Result;
use crate::options::translate::key_type_from_native;
use crate::options::{KeyType, MigrateOption, When};
use crate::protocol::RespValue;
use bytes::Bytes;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// DEL key [key ...]
///
/// Payload: number of keys removed
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDelete {
    pub keys: Vec<Bytes>,
}

impl KeyDelete {
    pub fn new(keys: Vec<Bytes>) -> Self {
        KeyDelete { keys }
    }

    pub fn one(key: impl Into<Bytes>) -> Self {
        KeyDelete { keys: vec![key.into()] }
    }
}

impl CacheCommand for KeyDelete {
    type Output = i64;
    const NAME: &'static str = "KeyDelete";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.keys.is_empty(), "no keys to delete")?;
        Ok(Frame::command("DEL").keys(&self.keys).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// EXISTS key [key ...]
///
/// Payload: number of the given keys that exist; a key repeated in the
/// list counts each time
#[derive(Debug, Clone, PartialEq)]
pub struct KeyExists {
    pub keys: Vec<Bytes>,
}

impl KeyExists {
    pub fn new(keys: Vec<Bytes>) -> Self {
        KeyExists { keys }
    }

    pub fn one(key: impl Into<Bytes>) -> Self {
        KeyExists { keys: vec![key.into()] }
    }
}

impl CacheCommand for KeyExists {
    type Output = i64;
    const NAME: &'static str = "KeyExists";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        require(!self.keys.is_empty(), "no keys to check")?;
        Ok(Frame::command("EXISTS").keys(&self.keys).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// PEXPIRE key ms, or PERSIST key when no expiry is given
///
/// Payload: whether the timeout changed
#[derive(Debug, Clone, PartialEq)]
pub struct KeyExpire {
    pub key: Bytes,
    pub expiry: Option<Duration>,
}

impl KeyExpire {
    pub fn new(key: impl Into<Bytes>, expiry: Option<Duration>) -> Self {
        KeyExpire { key: key.into(), expiry }
    }
}

impl CacheCommand for KeyExpire {
    type Output = bool;
    const NAME: &'static str = "KeyExpire";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(match self.expiry {
            Some(expiry) => Frame::command("PEXPIRE")
                .key(&self.key)
                .uint(millis(expiry))
                .finish(),
            None => Frame::command("PERSIST").key(&self.key).finish(),
        })
    }

    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        reply.into_bool()
    }
}

/// PEXPIREAT key unix-ms, or PERSIST key when no instant is given
#[derive(Debug, Clone, PartialEq)]
pub struct KeyExpireAt {
    pub key: Bytes,
    pub at: Option<SystemTime>,
}

impl KeyExpireAt {
    pub fn new(key: impl Into<Bytes>, at: Option<SystemTime>) -> Self {
        KeyExpireAt { key: key.into(), at }
    }
}

impl CacheCommand for KeyExpireAt {
    type Output = bool;
    const NAME: &'static str = "KeyExpireAt";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        match self.at {
            Some(at) => {
                let since_epoch = at
                    .duration_since(UNIX_EPOCH)
                    .map_err(|_| "expiry instant is before the unix epoch".to_string())?;
                Ok(Frame::command("PEXPIREAT")
                    .key(&self.key)
                    .uint(since_epoch.as_millis() as u64)
                    .finish())
            }
            None => Ok(Frame::command("PERSIST").key(&self.key).finish()),
        }
    }

    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        reply.into_bool()
    }
}

/// PERSIST key
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPersist {
    pub key: Bytes,
}

impl KeyPersist {
    pub fn new(key: impl Into<Bytes>) -> Self {
        KeyPersist { key: key.into() }
    }
}

impl CacheCommand for KeyPersist {
    type Output = bool;
    const NAME: &'static str = "KeyPersist";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("PERSIST").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        reply.into_bool()
    }
}

/// PTTL key
///
/// Payload: remaining time to live; `None` for a missing key or one
/// without a timeout
#[derive(Debug, Clone, PartialEq)]
pub struct KeyTimeToLive {
    pub key: Bytes,
}

impl KeyTimeToLive {
    pub fn new(key: impl Into<Bytes>) -> Self {
        KeyTimeToLive { key: key.into() }
    }
}

impl CacheCommand for KeyTimeToLive {
    type Output = Option<Duration>;
    const NAME: &'static str = "KeyTimeToLive";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("PTTL").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<Duration>> {
        let millis = reply.into_integer()?;
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }
}

/// TYPE key
///
/// Payload: the canonical key type, `None` for a missing key or a type
/// with no canonical counterpart
#[derive(Debug, Clone, PartialEq)]
pub struct KeyTypeOf {
    pub key: Bytes,
}

impl KeyTypeOf {
    pub fn new(key: impl Into<Bytes>) -> Self {
        KeyTypeOf { key: key.into() }
    }
}

impl CacheCommand for KeyTypeOf {
    type Output = Option<KeyType>;
    const NAME: &'static str = "KeyType";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("TYPE").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<KeyType>> {
        let native = NativeKeyType::from_reply(&reply.into_text()?);
        Ok(key_type_from_native(&native))
    }
}

/// RENAME / RENAMENX key newkey
///
/// Payload: whether the key was renamed
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRename {
    pub key: Bytes,
    pub new_key: Bytes,
    pub when: When,
}

impl KeyRename {
    pub fn new(key: impl Into<Bytes>, new_key: impl Into<Bytes>) -> Self {
        KeyRename { key: key.into(), new_key: new_key.into(), when: When::Always }
    }

    pub fn when(mut self, when: When) -> Self {
        self.when = when;
        self
    }
}

impl CacheCommand for KeyRename {
    type Output = bool;
    const NAME: &'static str = "KeyRename";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let name = match self.when {
            When::Always => "RENAME",
            When::NotExists => "RENAMENX",
            When::Exists => return Err("rename does not support the 'exists' condition".to_string()),
        };
        Ok(Frame::command(name).key(&self.key).key(&self.new_key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        reply.into_bool()
    }
}

/// RANDOMKEY
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyRandom;

impl CacheCommand for KeyRandom {
    type Output = Option<Bytes>;
    const NAME: &'static str = "KeyRandom";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("RANDOMKEY").finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<Bytes>> {
        reply.into_bulk()
    }
}

/// MOVE key db
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMove {
    pub key: Bytes,
    pub database: u32,
}

impl KeyMove {
    pub fn new(key: impl Into<Bytes>, database: u32) -> Self {
        KeyMove { key: key.into(), database }
    }
}

impl CacheCommand for KeyMove {
    type Output = bool;
    const NAME: &'static str = "KeyMove";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("MOVE").key(&self.key).uint(self.database as u64).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<bool> {
        reply.into_bool()
    }
}

/// DUMP key
///
/// Payload: the serialized value, `None` for a missing key
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDump {
    pub key: Bytes,
}

impl KeyDump {
    pub fn new(key: impl Into<Bytes>) -> Self {
        KeyDump { key: key.into() }
    }
}

impl CacheCommand for KeyDump {
    type Output = Option<Bytes>;
    const NAME: &'static str = "KeyDump";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("DUMP").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Option<Bytes>> {
        reply.into_bulk()
    }
}

/// RESTORE key ttl-ms serialized-value (0 means no expiry)
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRestore {
    pub key: Bytes,
    pub value: Bytes,
    pub expiry: Option<Duration>,
}

impl KeyRestore {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>, expiry: Option<Duration>) -> Self {
        KeyRestore { key: key.into(), value: value.into(), expiry }
    }
}

impl CacheCommand for KeyRestore {
    type Output = ();
    const NAME: &'static str = "KeyRestore";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let ttl = self.expiry.map(millis).unwrap_or(0);
        Ok(Frame::command("RESTORE")
            .key(&self.key)
            .uint(ttl)
            .arg(self.value.clone())
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<()> {
        reply.into_ok()
    }
}

/// MIGRATE host port key db timeout-ms [COPY|REPLACE]
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMigrate {
    pub key: Bytes,
    pub host: String,
    pub port: u16,
    pub database: u32,
    pub timeout: Duration,
    pub option: MigrateOption,
}

impl KeyMigrate {
    pub fn new(key: impl Into<Bytes>, host: impl Into<String>, port: u16) -> Self {
        KeyMigrate {
            key: key.into(),
            host: host.into(),
            port,
            database: 0,
            timeout: Duration::from_secs(1),
            option: MigrateOption::None,
        }
    }

    pub fn database(mut self, database: u32) -> Self {
        self.database = database;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn option(mut self, option: MigrateOption) -> Self {
        self.option = option;
        self
    }
}

impl CacheCommand for KeyMigrate {
    type Output = ();
    const NAME: &'static str = "KeyMigrate";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("MIGRATE")
            .arg(self.host.clone())
            .uint(self.port as u64)
            .key(&self.key)
            .uint(self.database as u64)
            .uint(millis(self.timeout))
            .token(NativeMigrateMode::from(self.option).token())
            .finish())
    }

    /// `+NOKEY` is a status reply too and counts as done
    fn parse_reply(&self, reply: RespValue) -> Result<()> {
        reply.into_ok()
    }
}
