//! Server introspection for admin tooling
//!
//! Paged key listing, single-key inspection and typed server config, all
//! built from canonical commands sent through a [`Dispatcher`].

mod config;
mod paging;

pub use config::{AppendFsync, LogLevel, ReplicaOf, SavePoint, ServerConfig};
pub use paging::{KeyItem, KeyPage, MatchMode, PagingQuery};

use crate::backend::native::NativeKeyType;
use crate::commands::{
    CacheCommand, ConfigGet, ConfigRewrite, ConfigSet, DatabaseSize, Family, Frame, HashGetAll, KeyTimeToLive,
    ListRange, Ping, Response, Scan, SetMembers, SortedSetRangeByRankWithScores, StringGet,
};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::options::translate::key_type_from_native;
use crate::options::KeyType;
use crate::protocol::RespValue;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

type Step<T> = std::result::Result<T, String>;

/// TYPE with the native name kept, so `stream` and friends can be listed
struct RawKeyType {
    key: Bytes,
}

impl CacheCommand for RawKeyType {
    type Output = String;
    const NAME: &'static str = "KeyType";
    const FAMILY: Family = Family::Key;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("TYPE").key(&self.key).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<String> {
        reply.into_text()
    }
}

/// Everything known about one key
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KeyDetail {
    pub key: String,
    pub key_type: KeyType,
    /// Remaining time to live in milliseconds; `None` when persistent
    pub ttl_ms: Option<u64>,
    /// Text as JSON strings; non UTF-8 values base64 encoded
    pub value: Value,
}

pub struct Introspection {
    dispatcher: Dispatcher,
}

impl Introspection {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Introspection { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn health(&self) -> Response<String> {
        self.dispatcher.dispatch(Ping).await
    }

    /// One page of keys matching the query, with their types
    pub async fn list_keys(&self, query: &PagingQuery) -> Response<KeyPage> {
        wrap(self.collect_page(query).await)
    }

    /// Type, TTL and full value of one key
    pub async fn key_detail(&self, key: &str) -> Response<KeyDetail> {
        wrap(self.inspect(key).await)
    }

    /// Current server settings
    pub async fn config_get(&self) -> Response<ServerConfig> {
        wrap(self.current_config().await)
    }

    /// Bring the server in line with `config`, then persist with CONFIG REWRITE
    ///
    /// Only writable settings that differ from the live values are sent. The
    /// payload names them in the order applied.
    pub async fn config_set(&self, config: &ServerConfig) -> Response<Vec<String>> {
        wrap(self.update_config(config).await)
    }

    /// Like [`Introspection::config_set`], for a JSON object naming only the settings to change
    pub async fn config_patch(&self, patch: Value) -> Response<Vec<String>> {
        wrap(self.patch_config(patch).await)
    }

    async fn run<C: CacheCommand>(&self, command: C) -> Step<C::Output> {
        let response = self.dispatcher.dispatch(command).await;
        if response.success {
            Ok(response.payload)
        } else {
            Err(response.message.unwrap_or_else(|| format!("{} failed", C::NAME)))
        }
    }

    async fn collect_page(&self, query: &PagingQuery) -> Step<KeyPage> {
        let page = query.page.max(1);
        let mut items = Vec::new();

        if query.page_size > 0 {
            let glob = query.glob();
            let mut to_skip = query.skip();
            let mut cursor = 0;
            let mut keys = Vec::new();

            loop {
                let step = self
                    .run(Scan::new(cursor).pattern(glob.clone()).count(query.page_size.max(10)))
                    .await?;
                for key in step.keys {
                    if to_skip > 0 {
                        to_skip -= 1;
                    } else if (keys.len() as u64) < query.page_size {
                        keys.push(key);
                    }
                }
                cursor = step.cursor;
                if cursor == 0 || keys.len() as u64 >= query.page_size {
                    break;
                }
            }

            for key in keys {
                let key_type = self.run(RawKeyType { key: key.clone() }).await?;
                items.push(KeyItem {
                    key: String::from_utf8_lossy(&key).into_owned(),
                    key_type,
                });
            }
        }

        let total = self.run(DatabaseSize).await?;
        debug!("Listed {} keys on page {} of {}", items.len(), page, total);

        Ok(KeyPage {
            total,
            page,
            page_size: query.page_size,
            items,
        })
    }

    async fn inspect(&self, key: &str) -> Step<KeyDetail> {
        let name = self.run(RawKeyType { key: Bytes::copy_from_slice(key.as_bytes()) }).await?;
        let native = NativeKeyType::from_reply(&name);
        if native == NativeKeyType::None {
            return Err("key not found".to_string());
        }
        let key_type = key_type_from_native(&native)
            .ok_or_else(|| format!("unsupported key type '{}'", native.as_str()))?;

        let owned = key.to_string();
        let value = match key_type {
            KeyType::String => self.run(StringGet::new(owned)).await?.as_ref().map_or(Value::Null, text),
            KeyType::List => list(&self.run(ListRange::all(owned)).await?),
            KeyType::Set => list(&self.run(SetMembers::new(owned)).await?),
            KeyType::SortedSet => Value::Array(
                self.run(SortedSetRangeByRankWithScores::new(owned, 0, -1))
                    .await?
                    .iter()
                    .map(|(member, score)| json!({ "member": text(member), "score": score }))
                    .collect(),
            ),
            KeyType::Hash => Value::Object(
                self.run(HashGetAll::new(key.to_string()))
                    .await?
                    .iter()
                    .map(|(field, value)| (String::from_utf8_lossy(field).into_owned(), text(value)))
                    .collect::<Map<_, _>>(),
            ),
        };

        let ttl = self.run(KeyTimeToLive::new(key.to_string())).await?;

        Ok(KeyDetail {
            key: key.to_string(),
            key_type,
            ttl_ms: ttl.map(|d| d.as_millis() as u64),
            value,
        })
    }

    async fn current_config(&self) -> Step<ServerConfig> {
        let pairs = self.run(ConfigGet::new("*")).await?;
        Ok(ServerConfig::from_pairs(pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))))
    }

    async fn update_config(&self, config: &ServerConfig) -> Step<Vec<String>> {
        let current = self.current_config().await?;
        self.apply_changes(config.changes_from(&current)).await
    }

    async fn patch_config(&self, patch: Value) -> Step<Vec<String>> {
        let Value::Object(patch) = patch else {
            return Err("config update must be a JSON object".to_string());
        };
        let current = self.current_config().await?;
        let mut merged = match serde_json::to_value(&current) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err("config did not serialize to an object".to_string()),
            Err(e) => return Err(e.to_string()),
        };
        for (name, value) in patch {
            if !merged.contains_key(&name) {
                return Err(format!("unknown setting '{}'", name));
            }
            merged.insert(name, value);
        }
        let wanted: ServerConfig =
            serde_json::from_value(Value::Object(merged)).map_err(|e| format!("invalid config: {}", e))?;
        self.apply_changes(wanted.changes_from(&current)).await
    }

    /// SET each change in order; the first rejection aborts and reports what already went through
    async fn apply_changes(&self, changes: Vec<(&'static str, String)>) -> Step<Vec<String>> {
        if changes.is_empty() {
            debug!("Config already up to date");
            return Ok(Vec::new());
        }

        let mut applied = Vec::with_capacity(changes.len());
        for (name, value) in changes {
            if let Err(e) = self.run(ConfigSet::new(name, value)).await {
                let done = if applied.is_empty() {
                    "nothing applied".to_string()
                } else {
                    format!("already applied: {}", applied.join(", "))
                };
                return Err(format!("failed to set '{}': {}; {}", name, e, done));
            }
            applied.push(name.to_string());
        }
        self.run(ConfigRewrite).await?;
        debug!("Applied config changes: {:?}", applied);
        Ok(applied)
    }
}

fn wrap<T: Default>(step: Step<T>) -> Response<T> {
    match step {
        Ok(payload) => Response::ok(payload),
        Err(message) => Response::failure(message),
    }
}

fn text(bytes: &Bytes) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(s) => Value::String(s.to_string()),
        Err(_) => Value::String(STANDARD.encode(bytes)),
    }
}

fn list(items: &[Bytes]) -> Value {
    Value::Array(items.iter().map(text).collect())
}
