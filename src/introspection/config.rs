//! Typed view of the server's CONFIG settings
//!
//! Each setting is one row in [`SETTINGS`]: a reader that fills its field
//! from the raw CONFIG GET text and, for writable settings, a writer that
//! renders the field back to CONFIG SET text. Rows are applied in table
//! order. Parsing never fails: malformed numbers read as zero and unknown
//! enumerated values fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Verbose,
    #[default]
    Notice,
    Warning,
}

impl LogLevel {
    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "verbose",
            LogLevel::Notice => "notice",
            LogLevel::Warning => "warning",
        }
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "verbose" => LogLevel::Verbose,
            "notice" => LogLevel::Notice,
            "warning" => LogLevel::Warning,
            other => {
                warn!("Unknown loglevel '{}', using notice", other);
                LogLevel::default()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppendFsync {
    Always,
    #[default]
    Everysec,
    No,
}

impl AppendFsync {
    pub fn name(self) -> &'static str {
        match self {
            AppendFsync::Always => "always",
            AppendFsync::Everysec => "everysec",
            AppendFsync::No => "no",
        }
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "always" => AppendFsync::Always,
            "everysec" => AppendFsync::Everysec,
            "no" => AppendFsync::No,
            other => {
                warn!("Unknown appendfsync '{}', using everysec", other);
                AppendFsync::default()
            }
        }
    }
}

/// One `save <seconds> <changes>` snapshot rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SavePoint {
    pub seconds: u64,
    pub changes: u64,
}

/// Upstream this server replicates from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplicaOf {
    pub host: String,
    pub port: u16,
}

/// Known settings; anything else the server reports is ignored
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    pub daemonize: bool,
    pub pidfile: String,
    pub port: u16,
    pub bind: String,
    pub timeout: u64,
    pub loglevel: LogLevel,
    pub logfile: String,
    pub databases: u32,
    pub save: Vec<SavePoint>,
    pub stop_writes_on_bgsave_error: bool,
    pub rdbcompression: bool,
    pub rdbchecksum: bool,
    pub dbfilename: String,
    pub dir: String,
    pub slaveof: Option<ReplicaOf>,
    pub masterauth: String,
    pub slave_serve_stale_data: bool,
    pub slave_read_only: bool,
    pub requirepass: String,
    pub maxclients: u64,
    pub maxmemory: u64,
    pub maxmemory_policy: String,
    pub maxmemory_samples: u64,
    pub appendonly: bool,
    pub appendfsync: AppendFsync,
    pub no_appendfsync_on_rewrite: bool,
    pub auto_aof_rewrite_percentage: u64,
    pub auto_aof_rewrite_min_size: u64,
    pub lua_time_limit: i64,
    pub slowlog_log_slower_than: i64,
    pub slowlog_max_len: u64,
    pub hz: u64,
}

type Reader = fn(&mut ServerConfig, &str);
type Writer = fn(&ServerConfig) -> String;

pub(crate) struct Setting {
    pub name: &'static str,
    /// Names newer servers report for the same setting
    pub aliases: &'static [&'static str],
    pub read: Reader,
    /// `None` for settings that can only be changed at startup
    pub write: Option<Writer>,
}

impl Setting {
    fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

pub(crate) fn flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("yes")
}

pub(crate) fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

pub(crate) fn number<T: FromStr + Default>(value: &str) -> T {
    value.trim().parse().unwrap_or_default()
}

pub(crate) fn parse_save(value: &str) -> Vec<SavePoint> {
    let numbers: Vec<u64> = value.split_whitespace().map(number).collect();
    numbers
        .chunks_exact(2)
        .map(|pair| SavePoint { seconds: pair[0], changes: pair[1] })
        .collect()
}

pub(crate) fn render_save(points: &[SavePoint]) -> String {
    points
        .iter()
        .map(|p| format!("{} {}", p.seconds, p.changes))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn parse_replica_of(value: &str) -> Option<ReplicaOf> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(host), Some(port)) => Some(ReplicaOf { host: host.to_string(), port: number(port) }),
        _ => None,
    }
}

macro_rules! setting {
    ($name:literal, $field:ident, bool) => {
        setting!($name, [], $field, bool)
    };
    ($name:literal, [$($alias:literal),*], $field:ident, bool) => {
        Setting {
            name: $name,
            aliases: &[$($alias),*],
            read: |c, v| c.$field = flag(v),
            write: Some(|c| yes_no(c.$field)),
        }
    };
    ($name:literal, $field:ident, number) => {
        setting!($name, [], $field, number)
    };
    ($name:literal, [$($alias:literal),*], $field:ident, number) => {
        Setting {
            name: $name,
            aliases: &[$($alias),*],
            read: |c, v| c.$field = number(v),
            write: Some(|c| c.$field.to_string()),
        }
    };
    ($name:literal, $field:ident, text) => {
        Setting {
            name: $name,
            aliases: &[],
            read: |c, v| c.$field = v.to_string(),
            write: Some(|c| c.$field.clone()),
        }
    };
}

pub(crate) static SETTINGS: &[Setting] = &[
    Setting { name: "daemonize", aliases: &[], read: |c, v| c.daemonize = flag(v), write: None },
    Setting { name: "pidfile", aliases: &[], read: |c, v| c.pidfile = v.to_string(), write: None },
    Setting { name: "port", aliases: &[], read: |c, v| c.port = number(v), write: None },
    Setting { name: "bind", aliases: &[], read: |c, v| c.bind = v.to_string(), write: None },
    setting!("timeout", timeout, number),
    Setting {
        name: "loglevel",
        aliases: &[],
        read: |c, v| c.loglevel = LogLevel::parse(v),
        write: Some(|c| c.loglevel.name().to_string()),
    },
    Setting { name: "logfile", aliases: &[], read: |c, v| c.logfile = v.to_string(), write: None },
    Setting { name: "databases", aliases: &[], read: |c, v| c.databases = number(v), write: None },
    Setting {
        name: "save",
        aliases: &[],
        read: |c, v| c.save = parse_save(v),
        write: Some(|c| render_save(&c.save)),
    },
    setting!("stop-writes-on-bgsave-error", stop_writes_on_bgsave_error, bool),
    setting!("rdbcompression", rdbcompression, bool),
    setting!("rdbchecksum", rdbchecksum, bool),
    setting!("dbfilename", dbfilename, text),
    setting!("dir", dir, text),
    Setting {
        name: "slaveof",
        aliases: &["replicaof"],
        read: |c, v| c.slaveof = parse_replica_of(v),
        write: None,
    },
    setting!("masterauth", masterauth, text),
    setting!("slave-serve-stale-data", ["replica-serve-stale-data"], slave_serve_stale_data, bool),
    setting!("slave-read-only", ["replica-read-only"], slave_read_only, bool),
    setting!("requirepass", requirepass, text),
    setting!("maxclients", maxclients, number),
    setting!("maxmemory", maxmemory, number),
    setting!("maxmemory-policy", maxmemory_policy, text),
    setting!("maxmemory-samples", maxmemory_samples, number),
    setting!("appendonly", appendonly, bool),
    Setting {
        name: "appendfsync",
        aliases: &[],
        read: |c, v| c.appendfsync = AppendFsync::parse(v),
        write: Some(|c| c.appendfsync.name().to_string()),
    },
    setting!("no-appendfsync-on-rewrite", no_appendfsync_on_rewrite, bool),
    setting!("auto-aof-rewrite-percentage", auto_aof_rewrite_percentage, number),
    setting!("auto-aof-rewrite-min-size", auto_aof_rewrite_min_size, number),
    setting!("lua-time-limit", ["busy-reply-threshold"], lua_time_limit, number),
    setting!("slowlog-log-slower-than", slowlog_log_slower_than, number),
    setting!("slowlog-max-len", slowlog_max_len, number),
    setting!("hz", hz, number),
];

impl ServerConfig {
    /// Build from CONFIG GET name/value pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut config = ServerConfig::default();
        for (name, value) in pairs {
            if let Some(setting) = SETTINGS.iter().find(|s| s.matches(name)) {
                (setting.read)(&mut config, value);
            }
        }
        config
    }

    /// CONFIG SET pairs for every writable setting, in table order
    pub fn writable_pairs(&self) -> Vec<(&'static str, String)> {
        SETTINGS
            .iter()
            .filter_map(|s| s.write.map(|write| (s.name, write(self))))
            .collect()
    }

    /// Writable settings whose rendered value differs from `current`, in table order
    pub fn changes_from(&self, current: &ServerConfig) -> Vec<(&'static str, String)> {
        SETTINGS
            .iter()
            .filter_map(|s| {
                let write = s.write?;
                let wanted = write(self);
                (wanted != write(current)).then_some((s.name, wanted))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(config: &ServerConfig, name: &str) -> Option<String> {
        config
            .writable_pairs()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    #[test]
    fn test_table_is_complete_and_ordered() {
        assert_eq!(SETTINGS.len(), 32);
        assert_eq!(SETTINGS[0].name, "daemonize");
        assert_eq!(SETTINGS[31].name, "hz");

        let read_only: Vec<_> = SETTINGS.iter().filter(|s| s.write.is_none()).map(|s| s.name).collect();
        assert_eq!(
            read_only,
            ["daemonize", "pidfile", "port", "bind", "logfile", "databases", "slaveof"]
        );
    }

    #[test]
    fn test_parse_known_settings() {
        let config = ServerConfig::from_pairs([
            ("port", "6380"),
            ("appendonly", "yes"),
            ("loglevel", "warning"),
            ("save", "3600 1 300 100"),
            ("replicaof", "10.0.0.1 6379"),
            ("maxmemory", "lots"),
            ("appendfsync", "sometimes"),
            ("some-future-setting", "1"),
        ]);

        assert_eq!(config.port, 6380);
        assert!(config.appendonly);
        assert_eq!(config.loglevel, LogLevel::Warning);
        assert_eq!(
            config.save,
            vec![SavePoint { seconds: 3600, changes: 1 }, SavePoint { seconds: 300, changes: 100 }]
        );
        assert_eq!(config.slaveof, Some(ReplicaOf { host: "10.0.0.1".into(), port: 6379 }));
        assert_eq!(config.maxmemory, 0);
        assert_eq!(config.appendfsync, AppendFsync::Everysec);
    }

    #[test]
    fn test_appendonly_round_trip() {
        let config = ServerConfig { appendonly: true, ..Default::default() };
        let value = written(&config, "appendonly").unwrap();
        assert_eq!(value, "yes");
        assert!(ServerConfig::from_pairs([("appendonly", value.as_str())]).appendonly);
    }

    #[test]
    fn test_empty_save_round_trip() {
        let config = ServerConfig::default();
        let value = written(&config, "save").unwrap();
        assert_eq!(value, "");
        assert!(ServerConfig::from_pairs([("save", value.as_str())]).save.is_empty());
    }

    #[test]
    fn test_changes_skip_unchanged_and_read_only() {
        let current = ServerConfig::from_pairs([("hz", "10"), ("timeout", "0"), ("port", "6379")]);
        let wanted = ServerConfig { hz: 20, port: 7000, ..current.clone() };

        assert_eq!(wanted.changes_from(&current), vec![("hz", "20".to_string())]);
        assert!(current.changes_from(&current).is_empty());
    }

    #[test]
    fn test_read_only_settings_are_not_written() {
        let config = ServerConfig { port: 7000, ..Default::default() };
        assert_eq!(written(&config, "port"), None);
        assert_eq!(written(&config, "slaveof"), None);
        assert_eq!(written(&config, "hz").as_deref(), Some("0"));
        assert_eq!(ServerConfig::from_pairs([("slaveof", "")]).slaveof, None);
    }
}
