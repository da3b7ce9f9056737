//! Server commands (PING, INFO, DBSIZE, FLUSHDB, SCAN, CONFIG)
//!
//! FLUSHDB and the CONFIG commands are admin-only.

use super::{CacheCommand, Family, Frame};
use crate::error::{Error, Result};
use crate::protocol::RespValue;
use bytes::Bytes;
use serde::Serialize;

/// PING
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ping;

impl CacheCommand for Ping {
    type Output = String;
    const NAME: &'static str = "Ping";
    const FAMILY: Family = Family::Server;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("PING").finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<String> {
        reply.into_text()
    }
}

/// One `# Section` of an INFO reply
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct InfoSection {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

/// INFO [section]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Info {
    pub section: Option<String>,
}

impl Info {
    pub fn section(section: impl Into<String>) -> Self {
        Info { section: Some(section.into()) }
    }
}

fn parse_info(text: &str) -> Vec<InfoSection> {
    let mut sections: Vec<InfoSection> = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(name) = line.strip_prefix('#') {
            sections.push(InfoSection { name: name.trim().to_string(), entries: Vec::new() });
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            if sections.is_empty() {
                sections.push(InfoSection::default());
            }
            if let Some(section) = sections.last_mut() {
                section.entries.push((key.to_string(), value.to_string()));
            }
        }
    }
    sections
}

impl CacheCommand for Info {
    type Output = Vec<InfoSection>;
    const NAME: &'static str = "Info";
    const FAMILY: Family = Family::Server;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let frame = Frame::command("INFO");
        Ok(match &self.section {
            Some(section) => frame.arg(section.clone()),
            None => frame,
        }
        .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<InfoSection>> {
        Ok(parse_info(&reply.into_text()?))
    }
}

/// DBSIZE
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatabaseSize;

impl CacheCommand for DatabaseSize {
    type Output = i64;
    const NAME: &'static str = "DatabaseSize";
    const FAMILY: Family = Family::Server;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("DBSIZE").finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<i64> {
        reply.into_integer()
    }
}

/// FLUSHDB
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlushDatabase;

impl CacheCommand for FlushDatabase {
    type Output = ();
    const NAME: &'static str = "FlushDatabase";
    const FAMILY: Family = Family::Server;

    fn requires_admin(&self) -> bool {
        true
    }

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("FLUSHDB").finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<()> {
        reply.into_ok()
    }
}

/// One SCAN step
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanPage {
    /// 0 when the iteration is complete
    pub cursor: u64,
    pub keys: Vec<Bytes>,
}

/// SCAN cursor [MATCH pattern] [COUNT hint]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scan {
    pub cursor: u64,
    pub pattern: Option<String>,
    pub count: Option<u64>,
}

impl Scan {
    pub fn new(cursor: u64) -> Self {
        Scan { cursor, pattern: None, count: None }
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }
}

impl CacheCommand for Scan {
    type Output = ScanPage;
    const NAME: &'static str = "Scan";
    const FAMILY: Family = Family::Server;

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        let mut frame = Frame::command("SCAN").uint(self.cursor);
        if let Some(pattern) = &self.pattern {
            frame = frame.arg("MATCH").arg(pattern.clone());
        }
        if let Some(count) = self.count {
            frame = frame.arg("COUNT").uint(count);
        }
        Ok(frame.finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<ScanPage> {
        let mut parts = reply.into_array()?.into_iter();
        match (parts.next(), parts.next()) {
            (Some(cursor), Some(keys)) => {
                let cursor = cursor.into_text()?;
                let cursor = cursor
                    .parse::<u64>()
                    .map_err(|_| Error::unexpected("scan cursor", cursor))?;
                Ok(ScanPage { cursor, keys: keys.into_bulk_list()? })
            }
            _ => Err(Error::unexpected("[cursor, keys]", "short scan reply")),
        }
    }
}

/// CONFIG GET pattern
///
/// Payload: name/value pairs
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigGet {
    pub pattern: String,
}

impl ConfigGet {
    pub fn new(pattern: impl Into<String>) -> Self {
        ConfigGet { pattern: pattern.into() }
    }
}

impl CacheCommand for ConfigGet {
    type Output = Vec<(String, String)>;
    const NAME: &'static str = "ConfigGet";
    const FAMILY: Family = Family::Server;

    fn requires_admin(&self) -> bool {
        true
    }

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("CONFIG").arg("GET").arg(self.pattern.clone()).finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<Vec<(String, String)>> {
        Ok(reply
            .into_pairs()?
            .into_iter()
            .map(|(name, value)| {
                (
                    String::from_utf8_lossy(&name).into_owned(),
                    String::from_utf8_lossy(&value).into_owned(),
                )
            })
            .collect())
    }
}

/// CONFIG SET name value
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSet {
    pub name: String,
    pub value: String,
}

impl ConfigSet {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        ConfigSet { name: name.into(), value: value.into() }
    }
}

impl CacheCommand for ConfigSet {
    type Output = ();
    const NAME: &'static str = "ConfigSet";
    const FAMILY: Family = Family::Server;

    fn requires_admin(&self) -> bool {
        true
    }

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("CONFIG")
            .arg("SET")
            .arg(self.name.clone())
            .arg(self.value.clone())
            .finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<()> {
        reply.into_ok()
    }
}

/// CONFIG REWRITE
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigRewrite;

impl CacheCommand for ConfigRewrite {
    type Output = ();
    const NAME: &'static str = "ConfigRewrite";
    const FAMILY: Family = Family::Server;

    fn requires_admin(&self) -> bool {
        true
    }

    fn frame(&self) -> std::result::Result<Vec<Bytes>, String> {
        Ok(Frame::command("CONFIG").arg("REWRITE").finish())
    }

    fn parse_reply(&self, reply: RespValue) -> Result<()> {
        reply.into_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::frame_text;

    #[test]
    fn test_admin_commands() {
        assert!(FlushDatabase.requires_admin());
        assert!(ConfigGet::new("*").requires_admin());
        assert!(ConfigSet::new("hz", "10").requires_admin());
        assert!(ConfigRewrite.requires_admin());
        assert!(!Ping.requires_admin());
        assert!(!Scan::new(0).requires_admin());
    }

    #[test]
    fn test_scan_frame_and_reply() {
        let cmd = Scan::new(0).pattern("user:*").count(100);
        assert_eq!(frame_text(&cmd), "SCAN 0 MATCH user:* COUNT 100");

        let reply = RespValue::array(vec![
            RespValue::bulk_string("17"),
            RespValue::array(vec![RespValue::bulk_string("user:1"), RespValue::bulk_string("user:2")]),
        ]);
        let page = cmd.parse_reply(reply).unwrap();
        assert_eq!(page.cursor, 17);
        assert_eq!(page.keys.len(), 2);
    }

    #[test]
    fn test_info_sections() {
        let text = "# Server\r\nredis_version:7.2.4\r\nos:Linux\r\n\r\n# Keyspace\r\ndb0:keys=3,expires=0\r\n";
        let sections = Info::default()
            .parse_reply(RespValue::bulk_string(text))
            .unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "Server");
        assert_eq!(sections[0].entries[0], ("redis_version".to_string(), "7.2.4".to_string()));
        assert_eq!(sections[1].entries[0].1, "keys=3,expires=0");
    }

    #[test]
    fn test_config_get_pairs() {
        let reply = RespValue::array(vec![
            RespValue::bulk_string("maxmemory"),
            RespValue::bulk_string("0"),
        ]);
        let pairs = ConfigGet::new("max*").parse_reply(reply).unwrap();
        assert_eq!(pairs, vec![("maxmemory".to_string(), "0".to_string())]);
        assert_eq!(frame_text(&ConfigSet::new("save", "")), "CONFIG SET save ");
    }
}
