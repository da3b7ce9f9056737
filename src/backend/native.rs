//! Native option set of the store
//!
//! These mirror what the RESP command language accepts: keyword tokens,
//! bound prefixes, command names. Only the translator produces them from
//! canonical options.

use bytes::Bytes;

/// ASC / DESC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeOrder {
    Asc,
    Desc,
}

impl NativeOrder {
    pub fn token(self) -> &'static str {
        match self {
            NativeOrder::Asc => "ASC",
            NativeOrder::Desc => "DESC",
        }
    }
}

/// Inclusive or exclusive range endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeBound {
    Inclusive,
    Exclusive,
}

/// Start and stop endpoint kinds of one range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeRangeBounds {
    pub start: NativeBound,
    pub stop: NativeBound,
}

impl NativeRangeBounds {
    /// Score endpoint: `(1.5` when exclusive, `-inf`/`+inf` for infinities
    pub fn score(bound: NativeBound, value: f64) -> Bytes {
        let number = format_double(value);
        match bound {
            NativeBound::Inclusive => Bytes::from(number),
            NativeBound::Exclusive => Bytes::from(format!("({}", number)),
        }
    }

    /// Lexical endpoint: `[value` / `(value`, or `-` / `+` when unbounded
    pub fn lex(bound: NativeBound, value: Option<&[u8]>, is_start: bool) -> Bytes {
        match value {
            None if is_start => Bytes::from_static(b"-"),
            None => Bytes::from_static(b"+"),
            Some(raw) => {
                let prefix = match bound {
                    NativeBound::Inclusive => b'[',
                    NativeBound::Exclusive => b'(',
                };
                let mut out = Vec::with_capacity(raw.len() + 1);
                out.push(prefix);
                out.extend_from_slice(raw);
                Bytes::from(out)
            }
        }
    }
}

/// Double argument as the store reads it; infinities are `+inf` / `-inf`
pub fn format_double(value: f64) -> String {
    if value == f64::INFINITY {
        "+inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        value.to_string()
    }
}

/// Union / intersection / difference command names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeSetOp {
    Union,
    Inter,
    Diff,
}

impl NativeSetOp {
    /// SUNION, SINTER, SDIFF (with STORE suffix when storing)
    pub fn set_command(self, store: bool) -> &'static str {
        match (self, store) {
            (NativeSetOp::Union, false) => "SUNION",
            (NativeSetOp::Inter, false) => "SINTER",
            (NativeSetOp::Diff, false) => "SDIFF",
            (NativeSetOp::Union, true) => "SUNIONSTORE",
            (NativeSetOp::Inter, true) => "SINTERSTORE",
            (NativeSetOp::Diff, true) => "SDIFFSTORE",
        }
    }

    /// ZUNIONSTORE, ZINTERSTORE, ZDIFFSTORE
    pub fn sorted_set_store_command(self) -> &'static str {
        match self {
            NativeSetOp::Union => "ZUNIONSTORE",
            NativeSetOp::Inter => "ZINTERSTORE",
            NativeSetOp::Diff => "ZDIFFSTORE",
        }
    }
}

/// AGGREGATE SUM|MIN|MAX
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeAggregate {
    Sum,
    Min,
    Max,
}

impl NativeAggregate {
    pub fn token(self) -> &'static str {
        match self {
            NativeAggregate::Sum => "SUM",
            NativeAggregate::Min => "MIN",
            NativeAggregate::Max => "MAX",
        }
    }
}

/// Per-call hints handed to the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NativeCommandFlags {
    #[default]
    None,
    HighPriority,
    FireAndForget,
    PreferPrimary,
    DemandPrimary,
    PreferReplica,
    DemandReplica,
    NoRedirect,
}

/// Write condition keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCondition {
    Unconditional,
    Xx,
    Nx,
}

impl NativeCondition {
    /// `XX` / `NX`, or nothing for an unconditional write
    pub fn token(self) -> Option<&'static str> {
        match self {
            NativeCondition::Unconditional => None,
            NativeCondition::Xx => Some("XX"),
            NativeCondition::Nx => Some("NX"),
        }
    }
}

/// BITOP operator keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeBitOp {
    And,
    Or,
    Xor,
    Not,
}

impl NativeBitOp {
    pub fn token(self) -> &'static str {
        match self {
            NativeBitOp::And => "AND",
            NativeBitOp::Or => "OR",
            NativeBitOp::Xor => "XOR",
            NativeBitOp::Not => "NOT",
        }
    }
}

/// SORT comparison mode; only ALPHA has a keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeSortType {
    Numeric,
    Alpha,
}

impl NativeSortType {
    pub fn token(self) -> Option<&'static str> {
        match self {
            NativeSortType::Numeric => None,
            NativeSortType::Alpha => Some("ALPHA"),
        }
    }
}

/// TYPE reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeKeyType {
    None,
    String,
    List,
    Set,
    ZSet,
    Hash,
    Stream,
    Unknown(String),
}

impl NativeKeyType {
    pub fn from_reply(name: &str) -> Self {
        match name {
            "none" => NativeKeyType::None,
            "string" => NativeKeyType::String,
            "list" => NativeKeyType::List,
            "set" => NativeKeyType::Set,
            "zset" => NativeKeyType::ZSet,
            "hash" => NativeKeyType::Hash,
            "stream" => NativeKeyType::Stream,
            other => NativeKeyType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NativeKeyType::None => "none",
            NativeKeyType::String => "string",
            NativeKeyType::List => "list",
            NativeKeyType::Set => "set",
            NativeKeyType::ZSet => "zset",
            NativeKeyType::Hash => "hash",
            NativeKeyType::Stream => "stream",
            NativeKeyType::Unknown(name) => name,
        }
    }
}

/// MIGRATE modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeMigrateMode {
    None,
    Copy,
    Replace,
}

impl NativeMigrateMode {
    pub fn token(self) -> Option<&'static str> {
        match self {
            NativeMigrateMode::None => None,
            NativeMigrateMode::Copy => Some("COPY"),
            NativeMigrateMode::Replace => Some("REPLACE"),
        }
    }
}
