//! Canonical option enumerations
//!
//! These are the backend-agnostic options callers put on commands. The
//! [`translate`] module maps each of them onto the store's native options.
//!
//! Every enumeration has a default. The default is what a value arriving
//! as text degrades to when the name is not recognized (see
//! `from_name_lossy`); the typed API itself never hits it.

pub mod translate;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Sort direction for ranges and SORT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

/// Which ends of a range are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclude {
    #[default]
    None,
    Start,
    Stop,
    Both,
}

/// Set algebra over several keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOperation {
    #[default]
    Union,
    Intersect,
    Difference,
}

/// How scores are combined by sorted-set union/intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    #[default]
    Sum,
    Min,
    Max,
}

/// Priority and routing hints carried by every request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandFlags {
    #[default]
    None,
    HighPriority,
    FireAndForget,
    PreferMaster,
    DemandMaster,
    PreferReplica,
    DemandReplica,
    NoRedirect,
}

/// Condition attached to a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum When {
    #[default]
    Always,
    Exists,
    NotExists,
}

/// BITOP operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bitwise {
    #[default]
    And,
    Or,
    Xor,
    Not,
}

/// How SORT compares elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    #[default]
    Numeric,
    Alphabetic,
}

/// The five data-structure kinds a key can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    #[default]
    String,
    List,
    Hash,
    Set,
    SortedSet,
}

/// MIGRATE behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrateOption {
    #[default]
    None,
    Copy,
    Replace,
}

/// Parse a canonical option name, falling back to the enumeration default
fn lossy<T: Default + Copy>(kind: &'static str, name: &str, table: &[(&str, T)]) -> T {
    let wanted = name.trim();
    match table.iter().find(|(candidate, _)| candidate.eq_ignore_ascii_case(wanted)) {
        Some((_, value)) => *value,
        None => {
            warn!("unrecognized {} '{}', using default", kind, name);
            T::default()
        }
    }
}

macro_rules! named_options {
    ($ty:ident, $kind:literal, [$(($name:literal, $variant:ident)),+ $(,)?]) => {
        impl $ty {
            /// Every variant, in declaration order
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Canonical name of the variant
            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }

            /// Parse a name case-insensitively, degrading to the default
            pub fn from_name_lossy(name: &str) -> Self {
                lossy($kind, name, &[$(($name, $ty::$variant)),+])
            }
        }
    };
}

named_options!(Order, "order", [("ascending", Ascending), ("descending", Descending)]);
named_options!(Exclude, "exclude", [("none", None), ("start", Start), ("stop", Stop), ("both", Both)]);
named_options!(SetOperation, "set operation", [
    ("union", Union),
    ("intersect", Intersect),
    ("difference", Difference),
]);
named_options!(Aggregate, "aggregate", [("sum", Sum), ("min", Min), ("max", Max)]);
named_options!(CommandFlags, "command flags", [
    ("none", None),
    ("high_priority", HighPriority),
    ("fire_and_forget", FireAndForget),
    ("prefer_master", PreferMaster),
    ("demand_master", DemandMaster),
    ("prefer_replica", PreferReplica),
    ("demand_replica", DemandReplica),
    ("no_redirect", NoRedirect),
]);
named_options!(When, "when", [("always", Always), ("exists", Exists), ("not_exists", NotExists)]);
named_options!(Bitwise, "bitwise", [("and", And), ("or", Or), ("xor", Xor), ("not", Not)]);
named_options!(SortType, "sort type", [("numeric", Numeric), ("alphabetic", Alphabetic)]);
named_options!(KeyType, "key type", [
    ("string", String),
    ("list", List),
    ("hash", Hash),
    ("set", Set),
    ("sorted_set", SortedSet),
]);
named_options!(MigrateOption, "migrate option", [("none", None), ("copy", Copy), ("replace", Replace)]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lossy_parse_accepts_any_case() {
        assert_eq!(Order::from_name_lossy("DESCENDING"), Order::Descending);
        assert_eq!(When::from_name_lossy(" not_exists "), When::NotExists);
        assert_eq!(KeyType::from_name_lossy("sorted_set"), KeyType::SortedSet);
    }

    #[test]
    fn test_unrecognized_names_degrade_to_documented_defaults() {
        assert_eq!(Order::from_name_lossy("sideways"), Order::Ascending);
        assert_eq!(Exclude::from_name_lossy("middle"), Exclude::None);
        assert_eq!(SetOperation::from_name_lossy("xor"), SetOperation::Union);
        assert_eq!(Aggregate::from_name_lossy("avg"), Aggregate::Sum);
        assert_eq!(CommandFlags::from_name_lossy("urgent"), CommandFlags::None);
        assert_eq!(When::from_name_lossy("sometimes"), When::Always);
        assert_eq!(Bitwise::from_name_lossy("nand"), Bitwise::And);
        assert_eq!(SortType::from_name_lossy("random"), SortType::Numeric);
        assert_eq!(KeyType::from_name_lossy("stream"), KeyType::String);
        assert_eq!(MigrateOption::from_name_lossy("move"), MigrateOption::None);
    }

    #[test]
    fn test_names_round_trip() {
        for flag in CommandFlags::ALL {
            assert_eq!(CommandFlags::from_name_lossy(flag.name()), *flag);
        }
    }

    #[test]
    fn test_serde_names_match_canonical_names() {
        let json = serde_json::to_string(&MigrateOption::Replace).unwrap();
        assert_eq!(json, "\"replace\"");
        let parsed: KeyType = serde_json::from_str("\"sorted_set\"").unwrap();
        assert_eq!(parsed, KeyType::SortedSet);
    }
}
