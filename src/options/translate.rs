//! Canonical ↔ native option translation
//!
//! One `From` impl per direction and enumeration. All matches are
//! exhaustive, so a canonical variant without a native counterpart is a
//! compile error rather than a silent fallthrough.

use super::{Aggregate, Bitwise, CommandFlags, Exclude, KeyType, MigrateOption, Order, SetOperation, SortType, When};
use crate::backend::native::{
    NativeAggregate, NativeBitOp, NativeBound, NativeCommandFlags, NativeCondition, NativeKeyType,
    NativeMigrateMode, NativeOrder, NativeRangeBounds, NativeSetOp, NativeSortType,
};

impl From<Order> for NativeOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Ascending => NativeOrder::Asc,
            Order::Descending => NativeOrder::Desc,
        }
    }
}

impl From<NativeOrder> for Order {
    fn from(order: NativeOrder) -> Self {
        match order {
            NativeOrder::Asc => Order::Ascending,
            NativeOrder::Desc => Order::Descending,
        }
    }
}

impl From<Exclude> for NativeRangeBounds {
    fn from(exclude: Exclude) -> Self {
        let (start, stop) = match exclude {
            Exclude::None => (NativeBound::Inclusive, NativeBound::Inclusive),
            Exclude::Start => (NativeBound::Exclusive, NativeBound::Inclusive),
            Exclude::Stop => (NativeBound::Inclusive, NativeBound::Exclusive),
            Exclude::Both => (NativeBound::Exclusive, NativeBound::Exclusive),
        };
        NativeRangeBounds { start, stop }
    }
}

impl From<NativeRangeBounds> for Exclude {
    fn from(bounds: NativeRangeBounds) -> Self {
        match (bounds.start, bounds.stop) {
            (NativeBound::Inclusive, NativeBound::Inclusive) => Exclude::None,
            (NativeBound::Exclusive, NativeBound::Inclusive) => Exclude::Start,
            (NativeBound::Inclusive, NativeBound::Exclusive) => Exclude::Stop,
            (NativeBound::Exclusive, NativeBound::Exclusive) => Exclude::Both,
        }
    }
}

impl From<SetOperation> for NativeSetOp {
    fn from(op: SetOperation) -> Self {
        match op {
            SetOperation::Union => NativeSetOp::Union,
            SetOperation::Intersect => NativeSetOp::Inter,
            SetOperation::Difference => NativeSetOp::Diff,
        }
    }
}

impl From<NativeSetOp> for SetOperation {
    fn from(op: NativeSetOp) -> Self {
        match op {
            NativeSetOp::Union => SetOperation::Union,
            NativeSetOp::Inter => SetOperation::Intersect,
            NativeSetOp::Diff => SetOperation::Difference,
        }
    }
}

impl From<Aggregate> for NativeAggregate {
    fn from(aggregate: Aggregate) -> Self {
        match aggregate {
            Aggregate::Sum => NativeAggregate::Sum,
            Aggregate::Min => NativeAggregate::Min,
            Aggregate::Max => NativeAggregate::Max,
        }
    }
}

impl From<NativeAggregate> for Aggregate {
    fn from(aggregate: NativeAggregate) -> Self {
        match aggregate {
            NativeAggregate::Sum => Aggregate::Sum,
            NativeAggregate::Min => Aggregate::Min,
            NativeAggregate::Max => Aggregate::Max,
        }
    }
}

impl From<CommandFlags> for NativeCommandFlags {
    fn from(flags: CommandFlags) -> Self {
        match flags {
            CommandFlags::None => NativeCommandFlags::None,
            CommandFlags::HighPriority => NativeCommandFlags::HighPriority,
            CommandFlags::FireAndForget => NativeCommandFlags::FireAndForget,
            CommandFlags::PreferMaster => NativeCommandFlags::PreferPrimary,
            CommandFlags::DemandMaster => NativeCommandFlags::DemandPrimary,
            CommandFlags::PreferReplica => NativeCommandFlags::PreferReplica,
            CommandFlags::DemandReplica => NativeCommandFlags::DemandReplica,
            CommandFlags::NoRedirect => NativeCommandFlags::NoRedirect,
        }
    }
}

impl From<NativeCommandFlags> for CommandFlags {
    fn from(flags: NativeCommandFlags) -> Self {
        match flags {
            NativeCommandFlags::None => CommandFlags::None,
            NativeCommandFlags::HighPriority => CommandFlags::HighPriority,
            NativeCommandFlags::FireAndForget => CommandFlags::FireAndForget,
            NativeCommandFlags::PreferPrimary => CommandFlags::PreferMaster,
            NativeCommandFlags::DemandPrimary => CommandFlags::DemandMaster,
            NativeCommandFlags::PreferReplica => CommandFlags::PreferReplica,
            NativeCommandFlags::DemandReplica => CommandFlags::DemandReplica,
            NativeCommandFlags::NoRedirect => CommandFlags::NoRedirect,
        }
    }
}

impl From<When> for NativeCondition {
    fn from(when: When) -> Self {
        match when {
            When::Always => NativeCondition::Unconditional,
            When::Exists => NativeCondition::Xx,
            When::NotExists => NativeCondition::Nx,
        }
    }
}

impl From<NativeCondition> for When {
    fn from(condition: NativeCondition) -> Self {
        match condition {
            NativeCondition::Unconditional => When::Always,
            NativeCondition::Xx => When::Exists,
            NativeCondition::Nx => When::NotExists,
        }
    }
}

impl From<Bitwise> for NativeBitOp {
    fn from(op: Bitwise) -> Self {
        match op {
            Bitwise::And => NativeBitOp::And,
            Bitwise::Or => NativeBitOp::Or,
            Bitwise::Xor => NativeBitOp::Xor,
            Bitwise::Not => NativeBitOp::Not,
        }
    }
}

impl From<NativeBitOp> for Bitwise {
    fn from(op: NativeBitOp) -> Self {
        match op {
            NativeBitOp::And => Bitwise::And,
            NativeBitOp::Or => Bitwise::Or,
            NativeBitOp::Xor => Bitwise::Xor,
            NativeBitOp::Not => Bitwise::Not,
        }
    }
}

impl From<SortType> for NativeSortType {
    fn from(sort: SortType) -> Self {
        match sort {
            SortType::Numeric => NativeSortType::Numeric,
            SortType::Alphabetic => NativeSortType::Alpha,
        }
    }
}

impl From<NativeSortType> for SortType {
    fn from(sort: NativeSortType) -> Self {
        match sort {
            NativeSortType::Numeric => SortType::Numeric,
            NativeSortType::Alpha => SortType::Alphabetic,
        }
    }
}

impl From<KeyType> for NativeKeyType {
    fn from(key_type: KeyType) -> Self {
        match key_type {
            KeyType::String => NativeKeyType::String,
            KeyType::List => NativeKeyType::List,
            KeyType::Hash => NativeKeyType::Hash,
            KeyType::Set => NativeKeyType::Set,
            KeyType::SortedSet => NativeKeyType::ZSet,
        }
    }
}

/// Native → canonical key type; `None` for types with no canonical kind
pub fn key_type_from_native(native: &NativeKeyType) -> Option<KeyType> {
    match native {
        NativeKeyType::String => Some(KeyType::String),
        NativeKeyType::List => Some(KeyType::List),
        NativeKeyType::Hash => Some(KeyType::Hash),
        NativeKeyType::Set => Some(KeyType::Set),
        NativeKeyType::ZSet => Some(KeyType::SortedSet),
        NativeKeyType::None | NativeKeyType::Stream | NativeKeyType::Unknown(_) => None,
    }
}

impl From<MigrateOption> for NativeMigrateMode {
    fn from(option: MigrateOption) -> Self {
        match option {
            MigrateOption::None => NativeMigrateMode::None,
            MigrateOption::Copy => NativeMigrateMode::Copy,
            MigrateOption::Replace => NativeMigrateMode::Replace,
        }
    }
}

impl From<NativeMigrateMode> for MigrateOption {
    fn from(mode: NativeMigrateMode) -> Self {
        match mode {
            NativeMigrateMode::None => MigrateOption::None,
            NativeMigrateMode::Copy => MigrateOption::Copy,
            NativeMigrateMode::Replace => MigrateOption::Replace,
        }
    }
}
