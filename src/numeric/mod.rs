//! Numeric coercion for increment/decrement
//!
//! The store only knows two arithmetic primitives: a signed 64-bit
//! increment and a double increment. Every supported target kind belongs
//! to exactly one of the two families; the family picks the primitive, the
//! amount is parsed for that primitive, and the primitive result is
//! coerced back into the target kind.

use crate::backend::native::format_double;
use crate::error::{Error, Result};
use crate::protocol::RespValue;
use bytes::Bytes;
use serde::Serialize;
use std::marker::PhantomData;
use tracing::debug;

/// Which primitive a kind is computed with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericFamily {
    Integral,
    Floating,
}

/// Value handed to or returned by one of the two primitives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Integral(i64),
    Floating(f64),
}

impl Primitive {
    /// Parse `amount` for `family`; unparsable text degrades to zero
    pub fn parse(family: NumericFamily, amount: &str) -> Self {
        let amount = amount.trim();
        match family {
            NumericFamily::Integral => Primitive::Integral(amount.parse().unwrap_or_else(|_| {
                debug!("amount '{}' is not an integer, using 0", amount);
                0
            })),
            NumericFamily::Floating => {
                let value = amount.parse::<f64>().ok().filter(|v| v.is_finite());
                Primitive::Floating(value.unwrap_or_else(|| {
                    debug!("amount '{}' is not a number, using 0", amount);
                    0.0
                }))
            }
        }
    }

    fn negate(self) -> Self {
        match self {
            Primitive::Integral(v) => Primitive::Integral(v.saturating_neg()),
            Primitive::Floating(v) => Primitive::Floating(-v),
        }
    }

    fn to_arg(self) -> Bytes {
        match self {
            Primitive::Integral(v) => Bytes::from(v.to_string()),
            Primitive::Floating(v) => Bytes::from(format_double(v)),
        }
    }

    fn read(family: NumericFamily, reply: RespValue) -> Result<Self> {
        match family {
            NumericFamily::Integral => reply.into_integer().map(Primitive::Integral),
            NumericFamily::Floating => reply.into_double().map(Primitive::Floating),
        }
    }
}

/// Rust types usable as increment targets
pub trait CacheNumeric: Copy + Default + Send + Sync + 'static {
    const FAMILY: NumericFamily;

    fn from_integral(value: i64) -> Self;
    fn from_floating(value: f64) -> Self;

    fn from_primitive(value: Primitive) -> Self {
        match value {
            Primitive::Integral(v) => Self::from_integral(v),
            Primitive::Floating(v) => Self::from_floating(v),
        }
    }
}

macro_rules! clamped_integral {
    ($($ty:ty),+) => {
        $(
            impl CacheNumeric for $ty {
                const FAMILY: NumericFamily = NumericFamily::Integral;

                fn from_integral(value: i64) -> Self {
                    value.clamp(<$ty>::MIN as i64, <$ty>::MAX as i64) as $ty
                }

                fn from_floating(value: f64) -> Self {
                    Self::from_integral(value as i64)
                }
            }
        )+
    };
}

clamped_integral!(u8, i8, i16, u16, i32, u32);

impl CacheNumeric for i64 {
    const FAMILY: NumericFamily = NumericFamily::Integral;

    fn from_integral(value: i64) -> Self {
        value
    }

    fn from_floating(value: f64) -> Self {
        value as i64
    }
}

impl CacheNumeric for u64 {
    const FAMILY: NumericFamily = NumericFamily::Integral;

    fn from_integral(value: i64) -> Self {
        value.max(0) as u64
    }

    fn from_floating(value: f64) -> Self {
        value as u64
    }
}

impl CacheNumeric for bool {
    const FAMILY: NumericFamily = NumericFamily::Integral;

    fn from_integral(value: i64) -> Self {
        value != 0
    }

    fn from_floating(value: f64) -> Self {
        value != 0.0
    }
}

impl CacheNumeric for char {
    const FAMILY: NumericFamily = NumericFamily::Integral;

    fn from_integral(value: i64) -> Self {
        u32::try_from(value)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or('\0')
    }

    fn from_floating(value: f64) -> Self {
        Self::from_integral(value as i64)
    }
}

impl CacheNumeric for f64 {
    const FAMILY: NumericFamily = NumericFamily::Floating;

    fn from_integral(value: i64) -> Self {
        value as f64
    }

    fn from_floating(value: f64) -> Self {
        value
    }
}

impl CacheNumeric for f32 {
    const FAMILY: NumericFamily = NumericFamily::Floating;

    fn from_integral(value: i64) -> Self {
        value as f32
    }

    fn from_floating(value: f64) -> Self {
        value as f32
    }
}

/// Target kinds callers can name as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Boolean,
    Byte,
    SignedByte,
    Char,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Decimal,
    Double,
    Float,
}

impl NumericKind {
    pub const ALL: &'static [NumericKind] = &[
        NumericKind::Boolean,
        NumericKind::Byte,
        NumericKind::SignedByte,
        NumericKind::Char,
        NumericKind::Int16,
        NumericKind::UInt16,
        NumericKind::Int32,
        NumericKind::UInt32,
        NumericKind::Int64,
        NumericKind::UInt64,
        NumericKind::Decimal,
        NumericKind::Double,
        NumericKind::Float,
    ];

    /// Case-insensitive lookup; `None` for kinds outside the supported set
    pub fn parse(name: &str) -> Option<Self> {
        let kind = match name.trim().to_ascii_lowercase().as_str() {
            "boolean" | "bool" => NumericKind::Boolean,
            "byte" | "u8" => NumericKind::Byte,
            "sbyte" | "signed_byte" | "i8" => NumericKind::SignedByte,
            "char" => NumericKind::Char,
            "int16" | "short" | "i16" => NumericKind::Int16,
            "uint16" | "ushort" | "u16" => NumericKind::UInt16,
            "int32" | "int" | "i32" => NumericKind::Int32,
            "uint32" | "uint" | "u32" => NumericKind::UInt32,
            "int64" | "long" | "i64" => NumericKind::Int64,
            "uint64" | "ulong" | "u64" => NumericKind::UInt64,
            "decimal" => NumericKind::Decimal,
            "double" | "f64" => NumericKind::Double,
            "float" | "single" | "f32" => NumericKind::Float,
            _ => return None,
        };
        Some(kind)
    }

    pub fn family(self) -> NumericFamily {
        match self {
            NumericKind::Decimal | NumericKind::Double | NumericKind::Float => NumericFamily::Floating,
            _ => NumericFamily::Integral,
        }
    }

    /// Coerce a primitive result into this kind
    pub fn coerce(self, value: Primitive) -> NumericValue {
        match self {
            NumericKind::Boolean => NumericValue::Boolean(bool::from_primitive(value)),
            NumericKind::Char => NumericValue::Char(char::from_primitive(value)),
            NumericKind::Byte => NumericValue::Unsigned(u8::from_primitive(value) as u64),
            NumericKind::SignedByte => NumericValue::Signed(i8::from_primitive(value) as i64),
            NumericKind::Int16 => NumericValue::Signed(i16::from_primitive(value) as i64),
            NumericKind::UInt16 => NumericValue::Unsigned(u16::from_primitive(value) as u64),
            NumericKind::Int32 => NumericValue::Signed(i32::from_primitive(value) as i64),
            NumericKind::UInt32 => NumericValue::Unsigned(u32::from_primitive(value) as u64),
            NumericKind::Int64 => NumericValue::Signed(i64::from_primitive(value)),
            NumericKind::UInt64 => NumericValue::Unsigned(u64::from_primitive(value)),
            NumericKind::Decimal | NumericKind::Double => NumericValue::Floating(f64::from_primitive(value)),
            NumericKind::Float => NumericValue::Floating(f32::from_primitive(value) as f64),
        }
    }
}

/// Result of a kind-by-name increment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NumericValue {
    Boolean(bool),
    Char(char),
    Signed(i64),
    Unsigned(u64),
    Floating(f64),
}

impl Default for NumericValue {
    fn default() -> Self {
        NumericValue::Signed(0)
    }
}

/// What an increment command coerces its result into
pub trait NumericTarget: Send + Sync + 'static {
    type Value: Default + Send + 'static;

    /// Family of the target; `None` when it is not a supported kind
    fn resolve(&self) -> Option<NumericFamily>;

    fn convert(&self, value: Primitive) -> Self::Value;

    /// Name used in failure messages
    fn label(&self) -> String;
}

/// Statically typed target
pub struct Typed<T>(PhantomData<fn() -> T>);

/// Target for the Rust type `T`
pub fn typed<T: CacheNumeric>() -> Typed<T> {
    Typed(PhantomData)
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self {
        Typed(PhantomData)
    }
}

impl<T> std::fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Typed<{}>", std::any::type_name::<T>())
    }
}

impl<T: CacheNumeric> NumericTarget for Typed<T> {
    type Value = T;

    fn resolve(&self) -> Option<NumericFamily> {
        Some(T::FAMILY)
    }

    fn convert(&self, value: Primitive) -> T {
        T::from_primitive(value)
    }

    fn label(&self) -> String {
        std::any::type_name::<T>().to_string()
    }
}

impl NumericTarget for NumericKind {
    type Value = NumericValue;

    fn resolve(&self) -> Option<NumericFamily> {
        Some(self.family())
    }

    fn convert(&self, value: Primitive) -> NumericValue {
        self.coerce(value)
    }

    fn label(&self) -> String {
        format!("{:?}", self)
    }
}

/// Target named as text, resolved when the command is framed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedKind(pub String);

impl NumericTarget for NamedKind {
    type Value = NumericValue;

    fn resolve(&self) -> Option<NumericFamily> {
        NumericKind::parse(&self.0).map(NumericKind::family)
    }

    fn convert(&self, value: Primitive) -> NumericValue {
        match NumericKind::parse(&self.0) {
            Some(kind) => kind.coerce(value),
            None => NumericValue::default(),
        }
    }

    fn label(&self) -> String {
        self.0.clone()
    }
}

/// Where the counter lives
#[derive(Debug, Clone, Copy)]
pub(crate) enum Counter<'a> {
    String { key: &'a Bytes },
    Hash { key: &'a Bytes, field: &'a Bytes },
}

fn resolve(target: &impl NumericTarget) -> std::result::Result<NumericFamily, String> {
    target
        .resolve()
        .ok_or_else(|| format!("unsupported numeric kind '{}'", target.label()))
}

/// Frame for an increment (or, with `negate`, a decrement) of `counter`
pub(crate) fn frame(
    target: &impl NumericTarget,
    counter: Counter<'_>,
    amount: &str,
    negate: bool,
) -> std::result::Result<Vec<Bytes>, String> {
    let family = resolve(target)?;
    let amount = Primitive::parse(family, amount);

    let frame = match (counter, family) {
        (Counter::String { key }, NumericFamily::Integral) => {
            let name = if negate { "DECRBY" } else { "INCRBY" };
            vec![Bytes::from_static(name.as_bytes()), key.clone(), amount.to_arg()]
        }
        (Counter::String { key }, NumericFamily::Floating) => {
            let amount = if negate { amount.negate() } else { amount };
            vec![Bytes::from_static(b"INCRBYFLOAT"), key.clone(), amount.to_arg()]
        }
        (Counter::Hash { key, field }, family) => {
            let amount = if negate { amount.negate() } else { amount };
            let name: &'static [u8] = match family {
                NumericFamily::Integral => b"HINCRBY",
                NumericFamily::Floating => b"HINCRBYFLOAT",
            };
            vec![Bytes::from_static(name), key.clone(), field.clone(), amount.to_arg()]
        }
    };
    Ok(frame)
}

/// Read the primitive reply and coerce it into the target
pub(crate) fn read<N: NumericTarget>(target: &N, reply: RespValue) -> Result<N::Value> {
    let family = target
        .resolve()
        .ok_or_else(|| Error::InvalidArgument("unsupported numeric kind".to_string()))?;
    Ok(target.convert(Primitive::read(family, reply)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(frame: &[Bytes]) -> Vec<String> {
        frame.iter().map(|b| String::from_utf8_lossy(b).into_owned()).collect()
    }

    #[test]
    fn test_every_kind_takes_its_family() {
        let floating = [NumericKind::Decimal, NumericKind::Double, NumericKind::Float];
        for kind in NumericKind::ALL {
            let expected = if floating.contains(kind) {
                NumericFamily::Floating
            } else {
                NumericFamily::Integral
            };
            assert_eq!(kind.family(), expected, "{:?}", kind);
        }
        assert_eq!(<bool as CacheNumeric>::FAMILY, NumericFamily::Integral);
        assert_eq!(<char as CacheNumeric>::FAMILY, NumericFamily::Integral);
        assert_eq!(<f32 as CacheNumeric>::FAMILY, NumericFamily::Floating);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(NumericKind::parse("Int32"), Some(NumericKind::Int32));
        assert_eq!(NumericKind::parse(" DECIMAL "), Some(NumericKind::Decimal));
        assert_eq!(NumericKind::parse("guid"), None);
    }

    #[test]
    fn test_string_frames_per_family() {
        let key = Bytes::from("hits");
        let counter = Counter::String { key: &key };

        let frame = frame(&typed::<i32>(), counter, "5", false).unwrap();
        assert_eq!(names(&frame), ["INCRBY", "hits", "5"]);

        let frame = super::frame(&typed::<u64>(), counter, "5", true).unwrap();
        assert_eq!(names(&frame), ["DECRBY", "hits", "5"]);

        let frame = super::frame(&typed::<f64>(), counter, "1.5", true).unwrap();
        assert_eq!(names(&frame), ["INCRBYFLOAT", "hits", "-1.5"]);
    }

    #[test]
    fn test_hash_frames_negate_for_decrement() {
        let key = Bytes::from("stats");
        let field = Bytes::from("views");
        let counter = Counter::Hash { key: &key, field: &field };

        let frame = frame(&NumericKind::Int64, counter, "3", true).unwrap();
        assert_eq!(names(&frame), ["HINCRBY", "stats", "views", "-3"]);

        let frame = super::frame(&NumericKind::Float, counter, "0.25", false).unwrap();
        assert_eq!(names(&frame), ["HINCRBYFLOAT", "stats", "views", "0.25"]);
    }

    #[test]
    fn test_unparsable_amount_is_zero() {
        assert_eq!(Primitive::parse(NumericFamily::Integral, "ten"), Primitive::Integral(0));
        assert_eq!(Primitive::parse(NumericFamily::Integral, "1.5"), Primitive::Integral(0));
        assert_eq!(Primitive::parse(NumericFamily::Floating, "nan"), Primitive::Floating(0.0));
        assert_eq!(Primitive::parse(NumericFamily::Floating, " 2.5 "), Primitive::Floating(2.5));
    }

    #[test]
    fn test_unsupported_kind_is_rejected() {
        let key = Bytes::from("hits");
        let target = NamedKind("guid".to_string());
        let err = frame(&target, Counter::String { key: &key }, "1", false).unwrap_err();
        assert!(err.contains("guid"));
    }

    #[test]
    fn test_integral_results_clamp() {
        assert_eq!(u8::from_integral(300), 255);
        assert_eq!(u8::from_integral(-4), 0);
        assert_eq!(i8::from_integral(-200), -128);
        assert_eq!(u64::from_integral(-1), 0);
        assert!(bool::from_integral(2));
        assert!(!bool::from_integral(0));
        assert_eq!(char::from_integral(65), 'A');
        assert_eq!(char::from_integral(-1), '\0');
        assert_eq!(char::from_integral(0xD800), '\0');
    }

    #[test]
    fn test_read_coerces_reply() {
        assert_eq!(read(&typed::<u16>(), RespValue::integer(70_000)).unwrap(), u16::MAX);
        assert_eq!(read(&typed::<f32>(), RespValue::bulk_string("2.5")).unwrap(), 2.5f32);
        assert_eq!(
            read(&NamedKind("decimal".into()), RespValue::bulk_string("10.75")).unwrap(),
            NumericValue::Floating(10.75)
        );
        assert_eq!(
            read(&NumericKind::Boolean, RespValue::integer(1)).unwrap(),
            NumericValue::Boolean(true)
        );
    }
}
