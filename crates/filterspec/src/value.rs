//! Runtime values extracted from records and filters.
//!
//! The [`Value`] enum is what a [`FieldAccess`] implementation hands back for
//! a field name. Compiled specifications only ever compare `Value`s, which
//! keeps the comparison code independent of the concrete record types.

use std::cmp::Ordering;
use std::fmt;

use crate::traits::FieldAccess;

/// Runtime value of a field, borrowed from the source struct.
///
/// # Example
///
/// ```
/// use filterspec::{FieldAccess, Number, Value};
///
/// struct Person {
///     name: String,
///     age: u8,
/// }
///
/// impl FieldAccess for Person {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "name" => Value::String(&self.name),
///             "age" => Value::Number(Number::U64(self.age as u64)),
///             _ => Value::None,
///         }
///     }
/// }
/// ```
#[derive(Clone)]
pub enum Value<'a> {
    /// String value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Timestamp value (milliseconds since Unix epoch).
    Timestamp(Timestamp),
    /// Enum discriminant value.
    Enum(u32),
    /// Boolean value.
    Bool(bool),
    /// Elements of a collection field.
    List(Vec<Value<'a>>),
    /// A nested record, traversable by field name.
    Record(&'a dyn FieldAccess),
    /// Absent optional, or a field the record does not expose.
    None,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `None` value.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns `true` if this is a `String` value.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns `true` if this is a `List` value.
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the timestamp value, if present.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Extracts the list elements, if present.
    pub fn as_list(&self) -> Option<&[Value<'a>]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Extracts the nested record, if present.
    pub fn as_record(&self) -> Option<&'a dyn FieldAccess> {
        match self {
            Value::Record(r) => Some(*r),
            _ => None,
        }
    }

    /// Returns `true` if the value equals its type's default.
    ///
    /// Empty strings, zero numbers, the blank timestamp, discriminant 0,
    /// `false`, empty lists and `None` are defaults. A record is default when
    /// every one of its fields is.
    pub fn is_default(&self) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            Value::Number(n) => n.is_zero(),
            Value::Timestamp(t) => t.is_blank(),
            Value::Enum(d) => *d == 0,
            Value::Bool(b) => !b,
            Value::List(items) => items.is_empty(),
            Value::Record(r) => r.all_fields_default(),
            Value::None => true,
        }
    }

    /// Value equality used by compiled comparisons.
    ///
    /// Two absent values are equal; an absent value never equals a present
    /// one. Numbers compare by value, records by identity.
    pub fn same_as(&self, other: &Value<'_>) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.compare(*b) == Some(Ordering::Equal),
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same_as(y))
            }
            (Value::Record(a), Value::Record(b)) => std::ptr::addr_eq(*a, *b),
            (Value::None, Value::None) => true,
            _ => false,
        }
    }

    /// Ordering between two present scalars of the same class.
    ///
    /// Strings order ordinally (byte-wise). Returns `None` for absent values,
    /// mismatched classes and NaN.
    pub fn compare(&self, other: &Value<'_>) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Number(a), Value::Number(b)) => a.compare(*b),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Returns a short name for the value class, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Timestamp(_) => "timestamp",
            Value::Enum(_) => "enum",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Record(_) => "record",
            Value::None => "none",
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Timestamp(t) => f.debug_tuple("Timestamp").field(t).finish(),
            Value::Enum(d) => f.debug_tuple("Enum").field(d).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Record(_) => f.write_str("Record(..)"),
            Value::None => f.write_str("None"),
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            _ => self.same_as(other),
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision:
/// - `I64` for signed integers
/// - `U64` for unsigned integers
/// - `F64` for floating point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Compares two numbers, handling mixed representations.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    /// Returns `true` for zero in any representation.
    pub fn is_zero(self) -> bool {
        match self {
            Number::I64(n) => n == 0,
            Number::U64(n) => n == 0,
            Number::F64(n) => n == 0.0,
        }
    }

    /// Returns `true` when strictly greater than zero. NaN is not positive.
    pub fn is_positive(self) -> bool {
        match self {
            Number::I64(n) => n > 0,
            Number::U64(n) => n > 0,
            Number::F64(n) => n > 0.0,
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

macro_rules! number_from {
    ($variant:ident, $target:ty: $($source:ty),*) => {
        $(
            impl From<$source> for Number {
                fn from(n: $source) -> Self {
                    Number::$variant(n as $target)
                }
            }
        )*
    };
}

number_from!(I64, i64: i8, i16, i32, i64, isize);
number_from!(U64, u64: u8, u16, u32, u64, usize);
number_from!(F64, f64: f32, f64);

/// Timestamp value represented as milliseconds since Unix epoch.
///
/// The default, `Timestamp(0)`, is the blank sentinel: a filter timestamp
/// equal to it counts as "not set".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// The blank sentinel.
    pub const BLANK: Timestamp = Timestamp(0);

    /// Creates a new timestamp from milliseconds since Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Creates a new timestamp from seconds since Unix epoch. Saturates at
    /// the representable range.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1000))
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns `true` if this is the blank sentinel.
    pub fn is_blank(self) -> bool {
        self == Self::BLANK
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair {
        left: i64,
        right: String,
    }

    impl FieldAccess for Pair {
        fn field_value(&self, field: &str) -> Value<'_> {
            match field {
                "left" => Value::Number(Number::I64(self.left)),
                "right" => Value::String(&self.right),
                _ => Value::None,
            }
        }

        fn all_fields_default(&self) -> bool {
            self.left == 0 && self.right.is_empty()
        }
    }

    #[test]
    fn defaults_per_class() {
        assert!(Value::String("").is_default());
        assert!(!Value::String(" ").is_default());
        assert!(Value::Number(Number::F64(0.0)).is_default());
        assert!(Value::Timestamp(Timestamp::BLANK).is_default());
        assert!(Value::Enum(0).is_default());
        assert!(!Value::Enum(2).is_default());
        assert!(Value::Bool(false).is_default());
        assert!(Value::List(vec![]).is_default());
        assert!(Value::None.is_default());
    }

    #[test]
    fn record_default_is_structural() {
        let empty = Pair {
            left: 0,
            right: String::new(),
        };
        let set = Pair {
            left: 0,
            right: "x".to_string(),
        };
        assert!(Value::Record(&empty).is_default());
        assert!(!Value::Record(&set).is_default());
    }

    #[test]
    fn absent_values_are_equal_to_each_other_only() {
        assert!(Value::None.same_as(&Value::None));
        assert!(!Value::None.same_as(&Value::Number(Number::I64(0))));
        assert!(!Value::String("a").same_as(&Value::None));
    }

    #[test]
    fn mixed_number_equality() {
        assert!(Value::Number(Number::I64(5)).same_as(&Value::Number(Number::F64(5.0))));
        assert!(!Value::Number(Number::U64(5)).same_as(&Value::Number(Number::I64(6))));
    }

    #[test]
    fn ordering_requires_same_class() {
        assert_eq!(
            Value::String("a").compare(&Value::String("b")),
            Some(Ordering::Less)
        );
        assert_eq!(Value::String("a").compare(&Value::None), None);
        assert_eq!(
            Value::Number(Number::F64(f64::NAN)).compare(&Value::Number(Number::F64(1.0))),
            None
        );
    }

    #[test]
    fn number_sign_checks() {
        assert!(Number::I64(1).is_positive());
        assert!(!Number::I64(0).is_positive());
        assert!(!Number::I64(-3).is_positive());
        assert!(!Number::F64(f64::NAN).is_positive());
        assert!(Number::U64(0).is_zero());
    }

    #[test]
    fn number_conversions() {
        assert_eq!(Number::from(42i32), Number::I64(42));
        assert_eq!(Number::from(42u32), Number::U64(42));
        assert_eq!(Number::from(42.5f64), Number::F64(42.5));
    }

    #[test]
    fn record_values_compare_by_identity() {
        let a = Pair {
            left: 1,
            right: "r".to_string(),
        };
        let b = Pair {
            left: 1,
            right: "r".to_string(),
        };
        assert!(Value::Record(&a).same_as(&Value::Record(&a)));
        assert!(!Value::Record(&a).same_as(&Value::Record(&b)));
        assert_eq!(Value::Record(&a).as_record().map(|r| r.field_value("left")), Some(Value::Number(Number::I64(1))));
    }

    #[test]
    fn timestamp_blank() {
        assert!(Timestamp::default().is_blank());
        assert!(!Timestamp::from_secs(1).is_blank());
        assert_eq!(Timestamp::from_secs(2).as_millis(), 2000);
        assert_eq!(Timestamp::from_secs(i64::MAX).as_millis(), i64::MAX);
        assert_eq!(Timestamp::from_secs(i64::MIN).as_millis(), i64::MIN);
    }
}
