//! Traits that expose records and filters to the compiler.
//!
//! - [`FieldAccess`] reads field values by name at run time. It is object
//!   safe so nested records can be traversed through `&dyn FieldAccess`.
//! - [`Record`] adds the static [`Shape`] used at compile time.
//! - [`FieldValue`] is implemented by every type a field may have; it maps
//!   the Rust type to a [`FieldType`] and a value to a [`Value`].
//!
//! All three are usually produced by `#[derive(Record)]`.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::shape::{FieldType, NumberKind, Shape};
use crate::value::{Number, Timestamp, Value};

/// Run-time access to the fields of a record.
///
/// # Manual Implementation
///
/// ```
/// use filterspec::{FieldAccess, Number, Value};
///
/// struct Task {
///     name: String,
///     priority: u8,
/// }
///
/// impl FieldAccess for Task {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "name" => Value::String(&self.name),
///             "priority" => Value::Number(Number::U64(self.priority as u64)),
///             _ => Value::None,
///         }
///     }
/// }
/// ```
pub trait FieldAccess {
    /// Returns the value of a field, or [`Value::None`] if the field is
    /// unknown or absent.
    fn field_value(&self, field: &str) -> Value<'_>;

    /// Returns `true` when every field holds its type's default.
    ///
    /// This is the structural emptiness check used to skip filter fields of
    /// record type. The default implementation treats records as never empty.
    fn all_fields_default(&self) -> bool {
        false
    }
}

/// A type with a static field layout, usable as a model or a filter.
pub trait Record: FieldAccess + 'static {
    /// The fields of this type, in declaration order.
    fn shape() -> Shape;
}

/// A type that can appear as a field of a [`Record`].
pub trait FieldValue {
    /// The declared type, used for structural matching.
    fn field_type() -> FieldType;

    /// The run-time value.
    fn to_value(&self) -> Value<'_>;
}

impl FieldValue for String {
    fn field_type() -> FieldType {
        FieldType::String
    }

    fn to_value(&self) -> Value<'_> {
        Value::String(self)
    }
}

impl FieldValue for bool {
    fn field_type() -> FieldType {
        FieldType::Bool
    }

    fn to_value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

macro_rules! number_field {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn field_type() -> FieldType {
                    FieldType::Number(NumberKind::$kind)
                }

                fn to_value(&self) -> Value<'_> {
                    Value::Number(Number::from(*self))
                }
            }
        )*
    };
}

number_field!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
);

impl FieldValue for Timestamp {
    fn field_type() -> FieldType {
        FieldType::Timestamp
    }

    fn to_value(&self) -> Value<'_> {
        Value::Timestamp(*self)
    }
}

// chrono's defaults are the Unix epoch, which maps onto the blank sentinel.
impl<Tz: TimeZone> FieldValue for DateTime<Tz> {
    fn field_type() -> FieldType {
        FieldType::Timestamp
    }

    fn to_value(&self) -> Value<'_> {
        Value::Timestamp(Timestamp::from_millis(self.timestamp_millis()))
    }
}

impl FieldValue for NaiveDateTime {
    fn field_type() -> FieldType {
        FieldType::Timestamp
    }

    fn to_value(&self) -> Value<'_> {
        Value::Timestamp(Timestamp::from_millis(
            self.and_utc().timestamp_millis(),
        ))
    }
}

impl FieldValue for NaiveDate {
    fn field_type() -> FieldType {
        FieldType::Timestamp
    }

    fn to_value(&self) -> Value<'_> {
        let midnight = self.and_time(NaiveTime::MIN);
        Value::Timestamp(Timestamp::from_millis(
            midnight.and_utc().timestamp_millis(),
        ))
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn field_type() -> FieldType {
        FieldType::optional(T::field_type())
    }

    fn to_value(&self) -> Value<'_> {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::None,
        }
    }
}

impl<T: FieldValue> FieldValue for Box<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }

    fn to_value(&self) -> Value<'_> {
        (**self).to_value()
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::list(T::field_type())
    }

    fn to_value(&self) -> Value<'_> {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }
}

impl<T: FieldValue, S> FieldValue for HashSet<T, S> {
    fn field_type() -> FieldType {
        FieldType::list(T::field_type())
    }

    fn to_value(&self) -> Value<'_> {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }
}

impl<T: FieldValue> FieldValue for BTreeSet<T> {
    fn field_type() -> FieldType {
        FieldType::list(T::field_type())
    }

    fn to_value(&self) -> Value<'_> {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }
}
