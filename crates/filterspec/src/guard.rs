//! Emptiness guards.
//!
//! A guard decides, from the filter value alone, whether a criterion takes
//! part in filtering. When the guard rejects the value the criterion is
//! skipped, exactly as if the filter did not have the field.

use std::fmt;

use crate::shape::FieldType;
use crate::value::{Number, Value};

/// The emptiness rule for a filter field's type class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Guard {
    /// Strings: present and not all whitespace.
    Text,
    /// Collections: at least one element.
    Collection,
    /// Other optionals: a value is present.
    Present,
    /// Numbers: strictly greater than zero. Zero and negative values count
    /// as empty.
    Positive,
    /// Timestamps: not the blank sentinel.
    NotBlank,
    /// Booleans, enums and records: not every field at its default.
    Structural,
}

impl Guard {
    /// Returns `true` if the filter value is non-empty and the criterion
    /// should be applied.
    pub fn admits(self, value: &Value<'_>) -> bool {
        match self {
            Guard::Text => value.as_str().is_some_and(|s| !s.trim().is_empty()),
            Guard::Collection => value.as_list().is_some_and(|items| !items.is_empty()),
            Guard::Present => !value.is_none(),
            Guard::Positive => value.as_number().is_some_and(Number::is_positive),
            Guard::NotBlank => value.as_timestamp().is_some_and(|t| !t.is_blank()),
            Guard::Structural => !value.is_default(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Guard::Text => "is not blank",
            Guard::Collection => "has elements",
            Guard::Present => "is present",
            Guard::Positive => "is positive",
            Guard::NotBlank => "is set",
            Guard::Structural => "is not default",
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the guard for a filter field type.
///
/// `Option<String>` and `Option<Vec<_>>` keep the string and collection
/// rules; any other `Option` only has to be present.
pub fn build_guard(filter_type: &FieldType) -> Guard {
    match filter_type {
        FieldType::String => Guard::Text,
        FieldType::List(_) => Guard::Collection,
        FieldType::Optional(inner) => match **inner {
            FieldType::String => Guard::Text,
            FieldType::List(_) => Guard::Collection,
            _ => Guard::Present,
        },
        FieldType::Number(_) => Guard::Positive,
        FieldType::Timestamp => Guard::NotBlank,
        FieldType::Bool | FieldType::Enum(_) | FieldType::Record(_) => Guard::Structural,
    }
}
