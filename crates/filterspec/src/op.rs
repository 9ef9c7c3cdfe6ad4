//! Criterion operators.
//!
//! The [`Operator`] enum names how a filter field is compared with its model
//! field. `Auto` defers the choice to the field types at compile time.

use std::fmt;
use std::str::FromStr;

/// Comparison operator declared on a filter field.
///
/// Operators are grouped by the field types they support:
/// - **Any scalar**: `Equal`, `NotEqual`
/// - **Orderable** (number, timestamp, string): `GreaterThan`,
///   `GreaterOrEqual`, `LessThan`, `LessOrEqual`
/// - **String**: `Like`, `Contains`, `StartsWith`, `EndsWith`
/// - **Collections**: `In`
/// - **Optional model fields**: `IsNull`, `IsNotNull`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    /// Inferred from the field types: collections use `In`, strings use
    /// `Like`, everything else uses `Equal`.
    #[default]
    Auto,
    /// Equal (exact match).
    Equal,
    /// Not equal. Built as the negation of `Equal`.
    NotEqual,
    /// Greater than.
    GreaterThan,
    /// Greater than or equal.
    GreaterOrEqual,
    /// Less than.
    LessThan,
    /// Less than or equal.
    LessOrEqual,
    /// Substring match, ordinal unless configured otherwise.
    Like,
    /// Ordinal substring match.
    Contains,
    /// String starts with prefix.
    StartsWith,
    /// String ends with suffix.
    EndsWith,
    /// Membership between a collection and a scalar.
    In,
    /// Model field is absent. The filter value is not compared.
    IsNull,
    /// Model field is present. The filter value is not compared.
    IsNotNull,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 14] = [
        Operator::Auto,
        Operator::Equal,
        Operator::NotEqual,
        Operator::GreaterThan,
        Operator::GreaterOrEqual,
        Operator::LessThan,
        Operator::LessOrEqual,
        Operator::Like,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::In,
        Operator::IsNull,
        Operator::IsNotNull,
    ];

    /// Returns `true` for the four ordering operators.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::GreaterThan
                | Operator::GreaterOrEqual
                | Operator::LessThan
                | Operator::LessOrEqual
        )
    }

    /// Returns `true` for operators that only apply to strings.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            Operator::Like | Operator::Contains | Operator::StartsWith | Operator::EndsWith
        )
    }

    /// Returns `true` for operators that ignore the filter value.
    pub fn is_null_check(self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }

    /// Returns the canonical name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Auto => "auto",
            Operator::Equal => "eq",
            Operator::NotEqual => "ne",
            Operator::GreaterThan => "gt",
            Operator::GreaterOrEqual => "gte",
            Operator::LessThan => "lt",
            Operator::LessOrEqual => "lte",
            Operator::Like => "like",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::In => "in",
            Operator::IsNull => "is_null",
            Operator::IsNotNull => "is_not_null",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown operator name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operator '{}'", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "auto" => Operator::Auto,
            "eq" | "equal" => Operator::Equal,
            "ne" | "not_equal" => Operator::NotEqual,
            "gt" => Operator::GreaterThan,
            "gte" => Operator::GreaterOrEqual,
            "lt" => Operator::LessThan,
            "lte" => Operator::LessOrEqual,
            "like" => Operator::Like,
            "contains" => Operator::Contains,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            "in" => Operator::In,
            "is_null" => Operator::IsNull,
            "is_not_null" => Operator::IsNotNull,
            other => return Err(UnknownOperator(other.to_string())),
        };
        Ok(op)
    }
}
