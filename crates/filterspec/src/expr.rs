//! Intermediate representation of a compiled filter.
//!
//! The IR is a closed set of nodes:
//!
//! - field access: [`FieldPath`] on the model side, a filter field name on
//!   the filter side;
//! - comparison: [`Expr::Compare`], [`Expr::IsNull`] and the opaque
//!   [`Expr::Custom`] override;
//! - logical not: [`Expr::Not`];
//! - logical guard: [`Guard`] on a [`Step`];
//! - sequential narrow: the ordered steps of a [`Plan`].
//!
//! Nothing here refers to Rust closures, so another back end (a SQL
//! renderer, for instance) can consume a [`Plan`] as it is. The in-memory
//! back end lives in [`crate::compiler`].

use std::fmt;

use crate::guard::Guard;
use crate::path::FieldPath;
use crate::value::Value;

/// Comparison between a model value (left) and a filter value (right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    /// Ordinal substring.
    Contains,
    /// Substring after lowercasing both sides.
    ContainsIgnoreCase,
    StartsWith,
    EndsWith,
    /// Model scalar is one of the filter collection's elements.
    AnyOf,
    /// Model collection has the filter scalar among its elements.
    Includes,
    /// Model and filter collections share an element.
    Overlaps,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Equal => "==",
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::Contains => "contains",
            Comparison::ContainsIgnoreCase => "icontains",
            Comparison::StartsWith => "starts with",
            Comparison::EndsWith => "ends with",
            Comparison::AnyOf => "in",
            Comparison::Includes => "includes",
            Comparison::Overlaps => "overlaps",
        }
    }

    /// Evaluates `model <comparison> filter`.
    ///
    /// Equality treats two absent values as equal; every other comparison is
    /// false when either side is absent.
    pub fn eval(self, model: &Value<'_>, filter: &Value<'_>) -> bool {
        use std::cmp::Ordering;

        match self {
            Comparison::Equal => model.same_as(filter),
            Comparison::Greater => model.compare(filter) == Some(Ordering::Greater),
            Comparison::GreaterOrEqual => {
                matches!(model.compare(filter), Some(Ordering::Greater | Ordering::Equal))
            }
            Comparison::Less => model.compare(filter) == Some(Ordering::Less),
            Comparison::LessOrEqual => {
                matches!(model.compare(filter), Some(Ordering::Less | Ordering::Equal))
            }
            Comparison::Contains => text(model, filter, |m, f| m.contains(f)),
            Comparison::ContainsIgnoreCase => {
                text(model, filter, |m, f| m.to_lowercase().contains(&f.to_lowercase()))
            }
            Comparison::StartsWith => text(model, filter, |m, f| m.starts_with(f)),
            Comparison::EndsWith => text(model, filter, |m, f| m.ends_with(f)),
            Comparison::AnyOf => filter
                .as_list()
                .is_some_and(|items| items.iter().any(|item| item.same_as(model))),
            Comparison::Includes => model
                .as_list()
                .is_some_and(|items| items.iter().any(|item| item.same_as(filter))),
            Comparison::Overlaps => match (model.as_list(), filter.as_list()) {
                (Some(left), Some(right)) => {
                    left.iter().any(|l| right.iter().any(|r| l.same_as(r)))
                }
                _ => false,
            },
        }
    }
}

fn text(model: &Value<'_>, filter: &Value<'_>, test: impl Fn(&str, &str) -> bool) -> bool {
    match (model.as_str(), filter.as_str()) {
        (Some(m), Some(f)) => test(m, f),
        _ => false,
    }
}

/// Boolean expression over one model record and the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Compare {
        comparison: Comparison,
        model: FieldPath,
        filter: &'static str,
    },
    /// The model value is absent.
    IsNull { model: FieldPath },
    /// A registered predicate override for the filter field.
    Custom { field: &'static str },
    Not(Box<Expr>),
}

impl Expr {
    /// Logical NOT. Negating a negation yields the original expression, so
    /// `NotEqual` combined with `negate` is plain `Equal`.
    pub fn negated(self) -> Expr {
        match self {
            Expr::Not(inner) => *inner,
            other => Expr::Not(Box::new(other)),
        }
    }

    /// Returns `true` if the outermost node is a negation.
    pub fn is_negated(&self) -> bool {
        matches!(self, Expr::Not(_))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Compare {
                comparison,
                model,
                filter,
            } => write!(f, "record.{} {} filter.{}", model, comparison.as_str(), filter),
            Expr::IsNull { model } => write!(f, "record.{} is null", model),
            Expr::Custom { field } => write!(f, "override(filter.{})", field),
            Expr::Not(inner) => write!(f, "not ({})", inner),
        }
    }
}

/// One narrowing step: `if guard(filter.field) { query = query.where(predicate) }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub field: &'static str,
    pub guard: Option<Guard>,
    pub predicate: Expr,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(guard) = self.guard {
            write!(f, "if filter.{} {}: ", self.field, guard)?;
        }
        write!(f, "where {}", self.predicate)
    }
}

/// The ordered, conjunctive steps compiled for a (model, filter) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub model: &'static str,
    pub filter: &'static str,
    pub steps: Vec<Step>,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.filter, self.model)?;
        for (index, step) in self.steps.iter().enumerate() {
            write!(f, "\n  {}. {}", index + 1, step)?;
        }
        Ok(())
    }
}
