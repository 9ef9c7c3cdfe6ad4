//! Dotted field paths into a model.
//!
//! A [`FieldPath`] is the model-side field access of a criterion. It is
//! resolved against a [`Shape`] once at compile time and walked against
//! [`FieldAccess`] values at run time.

use std::fmt;

use crate::shape::{FieldType, Shape};
use crate::traits::FieldAccess;
use crate::value::Value;

/// A sequence of field names, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// A path of a single field.
    pub fn field(name: &str) -> Self {
        FieldPath {
            segments: vec![name.to_string()],
        }
    }

    /// Parses `a.b.c`. Returns `None` for empty paths or empty segments.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return None;
        }
        Some(FieldPath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Reads the value at this path. Any absent record on the way yields
    /// [`Value::None`].
    pub fn access<'a>(&self, root: &'a dyn FieldAccess) -> Value<'a> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Value::None;
        };
        let mut current = root;
        for segment in parents {
            match current.field_value(segment) {
                Value::Record(next) => current = next,
                _ => return Value::None,
            }
        }
        current.field_value(last)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// A path checked against a model shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: FieldPath,
    /// Declared type of the last segment.
    pub ty: FieldType,
    /// An optional record was crossed on the way, so the target can be
    /// absent even when its own type is not optional.
    pub through_optional: bool,
}

/// Resolves a dotted path against `model`. Every segment but the last must
/// name a record field (optionally wrapped in `Option`).
pub fn resolve_path(model: &Shape, path: &str) -> Option<ResolvedPath> {
    let parsed = FieldPath::parse(path)?;
    let (last, parents) = parsed.segments().split_last()?;

    let mut shape = model.clone();
    let mut through_optional = false;
    for segment in parents {
        let field = shape.field(segment)?;
        let FieldType::Record(record) = field.ty.unwrap_optional() else {
            return None;
        };
        through_optional |= field.ty.is_optional();
        shape = record.shape();
    }
    let ty = shape.field(last)?.ty.clone();

    Some(ResolvedPath {
        path: parsed,
        ty,
        through_optional,
    })
}
