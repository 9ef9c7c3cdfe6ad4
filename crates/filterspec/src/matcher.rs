//! Structural matching of filter fields against model fields.
//!
//! A filter field matches the model field with the same (case-sensitive)
//! name when the declared types are compatible:
//!
//! 1. identical types;
//! 2. `Option<X>` against `X`, in either direction;
//! 3. a collection of `X` against `X` ("any of"), applying rule 2 to the
//!    element, and the mirror case of a model collection against a filter
//!    scalar.
//!
//! No other coercion is attempted. Number kinds never widen.

use crate::path::FieldPath;
use crate::shape::{FieldType, Shape};

/// How a filter field type relates to its model field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Identical,
    /// One side is `Option` of the other.
    Nullable,
    /// Filter collection of the model scalar.
    AnyOf { nullable: bool },
    /// Model collection of the filter scalar.
    Includes { nullable: bool },
}

impl MatchKind {
    /// Returns `true` when exactly one side is a collection.
    pub fn is_membership(self) -> bool {
        matches!(self, MatchKind::AnyOf { .. } | MatchKind::Includes { .. })
    }

    /// Returns `true` when an optional has to be unwrapped to compare.
    pub fn unwraps_nullable(self) -> bool {
        matches!(
            self,
            MatchKind::Nullable
                | MatchKind::AnyOf { nullable: true }
                | MatchKind::Includes { nullable: true }
        )
    }
}

/// The match found for one filter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMatch {
    pub field: &'static str,
    pub path: FieldPath,
    pub model_type: FieldType,
    pub kind: MatchKind,
}

/// Matches found for a filter shape, in filter declaration order.
#[derive(Debug, Clone, Default)]
pub struct PropertyMatchSet {
    matches: Vec<PropertyMatch>,
}

impl PropertyMatchSet {
    pub fn get(&self, field: &str) -> Option<&PropertyMatch> {
        self.matches.iter().find(|m| m.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyMatch> {
        self.matches.iter()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Checks whether a filter field type can be compared with a model field
/// type, and how.
pub fn compatibility(filter: &FieldType, model: &FieldType) -> Option<MatchKind> {
    if filter == model {
        return Some(MatchKind::Identical);
    }
    if nullable_pair(filter, model) {
        return Some(MatchKind::Nullable);
    }
    if !model.is_list() {
        if let Some(element) = filter.element() {
            return scalar_match(element, model).map(|nullable| MatchKind::AnyOf { nullable });
        }
    }
    if !filter.is_list() {
        if let Some(element) = model.element() {
            return scalar_match(filter, element).map(|nullable| MatchKind::Includes { nullable });
        }
    }
    None
}

/// Matches every filter field that has neither an explicit path nor the
/// `ignore` flag. Unmatched fields are left out; this never fails.
pub fn match_fields(filter: &Shape, model: &Shape) -> PropertyMatchSet {
    let matches = filter
        .fields()
        .iter()
        .filter(|f| !f.meta.ignore && f.meta.path.is_none())
        .filter_map(|f| {
            let target = model.field(f.name)?;
            let kind = compatibility(&f.ty, &target.ty)?;
            Some(PropertyMatch {
                field: f.name,
                path: FieldPath::field(target.name),
                model_type: target.ty.clone(),
                kind,
            })
        })
        .collect();

    PropertyMatchSet { matches }
}

// Some(false) for identical scalars, Some(true) when one side is Option of
// the other.
fn scalar_match(a: &FieldType, b: &FieldType) -> Option<bool> {
    if a == b {
        Some(false)
    } else if nullable_pair(a, b) {
        Some(true)
    } else {
        None
    }
}

fn nullable_pair(a: &FieldType, b: &FieldType) -> bool {
    matches!(a, FieldType::Optional(inner) if **inner == *b)
        || matches!(b, FieldType::Optional(inner) if **inner == *a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{FieldDescriptor, FieldMeta, NumberKind};

    const I32: FieldType = FieldType::Number(NumberKind::I32);
    const I64: FieldType = FieldType::Number(NumberKind::I64);

    struct Model;
    struct Filter;

    #[test]
    fn identical_and_nullable() {
        assert_eq!(compatibility(&I32, &I32), Some(MatchKind::Identical));
        assert_eq!(
            compatibility(&FieldType::optional(I32), &I32),
            Some(MatchKind::Nullable)
        );
        assert_eq!(
            compatibility(&I32, &FieldType::optional(I32)),
            Some(MatchKind::Nullable)
        );
    }

    #[test]
    fn no_numeric_widening() {
        assert_eq!(compatibility(&I32, &I64), None);
        assert_eq!(compatibility(&FieldType::optional(I32), &I64), None);
        assert_eq!(compatibility(&FieldType::list(I32), &I64), None);
    }

    #[test]
    fn collection_against_scalar() {
        assert_eq!(
            compatibility(&FieldType::list(I32), &I32),
            Some(MatchKind::AnyOf { nullable: false })
        );
        assert_eq!(
            compatibility(&FieldType::list(I32), &FieldType::optional(I32)),
            Some(MatchKind::AnyOf { nullable: true })
        );
        assert_eq!(
            compatibility(&FieldType::list(FieldType::optional(I32)), &I32),
            Some(MatchKind::AnyOf { nullable: true })
        );
        assert_eq!(
            compatibility(&FieldType::optional(FieldType::list(I32)), &I32),
            Some(MatchKind::AnyOf { nullable: false })
        );
    }

    #[test]
    fn scalar_against_model_collection() {
        assert_eq!(
            compatibility(&FieldType::String, &FieldType::list(FieldType::String)),
            Some(MatchKind::Includes { nullable: false })
        );
        assert_eq!(
            compatibility(&FieldType::optional(FieldType::String), &FieldType::list(FieldType::String)),
            Some(MatchKind::Includes { nullable: true })
        );
    }

    #[test]
    fn mismatched_collections_do_not_match() {
        assert_eq!(
            compatibility(&FieldType::list(I32), &FieldType::list(I64)),
            None
        );
        assert_eq!(
            compatibility(&FieldType::list(I32), &FieldType::list(I32)),
            Some(MatchKind::Identical)
        );
    }

    #[test]
    fn match_fields_skips_paths_and_ignored() {
        let model = Shape::new::<Model>(
            "Model",
            vec![
                FieldDescriptor::new("id", I32),
                FieldDescriptor::new("name", FieldType::String),
                FieldDescriptor::new("score", I64),
            ],
        );
        let filter = Shape::new::<Filter>(
            "Filter",
            vec![
                FieldDescriptor::new("id", FieldType::list(I32)),
                FieldDescriptor::new("name", FieldType::String).with_meta(FieldMeta {
                    path: Some("name"),
                    ..FieldMeta::default()
                }),
                FieldDescriptor::new("score", I32),
                FieldDescriptor::new("Id", I32),
                FieldDescriptor::new("hidden", FieldType::String).with_meta(FieldMeta {
                    ignore: true,
                    ..FieldMeta::default()
                }),
            ],
        );

        let set = match_fields(&filter, &model);
        assert_eq!(set.len(), 1);
        let id = set.get("id").unwrap();
        assert_eq!(id.kind, MatchKind::AnyOf { nullable: false });
        assert_eq!(id.path, FieldPath::field("id"));
        assert!(set.get("name").is_none());
        assert!(set.get("score").is_none());
        assert!(set.get("Id").is_none());
    }

    #[test]
    fn kind_helpers() {
        assert!(MatchKind::AnyOf { nullable: false }.is_membership());
        assert!(!MatchKind::Nullable.is_membership());
        assert!(MatchKind::Includes { nullable: true }.unwraps_nullable());
        assert!(!MatchKind::Identical.unwraps_nullable());
    }
}
