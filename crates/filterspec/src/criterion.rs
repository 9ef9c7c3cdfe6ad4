//! Criterion resolution.
//!
//! Every filter field that is not ignored becomes exactly one [`Criterion`].
//! Its target comes from the first source that applies:
//!
//! 1. a registered predicate override for the field;
//! 2. an explicit `path` declared on the field;
//! 3. the structural [`match_fields`] result.
//!
//! A field with none of these fails the whole pair. There is no partial
//! specification: silently dropping a criterion would under-filter results.

use std::collections::HashSet;

use crate::error::{Result, SpecError};
use crate::matcher::{compatibility, match_fields, MatchKind};
use crate::op::Operator;
use crate::options::CompilerOptions;
use crate::path::{resolve_path, FieldPath};
use crate::shape::{FieldDescriptor, FieldType, Shape};

/// What a criterion is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A registered predicate override replaces the comparison.
    Override,
    /// A model field.
    Model {
        path: FieldPath,
        model_type: FieldType,
        /// `None` when the types were not compared (null checks).
        kind: Option<MatchKind>,
        /// The target can be absent: it is optional or reached through an
        /// optional record.
        nullable: bool,
    },
}

/// The resolved filtering rule for one filter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub field: &'static str,
    pub filter_type: FieldType,
    pub operator: Operator,
    pub negate: bool,
    pub ignore_if_empty: bool,
    pub target: Target,
}

/// Resolves the criteria of `filter` against `model`, in filter declaration
/// order.
///
/// `overridden` names the filter fields that have a registered predicate
/// override for this pair.
pub fn resolve(
    filter: &Shape,
    model: &Shape,
    overridden: &HashSet<&'static str>,
    options: &CompilerOptions,
) -> Result<Vec<Criterion>> {
    let matches = match_fields(filter, model);
    let mut criteria = Vec::with_capacity(filter.fields().len());

    for field in filter.fields() {
        if field.meta.ignore {
            continue;
        }

        let target = if overridden.contains(field.name) {
            Target::Override
        } else if let Some(path) = field.meta.path {
            explicit_target(field, path, filter, model)?
        } else if let Some(found) = matches.get(field.name) {
            Target::Model {
                path: found.path.clone(),
                nullable: found.model_type.is_optional(),
                model_type: found.model_type.clone(),
                kind: Some(found.kind),
            }
        } else if let Some(target) = null_check_target(field, model) {
            target
        } else {
            return Err(SpecError::UnresolvedCriterion {
                model: model.name(),
                filter: filter.name(),
                field: field.name,
            });
        };

        criteria.push(Criterion {
            field: field.name,
            filter_type: field.ty.clone(),
            operator: field.meta.operator,
            negate: field.meta.negate,
            ignore_if_empty: field.meta.ignore_if_empty.unwrap_or(options.ignore_if_empty),
            target,
        });
    }

    Ok(criteria)
}

fn explicit_target(
    field: &FieldDescriptor,
    path: &str,
    filter: &Shape,
    model: &Shape,
) -> Result<Target> {
    let resolved = resolve_path(model, path).ok_or_else(|| SpecError::InvalidPath {
        model: model.name(),
        filter: filter.name(),
        field: field.name,
        path: path.to_string(),
    })?;

    let kind = compatibility(&field.ty, &resolved.ty);
    if kind.is_none() && !field.meta.operator.is_null_check() {
        return Err(SpecError::IncompatibleTypes {
            model: model.name(),
            filter: filter.name(),
            field: field.name,
            path: path.to_string(),
            filter_type: field.ty.to_string(),
            model_type: resolved.ty.to_string(),
        });
    }

    Ok(Target::Model {
        nullable: resolved.through_optional || resolved.ty.is_optional(),
        path: resolved.path,
        model_type: resolved.ty,
        kind,
    })
}

// Null checks never read the filter value, so a same-named model field is
// enough even when the types differ.
fn null_check_target(field: &FieldDescriptor, model: &Shape) -> Option<Target> {
    if !field.meta.operator.is_null_check() {
        return None;
    }
    let target = model.field(field.name)?;
    Some(Target::Model {
        path: FieldPath::field(target.name),
        model_type: target.ty.clone(),
        kind: compatibility(&field.ty, &target.ty),
        nullable: target.ty.is_optional(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{FieldMeta, NumberKind, RecordType};
    use crate::traits::{FieldAccess, Record};
    use crate::value::Value;

    struct Address;

    impl FieldAccess for Address {
        fn field_value(&self, _field: &str) -> Value<'_> {
            Value::None
        }
    }

    impl Record for Address {
        fn shape() -> Shape {
            Shape::new::<Self>("Address", vec![FieldDescriptor::new("city", FieldType::String)])
        }
    }

    struct Model;
    struct Filter;

    fn model() -> Shape {
        Shape::new::<Model>(
            "Person",
            vec![
                FieldDescriptor::new("id", FieldType::Number(NumberKind::I32)),
                FieldDescriptor::new("name", FieldType::String),
                FieldDescriptor::new("email", FieldType::optional(FieldType::String)),
                FieldDescriptor::new(
                    "address",
                    FieldType::optional(FieldType::Record(RecordType::of::<Address>())),
                ),
            ],
        )
    }

    fn filter(fields: Vec<FieldDescriptor>) -> Shape {
        Shape::new::<Filter>("PersonFilter", fields)
    }

    fn meta(f: impl FnOnce(&mut FieldMeta)) -> FieldMeta {
        let mut meta = FieldMeta::default();
        f(&mut meta);
        meta
    }

    #[test]
    fn structural_match_in_declaration_order() {
        let filter = filter(vec![
            FieldDescriptor::new("name", FieldType::String),
            FieldDescriptor::new("id", FieldType::list(FieldType::Number(NumberKind::I32))),
        ]);
        let criteria =
            resolve(&filter, &model(), &HashSet::new(), &CompilerOptions::default()).unwrap();

        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria[0].field, "name");
        assert_eq!(criteria[1].field, "id");
        assert!(criteria[0].ignore_if_empty);
        match &criteria[1].target {
            Target::Model { kind, nullable, .. } => {
                assert_eq!(*kind, Some(MatchKind::AnyOf { nullable: false }));
                assert!(!nullable);
            }
            other => panic!("unexpected target {:?}", other),
        }
    }

    #[test]
    fn unmatched_field_fails_the_pair() {
        let filter = filter(vec![
            FieldDescriptor::new("name", FieldType::String),
            FieldDescriptor::new("nickname", FieldType::String),
        ]);
        let err =
            resolve(&filter, &model(), &HashSet::new(), &CompilerOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SpecError::UnresolvedCriterion {
                field: "nickname",
                ..
            }
        ));
    }

    #[test]
    fn ignored_fields_produce_nothing() {
        let filter = filter(vec![FieldDescriptor::new("nickname", FieldType::String)
            .with_meta(meta(|m| m.ignore = true))]);
        let criteria =
            resolve(&filter, &model(), &HashSet::new(), &CompilerOptions::default()).unwrap();
        assert!(criteria.is_empty());
    }

    #[test]
    fn override_wins_over_everything() {
        let filter = filter(vec![FieldDescriptor::new("nickname", FieldType::String)
            .with_meta(meta(|m| m.path = Some("does.not.exist")))]);
        let overridden: HashSet<&'static str> = ["nickname"].into_iter().collect();
        let criteria =
            resolve(&filter, &model(), &overridden, &CompilerOptions::default()).unwrap();
        assert_eq!(criteria[0].target, Target::Override);
    }

    #[test]
    fn explicit_path_resolves_through_optional_record() {
        let filter = filter(vec![FieldDescriptor::new("town", FieldType::String)
            .with_meta(meta(|m| m.path = Some("address.city")))]);
        let criteria =
            resolve(&filter, &model(), &HashSet::new(), &CompilerOptions::default()).unwrap();
        match &criteria[0].target {
            Target::Model {
                path,
                nullable,
                kind,
                ..
            } => {
                assert_eq!(path.to_string(), "address.city");
                assert!(nullable);
                assert_eq!(*kind, Some(MatchKind::Identical));
            }
            other => panic!("unexpected target {:?}", other),
        }
    }

    #[test]
    fn explicit_path_must_exist() {
        let filter = filter(vec![FieldDescriptor::new("town", FieldType::String)
            .with_meta(meta(|m| m.path = Some("address.town")))]);
        let err =
            resolve(&filter, &model(), &HashSet::new(), &CompilerOptions::default()).unwrap_err();
        assert!(matches!(err, SpecError::InvalidPath { ref path, .. } if path == "address.town"));
    }

    #[test]
    fn explicit_path_must_be_compatible() {
        let filter = filter(vec![FieldDescriptor::new("town", FieldType::Bool)
            .with_meta(meta(|m| m.path = Some("name")))]);
        let err =
            resolve(&filter, &model(), &HashSet::new(), &CompilerOptions::default()).unwrap_err();
        assert!(matches!(err, SpecError::IncompatibleTypes { .. }));
    }

    #[test]
    fn null_checks_only_need_the_target() {
        let filter = filter(vec![
            FieldDescriptor::new("email", FieldType::Bool)
                .with_meta(meta(|m| m.operator = Operator::IsNull)),
            FieldDescriptor::new("no_address", FieldType::Bool).with_meta(meta(|m| {
                m.operator = Operator::IsNotNull;
                m.path = Some("address");
            })),
        ]);
        let criteria =
            resolve(&filter, &model(), &HashSet::new(), &CompilerOptions::default()).unwrap();
        assert_eq!(criteria.len(), 2);
        for criterion in &criteria {
            match &criterion.target {
                Target::Model { kind, nullable, .. } => {
                    assert_eq!(*kind, None);
                    assert!(nullable);
                }
                other => panic!("unexpected target {:?}", other),
            }
        }
    }

    #[test]
    fn emptiness_policy_defaults_from_options() {
        let filter = filter(vec![
            FieldDescriptor::new("name", FieldType::String),
            FieldDescriptor::new("id", FieldType::Number(NumberKind::I32))
                .with_meta(meta(|m| m.ignore_if_empty = Some(true))),
        ]);
        let options = CompilerOptions::default().ignore_if_empty(false);
        let criteria = resolve(&filter, &model(), &HashSet::new(), &options).unwrap();
        assert!(!criteria[0].ignore_if_empty);
        assert!(criteria[1].ignore_if_empty);
    }
}
