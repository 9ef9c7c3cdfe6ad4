//! Lowering of resolved criteria into IR expressions.
//!
//! [`build_comparison`] picks the comparison for a criterion's operator,
//! checks it against the matched types and applies negation last.

use crate::criterion::{Criterion, Target};
use crate::error::{Result, SpecError};
use crate::expr::{Comparison, Expr};
use crate::matcher::MatchKind;
use crate::op::Operator;
use crate::options::{CompilerOptions, LikeMatching};
use crate::shape::FieldType;

/// Builds the boolean expression for one criterion of the filter named
/// `filter`.
///
/// Operator validity is checked here, so an ordering operator on a `bool`
/// field fails at compile time rather than when the specification runs.
pub fn build_comparison(
    criterion: &Criterion,
    filter: &'static str,
    options: &CompilerOptions,
) -> Result<Expr> {
    let expr = match &criterion.target {
        Target::Override => Expr::Custom {
            field: criterion.field,
        },
        Target::Model {
            path,
            model_type,
            kind,
            nullable,
        } => {
            let filter_type = &criterion.filter_type;
            let both_lists = filter_type.element().is_some() && model_type.element().is_some();
            let op = match criterion.operator {
                Operator::Auto => infer_operator(filter_type, *kind, both_lists),
                op => op,
            };
            let invalid = || SpecError::InvalidOperator {
                op: op.as_str(),
                filter,
                field: criterion.field,
                filter_type: filter_type.to_string(),
                model_type: model_type.to_string(),
            };
            let scalar = matches!(kind, Some(MatchKind::Identical | MatchKind::Nullable)) && !both_lists;
            let compare = |comparison| Expr::Compare {
                comparison,
                model: path.clone(),
                filter: criterion.field,
            };

            match op {
                Operator::Equal | Operator::NotEqual => {
                    if !scalar || model_type.is_record() {
                        return Err(invalid());
                    }
                    let equal = compare(Comparison::Equal);
                    if op == Operator::NotEqual {
                        equal.negated()
                    } else {
                        equal
                    }
                }
                Operator::GreaterThan
                | Operator::GreaterOrEqual
                | Operator::LessThan
                | Operator::LessOrEqual => {
                    if !scalar || !model_type.is_orderable() {
                        return Err(invalid());
                    }
                    compare(ordering(op))
                }
                Operator::Like | Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
                    if !scalar || !model_type.is_text() {
                        return Err(invalid());
                    }
                    compare(text(op, options.like))
                }
                Operator::In => match kind {
                    Some(MatchKind::AnyOf { .. }) => compare(Comparison::AnyOf),
                    Some(MatchKind::Includes { .. }) => compare(Comparison::Includes),
                    Some(_) if both_lists => compare(Comparison::Overlaps),
                    _ => return Err(invalid()),
                },
                Operator::IsNull | Operator::IsNotNull => {
                    if !nullable {
                        return Err(invalid());
                    }
                    let is_null = Expr::IsNull {
                        model: path.clone(),
                    };
                    if op == Operator::IsNotNull {
                        is_null.negated()
                    } else {
                        is_null
                    }
                }
                // infer_operator never yields Auto.
                Operator::Auto => return Err(invalid()),
            }
        }
    };

    Ok(if criterion.negate { expr.negated() } else { expr })
}

fn infer_operator(filter_type: &FieldType, kind: Option<MatchKind>, both_lists: bool) -> Operator {
    if both_lists || kind.is_some_and(MatchKind::is_membership) {
        Operator::In
    } else if filter_type.is_text() {
        Operator::Like
    } else {
        Operator::Equal
    }
}

fn ordering(op: Operator) -> Comparison {
    match op {
        Operator::GreaterThan => Comparison::Greater,
        Operator::GreaterOrEqual => Comparison::GreaterOrEqual,
        Operator::LessThan => Comparison::Less,
        _ => Comparison::LessOrEqual,
    }
}

fn text(op: Operator, like: LikeMatching) -> Comparison {
    match (op, like) {
        (Operator::Like, LikeMatching::CaseInsensitive) => Comparison::ContainsIgnoreCase,
        (Operator::StartsWith, _) => Comparison::StartsWith,
        (Operator::EndsWith, _) => Comparison::EndsWith,
        _ => Comparison::Contains,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::FieldPath;
    use crate::shape::{NumberKind, RecordType, Shape};
    use crate::traits::{FieldAccess, Record};
    use crate::value::Value;

    const I32: FieldType = FieldType::Number(NumberKind::I32);

    fn criterion(
        filter_type: FieldType,
        model_type: FieldType,
        kind: Option<MatchKind>,
        operator: Operator,
    ) -> Criterion {
        Criterion {
            field: "field",
            filter_type,
            operator,
            negate: false,
            ignore_if_empty: true,
            target: Target::Model {
                path: FieldPath::field("field"),
                nullable: model_type.is_optional(),
                model_type,
                kind,
            },
        }
    }

    fn build(criterion: &Criterion) -> Result<Expr> {
        build_comparison(criterion, "Filter", &CompilerOptions::default())
    }

    fn comparison_of(expr: &Expr) -> Option<Comparison> {
        match expr {
            Expr::Compare { comparison, .. } => Some(*comparison),
            Expr::Not(inner) => comparison_of(inner),
            _ => None,
        }
    }

    #[test]
    fn auto_infers_like_for_strings() {
        let c = criterion(FieldType::String, FieldType::String, Some(MatchKind::Identical), Operator::Auto);
        assert_eq!(comparison_of(&build(&c).unwrap()), Some(Comparison::Contains));
    }

    #[test]
    fn auto_infers_in_for_collections() {
        let c = criterion(
            FieldType::list(I32),
            I32,
            Some(MatchKind::AnyOf { nullable: false }),
            Operator::Auto,
        );
        assert_eq!(comparison_of(&build(&c).unwrap()), Some(Comparison::AnyOf));

        let c = criterion(
            I32,
            FieldType::list(I32),
            Some(MatchKind::Includes { nullable: false }),
            Operator::Auto,
        );
        assert_eq!(comparison_of(&build(&c).unwrap()), Some(Comparison::Includes));

        let c = criterion(
            FieldType::list(FieldType::String),
            FieldType::list(FieldType::String),
            Some(MatchKind::Identical),
            Operator::Auto,
        );
        assert_eq!(comparison_of(&build(&c).unwrap()), Some(Comparison::Overlaps));
    }

    #[test]
    fn auto_infers_equal_otherwise() {
        let c = criterion(FieldType::optional(I32), I32, Some(MatchKind::Nullable), Operator::Auto);
        let expr = build(&c).unwrap();
        assert_eq!(comparison_of(&expr), Some(Comparison::Equal));
        assert!(!expr.is_negated());
    }

    #[test]
    fn case_insensitive_like() {
        let c = criterion(FieldType::String, FieldType::String, Some(MatchKind::Identical), Operator::Like);
        let options = CompilerOptions::default().like(LikeMatching::CaseInsensitive);
        let expr = build_comparison(&c, "Filter", &options).unwrap();
        assert_eq!(comparison_of(&expr), Some(Comparison::ContainsIgnoreCase));

        let c = criterion(FieldType::String, FieldType::String, Some(MatchKind::Identical), Operator::Contains);
        let expr = build_comparison(&c, "Filter", &options).unwrap();
        assert_eq!(comparison_of(&expr), Some(Comparison::Contains));
    }

    #[test]
    fn not_equal_with_negate_is_equal() {
        let mut c = criterion(I32, I32, Some(MatchKind::Identical), Operator::NotEqual);
        assert!(build(&c).unwrap().is_negated());
        c.negate = true;
        let expr = build(&c).unwrap();
        assert!(!expr.is_negated());
        assert_eq!(comparison_of(&expr), Some(Comparison::Equal));
    }

    #[test]
    fn ordering_requires_orderable_types() {
        let c = criterion(FieldType::Bool, FieldType::Bool, Some(MatchKind::Identical), Operator::GreaterThan);
        let err = build(&c).unwrap_err();
        assert!(matches!(err, SpecError::InvalidOperator { op: "gt", .. }));

        let c = criterion(FieldType::Timestamp, FieldType::Timestamp, Some(MatchKind::Identical), Operator::LessOrEqual);
        assert_eq!(comparison_of(&build(&c).unwrap()), Some(Comparison::LessOrEqual));
    }

    #[test]
    fn text_operators_require_strings() {
        let c = criterion(I32, I32, Some(MatchKind::Identical), Operator::StartsWith);
        assert!(build(&c).is_err());
        let c = criterion(
            FieldType::list(FieldType::String),
            FieldType::String,
            Some(MatchKind::AnyOf { nullable: false }),
            Operator::Like,
        );
        assert!(build(&c).is_err());
    }

    #[test]
    fn in_requires_a_collection() {
        let c = criterion(I32, I32, Some(MatchKind::Identical), Operator::In);
        assert!(matches!(build(&c), Err(SpecError::InvalidOperator { op: "in", .. })));
    }

    #[test]
    fn equality_on_lists_is_invalid() {
        let c = criterion(
            FieldType::list(I32),
            I32,
            Some(MatchKind::AnyOf { nullable: false }),
            Operator::Equal,
        );
        assert!(build(&c).is_err());
    }

    struct Nested;

    impl FieldAccess for Nested {
        fn field_value(&self, _field: &str) -> Value<'_> {
            Value::None
        }
    }

    impl Record for Nested {
        fn shape() -> Shape {
            Shape::new::<Self>("Nested", vec![])
        }
    }

    #[test]
    fn equality_on_records_is_invalid() {
        let record = FieldType::Record(RecordType::of::<Nested>());
        let c = criterion(record.clone(), record, Some(MatchKind::Identical), Operator::Auto);
        assert!(build(&c).is_err());
    }

    #[test]
    fn null_checks_need_a_nullable_target() {
        let c = criterion(FieldType::Bool, FieldType::optional(FieldType::String), None, Operator::IsNull);
        assert_eq!(
            build(&c).unwrap(),
            Expr::IsNull {
                model: FieldPath::field("field")
            }
        );

        let c = criterion(FieldType::Bool, FieldType::optional(FieldType::String), None, Operator::IsNotNull);
        assert!(build(&c).unwrap().is_negated());

        let c = criterion(FieldType::Bool, FieldType::String, None, Operator::IsNull);
        assert!(build(&c).is_err());
    }

    #[test]
    fn overrides_become_custom_nodes() {
        let c = Criterion {
            field: "query",
            filter_type: FieldType::String,
            operator: Operator::Auto,
            negate: true,
            ignore_if_empty: true,
            target: Target::Override,
        };
        assert_eq!(
            build(&c).unwrap(),
            Expr::Custom { field: "query" }.negated()
        );
    }
}
