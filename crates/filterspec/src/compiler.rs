//! The specification compiler.
//!
//! Compilation runs in two phases. [`plan`] resolves criteria and builds the
//! language-neutral [`Plan`]; it only looks at shapes. [`compile`] lowers
//! that plan into native closures for in-memory evaluation.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::builder::build_comparison;
use crate::criterion::resolve;
use crate::error::{Result, SpecError};
use crate::expr::{Expr, Plan, Step};
use crate::guard::build_guard;
use crate::options::CompilerOptions;
use crate::overrides::FieldOverrides;
use crate::shape::Shape;
use crate::specification::{FilterTest, Narrow, Predicate, Specification};
use crate::traits::Record;

/// Builds the plan for a (model, filter) pair.
///
/// `overridden` names the filter fields covered by predicate overrides.
/// Fails if any criterion is unresolved or invalid; there is no partial
/// plan.
pub fn plan(
    model: &Shape,
    filter: &Shape,
    overridden: &HashSet<&'static str>,
    options: &CompilerOptions,
) -> Result<Plan> {
    let criteria = resolve(filter, model, overridden, options)?;

    let steps = criteria
        .iter()
        .map(|criterion| {
            Ok(Step {
                field: criterion.field,
                guard: criterion
                    .ignore_if_empty
                    .then(|| build_guard(&criterion.filter_type)),
                predicate: build_comparison(criterion, filter.name(), options)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Plan {
        model: model.name(),
        filter: filter.name(),
        steps,
    })
}

/// Compiles the specification of `F` over `M`.
pub fn compile<M: Record, F: Record>(
    overrides: &FieldOverrides<M, F>,
    options: &CompilerOptions,
) -> Result<Specification<M, F>> {
    let plan = plan(&M::shape(), &F::shape(), &overrides.fields(), options)?;

    let steps = plan
        .steps
        .iter()
        .map(|step| {
            trace!(model = plan.model, filter = plan.filter, step = %step, "lowering step");
            Ok(Narrow {
                admits: step.guard.map(|guard| {
                    let field = step.field;
                    Arc::new(move |filter: &F| guard.admits(&filter.field_value(field)))
                        as FilterTest<F>
                }),
                predicate: lower(&step.predicate, plan.filter, overrides)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        model = plan.model,
        filter = plan.filter,
        steps = steps.len(),
        "compiled specification"
    );
    Ok(Specification::compiled(plan, steps))
}

fn lower<M: Record, F: Record>(
    expr: &Expr,
    filter_name: &'static str,
    overrides: &FieldOverrides<M, F>,
) -> Result<Predicate<M, F>> {
    let predicate: Predicate<M, F> = match expr {
        Expr::Compare {
            comparison,
            model,
            filter,
        } => {
            let comparison = *comparison;
            let path = model.clone();
            let field = *filter;
            Arc::new(move |record: &M, filter: &F| {
                comparison.eval(&path.access(record), &filter.field_value(field))
            })
        }
        Expr::IsNull { model } => {
            let path = model.clone();
            Arc::new(move |record: &M, _: &F| path.access(record).is_none())
        }
        Expr::Custom { field } => {
            let field = *field;
            overrides
                .get(field)
                .cloned()
                .ok_or_else(|| SpecError::UnresolvedCriterion {
                    model: M::shape().name(),
                    filter: filter_name,
                    field,
                })?
        }
        Expr::Not(inner) => {
            let inner = lower(inner, filter_name, overrides)?;
            Arc::new(move |record: &M, filter: &F| !inner(record, filter))
        }
    };
    Ok(predicate)
}
