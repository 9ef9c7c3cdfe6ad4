//! Compiled specifications and the query source they narrow.

use std::fmt;
use std::sync::Arc;

use crate::expr::Plan;

/// A model-side predicate, parameterized by the filter instance.
pub type Predicate<M, F> = Arc<dyn Fn(&M, &F) -> bool + Send + Sync>;

/// A test on the filter instance alone; the lowered emptiness guard.
pub type FilterTest<F> = Arc<dyn Fn(&F) -> bool + Send + Sync>;

/// A queryable sequence of model records.
///
/// The only operation a specification needs is narrowing by a boolean
/// predicate. How the narrowing is executed (in memory, by a database, by an
/// HTTP backend that pages results) is up to the implementation.
pub trait QuerySource<M>: Sized {
    /// Keeps only the records for which `predicate` returns `true`.
    fn narrow<P>(self, predicate: P) -> Self
    where
        P: Fn(&M) -> bool;
}

impl<M> QuerySource<M> for Vec<M> {
    fn narrow<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&M) -> bool,
    {
        self.retain(|record| predicate(record));
        self
    }
}

impl<'a, M> QuerySource<M> for Vec<&'a M> {
    fn narrow<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&M) -> bool,
    {
        self.retain(|record| predicate(*record));
        self
    }
}

/// One sequential narrowing step after lowering.
pub(crate) struct Narrow<M, F> {
    pub(crate) admits: Option<FilterTest<F>>,
    pub(crate) predicate: Predicate<M, F>,
}

struct Inner<M, F> {
    plan: Option<Plan>,
    steps: Vec<Narrow<M, F>>,
}

/// An immutable, compiled filter function for a (model, filter) pair.
///
/// Applying a specification runs its steps in filter declaration order. A
/// step whose guard rejects the filter value is skipped; every other step
/// narrows the running query further, so the steps combine with AND.
///
/// Cloning is cheap: clones share the compiled steps.
///
/// # Example
///
/// ```
/// use filterspec::{Record, SpecificationFactory};
///
/// #[derive(Record)]
/// struct Person {
///     id: i32,
///     name: String,
/// }
///
/// #[derive(Record)]
/// struct PersonFilter {
///     name: String,
/// }
///
/// let factory = SpecificationFactory::new();
/// let spec = factory.specification::<Person, PersonFilter>().unwrap();
///
/// let people = vec![
///     Person { id: 1, name: "Alice".into() },
///     Person { id: 2, name: "Bob".into() },
/// ];
/// let filter = PersonFilter { name: "Ali".into() };
/// let found = spec.apply(people, &filter);
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].id, 1);
/// ```
pub struct Specification<M, F> {
    inner: Arc<Inner<M, F>>,
}

impl<M, F> Specification<M, F> {
    pub(crate) fn compiled(plan: Plan, steps: Vec<Narrow<M, F>>) -> Self {
        Specification {
            inner: Arc::new(Inner {
                plan: Some(plan),
                steps,
            }),
        }
    }

    /// Wraps a hand-written predicate as a specification.
    ///
    /// This is how manually registered and provider-supplied specifications
    /// are usually built. They have no [`Plan`].
    pub fn from_fn<P>(predicate: P) -> Self
    where
        P: Fn(&M, &F) -> bool + Send + Sync + 'static,
    {
        Specification {
            inner: Arc::new(Inner {
                plan: None,
                steps: vec![Narrow {
                    admits: None,
                    predicate: Arc::new(predicate),
                }],
            }),
        }
    }

    /// The IR this specification was compiled from, if it was compiled.
    pub fn plan(&self) -> Option<&Plan> {
        self.inner.plan.as_ref()
    }

    /// Returns `true` if both handles share the same compiled function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ========================================================================
    // Application
    // ========================================================================

    /// Narrows `query` by every step whose guard admits `filter`.
    pub fn apply<Q>(&self, query: Q, filter: &F) -> Q
    where
        Q: QuerySource<M>,
    {
        self.active_steps(filter).fold(query, |query, step| {
            let predicate = &step.predicate;
            query.narrow(|record| predicate(record, filter))
        })
    }

    /// Returns `true` if a single record passes every active step.
    pub fn matches(&self, record: &M, filter: &F) -> bool {
        self.active_steps(filter)
            .all(|step| (step.predicate)(record, filter))
    }

    /// Returns references to the matching records, in input order.
    pub fn filter<'a>(&self, records: &'a [M], filter: &F) -> Vec<&'a M> {
        self.apply(records.iter().collect(), filter)
    }

    /// Counts the matching records.
    pub fn count(&self, records: &[M], filter: &F) -> usize {
        records
            .iter()
            .filter(|record| self.matches(record, filter))
            .count()
    }

    /// Removes the records that do not match, in place.
    pub fn retain(&self, records: &mut Vec<M>, filter: &F) {
        records.retain(|record| self.matches(record, filter));
    }

    // Guards are evaluated per call, before any record is looked at.
    fn active_steps<'s>(&'s self, filter: &'s F) -> impl Iterator<Item = &'s Narrow<M, F>> + 's {
        self.inner
            .steps
            .iter()
            .filter(move |step| step.admits.as_ref().map_or(true, |admits| admits(filter)))
    }
}

impl<M, F> Clone for Specification<M, F> {
    fn clone(&self) -> Self {
        Specification {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M, F> fmt::Debug for Specification<M, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.plan {
            Some(plan) => f
                .debug_struct("Specification")
                .field("model", &plan.model)
                .field("filter", &plan.filter)
                .field("steps", &plan.steps.len())
                .finish(),
            None => f.debug_struct("Specification").finish_non_exhaustive(),
        }
    }
}
