//! Process-wide store of compiled specifications.
//!
//! The cache is an explicit object, created once by the application and
//! shared by reference (usually inside a [`SpecificationFactory`]). Entries
//! are never replaced or invalidated: the first specification stored for a
//! pair is the one every later lookup sees. Each entry records its
//! [`Provenance`], so factories sharing the cache can tell a specification
//! compiled under other settings from their own.
//!
//! [`SpecificationFactory`]: crate::SpecificationFactory

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::error::{Result, SpecError};
use crate::options::CompilerOptions;
use crate::shape::short_type_name;
use crate::specification::Specification;

/// Cache key: the (model type, filter type) pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
    model: TypeId,
    filter: TypeId,
    model_name: &'static str,
    filter_name: &'static str,
}

impl PairKey {
    pub fn of<M: 'static, F: 'static>() -> Self {
        PairKey {
            model: TypeId::of::<M>(),
            filter: TypeId::of::<F>(),
            model_name: short_type_name::<M>(),
            filter_name: short_type_name::<F>(),
        }
    }

    pub fn model_name(&self) -> &'static str {
        self.model_name
    }

    pub fn filter_name(&self) -> &'static str {
        self.filter_name
    }

    /// Returns `true` if this key is the pair `(M, F)`.
    pub fn is<M: 'static, F: 'static>(&self) -> bool {
        self.model == TypeId::of::<M>() && self.filter == TypeId::of::<F>()
    }
}

impl fmt::Debug for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.model_name, self.filter_name)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A specification with its model and filter types erased.
///
/// This is what crosses the [`SpecificationProvider`] boundary.
///
/// [`SpecificationProvider`]: crate::SpecificationProvider
#[derive(Clone)]
pub struct ErasedSpecification {
    key: PairKey,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ErasedSpecification {
    pub fn new<M: 'static, F: 'static>(spec: Specification<M, F>) -> Self {
        ErasedSpecification {
            key: PairKey::of::<M, F>(),
            inner: Arc::new(spec),
        }
    }

    pub fn key(&self) -> PairKey {
        self.key
    }

    /// Recovers the typed specification, or `None` for another pair.
    pub fn downcast<M: 'static, F: 'static>(&self) -> Option<Specification<M, F>> {
        self.inner.downcast_ref::<Specification<M, F>>().cloned()
    }
}

impl<M: 'static, F: 'static> From<Specification<M, F>> for ErasedSpecification {
    fn from(spec: Specification<M, F>) -> Self {
        ErasedSpecification::new(spec)
    }
}

impl fmt::Debug for ErasedSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErasedSpecification").field(&self.key).finish()
    }
}

/// How a stored specification was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Registered by hand or returned by a provider. Valid for every factory.
    Supplied,
    /// Compiled with `options`. `overrides` identifies the predicate override
    /// set that was applied, if any.
    Compiled {
        options: CompilerOptions,
        overrides: Option<u64>,
    },
}

struct Stored {
    spec: ErasedSpecification,
    provenance: Provenance,
}

/// Concurrent map from [`PairKey`] to compiled specification.
///
/// At most one specification is ever stored per pair. Writers that race on
/// an empty slot go through [`insert_if_absent`](Self::insert_if_absent),
/// which is atomic per key: the loser discards its result and receives the
/// winner's.
#[derive(Default)]
pub struct SpecificationCache {
    entries: DashMap<PairKey, Stored>,
}

impl SpecificationCache {
    pub fn new() -> Self {
        SpecificationCache::default()
    }

    pub fn get<M: 'static, F: 'static>(&self) -> Option<Specification<M, F>> {
        self.lookup::<M, F>().map(|(spec, _)| spec)
    }

    /// Like [`get`](Self::get), but also returns how the entry was obtained.
    pub fn lookup<M: 'static, F: 'static>(&self) -> Option<(Specification<M, F>, Provenance)> {
        let key = PairKey::of::<M, F>();
        let stored = self.entries.get(&key)?;
        let spec = stored.spec.downcast::<M, F>()?;
        trace!(pair = %key, "specification cache hit");
        Some((spec, stored.provenance.clone()))
    }

    /// Stores `spec` unless the pair already has a specification, and
    /// returns whichever one is stored along with its provenance.
    pub fn insert_if_absent<M: 'static, F: 'static>(
        &self,
        spec: Specification<M, F>,
        provenance: Provenance,
    ) -> (Specification<M, F>, Provenance) {
        let key = PairKey::of::<M, F>();
        match self.entries.entry(key) {
            Entry::Occupied(stored) => {
                debug!(pair = %key, "specification already stored, discarding new one");
                let stored = stored.get();
                match stored.spec.downcast::<M, F>() {
                    Some(winner) => (winner, stored.provenance.clone()),
                    None => (spec, provenance),
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(Stored {
                    spec: ErasedSpecification::new(spec.clone()),
                    provenance: provenance.clone(),
                });
                (spec, provenance)
            }
        }
    }

    /// Stores `spec`, failing if the pair already has a specification.
    pub fn try_insert<M: 'static, F: 'static>(&self, spec: Specification<M, F>) -> Result<()> {
        let key = PairKey::of::<M, F>();
        match self.entries.entry(key) {
            Entry::Occupied(_) => Err(SpecError::AlreadyRegistered {
                model: key.model_name(),
                filter: key.filter_name(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Stored {
                    spec: ErasedSpecification::new(spec),
                    provenance: Provenance::Supplied,
                });
                Ok(())
            }
        }
    }

    pub fn contains(&self, key: &PairKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for SpecificationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecificationCache")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Model;
    struct Filter;
    struct OtherFilter;

    fn always() -> Specification<Model, Filter> {
        Specification::from_fn(|_: &Model, _: &Filter| true)
    }

    fn compiled(options: CompilerOptions) -> Provenance {
        Provenance::Compiled {
            options,
            overrides: None,
        }
    }

    #[test]
    fn keys_name_the_pair() {
        let key = PairKey::of::<Model, Filter>();
        assert_eq!(key.to_string(), "(Model, Filter)");
        assert!(key.is::<Model, Filter>());
        assert!(!key.is::<Model, OtherFilter>());
        assert_ne!(key, PairKey::of::<Model, OtherFilter>());
    }

    #[test]
    fn first_insert_wins() {
        let cache = SpecificationCache::new();
        let first = always();
        let (stored, _) = cache.insert_if_absent(first.clone(), Provenance::Supplied);
        assert!(stored.ptr_eq(&first));

        let (second, provenance) =
            cache.insert_if_absent(always(), compiled(CompilerOptions::default()));
        assert!(second.ptr_eq(&first));
        assert_eq!(provenance, Provenance::Supplied);
        assert_eq!(cache.len(), 1);
        assert!(cache.get::<Model, Filter>().unwrap().ptr_eq(&first));
    }

    #[test]
    fn try_insert_rejects_occupied_pairs() {
        let cache = SpecificationCache::new();
        cache.try_insert(always()).unwrap();
        let err = cache.try_insert(always()).unwrap_err();
        assert!(matches!(
            err,
            SpecError::AlreadyRegistered {
                model: "Model",
                filter: "Filter"
            }
        ));
    }

    #[test]
    fn erased_round_trip() {
        let spec = always();
        let erased = ErasedSpecification::from(spec.clone());
        assert_eq!(erased.key(), PairKey::of::<Model, Filter>());
        assert!(erased.downcast::<Model, Filter>().unwrap().ptr_eq(&spec));
        assert!(erased.downcast::<Model, OtherFilter>().is_none());
    }

    #[test]
    fn pairs_are_independent() {
        let cache = SpecificationCache::new();
        cache.insert_if_absent(always(), Provenance::Supplied);
        assert!(cache.contains(&PairKey::of::<Model, Filter>()));
        assert!(!cache.contains(&PairKey::of::<Model, OtherFilter>()));
        assert!(cache.get::<Model, OtherFilter>().is_none());
    }

    #[test]
    fn entries_remember_their_provenance() {
        let cache = SpecificationCache::new();
        let options = CompilerOptions::default().ignore_if_empty(false);
        cache.insert_if_absent(always(), compiled(options.clone()));

        let (_, provenance) = cache.lookup::<Model, Filter>().unwrap();
        assert_eq!(provenance, compiled(options));
        assert_ne!(provenance, compiled(CompilerOptions::default()));

        let other = SpecificationCache::new();
        other.try_insert(always()).unwrap();
        assert_eq!(
            other.lookup::<Model, Filter>().unwrap().1,
            Provenance::Supplied
        );
    }
}
