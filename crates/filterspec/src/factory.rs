//! Specification lookup, registration and memoization.
//!
//! [`SpecificationFactory::specification`] resolves a pair in this order:
//!
//! 1. a specification already in the cache (manually registered or
//!    memoized from an earlier lookup);
//! 2. the configured [`SpecificationProvider`], if any;
//! 3. the compiler.
//!
//! The first successful result is stored permanently. Factories sharing a
//! cache accept each other's compiled specifications only when they were
//! compiled with the same options and overrides.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::cache::{ErasedSpecification, PairKey, Provenance, SpecificationCache};
use crate::compiler::compile;
use crate::error::{Result, SpecError};
use crate::options::CompilerOptions;
use crate::overrides::FieldOverrides;
use crate::specification::Specification;
use crate::traits::{FieldValue, Record};

/// External source of hand-written specifications.
///
/// Returning `None` falls through to the compiler. Closures of the right
/// signature are providers.
pub trait SpecificationProvider: Send + Sync {
    fn provide(&self, key: &PairKey) -> Option<ErasedSpecification>;
}

impl<T> SpecificationProvider for T
where
    T: Fn(&PairKey) -> Option<ErasedSpecification> + Send + Sync,
{
    fn provide(&self, key: &PairKey) -> Option<ErasedSpecification> {
        self(key)
    }
}

/// A provider backed by a map, filled in at application startup.
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
    specifications: HashMap<PairKey, ErasedSpecification>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        ProviderRegistry::default()
    }

    /// Adds a specification, replacing any earlier one for the same pair.
    pub fn with<M: 'static, F: 'static>(mut self, spec: Specification<M, F>) -> Self {
        self.insert(spec);
        self
    }

    pub fn insert<M: 'static, F: 'static>(&mut self, spec: Specification<M, F>) {
        let erased = ErasedSpecification::new(spec);
        self.specifications.insert(erased.key(), erased);
    }

    pub fn len(&self) -> usize {
        self.specifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specifications.is_empty()
    }
}

impl SpecificationProvider for ProviderRegistry {
    fn provide(&self, key: &PairKey) -> Option<ErasedSpecification> {
        self.specifications.get(key).cloned()
    }
}

static NEXT_OVERRIDE_SET: AtomicU64 = AtomicU64::new(1);

/// Predicate overrides registered for one pair. `id` changes on every
/// registration.
struct OverrideSet {
    id: u64,
    overrides: Box<dyn Any + Send + Sync>,
}

/// Builder for [`SpecificationFactory`].
#[derive(Default)]
pub struct SpecificationFactoryBuilder {
    options: CompilerOptions,
    provider: Option<Arc<dyn SpecificationProvider>>,
    cache: Option<Arc<SpecificationCache>>,
}

impl SpecificationFactoryBuilder {
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_provider(mut self, provider: impl SpecificationProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Shares an existing cache instead of creating a new one.
    pub fn with_cache(mut self, cache: Arc<SpecificationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> SpecificationFactory {
        SpecificationFactory {
            options: self.options,
            provider: self.provider,
            cache: self.cache.unwrap_or_default(),
            overrides: DashMap::new(),
        }
    }
}

/// Entry point for obtaining specifications.
///
/// A factory is meant to be created once at startup and shared (it is
/// `Send + Sync`). Overrides and manual registrations belong to startup
/// too: once a pair has been looked up, its specification is fixed.
///
/// # Example
///
/// ```
/// use filterspec::{CompilerOptions, LikeMatching, Record, SpecificationFactory};
///
/// #[derive(Record)]
/// struct Book {
///     title: String,
///     pages: u32,
/// }
///
/// #[derive(Record)]
/// struct BookFilter {
///     title: String,
///     #[spec(op = "gte", path = "pages")]
///     min_pages: u32,
/// }
///
/// let factory = SpecificationFactory::builder()
///     .with_options(CompilerOptions::default().like(LikeMatching::CaseInsensitive))
///     .build();
/// let spec = factory.specification::<Book, BookFilter>()?;
///
/// let books = vec![
///     Book { title: "Rust in Action".into(), pages: 456 },
///     Book { title: "Trusty Tales".into(), pages: 90 },
/// ];
/// let filter = BookFilter { title: "rust".into(), min_pages: 100 };
/// assert_eq!(spec.count(&books, &filter), 1);
/// # Ok::<(), filterspec::SpecError>(())
/// ```
pub struct SpecificationFactory {
    options: CompilerOptions,
    provider: Option<Arc<dyn SpecificationProvider>>,
    cache: Arc<SpecificationCache>,
    overrides: DashMap<PairKey, OverrideSet>,
}

impl SpecificationFactory {
    /// A factory with default options, no provider and its own cache.
    pub fn new() -> Self {
        SpecificationFactory::builder().build()
    }

    pub fn builder() -> SpecificationFactoryBuilder {
        SpecificationFactoryBuilder::default()
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<SpecificationCache> {
        &self.cache
    }

    /// Returns the specification for `(M, F)`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// [`SpecError::ProviderMismatch`] if the provider returns a
    /// specification of another pair, [`SpecError::NotConfigured`]
    /// (carrying the compile error) if compilation fails, and
    /// [`SpecError::ConfigurationMismatch`] if a shared cache already holds
    /// this pair compiled with other options or overrides.
    pub fn specification<M: Record, F: Record>(&self) -> Result<Specification<M, F>> {
        let key = PairKey::of::<M, F>();
        if let Some((spec, stored)) = self.cache.lookup::<M, F>() {
            return self.accept(&key, spec, &stored, &self.provenance(&key));
        }

        let (overrides, expected) = self.overrides_for::<M, F>(&key);
        if let Some(provider) = &self.provider {
            if let Some(erased) = provider.provide(&key) {
                let spec = erased
                    .downcast::<M, F>()
                    .ok_or(SpecError::ProviderMismatch {
                        model: key.model_name(),
                        filter: key.filter_name(),
                    })?;
                debug!(pair = %key, "specification supplied by provider");
                let (spec, stored) = self.cache.insert_if_absent(spec, Provenance::Supplied);
                return self.accept(&key, spec, &stored, &expected);
            }
        }

        let spec = compile(&overrides, &self.options).map_err(|source| {
            warn!(pair = %key, error = %source, "no specification available");
            SpecError::NotConfigured {
                model: key.model_name(),
                filter: key.filter_name(),
                source: Box::new(source),
            }
        })?;
        let (spec, stored) = self.cache.insert_if_absent(spec, expected.clone());
        self.accept(&key, spec, &stored, &expected)
    }

    /// Registers a hand-written specification for `(M, F)`.
    ///
    /// # Errors
    ///
    /// [`SpecError::AlreadyRegistered`] if the pair already has one.
    pub fn register<M: Record, F: Record>(&self, spec: Specification<M, F>) -> Result<()> {
        self.cache.try_insert(spec)?;
        debug!(pair = %PairKey::of::<M, F>(), "specification registered");
        Ok(())
    }

    /// Replaces structural matching of the filter field `field` with
    /// `predicate`.
    ///
    /// `V` must be the declared type of the field; this is checked here.
    ///
    /// # Example
    ///
    /// ```
    /// use filterspec::{Record, SpecificationFactory};
    ///
    /// #[derive(Record)]
    /// struct Person {
    ///     first: String,
    ///     last: String,
    /// }
    ///
    /// #[derive(Record)]
    /// struct PersonFilter {
    ///     full_name: String,
    /// }
    ///
    /// let factory = SpecificationFactory::new();
    /// factory.override_field::<Person, PersonFilter, String, _, _>(
    ///     "full_name",
    ///     |f| &f.full_name,
    ///     |name, p| format!("{} {}", p.first, p.last) == *name,
    /// )?;
    ///
    /// let spec = factory.specification::<Person, PersonFilter>()?;
    /// let ada = Person { first: "Ada".into(), last: "Lovelace".into() };
    /// assert!(spec.matches(&ada, &PersonFilter { full_name: "Ada Lovelace".into() }));
    /// # Ok::<(), filterspec::SpecError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// [`SpecError::UnknownField`], [`SpecError::IncompatibleOverride`], or
    /// [`SpecError::AlreadyRegistered`] if the pair already has a stored
    /// specification.
    pub fn override_field<M, F, V, G, P>(&self, field: &str, getter: G, predicate: P) -> Result<()>
    where
        M: Record,
        F: Record,
        V: FieldValue + 'static,
        G: Fn(&F) -> &V + Send + Sync + 'static,
        P: Fn(&V, &M) -> bool + Send + Sync + 'static,
    {
        let key = PairKey::of::<M, F>();
        if self.cache.contains(&key) {
            return Err(SpecError::AlreadyRegistered {
                model: key.model_name(),
                filter: key.filter_name(),
            });
        }

        let mut slot = self.overrides.entry(key).or_insert_with(|| OverrideSet {
            id: 0,
            overrides: Box::new(FieldOverrides::<M, F>::new()),
        });
        let mut overrides = slot
            .overrides
            .downcast_ref::<FieldOverrides<M, F>>()
            .cloned()
            .unwrap_or_default();
        overrides.insert(field, getter, predicate)?;
        *slot = OverrideSet {
            id: NEXT_OVERRIDE_SET.fetch_add(1, Ordering::Relaxed),
            overrides: Box::new(overrides),
        };
        debug!(pair = %key, field, "predicate override registered");
        Ok(())
    }

    /// The overrides this factory compiles `(M, F)` with, and the provenance
    /// a specification compiled from them carries.
    fn overrides_for<M: Record, F: Record>(
        &self,
        key: &PairKey,
    ) -> (FieldOverrides<M, F>, Provenance) {
        let (overrides, id) = match self.overrides.get(key) {
            Some(slot) => (
                slot.overrides
                    .downcast_ref::<FieldOverrides<M, F>>()
                    .cloned()
                    .unwrap_or_default(),
                Some(slot.id),
            ),
            None => (FieldOverrides::default(), None),
        };
        (overrides, self.compiled_with(id))
    }

    fn provenance(&self, key: &PairKey) -> Provenance {
        self.compiled_with(self.overrides.get(key).map(|slot| slot.id))
    }

    fn compiled_with(&self, overrides: Option<u64>) -> Provenance {
        Provenance::Compiled {
            options: self.options.clone(),
            overrides,
        }
    }

    /// Hands out a stored specification unless another factory compiled it
    /// under settings this one does not share.
    fn accept<M, F>(
        &self,
        key: &PairKey,
        spec: Specification<M, F>,
        stored: &Provenance,
        expected: &Provenance,
    ) -> Result<Specification<M, F>> {
        if *stored == Provenance::Supplied || stored == expected {
            return Ok(spec);
        }
        warn!(
            pair = %key,
            stored = ?stored,
            expected = ?expected,
            "shared cache holds a specification compiled with other settings"
        );
        Err(SpecError::ConfigurationMismatch {
            model: key.model_name(),
            filter: key.filter_name(),
        })
    }
}

impl Default for SpecificationFactory {
    fn default() -> Self {
        SpecificationFactory::new()
    }
}

impl fmt::Debug for SpecificationFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecificationFactory")
            .field("options", &self.options)
            .field("provider", &self.provider.is_some())
            .field("cache", &self.cache)
            .field("overrides", &self.overrides.len())
            .finish()
    }
}
