//! Strongly typed predicate overrides.
//!
//! An override replaces structural matching for one filter field. It is
//! registered with the exact value type of the field, and the declared type
//! is checked against the filter's shape when the override is registered,
//! not when it first runs.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Result, SpecError};
use crate::specification::Predicate;
use crate::traits::{FieldValue, Record};

/// Predicate overrides registered for one (model, filter) pair.
pub struct FieldOverrides<M, F> {
    entries: Vec<(&'static str, Predicate<M, F>)>,
}

impl<M: Record, F: Record> FieldOverrides<M, F> {
    pub fn new() -> Self {
        FieldOverrides {
            entries: Vec::new(),
        }
    }

    /// Registers `predicate` for the filter field `field`.
    ///
    /// `getter` reads the field from the filter; `predicate` receives that
    /// value and a model record. Registering the same field twice replaces
    /// the earlier override.
    ///
    /// # Errors
    ///
    /// [`SpecError::UnknownField`] if the filter has no such field,
    /// [`SpecError::IgnoredField`] if the field is marked `ignore`, and
    /// [`SpecError::IncompatibleOverride`] if `V` is not the field's declared
    /// type.
    pub fn insert<V, G, P>(&mut self, field: &str, getter: G, predicate: P) -> Result<()>
    where
        V: FieldValue + 'static,
        G: Fn(&F) -> &V + Send + Sync + 'static,
        P: Fn(&V, &M) -> bool + Send + Sync + 'static,
    {
        let shape = F::shape();
        let descriptor = shape.field(field).ok_or_else(|| SpecError::UnknownField {
            filter: shape.name(),
            field: field.to_string(),
        })?;

        if descriptor.meta.ignore {
            return Err(SpecError::IgnoredField {
                filter: shape.name(),
                field: descriptor.name,
            });
        }

        let actual = V::field_type();
        if descriptor.ty != actual {
            return Err(SpecError::IncompatibleOverride {
                filter: shape.name(),
                field: descriptor.name,
                expected: descriptor.ty.to_string(),
                actual: actual.to_string(),
            });
        }

        let name = descriptor.name;
        let custom: Predicate<M, F> =
            Arc::new(move |model: &M, filter: &F| predicate(getter(filter), model));
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = custom,
            None => self.entries.push((name, custom)),
        }
        Ok(())
    }
}

impl<M, F> FieldOverrides<M, F> {
    pub fn get(&self, field: &str) -> Option<&Predicate<M, F>> {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, predicate)| predicate)
    }

    /// Names of the overridden filter fields.
    pub fn fields(&self) -> HashSet<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<M, F> Default for FieldOverrides<M, F> {
    fn default() -> Self {
        FieldOverrides {
            entries: Vec::new(),
        }
    }
}

impl<M, F> Clone for FieldOverrides<M, F> {
    fn clone(&self) -> Self {
        FieldOverrides {
            entries: self.entries.clone(),
        }
    }
}
