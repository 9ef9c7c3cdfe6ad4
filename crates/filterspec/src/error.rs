//! Error types for the filterspec crate.
//!
//! Every error is deterministic for a given (model, filter) pair. None of
//! them are transient, so callers should not retry.

use thiserror::Error;

/// Errors raised while compiling, registering or looking up specifications.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A filter field has no override, no explicit path and no structural
    /// match on the model.
    #[error("filter field '{filter}.{field}' does not match any field of '{model}'")]
    UnresolvedCriterion {
        model: &'static str,
        filter: &'static str,
        field: &'static str,
    },

    /// An explicit target path names a field the model does not have.
    #[error("path '{path}' of filter field '{filter}.{field}' does not exist on '{model}'")]
    InvalidPath {
        model: &'static str,
        filter: &'static str,
        field: &'static str,
        path: String,
    },

    /// An explicit target path exists but its type cannot be compared with
    /// the filter field.
    #[error(
        "filter field '{filter}.{field}' ({filter_type}) cannot be compared with '{model}.{path}' ({model_type})"
    )]
    IncompatibleTypes {
        model: &'static str,
        filter: &'static str,
        field: &'static str,
        path: String,
        filter_type: String,
        model_type: String,
    },

    /// Operator is not valid for the matched field types.
    #[error(
        "operator '{op}' is not valid for filter field '{filter}.{field}' ({filter_type} against {model_type})"
    )]
    InvalidOperator {
        op: &'static str,
        filter: &'static str,
        field: &'static str,
        filter_type: String,
        model_type: String,
    },

    /// A registration named a field the filter does not declare.
    #[error("filter '{filter}' has no field '{field}'")]
    UnknownField {
        filter: &'static str,
        field: String,
    },

    /// A predicate override was registered with the wrong value type.
    #[error("predicate override for '{filter}.{field}' expects {expected}, got {actual}")]
    IncompatibleOverride {
        filter: &'static str,
        field: &'static str,
        expected: String,
        actual: String,
    },

    /// A predicate override targets a field marked `ignore`, which never
    /// produces a criterion.
    #[error("filter field '{filter}.{field}' is ignored and cannot be overridden")]
    IgnoredField {
        filter: &'static str,
        field: &'static str,
    },

    /// The pair already has a stored specification.
    #[error("a specification for ({model}, {filter}) is already registered")]
    AlreadyRegistered {
        model: &'static str,
        filter: &'static str,
    },

    /// An external provider returned a specification of another pair.
    #[error("specification provider returned a mismatched specification for ({model}, {filter})")]
    ProviderMismatch {
        model: &'static str,
        filter: &'static str,
    },

    /// A shared cache holds a specification of this pair compiled with other
    /// options or overrides than the requesting factory's.
    #[error(
        "specification for ({model}, {filter}) in the shared cache was compiled with different options or overrides"
    )]
    ConfigurationMismatch {
        model: &'static str,
        filter: &'static str,
    },

    /// No registration, provider or compilation produced a specification.
    #[error("no specification configured for ({model}, {filter})")]
    NotConfigured {
        model: &'static str,
        filter: &'static str,
        #[source]
        source: Box<SpecError>,
    },
}

/// Result type for filterspec operations.
pub type Result<T> = std::result::Result<T, SpecError>;
