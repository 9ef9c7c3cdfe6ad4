//! filterspec - Compile flat filter structs into reusable specifications.
//!
//! A *filter* is a plain struct describing search criteria. A *model* is the
//! record type being searched. filterspec matches the filter's fields against
//! the model's fields by name and type, builds one comparison per filter
//! field, and compiles them into a [`Specification`]: an immutable function
//! that narrows a query of models given a filter instance.
//!
//! The analysis runs once per (model, filter) pair. The result is cached in
//! a [`SpecificationFactory`] and shared by every later lookup.
//!
//! # Quick Start
//!
//! ```rust
//! use filterspec::{Record, SpecificationFactory};
//!
//! #[derive(Record)]
//! struct Person {
//!     id: i32,
//!     name: String,
//!     email: Option<String>,
//! }
//!
//! #[derive(Record)]
//! struct PersonFilter {
//!     // strings default to substring matching
//!     name: String,
//!     // a collection against a scalar is "any of"
//!     #[spec(rename = "id")]
//!     ids: Vec<i32>,
//!     #[spec(op = "is_null", path = "email")]
//!     no_email: bool,
//! }
//!
//! let factory = SpecificationFactory::new();
//! let spec = factory.specification::<Person, PersonFilter>()?;
//!
//! let people = vec![
//!     Person { id: 1, name: "Alice".into(), email: None },
//!     Person { id: 2, name: "Alicia".into(), email: Some("a@x.org".into()) },
//!     Person { id: 3, name: "Bob".into(), email: None },
//! ];
//!
//! // Empty values skip their criterion: only `name` applies here.
//! let filter = PersonFilter { name: "Ali".into(), ids: vec![], no_email: false };
//! assert_eq!(spec.count(&people, &filter), 2);
//!
//! let filter = PersonFilter { name: String::new(), ids: vec![1, 3], no_email: true };
//! let found = spec.filter(&people, &filter);
//! assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3]);
//! # Ok::<(), filterspec::SpecError>(())
//! ```
//!
//! # Matching
//!
//! A filter field matches the model field of the same name when the types
//! are identical, when one is `Option` of the other, or when one side is a
//! collection of the other. Numeric types never widen: `i32` does not match
//! `i64`. A field can name its target explicitly with `#[spec(path = "a.b")]`
//! or be replaced by a typed predicate with
//! [`SpecificationFactory::override_field`].
//!
//! Every field must resolve. A filter field that matches nothing fails the
//! whole pair instead of being silently dropped.
//!
//! # Operators
//!
//! | Operator | Field types |
//! |----------|-------------|
//! | `eq`, `ne` | any scalar except nested records |
//! | `gt`, `gte`, `lt`, `lte` | numbers, timestamps, strings |
//! | `like`, `contains`, `starts_with`, `ends_with` | strings |
//! | `in` | a collection on either side |
//! | `is_null`, `is_not_null` | optional model fields |
//!
//! `auto` (the default) picks `in` for collections, `like` for strings and
//! `eq` for everything else.
//!
//! # Empty Values
//!
//! Unless a field says `keep_empty`, its criterion is skipped when the filter
//! value is empty: blank strings, empty collections, `None`, the blank
//! timestamp, `false`, the first enum variant, and numbers that are not
//! strictly positive (zero counts as empty).

extern crate self as filterspec;

mod builder;
mod cache;
mod compiler;
mod criterion;
mod error;
mod expr;
mod factory;
mod guard;
mod matcher;
mod op;
mod options;
mod overrides;
mod path;
mod shape;
mod specification;
mod traits;
mod value;

// Re-export public API
pub use builder::build_comparison;
pub use cache::{ErasedSpecification, PairKey, Provenance, SpecificationCache};
pub use compiler::{compile, plan};
pub use criterion::{resolve, Criterion, Target};
pub use error::{Result, SpecError};
pub use expr::{Comparison, Expr, Plan, Step};
pub use factory::{
    ProviderRegistry, SpecificationFactory, SpecificationFactoryBuilder, SpecificationProvider,
};
pub use guard::{build_guard, Guard};
pub use matcher::{compatibility, match_fields, MatchKind, PropertyMatch, PropertyMatchSet};
pub use op::{Operator, UnknownOperator};
pub use options::{CompilerOptions, LikeMatching};
pub use overrides::FieldOverrides;
pub use path::{resolve_path, FieldPath, ResolvedPath};
pub use shape::{EnumType, FieldDescriptor, FieldMeta, FieldType, NumberKind, RecordType, Shape};
pub use specification::{FilterTest, Predicate, QuerySource, Specification};
pub use traits::{FieldAccess, FieldValue, Record};
pub use value::{Number, Timestamp, Value};

pub use filterspec_macros::{FieldEnum, Record};
