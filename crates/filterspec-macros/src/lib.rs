//! Derive macros for filterspec.
//!
//! # Available Macros
//!
//! - [`Record`] - Generate field descriptors and accessors for models and
//!   filters
//! - [`FieldEnum`] - Make a fieldless enum usable as a field type
//!
//! Generated code refers to the runtime crate as `::filterspec`, so these
//! macros are meant to be used through its re-exports.

mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `Record`, `FieldAccess` and `FieldValue` for a struct.
///
/// The same derive serves models and filters. On a model the `#[spec]`
/// attributes are ignored, except `skip` and `rename`, which change what the
/// compiler can see.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `skip` | Leave the field out of the shape |
/// | `rename = "..."` | Expose the field under another name |
/// | `op = "..."` | Comparison operator (default `auto`) |
/// | `negate` | Invert the comparison |
/// | `path = "a.b"` | Compare against this model path instead of the same-named field |
/// | `ignore` | Never build a criterion for this field |
/// | `keep_empty` | Apply the criterion even when the filter value is empty |
/// | `ignore_if_empty = bool` | Explicit form of the emptiness switch |
///
/// Operator names: `auto`, `eq`, `ne`, `gt`, `gte`, `lt`, `lte`, `like`,
/// `contains`, `starts_with`, `ends_with`, `in`, `is_null`, `is_not_null`.
/// `equal` and `not_equal` are accepted as long forms.
///
/// # Generated Code
///
/// The macro generates:
///
/// 1. Field name constants (e.g., `Person::NAME`, `PersonFilter::MIN_AGE`)
/// 2. `FieldAccess::field_value()` and `FieldAccess::all_fields_default()`
/// 3. `Record::shape()` listing every non-skipped field in declaration order
/// 4. `FieldValue`, so the struct can be nested inside another record
///
/// Every field type must implement `FieldValue`.
///
/// # Example
///
/// ```ignore
/// use filterspec::{Record, SpecificationFactory};
///
/// #[derive(Record)]
/// struct Person {
///     name: String,
///     age: u8,
/// }
///
/// #[derive(Record)]
/// struct PersonFilter {
///     #[spec(op = "starts_with")]
///     name: String,
///
///     #[spec(op = "gte", path = "age")]
///     min_age: u8,
///
///     #[spec(skip)]
///     page: usize,
/// }
///
/// assert_eq!(PersonFilter::MIN_AGE, "min_age");
///
/// let spec = SpecificationFactory::new().specification::<Person, PersonFilter>()?;
/// ```
#[proc_macro_derive(Record, attributes(spec))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `FieldValue` for an enum without data.
///
/// Values compare by variant position, ignoring explicit discriminants. The
/// first variant is the empty value, so a filter holding it is skipped like
/// an empty string would be.
///
/// # Example
///
/// ```ignore
/// use filterspec::{FieldEnum, Record};
///
/// #[derive(FieldEnum, Default)]
/// enum Status {
///     #[default]
///     Any,
///     Open,
///     Closed,
/// }
///
/// #[derive(Record)]
/// struct Ticket {
///     status: Status,
/// }
/// ```
#[proc_macro_derive(FieldEnum)]
pub fn field_enum_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::field_enum_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
