//! Implementation of the `#[derive(Record)]` and `#[derive(FieldEnum)]`
//! macros.
//!
//! These generate the field descriptors and run-time accessors that the
//! specification compiler reads, from struct and enum definitions plus
//! `#[spec(...)]` field annotations.

mod attrs;
mod derive;
mod field_enum;

pub use derive::record_derive_impl;
pub use field_enum::field_enum_derive_impl;
