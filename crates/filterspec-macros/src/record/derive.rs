//! Implementation of the `#[derive(Record)]` macro.
//!
//! This macro generates the `FieldAccess`, `Record` and `FieldValue`
//! implementations for a struct, plus field name constants.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result};

use super::attrs::{parse_spec_attrs, SpecAttr};

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let struct_name_str = struct_name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Ensure we have a struct with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Record can only be derived for structs",
            ))
        }
    };

    let mut descriptors: Vec<TokenStream> = Vec::new();
    let mut value_arms: Vec<TokenStream> = Vec::new();
    let mut default_checks: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut exposed: Vec<(String, proc_macro2::Span)> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;
        let field_ty = &field.ty;

        let attrs = parse_spec_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let exposed_name = attrs
            .rename
            .clone()
            .unwrap_or_else(|| field_name.to_string());
        if let Some((_, first)) = exposed.iter().find(|(name, _)| *name == exposed_name) {
            let mut err = Error::new(
                field.span(),
                format!("duplicate field name '{}'", exposed_name),
            );
            err.combine(Error::new(*first, "first declared here"));
            return Err(err);
        }
        exposed.push((exposed_name.clone(), field.span()));

        let const_name = format_ident!("{}", to_screaming_snake_case(&exposed_name));
        field_constants.push(quote! {
            /// Exposed field name.
            pub const #const_name: &'static str = #exposed_name;
        });

        let meta = field_meta(&attrs);
        descriptors.push(quote! {
            ::filterspec::FieldDescriptor::new(
                #exposed_name,
                <#field_ty as ::filterspec::FieldValue>::field_type(),
            )
            .with_meta(#meta)
        });

        value_arms.push(quote! {
            #exposed_name => ::filterspec::FieldValue::to_value(&self.#field_name),
        });

        default_checks.push(quote! {
            && ::filterspec::FieldValue::to_value(&self.#field_name).is_default()
        });
    }

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*
        }

        impl #impl_generics ::filterspec::FieldAccess for #struct_name #ty_generics #where_clause {
            fn field_value(&self, field: &str) -> ::filterspec::Value<'_> {
                match field {
                    #(#value_arms)*
                    _ => ::filterspec::Value::None,
                }
            }

            fn all_fields_default(&self) -> bool {
                true #(#default_checks)*
            }
        }

        impl #impl_generics ::filterspec::Record for #struct_name #ty_generics #where_clause {
            fn shape() -> ::filterspec::Shape {
                ::filterspec::Shape::new::<Self>(
                    #struct_name_str,
                    ::std::vec![#(#descriptors),*],
                )
            }
        }

        impl #impl_generics ::filterspec::FieldValue for #struct_name #ty_generics #where_clause {
            fn field_type() -> ::filterspec::FieldType {
                ::filterspec::FieldType::Record(::filterspec::RecordType::of::<Self>())
            }

            fn to_value(&self) -> ::filterspec::Value<'_> {
                ::filterspec::Value::Record(self)
            }
        }
    };

    Ok(expanded)
}

fn field_meta(attrs: &SpecAttr) -> TokenStream {
    let operator = format_ident!("{}", attrs.op.unwrap_or("Auto"));
    let negate = attrs.negate;
    let ignore = attrs.ignore;
    let path = match &attrs.path {
        Some(path) => quote! { ::std::option::Option::Some(#path) },
        None => quote! { ::std::option::Option::None },
    };
    let ignore_if_empty = match attrs.ignore_if_empty {
        Some(flag) => quote! { ::std::option::Option::Some(#flag) },
        None => quote! { ::std::option::Option::None },
    };

    quote! {
        ::filterspec::FieldMeta {
            operator: ::filterspec::Operator::#operator,
            negate: #negate,
            path: #path,
            ignore: #ignore,
            ignore_if_empty: #ignore_if_empty,
        }
    }
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' || c == '.' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}
