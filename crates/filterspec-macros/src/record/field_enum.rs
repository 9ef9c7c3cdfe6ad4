//! Implementation of the `#[derive(FieldEnum)]` macro.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result};

/// Generates `FieldValue` for a fieldless enum. Values are compared by
/// variant index, so the first variant is the enum's empty value.
pub fn field_enum_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let enum_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let variants = match &input.data {
        Data::Enum(data) => &data.variants,
        _ => {
            return Err(Error::new(
                input.span(),
                "FieldEnum can only be derived for enums",
            ))
        }
    };

    if variants.is_empty() {
        return Err(Error::new(
            input.span(),
            "FieldEnum requires at least one variant",
        ));
    }

    let mut arms: Vec<TokenStream> = Vec::new();
    for (index, variant) in variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(Error::new(
                variant.span(),
                "FieldEnum variants cannot carry data",
            ));
        }
        let ident = &variant.ident;
        let index = index as u32;
        arms.push(quote! { Self::#ident => #index, });
    }

    Ok(quote! {
        impl #impl_generics ::filterspec::FieldValue for #enum_name #ty_generics #where_clause {
            fn field_type() -> ::filterspec::FieldType {
                ::filterspec::FieldType::Enum(::filterspec::EnumType::of::<Self>())
            }

            fn to_value(&self) -> ::filterspec::Value<'_> {
                ::filterspec::Value::Enum(match self {
                    #(#arms)*
                })
            }
        }
    })
}
