//! Attribute parsing for the Record derive macro.
//!
//! This module parses the `#[spec(...)]` field attributes that carry
//! criterion metadata for filter fields.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Expr, ExprLit, Lit, LitStr, Meta, Result, Token,
};

/// Operator names accepted by `op = "..."`, with the `Operator` variant each
/// one maps to.
const OPERATORS: &[(&str, &str)] = &[
    ("auto", "Auto"),
    ("eq", "Equal"),
    ("equal", "Equal"),
    ("ne", "NotEqual"),
    ("not_equal", "NotEqual"),
    ("gt", "GreaterThan"),
    ("gte", "GreaterOrEqual"),
    ("lt", "LessThan"),
    ("lte", "LessOrEqual"),
    ("like", "Like"),
    ("contains", "Contains"),
    ("starts_with", "StartsWith"),
    ("ends_with", "EndsWith"),
    ("in", "In"),
    ("is_null", "IsNull"),
    ("is_not_null", "IsNotNull"),
];

/// Resolve an operator name to its variant name.
pub fn operator_variant(name: &str, span: Span) -> Result<&'static str> {
    OPERATORS
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, variant)| *variant)
        .ok_or_else(|| {
            Error::new(
                span,
                format!(
                    "unknown operator: '{}'. Expected one of: auto, eq, ne, gt, gte, lt, lte, like, contains, starts_with, ends_with, in, is_null, is_not_null",
                    name
                ),
            )
        })
}

/// Field-level attributes from `#[spec(...)]`.
#[derive(Debug, Clone, Default)]
pub struct SpecAttr {
    /// Leave the field out of the shape entirely.
    pub skip: bool,
    /// Exposed field name (default: the Rust field name).
    pub rename: Option<String>,
    /// `Operator` variant name.
    pub op: Option<&'static str>,
    pub negate: bool,
    /// Explicit dotted path into the model.
    pub path: Option<String>,
    /// Field never produces a criterion.
    pub ignore: bool,
    /// `None` defers to the compiler options.
    pub ignore_if_empty: Option<bool>,
}

impl Parse for SpecAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = SpecAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                // Flags: skip, negate, ignore, keep_empty
                Meta::Path(p) => {
                    if p.is_ident("skip") {
                        attr.skip = true;
                    } else if p.is_ident("negate") {
                        attr.negate = true;
                    } else if p.is_ident("ignore") {
                        attr.ignore = true;
                    } else if p.is_ident("keep_empty") {
                        attr.ignore_if_empty = Some(false);
                    } else {
                        return Err(Error::new(
                            p.span(),
                            "unknown spec flag. Expected: skip, negate, ignore, or keep_empty",
                        ));
                    }
                }

                // rename = "...", op = "...", path = "...", ignore_if_empty = bool
                Meta::NameValue(nv) => {
                    if nv.path.is_ident("rename") {
                        attr.rename = Some(string_value(&nv.value, "rename")?.value());
                    } else if nv.path.is_ident("op") {
                        let lit = string_value(&nv.value, "op")?;
                        attr.op = Some(operator_variant(&lit.value(), lit.span())?);
                    } else if nv.path.is_ident("path") {
                        let lit = string_value(&nv.value, "path")?;
                        let path = lit.value();
                        if path.split('.').any(str::is_empty) {
                            return Err(Error::new(
                                lit.span(),
                                "path must be dotted field names, e.g. \"address.city\"",
                            ));
                        }
                        attr.path = Some(path);
                    } else if nv.path.is_ident("ignore_if_empty") {
                        match &nv.value {
                            Expr::Lit(ExprLit {
                                lit: Lit::Bool(b), ..
                            }) => attr.ignore_if_empty = Some(b.value),
                            other => {
                                return Err(Error::new(
                                    other.span(),
                                    "ignore_if_empty must be true or false",
                                ))
                            }
                        }
                    } else {
                        return Err(Error::new(
                            nv.path.span(),
                            "unknown attribute. Expected: rename, op, path, or ignore_if_empty",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown spec attribute. Expected: skip, negate, ignore, keep_empty, rename = \"...\", op = \"...\", path = \"...\", or ignore_if_empty = bool",
                    ));
                }
            }
        }

        if attr.skip && (attr.op.is_some() || attr.path.is_some() || attr.negate) {
            return Err(Error::new(
                input.span(),
                "skip cannot be combined with criterion attributes",
            ));
        }

        Ok(attr)
    }
}

fn string_value<'a>(value: &'a Expr, key: &str) -> Result<&'a LitStr> {
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s),
        other => Err(Error::new(
            other.span(),
            format!("{} must be a string literal", key),
        )),
    }
}

/// Merge every `#[spec(...)]` attribute on a field.
pub fn parse_spec_attrs(attrs: &[Attribute]) -> Result<SpecAttr> {
    let mut merged = SpecAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("spec") {
            continue;
        }
        let parsed = attr.parse_args::<SpecAttr>()?;
        merged.skip |= parsed.skip;
        merged.negate |= parsed.negate;
        merged.ignore |= parsed.ignore;
        merged.rename = parsed.rename.or(merged.rename);
        merged.op = parsed.op.or(merged.op);
        merged.path = parsed.path.or(merged.path);
        merged.ignore_if_empty = parsed.ignore_if_empty.or(merged.ignore_if_empty);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_spec(tokens: &str) -> Result<SpecAttr> {
        syn::parse_str::<SpecAttr>(tokens)
    }

    #[test]
    fn test_spec_empty() {
        let attr = parse_spec("").unwrap();
        assert!(!attr.skip);
        assert_eq!(attr.op, None);
        assert_eq!(attr.ignore_if_empty, None);
    }

    #[test]
    fn test_spec_flags() {
        let attr = parse_spec("negate, ignore").unwrap();
        assert!(attr.negate);
        assert!(attr.ignore);
        assert!(!attr.skip);
    }

    #[test]
    fn test_spec_skip() {
        let attr = parse_spec("skip").unwrap();
        assert!(attr.skip);
    }

    #[test]
    fn test_spec_op_names() {
        assert_eq!(parse_spec(r#"op = "starts_with""#).unwrap().op, Some("StartsWith"));
        assert_eq!(parse_spec(r#"op = "ne""#).unwrap().op, Some("NotEqual"));
        assert_eq!(parse_spec(r#"op = "not_equal""#).unwrap().op, Some("NotEqual"));
        assert_eq!(parse_spec(r#"op = "is_null""#).unwrap().op, Some("IsNull"));
    }

    #[test]
    fn test_spec_unknown_op() {
        let result = parse_spec(r#"op = "between""#);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unknown operator: 'between'"));
    }

    #[test]
    fn test_spec_rename_and_path() {
        let attr = parse_spec(r#"rename = "id", path = "owner.id""#).unwrap();
        assert_eq!(attr.rename, Some("id".to_string()));
        assert_eq!(attr.path, Some("owner.id".to_string()));
    }

    #[test]
    fn test_spec_bad_path() {
        assert!(parse_spec(r#"path = "owner..id""#).is_err());
        assert!(parse_spec(r#"path = """#).is_err());
    }

    #[test]
    fn test_spec_emptiness() {
        assert_eq!(parse_spec("keep_empty").unwrap().ignore_if_empty, Some(false));
        assert_eq!(
            parse_spec("ignore_if_empty = true").unwrap().ignore_if_empty,
            Some(true)
        );
        assert_eq!(
            parse_spec("ignore_if_empty = false").unwrap().ignore_if_empty,
            Some(false)
        );
        assert!(parse_spec(r#"ignore_if_empty = "yes""#).is_err());
    }

    #[test]
    fn test_spec_non_string_literal() {
        let result = parse_spec("rename = 3");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("rename must be a string literal"));
    }

    #[test]
    fn test_spec_unknown_key() {
        assert!(parse_spec("invalid").is_err());
        assert!(parse_spec(r#"target = "x""#).is_err());
    }

    #[test]
    fn test_spec_skip_conflicts() {
        assert!(parse_spec(r#"skip, op = "eq""#).is_err());
    }

    #[test]
    fn test_operator_table_is_complete() {
        for name in [
            "auto", "eq", "ne", "gt", "gte", "lt", "lte", "like", "contains", "starts_with",
            "ends_with", "in", "is_null", "is_not_null",
        ] {
            assert!(operator_variant(name, Span::call_site()).is_ok(), "{}", name);
        }
    }
}
