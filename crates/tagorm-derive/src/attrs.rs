//! Attribute parsing for the Record derive macro.
//!
//! Handles struct-level and field-level `#[record(...)]` attributes.

use syn::{DeriveInput, Result};

/// How one struct field takes part in the mapping.
pub(crate) enum FieldKind {
    /// `#[record(skip)]`
    Skip,
    /// No `#[record]` attribute: flatten the field's own `Record` impl.
    Nested,
    /// `#[record(column = "...", ...)]`
    Column {
        name: String,
        default: String,
        join: String,
    },
}

/// Parsed contents of one field-level `#[record(...)]`.
#[derive(Default)]
struct FieldAttr {
    skip: bool,
    column: Option<syn::LitStr>,
    default: Option<syn::LitStr>,
    join: Option<syn::LitStr>,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "skip" {
                attr.skip = true;
            } else {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;
                let slot = match ident.to_string().as_str() {
                    "column" => &mut attr.column,
                    "default" => &mut attr.default,
                    "join" => &mut attr.join,
                    _ => {
                        return Err(syn::Error::new_spanned(
                            &ident,
                            "unknown record attribute; expected `column`, `default`, `join` or `skip`",
                        ));
                    }
                };
                if slot.is_some() {
                    return Err(syn::Error::new_spanned(&ident, format!("duplicate `{ident}`")));
                }
                *slot = Some(value);
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(attr)
    }
}

/// Classify a field from its `#[record(...)]` attributes.
pub(crate) fn field_kind(field: &syn::Field) -> Result<FieldKind> {
    let mut seen = false;
    let mut merged = FieldAttr::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        seen = true;
        let parsed: FieldAttr = attr.parse_args()?;
        merged.skip |= parsed.skip;
        merged.column = merged.column.or(parsed.column);
        merged.default = merged.default.or(parsed.default);
        merged.join = merged.join.or(parsed.join);
    }

    if !seen {
        return Ok(FieldKind::Nested);
    }
    if merged.skip {
        return Ok(FieldKind::Skip);
    }

    match merged.column {
        Some(column) => Ok(FieldKind::Column {
            name: column.value(),
            default: merged.default.map(|d| d.value()).unwrap_or_default(),
            join: merged.join.map(|j| j.value()).unwrap_or_default(),
        }),
        None => {
            let stray = merged.default.or(merged.join);
            let msg = "`default` and `join` require `column = \"...\"` on the same field";
            Err(match stray {
                Some(lit) => syn::Error::new_spanned(lit, msg),
                None => syn::Error::new_spanned(field, "empty #[record()]; use `column = \"...\"` or `skip`"),
            })
        }
    }
}

/// Whether the struct carries `#[record(no_from_row)]`.
pub(crate) fn no_from_row(input: &DeriveInput) -> Result<bool> {
    let mut found = false;
    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("no_from_row") {
                found = true;
                Ok(())
            } else {
                Err(meta.error("unknown struct-level record attribute; expected `no_from_row`"))
            }
        })?;
    }
    Ok(found)
}
