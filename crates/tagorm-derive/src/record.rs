//! Record derive macro implementation

use crate::attrs::{FieldKind, field_kind, no_from_row};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut describe = Vec::new();
    let mut bind = Vec::new();
    let mut extract = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;

        match field_kind(field)? {
            FieldKind::Skip => {
                extract.push(quote! { #ident: ::core::default::Default::default() });
            }
            FieldKind::Nested => {
                describe.push(quote! {
                    <#ty as ::tagorm::Record>::describe_fields(out);
                });
                bind.push(quote! {
                    ::tagorm::Record::bind_fields(&self.#ident, out);
                });
                extract.push(quote! {
                    #ident: <#ty as ::tagorm::FromRow>::from_row(row)?
                });
            }
            FieldKind::Column {
                name: column,
                default,
                join,
            } => {
                let descriptor = quote! {
                    ::tagorm::FieldDescriptor::new(#column, #default, #join)
                };
                describe.push(quote! {
                    out.push(#descriptor);
                });
                bind.push(quote! {
                    out.push(#descriptor.with_value(::tagorm::IntoValue::into_value(&self.#ident)));
                });
                // Blank columns are never selected, so there is nothing to read back.
                if column.is_empty() {
                    extract.push(quote! { #ident: ::core::default::Default::default() });
                } else {
                    extract.push(quote! { #ident: row.try_get_column(#column)? });
                }
            }
        }
    }

    let from_row = if no_from_row(&input)? {
        quote! {}
    } else {
        quote! {
            impl ::tagorm::FromRow for #name {
                #[allow(unused_variables)]
                fn from_row(row: &::tagorm::tokio_postgres::Row) -> ::tagorm::OrmResult<Self> {
                    #[allow(unused_imports)]
                    use ::tagorm::RowExt;
                    Ok(Self {
                        #(#extract),*
                    })
                }
            }
        }
    };

    Ok(quote! {
        impl ::tagorm::Record for #name {
            #[allow(unused_variables)]
            fn describe_fields(out: &mut ::std::vec::Vec<::tagorm::FieldDescriptor>) {
                #(#describe)*
            }

            #[allow(unused_variables)]
            fn bind_fields(&self, out: &mut ::std::vec::Vec<::tagorm::FieldDescriptor>) {
                #(#bind)*
            }
        }

        impl ::tagorm::RecordSource for #name {
            type Record = Self;

            fn representative(&self) -> ::core::option::Option<&Self> {
                ::core::option::Option::Some(self)
            }
        }

        #from_row
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    /// Expansion with all whitespace removed, so assertions ignore token spacing.
    fn expanded(input: DeriveInput) -> String {
        expand(input)
            .unwrap()
            .to_string()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    #[test]
    fn emits_descriptors_in_field_order() {
        let out = expanded(parse_quote! {
            struct User {
                #[record(column = "users.id")]
                id: i64,
                #[record(column = "users.status", default = "active")]
                status: String,
            }
        });
        let id = out.find("\"users.id\"").unwrap();
        let status = out.find("\"users.status\"").unwrap();
        assert!(id < status);
        assert!(out.contains("\"active\""));
        assert!(out.contains("impl::tagorm::FromRowforUser"));
    }

    #[test]
    fn nested_fields_delegate() {
        let out = expanded(parse_quote! {
            struct User {
                audit: Audit,
            }
        });
        assert!(out.contains("<Auditas::tagorm::Record>::describe_fields(out)"));
        assert!(out.contains("<Auditas::tagorm::FromRow>::from_row(row)"));
    }

    #[test]
    fn skipped_fields_emit_no_descriptor() {
        let out = expanded(parse_quote! {
            struct User {
                #[record(skip)]
                scratch: Vec<u8>,
            }
        });
        assert!(!out.contains("FieldDescriptor::new"));
        assert!(out.contains("scratch:::core::default::Default::default()"));
        assert_eq!(out.matches("#[allow(unused_variables)]").count(), 3);
    }

    #[test]
    fn no_from_row_suppresses_impl() {
        let out = expanded(parse_quote! {
            #[record(no_from_row)]
            struct User {
                #[record(column = "users.id")]
                id: i64,
            }
        });
        assert!(!out.contains("FromRow"));
    }

    #[test]
    fn rejects_tuple_structs_and_generics() {
        assert!(expand(parse_quote! { struct A(i64); }).is_err());
        assert!(expand(parse_quote! { struct B<T> { t: T } }).is_err());
        assert!(expand(parse_quote! { enum C { X } }).is_err());
    }
}
