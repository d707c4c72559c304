use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, Meta, Type};

/// Derive macro that documents the serialized fields of a request struct.
///
/// For each field, extracts:
/// - Serialized name (field `#[serde(rename = "...")]`, otherwise the
///   container's `#[serde(rename_all = "camelCase")]` is applied)
/// - Required (false for `Option<T>` and `#[serde(default)]` fields)
/// - Description (from doc comments)
///
/// Generates a `field_schema() -> &'static [FieldDoc]` method. `FieldDoc`
/// must be in scope where the derive is used.
#[proc_macro_derive(FieldSchema, attributes(serde))]
pub fn derive_field_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let rename_all = serde_value(&input.attrs, "rename_all");

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("FieldSchema only supports structs with named fields"),
        },
        _ => panic!("FieldSchema only supports structs"),
    };

    let field_info: Vec<_> = fields
        .iter()
        .filter(|field| !serde_flag(&field.attrs, "skip"))
        .map(|field| {
            let field_name = field.ident.as_ref().unwrap().to_string();

            let serialized = serde_value(&field.attrs, "rename").unwrap_or_else(|| {
                match rename_all.as_deref() {
                    Some("camelCase") => to_camel_case(&field_name),
                    _ => field_name,
                }
            });

            let required = !is_option_type(&field.ty) && !serde_flag(&field.attrs, "default");
            let doc = get_doc_comment(&field.attrs);

            (serialized, required, doc)
        })
        .collect();

    let field_entries = field_info.iter().map(|(name, required, desc)| {
        quote! {
            FieldDoc {
                name: #name,
                required: #required,
                description: #desc,
            }
        }
    });

    let expanded = quote! {
        impl #name {
            pub fn field_schema() -> &'static [FieldDoc] {
                static SCHEMA: &[FieldDoc] = &[
                    #(#field_entries),*
                ];
                SCHEMA
            }
        }
    };

    TokenStream::from(expanded)
}

/// Entries of every `#[serde(...)]` list, split on top-level commas.
fn serde_entries(attrs: &[syn::Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("serde"))
        .filter_map(|attr| match &attr.meta {
            Meta::List(list) => Some(list.tokens.to_string()),
            _ => None,
        })
        .flat_map(|tokens| {
            tokens
                .split(',')
                .map(|entry| entry.trim().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Value of a `key = "value"` serde entry.
fn serde_value(attrs: &[syn::Attribute], key: &str) -> Option<String> {
    serde_entries(attrs).into_iter().find_map(|entry| {
        let (lhs, rhs) = entry.split_once('=')?;
        if lhs.trim() != key {
            return None;
        }
        let rhs = rhs.trim().strip_prefix('"')?;
        let end = rhs.find('"')?;
        Some(rhs[..end].to_string())
    })
}

/// Whether a bare serde flag (e.g. `default`, `skip`) is present.
fn serde_flag(attrs: &[syn::Attribute], flag: &str) -> bool {
    serde_entries(attrs).iter().any(|entry| entry == flag)
}

fn to_camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper_next = false;
    for c in snake.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn get_doc_comment(attrs: &[syn::Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if !attr.path().is_ident("doc") {
                return None;
            }
            if let Meta::NameValue(meta) = &attr.meta {
                if let syn::Expr::Lit(expr_lit) = &meta.value {
                    if let Lit::Str(lit_str) = &expr_lit.lit {
                        return Some(lit_str.value().trim().to_string());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}
