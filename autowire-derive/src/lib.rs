//! Derive macro for autowire
//!
//! `#[derive(Injectable)]` writes the constructor metadata the injector needs
//! from a struct's fields, so most types never implement `Injectable` by hand.
//!
//! # Example
//!
//! ```rust,ignore
//! use autowire::{Configuration, Injectable, Injector};
//! use std::sync::Arc;
//!
//! #[derive(Injectable)]
//! struct Database {
//!     #[inject(default = String::from("postgres://localhost"))]
//!     url: String,
//! }
//!
//! #[derive(Injectable)]
//! struct UserService {
//!     db: Arc<Database>,
//!     cache: Option<Arc<dyn Cache>>,
//!     #[inject(skip)]
//!     request_count: u64,
//! }
//!
//! let injector = Injector::new(Configuration::new());
//! let users = injector.get::<UserService>().unwrap();
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, LitStr, Type, parse_macro_input};

/// Derive `autowire::Injectable` from the struct's fields.
///
/// Every field becomes a constructor parameter named after the field, in
/// declaration order:
///
/// - `Arc<T>` - dependency on `T`
/// - `Option<Arc<T>>` - nullable dependency on `T`; unbound and without a
///   default it is reported as ambiguous
/// - anything else - plain value; needs a default or a kwarg override, and
///   must be `Clone`
///
/// # Attributes
///
/// - `#[inject(default = expr)]` - Default used while the type is unbound.
///   `expr` has the field's type.
/// - `#[inject(default)]` - Same, with `Default::default()`.
/// - `#[inject(skip)]` - Not a parameter; filled with `Default::default()`.
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Injectable can only be derived for structs",
            ));
        }
    };

    let mut params = Vec::new();
    let mut inits = Vec::new();

    let body = match fields {
        Fields::Unit => quote! { Self },
        Fields::Named(named) => {
            for field in named.named.iter() {
                let Some(field_name) = field.ident.as_ref() else {
                    continue;
                };
                let param = LitStr::new(
                    field_name.to_string().trim_start_matches("r#"),
                    field_name.span(),
                );
                let (param_decl, init) = field_tokens(&param, &field.ty, parse_attr(&field.attrs)?);
                params.extend(param_decl);
                inits.push(quote! { #field_name: #init });
            }
            quote! { Self { #(#inits),* } }
        }
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Injectable can only be derived for structs with named fields",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::autowire::Injectable for #name #ty_generics #where_clause {
            fn constructor() -> ::std::option::Option<::autowire::Constructor> {
                ::std::option::Option::Some(::autowire::Constructor::new(
                    || ::autowire::Signature::new() #(#params)*,
                    |__args: &::autowire::Args| ::std::result::Result::Ok(#body),
                ))
            }
        }
    })
}

/// Parsed `#[inject(...)]` settings of one field.
enum InjectAttr {
    None,
    Skip,
    Default(Expr),
}

fn parse_attr(attrs: &[Attribute]) -> syn::Result<InjectAttr> {
    let mut parsed = InjectAttr::None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("inject")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                parsed = InjectAttr::Skip;
                Ok(())
            } else if meta.path.is_ident("default") {
                let expr = if meta.input.peek(syn::Token![=]) {
                    meta.value()?.parse()?
                } else {
                    syn::parse_quote!(::std::default::Default::default())
                };
                parsed = InjectAttr::Default(expr);
                Ok(())
            } else {
                Err(meta.error("expected `skip` or `default`"))
            }
        })?;
    }
    Ok(parsed)
}

/// Signature entry and initializer for one field.
fn field_tokens(
    param: &LitStr,
    ty: &Type,
    attr: InjectAttr,
) -> (Option<TokenStream2>, TokenStream2) {
    if let InjectAttr::Skip = attr {
        return (None, quote! { ::std::default::Default::default() });
    }

    if let Some(inner) = extract_option_arc_inner_type(ty) {
        let decl = match attr {
            InjectAttr::Default(expr) => quote! { .optional_or::<#inner>(#param, #expr) },
            _ => quote! { .optional::<#inner>(#param) },
        };
        return (Some(decl), quote! { __args.optional::<#inner>(#param)? });
    }

    if let Some(inner) = extract_arc_inner_type(ty) {
        let decl = match attr {
            InjectAttr::Default(expr) => quote! { .param_or::<#inner>(#param, #expr) },
            _ => quote! { .param::<#inner>(#param) },
        };
        return (Some(decl), quote! { __args.get::<#inner>(#param)? });
    }

    let decl = match attr {
        InjectAttr::Default(expr) => quote! { .scalar_or::<#ty>(#param, #expr) },
        _ => quote! { .scalar::<#ty>(#param) },
    };
    (Some(decl), quote! { __args.value::<#ty>(#param)? })
}

/// Extract T from Arc<T>
fn extract_arc_inner_type(ty: &Type) -> Option<&Type> {
    generic_argument(ty, "Arc")
}

/// Extract T from Option<Arc<T>>
fn extract_option_arc_inner_type(ty: &Type) -> Option<&Type> {
    generic_argument(ty, "Option").and_then(extract_arc_inner_type)
}

fn generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(syn::GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
