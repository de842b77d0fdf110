//! Implementation of #[derive(QmlBinding)]

use proc_macro2::{Span, TokenStream};
use qweld::extract::{base_field, candidate_from_struct};
use qweld::extract::source::MARKER_TYPE;
use qweld::validate::{validate, ValidationError};
use quote::{quote, ToTokens};
use syn::spanned::Spanned;
use syn::{parse2, parse_quote, Fields, ItemStruct, LitStr, Member};

/// The derive only sees the struct itself, so the marker is matched by name
fn is_marker(path: &syn::Path) -> bool {
    path.segments.last().is_some_and(|s| s.ident == MARKER_TYPE)
}

pub fn qml_binding_impl(input: TokenStream) -> syn::Result<TokenStream> {
    let item: ItemStruct = parse2(input)
        .map_err(|err| syn::Error::new(err.span(), "QmlBinding can only be derived for structs"))?;

    if !item.generics.params.is_empty() {
        return Err(syn::Error::new(
            item.generics.span(),
            "QmlBinding types must not be generic",
        ));
    }

    let Some((index, field)) = base_field(&item, &is_marker)? else {
        return Err(syn::Error::new(
            item.ident.span(),
            format!(
                "QmlBinding requires a `{}` base field (or a field marked #[qweld(base)])",
                MARKER_TYPE
            ),
        ));
    };

    let Some(candidate) = candidate_from_struct(&item, None, &is_marker)? else {
        return Err(syn::Error::new(item.ident.span(), "missing base field"));
    };

    let (_, errors) = validate(&candidate);
    if let Some(error) = combine(&item, &errors) {
        return Err(error);
    }

    let krate = runtime_path(&item)?;

    let ident = &item.ident;
    let member = match &field.ident {
        Some(name) => Member::Named(name.clone()),
        None => Member::Unnamed(index.into()),
    };

    Ok(quote! {
        impl #krate::Bindable for #ident {
            fn qml_object(&self) -> &#krate::QmlObject {
                &self.#member
            }

            fn qml_object_mut(&mut self) -> &mut #krate::QmlObject {
                &mut self.#member
            }
        }
    })
}

/// Path of the runtime crate, `#[qweld(crate = "path")]` on the struct
fn runtime_path(item: &ItemStruct) -> syn::Result<syn::Path> {
    let mut path = None;

    for attr in item.attrs.iter().filter(|a| a.path().is_ident("qweld")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let lit: LitStr = meta.value()?.parse()?;
                path = Some(lit.parse::<syn::Path>()?);
                Ok(())
            } else {
                Err(meta.error("unknown qweld key on a struct, expected `crate`"))
            }
        })?;
    }

    Ok(path.unwrap_or_else(|| parse_quote!(::qweld_runtime)))
}

/// Turn validation errors into one compile error pointing at the fields
fn combine(item: &ItemStruct, errors: &[ValidationError]) -> Option<syn::Error> {
    errors
        .iter()
        .map(|error| {
            let span = error
                .location
                .field
                .as_deref()
                .and_then(|label| field_span(item, label))
                .unwrap_or_else(|| item.ident.span());
            let message = match &error.member {
                Some(member) => format!("{} {}: {}", member.role, member.name, error.kind),
                None => error.kind.to_string(),
            };
            syn::Error::new(span, message)
        })
        .reduce(|mut all, next| {
            all.combine(next);
            all
        })
}

/// Span of the field a label names (the identifier, or the index of a tuple field)
fn field_span(item: &ItemStruct, label: &str) -> Option<Span> {
    match &item.fields {
        Fields::Named(named) => named
            .named
            .iter()
            .find(|f| f.ident.as_ref().is_some_and(|i| i == label))
            .map(|f| f.span()),
        Fields::Unnamed(unnamed) => {
            let index: usize = label.parse().ok()?;
            unnamed.unnamed.iter().nth(index).map(|f| f.ty.to_token_stream().span())
        }
        Fields::Unit => None,
    }
}
