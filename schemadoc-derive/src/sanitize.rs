use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Field, Fields, GenericArgument, PathArguments, Type};

// derive_sanitize
pub(crate) fn derive_sanitize(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = if let Data::Struct(data) = &input.data {
        if let Fields::Named(named) = &data.fields {
            &named.named
        } else {
            let err = Error::new_spanned(
                &data.fields,
                "Sanitize can only be derived for structs with named fields",
            );
            return err.to_compile_error();
        }
    } else {
        let err = Error::new_spanned(
            &input.ident,
            "Sanitize can only be derived for structs with named fields",
        );
        return err.to_compile_error();
    };

    let mut textual = Vec::new();
    let mut nested = Vec::new();

    for field in fields {
        let kind = match classify_field(field) {
            Ok(kind) => kind,
            Err(err) => return err.to_compile_error(),
        };
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };

        match kind {
            FieldKind::Text => textual.push(quote! {
                apply(&mut self.#field_ident);
            }),
            FieldKind::OptText => textual.push(quote! {
                if let Some(value) = self.#field_ident.as_mut() {
                    apply(value);
                }
            }),
            FieldKind::ManyText => textual.push(quote! {
                for value in self.#field_ident.iter_mut() {
                    apply(value);
                }
            }),
            FieldKind::Nested => nested.push(quote! {
                ::schemadoc_core::sanitize::Sanitize::sanitize_with(&mut self.#field_ident, apply);
            }),
            FieldKind::Ignored => {}
        }
    }

    // Own textual fields first so parents are always transformed before children.
    quote! {
        impl #impl_generics ::schemadoc_core::sanitize::Sanitize for #ident #ty_generics #where_clause {
            fn sanitize_with(&mut self, apply: &mut dyn FnMut(&mut ::std::string::String)) {
                #(#textual)*
                #(#nested)*
            }
        }
    }
}

///
/// FieldKind
///

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldKind {
    Text,
    OptText,
    ManyText,
    Nested,
    Ignored,
}

fn classify_field(field: &Field) -> syn::Result<FieldKind> {
    let mut nested = false;
    let mut skip = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("sanitizer") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("nested") {
                nested = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `nested` or `skip`"))
            }
        })?;
    }

    if nested && skip {
        return Err(Error::new_spanned(
            field,
            "`nested` and `skip` cannot be combined",
        ));
    }
    if skip {
        return Ok(FieldKind::Ignored);
    }
    if nested {
        return Ok(FieldKind::Nested);
    }

    let ty = &field.ty;
    let kind = if is_string(ty) {
        FieldKind::Text
    } else if generic_inner(ty, "Option").is_some_and(is_string) {
        FieldKind::OptText
    } else if generic_inner(ty, "Vec").is_some_and(is_string) {
        FieldKind::ManyText
    } else {
        FieldKind::Ignored
    };

    Ok(kind)
}

fn is_string(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };

    path.path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "String" && segment.arguments.is_none())
}

fn generic_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };

    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    })
}
