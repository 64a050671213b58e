//! Injectable attribute macro
//!
//! Turns `#[inject]` field attributes into an `Injectable` implementation:
//! a dependency table, a constructor reading resolved arguments, and a
//! property list for optional collaborators.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, DeriveInput, Expr, Field, Fields, GenericArgument, Ident, PathArguments,
    Type,
};

/// How one field is filled
enum FieldKind {
    /// `#[inject]` on `Arc<T>`
    Service(Type),
    /// `#[inject]` on `Arc<dyn Trait>`
    Interface(Type),
    /// `#[inject(instance)]` on `Arc<T>`
    Instance(Type),
    /// `#[inject(optional)]` on `Option<Arc<T>>`
    Optional { inner: Type, interface: bool },
    /// `#[inject(value)]` / `#[inject(default = expr)]`
    Value(Option<Expr>),
    /// No attribute
    Plain,
}

/// Parse `#[injectable]` options; only `register` is accepted
fn parse_register(attr: TokenStream) -> syn::Result<bool> {
    let mut register = false;
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("register") {
            register = true;
            Ok(())
        } else {
            Err(meta.error("unsupported injectable option, expected `register`"))
        }
    });
    syn::parse::Parser::parse(parser, attr)?;
    Ok(register)
}

/// First generic argument of `Wrapper<T>` when the last path segment is `wrapper`
fn unwrap_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
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
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

fn arc_inner(field: &Field) -> syn::Result<&Type> {
    unwrap_type(&field.ty, "Arc")
        .ok_or_else(|| syn::Error::new_spanned(&field.ty, "#[inject] fields must be `Arc<T>`"))
}

fn classify(field: &Field) -> syn::Result<FieldKind> {
    let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("inject")) else {
        return Ok(FieldKind::Plain);
    };

    if matches!(attr.meta, syn::Meta::Path(_)) {
        let inner = arc_inner(field)?.clone();
        return Ok(if matches!(inner, Type::TraitObject(_)) {
            FieldKind::Interface(inner)
        } else {
            FieldKind::Service(inner)
        });
    }

    let mut kind = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("optional") {
            let inner = unwrap_type(&field.ty, "Option")
                .and_then(|option| unwrap_type(option, "Arc"))
                .ok_or_else(|| {
                    meta.error("#[inject(optional)] fields must be `Option<Arc<T>>`")
                })?;
            kind = Some(FieldKind::Optional {
                interface: matches!(inner, Type::TraitObject(_)),
                inner: inner.clone(),
            });
        } else if meta.path.is_ident("instance") {
            kind = Some(FieldKind::Instance(arc_inner(field)?.clone()));
        } else if meta.path.is_ident("value") {
            kind = Some(FieldKind::Value(None));
        } else if meta.path.is_ident("default") {
            let expr: Expr = meta.value()?.parse()?;
            kind = Some(FieldKind::Value(Some(expr)));
        } else {
            return Err(meta.error(
                "unsupported inject option, expected `optional`, `instance`, `value` or `default = ...`",
            ));
        }
        Ok(())
    })?;

    kind.ok_or_else(|| syn::Error::new_spanned(attr, "empty #[inject(..)]"))
}

/// Implements the `#[injectable]` attribute macro
pub fn injectable_impl(attr: TokenStream, input: TokenStream) -> TokenStream {
    let register = match parse_register(attr) {
        Ok(register) => register,
        Err(err) => return err.to_compile_error().into(),
    };
    let input = parse_macro_input!(input as DeriveInput);

    match expand(register, input) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(register: bool, mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = input.ident.clone();

    let syn::Data::Struct(data) = &mut input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "injectable can only be used on structs",
        ));
    };

    let mut fields: Vec<(Ident, Type, FieldKind)> = Vec::new();
    match &mut data.fields {
        Fields::Named(named) => {
            for field in named.named.iter_mut() {
                let kind = classify(field)?;
                field.attrs.retain(|a| !a.path().is_ident("inject"));
                if let Some(ident) = field.ident.clone() {
                    fields.push((ident, field.ty.clone(), kind));
                }
            }
        }
        Fields::Unit => {}
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "injectable does not support tuple structs. Use named fields instead.",
            ))
        }
    }
    let is_unit = matches!(data.fields, Fields::Unit);

    let mut dependencies = Vec::new();
    let mut initializers = Vec::new();
    let mut properties = Vec::new();

    for (ident, ty, kind) in &fields {
        let label = ident.to_string();
        match kind {
            FieldKind::Service(inner) => {
                dependencies.push(quote! { ::press::Dependency::service::<#inner>(#label) });
                initializers.push(quote! { #ident: args.service::<#inner>(#label)? });
            }
            FieldKind::Interface(inner) => {
                dependencies.push(quote! { ::press::Dependency::interface::<#inner>(#label) });
                initializers.push(quote! { #ident: args.interface::<#inner>(#label)? });
            }
            FieldKind::Instance(inner) => {
                dependencies.push(quote! {
                    ::press::Dependency::keyed(#label, ::press::ServiceKey::of::<#inner>())
                });
                initializers.push(quote! { #ident: args.service::<#inner>(#label)? });
            }
            FieldKind::Value(default) => {
                let dependency = match default {
                    Some(expr) => quote! {
                        ::press::Dependency::value(#label).or_default::<#ty, _>(|| #expr)
                    },
                    None => quote! { ::press::Dependency::value(#label) },
                };
                dependencies.push(dependency);
                initializers.push(quote! { #ident: args.value::<#ty>(#label)? });
            }
            FieldKind::Optional { inner, interface } => {
                let constructor = if *interface {
                    quote! { interface }
                } else {
                    quote! { service }
                };
                properties.push(quote! {
                    ::press::Property::#constructor::<#inner, _>(
                        #label,
                        |target: &mut Self, value: ::std::sync::Arc<#inner>| {
                            target.#ident = ::std::option::Option::Some(value);
                        },
                    )
                });
                initializers.push(quote! { #ident: ::std::option::Option::None });
            }
            FieldKind::Plain => {
                initializers.push(quote! { #ident: ::std::default::Default::default() });
            }
        }
    }

    let construct_body = if is_unit {
        quote! { Self }
    } else {
        quote! { Self { #(#initializers),* } }
    };

    let properties_fn = if properties.is_empty() {
        quote! {}
    } else {
        quote! {
            fn properties() -> ::std::vec::Vec<::press::Property<Self>> {
                ::std::vec![#(#properties),*]
            }
        }
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let registration = if register {
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &input.generics,
                "#[injectable(register)] does not support generic types",
            ));
        }
        let name_str = name.to_string();
        quote! {
            ::press::inventory::submit! {
                ::press::container::provider::ServiceEntry {
                    register: |registry| {
                        registry.singleton::<#name>();
                    },
                    name: #name_str,
                }
            }
        }
    } else {
        quote! {}
    };

    Ok(quote! {
        #input

        impl #impl_generics ::press::Injectable for #name #ty_generics #where_clause {
            fn dependencies() -> ::std::vec::Vec<::press::Dependency> {
                ::std::vec![#(#dependencies),*]
            }

            #[allow(unused_variables)]
            fn construct(
                args: &mut ::press::Arguments,
            ) -> ::std::result::Result<Self, ::press::ContainerError> {
                ::std::result::Result::Ok(#construct_body)
            }

            #properties_fn
        }

        #registration
    })
}
