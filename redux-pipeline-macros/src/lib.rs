//! Procedural macros for redux-pipeline

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Action)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(enum_any))]
struct ActionOpts {
    ident: syn::Ident,
    vis: syn::Visibility,
    generics: syn::Generics,
    data: darling::ast::Data<ActionVariant, ()>,

    /// Name of the generated kind enum (default `{Name}Kind`)
    #[darling(default)]
    kind: Option<String>,

    /// Skip the `ActionSummary` impl so the user can write their own
    #[darling(default)]
    custom_summary: bool,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct ActionVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    /// Override the name reported by `Action::name()`
    #[darling(default)]
    name: Option<String>,
}

/// Derive macro for the Action trait
///
/// Generates:
/// - a fieldless `{Name}Kind` enum with one variant per action variant,
///   used as the routing key by reducers and converters
/// - `Action::name()` returning the variant name
/// - `Action::kind()`
/// - an `ActionSummary` impl using the `Debug` representation
///
/// Attributes:
/// - `#[action(kind = "CounterKey")]`: name the kind enum
/// - `#[action(custom_summary)]`: skip the `ActionSummary` impl
/// - `#[action(name = "...")]` on a variant: override its name
///
/// # Example
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// enum CounterAction {
///     Increment,
///     Add(i32),
///     #[action(name = "Reset")]
///     ResetTo { value: i32 },
/// }
///
/// let action = CounterAction::Add(2);
/// assert_eq!(action.name(), "Add");
/// assert_eq!(action.kind(), CounterActionKind::Add);
/// assert_eq!(CounterActionKind::ResetTo.name(), "Reset");
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let vis = &opts.vis;

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "Action can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    if variants.is_empty() {
        return syn::Error::new_spanned(&input, "Action needs at least one variant")
            .to_compile_error()
            .into();
    }

    let kind_name = match &opts.kind {
        Some(kind) => format_ident!("{}", kind),
        None => format_ident!("{}Kind", name),
    };

    let variant_idents: Vec<_> = variants.iter().map(|v| &v.ident).collect();
    let variant_names: Vec<_> = variants
        .iter()
        .map(|v| v.name.clone().unwrap_or_else(|| v.ident.to_string()))
        .collect();

    // Wildcard patterns work for unit, tuple and struct variants alike
    let patterns: Vec<_> = variants
        .iter()
        .map(|v| {
            let variant = &v.ident;
            match &v.fields.style {
                darling::ast::Style::Unit => quote! { #name::#variant },
                darling::ast::Style::Tuple => quote! { #name::#variant(..) },
                darling::ast::Style::Struct => quote! { #name::#variant { .. } },
            }
        })
        .collect();

    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let kind_doc = format!(
        "Kinds of [`{}`], one per variant.\n\n\
         Used as the routing key when registering reducers and converters.",
        name
    );

    let mut expanded = quote! {
        #[doc = #kind_doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #vis enum #kind_name {
            #(#variant_idents,)*
        }

        impl #kind_name {
            /// Every kind, in declaration order
            pub fn all() -> &'static [Self] {
                &[#(Self::#variant_idents,)*]
            }

            /// The action name for this kind
            pub fn name(&self) -> &'static str {
                match self {
                    #(Self::#variant_idents => #variant_names,)*
                }
            }
        }

        impl #impl_generics ::redux_pipeline::Action for #name #ty_generics #where_clause {
            type Kind = #kind_name;

            fn name(&self) -> &'static str {
                match self {
                    #(#patterns => #variant_names,)*
                }
            }

            fn kind(&self) -> Self::Kind {
                match self {
                    #(#patterns => #kind_name::#variant_idents,)*
                }
            }
        }
    };

    if !opts.custom_summary {
        expanded = quote! {
            #expanded

            impl #impl_generics ::redux_pipeline::ActionSummary for #name #ty_generics #where_clause {}
        };
    }

    TokenStream::from(expanded)
}
