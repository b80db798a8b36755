#![recursion_limit = "256"]
// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

/// Implementation of the `Bind`, `BindEnum` and `bindarg(...)` derive attributes.
///
/// For more thorough documentation, see the `bindarg` crate itself.
extern crate proc_macro;

use {
    crate::{
        errors::Errors,
        parse_attrs::{check_type_attrs, FieldAttrs, FieldKind, VariantAttrs},
    },
    bindarg_shared::AUTO_CONFIG_KEY,
    proc_macro2::TokenStream,
    quote::{quote, ToTokens},
};

mod errors;
mod parse_attrs;

/// Entrypoint for `#[derive(Bind)]`.
#[proc_macro_derive(Bind, attributes(bindarg))]
pub fn bind_derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = syn::parse_macro_input!(input as syn::DeriveInput);
    let gen = impl_bind(&ast);
    gen.into()
}

/// Entrypoint for `#[derive(BindEnum)]`.
#[proc_macro_derive(BindEnum, attributes(bindarg))]
pub fn bind_enum_derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = syn::parse_macro_input!(input as syn::DeriveInput);
    let gen = impl_bind_enum(&ast);
    gen.into()
}

/// Transform the input into a token stream containing any generated implementations,
/// as well as all errors that occurred.
fn impl_bind(input: &syn::DeriveInput) -> TokenStream {
    let errors = &Errors::default();
    if !input.generics.params.is_empty() {
        errors.err(
            &input.generics,
            "`#![derive(Bind)]` cannot be applied to types with generic parameters",
        );
    }
    check_type_attrs(errors, &input.attrs);
    let mut output_tokens = match &input.data {
        syn::Data::Struct(ds) => impl_bind_struct(errors, &input.ident, ds),
        syn::Data::Enum(_) => {
            errors.err(
                input,
                concat!(
                    "`#[derive(Bind)]` cannot be applied to enums, ",
                    "use `#[derive(BindEnum)]` for enum fields",
                ),
            );
            TokenStream::new()
        }
        syn::Data::Union(_) => {
            errors.err(input, "`#[derive(Bind)]` cannot be applied to unions");
            TokenStream::new()
        }
    };
    errors.to_tokens(&mut output_tokens);
    output_tokens
}

/// A field of a `#![derive(Bind)]` struct with its attributes and the values
/// resolved from them.
struct StructField<'a> {
    /// The original parsed field
    field: &'a syn::Field,
    /// The parsed attributes of the field
    attrs: FieldAttrs,
    /// The field name. Only named fields reach this point.
    name: &'a syn::Ident,
    kind: FieldKind,
    /// The option name, defaulting to the kebab-case'd field name prefixed with `--`.
    /// Empty for arguments.
    option_name: String,
    /// Position among the argument fields. Zero for options.
    index: usize,
    config_key: String,
}

impl<'a> StructField<'a> {
    /// Attempts to parse a field of a `#[derive(Bind)]` struct. Fields without a
    /// `bindarg` kind attribute are not bound and yield `None`.
    fn new(
        errors: &Errors,
        field: &'a syn::Field,
        attrs: FieldAttrs,
        next_index: &mut usize,
    ) -> Option<Self> {
        let name = field.ident.as_ref()?;
        let kind = match &attrs.kind {
            Some((kind, _)) => *kind,
            None => {
                if attrs_require_kind(&attrs) {
                    errors.err(
                        field,
                        concat!(
                            "Missing `bindarg` field kind attribute.\n",
                            "Expected one of: `option`, `argument`",
                        ),
                    );
                }
                return None;
            }
        };

        let option_name = match kind {
            FieldKind::Option => {
                let option_name = attrs.name.as_ref().map(syn::LitStr::value).unwrap_or_else(|| {
                    format!("--{}", heck::KebabCase::to_kebab_case(&*name.to_string()))
                });
                if option_name.is_empty() {
                    errors.err(field, "Option names must not be empty.");
                }
                option_name
            }
            FieldKind::Argument => {
                if let Some(lit) = &attrs.name {
                    errors.err(lit, "`name` only applies to `option` fields.");
                }
                if let Some(lit) = attrs.aliases.first() {
                    errors.err(lit, "`aliases` only apply to `option` fields.");
                }
                String::new()
            }
        };

        let index = match kind {
            FieldKind::Option => {
                if let Some(lit) = &attrs.index {
                    errors.err(lit, "`index` only applies to `argument` fields.");
                }
                0
            }
            FieldKind::Argument => {
                let declared = *next_index;
                *next_index += 1;
                match &attrs.index {
                    Some(lit) => lit.base10_parse::<usize>().unwrap_or_else(|e| {
                        errors.push(e);
                        declared
                    }),
                    None => declared,
                }
            }
        };

        let config_key = match (&attrs.config_key, &attrs.no_config) {
            (Some(key), Some(path)) => {
                errors.duplicate_attrs("config key", key, path);
                String::new()
            }
            (Some(key), None) => key.value(),
            (None, Some(_)) => String::new(),
            (None, None) => match kind {
                FieldKind::Option => AUTO_CONFIG_KEY.to_string(),
                FieldKind::Argument => String::new(),
            },
        };

        Some(StructField { field, attrs, name, kind, option_name, index, config_key })
    }

    /// Tokens building the `bindarg::FieldDecl` for this field.
    fn decl(&self, errors: &Errors) -> TokenStream {
        let field_str = self.name.to_string();
        let ty = &self.field.ty;
        let attrs = &self.attrs;

        let kind = match self.kind {
            FieldKind::Option => quote! { bindarg::FieldKind::Option },
            FieldKind::Argument => quote! { bindarg::FieldKind::Argument },
        };
        let name = &self.option_name;
        let aliases = &attrs.aliases;
        let config_key = &self.config_key;
        let index = self.index;
        let usage = attrs
            .usage
            .as_ref()
            .map(syn::LitStr::value)
            .or_else(|| attrs.description.clone())
            .unwrap_or_default();
        let operand = lit_or_empty(&attrs.operand);
        let documented = attrs.hidden.is_none();
        let help_order = match &attrs.help_order {
            Some(lit) => lit.base10_parse::<i32>().unwrap_or_else(|e| {
                errors.push(e);
                i32::MAX
            }),
            None => i32::MAX,
        };
        let required = attrs.required.is_some();
        let missing = lit_or_empty(&attrs.missing);
        if let (Some(lit), FieldKind::Option) = (&attrs.missing, self.kind) {
            errors.err(lit, "`missing` only applies to `argument` fields.");
        }
        let terminates = attrs.terminates.is_some();
        let separator = match (&attrs.separator, self.kind) {
            (Some(lit), _) => lit.value(),
            (None, FieldKind::Option) => String::new(),
            (None, FieldKind::Argument) => ",".to_string(),
        };
        let handler = match (&attrs.handler, self.kind) {
            (None, _) => quote! { bindarg::HandlerOverride::Infer },
            (Some(path), FieldKind::Option) => {
                quote! { bindarg::HandlerOverride::Option(bindarg::option_handler::<#path>) }
            }
            (Some(path), FieldKind::Argument) => {
                quote! { bindarg::HandlerOverride::Argument(bindarg::argument_handler::<#path>) }
            }
        };

        quote! {
            bindarg::FieldDecl {
                info: bindarg::FieldInfo {
                    field: #field_str,
                    kind: #kind,
                    name: #name,
                    aliases: &[ #( #aliases ),* ],
                    config_key: #config_key,
                    index: #index,
                    usage: #usage,
                    operand: #operand,
                    documented: #documented,
                    help_order: #help_order,
                    required: #required,
                    missing: #missing,
                    terminates: #terminates,
                    separator: #separator,
                    field_type: <#ty as bindarg::BindValue>::FIELD_TYPE,
                },
                handler: #handler,
            }
        }
    }
}

/// Whether any attribute other than the doc comment was given, which means
/// the field was meant to be bound.
fn attrs_require_kind(attrs: &FieldAttrs) -> bool {
    attrs.name.is_some()
        || !attrs.aliases.is_empty()
        || attrs.config_key.is_some()
        || attrs.no_config.is_some()
        || attrs.usage.is_some()
        || attrs.operand.is_some()
        || attrs.hidden.is_some()
        || attrs.help_order.is_some()
        || attrs.required.is_some()
        || attrs.missing.is_some()
        || attrs.handler.is_some()
        || attrs.terminates.is_some()
        || attrs.separator.is_some()
        || attrs.index.is_some()
}

fn lit_or_empty(lit: &Option<syn::LitStr>) -> String {
    lit.as_ref().map(syn::LitStr::value).unwrap_or_default()
}

/// Implements `Bindable` and `FieldAccess` for a `#[derive(Bind)]` struct.
fn impl_bind_struct(errors: &Errors, name: &syn::Ident, ds: &syn::DataStruct) -> TokenStream {
    let fields = match &ds.fields {
        syn::Fields::Named(fields) => fields,
        syn::Fields::Unnamed(_) => {
            errors.err(
                &ds.struct_token,
                "`#![derive(Bind)]` is not currently supported on tuple structs",
            );
            return TokenStream::new();
        }
        syn::Fields::Unit => {
            errors.err(&ds.struct_token, "#![derive(Bind)]` cannot be applied to unit structs");
            return TokenStream::new();
        }
    };

    let mut next_index = 0;
    let fields: Vec<_> = fields
        .named
        .iter()
        .filter_map(|field| {
            let attrs = FieldAttrs::parse(errors, field);
            StructField::new(errors, field, attrs, &mut next_index)
        })
        .collect();

    let decls = fields.iter().map(|field| field.decl(errors));
    let field_strs: Vec<String> = fields.iter().map(|field| field.name.to_string()).collect();
    let field_idents: Vec<&syn::Ident> = fields.iter().map(|field| field.name).collect();

    quote! {
        impl bindarg::FieldAccess for #name {
            fn get_field(&self, __field: &str) -> std::option::Option<bindarg::Value> {
                match __field {
                    #( #field_strs => bindarg::BindValue::to_value(&self.#field_idents), )*
                    _ => std::option::Option::None,
                }
            }

            fn set_field(
                &mut self,
                __field: &str,
                __value: bindarg::Value,
            ) -> std::result::Result<(), bindarg::AccessError> {
                match __field {
                    #(
                        #field_strs => {
                            self.#field_idents = bindarg::BindValue::from_value(__value)
                                .map_err(|message| bindarg::AccessError::Conversion {
                                    field: std::string::String::from(#field_strs),
                                    message,
                                })?;
                            std::result::Result::Ok(())
                        }
                    )*
                    _ => std::result::Result::Err(
                        bindarg::AccessError::UnknownField(std::string::String::from(__field))
                    ),
                }
            }
        }

        impl bindarg::Bindable for #name {
            fn fields() -> std::vec::Vec<bindarg::FieldDecl> {
                vec![ #( #decls, )* ]
            }
        }
    }
}

/// Implements `BindValue` for a `#[derive(BindEnum)]` unit enum.
fn impl_bind_enum(input: &syn::DeriveInput) -> TokenStream {
    let errors = &Errors::default();
    let name = &input.ident;
    check_type_attrs(errors, &input.attrs);

    let de = match &input.data {
        syn::Data::Enum(de) => de,
        _ => {
            errors.err(input, "`#[derive(BindEnum)]` can only be applied to enums");
            let mut tokens = TokenStream::new();
            errors.to_tokens(&mut tokens);
            return tokens;
        }
    };

    if de.variants.is_empty() {
        errors.err(
            &de.enum_token,
            "`#[derive(BindEnum)]` does not support `enum`s with no variants.",
        );
        let mut tokens = TokenStream::new();
        errors.to_tokens(&mut tokens);
        return tokens;
    }

    // A unit enum variant and the name it is bound by.
    struct EnumVariant<'a> {
        ident: &'a syn::Ident,
        value: String,
    }

    let variants: Vec<EnumVariant<'_>> = de
        .variants
        .iter()
        .filter_map(|variant| {
            let attrs = VariantAttrs::parse(errors, variant);
            if !matches!(variant.fields, syn::Fields::Unit) {
                errors.err(
                    &variant.fields,
                    "`#[derive(BindEnum)]` variants must not carry any fields.",
                );
                return None;
            }
            let value = attrs
                .name
                .as_ref()
                .map(syn::LitStr::value)
                .unwrap_or_else(|| variant.ident.to_string());
            Some(EnumVariant { ident: &variant.ident, value })
        })
        .collect();

    let values: Vec<&str> = variants.iter().map(|v| v.value.as_str()).collect();
    let to_arms = variants.iter().map(|v| {
        let ident = v.ident;
        let value = &v.value;
        quote! { #name::#ident => #value }
    });
    let from_arms = variants.iter().map(|v| {
        let ident = v.ident;
        let value = &v.value;
        quote! { #value => std::result::Result::Ok(#name::#ident) }
    });

    let mut output_tokens = quote! {
        impl bindarg::BindValue for #name {
            const FIELD_TYPE: bindarg::FieldType<'static> =
                bindarg::FieldType::Enum(&[ #( #values ),* ]);

            fn to_value(&self) -> std::option::Option<bindarg::Value> {
                let __name = match self {
                    #( #to_arms, )*
                };
                std::option::Option::Some(bindarg::Value::Enum(std::string::String::from(__name)))
            }

            fn from_value(
                __value: bindarg::Value,
            ) -> std::result::Result<Self, std::string::String> {
                match __value {
                    bindarg::Value::Enum(__name) | bindarg::Value::Str(__name) => {
                        match __name.as_str() {
                            #( #from_arms, )*
                            __other => std::result::Result::Err(
                                format!("unknown variant '{}'", __other)
                            ),
                        }
                    }
                    __other => std::result::Result::Err(
                        format!("expected an enum value, found {}", __other.type_label())
                    ),
                }
            }
        }
    };
    errors.to_tokens(&mut output_tokens);
    output_tokens
}
