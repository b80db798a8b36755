// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::errors::Errors;

/// The kind of binding declared for a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// `#[bindarg(option)]`
    Option,
    /// `#[bindarg(argument)]`
    Argument,
}

/// Attributes applied to a field of a `#![derive(Bind)]` struct.
#[derive(Default)]
pub struct FieldAttrs {
    pub kind: Option<(FieldKind, syn::Path)>,
    pub name: Option<syn::LitStr>,
    pub aliases: Vec<syn::LitStr>,
    pub config_key: Option<syn::LitStr>,
    pub no_config: Option<syn::Path>,
    pub usage: Option<syn::LitStr>,
    pub description: Option<String>,
    pub operand: Option<syn::LitStr>,
    pub hidden: Option<syn::Path>,
    pub help_order: Option<syn::LitInt>,
    pub required: Option<syn::Path>,
    pub missing: Option<syn::LitStr>,
    pub handler: Option<syn::Path>,
    pub terminates: Option<syn::Path>,
    pub separator: Option<syn::LitStr>,
    pub index: Option<syn::LitInt>,
}

impl FieldAttrs {
    pub fn parse(errors: &Errors, field: &syn::Field) -> Self {
        let mut this = Self::default();

        for attr in &field.attrs {
            if is_doc_attr(attr) {
                parse_attr_doc(errors, attr, &mut this.description);
                continue;
            }

            let ml = if let Some(ml) = bindarg_attr_to_meta_list(errors, attr) {
                ml
            } else {
                continue;
            };

            for meta in &ml.nested {
                let meta = if let Some(m) = errors.expect_nested_meta(meta) { m } else { continue };

                let name = meta.path();
                if name.is_ident("option") {
                    parse_kind(errors, meta, FieldKind::Option, &mut this.kind);
                } else if name.is_ident("argument") {
                    parse_kind(errors, meta, FieldKind::Argument, &mut this.kind);
                } else if name.is_ident("name") {
                    parse_attr_string(errors, meta, "name", &mut this.name);
                } else if name.is_ident("aliases") {
                    if let Some(list) = errors.expect_meta_list(meta) {
                        parse_string_list(errors, list, &mut this.aliases);
                    }
                } else if name.is_ident("config_key") {
                    parse_attr_string(errors, meta, "config_key", &mut this.config_key);
                } else if name.is_ident("no_config") {
                    parse_attr_flag(errors, meta, "no_config", &mut this.no_config);
                } else if name.is_ident("usage") {
                    parse_attr_string(errors, meta, "usage", &mut this.usage);
                } else if name.is_ident("operand") {
                    parse_attr_string(errors, meta, "operand", &mut this.operand);
                } else if name.is_ident("hidden") {
                    parse_attr_flag(errors, meta, "hidden", &mut this.hidden);
                } else if name.is_ident("help_order") {
                    parse_attr_int(errors, meta, "help_order", &mut this.help_order);
                } else if name.is_ident("required") {
                    parse_attr_flag(errors, meta, "required", &mut this.required);
                } else if name.is_ident("missing") {
                    parse_attr_string(errors, meta, "missing", &mut this.missing);
                } else if name.is_ident("handler") {
                    parse_attr_handler(errors, meta, &mut this.handler);
                } else if name.is_ident("terminates") {
                    parse_attr_flag(errors, meta, "terminates", &mut this.terminates);
                } else if name.is_ident("separator") {
                    parse_attr_string(errors, meta, "separator", &mut this.separator);
                } else if name.is_ident("index") {
                    parse_attr_int(errors, meta, "index", &mut this.index);
                } else {
                    errors.err(
                        &meta,
                        concat!(
                            "Invalid field-level `bindarg` attribute\n",
                            "Expected one of: `option`, `argument`, `name`, `aliases`, ",
                            "`config_key`, `no_config`, `usage`, `operand`, `hidden`, ",
                            "`help_order`, `required`, `missing`, `handler`, `terminates`, ",
                            "`separator`, `index`",
                        ),
                    );
                }
            }
        }

        this
    }
}

/// Attributes applied to a variant of a `#![derive(BindEnum)]` enum.
#[derive(Default)]
pub struct VariantAttrs {
    pub name: Option<syn::LitStr>,
}

impl VariantAttrs {
    pub fn parse(errors: &Errors, variant: &syn::Variant) -> Self {
        let mut this = Self::default();

        for attr in &variant.attrs {
            let ml = if let Some(ml) = bindarg_attr_to_meta_list(errors, attr) {
                ml
            } else {
                continue;
            };

            for meta in &ml.nested {
                let meta = if let Some(m) = errors.expect_nested_meta(meta) { m } else { continue };
                if meta.path().is_ident("name") {
                    parse_attr_string(errors, meta, "name", &mut this.name);
                } else {
                    errors.err(
                        &meta,
                        "Invalid variant-level `bindarg` attribute\nExpected: `name`",
                    );
                }
            }
        }

        this
    }
}

/// Reject `#[bindarg(...)]` attributes on the type itself.
pub fn check_type_attrs(errors: &Errors, attrs: &[syn::Attribute]) {
    for attr in attrs {
        if attr.path.is_ident("bindarg") {
            errors.err(attr, "`bindarg` attributes are only allowed on fields and variants");
        }
    }
}

fn is_doc_attr(attr: &syn::Attribute) -> bool {
    attr.path.is_ident("doc")
}

fn parse_attr_doc(errors: &Errors, attr: &syn::Attribute, slot: &mut Option<String>) {
    let meta = match attr.parse_meta() {
        Ok(meta) => meta,
        // Some doc comments, like `#[doc(hidden)]`, carry no text.
        Err(_) => return,
    };
    let nv = if let syn::Meta::NameValue(nv) = &meta { nv } else { return };
    let lit_str = if let Some(lit_str) = errors.expect_lit_str(&nv.lit) { lit_str } else { return };

    let line = lit_str.value();
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    let text = slot.get_or_insert_with(String::new);
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(line);
}

/// Filters out non-`#[bindarg(...)]` attributes and converts to `syn::MetaList`.
fn bindarg_attr_to_meta_list(errors: &Errors, attr: &syn::Attribute) -> Option<syn::MetaList> {
    if !attr.path.is_ident("bindarg") {
        return None;
    }

    let meta = match attr.parse_meta() {
        Ok(meta) => meta,
        Err(e) => {
            errors.push(e);
            return None;
        }
    };
    errors.expect_meta_list(&meta).cloned()
}

fn parse_kind(
    errors: &Errors,
    meta: &syn::Meta,
    kind: FieldKind,
    slot: &mut Option<(FieldKind, syn::Path)>,
) {
    let path = if let Some(path) = errors.expect_meta_word(meta) { path } else { return };
    if let Some((_, first)) = slot.as_ref() {
        errors.duplicate_attrs("field kind", first, path);
    } else {
        *slot = Some((kind, path.clone()));
    }
}

fn parse_attr_flag(errors: &Errors, meta: &syn::Meta, name: &str, slot: &mut Option<syn::Path>) {
    let path = if let Some(path) = errors.expect_meta_word(meta) { path } else { return };
    if let Some(first) = slot.as_ref() {
        errors.duplicate_attrs(name, first, path);
    } else {
        *slot = Some(path.clone());
    }
}

fn parse_attr_string(
    errors: &Errors,
    meta: &syn::Meta,
    name: &str,
    slot: &mut Option<syn::LitStr>,
) {
    let nv = if let Some(nv) = errors.expect_meta_name_value(meta) { nv } else { return };
    if let Some(first) = slot.as_ref() {
        errors.duplicate_attrs(name, first, nv);
    } else if let Some(lit_str) = errors.expect_lit_str(&nv.lit) {
        *slot = Some(lit_str.clone());
    }
}

fn parse_attr_int(errors: &Errors, meta: &syn::Meta, name: &str, slot: &mut Option<syn::LitInt>) {
    let nv = if let Some(nv) = errors.expect_meta_name_value(meta) { nv } else { return };
    if let Some(first) = slot.as_ref() {
        errors.duplicate_attrs(name, first, nv);
    } else if let Some(lit_int) = errors.expect_lit_int(&nv.lit) {
        *slot = Some(lit_int.clone());
    }
}

fn parse_string_list(errors: &Errors, list: &syn::MetaList, out: &mut Vec<syn::LitStr>) {
    for nested in &list.nested {
        let lit = if let Some(lit) = errors.expect_nested_lit(nested) { lit } else { continue };
        if let Some(lit_str) = errors.expect_lit_str(lit) {
            out.push(lit_str.clone());
        }
    }
}

fn parse_attr_handler(errors: &Errors, meta: &syn::Meta, slot: &mut Option<syn::Path>) {
    let list = if let Some(list) = errors.expect_meta_list(meta) { list } else { return };
    let path = if let Some(path) = errors.expect_single_path(list) { path } else { return };
    if let Some(first) = slot.as_ref() {
        errors.duplicate_attrs("handler", first, path);
    } else {
        *slot = Some(path.clone());
    }
}
