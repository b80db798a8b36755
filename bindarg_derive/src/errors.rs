// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use {
    proc_macro2::TokenStream,
    quote::ToTokens,
    std::cell::RefCell,
    syn::spanned::Spanned,
};

/// Every attribute problem found in one derive input. All of them are
/// emitted together as `compile_error!` invocations.
#[derive(Default)]
pub struct Errors {
    errors: RefCell<Vec<syn::Error>>,
}

impl Errors {
    /// Report `msg` at the span of `spanned`.
    pub fn err(&self, spanned: &impl Spanned, msg: &str) {
        self.push(syn::Error::new(spanned.span(), msg));
    }

    pub fn push(&self, err: syn::Error) {
        self.errors.borrow_mut().push(err);
    }

    /// Report an attribute given twice, pointing at both occurrences.
    pub fn duplicate_attrs(&self, attr_kind: &str, first: &impl Spanned, second: &impl Spanned) {
        self.err(second, &format!("`{}` is given more than once", attr_kind));
        self.err(first, &format!("`{}` was first given here", attr_kind));
    }

    pub fn expect_nested_meta<'a>(&self, nested: &'a syn::NestedMeta) -> Option<&'a syn::Meta> {
        match nested {
            syn::NestedMeta::Meta(meta) => Some(meta),
            syn::NestedMeta::Lit(lit) => {
                self.err(lit, "Expected an attribute, found a literal");
                None
            }
        }
    }

    pub fn expect_nested_lit<'a>(&self, nested: &'a syn::NestedMeta) -> Option<&'a syn::Lit> {
        match nested {
            syn::NestedMeta::Lit(lit) => Some(lit),
            syn::NestedMeta::Meta(meta) => {
                self.err(meta, "Expected a literal, found an attribute");
                None
            }
        }
    }

    /// Expect a list holding exactly one path, as in `handler(my::Handler)`.
    pub fn expect_single_path<'a>(&self, list: &'a syn::MetaList) -> Option<&'a syn::Path> {
        let mut nested = list.nested.iter();
        match (nested.next(), nested.next()) {
            (Some(only), None) => self.expect_meta_word(self.expect_nested_meta(only)?),
            _ => {
                self.err(list, "Expected exactly one path");
                None
            }
        }
    }

    pub fn expect_meta_word<'a>(&self, meta: &'a syn::Meta) -> Option<&'a syn::Path> {
        match meta {
            syn::Meta::Path(path) => Some(path),
            other => self.wrong_meta("a bare word", other),
        }
    }

    pub fn expect_meta_list<'a>(&self, meta: &'a syn::Meta) -> Option<&'a syn::MetaList> {
        match meta {
            syn::Meta::List(list) => Some(list),
            other => self.wrong_meta("a list", other),
        }
    }

    pub fn expect_meta_name_value<'a>(
        &self,
        meta: &'a syn::Meta,
    ) -> Option<&'a syn::MetaNameValue> {
        match meta {
            syn::Meta::NameValue(nv) => Some(nv),
            other => self.wrong_meta("`name = value`", other),
        }
    }

    pub fn expect_lit_str<'a>(&self, lit: &'a syn::Lit) -> Option<&'a syn::LitStr> {
        match lit {
            syn::Lit::Str(s) => Some(s),
            other => self.wrong_lit("string", other),
        }
    }

    pub fn expect_lit_int<'a>(&self, lit: &'a syn::Lit) -> Option<&'a syn::LitInt> {
        match lit {
            syn::Lit::Int(i) => Some(i),
            other => self.wrong_lit("integer", other),
        }
    }

    fn wrong_meta<T>(&self, expected: &str, found: &syn::Meta) -> Option<T> {
        let kind = match found {
            syn::Meta::Path(_) => "a bare word",
            syn::Meta::List(_) => "a list",
            syn::Meta::NameValue(_) => "`name = value`",
        };
        self.err(found, &format!("Expected {}, found {}", expected, kind));
        None
    }

    fn wrong_lit<T>(&self, expected: &str, found: &syn::Lit) -> Option<T> {
        let kind = match found {
            syn::Lit::Str(_) => "string",
            syn::Lit::Int(_) => "integer",
            syn::Lit::Float(_) => "float",
            syn::Lit::Bool(_) => "boolean",
            _ => "other",
        };
        self.err(found, &format!("Expected a {} literal, found a {} literal", expected, kind));
        None
    }
}

impl ToTokens for Errors {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(self.errors.borrow().iter().map(syn::Error::to_compile_error));
    }
}
