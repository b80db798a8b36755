// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The binding registry extracted from a [`Bindable`](crate::Bindable) type.

use {
    crate::{
        handlers::{ArgumentHandler, OptionHandler},
        resolve, FieldInfo, FieldKind,
    },
    bindarg_shared::AUTO_CONFIG_KEY,
    std::{
        cell::Cell,
        collections::{hash_map::Entry, HashMap},
    },
    thiserror::Error,
    tracing::debug,
};

/// Creates a fresh option handler for one occurrence of an option.
pub type OptionHandlerFactory = fn() -> Box<dyn OptionHandler>;

/// Creates a fresh argument handler for one positional token.
pub type ArgumentHandlerFactory = fn() -> Box<dyn ArgumentHandler>;

/// The handler chosen for a field.
#[derive(Clone, Copy, Debug)]
pub enum HandlerOverride {
    /// Infer the handler from the field type.
    Infer,
    /// Use this handler for an option field.
    Option(OptionHandlerFactory),
    /// Use this handler for a positional argument field.
    Argument(ArgumentHandlerFactory),
}

/// The declaration of one bound field, as produced by `#[derive(Bind)]`.
#[derive(Clone, Copy, Debug)]
pub struct FieldDecl {
    /// The declared metadata.
    pub info: FieldInfo<'static>,
    /// The handler override, if any.
    pub handler: HandlerOverride,
}

impl FieldDecl {
    /// A declaration whose handler is inferred from its type.
    pub fn new(info: FieldInfo<'static>) -> Self {
        FieldDecl { info, handler: HandlerOverride::Infer }
    }

    /// Use `handler` instead of the inferred one.
    pub fn with_handler(mut self, handler: HandlerOverride) -> Self {
        self.handler = handler;
        self
    }
}

/// Errors in the declarations of a bindable type. These are programming
/// errors and are reported before any token is examined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two options share a name or alias.
    #[error(
        "The option with name or alias '{name}' for field named '{field}' overrides \
         the same for field named '{existing}'"
    )]
    DuplicateName { name: String, field: &'static str, existing: &'static str },
    /// An option was declared without a name.
    #[error("The option for field named '{0}' has no name")]
    MissingName(&'static str),
    /// Two positional arguments share an index.
    #[error("The arguments for fields named '{field}' and '{existing}' both use index {index}")]
    DuplicateIndex { index: usize, field: &'static str, existing: &'static str },
    /// A multi-valued argument is followed by another argument.
    #[error("The multi-valued argument for field named '{0}' must be the last argument")]
    MultiValueNotLast(&'static str),
    /// Two fields share a config key.
    #[error(
        "The config key '{key}' for field named '{field}' is already used by field named \
         '{existing}'"
    )]
    DuplicateConfigKey { key: String, field: &'static str, existing: &'static str },
    /// An option handler was given for an argument, or the reverse.
    #[error("The handler for field named '{0}' does not match its kind")]
    HandlerKindMismatch(&'static str),
    /// A no-operand option does not terminate parsing.
    #[error("The option '{0}' takes no operand and must be declared as terminating")]
    NoOperandWithoutTerminate(&'static str),
    /// No handler could be inferred for an option.
    #[error("No handler for option '{name}' of type {field_type}, declare one with `handler(...)`")]
    NoHandler { name: &'static str, field_type: &'static str },
}

/// The handler factory resolved for a declaration, tagged by field kind.
#[derive(Clone, Copy, Debug)]
enum Resolved {
    Option(OptionHandlerFactory),
    Argument(ArgumentHandlerFactory),
}

impl Resolved {
    fn from_decl(decl: &FieldDecl) -> Result<Self, SchemaError> {
        Ok(match decl.info.kind {
            FieldKind::Option => Resolved::Option(resolve::for_option(&decl.info, decl.handler)?),
            FieldKind::Argument => {
                Resolved::Argument(resolve::for_argument(&decl.info, decl.handler)?)
            }
        })
    }
}

/// A field declaration together with its resolved config key.
#[derive(Debug)]
pub struct FieldBinding {
    info: FieldInfo<'static>,
    config_key: Option<&'static str>,
    multi_value: Cell<bool>,
}

impl FieldBinding {
    fn new(info: FieldInfo<'static>) -> Self {
        let config_key = match info.config_key {
            "" => None,
            AUTO_CONFIG_KEY => Some(info.field),
            key => Some(key),
        };
        FieldBinding { info, config_key, multi_value: Cell::new(false) }
    }

    /// The declared metadata.
    pub fn info(&self) -> &FieldInfo<'static> {
        &self.info
    }

    /// The field identifier.
    pub fn field(&self) -> &'static str {
        self.info.field
    }

    /// The primary option name. Empty for arguments.
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    pub fn kind(&self) -> FieldKind {
        self.info.kind
    }

    /// The resolved config key, if the field can be set from a config file.
    pub fn config_key(&self) -> Option<&'static str> {
        self.config_key
    }

    pub fn terminates(&self) -> bool {
        self.info.terminates
    }

    /// Whether a list-typed argument has accepted a value, so that it keeps
    /// absorbing further tokens.
    pub fn is_multi_value(&self) -> bool {
        self.multi_value.get()
    }

    pub fn mark_multi_value(&self) {
        self.multi_value.set(true);
    }

    /// The label of this binding in help output and diagnostics.
    pub fn display_name(&self) -> String {
        match self.info.kind {
            FieldKind::Option => self.info.name.to_string(),
            FieldKind::Argument if !self.info.operand.is_empty() => self.info.operand.to_string(),
            FieldKind::Argument => ["<", self.info.field, ">"].concat(),
        }
    }
}

/// An option name or alias, with the binding and handler it selects.
#[derive(Clone, Copy, Debug)]
struct OptionEntry {
    binding: usize,
    make: OptionHandlerFactory,
}

/// A positional slot, with the binding and handler it selects.
#[derive(Clone, Copy, Debug)]
struct PositionalEntry {
    binding: usize,
    make: ArgumentHandlerFactory,
}

/// The validated set of bindings for one bindable type.
#[derive(Debug, Default)]
pub struct Registry {
    bindings: Vec<FieldBinding>,
    options: HashMap<&'static str, OptionEntry>,
    config_keys: HashMap<&'static str, usize>,
    positionals: Vec<PositionalEntry>,
    required_options: Vec<usize>,
    mandatory_arguments: usize,
}

impl Registry {
    /// Validate `decls` and resolve the handler of every field.
    pub fn extract(decls: Vec<FieldDecl>) -> Result<Self, SchemaError> {
        let mut registry = Registry::default();
        for decl in decls {
            let resolved = Resolved::from_decl(&decl)?;
            registry.add(FieldBinding::new(decl.info), resolved)?;
        }
        registry.finish_positionals()?;
        debug!(
            options = registry.options.len(),
            arguments = registry.positionals.len(),
            "extracted command line bindings"
        );
        Ok(registry)
    }

    fn add(&mut self, binding: FieldBinding, resolved: Resolved) -> Result<(), SchemaError> {
        let index = self.bindings.len();
        self.bindings.push(binding);
        let binding = &self.bindings[index];

        if let Some(key) = binding.config_key {
            if let Some(&existing) = self.config_keys.get(key) {
                return Err(SchemaError::DuplicateConfigKey {
                    key: key.to_string(),
                    field: binding.field(),
                    existing: self.bindings[existing].field(),
                });
            }
            self.config_keys.insert(key, index);
        }

        match resolved {
            Resolved::Option(make) => {
                if binding.name().is_empty() {
                    return Err(SchemaError::MissingName(binding.field()));
                }
                for name in binding.info.names() {
                    match self.options.entry(name) {
                        Entry::Vacant(entry) => {
                            entry.insert(OptionEntry { binding: index, make });
                        }
                        Entry::Occupied(entry) => {
                            return Err(SchemaError::DuplicateName {
                                name: name.to_string(),
                                field: binding.field(),
                                existing: self.bindings[entry.get().binding].field(),
                            });
                        }
                    }
                }
                if binding.info.required {
                    self.required_options.push(index);
                }
            }
            Resolved::Argument(make) => {
                self.positionals.push(PositionalEntry { binding: index, make });
                if binding.info.required {
                    self.mandatory_arguments += 1;
                }
            }
        }
        Ok(())
    }

    fn finish_positionals(&mut self) -> Result<(), SchemaError> {
        let bindings = &self.bindings;
        // Stable, so equal indices keep declaration order for the error message.
        self.positionals.sort_by_key(|entry| bindings[entry.binding].info.index);

        for pair in self.positionals.windows(2) {
            let (first, second) = (&bindings[pair[0].binding], &bindings[pair[1].binding]);
            if first.info.index == second.info.index {
                return Err(SchemaError::DuplicateIndex {
                    index: second.info.index,
                    field: second.field(),
                    existing: first.field(),
                });
            }
            if first.info.field_type == crate::FieldType::List {
                return Err(SchemaError::MultiValueNotLast(first.field()));
            }
        }
        Ok(())
    }

    /// All bindings in declaration order.
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    /// The binding at `index` in declaration order.
    pub fn binding(&self, index: usize) -> &FieldBinding {
        &self.bindings[index]
    }

    /// Look up an option by exact name or alias.
    pub fn option(&self, token: &str) -> Option<(usize, &FieldBinding)> {
        self.options.get(token).map(|entry| (entry.binding, &self.bindings[entry.binding]))
    }

    /// Look up an option together with its handler factory.
    pub(crate) fn option_entry(
        &self,
        token: &str,
    ) -> Option<(usize, &FieldBinding, OptionHandlerFactory)> {
        self.options
            .get(token)
            .map(|entry| (entry.binding, &self.bindings[entry.binding], entry.make))
    }

    /// All accepted option names and aliases, hidden ones included.
    pub fn option_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.options.keys().copied()
    }

    /// Option bindings in declaration order.
    pub fn options(&self) -> impl Iterator<Item = &FieldBinding> {
        self.bindings.iter().filter(|b| b.kind() == FieldKind::Option)
    }

    /// Positional bindings in index order.
    pub fn positionals(&self) -> impl Iterator<Item = &FieldBinding> {
        self.positionals.iter().map(move |entry| &self.bindings[entry.binding])
    }

    /// The positional binding in `slot`, counting in index order.
    pub fn positional(&self, slot: usize) -> Option<&FieldBinding> {
        self.positionals.get(slot).map(|entry| &self.bindings[entry.binding])
    }

    /// The positional binding in `slot` and its handler factory.
    pub(crate) fn positional_entry(
        &self,
        slot: usize,
    ) -> Option<(&FieldBinding, ArgumentHandlerFactory)> {
        self.positionals.get(slot).map(|entry| (&self.bindings[entry.binding], entry.make))
    }

    pub fn positional_count(&self) -> usize {
        self.positionals.len()
    }

    /// The binding for a config file key.
    pub fn config_binding(&self, key: &str) -> Option<&FieldBinding> {
        self.config_keys.get(key).map(|&i| &self.bindings[i])
    }

    /// Indices of the required options, in declaration order.
    pub fn required_options(&self) -> &[usize] {
        &self.required_options
    }

    /// The number of required positional arguments.
    pub fn mandatory_arguments(&self) -> usize {
        self.mandatory_arguments
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{handlers::StringHandler, option_handler, FieldType},
    };

    fn option(field: &'static str, name: &'static str, ty: FieldType<'static>) -> FieldDecl {
        FieldDecl::new(FieldInfo::option(field, name, ty))
    }

    fn argument(field: &'static str, index: usize, ty: FieldType<'static>) -> FieldDecl {
        FieldDecl::new(FieldInfo::argument(field, index, ty))
    }

    #[test]
    fn names_and_aliases_are_registered() {
        let registry = Registry::extract(vec![FieldDecl::new(
            FieldInfo::option("verbose", "-v", FieldType::Boolean).aliases(&["--verbose", ".-V"]),
        )])
        .unwrap();
        for name in ["-v", "--verbose", "-V"] {
            assert_eq!(registry.option(name).map(|(i, _)| i), Some(0), "{}", name);
        }
        assert!(registry.option(".-V").is_none());
    }

    #[test]
    fn duplicate_alias_names_both_fields() {
        let err = Registry::extract(vec![
            option("count", "-n", FieldType::Integer),
            FieldDecl::new(FieldInfo::option("name", "--name", FieldType::String).aliases(&["-n"])),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateName { name: "-n".to_string(), field: "name", existing: "count" }
        );
        assert_eq!(
            err.to_string(),
            "The option with name or alias '-n' for field named 'name' overrides the same for \
             field named 'count'"
        );
    }

    #[test]
    fn config_keys_resolve_to_field_names() {
        let registry = Registry::extract(vec![
            option("count", "-n", FieldType::Integer),
            FieldDecl::new(
                FieldInfo::option("name", "--name", FieldType::String).config_key("user"),
            ),
            FieldDecl::new(
                FieldInfo::option("quiet", "-q", FieldType::Boolean).config_key(""),
            ),
        ])
        .unwrap();
        assert_eq!(registry.config_binding("count").map(FieldBinding::field), Some("count"));
        assert_eq!(registry.config_binding("user").map(FieldBinding::field), Some("name"));
        assert!(registry.config_binding("name").is_none());
        assert!(registry.config_binding("quiet").is_none());
    }

    #[test]
    fn duplicate_config_keys_are_rejected() {
        let err = Registry::extract(vec![
            option("count", "-n", FieldType::Integer),
            FieldDecl::new(FieldInfo::option("other", "-o", FieldType::String).config_key("count")),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateConfigKey { field: "other", .. }));
    }

    #[test]
    fn positionals_are_sorted_by_index() {
        let registry = Registry::extract(vec![
            argument("second", 1, FieldType::String),
            argument("first", 0, FieldType::String),
        ])
        .unwrap();
        let order: Vec<_> = registry.positionals().map(FieldBinding::field).collect();
        assert_eq!(order, ["first", "second"]);
    }

    #[test]
    fn duplicate_indices_are_rejected() {
        let err = Registry::extract(vec![
            argument("first", 0, FieldType::String),
            argument("second", 0, FieldType::String),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateIndex { index: 0, field: "second", existing: "first" }
        );
    }

    #[test]
    fn lists_must_be_the_last_argument() {
        let err = Registry::extract(vec![
            argument("files", 0, FieldType::List),
            argument("target", 1, FieldType::String),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::MultiValueNotLast("files"));
    }

    #[test]
    fn required_fields_are_counted() {
        let registry = Registry::extract(vec![
            FieldDecl::new(FieldInfo::option("count", "-n", FieldType::Integer).required()),
            FieldDecl::new(FieldInfo::argument("file", 0, FieldType::String).required()),
            argument("extra", 1, FieldType::String),
        ])
        .unwrap();
        assert_eq!(registry.required_options(), &[0]);
        assert_eq!(registry.mandatory_arguments(), 1);
    }

    #[test]
    fn handler_kind_must_match_field_kind() {
        let err = Registry::extract(vec![argument("file", 0, FieldType::String)
            .with_handler(HandlerOverride::Option(option_handler::<StringHandler>))])
        .unwrap_err();
        assert_eq!(err, SchemaError::HandlerKindMismatch("file"));
    }

    #[test]
    fn display_names() {
        let registry = Registry::extract(vec![
            option("count", "-n", FieldType::Integer),
            argument("file", 0, FieldType::String),
        ])
        .unwrap();
        assert_eq!(registry.binding(0).display_name(), "-n");
        assert_eq!(registry.binding(1).display_name(), "<file>");
    }
}
