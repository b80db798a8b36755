// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Shared functionality between bindarg_derive and the bindarg runtime.
//!
//! This library is intended only for internal use by these two crates.

#[cfg(feature = "serde")]
use serde::Serialize;

/// Config key value meaning "use the field's own name".
pub const AUTO_CONFIG_KEY: &str = "<auto>";

/// Aliases starting with this character are accepted but never shown in help.
pub const HIDDEN_ALIAS_MARKER: char = '.';

/// Whether a field is bound by name or by position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum FieldKind {
    /// A named input, e.g. `--count 5`.
    Option,
    /// A positional input.
    Argument,
}

/// The semantic type of a bound field, used to infer its handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum FieldType<'a> {
    /// `String`
    String,
    /// `bool`
    Boolean,
    /// `i32`
    Integer,
    /// `i64`
    Long,
    /// `f32`
    Float,
    /// `f64`
    Double,
    /// A unit enum, carrying its legal variant names in declaration order.
    Enum(&'a [&'a str]),
    /// A marker type for options that take no operand at all.
    NoOperand,
    /// `Vec<String>`
    List,
    /// Any other type. These fields need an explicit handler.
    Other(&'a str),
}

impl<'a> FieldType<'a> {
    /// A short human readable name, used in diagnostics.
    pub fn label(&self) -> &'a str {
        match self {
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Enum(_) => "enum",
            FieldType::NoOperand => "no-operand",
            FieldType::List => "list",
            FieldType::Other(name) => *name,
        }
    }
}

/// Declarative metadata for a single bound field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FieldInfo<'a> {
    /// The identifier used by the field accessor.
    pub field: &'a str,
    /// Option or positional argument.
    pub kind: FieldKind,
    /// The option name, e.g. `--count`. Empty for arguments.
    pub name: &'a str,
    /// Additional names for an option. See [`HIDDEN_ALIAS_MARKER`].
    pub aliases: &'a [&'a str],
    /// Key used in config files, [`AUTO_CONFIG_KEY`], or empty when the field
    /// cannot be set from a config file.
    pub config_key: &'a str,
    /// Position of an argument among the other arguments.
    pub index: usize,
    /// Help text.
    pub usage: &'a str,
    /// Label for the operand in help output.
    pub operand: &'a str,
    /// Whether the field is shown in help output.
    pub documented: bool,
    /// Sort key for help output, smaller first.
    pub help_order: i32,
    /// Whether the field must be provided.
    pub required: bool,
    /// Informational text shown when a required argument is missing.
    pub missing: &'a str,
    /// Stop processing further tokens once this field has been bound.
    pub terminates: bool,
    /// Separator between the values of a multi-valued operand.
    pub separator: &'a str,
    /// The semantic type of the field.
    pub field_type: FieldType<'a>,
}

impl<'a> FieldInfo<'a> {
    /// An option named `name` bound to `field`, with default settings.
    pub fn option(field: &'a str, name: &'a str, field_type: FieldType<'a>) -> Self {
        FieldInfo {
            field,
            kind: FieldKind::Option,
            name,
            aliases: &[],
            config_key: AUTO_CONFIG_KEY,
            index: 0,
            usage: "",
            operand: "",
            documented: true,
            help_order: i32::MAX,
            required: false,
            missing: "",
            terminates: false,
            separator: "",
            field_type,
        }
    }

    /// A positional argument at `index` bound to `field`, with default settings.
    pub fn argument(field: &'a str, index: usize, field_type: FieldType<'a>) -> Self {
        FieldInfo {
            field,
            kind: FieldKind::Argument,
            name: "",
            aliases: &[],
            config_key: "",
            index,
            usage: "",
            operand: "",
            documented: true,
            help_order: i32::MAX,
            required: false,
            missing: "",
            terminates: false,
            separator: ",",
            field_type,
        }
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the option aliases.
    pub fn aliases(mut self, aliases: &'a [&'a str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Set the config key.
    pub fn config_key(mut self, key: &'a str) -> Self {
        self.config_key = key;
        self
    }

    /// Stop parsing once this field is bound.
    pub fn terminates(mut self) -> Self {
        self.terminates = true;
        self
    }

    /// Set the help text.
    pub fn usage(mut self, usage: &'a str) -> Self {
        self.usage = usage;
        self
    }

    /// Set the message shown when a required argument is missing.
    pub fn missing(mut self, missing: &'a str) -> Self {
        self.missing = missing;
        self
    }

    /// Iterate the option's name and aliases with hidden markers stripped.
    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied()).map(strip_hidden_marker)
    }

    /// Iterate the aliases that should be shown in help output.
    pub fn visible_aliases(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.aliases.iter().copied().filter(|alias| !alias.starts_with(HIDDEN_ALIAS_MARKER))
    }
}

/// Remove a leading [`HIDDEN_ALIAS_MARKER`], if any.
pub fn strip_hidden_marker(name: &str) -> &str {
    name.strip_prefix(HIDDEN_ALIAS_MARKER).unwrap_or(name)
}

/// Column at which usage text starts.
pub const USAGE_INDENT: usize = 5;
/// Maximum width of a usage line.
pub const WRAP_WIDTH: usize = 78;

/// Write `text` to `out`, indenting every line by `indent` columns and
/// wrapping words so lines stay within `width` characters.
///
/// Explicit newlines in `text` are kept. A single word longer than the
/// available width is written on its own line unbroken.
pub fn write_usage(out: &mut String, text: &str, indent: usize, width: usize) {
    for (i, paragraph) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut current_line = String::new();
        indent_line(&mut current_line, indent);

        let mut words = paragraph.split(' ').filter(|word| !word.is_empty()).peekable();
        while let Some(first_word) = words.next() {
            current_line.push_str(first_word);

            'inner: while let Some(&word) = words.peek() {
                if (char_len(&current_line) + char_len(word) + 1) > width {
                    new_line(&mut current_line, out);
                    indent_line(&mut current_line, indent);
                    break 'inner;
                } else {
                    // advance the iterator
                    let _ = words.next();
                    current_line.push(' ');
                    current_line.push_str(word);
                }
            }
        }
        out.push_str(current_line.trim_end());
    }
}

fn indent_line(line: &mut String, indent: usize) {
    line.extend(std::iter::repeat(' ').take(indent));
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

// Append the current line and a newline to the output,
// clearing the current line.
fn new_line(current_line: &mut String, out: &mut String) {
    out.push_str(current_line.trim_end());
    out.push('\n');
    current_line.truncate(0);
}
