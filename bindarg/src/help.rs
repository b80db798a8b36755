// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Help text rendering.

use {
    crate::schema::{FieldBinding, Registry},
    bindarg_shared::{write_usage, FieldKind, USAGE_INDENT, WRAP_WIDTH},
};

/// Render the documented options, sorted by help order, followed by the
/// documented arguments in index order.
///
/// Each entry is a heading line followed by its wrapped usage text, and
/// entries are separated by a blank line.
pub fn render(registry: &Registry) -> String {
    let mut options: Vec<&FieldBinding> =
        registry.options().filter(|binding| binding.info().documented).collect();
    // Stable, so ties keep declaration order.
    options.sort_by_key(|binding| binding.info().help_order);
    let arguments = registry.positionals().filter(|binding| binding.info().documented);

    let mut out = String::new();
    for (i, binding) in options.into_iter().chain(arguments).enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        write_heading(&mut out, binding);
        let usage = binding.info().usage;
        if !usage.is_empty() {
            out.push('\n');
            write_usage(&mut out, usage, USAGE_INDENT, WRAP_WIDTH);
        }
    }
    out
}

fn write_heading(out: &mut String, binding: &FieldBinding) {
    let info = binding.info();
    match info.kind {
        FieldKind::Option => {
            out.push_str(info.name);
            for alias in info.visible_aliases() {
                out.push_str(" | ");
                out.push_str(alias);
            }
            if !info.operand.is_empty() {
                out.push(' ');
                out.push_str(info.operand);
            }
        }
        FieldKind::Argument => out.push_str(&binding.display_name()),
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{FieldDecl, FieldInfo, FieldType},
    };

    #[test]
    fn options_sort_by_help_order_before_arguments() {
        let mut late = FieldInfo::option("verbose", "-v", FieldType::Boolean)
            .aliases(&["--verbose", ".--loud"])
            .usage("Print more");
        late.help_order = 2;
        let mut early = FieldInfo::option("count", "-n", FieldType::Integer).usage("How many");
        early.help_order = 1;
        early.operand = "COUNT";
        let mut secret = FieldInfo::option("debug", "--debug", FieldType::Boolean);
        secret.documented = false;

        let registry = Registry::extract(vec![
            FieldDecl::new(FieldInfo::argument("file", 0, FieldType::String).usage("Input file")),
            FieldDecl::new(late),
            FieldDecl::new(secret),
            FieldDecl::new(early),
        ])
        .unwrap();

        assert_eq!(
            render(&registry),
            "-n COUNT\n     How many\n\n\
             -v | --verbose\n     Print more\n\n\
             <file>\n     Input file"
        );
    }

    #[test]
    fn entries_without_usage_have_only_a_heading() {
        let registry = Registry::extract(vec![
            FieldDecl::new(FieldInfo::option("quiet", "-q", FieldType::Boolean)),
            FieldDecl::new(FieldInfo::option("verbose", "-v", FieldType::Boolean)),
        ])
        .unwrap();
        assert_eq!(render(&registry), "-q\n\n-v");
    }
}
