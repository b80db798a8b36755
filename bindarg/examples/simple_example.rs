// Copyright (c) 2022 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use {
    bindarg::{Bind, BindEnum, NoOperand},
    std::fmt::Debug,
};

#[derive(BindEnum, Clone, Copy, PartialEq, Debug)]
enum Mode {
    Fast,
    Careful,
}

#[derive(Bind, Default, PartialEq, Debug)]
struct CopyFiles {
    /// display this text
    #[bindarg(
        option,
        name = "--help",
        aliases("-h"),
        terminates,
        help_order = 0,
        handler(bindarg::HelpHandler)
    )]
    help: NoOperand,

    /// how many copies to make
    #[bindarg(option, name = "-n", aliases("--count"), operand = "COUNT")]
    count: i32,

    /// how to copy, Fast or Careful
    #[bindarg(option, operand = "MODE")]
    mode: Option<Mode>,

    /// print every file as it is copied
    #[bindarg(option, name = "-v", aliases("--verbose"))]
    verbose: bool,

    /// where to put the copies
    #[bindarg(argument, required, operand = "TARGET", missing = "Name the target directory.")]
    target: String,

    /// the files to copy
    #[bindarg(argument, operand = "FILES")]
    files: Vec<String>,
}

fn main() {
    let copy: CopyFiles = bindarg::from_env();
    println!("{:#?}", copy);
}
