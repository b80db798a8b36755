// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Declarative command line binding.
//!
//! Fields of a struct are annotated as named options or positional
//! arguments with `#[derive(Bind)]`. The command line is then bound onto an
//! instance of the struct, collecting every problem found along the way
//! instead of stopping at the first. The same bindings can be filled in
//! from a JSON config file.
//!
//! ## Basic Example
//!
//! ```rust
//! use bindarg::Bind;
//!
//! #[derive(Bind, Default)]
//! struct Duplicate {
//!     /// how many copies to make
//!     #[bindarg(option, name = "-n", aliases("--count"), operand = "COUNT", required)]
//!     count: i32,
//!
//!     /// print every file as it is copied
//!     #[bindarg(option, name = "-v")]
//!     verbose: bool,
//!
//!     /// the file to copy
//!     #[bindarg(argument, required, missing = "Name the file to copy.")]
//!     file: String,
//! }
//!
//! let dup: Duplicate = bindarg::prepare(&["-n", "5", "file.txt"]).unwrap();
//! assert_eq!(dup.count, 5);
//! assert!(!dup.verbose);
//! assert_eq!(dup.file, "file.txt");
//!
//! let problems = match bindarg::prepare::<Duplicate>(&["-n", "5"]) {
//!     Err(bindarg::BindError::Rejected(problems)) => problems,
//!     _ => unreachable!(),
//! };
//! assert!(problems.contains("Missing mandatory arguments!"));
//! assert!(problems.contains("Name the file to copy."));
//! ```
//!
//! Options are bound by name or alias, wherever they appear. An option
//! named by `name` defaults to `--` followed by the kebab-cased field name.
//! Aliases starting with `.` are accepted but not shown in help output.
//! Every other token fills the next positional argument, in `index` order.
//! A `Vec<String>` argument must come last and absorbs all remaining
//! positional tokens.
//!
//! The handler binding a field is inferred from its type: `String`, `bool`,
//! `i32`, `i64`, `f32`, `f64`, unit enums deriving [`BindEnum`], and
//! `Option`s of these. Any other type, or a different behavior, is chosen
//! with `handler(...)`:
//!
//! ```rust
//! use {
//!     bindarg::{Bind, CommandLine, NoOperand},
//!     std::path::PathBuf,
//! };
//!
//! #[derive(Bind, Default)]
//! struct Tool {
//!     /// show this text
//!     #[bindarg(option, name = "--help", terminates, handler(bindarg::HelpHandler))]
//!     help: NoOperand,
//!
//!     /// directories to search, separated by ';'
//!     #[bindarg(option, name = "--path", handler(bindarg::SeparatedListHandler))]
//!     path: Vec<String>,
//!
//!     /// where to write the result
//!     #[bindarg(option, name = "-o", handler(bindarg::StringHandler))]
//!     output: Option<PathBuf>,
//! }
//!
//! let mut cli = CommandLine::<Tool>::new().unwrap();
//! let tool = cli.parse(&["--path", "a;b", "-o", "out.txt"]).unwrap();
//! assert_eq!(tool.path, ["a", "b"]);
//! assert_eq!(tool.output, Some(PathBuf::from("out.txt")));
//!
//! let mut cli = CommandLine::<Tool>::new().unwrap();
//! cli.parse(&["--help"]).unwrap();
//! assert!(cli.terminated());
//! assert!(cli.help_output().unwrap().starts_with("--help\n     show this text"));
//! ```
//!
//! Binding stops after a field declared with `terminates` is bound, be it an
//! option or a positional argument. A [`NoOperand`] option without its own
//! handler must terminate.
//!
//! ## Config files
//!
//! Options can also be read from a flat JSON object whose keys are config
//! keys. The config key defaults to the field name, is set with
//! `config_key = "..."` and is removed with `no_config`. The values are
//! turned back into tokens and bound with the same handlers.
//!
//! The option naming the config file is usually declared with
//! [`ConfigFileHandler`]. Give it `terminates` when the type has required
//! options, so that a command line holding only the config file passes and
//! the required values can come from [`CommandLine::configure_by_file`].
//!
//! ```rust
//! # use bindarg::Bind;
//! #[derive(Bind, Default)]
//! struct Server {
//!     #[bindarg(option, name = "--port")]
//!     port: i32,
//!
//!     #[bindarg(option, name = "--name", config_key = "server_name")]
//!     name: String,
//! }
//!
//! let config = serde_json::json!({ "port": 8080, "server_name": "local" });
//! let config = config.as_object().unwrap();
//!
//! let mut cli = bindarg::CommandLine::<Server>::new().unwrap();
//! let mut server = cli.parse(&[]).unwrap();
//! assert!(cli.overlay(&mut server, config));
//! assert_eq!(server.port, 8080);
//! assert_eq!(server.name, "local");
//! ```

use {
    crate::parse::PassOutcome,
    std::{marker::PhantomData, path::Path},
    thiserror::Error,
    tracing::debug,
};

mod config;
mod handlers;
mod help;
mod parse;
mod problems;
mod resolve;
mod schema;
mod value;

pub use {
    crate::{
        config::{
            synthesize_tokens, ConfigError, ConfigMap, ConfigSource, JsonFile, ARRAY_SEPARATOR,
        },
        handlers::{
            ArgumentHandler, BooleanHandler, ConfigFileHandler, DefaultArgumentHandler,
            DoubleHandler, EnumHandler, FloatHandler, HandlerError, HelpHandler, IntegerHandler,
            LongHandler, NoOperandHandler, Numeric, NumericHandler, OperandPolicy, OptionHandler,
            SeparatedListHandler, StringHandler, DEFAULT_LIST_SEPARATOR,
        },
        parse::{ParseMode, ParseSession, ParseState, USE_HELP},
        problems::{Problem, Problems, Severity},
        schema::{
            ArgumentHandlerFactory, FieldBinding, FieldDecl, HandlerOverride,
            OptionHandlerFactory, Registry, SchemaError,
        },
        value::{AccessError, BindValue, FieldAccess, NoOperand, Value},
    },
    bindarg_derive::{Bind, BindEnum},
    bindarg_shared::{FieldInfo, FieldKind, FieldType},
};

/// Types whose fields can be bound from a command line.
///
/// This trait is implemented by `#[derive(Bind)]`.
pub trait Bindable: FieldAccess {
    /// The declarations of all bound fields, in declaration order.
    fn fields() -> Vec<FieldDecl>;
}

/// Create the handler used by `handler(H)` on an option field.
pub fn option_handler<H: OptionHandler + Default + 'static>() -> Box<dyn OptionHandler> {
    Box::new(H::default())
}

/// Create the handler used by `handler(H)` on an argument field.
pub fn argument_handler<H: ArgumentHandler + Default + 'static>() -> Box<dyn ArgumentHandler> {
    Box::new(H::default())
}

/// Binds command lines and config files onto instances of `T`.
///
/// The problems of every bind are accumulated, so a `CommandLine` is meant
/// to serve one primary parse, optionally followed by config overlays.
pub struct CommandLine<T> {
    registry: Registry,
    problems: Problems,
    config_file: Option<String>,
    options_seen: usize,
    terminated: bool,
    output: Option<String>,
    _target: PhantomData<fn(T)>,
}

impl<T: Bindable> CommandLine<T> {
    /// Extract and validate the bindings of `T`.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(CommandLine {
            registry: Registry::extract(T::fields())?,
            problems: Problems::default(),
            config_file: None,
            options_seen: 0,
            terminated: false,
            output: None,
            _target: PhantomData,
        })
    }

    /// Bind `args` onto `target`. Returns whether the bind succeeded, in
    /// which case `target` holds the bound values.
    pub fn parse_into(&mut self, target: &mut T, args: &[&str]) -> bool {
        let tokens = args.iter().map(|arg| arg.to_string()).collect();
        let outcome = self.run_pass(target, tokens, ParseMode::Primary);
        self.options_seen = outcome.options_seen;
        self.config_file = outcome.config_file;
        self.terminated = outcome.state == ParseState::Terminated;
        outcome.state != ParseState::Failed
    }

    /// Bind `config` onto `target` as if its options had been given on the
    /// command line.
    pub fn overlay(&mut self, target: &mut T, config: &ConfigMap) -> bool {
        match synthesize_tokens(&self.registry, config) {
            Ok(tokens) => self.overlay_tokens(target, tokens),
            Err(err) => {
                self.problems.add_fatal(format!("Invalid configuration\n{}", err));
                false
            }
        }
    }

    /// Load the JSON config file at `path` and bind it onto `target`.
    ///
    /// A path that is not a file is only reported as a problem if the
    /// command line bound any option.
    pub fn configure_by_file(&mut self, target: &mut T, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if !path.is_file() {
            if self.options_seen > 0 {
                self.problems.add_fatal(format!(
                    "The config file '{}' is not a file or cannot be read",
                    path.display()
                ));
            }
            return false;
        }
        self.configure_from(target, &JsonFile, path)
    }

    /// Load the config at `path` from `source` and bind it onto `target`.
    pub fn configure_from(
        &mut self,
        target: &mut T,
        source: &dyn ConfigSource,
        path: &Path,
    ) -> bool {
        let tokens = source
            .load(path)
            .and_then(|config| synthesize_tokens(&self.registry, &config));
        match tokens {
            Ok(tokens) => self.overlay_tokens(target, tokens),
            Err(err) => {
                self.problems.add_fatal(format!(
                    "Exception while reading the config file '{}'\n{}",
                    path.display(),
                    err
                ));
                false
            }
        }
    }

    fn overlay_tokens(&mut self, target: &mut T, tokens: Vec<String>) -> bool {
        if tokens.is_empty() {
            return true;
        }
        debug!(?tokens, "binding config file tokens");
        self.run_pass(target, tokens, ParseMode::ConfigFile).state != ParseState::Failed
    }

    fn run_pass(&mut self, target: &mut T, tokens: Vec<String>, mode: ParseMode) -> PassOutcome {
        let mut outcome =
            ParseSession::new(&self.registry, target, &mut self.problems, tokens, mode).run();
        if outcome.output.is_some() {
            self.output = outcome.output.take();
        }
        outcome
    }

    /// The problems recorded so far.
    pub fn problems(&self) -> &Problems {
        &self.problems
    }

    pub fn into_problems(self) -> Problems {
        self.problems
    }

    /// The config file named on the command line, if any.
    pub fn config_file(&self) -> Option<&str> {
        self.config_file.as_deref()
    }

    /// Whether the command line bound a terminating option.
    pub fn terminated(&self) -> bool {
        self.terminated
    }

    /// Text a handler asked to show instead of running, such as help.
    pub fn help_output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// The validated bindings.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the help text of `T`.
    pub fn help(&self) -> String {
        help::render(&self.registry)
    }

    /// The documented fields of `T` as JSON.
    #[cfg(feature = "serde")]
    pub fn help_json(&self) -> Result<String, serde_json::Error> {
        let fields: Vec<&FieldInfo<'static>> = self
            .registry
            .bindings()
            .iter()
            .map(FieldBinding::info)
            .filter(|info| info.documented)
            .collect();
        serde_json::to_string_pretty(&fields)
    }
}

impl<T: Bindable + Default> CommandLine<T> {
    /// Bind `args` onto a default instance of `T`, returning it on success.
    pub fn parse(&mut self, args: &[&str]) -> Option<T> {
        let mut target = T::default();
        if self.parse_into(&mut target, args) {
            Some(target)
        } else {
            None
        }
    }
}

/// Why [`prepare`] returned no instance.
#[derive(Debug, Error)]
pub enum BindError {
    /// The declarations of the type are invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The command line was rejected.
    #[error("{0}")]
    Rejected(Problems),
}

/// Bind `args` onto a default instance of `T`.
pub fn prepare<T: Bindable + Default>(args: &[&str]) -> Result<T, BindError> {
    let mut cli = CommandLine::<T>::new()?;
    match cli.parse(args) {
        Some(target) => Ok(target),
        None => Err(BindError::Rejected(cli.into_problems())),
    }
}

/// Create a `T` from the current program's command line.
///
/// Help output requested with a [`HelpHandler`] option is printed and the
/// program exits successfully. If binding fails, the problems are printed
/// and the program exits with an error, as it does when the declarations of
/// `T` are invalid.
pub fn from_env<T: Bindable + Default>() -> T {
    let strings: Vec<String> = std::env::args_os()
        .map(|s| s.into_string())
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|arg| {
            eprintln!("Invalid utf8: {}", arg.to_string_lossy());
            std::process::exit(1)
        });

    if strings.is_empty() {
        eprintln!("No program name, argv is empty");
        std::process::exit(1)
    }

    let cmd = cmd(&strings[0], &strings[0]);
    let strs: Vec<&str> = strings[1..].iter().map(|s| s.as_str()).collect();
    let mut cli = CommandLine::<T>::new().unwrap_or_else(|err| {
        eprintln!("{}: {}", cmd, err);
        std::process::exit(1)
    });
    match cli.parse(&strs) {
        Some(target) => {
            if let Some(output) = cli.help_output() {
                println!("{}", output);
                std::process::exit(0)
            }
            target
        }
        None => {
            eprintln!("{}", cli.problems());
            if !cli.problems().contains(USE_HELP) {
                eprintln!("Run {} --help for more information.", cmd);
            }
            std::process::exit(1)
        }
    }
}

/// Extract the base cmd from a path
fn cmd<'a>(default: &'a str, path: &'a str) -> &'a str {
    std::path::Path::new(path).file_name().and_then(|s| s.to_str()).unwrap_or(default)
}
