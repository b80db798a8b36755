// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The token scanning engine.

use {
    crate::{
        handlers::HandlerError,
        problems::Problems,
        schema::{FieldBinding, OptionHandlerFactory, Registry},
        AccessError, FieldAccess, Value,
    },
    rust_fuzzy_search::fuzzy_search_best_n,
    tracing::{debug, trace},
};

/// Hint appended when a required option is missing.
pub const USE_HELP: &str = "Use --help to learn how to use this program.";

/// Suggestions scoring below this are not shown.
const SUGGESTION_THRESHOLD: f32 = 0.5;

/// Where a session stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseState {
    /// Tokens are still being scanned.
    Running,
    /// A terminating field was bound or an option failed, and no further
    /// tokens are examined.
    Terminated,
    /// The bind failed.
    Failed,
}

/// Which tokens a session scans.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    /// Tokens from the user's command line.
    Primary,
    /// Tokens synthesized from a config file.
    ConfigFile,
}

/// What a finished session leaves behind.
#[derive(Debug)]
pub(crate) struct PassOutcome {
    pub state: ParseState,
    pub options_seen: usize,
    pub config_file: Option<String>,
    pub output: Option<String>,
}

/// The state of one scan over a token list.
///
/// Handlers receive the session to read tokens and to write into the target
/// instance.
pub struct ParseSession<'a> {
    registry: &'a Registry,
    target: &'a mut dyn FieldAccess,
    problems: &'a mut Problems,
    tokens: Vec<String>,
    cursor: usize,
    options_seen: usize,
    arguments_seen: usize,
    still_required: Vec<usize>,
    state: ParseState,
    mode: ParseMode,
    config_file: Option<String>,
    output: Option<String>,
}

impl<'a> ParseSession<'a> {
    pub(crate) fn new(
        registry: &'a Registry,
        target: &'a mut dyn FieldAccess,
        problems: &'a mut Problems,
        tokens: Vec<String>,
        mode: ParseMode,
    ) -> Self {
        ParseSession {
            still_required: registry.required_options().to_vec(),
            registry,
            target,
            problems,
            tokens,
            cursor: 0,
            options_seen: 0,
            arguments_seen: 0,
            state: ParseState::Running,
            mode,
            config_file: None,
            output: None,
        }
    }

    /// The registry being bound against.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// All tokens of this session.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The token at `position`.
    pub fn token(&self, position: usize) -> Option<&str> {
        self.tokens.get(position).map(String::as_str)
    }

    /// The token following the option at `position`.
    pub fn operand(&self, position: usize) -> Option<&str> {
        self.token(position + 1)
    }

    /// Read the current value of a bound field.
    pub fn read(&self, binding: &FieldBinding) -> Option<Value> {
        self.target.get_field(binding.field())
    }

    /// Store a value into a bound field.
    pub fn write(&mut self, binding: &FieldBinding, value: Value) -> Result<(), AccessError> {
        trace!(field = binding.field(), ?value, "writing field");
        self.target.set_field(binding.field(), value)
    }

    /// The diagnostics of this bind.
    pub fn problems(&mut self) -> &mut Problems {
        self.problems
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Options bound so far.
    pub fn options_seen(&self) -> usize {
        self.options_seen
    }

    /// Positional tokens successfully bound so far.
    pub fn arguments_seen(&self) -> usize {
        self.arguments_seen
    }

    /// Record that a config file was named on the command line.
    pub fn set_config_file(&mut self, path: impl Into<String>) {
        self.config_file = Some(path.into());
    }

    pub fn config_file(&self) -> Option<&str> {
        self.config_file.as_deref()
    }

    /// Record text, such as help, to be shown to the user instead of running
    /// the program.
    pub fn set_output(&mut self, output: impl Into<String>) {
        self.output = Some(output.into());
    }

    /// Scan all tokens, then run the completion checks.
    pub(crate) fn run(mut self) -> PassOutcome {
        debug!(mode = ?self.mode, tokens = self.tokens.len(), "binding tokens");
        while self.state == ParseState::Running && self.cursor < self.tokens.len() {
            let position = self.cursor;
            let registry = self.registry;
            trace!(position, token = %self.tokens[position], "scanning token");
            match registry.option_entry(&self.tokens[position]) {
                Some((index, binding, make)) => self.consume_option(index, binding, make),
                None => self.consume_argument(position),
            }
        }
        self.finish();
        PassOutcome {
            state: self.state,
            options_seen: self.options_seen,
            config_file: self.config_file,
            output: self.output,
        }
    }

    fn consume_option(&mut self, index: usize, binding: &FieldBinding, make: OptionHandlerFactory) {
        let position = self.cursor;
        let mut handler = make();
        match handler.consume(self, position, binding) {
            Ok(extra) => self.cursor += 1 + extra,
            Err(err) => {
                debug!(option = binding.name(), %err, "option handler failed");
                self.problems.add_fatal(err.to_string());
                self.cursor += 1;
            }
        }
        self.still_required.retain(|&i| i != index);
        self.options_seen += 1;
        if binding.terminates() || self.problems.has_fatal() {
            self.state = ParseState::Terminated;
        }
    }

    fn consume_argument(&mut self, position: usize) {
        let registry = self.registry;
        let slot = self.arguments_seen.min(registry.positional_count().saturating_sub(1));
        let (binding, make) = match registry.positional_entry(slot) {
            Some(entry) => entry,
            None => {
                self.reject_token(position);
                return;
            }
        };

        let result = if self.arguments_seen >= registry.positional_count()
            && !binding.is_multi_value()
        {
            Err(HandlerError::TooManyValues(binding.field().to_string()))
        } else {
            let mut handler = make();
            handler.consume(self, position, binding)
        };

        match result {
            Ok(()) => {
                self.arguments_seen += 1;
                if binding.terminates() {
                    self.state = ParseState::Terminated;
                }
            }
            Err(err @ HandlerError::TooManyValues(_)) => self.problems.add_fatal(err.to_string()),
            Err(err) => {
                debug!(argument = binding.field(), %err, "argument handler failed");
                self.problems.add_fatal("Invalid arguments or options");
            }
        }
        self.cursor += 1;
    }

    /// A token that is neither an option nor bindable as an argument.
    fn reject_token(&mut self, position: usize) {
        let token = &self.tokens[position];
        self.problems.add_fatal(format!("Invalid option '{}'", token));
        let names: Vec<&str> = self.registry.option_names().collect();
        if let Some(&(closest, score)) = fuzzy_search_best_n(token, &names, 1).first() {
            if score >= SUGGESTION_THRESHOLD {
                self.problems.add_informational(format!("Did you mean '{}'?", closest));
            }
        }
        self.state = ParseState::Failed;
    }

    fn finish(&mut self) {
        if self.state == ParseState::Failed {
            return;
        }
        let registry = self.registry;

        if self.mode == ParseMode::Primary && self.options_seen > 1 && self.config_file.is_some() {
            self.problems
                .add_fatal("No other options can be specified if a config file has been passed");
        }

        if self.state != ParseState::Terminated && !self.still_required.is_empty() {
            for &index in &self.still_required {
                self.problems.add_fatal(format!(
                    "Required option '{}' has not been specified.",
                    registry.binding(index).name()
                ));
            }
            self.problems.add_informational(USE_HELP);
        }

        if self.mode == ParseMode::Primary
            && self.state != ParseState::Terminated
            && !self.problems.has_fatal()
            && self.arguments_seen < registry.mandatory_arguments()
        {
            self.problems.add_fatal("Missing mandatory arguments!");
            for binding in registry.positionals().skip(self.arguments_seen) {
                let info = binding.info();
                if info.required && !info.missing.is_empty() {
                    self.problems.add_informational(info.missing);
                }
            }
        }

        if self.problems.has_fatal() {
            self.state = ParseState::Failed;
        }
        debug!(state = ?self.state, "finished binding tokens");
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{
            handlers::HelpHandler, option_handler, FieldDecl, FieldInfo, FieldType,
            HandlerOverride,
        },
        std::collections::HashMap,
    };

    /// A target storing values by field name.
    #[derive(Default)]
    struct Record(HashMap<String, Value>);

    impl FieldAccess for Record {
        fn get_field(&self, field: &str) -> Option<Value> {
            self.0.get(field).cloned()
        }

        fn set_field(&mut self, field: &str, value: Value) -> Result<(), AccessError> {
            self.0.insert(field.to_string(), value);
            Ok(())
        }
    }

    fn registry() -> Registry {
        Registry::extract(vec![
            FieldDecl::new(FieldInfo::option("count", "-n", FieldType::Integer)),
            FieldDecl::new(FieldInfo::option("verbose", "-v", FieldType::Boolean)),
            FieldDecl::new(FieldInfo::option("help", "--help", FieldType::NoOperand).terminates())
                .with_handler(HandlerOverride::Option(option_handler::<HelpHandler>)),
            FieldDecl::new(
                FieldInfo::argument("file", 0, FieldType::String)
                    .required()
                    .missing("A file is needed"),
            ),
        ])
        .unwrap()
    }

    fn bind(registry: &Registry, args: &[&str]) -> (Record, Problems, PassOutcome) {
        let mut record = Record::default();
        let mut problems = Problems::default();
        let tokens = args.iter().map(|s| s.to_string()).collect();
        let outcome =
            ParseSession::new(registry, &mut record, &mut problems, tokens, ParseMode::Primary)
                .run();
        (record, problems, outcome)
    }

    #[test]
    fn binds_options_and_arguments() {
        let registry = registry();
        let (record, problems, outcome) = bind(&registry, &["-n", "5", "file.txt"]);
        assert_eq!(outcome.state, ParseState::Running);
        assert!(problems.is_empty());
        assert_eq!(outcome.options_seen, 1);
        assert_eq!(record.0.get("count"), Some(&Value::Int(5)));
        assert_eq!(record.0.get("file"), Some(&Value::Str("file.txt".to_string())));
    }

    #[test]
    fn missing_arguments_are_reported_with_their_hint() {
        let registry = registry();
        let (_, problems, outcome) = bind(&registry, &["-n", "5"]);
        assert_eq!(outcome.state, ParseState::Failed);
        let messages: Vec<_> = problems.iter().map(|p| p.message.as_str()).collect();
        assert_eq!(messages, ["Missing mandatory arguments!", "A file is needed"]);
    }

    #[test]
    fn terminating_option_skips_remaining_tokens() {
        let registry = registry();
        let (record, problems, outcome) = bind(&registry, &["--help", "-n", "x"]);
        assert_eq!(outcome.state, ParseState::Terminated);
        assert!(problems.is_empty());
        assert!(outcome.output.is_some());
        assert!(record.0.get("count").is_none());
    }

    #[test]
    fn option_failure_stops_scanning() {
        let registry = registry();
        let (record, problems, outcome) = bind(&registry, &["-n", "five", "-v", "file.txt"]);
        assert_eq!(outcome.state, ParseState::Failed);
        assert_eq!(problems.to_string(), "Missing or invalid value 'five' for option -n");
        assert!(record.0.get("verbose").is_none());
    }

    #[test]
    fn extra_positional_tokens_are_rejected() {
        let registry = registry();
        let (_, problems, outcome) = bind(&registry, &["a.txt", "b.txt"]);
        assert_eq!(outcome.state, ParseState::Failed);
        assert!(problems.contains("Too many values for argument 'file'"));
    }

    #[test]
    fn terminating_argument_skips_remaining_tokens() {
        let registry = Registry::extract(vec![
            FieldDecl::new(FieldInfo::option("count", "-n", FieldType::Integer).required()),
            FieldDecl::new(FieldInfo::argument("first", 0, FieldType::String).terminates()),
        ])
        .unwrap();
        let (record, problems, outcome) = bind(&registry, &["a", "-n", "x"]);
        assert_eq!(outcome.state, ParseState::Terminated);
        assert!(problems.is_empty());
        assert_eq!(record.0.get("first"), Some(&Value::Str("a".to_string())));
        assert!(record.0.get("count").is_none());
    }

    #[test]
    fn unknown_token_without_arguments_is_an_invalid_option() {
        let registry = Registry::extract(vec![FieldDecl::new(FieldInfo::option(
            "verbose",
            "--verbose",
            FieldType::Boolean,
        ))])
        .unwrap();
        let (_, problems, outcome) = bind(&registry, &["--verbos", "--verbose"]);
        assert_eq!(outcome.state, ParseState::Failed);
        let messages: Vec<_> = problems.iter().map(|p| p.message.as_str()).collect();
        assert_eq!(messages, ["Invalid option '--verbos'", "Did you mean '--verbose'?"]);
        assert_eq!(outcome.options_seen, 0);
    }
}
