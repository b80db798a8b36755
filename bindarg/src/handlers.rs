// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Handlers bind the tokens of one option or positional argument.
//!
//! A fresh handler is created for every occurrence, so handlers may keep
//! per-occurrence state.

use {
    crate::{help, parse::ParseSession, schema::FieldBinding, AccessError, FieldType, Value},
    std::{marker::PhantomData, str::FromStr},
    thiserror::Error,
};

/// Separator used by [`SeparatedListHandler`] when the field declares none.
pub const DEFAULT_LIST_SEPARATOR: &str = ";";

/// Why a handler could not bind its tokens. The display text is shown to
/// the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The option needs an operand but none follows it.
    #[error("Missing the value for option '{0}'")]
    MissingOperand(String),
    /// The operand could not be converted.
    #[error("Missing or invalid value '{value}' for option {option}")]
    InvalidValue { value: String, option: String },
    /// The operand names no variant of the enum.
    #[error("Unknown value '{value}' for option {option}\nValid values are: {}", .legal.join(", "))]
    UnknownVariant { value: String, option: String, legal: Vec<String> },
    /// All positional arguments have been bound already.
    #[error("Too many values for argument '{0}'")]
    TooManyValues(String),
    /// The default argument handler cannot bind this type.
    #[error("No default handling for argument '{field}' of type {field_type}")]
    UnsupportedType { field: String, field_type: String },
    /// Writing to the field failed.
    #[error(transparent)]
    Access(#[from] AccessError),
    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

/// Binds an option found at `position` in the token list.
pub trait OptionHandler {
    /// Bind the option, returning how many tokens after `position` were
    /// consumed as its operand.
    fn consume(
        &mut self,
        session: &mut ParseSession<'_>,
        position: usize,
        binding: &FieldBinding,
    ) -> Result<usize, HandlerError>;
}

/// Binds the positional token at `position`.
pub trait ArgumentHandler {
    fn consume(
        &mut self,
        session: &mut ParseSession<'_>,
        position: usize,
        binding: &FieldBinding,
    ) -> Result<(), HandlerError>;
}

/// Whether an option handler insists on an operand.
///
/// `handler(...)` builds handlers with `Default`, which selects
/// `Mandatory`. A field with an optional operand names its own handler type
/// whose `Default` picks `Optional`:
///
/// ```rust
/// use bindarg::{FieldBinding, HandlerError, OperandPolicy, OptionHandler, ParseSession};
///
/// struct OptionalString(bindarg::StringHandler);
///
/// impl Default for OptionalString {
///     fn default() -> Self {
///         OptionalString(bindarg::StringHandler { policy: OperandPolicy::Optional })
///     }
/// }
///
/// impl OptionHandler for OptionalString {
///     fn consume(
///         &mut self,
///         session: &mut ParseSession<'_>,
///         position: usize,
///         binding: &FieldBinding,
///     ) -> Result<usize, HandlerError> {
///         self.0.consume(session, position, binding)
///     }
/// }
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OperandPolicy {
    /// A missing operand is an error.
    #[default]
    Mandatory,
    /// A missing operand leaves the field untouched.
    Optional,
}

impl OperandPolicy {
    /// The operand following `position`, or `None` when it is missing and
    /// optional.
    fn operand(
        self,
        session: &ParseSession<'_>,
        position: usize,
        binding: &FieldBinding,
    ) -> Result<Option<String>, HandlerError> {
        match (session.operand(position), self) {
            (Some(operand), _) => Ok(Some(operand.to_string())),
            (None, OperandPolicy::Optional) => Ok(None),
            (None, OperandPolicy::Mandatory) => {
                Err(HandlerError::MissingOperand(binding.name().to_string()))
            }
        }
    }
}

/// Binds the operand as a string.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringHandler {
    pub policy: OperandPolicy,
}

impl OptionHandler for StringHandler {
    fn consume(
        &mut self,
        session: &mut ParseSession<'_>,
        position: usize,
        binding: &FieldBinding,
    ) -> Result<usize, HandlerError> {
        match self.policy.operand(session, position, binding)? {
            Some(operand) => {
                session.write(binding, Value::Str(operand))?;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

/// Sets the field to true, unless the next token is `true` or `false`, in
/// which case that token is consumed and used.
#[derive(Clone, Copy, Debug, Default)]
pub struct BooleanHandler;

impl OptionHandler for BooleanHandler {
    fn consume(
        &mut self,
        session: &mut ParseSession<'_>,
        position: usize,
        binding: &FieldBinding,
    ) -> Result<usize, HandlerError> {
        let explicit = session.operand(position).and_then(|operand| {
            if operand.eq_ignore_ascii_case("true") {
                Some(true)
            } else if operand.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        });
        let (value, consumed) = match explicit {
            Some(value) => (value, 1),
            None => (true, 0),
        };
        session.write(binding, Value::Bool(value))?;
        Ok(consumed)
    }
}

/// Numeric types with a built-in handler.
pub trait Numeric: FromStr {
    fn into_value(self) -> Value;
}

impl Numeric for i32 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl Numeric for i64 {
    fn into_value(self) -> Value {
        Value::Long(self)
    }
}

impl Numeric for f32 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl Numeric for f64 {
    fn into_value(self) -> Value {
        Value::Double(self)
    }
}

/// Parses the operand as a number.
#[derive(Debug)]
pub struct NumericHandler<T> {
    pub policy: OperandPolicy,
    _number: PhantomData<fn() -> T>,
}

impl<T> Default for NumericHandler<T> {
    fn default() -> Self {
        NumericHandler { policy: OperandPolicy::default(), _number: PhantomData }
    }
}

pub type IntegerHandler = NumericHandler<i32>;
pub type LongHandler = NumericHandler<i64>;
pub type FloatHandler = NumericHandler<f32>;
pub type DoubleHandler = NumericHandler<f64>;

impl<T: Numeric> OptionHandler for NumericHandler<T> {
    fn consume(
        &mut self,
        session: &mut ParseSession<'_>,
        position: usize,
        binding: &FieldBinding,
    ) -> Result<usize, HandlerError> {
        let operand = match self.policy.operand(session, position, binding)? {
            Some(operand) => operand,
            None => return Ok(0),
        };
        let number = operand.trim().parse::<T>().map_err(|_| HandlerError::InvalidValue {
            value: operand.clone(),
            option: binding.name().to_string(),
        })?;
        session.write(binding, number.into_value())?;
        Ok(1)
    }
}

/// Matches the operand against the variant names of an enum field, exactly
/// first and then ignoring ASCII case.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnumHandler {
    pub policy: OperandPolicy,
}

impl OptionHandler for EnumHandler {
    fn consume(
        &mut self,
        session: &mut ParseSession<'_>,
        position: usize,
        binding: &FieldBinding,
    ) -> Result<usize, HandlerError> {
        let legal: &[&str] = match binding.info().field_type {
            FieldType::Enum(values) => values,
            _ => &[],
        };
        let operand = match self.policy.operand(session, position, binding)? {
            Some(operand) => operand,
            None => return Ok(0),
        };
        let variant = legal
            .iter()
            .find(|name| **name == operand)
            .or_else(|| legal.iter().find(|name| name.eq_ignore_ascii_case(&operand)));
        match variant {
            Some(name) => {
                session.write(binding, Value::Enum(name.to_string()))?;
                Ok(1)
            }
            None => Err(HandlerError::UnknownVariant {
                value: operand,
                option: binding.name().to_string(),
                legal: legal.iter().map(|name| name.to_string()).collect(),
            }),
        }
    }
}

/// Consumes nothing. Used by terminating options whose effect is the
/// termination itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOperandHandler;

impl OptionHandler for NoOperandHandler {
    fn consume(
        &mut self,
        _session: &mut ParseSession<'_>,
        _position: usize,
        _binding: &FieldBinding,
    ) -> Result<usize, HandlerError> {
        Ok(0)
    }
}

/// Splits the operand on the field's separator, or on
/// [`DEFAULT_LIST_SEPARATOR`], and stores the non-empty pieces as a list.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeparatedListHandler {
    pub policy: OperandPolicy,
}

impl OptionHandler for SeparatedListHandler {
    fn consume(
        &mut self,
        session: &mut ParseSession<'_>,
        position: usize,
        binding: &FieldBinding,
    ) -> Result<usize, HandlerError> {
        let operand = match self.policy.operand(session, position, binding)? {
            Some(operand) => operand,
            None => return Ok(0),
        };
        let separator = match binding.info().separator {
            "" => DEFAULT_LIST_SEPARATOR,
            separator => separator,
        };
        let items = operand
            .split(separator)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        session.write(binding, Value::List(items))?;
        Ok(1)
    }
}

/// Binds the operand as a string and records that a config file was named.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfigFileHandler;

impl OptionHandler for ConfigFileHandler {
    fn consume(
        &mut self,
        session: &mut ParseSession<'_>,
        position: usize,
        binding: &FieldBinding,
    ) -> Result<usize, HandlerError> {
        let path = OperandPolicy::Mandatory
            .operand(session, position, binding)?
            .unwrap_or_default();
        session.write(binding, Value::Str(path.clone()))?;
        session.set_config_file(path);
        Ok(1)
    }
}

/// Renders the help text of the registry. Declare it on a terminating
/// [`NoOperand`](crate::NoOperand) option.
#[derive(Clone, Copy, Debug, Default)]
pub struct HelpHandler;

impl OptionHandler for HelpHandler {
    fn consume(
        &mut self,
        session: &mut ParseSession<'_>,
        _position: usize,
        _binding: &FieldBinding,
    ) -> Result<usize, HandlerError> {
        let text = help::render(session.registry());
        session.set_output(text);
        Ok(0)
    }
}

/// Binds positional tokens. Strings are overwritten, lists are appended to
/// and then keep absorbing the remaining positional tokens.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultArgumentHandler;

impl ArgumentHandler for DefaultArgumentHandler {
    fn consume(
        &mut self,
        session: &mut ParseSession<'_>,
        position: usize,
        binding: &FieldBinding,
    ) -> Result<(), HandlerError> {
        let token = session.token(position).unwrap_or_default().to_string();
        match binding.info().field_type {
            FieldType::String => session.write(binding, Value::Str(token))?,
            FieldType::List => {
                let mut values = match session.read(binding) {
                    Some(Value::List(values)) => values,
                    _ => Vec::new(),
                };
                values.push(token);
                session.write(binding, Value::List(values))?;
                binding.mark_multi_value();
            }
            other => {
                return Err(HandlerError::UnsupportedType {
                    field: binding.field().to_string(),
                    field_type: other.label().to_string(),
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{
            parse::{ParseMode, ParseState},
            problems::Problems,
            schema::Registry,
            FieldAccess, FieldDecl, FieldInfo,
        },
        std::collections::HashMap,
    };

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

    /// Run `handler` on a single option declared by `info`, at position 0 of
    /// `tokens`.
    fn run_option(
        handler: &mut dyn OptionHandler,
        info: FieldInfo<'static>,
        tokens: &[&str],
    ) -> (Result<usize, HandlerError>, Record) {
        let registry = Registry::extract(vec![FieldDecl::new(info)]).unwrap();
        let binding = registry.binding(0);
        let mut record = Record::default();
        let mut problems = Problems::default();
        let tokens = tokens.iter().map(|s| s.to_string()).collect();
        let mut session =
            ParseSession::new(&registry, &mut record, &mut problems, tokens, ParseMode::Primary);
        let result = handler.consume(&mut session, 0, binding);
        drop(session);
        (result, record)
    }

    #[test]
    fn string_requires_an_operand() {
        let info = FieldInfo::option("name", "--name", FieldType::String);
        let (result, record) = run_option(&mut StringHandler::default(), info, &["--name", "x"]);
        assert_eq!(result, Ok(1));
        assert_eq!(record.0["name"], Value::Str("x".to_string()));

        let (result, _) = run_option(&mut StringHandler::default(), info, &["--name"]);
        assert_eq!(result, Err(HandlerError::MissingOperand("--name".to_string())));
        assert_eq!(result.unwrap_err().to_string(), "Missing the value for option '--name'");
    }

    #[test]
    fn optional_operand_leaves_field_untouched() {
        let info = FieldInfo::option("name", "--name", FieldType::String);
        let mut handler = StringHandler { policy: OperandPolicy::Optional };
        let (result, record) = run_option(&mut handler, info, &["--name"]);
        assert_eq!(result, Ok(0));
        assert!(record.0.is_empty());
    }

    #[test]
    fn boolean_consumes_explicit_values_only() {
        let info = FieldInfo::option("verbose", "-v", FieldType::Boolean);
        let (result, record) = run_option(&mut BooleanHandler, info, &["-v", "FALSE"]);
        assert_eq!(result, Ok(1));
        assert_eq!(record.0["verbose"], Value::Bool(false));

        let (result, record) = run_option(&mut BooleanHandler, info, &["-v", "file.txt"]);
        assert_eq!(result, Ok(0));
        assert_eq!(record.0["verbose"], Value::Bool(true));
    }

    #[test]
    fn numbers_are_parsed_per_type() {
        let info = FieldInfo::option("ratio", "-r", FieldType::Double);
        let (result, record) = run_option(&mut DoubleHandler::default(), info, &["-r", "0.25"]);
        assert_eq!(result, Ok(1));
        assert_eq!(record.0["ratio"], Value::Double(0.25));

        let info = FieldInfo::option("count", "-n", FieldType::Long);
        let (result, record) = run_option(&mut LongHandler::default(), info, &["-n", "1.5"]);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Missing or invalid value '1.5' for option -n"
        );
        assert!(!record.0.contains_key("count"));
    }

    #[test]
    fn enum_lists_valid_values() {
        let info = FieldInfo::option("color", "--color", FieldType::Enum(&["RED", "GREEN"]));
        let (result, record) = run_option(&mut EnumHandler::default(), info, &["--color", "green"]);
        assert_eq!(result, Ok(1));
        assert_eq!(record.0["color"], Value::Enum("GREEN".to_string()));

        let (result, record) =
            run_option(&mut EnumHandler::default(), info, &["--color", "blue"]);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Unknown value 'blue' for option --color\nValid values are: RED, GREEN"
        );
        assert!(!record.0.contains_key("color"));
    }

    #[test]
    fn separated_list_uses_default_separator() {
        let info = FieldInfo::option("tags", "--tags", FieldType::List);
        let decl = FieldDecl::new(info).with_handler(crate::HandlerOverride::Option(
            crate::option_handler::<SeparatedListHandler>,
        ));
        let registry = Registry::extract(vec![decl]).unwrap();
        let mut record = Record::default();
        let mut problems = Problems::default();
        let tokens = vec!["--tags".to_string(), "a;b;;c".to_string()];
        let outcome =
            ParseSession::new(&registry, &mut record, &mut problems, tokens, ParseMode::Primary)
                .run();
        assert_eq!(outcome.state, ParseState::Running);
        assert_eq!(
            record.0["tags"],
            Value::List(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn default_argument_rejects_other_types() {
        let registry = Registry::extract(vec![FieldDecl::new(FieldInfo::argument(
            "count",
            0,
            FieldType::Integer,
        ))])
        .unwrap();
        let mut record = Record::default();
        let mut problems = Problems::default();
        let tokens = vec!["5".to_string()];
        let mut session =
            ParseSession::new(&registry, &mut record, &mut problems, tokens, ParseMode::Primary);
        let result = DefaultArgumentHandler.consume(&mut session, 0, registry.binding(0));
        assert_eq!(
            result,
            Err(HandlerError::UnsupportedType {
                field: "count".to_string(),
                field_type: "integer".to_string(),
            })
        );
    }
}
