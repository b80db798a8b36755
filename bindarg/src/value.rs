// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use {crate::FieldType, std::path::PathBuf, thiserror::Error};

/// A dynamically typed field value, as exchanged between handlers and a
/// [`FieldAccess`] implementation.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A string.
    Str(String),
    /// A boolean.
    Bool(bool),
    /// A 32-bit integer.
    Int(i32),
    /// A 64-bit integer.
    Long(i64),
    /// A 32-bit float.
    Float(f32),
    /// A 64-bit float.
    Double(f64),
    /// The name of an enum variant.
    Enum(String),
    /// A sequence of strings.
    List(Vec<String>),
    /// The value of a [`NoOperand`] field.
    NoOperand,
}

impl Value {
    /// A short name for the kind of value, used in diagnostics.
    pub fn type_label(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
            Value::NoOperand => "no-operand",
        }
    }
}

/// Marker type for options that never take an operand, such as `--help`.
///
/// Fields of this type must be declared with `terminates`, unless they name
/// their own `handler(...)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoOperand;

/// Types which can be stored in a bound field.
///
/// `FIELD_TYPE` decides which handler is inferred for the field. Unit enums
/// implement this trait through `#[derive(BindEnum)]`. Other types may
/// implement it with [`FieldType::Other`], in which case the field needs an
/// explicit `handler(...)`.
pub trait BindValue: Sized {
    /// The semantic type of fields of this type.
    const FIELD_TYPE: FieldType<'static>;

    /// Read the current value, or `None` if unset.
    fn to_value(&self) -> Option<Value>;

    /// Convert a value written by a handler, returning an error string on failure.
    fn from_value(value: Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, found: &Value) -> String {
    ["expected ", expected, ", found ", found.type_label()].concat()
}

macro_rules! impl_bind_value {
    ($($ty:ty => $variant:ident, $field_type:ident;)*) => {
        $(
            impl BindValue for $ty {
                const FIELD_TYPE: FieldType<'static> = FieldType::$field_type;

                fn to_value(&self) -> Option<Value> {
                    Some(Value::$variant(self.clone()))
                }

                fn from_value(value: Value) -> Result<Self, String> {
                    match value {
                        Value::$variant(inner) => Ok(inner),
                        other => Err(mismatch(Self::FIELD_TYPE.label(), &other)),
                    }
                }
            }
        )*
    }
}

impl_bind_value! {
    String => Str, String;
    bool => Bool, Boolean;
    i32 => Int, Integer;
    i64 => Long, Long;
    f32 => Float, Float;
    f64 => Double, Double;
    Vec<String> => List, List;
}

impl BindValue for NoOperand {
    const FIELD_TYPE: FieldType<'static> = FieldType::NoOperand;

    fn to_value(&self) -> Option<Value> {
        Some(Value::NoOperand)
    }

    fn from_value(_value: Value) -> Result<Self, String> {
        Ok(NoOperand)
    }
}

impl BindValue for PathBuf {
    const FIELD_TYPE: FieldType<'static> = FieldType::Other("PathBuf");

    fn to_value(&self) -> Option<Value> {
        Some(Value::Str(self.to_string_lossy().into_owned()))
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Str(path) => Ok(PathBuf::from(path)),
            other => Err(mismatch("path", &other)),
        }
    }
}

impl<T: BindValue> BindValue for Option<T> {
    const FIELD_TYPE: FieldType<'static> = T::FIELD_TYPE;

    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(T::to_value)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        T::from_value(value).map(Some)
    }
}

/// Errors reported by a [`FieldAccess`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The instance has no bound field with this identifier.
    #[error("no field named '{0}'")]
    UnknownField(String),
    /// The value could not be stored in the field.
    #[error("cannot set field '{field}': {message}")]
    Conversion {
        /// The field identifier.
        field: String,
        /// Why the conversion failed.
        message: String,
    },
}

/// Reads and writes the bound fields of an instance by field identifier.
///
/// Implemented by `#[derive(Bind)]`.
pub trait FieldAccess {
    /// The current value of `field`, or `None` when it is unset or unknown.
    fn get_field(&self, field: &str) -> Option<Value>;

    /// Store `value` into `field`.
    fn set_field(&mut self, field: &str, value: Value) -> Result<(), AccessError>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scalars_round_trip_through_values() {
        assert_eq!(i32::from_value(Value::Int(5)), Ok(5));
        assert_eq!(5i64.to_value(), Some(Value::Long(5)));
        assert_eq!(
            i32::from_value(Value::Str("5".to_string())),
            Err("expected integer, found string".to_string())
        );
    }

    #[test]
    fn option_wraps_inner_type() {
        assert_eq!(<Option<String> as BindValue>::FIELD_TYPE, FieldType::String);
        assert_eq!(None::<String>.to_value(), None);
        assert_eq!(
            Option::<String>::from_value(Value::Str("x".to_string())),
            Ok(Some("x".to_string()))
        );
    }

    #[test]
    fn paths_need_a_handler() {
        assert_eq!(PathBuf::FIELD_TYPE, FieldType::Other("PathBuf"));
        assert_eq!(
            PathBuf::from_value(Value::Str("/tmp/a".to_string())),
            Ok(PathBuf::from("/tmp/a"))
        );
    }
}
