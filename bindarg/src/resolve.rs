// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Maps a field declaration to the handler that binds it.

use crate::{
    argument_handler,
    handlers::{
        BooleanHandler, DefaultArgumentHandler, DoubleHandler, EnumHandler, FloatHandler,
        IntegerHandler, LongHandler, NoOperandHandler, StringHandler,
    },
    option_handler,
    schema::{ArgumentHandlerFactory, HandlerOverride, OptionHandlerFactory, SchemaError},
    FieldInfo, FieldType,
};

/// Resolve the handler for an option field.
///
/// An explicit override wins. Otherwise the handler follows from the field
/// type, and types without a built-in handler are an error. An inferred
/// no-operand handler is only valid on a terminating option.
pub fn for_option(
    info: &FieldInfo<'static>,
    handler: HandlerOverride,
) -> Result<OptionHandlerFactory, SchemaError> {
    match handler {
        HandlerOverride::Option(make) => return Ok(make),
        HandlerOverride::Argument(_) => return Err(SchemaError::HandlerKindMismatch(info.field)),
        HandlerOverride::Infer => {}
    }
    let make: OptionHandlerFactory = match info.field_type {
        FieldType::String => option_handler::<StringHandler>,
        FieldType::Boolean => option_handler::<BooleanHandler>,
        FieldType::Integer => option_handler::<IntegerHandler>,
        FieldType::Long => option_handler::<LongHandler>,
        FieldType::Float => option_handler::<FloatHandler>,
        FieldType::Double => option_handler::<DoubleHandler>,
        FieldType::Enum(_) => option_handler::<EnumHandler>,
        FieldType::NoOperand if info.terminates => option_handler::<NoOperandHandler>,
        FieldType::NoOperand => return Err(SchemaError::NoOperandWithoutTerminate(info.name)),
        FieldType::List | FieldType::Other(_) => {
            return Err(SchemaError::NoHandler {
                name: info.name,
                field_type: info.field_type.label(),
            })
        }
    };
    Ok(make)
}

/// Resolve the handler for a positional argument field.
///
/// Every argument without an override uses [`DefaultArgumentHandler`], which
/// rejects unsupported types when it is asked to bind a token.
pub fn for_argument(
    info: &FieldInfo<'static>,
    handler: HandlerOverride,
) -> Result<ArgumentHandlerFactory, SchemaError> {
    match handler {
        HandlerOverride::Argument(make) => Ok(make),
        HandlerOverride::Option(_) => Err(SchemaError::HandlerKindMismatch(info.field)),
        HandlerOverride::Infer => Ok(argument_handler::<DefaultArgumentHandler>),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_operand_options_must_terminate() {
        let info = FieldInfo::option("help", "--help", FieldType::NoOperand);
        assert_eq!(
            for_option(&info, HandlerOverride::Infer).unwrap_err(),
            SchemaError::NoOperandWithoutTerminate("--help")
        );
        assert!(for_option(&info.terminates(), HandlerOverride::Infer).is_ok());
    }

    #[test]
    fn explicit_handler_on_no_operand_need_not_terminate() {
        let info = FieldInfo::option("touch", "--touch", FieldType::NoOperand);
        let explicit = HandlerOverride::Option(option_handler::<NoOperandHandler>);
        assert!(for_option(&info, explicit).is_ok());
    }

    #[test]
    fn other_types_need_an_explicit_handler() {
        let info = FieldInfo::option("path", "--path", FieldType::Other("PathBuf"));
        assert_eq!(
            for_option(&info, HandlerOverride::Infer).unwrap_err(),
            SchemaError::NoHandler { name: "--path", field_type: "PathBuf" }
        );
        let explicit = HandlerOverride::Option(option_handler::<StringHandler>);
        assert!(for_option(&info, explicit).is_ok());
    }

    #[test]
    fn lists_need_an_explicit_handler_as_options() {
        let info = FieldInfo::option("tags", "--tags", FieldType::List);
        assert!(matches!(
            for_option(&info, HandlerOverride::Infer),
            Err(SchemaError::NoHandler { name: "--tags", .. })
        ));
    }

    #[test]
    fn arguments_always_resolve() {
        let info = FieldInfo::argument("input", 0, FieldType::Other("PathBuf"));
        assert!(for_argument(&info, HandlerOverride::Infer).is_ok());
    }
}
