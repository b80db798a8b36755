// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Config file overlay.
//!
//! A config file is a flat JSON object. Every key matching a field's config
//! key is turned back into command line tokens, which are then bound like
//! user input.

use {
    crate::{schema::Registry, FieldKind},
    serde_json::Value as Json,
    std::{fs, path::Path},
    thiserror::Error,
    tracing::debug,
};

/// The parsed contents of a config file.
pub type ConfigMap = serde_json::Map<String, Json>;

/// Separator joining the elements of an array value into one operand.
pub const ARRAY_SEPARATOR: &str = ";";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("the config file must hold a JSON object")]
    NotAnObject,
    #[error(
        "the key '{0}' belongs to a positional argument, which cannot be set from a config file"
    )]
    PositionalKey(String),
    #[error("the value of key '{key}' is {found}, which cannot be used as an option value")]
    UnsupportedValue { key: String, found: &'static str },
}

/// Somewhere config maps can be loaded from.
pub trait ConfigSource {
    fn load(&self, path: &Path) -> Result<ConfigMap, ConfigError>;
}

/// Reads config files as JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonFile;

impl ConfigSource for JsonFile {
    fn load(&self, path: &Path) -> Result<ConfigMap, ConfigError> {
        let text = fs::read_to_string(path)?;
        match serde_json::from_str(&text)? {
            Json::Object(map) => Ok(map),
            _ => Err(ConfigError::NotAnObject),
        }
    }
}

/// Turn the keys of `config` that match a config key into option tokens.
///
/// Each matching key yields the option name, followed by the stringified
/// value unless it is null or empty. Keys matching no field are ignored.
pub fn synthesize_tokens(
    registry: &Registry,
    config: &ConfigMap,
) -> Result<Vec<String>, ConfigError> {
    let mut tokens = Vec::new();
    for (key, value) in config {
        let binding = match registry.config_binding(key) {
            Some(binding) => binding,
            None => {
                debug!(key = %key, "ignoring unknown config key");
                continue;
            }
        };
        if binding.kind() == FieldKind::Argument {
            return Err(ConfigError::PositionalKey(key.clone()));
        }
        tokens.push(binding.name().to_string());
        if let Some(operand) = operand(key, value)? {
            if !operand.is_empty() {
                tokens.push(operand);
            }
        }
    }
    Ok(tokens)
}

fn operand(key: &str, value: &Json) -> Result<Option<String>, ConfigError> {
    match value {
        Json::Null => Ok(None),
        Json::Array(items) => {
            let items =
                items.iter().map(|item| scalar(key, item)).collect::<Result<Vec<_>, _>>()?;
            Ok(Some(items.join(ARRAY_SEPARATOR)))
        }
        _ => scalar(key, value).map(Some),
    }
}

fn scalar(key: &str, value: &Json) -> Result<String, ConfigError> {
    let found = match value {
        Json::Bool(b) => return Ok(b.to_string()),
        Json::Number(n) => return Ok(n.to_string()),
        Json::String(s) => return Ok(s.clone()),
        Json::Null => "null",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    };
    Err(ConfigError::UnsupportedValue { key: key.to_string(), found })
}
