//! Legacy configuration parsing and conversion to the new config source.
//!
//! The transformer is total over any JSON object: keys it does not
//! understand are copied through to the general options of the new config.

pub mod js;
pub mod transform;

pub use transform::{ConfigEntry, ConfigSection, EntryValue, TransformOptions, TransformedConfig};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_INTEGRATION_FOLDER: &str = "cypress/integration";
pub const DEFAULT_COMPONENT_FOLDER: &str = "cypress/component";
pub const DEFAULT_PLUGINS_FILE: &str = "cypress/plugins/index.js";

/// Legacy config text is not a well-formed JSON object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Parse error: legacy config is not a well-formed object at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Parsed legacy configuration: option name to value, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegacyConfig {
    options: Map<String, Value>,
}

impl LegacyConfig {
    #[must_use]
    pub fn from_map(options: Map<String, Value>) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.options.insert(key.into(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.options.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Integration folder, or the default when the key is absent.
    #[must_use]
    pub fn integration_folder(&self) -> String {
        folder_value(self.get("integrationFolder"), DEFAULT_INTEGRATION_FOLDER)
    }

    /// Component folder, or the default when the key is absent.
    #[must_use]
    pub fn component_folder(&self) -> String {
        folder_value(self.get("componentFolder"), DEFAULT_COMPONENT_FOLDER)
    }

    /// `testFiles` narrows the legacy match-everything default.
    #[must_use]
    pub fn custom_test_files(&self) -> bool {
        match self.get("testFiles") {
            Some(Value::String(glob)) => glob != transform::LEGACY_DEFAULT_TEST_FILES,
            Some(Value::Array(_)) => true,
            _ => false,
        }
    }

    /// `componentFolder: false` turned component testing off.
    #[must_use]
    pub fn component_testing_enabled(&self) -> bool {
        !matches!(self.get("componentFolder"), Some(Value::Bool(false)))
    }
}

fn folder_value(value: Option<&Value>, default: &str) -> String {
    match value {
        None => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Parse the raw text of a legacy config file.
pub fn parse_legacy(raw: &str) -> Result<LegacyConfig, ParseError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ParseError {
        message: e.to_string(),
        line: e.line(),
        column: e.column(),
    })?;

    match value {
        Value::Object(options) => Ok(LegacyConfig { options }),
        other => Err(ParseError {
            message: format!("expected an object, found {}", json_kind(&other)),
            line: 1,
            column: 1,
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[must_use]
pub fn get_integration_folder(cfg: &LegacyConfig) -> String {
    cfg.integration_folder()
}

#[must_use]
pub fn get_component_folder(cfg: &LegacyConfig) -> String {
    cfg.component_folder()
}

/// Canonical pretty-printed legacy source, keys in file order.
#[must_use]
pub fn render_before_text(cfg: &LegacyConfig) -> String {
    format!("{:#}\n", Value::Object(cfg.options.clone()))
}

/// New config source for `cfg`, assuming no default plugins file on disk.
#[must_use]
pub fn render_after_text(cfg: &LegacyConfig) -> String {
    render_after_text_with(cfg, &TransformOptions::default())
}

#[must_use]
pub fn render_after_text_with(cfg: &LegacyConfig, opts: &TransformOptions) -> String {
    TransformedConfig::from_legacy(cfg, opts).render()
}
