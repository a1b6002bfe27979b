//! Structured form of the new configuration, with per-entry provenance.
//!
//! Every entry records the legacy keys it was derived from, so the set of
//! legacy keys represented in the output can always be recovered and compared
//! against the input.

use super::js::{self, indent, property_key, quote};
use super::{DEFAULT_INTEGRATION_FOLDER, DEFAULT_PLUGINS_FILE, LegacyConfig};
use crate::services::pattern::{NEW_E2E_FOLDER, normalize_folder};
use serde_json::Value;
use std::collections::BTreeSet;

/// Test file glob the legacy format used when `testFiles` was not set.
pub const LEGACY_DEFAULT_TEST_FILES: &str = "**/*.*";

/// Spec glob appended to a folder in the new format.
pub const NEW_SPEC_GLOB: &str = "**/*.cy.{js,jsx,ts,tsx}";

/// Legacy keys that are not copied through as general options.
const RECOGNIZED_KEYS: &[&str] = &[
    "integrationFolder",
    "componentFolder",
    "testFiles",
    "ignoreTestFiles",
    "pluginsFile",
    "supportFile",
    "baseUrl",
    "e2e",
    "component",
];

/// Facts about the project the pure transformer cannot look up itself
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOptions {
    /// `cypress/plugins/index.js` exists, so an absent `pluginsFile` still
    /// needs to be wired into `setupNodeEvents`.
    pub default_plugins_file_present: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    Json(Value),
    /// `setupNodeEvents` requiring the given plugins file; `None` renders an
    /// empty handler.
    NodeEvents(Option<String>),
    /// A comment line carrying a legacy value with no place in the section.
    Note(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: EntryValue,
    /// Legacy keys this entry was derived from.
    pub origin: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSection {
    entries: Vec<ConfigEntry>,
}

impl ConfigSection {
    /// Insert or replace `key`. A replaced entry keeps its position and its
    /// origins are merged.
    pub fn set(&mut self, key: &str, value: EntryValue, origin: &[&str]) {
        let origin: Vec<String> = origin.iter().map(|s| (*s).to_string()).collect();
        if let Some(existing) = self.entries.iter_mut().find(|e| e.key == key) {
            existing.value = value;
            for o in origin {
                if !existing.origin.contains(&o) {
                    existing.origin.push(o);
                }
            }
        } else {
            self.entries.push(ConfigEntry {
                key: key.to_string(),
                value,
                origin,
            });
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigEntry> {
        let idx = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(idx))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    #[must_use]
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write(&self, out: &mut String, level: usize) {
        for entry in &self.entries {
            match &entry.value {
                EntryValue::Json(value) => {
                    out.push_str(&indent(level));
                    out.push_str(&property_key(&entry.key));
                    out.push_str(": ");
                    js::write_value(out, value, level);
                    out.push_str(",\n");
                }
                EntryValue::NodeEvents(plugins) => write_node_events(out, plugins.as_deref(), level),
                EntryValue::Note(text) => {
                    out.push_str(&indent(level));
                    out.push_str("// ");
                    out.push_str(text);
                    out.push('\n');
                }
            }
        }
    }
}

fn write_node_events(out: &mut String, plugins: Option<&str>, level: usize) {
    let pad = indent(level);
    match plugins {
        Some(path) => {
            out.push_str(&format!(
                "{pad}// We've imported your old plugins here.\n\
                 {pad}// You may want to clean this up later by importing these.\n"
            ));
            out.push_str(&format!("{pad}setupNodeEvents(on, config) {{\n"));
            out.push_str(&format!(
                "{}return require({})(on, config)\n",
                indent(level + 1),
                quote(&require_path(path))
            ));
            out.push_str(&format!("{pad}}},\n"));
        }
        None => out.push_str(&format!("{pad}setupNodeEvents(on, config) {{}},\n")),
    }
}

fn require_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    if path.starts_with("./") || path.starts_with("../") || path.starts_with('/') {
        path
    } else {
        format!("./{path}")
    }
}

/// New-format configuration split into general and per-mode sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformedConfig {
    pub general: ConfigSection,
    pub e2e: ConfigSection,
    pub component: ConfigSection,
}

impl TransformedConfig {
    #[must_use]
    pub fn from_legacy(cfg: &LegacyConfig, opts: &TransformOptions) -> Self {
        let mut out = Self::default();

        for (key, value) in cfg.iter() {
            if !is_restructured(key, value) {
                let value = if key == "browsers" {
                    normalize_browsers(value)
                } else {
                    value.clone()
                };
                out.general.set(key, EntryValue::Json(value), &[key.as_str()]);
            }
        }

        let component_enabled = uses_component_testing(cfg);

        // setupNodeEvents
        match cfg.get("pluginsFile") {
            Some(Value::String(path)) => {
                let events = EntryValue::NodeEvents(Some(path.clone()));
                out.e2e.set("setupNodeEvents", events.clone(), &["pluginsFile"]);
                if component_enabled {
                    out.component.set("setupNodeEvents", events, &["pluginsFile"]);
                }
            }
            Some(Value::Bool(false)) => {
                out.e2e
                    .set("setupNodeEvents", EntryValue::NodeEvents(None), &["pluginsFile"]);
            }
            Some(_) => {}
            None if opts.default_plugins_file_present => {
                let events = EntryValue::NodeEvents(Some(DEFAULT_PLUGINS_FILE.to_string()));
                out.e2e.set("setupNodeEvents", events.clone(), &[]);
                if component_enabled {
                    out.component.set("setupNodeEvents", events, &[]);
                }
            }
            None => {}
        }

        if let Some(base_url) = cfg.get("baseUrl") {
            out.e2e
                .set("baseUrl", EntryValue::Json(base_url.clone()), &["baseUrl"]);
        }

        // Custom testFiles keep spec names, so the specs stay put as well.
        let keep_names = cfg.custom_test_files();
        let test_files = cfg.get("testFiles");
        if let Some(Value::String(folder)) = cfg.get("integrationFolder") {
            let folder = if keep_names {
                normalize_folder(folder)
            } else {
                new_e2e_folder(folder)
            };
            let pattern = spec_pattern(&folder, test_files);
            out.e2e.set(
                "specPattern",
                EntryValue::Json(pattern),
                &origin_with_test_files("integrationFolder", test_files),
            );
        } else if test_files.is_some() {
            let folder = if keep_names {
                DEFAULT_INTEGRATION_FOLDER
            } else {
                NEW_E2E_FOLDER
            };
            let pattern = spec_pattern(folder, test_files);
            out.e2e
                .set("specPattern", EntryValue::Json(pattern), &["testFiles"]);
        }

        if component_enabled && let Some(Value::String(folder)) = cfg.get("componentFolder") {
            let pattern = spec_pattern(&normalize_folder(folder), test_files);
            out.component.set(
                "specPattern",
                EntryValue::Json(pattern),
                &origin_with_test_files("componentFolder", test_files),
            );
        }

        if let Some(ignore) = cfg.get("ignoreTestFiles") {
            let value = EntryValue::Json(ignore.clone());
            out.e2e
                .set("excludeSpecPattern", value.clone(), &["ignoreTestFiles"]);
            if component_enabled {
                out.component
                    .set("excludeSpecPattern", value, &["ignoreTestFiles"]);
            }
        }

        if let Some(support) = cfg.get("supportFile") {
            out.e2e
                .set("supportFile", EntryValue::Json(support.clone()), &["supportFile"]);
        }

        if let Some(Value::Object(overrides)) = cfg.get("e2e") {
            for (key, value) in overrides {
                out.e2e.set(key, EntryValue::Json(value.clone()), &["e2e"]);
            }
        }
        if let Some(Value::Object(overrides)) = cfg.get("component") {
            for (key, value) in overrides {
                out.component
                    .set(key, EntryValue::Json(value.clone()), &["component"]);
            }
        }

        // A pass-through `e2e`/`component` value next to a populated section
        // of the same name would be a second property with that key.
        for (name, section) in [("e2e", &mut out.e2e), ("component", &mut out.component)] {
            if section.is_empty() {
                continue;
            }
            let Some(EntryValue::Json(value)) = out.general.remove(name).map(|e| e.value) else {
                continue;
            };
            let empty_override = matches!(&value, Value::Object(m) if m.is_empty());
            if empty_override && let Some(first) = section.entries.first_mut() {
                first.origin.push(name.to_string());
            } else {
                section.entries.insert(
                    0,
                    ConfigEntry {
                        key: name.to_string(),
                        value: EntryValue::Note(format!("legacy {name} option: {value}")),
                        origin: vec![name.to_string()],
                    },
                );
            }
        }

        out
    }

    /// Legacy keys represented anywhere in the output.
    #[must_use]
    pub fn legacy_keys(&self) -> BTreeSet<String> {
        [&self.general, &self.e2e, &self.component]
            .iter()
            .flat_map(|section| section.entries.iter())
            .flat_map(|entry| entry.origin.iter().cloned())
            .collect()
    }

    /// Generated source text for the new config file.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("const { defineConfig } = require('cypress')\n\n");
        out.push_str("module.exports = defineConfig({\n");
        self.general.write(&mut out, 1);
        for (name, section) in [("e2e", &self.e2e), ("component", &self.component)] {
            if section.is_empty() {
                continue;
            }
            out.push_str(&format!("{}{name}: {{\n", indent(1)));
            section.write(&mut out, 2);
            out.push_str(&format!("{}}},\n", indent(1)));
        }
        out.push_str("})\n");
        out
    }
}

/// Whether the key is folded into a mode section rather than copied through.
fn is_restructured(key: &str, value: &Value) -> bool {
    if !RECOGNIZED_KEYS.contains(&key) {
        return false;
    }
    match key {
        // Non-string folders (`false`) are not folder paths.
        "integrationFolder" | "componentFolder" => value.is_string(),
        "pluginsFile" => value.is_string() || matches!(value, Value::Bool(false)),
        "e2e" | "component" => matches!(value, Value::Object(m) if !m.is_empty()),
        _ => true,
    }
}

fn uses_component_testing(cfg: &LegacyConfig) -> bool {
    cfg.component_testing_enabled()
        && (matches!(cfg.get("componentFolder"), Some(Value::String(_)))
            || matches!(cfg.get("component"), Some(Value::Object(_))))
}

fn new_e2e_folder(folder: &str) -> String {
    let folder = normalize_folder(folder);
    if folder == DEFAULT_INTEGRATION_FOLDER {
        NEW_E2E_FOLDER.to_string()
    } else {
        folder
    }
}

fn spec_pattern(folder: &str, test_files: Option<&Value>) -> Value {
    let join = |glob: &str| {
        if folder.is_empty() {
            glob.to_string()
        } else {
            format!("{folder}/{glob}")
        }
    };

    match test_files {
        Some(Value::String(glob)) if glob != LEGACY_DEFAULT_TEST_FILES => Value::String(join(glob)),
        Some(Value::Array(globs)) => Value::Array(
            globs
                .iter()
                .map(|g| match g {
                    Value::String(s) => Value::String(join(s)),
                    other => other.clone(),
                })
                .collect(),
        ),
        _ => Value::String(join(NEW_SPEC_GLOB)),
    }
}

fn origin_with_test_files<'a>(key: &'a str, test_files: Option<&Value>) -> Vec<&'a str> {
    if test_files.is_some() {
        vec![key, "testFiles"]
    } else {
        vec![key]
    }
}

fn normalize_browsers(value: &Value) -> Value {
    match value {
        Value::String(_) | Value::Object(_) => Value::Array(vec![value.clone()]),
        other => other.clone(),
    }
}
