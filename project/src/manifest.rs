//! Root project manifest.
//!
//! The manifest is a JSON document with at least `name`, `scripts` and
//! `extra` keys. Only `scripts` is ever rewritten; every other key, and the
//! key order, is kept as loaded.
//!
//! # Examples
//!
//! ```no_run
//! use script_merge_core::RootProject;
//! use script_merge_project::ProjectManifest;
//!
//! let mut manifest = ProjectManifest::load("composer.json").unwrap();
//! let scripts = manifest.scripts();
//! manifest.set_scripts(scripts);
//! manifest.save("composer.json").unwrap();
//! ```

use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use script_merge_core::{ROOT_OWNER, RootProject, ScriptTable, ScriptValue, normalize};

use crate::error::{ProjectError, Result};

/// The root project's manifest document.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectManifest {
    name: String,
    extra: Value,
    document: Map<String, Value>,
}

impl ProjectManifest {
    /// Loads a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ProjectError::IoError) if the file cannot be read,
    /// [`JsonError`](ProjectError::JsonError) if it is not valid JSON, or
    /// [`InvalidManifest`](ProjectError::InvalidManifest) if the top level is
    /// not an object.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let document: Value = serde_json::from_reader(reader)?;
        Self::from_value(document)
    }

    /// Builds a manifest from an already parsed document.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use script_merge_core::RootProject;
    /// use script_merge_project::ProjectManifest;
    ///
    /// let manifest = ProjectManifest::from_value(json!({
    ///     "name": "my/app",
    ///     "scripts": { "test": "phpunit", "broken": 5 }
    /// }))
    /// .unwrap();
    /// assert_eq!(manifest.name(), "my/app");
    /// assert_eq!(manifest.scripts().len(), 1);
    /// ```
    pub fn from_value(document: Value) -> Result<Self> {
        let Value::Object(document) = document else {
            return Err(ProjectError::InvalidManifest(
                "top-level value must be an object".to_string(),
            ));
        };

        let name = document
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(ROOT_OWNER)
            .to_string();
        let extra = document.get("extra").cloned().unwrap_or(Value::Null);

        Ok(Self {
            name,
            extra,
            document,
        })
    }

    /// Saves the manifest as pretty-printed JSON with four-space indentation
    /// and a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ProjectError::IoError) if the file cannot be
    /// written, or [`JsonError`](ProjectError::JsonError) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        self.document.serialize(&mut serializer)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// The full manifest document.
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Raw `scripts` entries, or an empty map if the key is missing or not an
    /// object.
    fn raw_scripts(&self) -> Map<String, Value> {
        self.document
            .get("scripts")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

impl RootProject for ProjectManifest {
    fn name(&self) -> &str {
        &self.name
    }

    fn extra(&self) -> &Value {
        &self.extra
    }

    /// Root scripts that normalize; anything else is left out of the merge
    /// and kept verbatim by [`set_scripts`](RootProject::set_scripts).
    fn scripts(&self) -> ScriptTable {
        self.raw_scripts()
            .iter()
            .filter_map(|(name, raw)| {
                let value = normalize(raw);
                if value.is_none() {
                    debug!(script = %name, "Root script kept verbatim");
                }
                Some((name.clone(), value?))
            })
            .collect()
    }

    /// Root scripts that do not normalize. They stay root-owned in the merge
    /// so a package can never claim a name whose file value will not change.
    fn reserved_names(&self) -> Vec<String> {
        self.raw_scripts()
            .iter()
            .filter(|(_, raw)| normalize(raw).is_none())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Writes `scripts` back in original order, followed by new names.
    ///
    /// Root entries that [`scripts`](RootProject::scripts) left out keep their
    /// raw value.
    fn set_scripts(&mut self, scripts: ScriptTable) {
        let original = self.raw_scripts();
        let mut merged = Map::new();

        for (name, raw) in &original {
            let value = match scripts.get(name) {
                Some(value) if normalize(raw).is_some() => to_json(value),
                _ => raw.clone(),
            };
            merged.insert(name.clone(), value);
        }
        for (name, value) in &scripts {
            if !merged.contains_key(name) {
                merged.insert(name.clone(), to_json(value));
            }
        }

        self.document
            .insert("scripts".to_string(), Value::Object(merged));
    }
}

fn to_json(value: &ScriptValue) -> Value {
    match value {
        ScriptValue::Single(cmd) => Value::String(cmd.clone()),
        ScriptValue::Steps(steps) => {
            Value::Array(steps.iter().cloned().map(Value::String).collect())
        }
    }
}
