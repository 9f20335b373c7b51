//! named input values with precedence
//!
//! Sources, lowest to highest precedence:
//! 1. environment entries `TF_VAR_name=value`
//! 2. values files: `terraform.tfvars` (or `terraform.tfvars.json`), then `*.auto.tfvars`, then
//!    `*.auto.tfvars.json`, then explicitly listed files. Within this level a later file wins.
//! 3. explicit overrides
//!
//! Variable defaults are not stored here, they stay with their declaration and sit below all of
//! the above.
use crate::context::EvalContext;
use crate::expression::{Expression, HclExpression};
use crate::hcl_documents::{FileDiagnostic, LoadError};
use crate::value::{Map, Value};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

pub const CANONICAL_VALUES_FILE: &str = "terraform.tfvars";
pub const CANONICAL_VALUES_JSON_FILE: &str = "terraform.tfvars.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    Environment,
    ValuesFile,
    Override,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StoreEntry {
    pub value: Value,
    pub precedence: Precedence,
    /// where the value came from (environment key, file path, `override`)
    pub origin: String,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(transparent)]
pub struct ValueStore {
    entries: IndexMap<String, StoreEntry>,
}

impl ValueStore {
    /// Stores `value` unless a value of higher precedence is already present
    ///
    /// Returns whether the value was stored.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: Value,
        precedence: Precedence,
        origin: impl Into<String>,
    ) -> bool {
        let name = name.into();
        if let Some(existing) = self.entries.get(&name) {
            if existing.precedence > precedence {
                return false;
            }
        }

        let origin = origin.into();
        tracing::trace!(%name, ?precedence, %origin, "storing value");
        self.entries.insert(
            name,
            StoreEntry {
                value,
                precedence,
                origin,
            },
        );
        true
    }

    pub fn get(&self, name: &str) -> Option<&StoreEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StoreEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads `PREFIXname=value` pairs
    ///
    /// Values that look like a list or object (`[...]`, `{...}`) are parsed as hcl, everything
    /// else is kept as a string.
    pub fn load_environment<I, K, V>(&mut self, prefix: &str, environment: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let context = EvalContext::default();
        for (key, raw) in environment {
            let key = key.as_ref();
            let Some(name) = key.strip_prefix(prefix).filter(|name| !name.is_empty()) else {
                continue;
            };

            let raw = raw.as_ref();
            let value = environment_value(raw, &context);
            self.insert(name, value, Precedence::Environment, key);
        }
    }

    pub fn load_overrides(&mut self, overrides: &Map) {
        for (name, value) in overrides {
            self.insert(name.clone(), value.clone(), Precedence::Override, "override");
        }
    }

    /// Loads an hcl (`.tfvars`) or JSON (`.tfvars.json`) values file
    pub fn load_values_file(&mut self, path: &Path) -> Result<usize, LoadError> {
        tracing::info!(path=%path.display(), "loading values file");
        let text = std::fs::read_to_string(path)?;
        let origin = path.display().to_string();
        if path.to_string_lossy().ends_with(".json") {
            self.load_values_json(&text, &origin)
        } else {
            self.load_values_hcl(&text, &origin)
        }
    }

    /// Root attributes of an hcl values file, each evaluated without variables
    pub fn load_values_hcl(&mut self, text: &str, origin: &str) -> Result<usize, LoadError> {
        let body = hcl_edit::parser::parse_body(text)?;
        let context = EvalContext::default();
        let mut count = 0;

        for attribute in body.attributes() {
            let name = attribute.key.value().as_str();
            let expression = HclExpression::new(attribute.value.clone().into());
            match expression.evaluate(&context) {
                Ok(value) => {
                    self.insert(name, value, Precedence::ValuesFile, origin);
                    count += 1;
                }
                Err(diagnostic) => {
                    tracing::warn!(%origin, %name, error=%diagnostic, "skipping value");
                }
            }
        }

        Ok(count)
    }

    /// Root object of a JSON values file
    pub fn load_values_json(&mut self, text: &str, origin: &str) -> Result<usize, LoadError> {
        let document: serde_json::Value = serde_json::from_str(text)?;
        let serde_json::Value::Object(object) = document else {
            tracing::warn!(%origin, "values file root is not an object");
            return Ok(0);
        };

        let count = object.len();
        for (name, value) in object {
            self.insert(name, value.into(), Precedence::ValuesFile, origin);
        }

        Ok(count)
    }

    /// Loads the values files found directly in `dir_path` in precedence order
    ///
    /// A file that fails to parse is skipped and reported.
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<Vec<FileDiagnostic>, LoadError> {
        let mut diagnostics = vec![];
        for path in values_files(dir_path)? {
            if let Err(error) = self.load_values_file(&path) {
                tracing::warn!(path=%path.display(), %error, "skipping values file");
                diagnostics.push(FileDiagnostic::new(path, error));
            }
        }

        Ok(diagnostics)
    }
}

fn environment_value(raw: &str, context: &EvalContext) -> Value {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(value) = HclExpression::parse(trimmed).and_then(|e| e.evaluate(context)) {
            return value;
        }
    }

    raw.into()
}

/// Values files of a directory, in load order
pub fn values_files(dir_path: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut names = std::fs::read_dir(dir_path)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    names.sort();

    let mut files = vec![];
    if names.iter().any(|name| name == CANONICAL_VALUES_FILE) {
        files.push(dir_path.join(CANONICAL_VALUES_FILE));
    } else if names.iter().any(|name| name == CANONICAL_VALUES_JSON_FILE) {
        files.push(dir_path.join(CANONICAL_VALUES_JSON_FILE));
    }

    files.extend(
        names
            .iter()
            .filter(|name| name.ends_with(".auto.tfvars"))
            .map(|name| dir_path.join(name)),
    );
    files.extend(
        names
            .iter()
            .filter(|name| name.ends_with(".auto.tfvars.json"))
            .map(|name| dir_path.join(name)),
    );

    Ok(files)
}
