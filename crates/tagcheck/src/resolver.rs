//! reference resolution
//!
//! [VariableResolver] owns everything loaded from a source tree (documents, declarations, the
//! value store and the resolved locals) and answers "what is the value of this reference".
//!
//! Loading mutates the resolver and has to finish before it is shared. After that every method
//! takes `&self` and the resolver can be used from any number of threads.
//!
//! Reference forms, first match wins:
//!
//! | form | example | source |
//! |------|---------|--------|
//! | variable | `var.environment` | [ResolutionSource::Variable] |
//! | local | `local.name`, `local.sizes["prod"]`, `local.zones[var.index]` | [ResolutionSource::Local] |
//! | nested traversal | `var.tags.Owner`, `local.config.team` | variable or local |
//! | template | `"${var.project}-web"` | [ResolutionSource::Interpolation] |
//! | quoted literal | `"production"` | [ResolutionSource::Literal] |
use crate::context::{EvalContext, DEFAULT_MAX_DEPTH};
use crate::declarations::{Declarations, Issue};
use crate::dependency::{self, ResolutionStats};
use crate::expression::{Diagnostic, Expression, HclExpression};
use crate::hcl_documents::{FileDiagnostic, HclDocuments, LoadError};
use crate::util::{is_identifier, unquote};
use crate::value::{Map, Value};
use crate::value_store::ValueStore;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// prefix of environment entries that carry variable values
    pub env_prefix: String,
    /// environment to read, `None` for the process environment
    pub environment: Option<Vec<(String, String)>>,
    /// values files loaded after the ones found in the root directory
    pub values_files: Vec<PathBuf>,
    /// highest precedence values
    pub overrides: Map,
    pub max_passes: usize,
    pub skip_dirs: Vec<String>,
    pub max_expression_depth: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            env_prefix: "TF_VAR_".to_string(),
            environment: None,
            values_files: vec![],
            overrides: Map::new(),
            max_passes: 10,
            skip_dirs: vec![
                ".terraform".to_string(),
                ".git".to_string(),
                ".terragrunt-cache".to_string(),
            ],
            max_expression_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Variable,
    Local,
    Literal,
    Interpolation,
    Unknown,
}

/// Outcome of resolving one reference
///
/// `uncertainty` is set exactly when `resolved` is false.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResolutionResult {
    pub value: Value,
    pub resolved: bool,
    pub source: ResolutionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<String>,
}

impl ResolutionResult {
    pub fn resolved(value: Value, source: ResolutionSource) -> Self {
        Self {
            value,
            resolved: true,
            source,
            uncertainty: None,
        }
    }

    pub fn unresolved(source: ResolutionSource, uncertainty: impl Into<String>) -> Self {
        Self {
            value: Value::Null,
            resolved: false,
            source,
            uncertainty: Some(uncertainty.into()),
        }
    }

    /// Null values count as unresolved
    fn checked(value: Value, source: ResolutionSource, text: &str) -> Self {
        if value.is_null() {
            return Self::unresolved(source, format!("'{text}' resolved to null"));
        }
        Self::resolved(value, source)
    }
}

#[derive(Debug)]
pub struct VariableResolver {
    options: ResolverOptions,
    documents: HclDocuments,
    declarations: Declarations,
    issues: Vec<Issue>,
    store: ValueStore,
    resolved_locals: Map,
    stats: ResolutionStats,
    context: EvalContext,
}

impl Default for VariableResolver {
    fn default() -> Self {
        Self::new(ResolverOptions::default())
    }
}

impl VariableResolver {
    pub fn new(options: ResolverOptions) -> Self {
        let context = EvalContext::functions_only(options.max_expression_depth);
        Self {
            options,
            documents: HclDocuments::default(),
            declarations: Declarations::default(),
            issues: vec![],
            store: ValueStore::default(),
            resolved_locals: Map::new(),
            stats: ResolutionStats::default(),
            context,
        }
    }

    /// Loads sources and values files from `dir_path`, then resolves all locals
    ///
    /// Only an unusable root directory is an error, files that fail to load are returned as
    /// diagnostics.
    pub fn load_from_directory(&mut self, dir_path: &Path) -> Result<Vec<FileDiagnostic>, LoadError> {
        let mut documents = HclDocuments::default();
        let mut diagnostics = documents.load_directory(dir_path, &self.options.skip_dirs)?;

        self.store = ValueStore::default();
        self.load_environment();
        diagnostics.extend(self.store.load_directory(dir_path)?);
        diagnostics.extend(self.load_explicit_values());

        self.documents = documents;
        self.resolve();
        Ok(diagnostics)
    }

    /// Uses already loaded documents, values files come only from the options
    pub fn load_documents(&mut self, documents: HclDocuments) -> Vec<FileDiagnostic> {
        self.store = ValueStore::default();
        self.load_environment();
        let diagnostics = self.load_explicit_values();

        self.documents = documents;
        self.resolve();
        diagnostics
    }

    fn load_environment(&mut self) {
        let prefix = &self.options.env_prefix;
        match &self.options.environment {
            Some(environment) => self.store.load_environment(prefix, environment.iter().cloned()),
            None => self.store.load_environment(prefix, std::env::vars()),
        }
    }

    fn load_explicit_values(&mut self) -> Vec<FileDiagnostic> {
        let mut diagnostics = vec![];
        for path in &self.options.values_files {
            if let Err(error) = self.store.load_values_file(path) {
                tracing::warn!(path=%path.display(), %error, "skipping values file");
                diagnostics.push(FileDiagnostic::new(path.clone(), error));
            }
        }

        self.store.load_overrides(&self.options.overrides);
        diagnostics
    }

    /// Extracts declarations from the loaded documents and runs the fixed-point loop
    pub fn resolve(&mut self) {
        let depth = self.options.max_expression_depth;
        let (mut declarations, issues) = Declarations::from_documents(&self.documents, depth);
        let (resolved, stats) = dependency::resolve_all(
            &mut declarations,
            &self.store,
            self.options.max_passes,
            depth,
        );

        self.context = EvalContext::build(&declarations, &self.store, &resolved, depth);
        self.declarations = declarations;
        self.issues = issues.issues;
        self.resolved_locals = resolved;
        self.stats = stats;
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn documents(&self) -> &HclDocuments {
        &self.documents
    }

    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    pub fn declaration_issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn resolved_locals(&self) -> &Map {
        &self.resolved_locals
    }

    pub fn stats(&self) -> &ResolutionStats {
        &self.stats
    }

    pub fn context(&self) -> &EvalContext {
        &self.context
    }

    /// Evaluates an expression against the final context
    pub fn evaluate(&self, expression: &dyn Expression) -> Result<Value, Diagnostic> {
        expression.evaluate(&self.context)
    }

    /// Value of a variable: store first, then the declared default
    pub fn variable_value(&self, name: &str) -> Option<&Value> {
        self.store
            .get(name)
            .map(|entry| &entry.value)
            .or_else(|| self.declarations.variable(name)?.default.as_ref())
    }

    pub fn resolve_reference(&self, text: &str) -> ResolutionResult {
        let text = text.trim();

        if let Some(name) = text.strip_prefix("var.").filter(|name| is_identifier(name)) {
            return self.resolve_variable(name, text);
        }

        if let Some(rest) = text.strip_prefix("local.") {
            if is_identifier(rest) {
                return self.resolve_local(rest, text);
            }
            if let Some((name, index)) = split_index(rest) {
                return self.resolve_indexed_local(name, index, text);
            }
        }

        if text.starts_with("var.") || text.starts_with("local.") {
            return self.resolve_traversal(text);
        }

        if text.contains("${") {
            return self.resolve_interpolation(text);
        }

        if let Some(literal) = unquote(text) {
            return ResolutionResult::resolved(literal.into(), ResolutionSource::Literal);
        }

        ResolutionResult::unresolved(ResolutionSource::Unknown, "Unable to identify reference type")
    }

    fn resolve_variable(&self, name: &str, text: &str) -> ResolutionResult {
        let source = ResolutionSource::Variable;
        if let Some(value) = self.variable_value(name) {
            return ResolutionResult::checked(value.clone(), source, text);
        }

        if self.declarations.variable(name).is_some() {
            ResolutionResult::unresolved(
                source,
                "Variable defined but no value provided and no default value",
            )
        } else {
            ResolutionResult::unresolved(source, "Variable not defined")
        }
    }

    fn resolve_local(&self, name: &str, text: &str) -> ResolutionResult {
        let source = ResolutionSource::Local;
        if let Some(value) = self.resolved_locals.get(name) {
            return ResolutionResult::checked(value.clone(), source, text);
        }

        match self.declarations.local(name) {
            Some(local) if !local.references.is_empty() => ResolutionResult::unresolved(
                source,
                format!(
                    "Local value depends on unresolved variables or expressions ({})",
                    local.references.join(", ")
                ),
            ),
            Some(_) => ResolutionResult::unresolved(
                source,
                "Local value depends on unresolved variables or expressions",
            ),
            None => ResolutionResult::unresolved(source, "Local not defined"),
        }
    }

    fn resolve_indexed_local(&self, name: &str, index: &str, text: &str) -> ResolutionResult {
        let source = ResolutionSource::Local;
        let Some(base) = self.resolved_locals.get(name) else {
            return ResolutionResult::unresolved(
                source,
                format!("Base local '{name}' is not resolved"),
            );
        };

        let index_value = match (unquote(index), index.parse::<i64>()) {
            (Some(key), _) => Value::from(key),
            (None, Ok(position)) => Value::from(position),
            (None, Err(_)) => {
                let result = self.resolve_reference(index);
                if !result.resolved {
                    return ResolutionResult::unresolved(
                        source,
                        format!("Index variable '{index}' is not resolved"),
                    );
                }
                result.value
            }
        };

        match (base, &index_value) {
            (Value::Map(map), key) => {
                let key = key.to_tag_string();
                match map.get(&key) {
                    Some(value) => ResolutionResult::checked(value.clone(), source, text),
                    None => ResolutionResult::unresolved(
                        source,
                        format!("Key '{key}' not found in map"),
                    ),
                }
            }
            (Value::List(list), index) => {
                let position = match index {
                    Value::Number(number) => number.as_i64(),
                    Value::String(s) => s.parse::<i64>().ok(),
                    _ => None,
                };
                match position
                    .and_then(|p| usize::try_from(p).ok())
                    .and_then(|p| list.get(p))
                {
                    Some(value) => ResolutionResult::checked(value.clone(), source, text),
                    None => ResolutionResult::unresolved(source, "Invalid array index"),
                }
            }
            _ => ResolutionResult::unresolved(source, "Base value is not indexable"),
        }
    }

    fn resolve_traversal(&self, text: &str) -> ResolutionResult {
        let source = if text.starts_with("var.") {
            ResolutionSource::Variable
        } else {
            ResolutionSource::Local
        };

        let expression = match HclExpression::parse(text) {
            Ok(expression) => expression,
            Err(_) => {
                return ResolutionResult::unresolved(
                    ResolutionSource::Unknown,
                    "Unable to identify reference type",
                )
            }
        };

        match expression.evaluate(&self.context) {
            Ok(value) => ResolutionResult::checked(value, source, text),
            Err(diagnostic) => ResolutionResult::unresolved(
                source,
                format!("Reference could not be resolved: {diagnostic}"),
            ),
        }
    }

    fn resolve_interpolation(&self, text: &str) -> ResolutionResult {
        let source = ResolutionSource::Interpolation;
        let contents = unquote(text).unwrap_or(text);
        match HclExpression::template(contents).evaluate(&self.context) {
            Ok(value) => ResolutionResult::checked(value, source, text),
            Err(diagnostic) => ResolutionResult::unresolved(
                source,
                format!("Interpolation could not be resolved: {diagnostic}"),
            ),
        }
    }
}

/// `name[index]`
fn split_index(text: &str) -> Option<(&str, &str)> {
    let (name, rest) = text.split_once('[')?;
    let index = rest.strip_suffix(']')?;
    if !is_identifier(name) || index.is_empty() || index.contains(']') {
        return None;
    }

    Some((name, index.trim()))
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ResolutionSource::Variable => "variable",
            ResolutionSource::Local => "local",
            ResolutionSource::Literal => "literal",
            ResolutionSource::Interpolation => "interpolation",
            ResolutionSource::Unknown => "unknown",
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver(text: &str, overrides: &[(&str, Value)]) -> VariableResolver {
        let options = ResolverOptions {
            environment: Some(vec![]),
            overrides: overrides
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
            ..Default::default()
        };
        let mut resolver = VariableResolver::new(options);
        resolver.load_documents(crate::hcl_documents!(text));
        resolver
    }

    const SOURCE: &str = r#"
variable "project" { default = "shop" }
variable "unset" {}
variable "nothing" { default = null }
variable "tags" {
  default = { Owner = "ops@example.com" }
}

locals {
  name    = "${var.project}-web"
  sizes   = { prod = "large", dev = "small" }
  zones   = ["a", "b"]
  stage   = "prod"
  pending = var.unset
  empty   = null
}
"#;

    #[test]
    fn variables() {
        let resolver = resolver(SOURCE, &[]);
        let result = resolver.resolve_reference("var.project");
        assert_eq!(result, ResolutionResult::resolved("shop".into(), ResolutionSource::Variable));

        let result = resolver.resolve_reference("var.unset");
        assert!(!result.resolved);
        assert_eq!(
            result.uncertainty.as_deref(),
            Some("Variable defined but no value provided and no default value")
        );
        assert_eq!(
            resolver.resolve_reference("var.nothing").uncertainty.as_deref(),
            Some("Variable defined but no value provided and no default value")
        );
        assert_eq!(
            resolver.resolve_reference("var.missing").uncertainty.as_deref(),
            Some("Variable not defined")
        );
    }

    #[test]
    fn overrides_win_over_defaults() {
        let resolver = resolver(SOURCE, &[("project", "cli".into())]);
        assert_eq!(resolver.resolve_reference("var.project").value, Value::from("cli"));
        assert_eq!(resolver.resolved_locals().get("name"), Some(&Value::from("cli-web")));
    }

    #[test]
    fn locals() {
        let resolver = resolver(SOURCE, &[]);
        assert_eq!(
            resolver.resolve_reference("local.name"),
            ResolutionResult::resolved("shop-web".into(), ResolutionSource::Local)
        );

        let pending = resolver.resolve_reference("local.pending");
        assert_eq!(
            pending.uncertainty.as_deref(),
            Some("Local value depends on unresolved variables or expressions (var.unset)")
        );
        assert_eq!(
            resolver.resolve_reference("local.nope").uncertainty.as_deref(),
            Some("Local not defined")
        );
        assert_eq!(
            resolver.resolve_reference("local.empty").uncertainty.as_deref(),
            Some("'local.empty' resolved to null")
        );
    }

    #[test]
    fn indexed_locals() {
        let resolver = resolver(SOURCE, &[]);
        let value = |text: &str| resolver.resolve_reference(text);

        assert_eq!(value(r#"local.sizes["prod"]"#).value, Value::from("large"));
        assert_eq!(value("local.sizes[local.stage]").value, Value::from("large"));
        assert_eq!(value("local.zones[1]").value, Value::from("b"));

        let cases = [
            (r#"local.sizes["qa"]"#, "Key 'qa' not found in map"),
            ("local.zones[5]", "Invalid array index"),
            ("local.name[0]", "Base value is not indexable"),
            ("local.pending[0]", "Base local 'pending' is not resolved"),
            ("local.sizes[var.unset]", "Index variable 'var.unset' is not resolved"),
        ];
        for (text, uncertainty) in cases {
            let result = value(text);
            assert!(!result.resolved, "{text}");
            assert_eq!(result.uncertainty.as_deref(), Some(uncertainty), "{text}");
        }
    }

    #[test]
    fn nested_traversals_and_templates() {
        let resolver = resolver(SOURCE, &[]);
        assert_eq!(
            resolver.resolve_reference("var.tags.Owner"),
            ResolutionResult::resolved("ops@example.com".into(), ResolutionSource::Variable)
        );
        assert_eq!(
            resolver.resolve_reference(r#""${local.name}-${upper(local.stage)}""#),
            ResolutionResult::resolved("shop-web-PROD".into(), ResolutionSource::Interpolation)
        );

        let failed = resolver.resolve_reference("${var.unset}-x");
        assert_eq!(failed.source, ResolutionSource::Interpolation);
        assert!(failed.uncertainty.unwrap().starts_with("Interpolation could not be resolved"));
    }

    #[test]
    fn literals_and_unknown_forms() {
        let resolver = resolver(SOURCE, &[]);
        assert_eq!(
            resolver.resolve_reference(r#""production""#),
            ResolutionResult::resolved("production".into(), ResolutionSource::Literal)
        );

        let unknown = resolver.resolve_reference("foo.bar");
        assert_eq!(unknown.source, ResolutionSource::Unknown);
        assert!(unknown.uncertainty.unwrap().contains("Unable to identify"));
    }

    #[test]
    fn oversized_padding_leaves_local_unresolved() {
        let resolver = resolver(
            r#"
locals {
  indented = indent(9223372036854775807, "a\nb")
  padded   = format("%99999999999s", "x")
  fine     = indent(2, "a\nb")
}
"#,
            &[],
        );
        assert!(!resolver.resolve_reference("local.indented").resolved);
        assert!(!resolver.resolve_reference("local.padded").resolved);
        assert_eq!(resolver.resolve_reference("local.fine").value, Value::from("a\n  b"));
    }

    #[test]
    fn repeated_resolution_is_stable() {
        let resolver = resolver(SOURCE, &[]);
        for text in ["var.project", "local.zones[9]", "${local.name}", "foo", "var.unset"] {
            assert_eq!(resolver.resolve_reference(text), resolver.resolve_reference(text));
        }
    }
}
