//! variable and local declarations
//!
//! Extracted from the root blocks of every loaded document:
//!
//! ```hcl
//! variable "environment" {
//!   type        = string
//!   default     = "dev"
//!   description = "deployment stage"
//!
//!   validation {
//!     condition     = contains(["dev", "prod"], var.environment)
//!     error_message = "unknown stage"
//!   }
//! }
//!
//! locals {
//!   name_prefix = "${var.project}-${var.environment}"
//! }
//! ```
//!
//! Declarations in `.tf.json` documents use the same structure in JSON syntax. Their local values
//! are classified with [PatternExpression] since they never pass through the hcl parser.
//!
//! Problems with individual declarations are collected as [Issue]s and never abort loading.
use crate::context::EvalContext;
use crate::expression::{Expression, HclExpression, PatternExpression};
use crate::hcl_documents::{HclDocuments, SourceFile};
use crate::value::Value;
use hcl_edit::structure::{Attribute, Block};
use hcl_edit::Span;
use indexmap::IndexMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Location {
    pub path: Option<PathBuf>,
    pub line: usize,
}

impl Location {
    pub(crate) fn of(source: &SourceFile, span: Option<std::ops::Range<usize>>) -> Self {
        Self {
            path: source.path.clone(),
            line: span.map(|span| source.line_of(span.start)).unwrap_or(0),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}:{}", path.display(), self.line),
            None => write!(f, "<input>:{}", self.line),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VariableDeclaration {
    pub name: String,
    /// declared type, as written. Not type-checked
    pub type_label: Option<String>,
    pub description: Option<String>,
    /// `default = null` counts as no default
    pub default: Option<Value>,
    pub sensitive: bool,
    pub nullable: bool,
    pub validations: Vec<ValidationRule>,
    pub location: Location,
}

/// `validation` block of a variable, stored but not evaluated
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidationRule {
    pub condition: String,
    pub error_message: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct LocalDeclaration {
    pub name: String,
    pub expression_text: String,
    #[serde(skip)]
    pub expression: Box<dyn Expression>,
    /// `var.*`/`local.*` names the expression appears to use (diagnostics only)
    pub references: Vec<String>,
    /// known without any context, or filled in once resolved
    pub value: Option<Value>,
    pub location: Location,
}

impl LocalDeclaration {
    pub fn new(
        name: impl Into<String>,
        expression_text: impl Into<String>,
        expression: Box<dyn Expression>,
        location: Location,
    ) -> Self {
        let references = expression.references();
        let value = expression.literal();
        Self {
            name: name.into(),
            expression_text: expression_text.into(),
            expression,
            references,
            value,
            location,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Issue {
    VariableLabelMissing(Location),
    DuplicateVariable { name: String, location: Location },
    DuplicateLocal { name: String, location: Location },
    DefaultNotEvaluable { name: String, message: String },
    InvalidJsonDeclaration { path: Option<PathBuf>, message: String },
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Issue::VariableLabelMissing(location) => {
                write!(f, "{location}: variable block without a name")
            }
            Issue::DuplicateVariable { name, location } => {
                write!(f, "{location}: variable `{name}` declared more than once")
            }
            Issue::DuplicateLocal { name, location } => {
                write!(f, "{location}: local `{name}` declared more than once")
            }
            Issue::DefaultNotEvaluable { name, message } => {
                write!(f, "default of variable `{name}` cannot be evaluated: {message}")
            }
            Issue::InvalidJsonDeclaration { path, message } => match path {
                Some(path) => write!(f, "{}: {message}", path.display()),
                None => f.write_str(message),
            },
        }
    }
}

#[derive(derive_new::new, Debug, Default)]
pub struct DeclarationIssues {
    #[new(default)]
    pub issues: Vec<Issue>,
}

impl DeclarationIssues {
    pub fn log(&mut self, issue: Issue) {
        tracing::warn!(%issue, "declaration issue");
        self.issues.push(issue);
    }
}

/// All variable and local declarations, in declaration order
#[derive(Debug, Default, serde::Serialize)]
pub struct Declarations {
    variables: IndexMap<String, VariableDeclaration>,
    locals: IndexMap<String, LocalDeclaration>,
}

impl Declarations {
    pub fn from_documents(documents: &HclDocuments, max_depth: usize) -> (Self, DeclarationIssues) {
        let mut declarations = Self::default();
        let mut issues = DeclarationIssues::new();
        // defaults may only use functions
        let context = EvalContext::functions_only(max_depth);

        for (_index, source, block) in documents.blocks() {
            match block.ident.value().as_str() {
                "variable" => {
                    if let Some(variable) = parse_variable_block(source, block, &context, &mut issues)
                    {
                        declarations.insert_variable(variable, &mut issues);
                    }
                }
                "locals" => {
                    for attribute in block.body.attributes() {
                        let local = parse_local_attribute(source, attribute);
                        declarations.insert_local(local, &mut issues);
                    }
                }
                _ => {}
            }
        }

        for (source, document) in documents.json_documents() {
            declarations.insert_json_document(source, document, &mut issues);
        }

        tracing::debug!(
            variables = declarations.variables.len(),
            locals = declarations.locals.len(),
            "declarations loaded"
        );

        (declarations, issues)
    }

    pub fn insert_variable(&mut self, variable: VariableDeclaration, issues: &mut DeclarationIssues) {
        if self.variables.contains_key(&variable.name) {
            issues.log(Issue::DuplicateVariable {
                name: variable.name.clone(),
                location: variable.location.clone(),
            });
        }
        self.variables.insert(variable.name.clone(), variable);
    }

    pub fn insert_local(&mut self, local: LocalDeclaration, issues: &mut DeclarationIssues) {
        if self.locals.contains_key(&local.name) {
            issues.log(Issue::DuplicateLocal {
                name: local.name.clone(),
                location: local.location.clone(),
            });
        }
        self.locals.insert(local.name.clone(), local);
    }

    pub fn variables(&self) -> impl Iterator<Item = (&String, &VariableDeclaration)> {
        self.variables.iter()
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDeclaration> {
        self.variables.get(name)
    }

    pub fn locals(&self) -> impl Iterator<Item = (&String, &LocalDeclaration)> {
        self.locals.iter()
    }

    pub fn local(&self, name: &str) -> Option<&LocalDeclaration> {
        self.locals.get(name)
    }

    pub(crate) fn set_local_value(&mut self, name: &str, value: Value) {
        if let Some(local) = self.locals.get_mut(name) {
            local.value = Some(value);
        }
    }

    fn insert_json_document(
        &mut self,
        source: &SourceFile,
        document: &serde_json::Value,
        issues: &mut DeclarationIssues,
    ) {
        let location = Location {
            path: source.path.clone(),
            line: 0,
        };

        let Some(root) = document.as_object() else {
            issues.log(Issue::InvalidJsonDeclaration {
                path: source.path.clone(),
                message: "document root must be an object".to_string(),
            });
            return;
        };

        if let Some(variables) = root.get("variable") {
            for (name, body) in json_objects(variables) {
                let variable = json_variable(name, body, location.clone());
                self.insert_variable(variable, issues);
            }
        }

        if let Some(locals) = root.get("locals") {
            for (name, value) in json_objects(locals) {
                let expression_text = match value {
                    serde_json::Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                let local = LocalDeclaration::new(
                    name,
                    expression_text,
                    Box::new(PatternExpression::from_json(value.clone())),
                    location.clone(),
                );
                self.insert_local(local, issues);
            }
        }
    }
}

/// Entries of an object, or of every object in a list of objects
fn json_objects(value: &serde_json::Value) -> Vec<(&String, &serde_json::Value)> {
    match value {
        serde_json::Value::Object(object) => object.iter().collect(),
        serde_json::Value::Array(array) => array
            .iter()
            .filter_map(|item| item.as_object())
            .flat_map(|object| object.iter())
            .collect(),
        _ => vec![],
    }
}

fn json_variable(name: &str, body: &serde_json::Value, location: Location) -> VariableDeclaration {
    let field = |key: &str| body.get(key);
    VariableDeclaration {
        name: name.to_string(),
        type_label: field("type").map(|t| match t {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
        description: field("description").and_then(|d| d.as_str()).map(str::to_string),
        default: field("default")
            .filter(|d| !d.is_null())
            .map(|d| Value::from(d.clone())),
        sensitive: field("sensitive").and_then(|s| s.as_bool()).unwrap_or(false),
        nullable: field("nullable").and_then(|n| n.as_bool()).unwrap_or(true),
        validations: field("validation")
            .map(|validation| {
                json_objects_list(validation)
                    .into_iter()
                    .map(|rule| ValidationRule {
                        condition: rule
                            .get("condition")
                            .and_then(|c| c.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        error_message: rule
                            .get("error_message")
                            .and_then(|m| m.as_str())
                            .map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        location,
    }
}

fn json_objects_list(value: &serde_json::Value) -> Vec<&serde_json::Value> {
    match value {
        serde_json::Value::Array(array) => array.iter().collect(),
        other => vec![other],
    }
}

fn expression_text(expr: &hcl_edit::expr::Expression) -> String {
    expr.to_string().trim().to_string()
}

fn literal_string(attribute: &Attribute) -> Option<String> {
    let expr: hcl::Expression = attribute.value.clone().into();
    HclExpression::new(expr)
        .literal()
        .and_then(|value| value.as_str().map(str::to_string))
}

fn literal_bool(attribute: &Attribute) -> Option<bool> {
    match HclExpression::new(attribute.value.clone().into()).literal() {
        Some(Value::Bool(b)) => Some(b),
        _ => None,
    }
}

fn parse_variable_block(
    source: &SourceFile,
    block: &Block,
    context: &EvalContext,
    issues: &mut DeclarationIssues,
) -> Option<VariableDeclaration> {
    let location = Location::of(source, block.span());
    let Some(label) = block.labels.first() else {
        issues.log(Issue::VariableLabelMissing(location));
        return None;
    };

    let mut variable = VariableDeclaration {
        name: label.as_str().to_string(),
        type_label: None,
        description: None,
        default: None,
        sensitive: false,
        nullable: true,
        validations: vec![],
        location,
    };

    for attribute in block.body.attributes() {
        match attribute.key.value().as_str() {
            "type" => variable.type_label = Some(expression_text(&attribute.value)),
            "description" => variable.description = literal_string(attribute),
            "sensitive" => variable.sensitive = literal_bool(attribute).unwrap_or(false),
            "nullable" => variable.nullable = literal_bool(attribute).unwrap_or(true),
            "default" => {
                let expression = HclExpression::new(attribute.value.clone().into());
                match expression.evaluate(context) {
                    Ok(Value::Null) => {}
                    Ok(value) => variable.default = Some(value),
                    Err(diagnostic) => issues.log(Issue::DefaultNotEvaluable {
                        name: variable.name.clone(),
                        message: diagnostic.message,
                    }),
                }
            }
            _ => {}
        }
    }

    for validation in block.body.blocks().filter(|b| b.ident.value().as_str() == "validation") {
        let mut rule = ValidationRule {
            condition: String::new(),
            error_message: None,
        };
        for attribute in validation.body.attributes() {
            match attribute.key.value().as_str() {
                "condition" => rule.condition = expression_text(&attribute.value),
                "error_message" => rule.error_message = literal_string(attribute),
                _ => {}
            }
        }
        variable.validations.push(rule);
    }

    Some(variable)
}

fn parse_local_attribute(source: &SourceFile, attribute: &Attribute) -> LocalDeclaration {
    LocalDeclaration::new(
        attribute.key.value().as_str(),
        expression_text(&attribute.value),
        Box::new(HclExpression::new(attribute.value.clone().into())),
        Location::of(source, attribute.span()),
    )
}
