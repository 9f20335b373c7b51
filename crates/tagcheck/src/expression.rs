//! evaluable expressions
//!
//! [Expression] is the one capability the resolver needs from a declaration: evaluate against an
//! [EvalContext] and produce a [Value] or a [Diagnostic]. There are two strategies:
//!
//! - [HclExpression] wraps a parsed [hcl::Expression] and evaluates it with [hcl::eval]. This is
//!   the primary strategy and handles everything the evaluator supports (templates, function
//!   calls, indexing, conditionals, `for` expressions).
//! - [PatternExpression] is the lightweight fallback for values that never went through the hcl
//!   parser (locals declared in `.tf.json` documents): a literal, a direct `var.`/`local.`
//!   reference, or a `${...}` template.
//!
//! Evaluation never mutates the context and never produces partial values.
use crate::context::EvalContext;
use crate::util::{is_identifier, ReferenceCollector};
use crate::value::Value;
use crate::visit::expression_depth;
use hcl::eval::{ErrorKind, Evaluate};

pub trait Expression: Send + Sync + std::fmt::Debug {
    fn evaluate(&self, context: &EvalContext) -> Result<Value, Diagnostic>;

    /// `var.NAME`/`local.NAME` references that appear in the expression (best-effort)
    fn references(&self) -> Vec<String>;

    /// Literal value when the expression does not depend on any context
    fn literal(&self) -> Option<Value> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// reference to a variable, local, attribute or function that does not exist (yet)
    UndefinedName,
    Parse,
    /// nesting exceeds the configured maximum expression depth
    TooDeep,
    Evaluation,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Diagnostic {}

impl From<hcl::eval::Error> for Diagnostic {
    fn from(error: hcl::eval::Error) -> Self {
        let kind = match error.kind() {
            ErrorKind::UndefinedVar(_) | ErrorKind::UndefinedFunc(_) | ErrorKind::NoSuchKey(_) => {
                DiagnosticKind::UndefinedName
            }
            _ => DiagnosticKind::Evaluation,
        };

        Diagnostic::new(kind, error.to_string())
    }
}

/// Expression backed by the hcl evaluator
#[derive(Debug, Clone)]
pub struct HclExpression {
    expr: hcl::Expression,
    depth: usize,
}

impl HclExpression {
    pub fn new(expr: hcl::Expression) -> Self {
        let depth = expression_depth(&expr);
        Self { expr, depth }
    }

    /// Parses expression source text (`var.a`, `upper(local.b)`, `"${var.a}-x"`, ...)
    pub fn parse(text: &str) -> Result<Self, Diagnostic> {
        let expr: hcl_edit::expr::Expression = text
            .trim()
            .parse()
            .map_err(|err: hcl_edit::parser::Error| {
                Diagnostic::new(DiagnosticKind::Parse, err.to_string())
            })?;
        Ok(Self::new(expr.into()))
    }

    /// Template from the contents of a quoted string, e.g. `${var.project}-vpc`
    pub fn template(contents: &str) -> Self {
        Self::new(hcl::Expression::TemplateExpr(Box::new(
            hcl::TemplateExpr::QuotedString(contents.to_string()),
        )))
    }

    pub fn inner(&self) -> &hcl::Expression {
        &self.expr
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Expression for HclExpression {
    fn evaluate(&self, context: &EvalContext) -> Result<Value, Diagnostic> {
        if self.depth > context.max_depth() {
            return Err(Diagnostic::new(
                DiagnosticKind::TooDeep,
                format!(
                    "expression nesting depth {} exceeds the maximum of {}",
                    self.depth,
                    context.max_depth()
                ),
            ));
        }

        let value = self.expr.evaluate(context.hcl_context())?;
        Ok(value.into())
    }

    fn references(&self) -> Vec<String> {
        ReferenceCollector::collect(&self.expr)
    }

    fn literal(&self) -> Option<Value> {
        literal_value(&self.expr)
    }
}

/// Value of an expression made only of literals (no templates, calls or references)
fn literal_value(expr: &hcl::Expression) -> Option<Value> {
    match expr {
        hcl::Expression::Null => Some(Value::Null),
        hcl::Expression::Bool(b) => Some((*b).into()),
        hcl::Expression::Number(n) => Some(Value::Number(n.clone().into())),
        hcl::Expression::String(s) => Some(s.as_str().into()),
        hcl::Expression::Array(array) => array
            .iter()
            .map(literal_value)
            .collect::<Option<Vec<_>>>()
            .map(Value::List),
        hcl::Expression::Object(object) => object
            .iter()
            .map(|(key, value)| {
                let key = match key {
                    hcl::ObjectKey::Identifier(ident) => ident.as_str().to_string(),
                    hcl::ObjectKey::Expression(key) => literal_value(key)?.as_str()?.to_string(),
                    _ => return None,
                };
                Some((key, literal_value(value)?))
            })
            .collect::<Option<_>>()
            .map(Value::Map),
        hcl::Expression::TemplateExpr(template_expr) => match template_expr.as_ref() {
            hcl::TemplateExpr::QuotedString(s) if !s.contains("${") && !s.contains("%{") => {
                Some(s.as_str().into())
            }
            _ => None,
        },
        hcl::Expression::Parenthesis(inner) => literal_value(inner),
        _ => None,
    }
}

/// String-pattern fallback strategy
#[derive(Debug, Clone)]
pub enum PatternExpression {
    Literal(Value),
    Variable(String),
    Local(String),
    Template(HclExpression),
}

impl PatternExpression {
    /// Classifies a JSON-sourced value
    pub fn from_json(value: serde_json::Value) -> Self {
        let serde_json::Value::String(text) = value else {
            return PatternExpression::Literal(value.into());
        };

        if let Some(name) = text.strip_prefix("var.").filter(|name| is_identifier(name)) {
            return PatternExpression::Variable(name.to_string());
        }

        if let Some(name) = text.strip_prefix("local.").filter(|name| is_identifier(name)) {
            return PatternExpression::Local(name.to_string());
        }

        if text.contains("${") {
            return PatternExpression::Template(HclExpression::template(&text));
        }

        PatternExpression::Literal(text.into())
    }
}

impl Expression for PatternExpression {
    fn evaluate(&self, context: &EvalContext) -> Result<Value, Diagnostic> {
        match self {
            PatternExpression::Literal(value) => Ok(value.clone()),
            PatternExpression::Variable(name) => context.variable(name).cloned().ok_or_else(|| {
                Diagnostic::new(
                    DiagnosticKind::UndefinedName,
                    format!("var.{name} has no value"),
                )
            }),
            PatternExpression::Local(name) => context.local(name).cloned().ok_or_else(|| {
                Diagnostic::new(
                    DiagnosticKind::UndefinedName,
                    format!("local.{name} is not resolved"),
                )
            }),
            PatternExpression::Template(template) => template.evaluate(context),
        }
    }

    fn references(&self) -> Vec<String> {
        match self {
            PatternExpression::Literal(_) => vec![],
            PatternExpression::Variable(name) => vec![format!("var.{name}")],
            PatternExpression::Local(name) => vec![format!("local.{name}")],
            PatternExpression::Template(template) => template.references(),
        }
    }

    fn literal(&self) -> Option<Value> {
        match self {
            PatternExpression::Literal(value) => Some(value.clone()),
            _ => None,
        }
    }
}
