use crate::visit::{self, VisitTraversals};
use hcl::{Expression, Identifier, Traversal, TraversalOperator};

/// Collects `var.NAME` and `local.NAME` references into a deduplicated list
#[derive(Default)]
pub(crate) struct ReferenceCollector {
    references: Vec<String>,
}

impl visit::Visit<Traversal> for ReferenceCollector {
    fn visit(&mut self, traversal: &Traversal) {
        let Some(reference) = traversal.reference_name() else {
            return;
        };

        if !self.references.contains(&reference) {
            self.references.push(reference);
        }
    }
}

impl ReferenceCollector {
    pub fn collect(expr: &Expression) -> Vec<String> {
        let mut collector = Self::default();
        expr.visit_traversals(&mut collector);
        collector.references
    }
}

pub(crate) trait TraversalExt {
    fn get_longest_path(&self) -> Vec<Identifier>;
    fn reference_name(&self) -> Option<String>;
}

impl TraversalExt for Traversal {
    fn get_longest_path(&self) -> Vec<Identifier> {
        let Expression::Variable(var) = &self.expr else {
            return vec![];
        };

        let mut path = vec![hcl::Identifier::unchecked(var.as_str())];
        for operator in &self.operators {
            let TraversalOperator::GetAttr(ident) = operator else {
                break;
            };

            path.push(ident.clone());
        }

        path
    }

    /// `var.NAME` / `local.NAME` for traversals rooted in one of those namespaces
    fn reference_name(&self) -> Option<String> {
        let path = self.get_longest_path();
        match path.as_slice() {
            [namespace, name, ..] if matches!(namespace.as_str(), "var" | "local") => {
                Some(format!("{}.{}", namespace.as_str(), name.as_str()))
            }
            _ => None,
        }
    }
}

/// Is `text` a plain identifier (`[A-Za-z_][A-Za-z0-9_-]*`)
pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Removes one pair of surrounding double quotes
pub(crate) fn unquote(text: &str) -> Option<&str> {
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
}
