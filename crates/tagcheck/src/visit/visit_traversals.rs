use super::Visit;
use hcl::{
    template::{Directive, Element},
    Expression, ObjectKey, Operation, Template, Traversal, TraversalOperator,
};

/// Recursively visit all [hcl::Traversal]s
pub trait VisitTraversals {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>);
}

impl VisitTraversals for Expression {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>) {
        match self {
            Expression::Variable(variable) => {
                // a standalone variable is a traversal with no operators...kind of
                let traversal = Traversal::new(
                    Expression::Variable(variable.clone()),
                    Vec::<TraversalOperator>::new(),
                );
                visitor.visit(&traversal);
            }
            Expression::Traversal(traversal) => {
                visitor.visit(traversal);
                if !matches!(traversal.expr, Expression::Variable(_)) {
                    traversal.expr.visit_traversals(visitor);
                }
                for operator in &traversal.operators {
                    if let TraversalOperator::Index(index) = operator {
                        index.visit_traversals(visitor);
                    }
                }
            }
            Expression::Array(array) => {
                for expr in array {
                    expr.visit_traversals(visitor);
                }
            }
            Expression::Object(object) => {
                for (key, value) in object.iter() {
                    if let ObjectKey::Expression(key) = key {
                        key.visit_traversals(visitor);
                    }
                    value.visit_traversals(visitor);
                }
            }
            Expression::TemplateExpr(template_expr) => {
                // unparsable templates fail later during evaluation
                if let Ok(template) = Template::from_expr(template_expr) {
                    template.visit_traversals(visitor);
                }
            }
            Expression::FuncCall(func_call) => {
                for arg in &func_call.args {
                    arg.visit_traversals(visitor);
                }
            }
            Expression::Parenthesis(expr) => {
                expr.visit_traversals(visitor);
            }
            Expression::Conditional(cond) => {
                cond.cond_expr.visit_traversals(visitor);
                cond.true_expr.visit_traversals(visitor);
                cond.false_expr.visit_traversals(visitor);
            }
            Expression::Operation(operation) => match operation.as_ref() {
                Operation::Binary(binop) => {
                    binop.lhs_expr.visit_traversals(visitor);
                    binop.rhs_expr.visit_traversals(visitor);
                }
                Operation::Unary(unop) => {
                    unop.expr.visit_traversals(visitor);
                }
            },
            Expression::ForExpr(forexpr) => {
                forexpr.collection_expr.visit_traversals(visitor);
                forexpr
                    .key_expr
                    .iter()
                    .for_each(|e| e.visit_traversals(visitor));
                forexpr.value_expr.visit_traversals(visitor);
                forexpr
                    .cond_expr
                    .iter()
                    .for_each(|e| e.visit_traversals(visitor));
            }
            _ => {}
        }
    }
}

impl VisitTraversals for Template {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>) {
        for element in self.elements() {
            match element {
                Element::Interpolation(interpolation) => {
                    interpolation.expr.visit_traversals(visitor);
                }
                Element::Directive(directive) => match directive {
                    Directive::If(ifdir) => {
                        ifdir.cond_expr.visit_traversals(visitor);
                        ifdir.true_template.visit_traversals(visitor);
                        ifdir
                            .false_template
                            .iter()
                            .for_each(|t| t.visit_traversals(visitor));
                    }
                    Directive::For(fordir) => {
                        fordir.collection_expr.visit_traversals(visitor);
                        fordir.template.visit_traversals(visitor);
                    }
                },
                Element::Literal(_) => {}
            }
        }
    }
}

/// Nesting depth of an expression tree
///
/// Leaves count as 1. Templates are measured on their parsed form.
pub fn expression_depth(expr: &Expression) -> usize {
    let children: Vec<usize> = match expr {
        Expression::Traversal(traversal) => std::iter::once(&traversal.expr)
            .chain(traversal.operators.iter().filter_map(|operator| match operator {
                TraversalOperator::Index(index) => Some(index),
                _ => None,
            }))
            .map(expression_depth)
            .collect(),
        Expression::Array(array) => array.iter().map(expression_depth).collect(),
        Expression::Object(object) => object.values().map(expression_depth).collect(),
        Expression::TemplateExpr(template_expr) => match Template::from_expr(template_expr) {
            Ok(template) => vec![template_depth(&template)],
            Err(_) => vec![],
        },
        Expression::FuncCall(func_call) => func_call.args.iter().map(expression_depth).collect(),
        Expression::Parenthesis(expr) => vec![expression_depth(expr)],
        Expression::Conditional(cond) => vec![
            expression_depth(&cond.cond_expr),
            expression_depth(&cond.true_expr),
            expression_depth(&cond.false_expr),
        ],
        Expression::Operation(operation) => match operation.as_ref() {
            Operation::Binary(binop) => vec![
                expression_depth(&binop.lhs_expr),
                expression_depth(&binop.rhs_expr),
            ],
            Operation::Unary(unop) => vec![expression_depth(&unop.expr)],
        },
        Expression::ForExpr(forexpr) => std::iter::once(&forexpr.collection_expr)
            .chain(forexpr.key_expr.iter())
            .chain(std::iter::once(&forexpr.value_expr))
            .chain(forexpr.cond_expr.iter())
            .map(expression_depth)
            .collect(),
        _ => vec![],
    };

    1 + children.into_iter().max().unwrap_or(0)
}

fn template_depth(template: &Template) -> usize {
    template
        .elements()
        .iter()
        .map(|element| match element {
            Element::Interpolation(interpolation) => expression_depth(&interpolation.expr),
            Element::Directive(Directive::If(ifdir)) => expression_depth(&ifdir.cond_expr)
                .max(template_depth(&ifdir.true_template))
                .max(ifdir.false_template.as_ref().map(template_depth).unwrap_or(0)),
            Element::Directive(Directive::For(fordir)) => {
                expression_depth(&fordir.collection_expr).max(template_depth(&fordir.template))
            }
            Element::Literal(_) => 0,
        })
        .max()
        .unwrap_or(0)
}
