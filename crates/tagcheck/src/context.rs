//! evaluation context builder
//!
//! An [EvalContext] is a pure function of the current resolution state: the declared variable
//! defaults, the [ValueStore] and the locals resolved so far. Nothing is updated in place; when
//! the state changes a new context is built.
use crate::declarations::Declarations;
use crate::functions;
use crate::value::{Map, Value};
use crate::value_store::ValueStore;

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug)]
pub struct EvalContext {
    inner: hcl::eval::Context<'static>,
    variables: Map,
    locals: Map,
    max_depth: usize,
}

impl EvalContext {
    /// Declared defaults overlaid with every value in the store
    pub fn build(
        declarations: &Declarations,
        store: &ValueStore,
        resolved_locals: &Map,
        max_depth: usize,
    ) -> Self {
        let mut variables = Map::new();
        for (name, declaration) in declarations.variables() {
            if let Some(default) = &declaration.default {
                variables.insert(name.clone(), default.clone());
            }
        }

        for (name, entry) in store.iter() {
            variables.insert(name.clone(), entry.value.clone());
        }

        Self::from_maps(variables, resolved_locals.clone(), max_depth)
    }

    /// Context with functions and stand-in namespaces but without variables or locals
    pub fn functions_only(max_depth: usize) -> Self {
        Self::from_maps(Map::new(), Map::new(), max_depth)
    }

    pub fn from_maps(variables: Map, locals: Map, max_depth: usize) -> Self {
        let mut inner = hcl::eval::Context::new();
        functions::declare(&mut inner);
        functions::placeholders::declare_namespaces(&mut inner);

        // `var` and `local` always exist, possibly empty
        inner.declare_var(
            hcl::Identifier::unchecked("var"),
            hcl::Value::from(Value::Map(variables.clone())),
        );
        inner.declare_var(
            hcl::Identifier::unchecked("local"),
            hcl::Value::from(Value::Map(locals.clone())),
        );

        Self {
            inner,
            variables,
            locals,
            max_depth,
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn hcl_context(&self) -> &hcl::eval::Context<'static> {
        &self.inner
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::functions_only(DEFAULT_MAX_DEPTH)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::expression::{Expression, HclExpression};
    use crate::value_store::Precedence;
    use pretty_assertions::assert_eq;

    fn eval(context: &EvalContext, text: &str) -> Value {
        HclExpression::parse(text).unwrap().evaluate(context).unwrap()
    }

    #[test]
    fn store_values_win_over_defaults() {
        let documents = crate::hcl_documents! {r#"
        variable "region" {
          default = "eu-west-1"
        }
        variable "name" {
          default = "web"
        }
        "#};
        let (declarations, _) = Declarations::from_documents(&documents, DEFAULT_MAX_DEPTH);

        let mut store = ValueStore::default();
        store.insert("region", "us-east-1".into(), Precedence::Override, "test");

        let context = EvalContext::build(&declarations, &store, &Map::new(), DEFAULT_MAX_DEPTH);
        assert_eq!(eval(&context, "var.region"), Value::from("us-east-1"));
        assert_eq!(eval(&context, "var.name"), Value::from("web"));
    }

    #[test]
    fn empty_namespaces_exist() {
        let context = EvalContext::default();
        assert_eq!(eval(&context, "length(keys(var))"), Value::from(0i64));
        assert_eq!(eval(&context, "length(keys(local))"), Value::from(0i64));
    }

    #[test]
    fn stand_in_namespaces() {
        let context = EvalContext::default();
        assert_eq!(eval(&context, "count.index"), Value::from(0i64));
        assert_eq!(eval(&context, "terraform.workspace"), Value::from("default"));
        assert_eq!(
            eval(&context, "data.aws_caller_identity.current.account_id"),
            Value::from("123456789012")
        );
    }
}
