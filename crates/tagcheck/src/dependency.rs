//! fixed-point resolution of locals
//!
//! Locals may reference each other in any order. Each pass tries every local that is not yet
//! resolved against a context built from the current state. A success is recorded and the context
//! rebuilt right away, so locals later in the same pass already see the new value.
//!
//! The loop ends when a pass resolves nothing new or after `max_passes` passes. Locals left over
//! (cycles, missing variables, unsupported expressions) simply stay unresolved.
use crate::context::EvalContext;
use crate::declarations::Declarations;
use crate::value::Map;
use crate::value_store::ValueStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ResolutionStats {
    pub passes: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

/// Resolves as many locals as possible, returning the resolved values in declaration order
pub fn resolve_all(
    declarations: &mut Declarations,
    store: &ValueStore,
    max_passes: usize,
    max_depth: usize,
) -> (Map, ResolutionStats) {
    let mut resolved = Map::new();

    // literals need no context
    for (name, local) in declarations.locals() {
        if let Some(value) = &local.value {
            resolved.insert(name.clone(), value.clone());
        }
    }

    let mut context = EvalContext::build(declarations, store, &resolved, max_depth);
    let mut stats = ResolutionStats::default();
    let total = declarations.locals().count();

    while stats.passes < max_passes && resolved.len() < total {
        stats.passes += 1;
        let mut progress = false;

        for (name, local) in declarations.locals() {
            if resolved.contains_key(name) {
                continue;
            }

            match local.expression.evaluate(&context) {
                Ok(value) => {
                    tracing::trace!(local=%name, pass=stats.passes, "resolved");
                    resolved.insert(name.clone(), value);
                    context = EvalContext::build(declarations, store, &resolved, max_depth);
                    progress = true;
                }
                Err(error) => {
                    tracing::debug!(local=%name, pass=stats.passes, %error, "not resolved");
                }
            }
        }

        if !progress {
            break;
        }
    }

    // locals keep their resolved value
    let resolved_names = resolved
        .iter()
        .filter(|(name, _)| declarations.local(name).is_some_and(|l| l.value.is_none()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect::<Vec<_>>();
    for (name, value) in resolved_names {
        declarations.set_local_value(&name, value);
    }

    // declaration order, independent of resolve order
    let mut ordered = Map::new();
    for (name, _) in declarations.locals() {
        if let Some(value) = resolved.shift_remove(name) {
            ordered.insert(name.clone(), value);
        }
    }

    stats.resolved = ordered.len();
    stats.unresolved = total - ordered.len();
    tracing::debug!(
        passes = stats.passes,
        resolved = stats.resolved,
        unresolved = stats.unresolved,
        "local resolution finished"
    );

    (ordered, stats)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::DEFAULT_MAX_DEPTH;
    use crate::value::Value;
    use crate::value_store::Precedence;
    use pretty_assertions::assert_eq;

    fn resolve(text: &str, store: &ValueStore, max_passes: usize) -> (Declarations, Map, ResolutionStats) {
        let documents = crate::hcl_documents!(text);
        let (mut declarations, _) = Declarations::from_documents(&documents, DEFAULT_MAX_DEPTH);
        let (resolved, stats) = resolve_all(&mut declarations, store, max_passes, DEFAULT_MAX_DEPTH);
        (declarations, resolved, stats)
    }

    #[test]
    fn dependency_chains_converge() {
        let mut store = ValueStore::default();
        store.insert("x", "value".into(), Precedence::Override, "test");

        // declared in reverse dependency order
        let (declarations, resolved, stats) = resolve(
            "locals {\n  a = local.b\n  b = local.c\n  c = var.x\n}",
            &store,
            10,
        );

        assert_eq!(resolved.get("a"), Some(&Value::from("value")));
        assert_eq!(resolved.get("b"), Some(&Value::from("value")));
        assert_eq!(resolved.get("c"), Some(&Value::from("value")));
        assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(stats.unresolved, 0);
        // c, then b, then a
        assert_eq!(stats.passes, 3);
        assert_eq!(declarations.local("a").unwrap().value, Some(Value::from("value")));
    }

    #[test]
    fn forward_references_resolve_within_a_pass() {
        let (_, resolved, stats) = resolve(
            "locals {\n  base = \"shop\"\n  name = \"${local.base}-web\"\n  upper = upper(local.name)\n}",
            &ValueStore::default(),
            10,
        );
        assert_eq!(resolved.get("upper"), Some(&Value::from("SHOP-WEB")));
        assert_eq!(stats.passes, 1);
    }

    #[test]
    fn cycles_terminate_unresolved() {
        let (declarations, resolved, stats) = resolve(
            "locals {\n  a = local.b\n  b = local.a\n  ok = 1\n}",
            &ValueStore::default(),
            10,
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(stats.unresolved, 2);
        assert_eq!(stats.passes, 1);
        assert_eq!(declarations.local("a").unwrap().value, None);
    }

    #[test]
    fn pass_cap_is_respected() {
        let mut store = ValueStore::default();
        store.insert("x", "v".into(), Precedence::Override, "test");
        let (_, resolved, stats) = resolve(
            "locals {\n  a = local.b\n  b = local.c\n  c = var.x\n}",
            &store,
            1,
        );
        assert_eq!(stats.passes, 1);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.get("c"), Some(&Value::from("v")));
    }
}
