//! function library
//!
//! A fixed registry `name -> function`, modelled after the Terraform built-ins that commonly show
//! up in locals and tag expressions. Every function is pure and operates on [Value]s only.
//!
//! Functions in [placeholders] depend on an execution environment that does not exist during
//! static analysis (clock, network layout, "would this evaluate"). They return fixed values and
//! are stand-ins, not real implementations.
pub mod collections;
pub mod conversion;
pub mod datetime;
pub mod encoding;
pub mod numeric;
pub mod placeholders;
pub mod strings;
pub mod utils;

use crate::value::Value;
use hcl::eval::{Context, FuncDef, ParamType};
use lazy_static::lazy_static;
use std::collections::HashMap;

pub type BuiltinFcn = fn(&[Value]) -> Result<Value, String>;

/// Number of parameters a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// the given number of leading parameters followed by any number of variadic ones
    Variadic(usize),
}

pub struct Builtin {
    pub fcn: BuiltinFcn,
    pub arity: Arity,
    /// evaluator entry point, converts arguments and result
    pub adapter: hcl::eval::Func,
}

impl Builtin {
    fn func_def(&self) -> FuncDef {
        let (fixed, variadic) = match self.arity {
            Arity::Fixed(count) => (count, false),
            Arity::Variadic(count) => (count, true),
        };

        let mut builder = FuncDef::builder();
        for _ in 0..fixed {
            builder = builder.param(ParamType::Any);
        }
        if variadic {
            builder = builder.variadic_param(ParamType::Any);
        }

        builder.build(self.adapter)
    }
}

/// Creates a [Builtin] for a [BuiltinFcn]
macro_rules! builtin {
    ($fcn:ident, $arity:expr) => {{
        fn adapter(args: hcl::eval::FuncArgs) -> Result<hcl::Value, String> {
            let args: Vec<$crate::value::Value> = args.iter().cloned().map(Into::into).collect();
            $fcn(&args).map(Into::into)
        }

        $crate::functions::Builtin {
            fcn: $fcn,
            arity: $arity,
            adapter,
        }
    }};
}
pub(crate) use builtin;

#[rustfmt::skip]
lazy_static! {
    pub static ref BUILTINS: HashMap<&'static str, Builtin> = {
	let mut m: HashMap<&'static str, Builtin> = HashMap::new();

	strings::register(&mut m);
	collections::register(&mut m);
	numeric::register(&mut m);
	conversion::register(&mut m);
	encoding::register(&mut m);
	datetime::register(&mut m);
	placeholders::register(&mut m);

	m
    };
}

/// Declares every builtin in an evaluator context
pub fn declare(context: &mut Context) {
    for (name, builtin) in BUILTINS.iter() {
        context.declare_func(hcl::Identifier::unchecked(*name), builtin.func_def());
    }
}

/// Calls a builtin directly, checking the argument count like the evaluator would
pub fn call(name: &str, args: &[Value]) -> Result<Value, String> {
    let builtin = BUILTINS
        .get(name)
        .ok_or_else(|| format!("unknown function `{name}`"))?;

    match builtin.arity {
        Arity::Fixed(count) if args.len() != count => {
            return Err(format!("`{name}` expects {count} arguments, got {}", args.len()))
        }
        Arity::Variadic(count) if args.len() < count => {
            return Err(format!(
                "`{name}` expects at least {count} arguments, got {}",
                args.len()
            ))
        }
        _ => {}
    }

    (builtin.fcn)(args)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn registry_contains_all_categories() {
        for name in [
            "join", "merge", "max", "tostring", "jsonencode", "formatdate", "timestamp", "can",
        ] {
            assert!(BUILTINS.contains_key(name), "{name} missing");
        }
    }

    #[test]
    fn arity_is_checked() {
        assert!(call("upper", &[]).is_err());
        assert!(call("nope", &[]).is_err());
        assert_eq!(call("upper", &["a".into()]).unwrap(), Value::from("A"));
    }
}
