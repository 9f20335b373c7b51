//! stand-ins for static analysis
//!
//! Terraform resolves these from the running environment (clock, network layout, data sources).
//! None of that exists here, so every value below is a fixed placeholder. Expressions that branch
//! on them are evaluated against the placeholder, which is a known fidelity gap.
//!
//! | name | stand-in |
//! |------|----------|
//! | `timestamp()` | `2024-01-01T00:00:00Z` |
//! | `cidrhost(prefix, n)` | `10.0.0.1` |
//! | `can(expr)` | `true` when `expr` evaluates at all (an evaluation error still fails the call) |
//! | `try(a, b, ...)` | first non-null argument |
//! | `count.index` | `0` |
//! | `each.key` / `each.value` | `example_key` / `example_value` |
//! | `path.module` / `path.root` / `path.cwd` | `.` |
//! | `terraform.workspace` | `default` |
//! | `data.aws_caller_identity.current` | account `123456789012` |
//! | `data.aws_region.current` | `us-west-2` |
//! | `data.aws_availability_zones.available` | `us-west-2a`, `us-west-2b`, `us-west-2c` |
use super::utils::{ensure_numeric, ensure_string};
use super::{builtin, Arity, Builtin};
use crate::value::{Map, Value};

use std::collections::HashMap;

pub const TIMESTAMP: &str = "2024-01-01T00:00:00Z";
pub const CIDR_HOST: &str = "10.0.0.1";

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert("can", builtin!(can, Arity::Fixed(1)));
    m.insert("cidrhost", builtin!(cidrhost, Arity::Fixed(2)));
    m.insert("timestamp", builtin!(timestamp, Arity::Fixed(0)));
    m.insert("try", builtin!(try_, Arity::Variadic(0)));
}

fn timestamp(_args: &[Value]) -> Result<Value, String> {
    Ok(TIMESTAMP.into())
}

fn cidrhost(args: &[Value]) -> Result<Value, String> {
    ensure_string("cidrhost", &args[0])?;
    ensure_numeric("cidrhost", &args[1])?;
    Ok(CIDR_HOST.into())
}

fn can(_args: &[Value]) -> Result<Value, String> {
    Ok(true.into())
}

fn try_(args: &[Value]) -> Result<Value, String> {
    Ok(args
        .iter()
        .find(|arg| !arg.is_null())
        .cloned()
        .unwrap_or_default())
}

fn object<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect::<Map>(),
    )
}

/// Placeholder values for the meta-argument and data source namespaces
pub fn namespaces() -> Vec<(&'static str, Value)> {
    vec![
        ("count", object([("index", 0i64.into())])),
        (
            "each",
            object([("key", "example_key".into()), ("value", "example_value".into())]),
        ),
        (
            "path",
            object([("module", ".".into()), ("root", ".".into()), ("cwd", ".".into())]),
        ),
        ("terraform", object([("workspace", "default".into())])),
        (
            "data",
            object([
                (
                    "aws_caller_identity",
                    object([(
                        "current",
                        object([
                            ("account_id", "123456789012".into()),
                            ("arn", "arn:aws:iam::123456789012:user/terraform".into()),
                            ("user_id", "AIDAI1234567890EXAMPLE".into()),
                        ]),
                    )]),
                ),
                (
                    "aws_region",
                    object([(
                        "current",
                        object([
                            ("name", "us-west-2".into()),
                            ("endpoint", "ec2.us-west-2.amazonaws.com".into()),
                            ("description", "US West (Oregon)".into()),
                        ]),
                    )]),
                ),
                (
                    "aws_availability_zones",
                    object([(
                        "available",
                        object([
                            ("names", Value::from(vec!["us-west-2a", "us-west-2b", "us-west-2c"])),
                            ("zone_ids", Value::from(vec!["usw2-az1", "usw2-az2", "usw2-az3"])),
                            ("state", "available".into()),
                        ]),
                    )]),
                ),
            ]),
        ),
    ]
}

pub fn declare_namespaces(context: &mut hcl::eval::Context) {
    for (name, value) in namespaces() {
        context.declare_var(hcl::Identifier::unchecked(name), hcl::Value::from(value));
    }
}
