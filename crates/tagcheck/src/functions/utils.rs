//! argument helpers shared by the builtins
use crate::value::{Map, Number, Value};

pub fn ensure_args_count(fcn: &str, args: &[Value], min: usize, max: usize) -> Result<(), String> {
    if args.len() < min || args.len() > max {
        if min == max {
            return Err(format!("`{fcn}` expects {min} arguments"));
        }
        return Err(format!("`{fcn}` expects {min} to {max} arguments"));
    }
    Ok(())
}

pub fn ensure_string<'a>(fcn: &str, v: &'a Value) -> Result<&'a str, String> {
    match v {
        Value::String(s) => Ok(s),
        _ => Err(format!(
            "`{fcn}` expects string argument. Got `{}` instead",
            v.type_name()
        )),
    }
}

/// Strings as-is, numbers and booleans in their literal form
pub fn ensure_primitive_string(fcn: &str, v: &Value) -> Result<String, String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(_) | Value::Bool(_) => Ok(v.to_tag_string()),
        _ => Err(format!(
            "`{fcn}` expects string argument. Got `{}` instead",
            v.type_name()
        )),
    }
}

pub fn ensure_numeric(fcn: &str, v: &Value) -> Result<Number, String> {
    match v {
        Value::Number(n) => Ok(*n),
        _ => Err(format!(
            "`{fcn}` expects numeric argument. Got `{}` instead",
            v.type_name()
        )),
    }
}

pub fn ensure_integer(fcn: &str, v: &Value) -> Result<i64, String> {
    ensure_numeric(fcn, v)?
        .as_i64()
        .ok_or_else(|| format!("`{fcn}` expects integer argument. Got `{v}` instead"))
}

pub fn ensure_bool(fcn: &str, v: &Value) -> Result<bool, String> {
    match v {
        Value::Bool(b) => Ok(*b),
        _ => Err(format!(
            "`{fcn}` expects boolean argument. Got `{}` instead",
            v.type_name()
        )),
    }
}

pub fn ensure_list<'a>(fcn: &str, v: &'a Value) -> Result<&'a [Value], String> {
    match v {
        Value::List(list) => Ok(list),
        _ => Err(format!(
            "`{fcn}` expects list argument. Got `{}` instead",
            v.type_name()
        )),
    }
}

pub fn ensure_map<'a>(fcn: &str, v: &'a Value) -> Result<&'a Map, String> {
    match v {
        Value::Map(map) => Ok(map),
        _ => Err(format!(
            "`{fcn}` expects map argument. Got `{}` instead",
            v.type_name()
        )),
    }
}

pub fn ensure_string_list(fcn: &str, v: &Value) -> Result<Vec<String>, String> {
    ensure_list(fcn, v)?
        .iter()
        .enumerate()
        .map(|(idx, elem)| {
            ensure_primitive_string(fcn, elem)
                .map_err(|_| format!("`{fcn}` expects string collection. Element {idx} is not a string."))
        })
        .collect()
}

/// Pushes `value` unless an equal value is already present
pub fn push_distinct(list: &mut Vec<Value>, value: Value) {
    if !list.contains(&value) {
        list.push(value);
    }
}
