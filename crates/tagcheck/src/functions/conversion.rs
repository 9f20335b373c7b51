use super::utils::push_distinct;
use super::{builtin, Arity, Builtin};
use crate::value::{Number, Value};

use std::collections::HashMap;

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert("tobool", builtin!(tobool, Arity::Fixed(1)));
    m.insert("tolist", builtin!(tolist, Arity::Fixed(1)));
    m.insert("tomap", builtin!(tomap, Arity::Fixed(1)));
    m.insert("tonumber", builtin!(tonumber, Arity::Fixed(1)));
    m.insert("toset", builtin!(toset, Arity::Fixed(1)));
    m.insert("tostring", builtin!(tostring, Arity::Fixed(1)));
}

fn conversion_error(fcn: &str, v: &Value) -> String {
    format!("`{fcn}` cannot convert `{}` value", v.type_name())
}

/// Null stays null, collections cannot become strings
fn tostring(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::String(_) => Ok(args[0].clone()),
        Value::Bool(_) | Value::Number(_) => Ok(args[0].to_tag_string().into()),
        other => Err(conversion_error("tostring", other)),
    }
}

fn tonumber(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::Number(_) => Ok(args[0].clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(int) = s.parse::<i64>() {
                return Ok(int.into());
            }
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| Value::Number(Number::Decimal(f)))
                .ok_or_else(|| format!("`tonumber` cannot convert `{s}` to a number"))
        }
        other => Err(conversion_error("tonumber", other)),
    }
}

fn tobool(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::Bool(_) => Ok(args[0].clone()),
        Value::String(s) if s == "true" => Ok(true.into()),
        Value::String(s) if s == "false" => Ok(false.into()),
        other => Err(conversion_error("tobool", other)),
    }
}

fn tolist(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Null | Value::List(_) => Ok(args[0].clone()),
        other => Err(conversion_error("tolist", other)),
    }
}

fn tomap(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Null | Value::Map(_) => Ok(args[0].clone()),
        other => Err(conversion_error("tomap", other)),
    }
}

/// Sets are represented as lists without duplicates
fn toset(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::List(list) => {
            let mut result = vec![];
            for elem in list {
                push_distinct(&mut result, elem.clone());
            }
            Ok(Value::List(result))
        }
        other => Err(conversion_error("toset", other)),
    }
}
