use super::utils::ensure_string;
use super::{builtin, Arity, Builtin};
use crate::value::Value;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashMap;

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert("base64decode", builtin!(base64decode, Arity::Fixed(1)));
    m.insert("base64encode", builtin!(base64encode, Arity::Fixed(1)));
    m.insert("jsondecode", builtin!(jsondecode, Arity::Fixed(1)));
    m.insert("jsonencode", builtin!(jsonencode, Arity::Fixed(1)));
    m.insert("yamldecode", builtin!(yamldecode, Arity::Fixed(1)));
    m.insert("yamlencode", builtin!(yamlencode, Arity::Fixed(1)));
}

fn base64encode(args: &[Value]) -> Result<Value, String> {
    let s = ensure_string("base64encode", &args[0])?;
    Ok(STANDARD.encode(s).into())
}

fn base64decode(args: &[Value]) -> Result<Value, String> {
    let name = "base64decode";
    let encoded = ensure_string(name, &args[0])?;
    let decoded = STANDARD
        .decode(encoded)
        .map_err(|e| format!("`{name}` failed to decode: {e}"))?;
    String::from_utf8(decoded)
        .map(Value::from)
        .map_err(|_| format!("`{name}` the decoded result is not valid UTF-8"))
}

fn jsonencode(args: &[Value]) -> Result<Value, String> {
    serde_json::to_string(&args[0])
        .map(Value::from)
        .map_err(|e| format!("`jsonencode` failed: {e}"))
}

fn jsondecode(args: &[Value]) -> Result<Value, String> {
    let s = ensure_string("jsondecode", &args[0])?;
    serde_json::from_str::<serde_json::Value>(s)
        .map(Value::from)
        .map_err(|e| format!("`jsondecode` failed: {e}"))
}

fn yamlencode(args: &[Value]) -> Result<Value, String> {
    serde_yaml::to_string(&args[0])
        .map(Value::from)
        .map_err(|e| format!("`yamlencode` failed: {e}"))
}

fn yamldecode(args: &[Value]) -> Result<Value, String> {
    let s = ensure_string("yamldecode", &args[0])?;
    serde_yaml::from_str::<serde_yaml::Value>(s)
        .map(Value::from)
        .map_err(|e| format!("`yamldecode` failed: {e}"))
}

#[cfg(test)]
mod test {
    use crate::functions::call;
    use crate::value::{Map, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn json_keeps_key_order() {
        let mut map = Map::new();
        map.insert("b".into(), 1i64.into());
        map.insert("a".into(), Value::from(vec!["x"]));
        let encoded = call("jsonencode", &[Value::Map(map.clone())]).unwrap();
        assert_eq!(encoded, Value::from(r#"{"b":1,"a":["x"]}"#));
        assert_eq!(call("jsondecode", &[encoded]).unwrap(), Value::Map(map));
    }

    #[test]
    fn yaml_decoding() {
        let decoded = call("yamldecode", &["team: platform\nsize: 3\n".into()]).unwrap();
        let mut expected = Map::new();
        expected.insert("team".into(), "platform".into());
        expected.insert("size".into(), 3i64.into());
        assert_eq!(decoded, Value::Map(expected));
    }

    #[test]
    fn base64() {
        assert_eq!(call("base64encode", &["hello".into()]).unwrap(), Value::from("aGVsbG8="));
        assert_eq!(call("base64decode", &["aGVsbG8=".into()]).unwrap(), Value::from("hello"));
        assert!(call("base64decode", &["%%%".into()]).is_err());
    }
}
