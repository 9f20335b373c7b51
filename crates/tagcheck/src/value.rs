//! value representation
//!
//! Every value that flows through the value store, the evaluation context and the resolver is a
//! [Value]. The model contains the following data types
//! - null
//! - boolean (true/false)
//! - number (integer `i64` or decimal `f64`, see [Number])
//! - string (utf-8)
//! - list (ordered sequence of values)
//! - map (order-preserving "dictionary", where the key is of type string)
//!
//! All conversions from and to the evaluator ([hcl::Value]) and from JSON ([serde_json::Value])
//! are total. There is no implicit coercion between variants; functions that accept "anything
//! string-like" have to ask for it explicitly via [Value::to_tag_string].
use indexmap::IndexMap;
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

pub type Map = IndexMap<String, Value>;

/// All possible value types
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    Map(Map),
}

/// Numeric value
///
/// The only implicit numeric conversion: every integer is also a decimal.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Integer(i64),
    Decimal(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(int) => *int as f64,
            Number::Decimal(dec) => *dec,
        }
    }

    /// Integer view of this number, `None` for decimals with a fractional part
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(int) => Some(*int),
            Number::Decimal(dec) if dec.fract() == 0.0 && dec.is_finite() => Some(*dec as i64),
            Number::Decimal(_) => None,
        }
    }

    /// Collapses whole decimals into integers
    pub fn normalized(value: f64) -> Self {
        if value.fract() == 0.0 && value.is_finite() && value.abs() < i64::MAX as f64 {
            Number::Integer(value as i64)
        } else {
            Number::Decimal(value)
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Integer(int) => write!(f, "{int}"),
            Number::Decimal(dec) => write!(f, "{dec}"),
        }
    }
}

impl Value {
    /// Name of the variant, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Renders a value the way it would appear as a tag value
    ///
    /// Strings are emitted verbatim, scalars in their literal form and collections as JSON.
    pub fn to_tag_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::List(_) | Value::Map(_) => {
                serde_json::to_string(self).unwrap_or_else(|_| self.type_name().to_string())
            }
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_tag_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Integer(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Decimal(value))
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Map(value)
    }
}

impl From<hcl::Number> for Number {
    fn from(value: hcl::Number) -> Self {
        if let Some(int) = value.as_i64() {
            return Number::Integer(int);
        }

        match value.as_f64() {
            Some(dec) => Number::Decimal(dec),
            // u64 beyond the i64 range
            None => Number::Decimal(value.to_string().parse().unwrap_or(f64::MAX)),
        }
    }
}

impl From<hcl::Value> for Value {
    fn from(value: hcl::Value) -> Value {
        match value {
            hcl::Value::Null => Value::Null,
            hcl::Value::Bool(b) => b.into(),
            hcl::Value::Number(n) => Value::Number(n.into()),
            hcl::Value::String(s) => s.into(),
            hcl::Value::Array(a) => Value::List(a.into_iter().map(Into::into).collect()),
            hcl::Value::Object(o) => Value::Map(o.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl From<Value> for hcl::Value {
    fn from(value: Value) -> hcl::Value {
        match value {
            Value::Null => hcl::Value::Null,
            Value::Bool(b) => hcl::Value::Bool(b),
            Value::Number(Number::Integer(int)) => hcl::Value::Number(int.into()),
            // NaN and infinity have no representation in the evaluator
            Value::Number(Number::Decimal(dec)) => hcl::Number::from_f64(dec)
                .map(hcl::Value::Number)
                .unwrap_or(hcl::Value::Null),
            Value::String(s) => hcl::Value::String(s),
            Value::List(list) => hcl::Value::Array(list.into_iter().map(Into::into).collect()),
            Value::Map(map) => {
                hcl::Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => b.into(),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(int) => int.into(),
                None => Value::Number(Number::Decimal(n.as_f64().unwrap_or(f64::MAX))),
            },
            serde_json::Value::String(s) => s.into(),
            serde_json::Value::Array(a) => Value::List(a.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(o) => {
                Value::Map(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => b.into(),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(int) => int.into(),
                None => Value::Number(Number::Decimal(n.as_f64().unwrap_or(f64::MAX))),
            },
            serde_yaml::Value::String(s) => s.into(),
            serde_yaml::Value::Sequence(seq) => {
                Value::List(seq.into_iter().map(Into::into).collect())
            }
            serde_yaml::Value::Mapping(mapping) => Value::Map(
                mapping
                    .into_iter()
                    .map(|(k, v)| (Value::from(k).to_tag_string(), v.into()))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => tagged.value.into(),
        }
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Number(Number::Integer(value)) => serializer.serialize_i64(*value),
            Value::Number(Number::Decimal(value)) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::List(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Map(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hcl_conversion_keeps_integers() {
        let value: Value = hcl::Value::Number(42i64.into()).into();
        assert_eq!(value, Value::Number(Number::Integer(42)));
        assert_eq!(hcl::Value::from(value), hcl::Value::Number(42i64.into()));
    }

    #[test]
    fn non_finite_decimal_becomes_null() {
        assert_eq!(hcl::Value::from(Value::from(f64::NAN)), hcl::Value::Null);
    }

    #[test]
    fn tag_string_rendering() {
        assert_eq!(Value::from("web").to_tag_string(), "web");
        assert_eq!(Value::from(7.0).to_tag_string(), "7");
        assert_eq!(Value::from(true).to_tag_string(), "true");

        let mut map = Map::new();
        map.insert("a".into(), Value::from(vec![1i64, 2]));
        assert_eq!(Value::Map(map).to_tag_string(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn integer_and_decimal_compare_equal() {
        assert_eq!(Number::Integer(3), Number::Decimal(3.0));
        assert_eq!(Number::normalized(3.0), Number::Integer(3));
        assert_eq!(Number::Decimal(2.5).as_i64(), None);
    }
}
