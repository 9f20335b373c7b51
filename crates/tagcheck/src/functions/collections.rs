use super::utils::{
    ensure_args_count, ensure_bool, ensure_integer, ensure_list, ensure_map, ensure_numeric,
    ensure_primitive_string, ensure_string, push_distinct,
};
use super::{builtin, Arity, Builtin};
use crate::value::{Map, Number, Value};

use std::collections::HashMap;

/// Upper bound for `range` results
const MAX_RANGE_LEN: usize = 1 << 20;

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert("alltrue", builtin!(alltrue, Arity::Fixed(1)));
    m.insert("anytrue", builtin!(anytrue, Arity::Fixed(1)));
    m.insert("chunklist", builtin!(chunklist, Arity::Fixed(2)));
    m.insert("coalesce", builtin!(coalesce, Arity::Variadic(0)));
    m.insert("coalescelist", builtin!(coalescelist, Arity::Variadic(0)));
    m.insert("compact", builtin!(compact, Arity::Fixed(1)));
    m.insert("concat", builtin!(concat, Arity::Variadic(0)));
    m.insert("contains", builtin!(contains, Arity::Fixed(2)));
    m.insert("distinct", builtin!(distinct, Arity::Fixed(1)));
    m.insert("element", builtin!(element, Arity::Fixed(2)));
    m.insert("flatten", builtin!(flatten, Arity::Fixed(1)));
    m.insert("index", builtin!(index, Arity::Fixed(2)));
    m.insert("keys", builtin!(keys, Arity::Fixed(1)));
    m.insert("length", builtin!(length, Arity::Fixed(1)));
    m.insert("lookup", builtin!(lookup, Arity::Variadic(2)));
    m.insert("merge", builtin!(merge, Arity::Variadic(0)));
    m.insert("one", builtin!(one, Arity::Fixed(1)));
    m.insert("range", builtin!(range, Arity::Variadic(1)));
    m.insert("reverse", builtin!(reverse, Arity::Fixed(1)));
    m.insert("setintersection", builtin!(setintersection, Arity::Variadic(1)));
    m.insert("setsubtract", builtin!(setsubtract, Arity::Fixed(2)));
    m.insert("setunion", builtin!(setunion, Arity::Variadic(1)));
    m.insert("slice", builtin!(slice, Arity::Fixed(3)));
    m.insert("sort", builtin!(sort, Arity::Fixed(1)));
    m.insert("sum", builtin!(sum, Arity::Fixed(1)));
    m.insert("values", builtin!(values, Arity::Fixed(1)));
    m.insert("zipmap", builtin!(zipmap, Arity::Fixed(2)));
}

fn alltrue(args: &[Value]) -> Result<Value, String> {
    let mut result = true;
    for elem in ensure_list("alltrue", &args[0])? {
        result &= ensure_bool("alltrue", elem)?;
    }
    Ok(result.into())
}

fn anytrue(args: &[Value]) -> Result<Value, String> {
    let mut result = false;
    for elem in ensure_list("anytrue", &args[0])? {
        result |= ensure_bool("anytrue", elem)?;
    }
    Ok(result.into())
}

fn chunklist(args: &[Value]) -> Result<Value, String> {
    let list = ensure_list("chunklist", &args[0])?;
    let size = ensure_integer("chunklist", &args[1])?;
    if size < 0 {
        return Err("`chunklist` expects a non-negative chunk size".to_string());
    }

    if size == 0 {
        return Ok(Value::List(vec![Value::List(list.to_vec())]));
    }

    Ok(Value::List(
        list.chunks(size as usize)
            .map(|chunk| Value::List(chunk.to_vec()))
            .collect(),
    ))
}

/// First argument that is neither null nor an empty string
fn coalesce(args: &[Value]) -> Result<Value, String> {
    args.iter()
        .find(|arg| !arg.is_null() && arg.as_str() != Some(""))
        .cloned()
        .ok_or_else(|| "`coalesce` no non-null, non-empty-string arguments".to_string())
}

fn coalescelist(args: &[Value]) -> Result<Value, String> {
    for arg in args {
        if !ensure_list("coalescelist", arg)?.is_empty() {
            return Ok(arg.clone());
        }
    }
    Err("`coalescelist` no non-empty list arguments".to_string())
}

fn compact(args: &[Value]) -> Result<Value, String> {
    Ok(Value::List(
        ensure_list("compact", &args[0])?
            .iter()
            .filter(|elem| !elem.is_null() && elem.as_str() != Some(""))
            .cloned()
            .collect(),
    ))
}

fn concat(args: &[Value]) -> Result<Value, String> {
    let mut result = vec![];
    for arg in args {
        result.extend(ensure_list("concat", arg)?.iter().cloned());
    }
    Ok(Value::List(result))
}

fn contains(args: &[Value]) -> Result<Value, String> {
    Ok(ensure_list("contains", &args[0])?.contains(&args[1]).into())
}

fn distinct(args: &[Value]) -> Result<Value, String> {
    let mut result = vec![];
    for elem in ensure_list("distinct", &args[0])? {
        push_distinct(&mut result, elem.clone());
    }
    Ok(Value::List(result))
}

/// Index wraps around the end of the list
fn element(args: &[Value]) -> Result<Value, String> {
    let list = ensure_list("element", &args[0])?;
    let index = ensure_integer("element", &args[1])?;
    if list.is_empty() {
        return Err("`element` cannot use an empty list".to_string());
    }
    if index < 0 {
        return Err("`element` expects a non-negative index".to_string());
    }
    Ok(list[index as usize % list.len()].clone())
}

fn flatten(args: &[Value]) -> Result<Value, String> {
    fn flatten_into(list: &[Value], out: &mut Vec<Value>) {
        for elem in list {
            match elem {
                Value::List(inner) => flatten_into(inner, out),
                other => out.push(other.clone()),
            }
        }
    }

    let mut result = vec![];
    flatten_into(ensure_list("flatten", &args[0])?, &mut result);
    Ok(Value::List(result))
}

fn index(args: &[Value]) -> Result<Value, String> {
    ensure_list("index", &args[0])?
        .iter()
        .position(|elem| elem == &args[1])
        .map(|idx| Value::from(idx as i64))
        .ok_or_else(|| "`index` item not found".to_string())
}

/// Keys in lexicographic order
fn keys(args: &[Value]) -> Result<Value, String> {
    let mut keys: Vec<&String> = ensure_map("keys", &args[0])?.keys().collect();
    keys.sort();
    Ok(Value::List(keys.into_iter().map(|k| k.as_str().into()).collect()))
}

/// Values in the lexicographic order of their keys
fn values(args: &[Value]) -> Result<Value, String> {
    let mut entries: Vec<(&String, &Value)> = ensure_map("values", &args[0])?.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    Ok(Value::List(entries.into_iter().map(|(_, v)| v.clone()).collect()))
}

fn length(args: &[Value]) -> Result<Value, String> {
    let len = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::List(list) => list.len(),
        Value::Map(map) => map.len(),
        other => {
            return Err(format!(
                "`length` expects a string, list or map. Got `{}` instead",
                other.type_name()
            ))
        }
    };
    Ok(Value::from(len as i64))
}

fn lookup(args: &[Value]) -> Result<Value, String> {
    ensure_args_count("lookup", args, 2, 3)?;
    let map = ensure_map("lookup", &args[0])?;
    let key = ensure_primitive_string("lookup", &args[1])?;

    match (map.get(&key), args.get(2)) {
        (Some(value), _) => Ok(value.clone()),
        (None, Some(default)) => Ok(default.clone()),
        (None, None) => Err(format!("`lookup` key `{key}` not found")),
    }
}

/// Later maps win, null arguments are skipped
fn merge(args: &[Value]) -> Result<Value, String> {
    let mut result = Map::new();
    for arg in args.iter().filter(|arg| !arg.is_null()) {
        for (key, value) in ensure_map("merge", arg)? {
            result.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Map(result))
}

fn one(args: &[Value]) -> Result<Value, String> {
    match ensure_list("one", &args[0])? {
        [] => Ok(Value::Null),
        [single] => Ok(single.clone()),
        _ => Err("`one` expects a list with at most one element".to_string()),
    }
}

/// `range(limit)`, `range(start, limit)` or `range(start, limit, step)`
fn range(args: &[Value]) -> Result<Value, String> {
    let name = "range";
    ensure_args_count(name, args, 1, 3)?;
    let numbers = args
        .iter()
        .map(|arg| ensure_numeric(name, arg).map(|n| n.as_f64()))
        .collect::<Result<Vec<f64>, String>>()?;

    let (start, limit, step) = match numbers.as_slice() {
        [limit] => (0.0, *limit, 1.0),
        [start, limit] => (*start, *limit, if limit < start { -1.0 } else { 1.0 }),
        [start, limit, step] => (*start, *limit, *step),
        _ => return Err(format!("`{name}` expects 1 to 3 arguments")),
    };

    if step == 0.0 {
        return Err(format!("`{name}` step must not be zero"));
    }
    if (step > 0.0 && limit < start) || (step < 0.0 && limit > start) {
        return Err(format!("`{name}` step points away from the limit"));
    }

    let mut result = vec![];
    let mut current = start;
    while (step > 0.0 && current < limit) || (step < 0.0 && current > limit) {
        if result.len() >= MAX_RANGE_LEN {
            return Err(format!("`{name}` more than {MAX_RANGE_LEN} elements"));
        }
        result.push(Value::Number(Number::normalized(current)));
        current += step;
    }
    Ok(Value::List(result))
}

fn reverse(args: &[Value]) -> Result<Value, String> {
    let mut list = ensure_list("reverse", &args[0])?.to_vec();
    list.reverse();
    Ok(Value::List(list))
}

fn setintersection(args: &[Value]) -> Result<Value, String> {
    let first = ensure_list("setintersection", &args[0])?;
    let rest = args[1..]
        .iter()
        .map(|arg| ensure_list("setintersection", arg))
        .collect::<Result<Vec<_>, _>>()?;

    let mut result = vec![];
    for elem in first {
        if rest.iter().all(|set| set.contains(elem)) {
            push_distinct(&mut result, elem.clone());
        }
    }
    Ok(Value::List(result))
}

fn setsubtract(args: &[Value]) -> Result<Value, String> {
    let a = ensure_list("setsubtract", &args[0])?;
    let b = ensure_list("setsubtract", &args[1])?;

    let mut result = vec![];
    for elem in a.iter().filter(|elem| !b.contains(elem)) {
        push_distinct(&mut result, elem.clone());
    }
    Ok(Value::List(result))
}

fn setunion(args: &[Value]) -> Result<Value, String> {
    let mut result = vec![];
    for arg in args {
        for elem in ensure_list("setunion", arg)? {
            push_distinct(&mut result, elem.clone());
        }
    }
    Ok(Value::List(result))
}

/// Elements from `start` (inclusive) to `end` (exclusive)
fn slice(args: &[Value]) -> Result<Value, String> {
    let list = ensure_list("slice", &args[0])?;
    let start = ensure_integer("slice", &args[1])?;
    let end = ensure_integer("slice", &args[2])?;

    if start < 0 || end < start || end as usize > list.len() {
        return Err(format!(
            "`slice` indices {start}..{end} out of range for list of length {}",
            list.len()
        ));
    }
    Ok(Value::List(list[start as usize..end as usize].to_vec()))
}

/// Lexicographic sort of strings
fn sort(args: &[Value]) -> Result<Value, String> {
    let mut items = ensure_list("sort", &args[0])?
        .iter()
        .map(|elem| ensure_primitive_string("sort", elem))
        .collect::<Result<Vec<String>, String>>()?;
    items.sort();
    Ok(Value::List(items.into_iter().map(Value::from).collect()))
}

fn sum(args: &[Value]) -> Result<Value, String> {
    let list = ensure_list("sum", &args[0])?;
    if list.is_empty() {
        return Err("`sum` cannot sum an empty list".to_string());
    }

    let numbers = list
        .iter()
        .map(|elem| ensure_numeric("sum", elem))
        .collect::<Result<Vec<Number>, String>>()?;

    let integers: Option<Vec<i64>> = numbers
        .iter()
        .map(|n| match n {
            Number::Integer(int) => Some(*int),
            Number::Decimal(_) => None,
        })
        .collect();

    if let Some(total) = integers.and_then(|ints| ints.into_iter().try_fold(0i64, i64::checked_add)) {
        return Ok(total.into());
    }

    Ok(Value::Number(Number::normalized(
        numbers.iter().map(Number::as_f64).sum(),
    )))
}

fn zipmap(args: &[Value]) -> Result<Value, String> {
    let keys = ensure_list("zipmap", &args[0])?;
    let values = ensure_list("zipmap", &args[1])?;
    if keys.len() != values.len() {
        return Err(format!(
            "`zipmap` got {} keys and {} values",
            keys.len(),
            values.len()
        ));
    }

    let mut result = Map::new();
    for (key, value) in keys.iter().zip(values) {
        result.insert(ensure_string("zipmap", key)?.to_string(), value.clone());
    }
    Ok(Value::Map(result))
}

#[cfg(test)]
mod test {
    use crate::functions::call;
    use crate::value::{Map, Value};
    use pretty_assertions::assert_eq;

    fn list(items: &[&str]) -> Value {
        Value::from(items.to_vec())
    }

    fn map(entries: &[(&str, &str)]) -> Value {
        Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), Value::from(*v)))
                .collect::<Map>(),
        )
    }

    #[test]
    fn merge_later_wins() {
        let merged = call(
            "merge",
            &[map(&[("Owner", "a"), ("Env", "dev")]), Value::Null, map(&[("Owner", "b")])],
        )
        .unwrap();
        assert_eq!(merged, map(&[("Owner", "b"), ("Env", "dev")]));
    }

    #[test]
    fn lookup_with_and_without_default() {
        let m = map(&[("a", "1")]);
        assert_eq!(call("lookup", &[m.clone(), "a".into()]).unwrap(), Value::from("1"));
        assert_eq!(call("lookup", &[m.clone(), "b".into(), "x".into()]).unwrap(), Value::from("x"));
        assert!(call("lookup", &[m, "b".into()]).is_err());
    }

    #[test]
    fn set_operations() {
        assert_eq!(
            call("setunion", &[list(&["a", "b"]), list(&["b", "c"])]).unwrap(),
            list(&["a", "b", "c"])
        );
        assert_eq!(
            call("setintersection", &[list(&["a", "b"]), list(&["b", "c"])]).unwrap(),
            list(&["b"])
        );
        assert_eq!(
            call("setsubtract", &[list(&["a", "b"]), list(&["b"])]).unwrap(),
            list(&["a"])
        );
    }

    #[test]
    fn ranges() {
        assert_eq!(call("range", &[3i64.into()]).unwrap(), Value::from(vec![0i64, 1, 2]));
        assert_eq!(
            call("range", &[5i64.into(), 1i64.into()]).unwrap(),
            Value::from(vec![5i64, 4, 3, 2])
        );
        assert_eq!(
            call("range", &[0i64.into(), 10i64.into(), 5i64.into()]).unwrap(),
            Value::from(vec![0i64, 5])
        );
        assert!(call("range", &[1i64.into(), 2i64.into(), 0i64.into()]).is_err());
    }

    #[test]
    fn list_access() {
        assert_eq!(call("element", &[list(&["a", "b"]), 3i64.into()]).unwrap(), Value::from("b"));
        assert_eq!(call("index", &[list(&["a", "b"]), "b".into()]).unwrap(), Value::from(1i64));
        assert_eq!(
            call("slice", &[list(&["a", "b", "c"]), 1i64.into(), 3i64.into()]).unwrap(),
            list(&["b", "c"])
        );
        assert_eq!(call("one", &[list(&[])]).unwrap(), Value::Null);
        assert_eq!(
            call("flatten", &[Value::List(vec![list(&["a"]), Value::List(vec![list(&["b"])])])]).unwrap(),
            list(&["a", "b"])
        );
    }

    #[test]
    fn keys_are_sorted() {
        let m = map(&[("b", "2"), ("a", "1")]);
        assert_eq!(call("keys", &[m.clone()]).unwrap(), list(&["a", "b"]));
        assert_eq!(call("values", &[m]).unwrap(), list(&["1", "2"]));
    }

    #[test]
    fn coalescing() {
        assert_eq!(
            call("coalesce", &[Value::Null, "".into(), "x".into()]).unwrap(),
            Value::from("x")
        );
        assert_eq!(call("compact", &[list(&["a", "", "b"])]).unwrap(), list(&["a", "b"]));
        assert!(call("coalesce", &[]).is_err());
    }

    #[test]
    fn sums_and_lengths() {
        assert_eq!(call("sum", &[Value::from(vec![1i64, 2, 3])]).unwrap(), Value::from(6i64));
        assert_eq!(call("sum", &[Value::from(vec![0.5, 1.0])]).unwrap(), Value::from(1.5));
        assert_eq!(call("length", &["héllo".into()]).unwrap(), Value::from(5i64));
        assert_eq!(
            call("zipmap", &[list(&["a"]), list(&["1"])]).unwrap(),
            map(&[("a", "1")])
        );
    }
}
