use super::utils::{
    ensure_bool, ensure_integer, ensure_numeric, ensure_primitive_string, ensure_string,
    ensure_string_list,
};
use super::{builtin, Arity, Builtin};
use crate::value::{Map, Value};

use std::collections::HashMap;

/// Upper bound for widths, precisions and `indent` spaces
const MAX_PADDING: usize = 1 << 16;

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert("chomp", builtin!(chomp, Arity::Fixed(1)));
    m.insert("endswith", builtin!(endswith, Arity::Fixed(2)));
    m.insert("format", builtin!(format, Arity::Variadic(1)));
    m.insert("formatlist", builtin!(formatlist, Arity::Variadic(1)));
    m.insert("indent", builtin!(indent, Arity::Fixed(2)));
    m.insert("join", builtin!(join, Arity::Variadic(1)));
    m.insert("lower", builtin!(lower, Arity::Fixed(1)));
    m.insert("regex", builtin!(regex, Arity::Fixed(2)));
    m.insert("regexall", builtin!(regexall, Arity::Fixed(2)));
    m.insert("replace", builtin!(replace, Arity::Fixed(3)));
    m.insert("split", builtin!(split, Arity::Fixed(2)));
    m.insert("startswith", builtin!(startswith, Arity::Fixed(2)));
    m.insert("strcontains", builtin!(strcontains, Arity::Fixed(2)));
    m.insert("strrev", builtin!(strrev, Arity::Fixed(1)));
    m.insert("substr", builtin!(substr, Arity::Fixed(3)));
    m.insert("title", builtin!(title, Arity::Fixed(1)));
    m.insert("trim", builtin!(trim, Arity::Fixed(2)));
    m.insert("trimprefix", builtin!(trimprefix, Arity::Fixed(2)));
    m.insert("trimspace", builtin!(trimspace, Arity::Fixed(1)));
    m.insert("trimsuffix", builtin!(trimsuffix, Arity::Fixed(2)));
    m.insert("upper", builtin!(upper, Arity::Fixed(1)));
}

fn chomp(args: &[Value]) -> Result<Value, String> {
    let s = ensure_string("chomp", &args[0])?;
    Ok(s.trim_end_matches(['\r', '\n']).into())
}

fn endswith(args: &[Value]) -> Result<Value, String> {
    let s = ensure_string("endswith", &args[0])?;
    let suffix = ensure_string("endswith", &args[1])?;
    Ok(s.ends_with(suffix).into())
}

fn startswith(args: &[Value]) -> Result<Value, String> {
    let s = ensure_string("startswith", &args[0])?;
    let prefix = ensure_string("startswith", &args[1])?;
    Ok(s.starts_with(prefix).into())
}

fn strcontains(args: &[Value]) -> Result<Value, String> {
    let s = ensure_string("strcontains", &args[0])?;
    let substr = ensure_string("strcontains", &args[1])?;
    Ok(s.contains(substr).into())
}

fn format(args: &[Value]) -> Result<Value, String> {
    let spec = ensure_string("format", &args[0])?;
    Ok(format_values("format", spec, &args[1..])?.into())
}

/// `format` applied element-wise; list arguments must share one length, scalars repeat
fn formatlist(args: &[Value]) -> Result<Value, String> {
    let name = "formatlist";
    let spec = ensure_string(name, &args[0])?;
    let rest = &args[1..];

    let mut length: Option<usize> = None;
    for arg in rest {
        if let Value::List(list) = arg {
            match length {
                Some(existing) if existing != list.len() => {
                    return Err(format!("`{name}` expects all list arguments to have the same length"))
                }
                _ => length = Some(list.len()),
            }
        }
    }

    let Some(length) = length else {
        return Ok(Value::List(vec![format_values(name, spec, rest)?.into()]));
    };

    let mut result = Vec::with_capacity(length);
    for idx in 0..length {
        let row: Vec<Value> = rest
            .iter()
            .map(|arg| match arg {
                Value::List(list) => list[idx].clone(),
                other => other.clone(),
            })
            .collect();
        result.push(format_values(name, spec, &row)?.into());
    }

    Ok(Value::List(result))
}

/// printf-style formatting with the verbs `%s %d %f %t %v %q %%`
///
/// Supports the `-` and `0` flags, a width, a precision (`%.2f`) and explicit argument
/// indices (`%[2]s`).
fn format_values(fcn: &str, spec: &str, args: &[Value]) -> Result<String, String> {
    let mut out = String::new();
    let mut chars = spec.chars().peekable();
    let mut next_arg = 0;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let mut left_align = false;
        let mut zero_pad = false;
        while let Some(flag) = chars.peek().copied().filter(|c| *c == '-' || *c == '0') {
            left_align |= flag == '-';
            zero_pad |= flag == '0';
            chars.next();
        }

        if chars.peek() == Some(&'[') {
            chars.next();
            let digits: String = chars.by_ref().take_while(|c| *c != ']').collect();
            let position: usize = digits
                .parse()
                .map_err(|_| format!("`{fcn}` invalid argument index `{digits}`"))?;
            next_arg = position
                .checked_sub(1)
                .ok_or_else(|| format!("`{fcn}` argument indices start at 1"))?;
        }

        let width = take_digits(fcn, &mut chars)?.unwrap_or(0);
        let precision = match chars.peek() {
            Some('.') => {
                chars.next();
                Some(take_digits(fcn, &mut chars)?.unwrap_or(0))
            }
            _ => None,
        };

        let verb = chars
            .next()
            .ok_or_else(|| format!("`{fcn}` unterminated format verb"))?;
        let arg = args
            .get(next_arg)
            .ok_or_else(|| format!("`{fcn}` not enough arguments for format string"))?;
        next_arg += 1;

        let formatted = match verb {
            's' => ensure_primitive_string(fcn, arg)?,
            'v' => arg.to_tag_string(),
            'q' => serde_json::to_string(&ensure_primitive_string(fcn, arg)?)
                .map_err(|e| e.to_string())?,
            'd' => ensure_integer(fcn, arg)?.to_string(),
            'f' => {
                let number = ensure_numeric(fcn, arg)?.as_f64();
                std::format!("{:.*}", precision.unwrap_or(6), number)
            }
            't' => ensure_bool(fcn, arg)?.to_string(),
            other => return Err(format!("`{fcn}` unsupported format verb `%{other}`")),
        };

        let padding = width.saturating_sub(formatted.chars().count());
        if left_align {
            out.push_str(&formatted);
            out.push_str(&" ".repeat(padding));
        } else if zero_pad && matches!(verb, 'd' | 'f') {
            let (sign, digits) = match formatted.strip_prefix('-') {
                Some(digits) => ("-", digits),
                None => ("", formatted.as_str()),
            };
            out.push_str(sign);
            out.push_str(&"0".repeat(padding));
            out.push_str(digits);
        } else {
            out.push_str(&" ".repeat(padding));
            out.push_str(&formatted);
        }
    }

    Ok(out)
}

/// width or precision, at most [MAX_PADDING]
fn take_digits(
    fcn: &str,
    chars: &mut std::iter::Peekable<std::str::Chars>,
) -> Result<Option<usize>, String> {
    let mut digits = String::new();
    while let Some(d) = chars.peek().copied().filter(|d| d.is_ascii_digit()) {
        digits.push(d);
        chars.next();
    }
    if digits.is_empty() {
        return Ok(None);
    }

    match digits.parse::<usize>() {
        Ok(n) if n <= MAX_PADDING => Ok(Some(n)),
        _ => Err(format!("`{fcn}` width or precision `{digits}` exceeds {MAX_PADDING}")),
    }
}

/// Indents every line but the first
fn indent(args: &[Value]) -> Result<Value, String> {
    let spaces = ensure_integer("indent", &args[0])?;
    let s = ensure_string("indent", &args[1])?;
    let spaces = usize::try_from(spaces.max(0))
        .ok()
        .filter(|spaces| *spaces <= MAX_PADDING)
        .ok_or_else(|| format!("`indent` more than {MAX_PADDING} spaces"))?;
    let padding = " ".repeat(spaces);
    Ok(s.replace('\n', &std::format!("\n{padding}")).into())
}

fn join(args: &[Value]) -> Result<Value, String> {
    let name = "join";
    let separator = ensure_string(name, &args[0])?;
    if args.len() < 2 {
        return Err(format!("`{name}` expects at least one list"));
    }

    let mut items = vec![];
    for list in &args[1..] {
        items.extend(ensure_string_list(name, list)?);
    }
    Ok(items.join(separator).into())
}

fn lower(args: &[Value]) -> Result<Value, String> {
    Ok(ensure_string("lower", &args[0])?.to_lowercase().into())
}

fn upper(args: &[Value]) -> Result<Value, String> {
    Ok(ensure_string("upper", &args[0])?.to_uppercase().into())
}

/// Uppercases the first letter of every word
fn title(args: &[Value]) -> Result<Value, String> {
    let s = ensure_string("title", &args[0])?;
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }
    Ok(out.into())
}

fn compile(fcn: &str, pattern: &str) -> Result<regex::Regex, String> {
    regex::Regex::new(pattern).map_err(|e| format!("`{fcn}` invalid regular expression: {e}"))
}

/// Shape of a match: the matched text, a list of groups or a map of named groups
fn capture_value(re: &regex::Regex, captures: &regex::Captures) -> Value {
    if re.captures_len() == 1 {
        return captures
            .get(0)
            .map(|m| Value::from(m.as_str()))
            .unwrap_or_default();
    }

    let group = |m: Option<regex::Match>| m.map(|m| Value::from(m.as_str())).unwrap_or_default();

    if re.capture_names().flatten().next().is_some() {
        let map: Map = re
            .capture_names()
            .flatten()
            .map(|name| (name.to_string(), group(captures.name(name))))
            .collect();
        return Value::Map(map);
    }

    Value::List((1..re.captures_len()).map(|idx| group(captures.get(idx))).collect())
}

fn regex(args: &[Value]) -> Result<Value, String> {
    let name = "regex";
    let re = compile(name, ensure_string(name, &args[0])?)?;
    let s = ensure_string(name, &args[1])?;
    let captures = re
        .captures(s)
        .ok_or_else(|| format!("`{name}` pattern did not match any part of the given string"))?;
    Ok(capture_value(&re, &captures))
}

fn regexall(args: &[Value]) -> Result<Value, String> {
    let name = "regexall";
    let re = compile(name, ensure_string(name, &args[0])?)?;
    let s = ensure_string(name, &args[1])?;
    Ok(Value::List(
        re.captures_iter(s)
            .map(|captures| capture_value(&re, &captures))
            .collect(),
    ))
}

/// Substring replacement, or regex replacement when the search string is `/pattern/`
fn replace(args: &[Value]) -> Result<Value, String> {
    let name = "replace";
    let s = ensure_string(name, &args[0])?;
    let search = ensure_string(name, &args[1])?;
    let replacement = ensure_string(name, &args[2])?;

    if search.len() > 1 && search.starts_with('/') && search.ends_with('/') {
        let re = compile(name, &search[1..search.len() - 1])?;
        return Ok(re.replace_all(s, replacement).into_owned().into());
    }

    Ok(s.replace(search, replacement).into())
}

fn split(args: &[Value]) -> Result<Value, String> {
    let separator = ensure_string("split", &args[0])?;
    let s = ensure_string("split", &args[1])?;
    if s.is_empty() {
        return Ok(Value::List(vec![]));
    }
    Ok(Value::List(s.split(separator).map(Value::from).collect()))
}

fn strrev(args: &[Value]) -> Result<Value, String> {
    Ok(ensure_string("strrev", &args[0])?
        .chars()
        .rev()
        .collect::<String>()
        .into())
}

/// Character based substring; negative offsets count from the end, length `-1` means "until end"
fn substr(args: &[Value]) -> Result<Value, String> {
    let name = "substr";
    let chars: Vec<char> = ensure_string(name, &args[0])?.chars().collect();
    let offset = ensure_integer(name, &args[1])?;
    let length = ensure_integer(name, &args[2])?;
    let count = chars.len() as i64;

    let start = if offset < 0 { count + offset } else { offset }.clamp(0, count);
    let end = if length < 0 {
        count
    } else {
        start.saturating_add(length).min(count)
    };

    Ok(chars[start as usize..end as usize]
        .iter()
        .collect::<String>()
        .into())
}

fn trim(args: &[Value]) -> Result<Value, String> {
    let s = ensure_string("trim", &args[0])?;
    let cutset: Vec<char> = ensure_string("trim", &args[1])?.chars().collect();
    Ok(s.trim_matches(|c| cutset.contains(&c)).into())
}

fn trimprefix(args: &[Value]) -> Result<Value, String> {
    let s = ensure_string("trimprefix", &args[0])?;
    let prefix = ensure_string("trimprefix", &args[1])?;
    Ok(s.strip_prefix(prefix).unwrap_or(s).into())
}

fn trimsuffix(args: &[Value]) -> Result<Value, String> {
    let s = ensure_string("trimsuffix", &args[0])?;
    let suffix = ensure_string("trimsuffix", &args[1])?;
    Ok(s.strip_suffix(suffix).unwrap_or(s).into())
}

fn trimspace(args: &[Value]) -> Result<Value, String> {
    Ok(ensure_string("trimspace", &args[0])?.trim().into())
}
