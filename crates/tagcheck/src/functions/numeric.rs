use super::utils::{ensure_integer, ensure_numeric, ensure_string};
use super::{builtin, Arity, Builtin};
use crate::value::{Number, Value};

use std::collections::HashMap;

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert("abs", builtin!(abs, Arity::Fixed(1)));
    m.insert("ceil", builtin!(ceil, Arity::Fixed(1)));
    m.insert("floor", builtin!(floor, Arity::Fixed(1)));
    m.insert("log", builtin!(log, Arity::Fixed(2)));
    m.insert("max", builtin!(max, Arity::Variadic(1)));
    m.insert("min", builtin!(min, Arity::Variadic(1)));
    m.insert("parseint", builtin!(parseint, Arity::Fixed(2)));
    m.insert("pow", builtin!(pow, Arity::Fixed(2)));
    m.insert("signum", builtin!(signum, Arity::Fixed(1)));
}

fn abs(args: &[Value]) -> Result<Value, String> {
    Ok(match ensure_numeric("abs", &args[0])? {
        Number::Integer(int) => int
            .checked_abs()
            .map(Number::Integer)
            .unwrap_or(Number::Decimal((int as f64).abs())),
        Number::Decimal(dec) => Number::Decimal(dec.abs()),
    }
    .into())
}

fn ceil(args: &[Value]) -> Result<Value, String> {
    let n = ensure_numeric("ceil", &args[0])?;
    Ok(Value::Number(Number::normalized(n.as_f64().ceil())))
}

fn floor(args: &[Value]) -> Result<Value, String> {
    let n = ensure_numeric("floor", &args[0])?;
    Ok(Value::Number(Number::normalized(n.as_f64().floor())))
}

fn log(args: &[Value]) -> Result<Value, String> {
    let n = ensure_numeric("log", &args[0])?.as_f64();
    let base = ensure_numeric("log", &args[1])?.as_f64();
    let result = match base {
        2.0 => n.log2(),
        10.0 => n.log10(),
        _ => n.log(base),
    };
    Ok(Value::Number(Number::normalized(result)))
}

fn extremum(fcn: &str, args: &[Value], pick_greater: bool) -> Result<Value, String> {
    let mut best: Option<Number> = None;
    for arg in args {
        let n = ensure_numeric(fcn, arg)?;
        best = match best {
            Some(current) if (n.as_f64() > current.as_f64()) != pick_greater => Some(current),
            Some(current) if n.as_f64() == current.as_f64() => Some(current),
            _ => Some(n),
        };
    }

    best.map(Value::Number)
        .ok_or_else(|| format!("`{fcn}` expects at least one number"))
}

fn max(args: &[Value]) -> Result<Value, String> {
    extremum("max", args, true)
}

fn min(args: &[Value]) -> Result<Value, String> {
    extremum("min", args, false)
}

/// Digit value in bases up to 62: `0-9`, then `a-z`, then `A-Z`
///
/// Up to base 36 letters are case-insensitive.
fn digit_value(c: char, base: u32) -> Option<u32> {
    let value = match c {
        '0'..='9' => c as u32 - '0' as u32,
        'a'..='z' => c as u32 - 'a' as u32 + 10,
        'A'..='Z' if base <= 36 => c as u32 - 'A' as u32 + 10,
        'A'..='Z' => c as u32 - 'A' as u32 + 36,
        _ => return None,
    };
    (value < base).then_some(value)
}

fn parseint(args: &[Value]) -> Result<Value, String> {
    let name = "parseint";
    let text = ensure_string(name, &args[0])?;
    let base = ensure_integer(name, &args[1])?;
    if !(2..=62).contains(&base) {
        return Err(format!("`{name}` base must be between 2 and 62"));
    }

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() {
        return Err(format!("`{name}` cannot parse `{text}` as a base {base} integer"));
    }

    let mut result: i64 = 0;
    for c in digits.chars() {
        let digit = digit_value(c, base as u32)
            .ok_or_else(|| format!("`{name}` cannot parse `{text}` as a base {base} integer"))?;
        result = result
            .checked_mul(base)
            .and_then(|r| r.checked_add(digit as i64))
            .ok_or_else(|| format!("`{name}` `{text}` is out of range"))?;
    }

    Ok(Value::from(if negative { -result } else { result }))
}

fn pow(args: &[Value]) -> Result<Value, String> {
    let base = ensure_numeric("pow", &args[0])?;
    let exponent = ensure_numeric("pow", &args[1])?;

    if let (Number::Integer(b), Number::Integer(e)) = (base, exponent) {
        if let Some(result) = u32::try_from(e).ok().and_then(|e| b.checked_pow(e)) {
            return Ok(result.into());
        }
    }

    Ok(Value::Number(Number::normalized(
        base.as_f64().powf(exponent.as_f64()),
    )))
}

fn signum(args: &[Value]) -> Result<Value, String> {
    let n = ensure_numeric("signum", &args[0])?.as_f64();
    let sign = if n > 0.0 {
        1
    } else if n < 0.0 {
        -1
    } else {
        0
    };
    Ok(Value::from(sign as i64))
}

#[cfg(test)]
mod test {
    use crate::functions::call;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn rounding() {
        assert_eq!(call("ceil", &[4.1.into()]).unwrap(), Value::from(5i64));
        assert_eq!(call("floor", &[(-4.1).into()]).unwrap(), Value::from(-5i64));
        assert_eq!(call("abs", &[(-3i64).into()]).unwrap(), Value::from(3i64));
        assert_eq!(call("signum", &[(-0.5).into()]).unwrap(), Value::from(-1i64));
    }

    #[test]
    fn extremes() {
        assert_eq!(
            call("max", &[1i64.into(), 7.5.into(), 3i64.into()]).unwrap(),
            Value::from(7.5)
        );
        assert_eq!(call("min", &[4i64.into(), 2i64.into()]).unwrap(), Value::from(2i64));
        assert!(call("max", &["a".into()]).is_err());
    }

    #[test]
    fn powers_and_logs() {
        assert_eq!(call("pow", &[2i64.into(), 10i64.into()]).unwrap(), Value::from(1024i64));
        assert_eq!(call("pow", &[4i64.into(), 0.5.into()]).unwrap(), Value::from(2i64));
        assert_eq!(call("log", &[8i64.into(), 2i64.into()]).unwrap(), Value::from(3i64));
    }

    #[test]
    fn integer_parsing() {
        assert_eq!(call("parseint", &["FF".into(), 16i64.into()]).unwrap(), Value::from(255i64));
        assert_eq!(call("parseint", &["-101".into(), 2i64.into()]).unwrap(), Value::from(-5i64));
        assert_eq!(call("parseint", &["Z".into(), 62i64.into()]).unwrap(), Value::from(61i64));
        assert!(call("parseint", &["12".into(), 2i64.into()]).is_err());
    }
}
