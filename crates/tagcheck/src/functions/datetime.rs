use super::utils::ensure_string;
use super::{builtin, Arity, Builtin};
use crate::value::Value;

use chrono::{DateTime, Datelike, FixedOffset, SecondsFormat, TimeDelta, Timelike};
use std::collections::HashMap;

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert("formatdate", builtin!(formatdate, Arity::Fixed(2)));
    m.insert("timeadd", builtin!(timeadd, Arity::Fixed(2)));
}

fn parse_timestamp(fcn: &str, text: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(text)
        .map_err(|e| format!("`{fcn}` `{text}` is not a valid RFC 3339 timestamp: {e}"))
}

/// Terraform style date formatting (`YYYY-MM-DD'T'hh:mm:ssZ`, `DD MMM YYYY`, ...)
fn formatdate(args: &[Value]) -> Result<Value, String> {
    let name = "formatdate";
    let spec = ensure_string(name, &args[0])?;
    let dt = parse_timestamp(name, ensure_string(name, &args[1])?)?;

    let mut out = String::new();
    let chars: Vec<char> = spec.chars().collect();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];

        if c == '\'' {
            // quoted literal, '' is an escaped quote
            let mut end = pos + 1;
            let mut literal = String::new();
            loop {
                match chars.get(end) {
                    None => return Err(format!("`{name}` unterminated literal in format")),
                    Some('\'') if chars.get(end + 1) == Some(&'\'') => {
                        literal.push('\'');
                        end += 2;
                    }
                    Some('\'') => break,
                    Some(other) => {
                        literal.push(*other);
                        end += 1;
                    }
                }
            }
            if literal.is_empty() && end == pos + 1 {
                out.push('\'');
            }
            out.push_str(&literal);
            pos = end + 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            out.push(c);
            pos += 1;
            continue;
        }

        let run = chars[pos..].iter().take_while(|other| **other == c).count();
        pos += run;

        let offset_seconds = dt.offset().local_minus_utc();
        let (pm, hour12) = dt.hour12();
        let formatted = match (c, run) {
            ('Y', 4) => format!("{:04}", dt.year()),
            ('Y', 2) => format!("{:02}", dt.year().rem_euclid(100)),
            ('M', 4) => dt.format("%B").to_string(),
            ('M', 3) => dt.format("%b").to_string(),
            ('M', 2) => format!("{:02}", dt.month()),
            ('M', 1) => dt.month().to_string(),
            ('D', 2) => format!("{:02}", dt.day()),
            ('D', 1) => dt.day().to_string(),
            ('E', 4) => dt.format("%A").to_string(),
            ('E', 3) => dt.format("%a").to_string(),
            ('h', 2) => format!("{:02}", dt.hour()),
            ('h', 1) => dt.hour().to_string(),
            ('H', 2) => format!("{:02}", hour12),
            ('H', 1) => hour12.to_string(),
            ('A', 2) => (if pm { "PM" } else { "AM" }).to_string(),
            ('a', 2) => (if pm { "pm" } else { "am" }).to_string(),
            ('m', 2) => format!("{:02}", dt.minute()),
            ('m', 1) => dt.minute().to_string(),
            ('s', 2) => format!("{:02}", dt.second()),
            ('s', 1) => dt.second().to_string(),
            ('Z', 5) => dt.format("%:z").to_string(),
            ('Z', 4) => dt.format("%z").to_string(),
            ('Z', 3) if offset_seconds == 0 => "UTC".to_string(),
            ('Z', 3) => dt.format("%z").to_string(),
            ('Z', 1) if offset_seconds == 0 => "Z".to_string(),
            ('Z', 1) => dt.format("%:z").to_string(),
            _ => {
                let token: String = std::iter::repeat(c).take(run).collect();
                return Err(format!("`{name}` invalid date format verb `{token}`"));
            }
        };
        out.push_str(&formatted);
    }

    Ok(out.into())
}

/// Go style durations: `1h30m`, `-10m`, `2.5s`, `300ms`
fn parse_duration(fcn: &str, text: &str) -> Result<TimeDelta, String> {
    let invalid = || format!("`{fcn}` `{text}` is not a valid duration");

    let (sign, mut rest) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };

    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut nanos = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let number: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];
        nanos += number * scale;
    }

    if !nanos.is_finite() || nanos.abs() > i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(TimeDelta::nanoseconds((sign * nanos) as i64))
}

fn timeadd(args: &[Value]) -> Result<Value, String> {
    let name = "timeadd";
    let dt = parse_timestamp(name, ensure_string(name, &args[0])?)?;
    let duration = parse_duration(name, ensure_string(name, &args[1])?)?;
    let result = dt
        .checked_add_signed(duration)
        .ok_or_else(|| format!("`{name}` result is out of range"))?;
    Ok(result.to_rfc3339_opts(SecondsFormat::AutoSi, true).into())
}
