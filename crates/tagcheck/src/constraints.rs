//! value constraints of a single tag
//!
//! [check] runs every constraint of a [TagSpec] against an already resolved string and returns
//! all failures. Checks are independent of each other, a value can fail several at once.
use crate::standard::{DataType, TagSpec};
use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintFailure {
    NotAllowed,
    Format,
    TooShort(usize),
    TooLong(usize),
    DataType(String),
}

impl std::fmt::Display for ConstraintFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintFailure::NotAllowed => f.write_str("value not in allowed values"),
            ConstraintFailure::Format => f.write_str("value does not match required format"),
            ConstraintFailure::TooShort(min) => {
                write!(f, "value too short (minimum {min} characters)")
            }
            ConstraintFailure::TooLong(max) => {
                write!(f, "value too long (maximum {max} characters)")
            }
            ConstraintFailure::DataType(reason) => f.write_str(reason),
        }
    }
}

/// Checks allowed values, format, length bounds and data type
pub fn check(spec: &TagSpec, format: Option<&Regex>, value: &str) -> Vec<ConstraintFailure> {
    let mut failures = vec![];

    if !spec.allowed_values.is_empty() && !is_allowed(spec, value) {
        failures.push(ConstraintFailure::NotAllowed);
    }

    if let Some(format) = format {
        if !format.is_match(value) {
            failures.push(ConstraintFailure::Format);
        }
    }

    let length = value.chars().count();
    if let Some(min) = spec.min_length() {
        if length < min {
            failures.push(ConstraintFailure::TooShort(min));
        }
    }
    if let Some(max) = spec.max_length() {
        if length > max {
            failures.push(ConstraintFailure::TooLong(max));
        }
    }

    if let Some(data_type) = spec.data_type {
        if let Err(reason) = check_data_type(value, data_type) {
            failures.push(ConstraintFailure::DataType(reason));
        }
    }

    failures
}

pub fn is_allowed(spec: &TagSpec, value: &str) -> bool {
    spec.allowed_values.iter().any(|allowed| {
        if spec.case_sensitive {
            allowed == value
        } else {
            allowed.to_lowercase() == value.to_lowercase()
        }
    })
}

lazy_static! {
    static ref NUMERIC: Regex = Regex::new(r"^\d+$").unwrap();
    static ref ALPHANUMERIC: Regex = Regex::new(r"^[a-zA-Z0-9]+$").unwrap();
    static ref EMAIL: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    static ref URL: Regex = Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap();
    static ref DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

pub fn check_data_type(value: &str, data_type: DataType) -> Result<(), String> {
    let (valid, reason) = match data_type {
        DataType::String | DataType::Any => return Ok(()),
        DataType::Numeric => (NUMERIC.is_match(value), "value must be numeric"),
        DataType::Alphanumeric => (ALPHANUMERIC.is_match(value), "value must be alphanumeric"),
        DataType::Email => (EMAIL.is_match(value), "value must be a valid email address"),
        DataType::Url => (URL.is_match(value), "value must be a valid URL"),
        DataType::Date => (DATE.is_match(value), "value must be a valid date (YYYY-MM-DD)"),
        DataType::Boolean => (
            value == "true" || value == "false",
            "value must be 'true' or 'false'",
        ),
        DataType::Cron => {
            return check_cron(value)
                .map_err(|reason| format!("value must be a valid cron expression: {reason}"))
        }
    };

    if valid {
        Ok(())
    } else {
        Err(reason.to_string())
    }
}

struct CronField {
    name: &'static str,
    pattern: Regex,
    range: &'static str,
}

/// `*`, `*/step`, `a-b/step`, or a list of single values
fn cron_field(name: &'static str, value: &str, names: &str, range: &'static str) -> CronField {
    let list = format!(r"{value}(,{value})*");
    let alternatives = if names.is_empty() {
        String::new()
    } else {
        format!("|{names}")
    };
    let pattern = format!(r"^(\*(/\d+)?|{value}(-{value})?(/\d+)?|{list}{alternatives})$");
    CronField {
        name,
        pattern: Regex::new(&pattern).expect("valid cron field pattern"),
        range,
    }
}

lazy_static! {
    static ref SECOND: CronField = cron_field("second", "([0-5]?\\d)", "", "0-59");
    static ref MINUTE: CronField = cron_field("minute", "([0-5]?\\d)", "", "0-59");
    static ref HOUR: CronField = cron_field("hour", "([01]?\\d|2[0-3])", "", "0-23");
    static ref DAY: CronField = cron_field("day", "(3[01]|[12]\\d|0?[1-9])", "", "1-31");
    static ref MONTH: CronField = cron_field(
        "month",
        "(1[0-2]|0?[1-9])",
        "JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC",
        "1-12 or JAN-DEC"
    );
    static ref WEEKDAY: CronField = cron_field(
        "weekday",
        "[0-6]",
        "SUN|MON|TUE|WED|THU|FRI|SAT",
        "0-6 or SUN-SAT"
    );
}

/// Five (`minute hour day month weekday`) or six (leading `second`) fields
pub fn check_cron(expression: &str) -> Result<(), String> {
    let fields = expression.split_whitespace().collect::<Vec<_>>();
    if fields.is_empty() {
        return Err("cron expression cannot be empty".to_string());
    }

    let validators: Vec<&CronField> = match fields.len() {
        5 => vec![&MINUTE, &HOUR, &DAY, &MONTH, &WEEKDAY],
        6 => vec![&SECOND, &MINUTE, &HOUR, &DAY, &MONTH, &WEEKDAY],
        n => return Err(format!("cron expression must have 5 or 6 fields, got {n}")),
    };

    for (field, validator) in fields.iter().zip(validators) {
        if !validator.pattern.is_match(&field.to_uppercase()) {
            return Err(format!(
                "invalid {} field '{field}' (expected range: {})",
                validator.name, validator.range
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spec(yaml: &str) -> TagSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn data_types() {
        let accepted = [
            (DataType::Numeric, "1234"),
            (DataType::Alphanumeric, "abc123"),
            (DataType::Email, "ops@example.com"),
            (DataType::Url, "https://example.com/path"),
            (DataType::Date, "2024-06-30"),
            (DataType::Boolean, "false"),
            (DataType::Any, ""),
        ];
        for (data_type, value) in accepted {
            assert_eq!(check_data_type(value, data_type), Ok(()), "{value}");
        }

        let rejected = [
            (DataType::Numeric, "12a"),
            (DataType::Alphanumeric, "abc-123"),
            (DataType::Email, "ops@"),
            (DataType::Url, "ftp://example.com"),
            (DataType::Date, "30.06.2024"),
            (DataType::Boolean, "yes"),
        ];
        for (data_type, value) in rejected {
            assert!(check_data_type(value, data_type).is_err(), "{value}");
        }
    }

    #[test]
    fn cron_expressions() {
        for expression in [
            "0 2 * * *",
            "*/15 * * * *",
            "0 9-17/2 * * 1-5",
            "0 0 1,15 * *",
            "0 0 * JAN MON",
            "30 0 2 * * sun",
            "0 0 31 * *",
            "0 0 09 * *",
        ] {
            assert_eq!(check_cron(expression), Ok(()), "{expression}");
        }

        assert_eq!(
            check_cron("60 * * * *"),
            Err("invalid minute field '60' (expected range: 0-59)".to_string())
        );
        assert_eq!(
            check_cron("0 24 * * *"),
            Err("invalid hour field '24' (expected range: 0-23)".to_string())
        );
        assert_eq!(
            check_cron("* * *"),
            Err("cron expression must have 5 or 6 fields, got 3".to_string())
        );
        for day in ["0", "00", "32"] {
            assert_eq!(
                check_cron(&format!("0 0 {day} * *")),
                Err(format!("invalid day field '{day}' (expected range: 1-31)"))
            );
        }
        assert!(check_cron("0 0 * 13 *").is_err());
        assert!(check_cron("0 0 * * 7").is_err());
        assert!(check_cron("").is_err());
    }

    #[test]
    fn independent_failures() {
        let spec = spec(
            "key: Code\nallowed_values: [abc]\nmin_length: 5\ndata_type: numeric\n",
        );
        let format = Regex::new("^X").unwrap();
        assert_eq!(
            check(&spec, Some(&format), "ab"),
            vec![
                ConstraintFailure::NotAllowed,
                ConstraintFailure::Format,
                ConstraintFailure::TooShort(5),
                ConstraintFailure::DataType("value must be numeric".to_string()),
            ]
        );
    }

    #[test]
    fn allowed_values_case() {
        let insensitive = spec("key: Environment\nallowed_values: [Production, Staging]\n");
        assert!(check(&insensitive, None, "production").is_empty());

        let sensitive = spec(
            "key: Environment\nallowed_values: [Production]\ncase_sensitive: true\n",
        );
        assert_eq!(
            check(&sensitive, None, "production"),
            vec![ConstraintFailure::NotAllowed]
        );
    }
}
