//! tag standard document
//!
//! A tag standard is a YAML document:
//!
//! ```yaml
//! version: 1
//! cloud_provider: aws
//! required_tags:
//!   - key: Environment
//!     allowed_values: [Production, Staging, Development]
//!   - key: Owner
//!     data_type: email
//! optional_tags:
//!   - key: Project
//! global_excludes: [aws_iam_role]
//! resource_rules:
//!   - resource_types: ["aws_s3_*"]
//!     required_tags: [Project]
//! ```
//!
//! [TagStandard::validate] checks the whole document up front. A standard that passes can be
//! compiled into a [crate::validator::Validator] without further failure.
use crate::constraints;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_STANDARD_FILE_NAME: &str = "tag-standard.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagStandard {
    pub version: u32,
    #[serde(default)]
    pub metadata: Metadata,
    pub cloud_provider: CloudProvider,
    #[serde(default)]
    pub required_tags: Vec<TagSpec>,
    #[serde(default)]
    pub optional_tags: Vec<TagSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_excludes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_rules: Vec<ResourceRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Gcp,
    Azure,
}

impl CloudProvider {
    /// resource type prefix, also used for the example standard
    pub fn prefix(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Gcp => "google",
            CloudProvider::Azure => "azurerm",
        }
    }
}

impl std::fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Gcp => "gcp",
            CloudProvider::Azure => "azure",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Numeric,
    Alphanumeric,
    Email,
    Url,
    Date,
    Boolean,
    Cron,
    Any,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DataType::String => "string",
            DataType::Numeric => "numeric",
            DataType::Alphanumeric => "alphanumeric",
            DataType::Email => "email",
            DataType::Url => "url",
            DataType::Date => "date",
            DataType::Boolean => "boolean",
            DataType::Cron => "cron",
            DataType::Any => "any",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSpec {
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    /// regex the value has to match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    /// `0` means unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl TagSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn min_length(&self) -> Option<usize> {
        self.min_length
            .filter(|min| *min > 0)
            .and_then(|min| usize::try_from(min).ok())
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
            .filter(|max| *max > 0)
            .and_then(|max| usize::try_from(max).ok())
    }

    /// Value to propose when the tag is missing: default, first example, first allowed value
    pub fn suggested_value(&self) -> Option<&str> {
        self.default_value
            .as_deref()
            .or_else(|| self.examples.first().map(String::as_str))
            .or_else(|| self.allowed_values.first().map(String::as_str))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRule {
    /// exact resource types or glob patterns (`aws_s3_*`)
    pub resource_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_tags: Vec<String>,
    /// replaces the global spec with the same key
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub override_tags: Vec<TagSpec>,
}

#[derive(thiserror::Error, Debug)]
pub enum StandardError {
    #[error("Unable to read tag standard file")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse tag standard: {0}")]
    ParseFailed(#[from] serde_yaml::Error),
    #[error("unsupported schema version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("{location}: tag key is required")]
    MissingKey { location: String },
    #[error("{location}: invalid regex pattern for tag '{key}'")]
    InvalidFormat {
        location: String,
        key: String,
        #[source]
        source: regex::Error,
    },
    #[error("{location}: {field} cannot be negative for tag '{key}'")]
    NegativeLength {
        location: String,
        key: String,
        field: &'static str,
    },
    #[error("{location}: max_length must be greater than min_length for tag '{key}'")]
    InvertedLength { location: String, key: String },
    #[error("{location}: empty value in allowed_values for tag '{key}'")]
    EmptyAllowedValue { location: String, key: String },
    #[error("{location}: invalid example '{example}' for tag '{key}': {reason}")]
    InvalidExample {
        location: String,
        key: String,
        example: String,
        reason: String,
    },
    #[error("duplicate tag key found: {0}")]
    DuplicateKey(String),
    #[error("{location}: resource_types cannot be empty")]
    EmptyResourceTypes { location: String },
    #[error("{location}: invalid resource type pattern '{pattern}'")]
    InvalidResourcePattern {
        location: String,
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("{location}: {kind} tag '{key}' not defined in global tags")]
    UndefinedTag {
        location: String,
        kind: &'static str,
        key: String,
    },
}

impl TagStandard {
    /// Reads, parses and validates a standard file
    pub fn load(path: &Path) -> Result<Self, StandardError> {
        tracing::info!(path=%path.display(), "loading tag standard");
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, StandardError> {
        let standard: TagStandard = serde_yaml::from_str(text)?;
        standard.validate()?;
        Ok(standard)
    }

    pub fn to_yaml(&self) -> Result<String, StandardError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Structural checks, the first problem found is returned
    pub fn validate(&self) -> Result<(), StandardError> {
        if self.version != SUPPORTED_SCHEMA_VERSION {
            return Err(StandardError::UnsupportedVersion {
                found: self.version,
                expected: SUPPORTED_SCHEMA_VERSION,
            });
        }

        validate_specs(&self.required_tags, "required_tags")?;
        validate_specs(&self.optional_tags, "optional_tags")?;

        let mut keys = HashSet::new();
        for spec in self.required_tags.iter().chain(&self.optional_tags) {
            if !keys.insert(spec.key.as_str()) {
                return Err(StandardError::DuplicateKey(spec.key.clone()));
            }
        }

        for (index, rule) in self.resource_rules.iter().enumerate() {
            let location = format!("resource_rules[{index}]");
            if rule.resource_types.is_empty() {
                return Err(StandardError::EmptyResourceTypes { location });
            }

            for pattern in &rule.resource_types {
                if pattern.is_empty() {
                    return Err(StandardError::EmptyResourceTypes { location });
                }
                globset::Glob::new(pattern).map_err(|source| {
                    StandardError::InvalidResourcePattern {
                        location: location.clone(),
                        pattern: pattern.clone(),
                        source,
                    }
                })?;
            }

            let references = [
                ("required", &rule.required_tags),
                ("optional", &rule.optional_tags),
                ("excluded", &rule.excluded_tags),
            ];
            for (kind, tag_keys) in references {
                if let Some(key) = tag_keys.iter().find(|key| !keys.contains(key.as_str())) {
                    return Err(StandardError::UndefinedTag {
                        location,
                        kind,
                        key: key.clone(),
                    });
                }
            }

            validate_specs(&rule.override_tags, &format!("{location}.override_tags"))?;
        }

        Ok(())
    }

    /// Global spec by key
    pub fn find_spec(&self, key: &str) -> Option<&TagSpec> {
        self.required_tags
            .iter()
            .chain(&self.optional_tags)
            .find(|spec| spec.key == key)
    }

    /// Starting point for a new standard, written by `tagcheck init`
    pub fn example(provider: CloudProvider) -> Self {
        let prefix = provider.prefix();
        TagStandard {
            version: SUPPORTED_SCHEMA_VERSION,
            metadata: Metadata {
                description: format!("{provider} Resource Tagging Standard"),
                author: "Cloud Team".to_string(),
                date: "2025-06-30".to_string(),
                version: "1.0.0".to_string(),
            },
            cloud_provider: provider,
            required_tags: vec![
                TagSpec {
                    description: "Descriptive name for the resource".to_string(),
                    data_type: Some(DataType::String),
                    min_length: Some(1),
                    max_length: Some(255),
                    ..TagSpec::new("Name")
                },
                TagSpec {
                    description: "Deployment environment".to_string(),
                    allowed_values: ["Production", "Staging", "Development", "Testing"]
                        .map(String::from)
                        .to_vec(),
                    ..TagSpec::new("Environment")
                },
                TagSpec {
                    description: "Team responsible for the resource".to_string(),
                    format: Some(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$".to_string()),
                    data_type: Some(DataType::Email),
                    ..TagSpec::new("Owner")
                },
                TagSpec {
                    description: "Cost center for billing".to_string(),
                    format: Some(r"^CC\d{4}$".to_string()),
                    examples: vec!["CC1234".to_string(), "CC5678".to_string()],
                    ..TagSpec::new("CostCenter")
                },
            ],
            optional_tags: vec![
                TagSpec {
                    description: "Associated project".to_string(),
                    data_type: Some(DataType::String),
                    ..TagSpec::new("Project")
                },
                TagSpec {
                    description: "Backup schedule".to_string(),
                    allowed_values: ["Daily", "Weekly", "Monthly", "None"]
                        .map(String::from)
                        .to_vec(),
                    default_value: Some("None".to_string()),
                    ..TagSpec::new("Backup")
                },
            ],
            global_excludes: vec![format!("{prefix}_iam_role"), format!("{prefix}_iam_policy")],
            resource_rules: vec![],
        }
    }
}

fn validate_specs(specs: &[TagSpec], context: &str) -> Result<(), StandardError> {
    for (index, spec) in specs.iter().enumerate() {
        validate_spec(spec, &format!("{context}[{index}]"))?;
    }
    Ok(())
}

fn validate_spec(spec: &TagSpec, location: &str) -> Result<(), StandardError> {
    let location = location.to_string();
    let key = spec.key.clone();
    if spec.key.is_empty() {
        return Err(StandardError::MissingKey { location });
    }

    let format = match &spec.format {
        Some(pattern) => Some(Regex::new(pattern).map_err(|source| {
            StandardError::InvalidFormat {
                location: location.clone(),
                key: key.clone(),
                source,
            }
        })?),
        None => None,
    };

    for (field, bound) in [("min_length", spec.min_length), ("max_length", spec.max_length)] {
        if bound.is_some_and(|bound| bound < 0) {
            return Err(StandardError::NegativeLength {
                location,
                key,
                field,
            });
        }
    }

    if let (Some(max), min) = (spec.max_length(), spec.min_length().unwrap_or(0)) {
        if max < min {
            return Err(StandardError::InvertedLength { location, key });
        }
    }

    if spec.allowed_values.iter().any(String::is_empty) {
        return Err(StandardError::EmptyAllowedValue { location, key });
    }

    for example in &spec.examples {
        if let Some(failure) = constraints::check(spec, format.as_ref(), example).first() {
            return Err(StandardError::InvalidExample {
                location,
                key,
                example: example.clone(),
                reason: failure.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn error(yaml: &str) -> String {
        TagStandard::from_yaml_str(yaml).unwrap_err().to_string()
    }

    #[test]
    fn example_standard_is_valid_and_round_trips() {
        for provider in [CloudProvider::Aws, CloudProvider::Gcp, CloudProvider::Azure] {
            let standard = TagStandard::example(provider);
            standard.validate().unwrap();
            let parsed = TagStandard::from_yaml_str(&standard.to_yaml().unwrap()).unwrap();
            assert_eq!(parsed, standard);
        }

        let gcp = TagStandard::example(CloudProvider::Gcp);
        assert_eq!(gcp.global_excludes, vec!["google_iam_role", "google_iam_policy"]);
        assert_eq!(gcp.metadata.description, "gcp Resource Tagging Standard");
    }

    #[test]
    fn minimal_document() {
        let standard = TagStandard::from_yaml_str(
            "version: 1\ncloud_provider: azure\nrequired_tags:\n  - key: Owner\n",
        )
        .unwrap();
        assert_eq!(standard.cloud_provider, CloudProvider::Azure);
        assert_eq!(standard.find_spec("Owner"), Some(&TagSpec::new("Owner")));
        assert!(standard.find_spec("Name").is_none());
    }

    #[test]
    fn structural_errors() {
        let header = "version: 1\ncloud_provider: aws\n";
        let cases = [
            ("version: 2\ncloud_provider: aws\n", "unsupported schema version 2, expected 1"),
            (
                "required_tags:\n  - key: ''\n",
                "required_tags[0]: tag key is required",
            ),
            (
                "required_tags:\n  - key: A\n  - key: B\n    format: '('\n",
                "required_tags[1]: invalid regex pattern for tag 'B'",
            ),
            (
                "optional_tags:\n  - key: A\n    min_length: -1\n",
                "optional_tags[0]: min_length cannot be negative for tag 'A'",
            ),
            (
                "required_tags:\n  - key: A\n    min_length: 5\n    max_length: 2\n",
                "required_tags[0]: max_length must be greater than min_length for tag 'A'",
            ),
            (
                "required_tags:\n  - key: A\n    allowed_values: [x, '']\n",
                "required_tags[0]: empty value in allowed_values for tag 'A'",
            ),
            (
                "required_tags:\n  - key: A\n    format: '^CC\\d+$'\n    examples: [CC1, X]\n",
                "required_tags[0]: invalid example 'X' for tag 'A': value does not match required format",
            ),
            (
                "required_tags:\n  - key: A\noptional_tags:\n  - key: A\n",
                "duplicate tag key found: A",
            ),
            (
                "resource_rules:\n  - resource_types: []\n",
                "resource_rules[0]: resource_types cannot be empty",
            ),
            (
                "resource_rules:\n  - resource_types: ['aws_[']\n",
                "resource_rules[0]: invalid resource type pattern 'aws_['",
            ),
            (
                "required_tags:\n  - key: A\nresource_rules:\n  - resource_types: [x]\n    excluded_tags: [B]\n",
                "resource_rules[0]: excluded tag 'B' not defined in global tags",
            ),
            (
                "resource_rules:\n  - resource_types: [x]\n    override_tags:\n      - key: ''\n",
                "resource_rules[0].override_tags[0]: tag key is required",
            ),
        ];

        for (body, message) in cases {
            let yaml = if body.starts_with("version") {
                body.to_string()
            } else {
                format!("{header}{body}")
            };
            assert_eq!(error(&yaml), message, "{body}");
        }
    }

    #[test]
    fn unknown_provider_is_a_parse_error() {
        let result = TagStandard::from_yaml_str("version: 1\ncloud_provider: oracle\n");
        assert!(matches!(result, Err(StandardError::ParseFailed(_))));
    }
}
