//! tag compliance validation
//!
//! A [Validator] is built once from a [TagStandard] (all regexes and resource type patterns are
//! compiled up front) and is read-only afterwards. [Validator::validate] checks one resource:
//!
//! 1. resources that are globally excluded or cannot carry tags are compliant
//! 2. effective tag sets: global specs plus every matching resource rule in declaration order
//! 3. missing required tags
//! 4. excluded tags that are present
//! 5. unknown tags, and the value constraints of every known tag
//!
//! Tag values that look like references (`var.`, `local.`, `${`) are resolved first. A value that
//! cannot be resolved yields exactly one [ViolationKind::UnresolvableValue] and no other checks.
use crate::capability::{CapabilityLookup, ProviderDefaults, TaggingCapability};
use crate::constraints::{self, ConstraintFailure};
use crate::resolver::VariableResolver;
use crate::resources::ResourceInfo;
use crate::standard::{StandardError, TagSpec, TagStandard};
use globset::{Glob, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use regex::Regex;
use std::path::PathBuf;

/// tag key -> raw tag value, in source order
pub type TagMap = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingRequired,
    InvalidValue,
    InvalidFormat,
    InvalidDataType,
    LengthExceeded,
    LengthTooShort,
    UnresolvableValue,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ViolationKind::MissingRequired => "missing_required",
            ViolationKind::InvalidValue => "invalid_value",
            ViolationKind::InvalidFormat => "invalid_format",
            ViolationKind::InvalidDataType => "invalid_data_type",
            ViolationKind::LengthExceeded => "length_exceeded",
            ViolationKind::LengthTooShort => "length_too_short",
            ViolationKind::UnresolvableValue => "unresolvable_value",
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TagViolation {
    pub tag_key: String,
    /// value as written, references are not replaced
    pub tag_value: String,
    #[serde(rename = "violation_type")]
    pub kind: ViolationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixAction {
    Add,
    Update,
    Remove,
    Format,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SuggestedFix {
    pub tag_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<String>,
    pub action: FixAction,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidationResult {
    pub resource_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    pub compliant: bool,
    pub supports_tagging: bool,
    pub tagging_capability: TaggingCapability,
    pub violations: Vec<TagViolation>,
    pub missing_tags: Vec<String>,
    pub extra_tags: Vec<String>,
    pub suggested_fixes: Vec<SuggestedFix>,
}

impl ValidationResult {
    fn new(resource_type: &str, capability: TaggingCapability) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            resource_name: String::new(),
            file_path: None,
            line_number: None,
            compliant: true,
            supports_tagging: capability.supports_tagging,
            tagging_capability: capability,
            violations: vec![],
            missing_tags: vec![],
            extra_tags: vec![],
            suggested_fixes: vec![],
        }
    }
}

#[derive(Debug)]
struct CompiledSpec {
    spec: TagSpec,
    format: Option<Regex>,
}

impl CompiledSpec {
    fn compile(spec: &TagSpec) -> Result<Self, StandardError> {
        let format = spec
            .format
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|source| StandardError::InvalidFormat {
                location: "tag spec".to_string(),
                key: spec.key.clone(),
                source,
            })?;

        Ok(Self {
            spec: spec.clone(),
            format,
        })
    }
}

#[derive(Debug)]
struct CompiledRule {
    patterns: GlobSet,
    required: Vec<String>,
    optional: Vec<String>,
    excluded: Vec<String>,
    overrides: Vec<CompiledSpec>,
}

/// Effective tag sets of one resource type
#[derive(Debug, Default)]
struct Effective<'a> {
    required: Vec<&'a CompiledSpec>,
    optional: Vec<&'a CompiledSpec>,
    excluded: Vec<String>,
}

impl<'a> Effective<'a> {
    fn contains(&self, key: &str) -> bool {
        self.required
            .iter()
            .chain(&self.optional)
            .any(|compiled| compiled.spec.key == key)
    }

    fn spec(&self, key: &str) -> Option<&'a CompiledSpec> {
        self.required
            .iter()
            .chain(&self.optional)
            .find(|compiled| compiled.spec.key == key)
            .copied()
    }

    fn apply_override(&mut self, replacement: &'a CompiledSpec) {
        for compiled in self.required.iter_mut().chain(self.optional.iter_mut()) {
            if compiled.spec.key == replacement.spec.key {
                *compiled = replacement;
            }
        }
    }
}

pub struct Validator<'r> {
    standard: TagStandard,
    required: Vec<CompiledSpec>,
    optional: Vec<CompiledSpec>,
    rules: Vec<CompiledRule>,
    resolver: Option<&'r VariableResolver>,
    capabilities: Box<dyn CapabilityLookup + Send + Sync + 'r>,
}

impl std::fmt::Debug for Validator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("standard", &self.standard)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl<'r> Validator<'r> {
    /// Validates and compiles `standard`, no partial validator is ever returned
    pub fn new(standard: TagStandard) -> Result<Self, StandardError> {
        standard.validate()?;

        let compile_all = |specs: &[TagSpec]| {
            specs
                .iter()
                .map(CompiledSpec::compile)
                .collect::<Result<Vec<_>, _>>()
        };
        let required = compile_all(&standard.required_tags)?;
        let optional = compile_all(&standard.optional_tags)?;

        let mut rules = vec![];
        for (index, rule) in standard.resource_rules.iter().enumerate() {
            let location = format!("resource_rules[{index}]");
            let mut builder = GlobSetBuilder::new();
            for pattern in &rule.resource_types {
                let glob = Glob::new(pattern).map_err(|source| {
                    StandardError::InvalidResourcePattern {
                        location: location.clone(),
                        pattern: pattern.clone(),
                        source,
                    }
                })?;
                builder.add(glob);
            }
            let patterns = builder
                .build()
                .map_err(|source| StandardError::InvalidResourcePattern {
                    location: location.clone(),
                    pattern: rule.resource_types.join(", "),
                    source,
                })?;

            rules.push(CompiledRule {
                patterns,
                required: rule.required_tags.clone(),
                optional: rule.optional_tags.clone(),
                excluded: rule.excluded_tags.clone(),
                overrides: compile_all(&rule.override_tags)?,
            });
        }

        Ok(Self {
            standard,
            required,
            optional,
            rules,
            resolver: None,
            capabilities: Box::new(ProviderDefaults),
        })
    }

    /// Resolve reference values with a loaded resolver
    pub fn with_resolver(mut self, resolver: &'r VariableResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl CapabilityLookup + Send + Sync + 'r) -> Self {
        self.capabilities = Box::new(capabilities);
        self
    }

    pub fn standard(&self) -> &TagStandard {
        &self.standard
    }

    pub fn resolver(&self) -> Option<&'r VariableResolver> {
        self.resolver
    }

    pub fn capability(&self, resource_type: &str) -> TaggingCapability {
        self.capabilities.capability(resource_type)
    }

    pub fn validate(&self, resource_type: &str, tags: &TagMap) -> ValidationResult {
        let capability = self.capability(resource_type);
        let mut result = ValidationResult::new(resource_type, capability);

        if self.is_globally_excluded(resource_type) || !result.supports_tagging {
            tracing::debug!(%resource_type, "not subject to tag validation");
            return result;
        }

        let effective = self.effective(resource_type);

        for compiled in &effective.required {
            let key = &compiled.spec.key;
            if tags.contains_key(key) {
                continue;
            }

            result.missing_tags.push(key.clone());
            result.suggested_fixes.push(SuggestedFix {
                tag_key: key.clone(),
                current_value: None,
                suggested_value: compiled.spec.suggested_value().map(str::to_string),
                action: FixAction::Add,
                reason: format!("Required tag '{key}' is missing"),
            });
        }

        for key in &effective.excluded {
            let Some(value) = tags.get(key) else {
                continue;
            };

            result.extra_tags.push(key.clone());
            result.suggested_fixes.push(SuggestedFix {
                tag_key: key.clone(),
                current_value: Some(value.clone()),
                suggested_value: None,
                action: FixAction::Remove,
                reason: format!("Tag '{key}' is not allowed on resource type '{resource_type}'"),
            });
        }

        for (key, value) in tags {
            let Some(compiled) = effective.spec(key) else {
                if !effective.excluded.contains(key) {
                    result.extra_tags.push(key.clone());
                    result.suggested_fixes.push(SuggestedFix {
                        tag_key: key.clone(),
                        current_value: Some(value.clone()),
                        suggested_value: None,
                        action: FixAction::Remove,
                        reason: format!("Tag '{key}' is not defined in the standard"),
                    });
                }
                continue;
            };

            tracing::trace!(%resource_type, tag=%key, "checking tag value");
            self.check_value(compiled, key, value, &mut result);
        }

        result.compliant = result.missing_tags.is_empty()
            && result.extra_tags.is_empty()
            && result.violations.is_empty();

        tracing::debug!(
            %resource_type,
            compliant = result.compliant,
            violations = result.violations.len(),
            missing = result.missing_tags.len(),
            extra = result.extra_tags.len(),
            "validated resource"
        );
        result
    }

    /// Validates every resource, results are in input order
    pub fn validate_batch(&self, resources: &[ResourceInfo]) -> Vec<ValidationResult> {
        resources
            .iter()
            .map(|resource| {
                let mut result = self.validate(&resource.resource_type, &resource.tags);
                result.resource_name = resource.name.clone();
                result.file_path = resource.file_path.clone();
                result.line_number = Some(resource.line).filter(|line| *line > 0);
                result
            })
            .collect()
    }

    fn is_globally_excluded(&self, resource_type: &str) -> bool {
        self.standard
            .global_excludes
            .iter()
            .any(|excluded| excluded == resource_type)
    }

    fn global_spec(&self, key: &str) -> Option<&CompiledSpec> {
        self.required
            .iter()
            .chain(&self.optional)
            .find(|compiled| compiled.spec.key == key)
    }

    fn effective(&self, resource_type: &str) -> Effective<'_> {
        let mut effective = Effective {
            required: self.required.iter().collect(),
            optional: self.optional.iter().collect(),
            excluded: vec![],
        };

        for rule in self.rules.iter().filter(|rule| rule.patterns.is_match(resource_type)) {
            for key in &rule.required {
                // promoted from optional
                effective.optional.retain(|compiled| &compiled.spec.key != key);
                if effective.contains(key) {
                    continue;
                }
                if let Some(compiled) = self.global_spec(key) {
                    effective.required.push(compiled);
                }
            }

            for key in &rule.optional {
                if effective.contains(key) {
                    continue;
                }
                if let Some(compiled) = self.global_spec(key) {
                    effective.optional.push(compiled);
                }
            }

            for key in &rule.excluded {
                if !effective.excluded.contains(key) {
                    effective.excluded.push(key.clone());
                }
            }

            for replacement in &rule.overrides {
                effective.apply_override(replacement);
            }
        }

        let excluded = std::mem::take(&mut effective.excluded);
        effective
            .required
            .retain(|compiled| !excluded.contains(&compiled.spec.key));
        effective
            .optional
            .retain(|compiled| !excluded.contains(&compiled.spec.key));
        effective.excluded = excluded;

        effective
    }

    /// Resolved text of a reference value, or the uncertainty
    fn resolve(&self, raw: &str) -> Result<String, String> {
        let Some(resolver) = self.resolver else {
            return Err("No variable values loaded".to_string());
        };

        let result = resolver.resolve_reference(raw);
        match result.uncertainty {
            None => Ok(result.value.to_tag_string()),
            Some(uncertainty) => Err(uncertainty),
        }
    }

    fn check_value(&self, compiled: &CompiledSpec, key: &str, raw: &str, result: &mut ValidationResult) {
        let spec = &compiled.spec;

        let resolved = if is_reference(raw) {
            match self.resolve(raw) {
                Ok(resolved) => Some(resolved),
                Err(uncertainty) => {
                    result.violations.push(TagViolation {
                        tag_key: key.to_string(),
                        tag_value: raw.to_string(),
                        kind: ViolationKind::UnresolvableValue,
                        expected: None,
                        message: format!(
                            "Tag '{key}' value '{raw}' cannot be validated: {uncertainty}"
                        ),
                    });
                    return;
                }
            }
        } else {
            None
        };

        let value = resolved.as_deref().unwrap_or(raw);
        let shown = match resolved.as_deref() {
            Some(resolved) if resolved != raw => format!("'{raw}' (resolved to '{resolved}')"),
            _ => format!("'{raw}'"),
        };

        for failure in constraints::check(spec, compiled.format.as_ref(), value) {
            let (kind, expected, problem) = match &failure {
                ConstraintFailure::NotAllowed => (
                    ViolationKind::InvalidValue,
                    format!("one of: {}", spec.allowed_values.join(", ")),
                    "is not in allowed values".to_string(),
                ),
                ConstraintFailure::Format => (
                    ViolationKind::InvalidFormat,
                    spec.format.clone().unwrap_or_default(),
                    "does not match required format".to_string(),
                ),
                ConstraintFailure::TooShort(min) => (
                    ViolationKind::LengthTooShort,
                    format!("minimum {min} characters"),
                    format!("is too short (minimum {min} characters)"),
                ),
                ConstraintFailure::TooLong(max) => (
                    ViolationKind::LengthExceeded,
                    format!("maximum {max} characters"),
                    format!("is too long (maximum {max} characters)"),
                ),
                ConstraintFailure::DataType(reason) => (
                    ViolationKind::InvalidDataType,
                    spec.data_type.map(|t| t.to_string()).unwrap_or_default(),
                    format!("has invalid data type: {reason}"),
                ),
            };

            let violation = TagViolation {
                tag_key: key.to_string(),
                tag_value: raw.to_string(),
                kind,
                expected: Some(expected),
                message: format!("Tag '{key}' value {shown} {problem}"),
            };
            result.suggested_fixes.push(suggest_fix(spec, &violation, value));
            result.violations.push(violation);
        }
    }
}

/// `var.`/`local.` prefix or an interpolation
pub fn is_reference(value: &str) -> bool {
    value.starts_with("var.") || value.starts_with("local.") || value.contains("${")
}

fn suggest_fix(spec: &TagSpec, violation: &TagViolation, value: &str) -> SuggestedFix {
    let first_example = || spec.examples.first().cloned();
    let default_value = || spec.default_value.clone();

    let (suggested_value, action) = match violation.kind {
        ViolationKind::InvalidValue => {
            let lowercase = value.to_lowercase();
            let suggestion = spec
                .allowed_values
                .iter()
                .find(|allowed| allowed.to_lowercase().contains(&lowercase))
                .or_else(|| spec.allowed_values.first())
                .cloned();
            (suggestion, FixAction::Update)
        }
        ViolationKind::InvalidFormat => (first_example().or_else(default_value), FixAction::Update),
        ViolationKind::LengthTooShort => {
            let min = spec.min_length().unwrap_or(0);
            let default_fits = spec
                .default_value
                .clone()
                .filter(|default| default.chars().count() >= min);
            (default_fits.or_else(first_example), FixAction::Update)
        }
        ViolationKind::LengthExceeded => {
            let truncated = spec
                .max_length()
                .map(|max| value.chars().take(max).collect::<String>());
            (truncated, FixAction::Format)
        }
        ViolationKind::InvalidDataType => (default_value().or_else(first_example), FixAction::Update),
        ViolationKind::MissingRequired | ViolationKind::UnresolvableValue => (None, FixAction::Update),
    };

    SuggestedFix {
        tag_key: violation.tag_key.clone(),
        current_value: Some(violation.tag_value.clone()),
        suggested_value,
        action,
        reason: violation.message.clone(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::capability::TaggingCapability;
    use crate::resolver::ResolverOptions;
    use crate::standard::CloudProvider;
    use pretty_assertions::assert_eq;

    fn tags(pairs: &[(&str, &str)]) -> TagMap {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn validator<'r>(yaml: &str) -> Validator<'r> {
        Validator::new(TagStandard::from_yaml_str(yaml).unwrap()).unwrap()
    }

    const STANDARD: &str = r#"
version: 1
cloud_provider: aws
required_tags:
  - key: Name
    data_type: string
    min_length: 1
    max_length: 10
  - key: Environment
    allowed_values: [Production, Staging, Development]
optional_tags:
  - key: Project
    min_length: 3
    default_value: shop
  - key: Backup
    allowed_values: [Daily, Weekly]
  - key: CostCenter
    format: '^CC\d{4}$'
    examples: [CC1234]
global_excludes: [aws_iam_role]
resource_rules:
  - resource_types: ["aws_s3_*"]
    required_tags: [Project]
    excluded_tags: [Backup]
  - resource_types: [aws_instance]
    override_tags:
      - key: Name
        max_length: 3
"#;

    #[test]
    fn compliant_resource() {
        let validator = validator(STANDARD);
        let result = validator.validate(
            "aws_instance",
            &tags(&[("Name", "web"), ("Environment", "production")]),
        );
        assert!(result.compliant);
        assert!(result.violations.is_empty());
        assert!(result.suggested_fixes.is_empty());
    }

    #[test]
    fn excluded_and_untaggable_resources_are_compliant() {
        let validator = validator(STANDARD);
        assert!(validator.validate("aws_iam_role", &tags(&[("Bogus", "x")])).compliant);

        let result = validator.validate("random_id", &TagMap::new());
        assert!(result.compliant);
        assert!(!result.supports_tagging);
    }

    #[test]
    fn missing_tags_get_suggestions() {
        let validator = validator(STANDARD);
        let result = validator.validate("aws_s3_bucket", &tags(&[("Name", "logs")]));
        assert!(!result.compliant);
        assert_eq!(result.missing_tags, vec!["Environment", "Project"]);
        assert_eq!(
            result
                .suggested_fixes
                .iter()
                .map(|fix| (fix.tag_key.as_str(), fix.suggested_value.as_deref(), fix.action))
                .collect::<Vec<_>>(),
            vec![
                ("Environment", Some("Production"), FixAction::Add),
                ("Project", Some("shop"), FixAction::Add),
            ]
        );
    }

    #[test]
    fn excluded_and_unknown_tags() {
        let validator = validator(STANDARD);
        let result = validator.validate(
            "aws_s3_bucket",
            &tags(&[
                ("Name", "logs"),
                ("Environment", "Staging"),
                ("Project", "shop"),
                ("Backup", "Daily"),
                ("Team", "ops"),
            ]),
        );
        assert_eq!(result.extra_tags, vec!["Backup", "Team"]);
        assert!(result.violations.is_empty());
        assert!(result
            .suggested_fixes
            .iter()
            .all(|fix| fix.action == FixAction::Remove));
        assert_eq!(
            result.suggested_fixes[0].reason,
            "Tag 'Backup' is not allowed on resource type 'aws_s3_bucket'"
        );
        assert_eq!(
            result.suggested_fixes[1].reason,
            "Tag 'Team' is not defined in the standard"
        );
    }

    #[test]
    fn overrides_replace_global_spec() {
        let validator = validator(STANDARD);
        let tags = tags(&[("Name", "webserver"), ("Environment", "Staging")]);

        assert!(validator.validate("aws_lambda_function", &tags).compliant);

        let result = validator.validate("aws_instance", &tags);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].kind, ViolationKind::LengthExceeded);
        assert_eq!(result.suggested_fixes[0].suggested_value.as_deref(), Some("web"));
        assert_eq!(result.suggested_fixes[0].action, FixAction::Format);
    }

    #[test]
    fn value_violations_and_fixes() {
        let validator = validator(STANDARD);
        let result = validator.validate(
            "aws_instance",
            &tags(&[
                ("Name", "db"),
                ("Environment", "stag"),
                ("CostCenter", "1234"),
                ("Project", "x"),
            ]),
        );

        let summary = result
            .violations
            .iter()
            .map(|violation| (violation.tag_key.as_str(), violation.kind))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                ("Environment", ViolationKind::InvalidValue),
                ("CostCenter", ViolationKind::InvalidFormat),
                ("Project", ViolationKind::LengthTooShort),
            ]
        );
        assert_eq!(
            result.violations[0].expected.as_deref(),
            Some("one of: Production, Staging, Development")
        );
        assert_eq!(
            result.violations[0].message,
            "Tag 'Environment' value 'stag' is not in allowed values"
        );

        let fixes = result
            .suggested_fixes
            .iter()
            .map(|fix| fix.suggested_value.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(fixes, vec![Some("Staging"), Some("CC1234"), Some("shop")]);
    }

    #[test]
    fn references_are_resolved() {
        let mut resolver = VariableResolver::new(ResolverOptions {
            environment: Some(vec![]),
            ..Default::default()
        });
        resolver.load_documents(crate::hcl_documents!(
            r#"
variable "project" { default = "x" }
variable "stage" { default = "Production" }
variable "unset" {}
"#
        ));

        let validator = validator(STANDARD).with_resolver(&resolver);
        let result = validator.validate(
            "aws_instance",
            &tags(&[
                ("Name", "web"),
                ("Environment", "var.stage"),
                ("Project", "var.project"),
                ("Backup", "${var.unset}"),
            ]),
        );

        assert_eq!(result.violations.len(), 2);
        assert_eq!(result.violations[0].kind, ViolationKind::LengthTooShort);
        assert_eq!(result.violations[0].tag_value, "var.project");
        assert_eq!(
            result.violations[0].message,
            "Tag 'Project' value 'var.project' (resolved to 'x') is too short (minimum 3 characters)"
        );
        assert_eq!(result.violations[1].kind, ViolationKind::UnresolvableValue);
        assert!(result.violations[1]
            .message
            .starts_with("Tag 'Backup' value '${var.unset}' cannot be validated: "));
    }

    #[test]
    fn references_without_resolver_are_unresolvable() {
        let validator = validator(STANDARD);
        let result = validator.validate(
            "aws_instance",
            &tags(&[("Name", "local.name"), ("Environment", "Staging")]),
        );
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].kind, ViolationKind::UnresolvableValue);
    }

    #[test]
    fn custom_capabilities() {
        let validator = validator(STANDARD).with_capabilities(|resource_type: &str| {
            TaggingCapability {
                supports_tagging: false,
                ..ProviderDefaults.capability(resource_type)
            }
        });
        assert!(validator.validate("aws_instance", &TagMap::new()).compliant);
    }

    #[test]
    fn batch_keeps_order() {
        let validator = Validator::new(TagStandard::example(CloudProvider::Aws)).unwrap();
        let resources = (0..5)
            .map(|index| ResourceInfo {
                resource_type: "aws_instance".to_string(),
                name: format!("r{index}"),
                file_path: None,
                line: index + 1,
                tags: tags(&[("Name", "web")]),
            })
            .collect::<Vec<_>>();

        let results = validator.validate_batch(&resources);
        assert_eq!(
            results.iter().map(|r| r.resource_name.as_str()).collect::<Vec<_>>(),
            vec!["r0", "r1", "r2", "r3", "r4"]
        );
        assert_eq!(results[2].line_number, Some(3));
    }
}
