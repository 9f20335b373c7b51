//! Full runs over temporary source trees: load, resolve, validate, report

use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Mutex;
use tagcheck::capability::ProviderDefaults;
use tagcheck::resolver::{ResolutionSource, ResolverOptions, VariableResolver};
use tagcheck::standard::TagStandard;
use tagcheck::validator::{FixAction, TagMap, Validator, ViolationKind};
use tagcheck::value::{Map, Value};

const STANDARD: &str = r#"
version: 1
cloud_provider: aws
required_tags:
  - key: Name
    data_type: string
    min_length: 1
    max_length: 50
  - key: Owner
    format: '^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$'
optional_tags:
  - key: Environment
    allowed_values: [Production, Staging, Development]
  - key: Project
    min_length: 3
"#;

fn write(dir: &Path, name: &str, text: &str) {
    std::fs::write(dir.join(name), text).unwrap();
}

fn options(environment: &[(&str, &str)]) -> ResolverOptions {
    ResolverOptions {
        environment: Some(
            environment
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        ),
        ..Default::default()
    }
}

fn load(dir: &Path, options: ResolverOptions) -> VariableResolver {
    let mut resolver = VariableResolver::new(options);
    let diagnostics = resolver.load_from_directory(dir).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    resolver
}

fn tags(pairs: &[(&str, &str)]) -> TagMap {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn validator<'r>() -> Validator<'r> {
    Validator::new(TagStandard::from_yaml_str(STANDARD).unwrap()).unwrap()
}

#[test]
fn missing_required_tag() {
    let result = validator().validate("aws_instance", &tags(&[("Name", "web")]));

    assert!(!result.compliant);
    assert_eq!(result.missing_tags, vec!["Owner"]);
    assert!(result.violations.is_empty());
    assert_eq!(result.suggested_fixes.len(), 1);
    assert_eq!(result.suggested_fixes[0].tag_key, "Owner");
    assert_eq!(result.suggested_fixes[0].action, FixAction::Add);
}

#[test]
fn value_not_allowed() {
    let result = validator().validate(
        "aws_instance",
        &tags(&[
            ("Name", "web"),
            ("Owner", "ops@example.com"),
            ("Environment", "invalid-env"),
        ]),
    );

    assert_eq!(result.violations.len(), 1);
    let violation = &result.violations[0];
    assert_eq!(violation.kind, ViolationKind::InvalidValue);
    let expected = violation.expected.as_deref().unwrap();
    for allowed in ["Production", "Staging", "Development"] {
        assert!(expected.contains(allowed), "{expected}");
    }
}

#[test]
fn allowed_values_ignore_case() {
    let result = validator().validate(
        "aws_instance",
        &tags(&[
            ("Name", "web"),
            ("Owner", "ops@example.com"),
            ("Environment", "production"),
        ]),
    );
    assert!(result.compliant);
    assert!(result.violations.is_empty());
}

#[test]
fn resolved_reference_too_short() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "variables.tf", "variable \"project\" {\n  default = \"x\"\n}\n");

    let resolver = load(dir.path(), options(&[]));
    let validator = validator().with_resolver(&resolver);
    let result = validator.validate(
        "aws_instance",
        &tags(&[
            ("Name", "web"),
            ("Owner", "ops@example.com"),
            ("Project", "var.project"),
        ]),
    );

    assert_eq!(result.violations.len(), 1);
    let violation = &result.violations[0];
    assert_eq!(violation.kind, ViolationKind::LengthTooShort);
    assert!(violation.message.contains("var.project"), "{}", violation.message);
    assert!(violation.message.contains("'x'"), "{}", violation.message);
}

#[test]
fn unresolvable_value_is_a_single_violation() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.tf", "variable \"owner\" {}\n");

    let resolver = load(dir.path(), options(&[]));
    let validator = validator().with_resolver(&resolver);
    let result = validator.validate(
        "aws_instance",
        &tags(&[("Name", "web"), ("Owner", "var.owner")]),
    );

    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].kind, ViolationKind::UnresolvableValue);
    assert_eq!(result.violations[0].tag_key, "Owner");
}

#[test]
fn failing_tag_expression_is_unresolvable() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.tf",
        r#"
variable "stage" {}

variable "code" {
  default = "x"
}

resource "aws_instance" "web" {
  tags = {
    Name        = "web"
    Owner       = "ops@example.com"
    Environment = lower(var.stage)
  }
}

resource "aws_instance" "api" {
  tags = {
    Name    = "api"
    Owner   = "ops@example.com"
    Project = upper(var.code)
  }
}
"#,
    );

    let resolver = load(dir.path(), options(&[]));
    let validator = validator().with_resolver(&resolver);
    let (resources, diagnostics) = tagcheck::resources::extract(&resolver, &ProviderDefaults);
    assert!(diagnostics.is_empty());

    let results = validator.validate_batch(&resources);
    assert_eq!(results[0].violations.len(), 1);
    let violation = &results[0].violations[0];
    assert_eq!(violation.kind, ViolationKind::UnresolvableValue);
    assert_eq!(violation.tag_key, "Environment");
    assert!(violation.message.contains("lower(var.stage)"), "{}", violation.message);

    assert_eq!(results[1].violations.len(), 1);
    let violation = &results[1].violations[0];
    assert_eq!(violation.kind, ViolationKind::LengthTooShort);
    assert!(
        violation.message.contains("'${upper(var.code)}' (resolved to 'X')"),
        "{}",
        violation.message
    );
}

#[test]
fn value_precedence() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "variables.tf", "variable \"stage\" {\n  default = \"default\"\n}\n");

    let stage = |resolver: &VariableResolver| resolver.resolve_reference("var.stage").value;

    let resolver = load(dir.path(), options(&[]));
    assert_eq!(stage(&resolver), Value::from("default"));

    let resolver = load(dir.path(), options(&[("TF_VAR_stage", "env")]));
    assert_eq!(stage(&resolver), Value::from("env"));

    write(dir.path(), "terraform.tfvars", "stage = \"file\"\n");
    let resolver = load(dir.path(), options(&[("TF_VAR_stage", "env")]));
    assert_eq!(stage(&resolver), Value::from("file"));

    write(dir.path(), "b.auto.tfvars", "stage = \"auto-b\"\n");
    write(dir.path(), "a.auto.tfvars", "stage = \"auto-a\"\n");
    let resolver = load(dir.path(), options(&[("TF_VAR_stage", "env")]));
    assert_eq!(stage(&resolver), Value::from("auto-b"));

    let mut overrides = Map::new();
    overrides.insert("stage".to_string(), Value::from("override"));
    let resolver = load(
        dir.path(),
        ResolverOptions {
            overrides,
            ..options(&[("TF_VAR_stage", "env")])
        },
    );
    assert_eq!(stage(&resolver), Value::from("override"));
}

#[test]
fn locals_reach_a_fixed_point() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "locals.tf",
        "locals {\n  a = local.b\n  b = local.c\n  c = var.x\n}\n",
    );
    write(dir.path(), "variables.tf", "variable \"x\" {\n  default = \"deep\"\n}\n");

    let resolver = load(dir.path(), options(&[]));
    for name in ["a", "b", "c"] {
        let result = resolver.resolve_reference(&format!("local.{name}"));
        assert!(result.resolved, "{name}: {:?}", result.uncertainty);
        assert_eq!(result.value, Value::from("deep"));
        assert_eq!(result.source, ResolutionSource::Local);
    }
    assert!(resolver.stats().passes <= resolver.options().max_passes);
}

#[test]
fn resolution_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.tf",
        "variable \"env\" {\n  default = \"dev\"\n}\n\nlocals {\n  name = \"app-${var.env}\"\n}\n",
    );

    let resolver = load(dir.path(), options(&[]));
    for reference in ["var.env", "local.name", "\"${local.name}-x\"", "foo.bar", "var.nope"] {
        assert_eq!(
            resolver.resolve_reference(reference),
            resolver.resolve_reference(reference),
            "{reference}"
        );
    }
}

#[test]
fn unknown_and_undeclared_references() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.tf", "variable \"declared\" {}\n");
    let resolver = load(dir.path(), options(&[]));

    let unknown = resolver.resolve_reference("foo.bar");
    assert!(!unknown.resolved);
    assert!(unknown
        .uncertainty
        .as_deref()
        .unwrap()
        .contains("Unable to identify"));

    let undeclared = resolver.resolve_reference("var.missing").uncertainty.unwrap();
    let declared = resolver.resolve_reference("var.declared").uncertainty.unwrap();
    assert_eq!(undeclared, "Variable not defined");
    assert_ne!(undeclared, declared);
}

#[test]
fn directory_run_with_report() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tag-standard.yaml", STANDARD);
    write(
        dir.path(),
        "main.tf",
        r#"
variable "owner" {
  default = "ops@example.com"
}

variable "environment" {}

locals {
  common_tags = {
    Owner       = var.owner
    Environment = "Staging"
  }
}

resource "aws_instance" "web" {
  tags = {
    Name  = "web"
    Owner = var.owner
  }
}

resource "aws_s3_bucket" "logs" {
  tags = merge(local.common_tags, { Name = "logs" })
}

resource "aws_vpc" "main" {
  tags = {
    Name        = "main"
    Environment = var.environment
  }
}

resource "random_id" "suffix" {
  byte_length = 4
}
"#,
    );
    std::fs::create_dir(dir.path().join(".terraform")).unwrap();
    write(&dir.path().join(".terraform"), "ignored.tf", "this is { not hcl");

    let resolver = load(dir.path(), options(&[("TF_VAR_environment", "Production")]));
    let standard = TagStandard::load(&dir.path().join("tag-standard.yaml")).unwrap();
    let validator = Validator::new(standard).unwrap().with_resolver(&resolver);

    let (resources, diagnostics) = tagcheck::resources::extract(&resolver, &ProviderDefaults);
    assert!(diagnostics.is_empty());
    assert_eq!(
        resources.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        vec!["web", "logs", "main", "suffix"]
    );

    let results = validator.validate_batch(&resources);
    assert!(results[0].compliant);
    assert!(results[1].compliant);
    assert_eq!(results[2].missing_tags, vec!["Owner"]);
    assert!(results[3].compliant);
    assert!(!results[3].supports_tagging);
    assert_eq!(results[0].line_number, Some(15));

    let report = tagcheck::report::create_report(results, "tag-standard.yaml");
    assert_eq!(report.total_resources, 4);
    assert_eq!(report.compliant_resources, 3);
    assert_eq!(report.summary.compliance_rate, 0.75);
    assert_eq!(report.tagging_support.resources_not_supporting_tags, 1);
    assert_eq!(
        report.summary.most_common_violations[0].violation_type,
        ViolationKind::MissingRequired
    );
}

#[test]
fn batch_order_and_concurrent_validation() {
    let validator = validator();
    let inputs = (0..32)
        .map(|index| {
            let name = format!("web-{index}");
            tags(&[("Name", name.as_str()), ("Owner", "ops@example.com")])
        })
        .collect::<Vec<_>>();

    let sequential = inputs
        .iter()
        .map(|tags| validator.validate("aws_instance", tags))
        .collect::<Vec<_>>();

    let collected = Mutex::new(vec![]);
    std::thread::scope(|scope| {
        for (index, tags) in inputs.iter().enumerate() {
            let validator = &validator;
            let collected = &collected;
            scope.spawn(move || {
                let result = validator.validate("aws_instance", tags);
                collected.lock().unwrap().push((index, result));
            });
        }
    });

    let mut collected = collected.into_inner().unwrap();
    collected.sort_by_key(|(index, _)| *index);
    let concurrent = collected
        .into_iter()
        .map(|(_, result)| result)
        .collect::<Vec<_>>();

    assert_eq!(concurrent, sequential);
    assert!(sequential.iter().all(|result| result.compliant));
}
