//! resource extraction
//!
//! Every `resource "TYPE" "NAME"` block of the loaded documents becomes a [ResourceInfo] with its
//! tag map taken from the attribute the provider uses (`tags`, or `labels` for google).
//!
//! Tag values are kept the way the validator needs them:
//!
//! | written as | stored as |
//! |------------|-----------|
//! | `"production"`, `42`, `true` | the literal, `production` |
//! | `var.stage`, `local.tags["team"]` | the reference text |
//! | `"${var.project}-web"` | the template contents, `${var.project}-web` |
//! | anything else (`upper(var.x)`) | wrapped as an interpolation, `${upper(var.x)}` |
//!
//! A tag attribute that is not an object literal (`tags = merge(local.common, {...})`) is
//! evaluated as a whole. When that fails the resource is kept with an empty tag map and an
//! [ExtractionDiagnostic].
use crate::capability::CapabilityLookup;
use crate::declarations::Location;
use crate::expression::{Expression, HclExpression};
use crate::hcl_documents::SourceFile;
use crate::resolver::VariableResolver;
use crate::util::unquote;
use crate::validator::{is_reference, TagMap};
use crate::value::Value;
use hcl_edit::expr::{Expression as EditExpression, ObjectKey};
use hcl_edit::structure::Block;
use hcl_edit::Span;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResourceInfo {
    pub resource_type: String,
    pub name: String,
    pub file_path: Option<PathBuf>,
    /// 1-based, 0 when unknown
    pub line: usize,
    pub tags: TagMap,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ExtractionDiagnostic {
    pub location: Location,
    pub resource: String,
    pub message: String,
}

impl std::fmt::Display for ExtractionDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.resource, self.message)
    }
}

/// Resources of all documents loaded into `resolver`, in document order
pub fn extract(
    resolver: &VariableResolver,
    capabilities: &dyn CapabilityLookup,
) -> (Vec<ResourceInfo>, Vec<ExtractionDiagnostic>) {
    let mut resources = vec![];
    let mut diagnostics = vec![];

    for (_, source, block) in resolver.documents().blocks() {
        if block.ident.value().as_str() != "resource" {
            continue;
        }

        let (Some(resource_type), Some(name)) = (block.labels.first(), block.labels.get(1)) else {
            diagnostics.push(ExtractionDiagnostic {
                location: Location::of(source, block.span()),
                resource: "resource".to_string(),
                message: "resource block needs a type and a name label".to_string(),
            });
            continue;
        };

        let resource_type = resource_type.as_str().to_string();
        let attribute_name = capabilities.capability(&resource_type).tag_attribute_name;
        let mut resource = ResourceInfo {
            resource_type,
            name: name.as_str().to_string(),
            file_path: source.path.clone(),
            line: Location::of(source, block.span()).line,
            tags: TagMap::new(),
        };

        if let Err(message) = read_block_tags(resolver, block, &attribute_name, &mut resource.tags) {
            tracing::warn!(resource_type=%resource.resource_type, name=%resource.name, %message, "tags not extracted");
            diagnostics.push(ExtractionDiagnostic {
                location: Location::of(source, block.span()),
                resource: format!("{}.{}", resource.resource_type, resource.name),
                message,
            });
        }

        tracing::trace!(resource_type=%resource.resource_type, name=%resource.name, tags=resource.tags.len(), "extracted resource");
        resources.push(resource);
    }

    for (source, document) in resolver.documents().json_documents() {
        extract_json(source, document, capabilities, &mut resources);
    }

    tracing::debug!(
        resources = resources.len(),
        diagnostics = diagnostics.len(),
        "resource extraction finished"
    );
    (resources, diagnostics)
}

fn read_block_tags(
    resolver: &VariableResolver,
    block: &Block,
    attribute_name: &str,
    tags: &mut TagMap,
) -> Result<(), String> {
    let Some(attribute) = block
        .body
        .attributes()
        .find(|attribute| attribute.key.value().as_str() == attribute_name)
    else {
        return Ok(());
    };

    let EditExpression::Object(object) = &attribute.value else {
        let value = resolver
            .evaluate(&HclExpression::new(attribute.value.clone().into()))
            .map_err(|diagnostic| format!("{attribute_name} could not be evaluated: {diagnostic}"))?;
        let Value::Map(map) = value else {
            return Err(format!(
                "{attribute_name} must be a map, got {}",
                value.type_name()
            ));
        };

        for (key, value) in map {
            tags.insert(key, value.to_tag_string());
        }
        return Ok(());
    };

    for (key, value) in object.iter() {
        let key = match key {
            ObjectKey::Ident(ident) => ident.value().as_str().to_string(),
            ObjectKey::Expression(EditExpression::String(key)) => key.value().clone(),
            ObjectKey::Expression(expr) => expression_text(expr),
        };
        tags.insert(key, tag_value(value.expr()));
    }

    Ok(())
}

fn tag_value(expr: &EditExpression) -> String {
    if let EditExpression::String(value) = expr {
        return value.value().clone();
    }

    let expression = HclExpression::new(expr.clone().into());
    if let Some(value) = expression.literal() {
        return value.to_tag_string();
    }

    let text = expression_text(expr);
    if let EditExpression::StringTemplate(_) = expr {
        return unquote(&text).unwrap_or(&text).to_string();
    }
    if is_reference(&text) {
        return text;
    }

    // validated through the resolver, which reports a failing expression as unresolvable
    format!("${{{text}}}")
}

fn expression_text(expr: &EditExpression) -> String {
    expr.to_string().trim().to_string()
}

/// `{"resource": {"TYPE": {"NAME": {"tags": {...}}}}}`
fn extract_json(
    source: &SourceFile,
    document: &serde_json::Value,
    capabilities: &dyn CapabilityLookup,
    resources: &mut Vec<ResourceInfo>,
) {
    let Some(types) = document.get("resource").and_then(|r| r.as_object()) else {
        return;
    };

    for (resource_type, instances) in types {
        let Some(instances) = instances.as_object() else {
            continue;
        };
        let attribute_name = capabilities.capability(resource_type).tag_attribute_name;

        for (name, body) in instances {
            let tags = body
                .get(&attribute_name)
                .and_then(|tags| tags.as_object())
                .map(|tags| {
                    tags.iter()
                        .map(|(key, value)| {
                            let value = match value {
                                serde_json::Value::String(s) => s.clone(),
                                other => Value::from(other.clone()).to_tag_string(),
                            };
                            (key.clone(), value)
                        })
                        .collect()
                })
                .unwrap_or_default();

            resources.push(ResourceInfo {
                resource_type: resource_type.clone(),
                name: name.clone(),
                file_path: source.path.clone(),
                line: 0,
                tags,
            });
        }
    }
}
