//! aggregation of validation results
use crate::validator::{ValidationResult, ViolationKind};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidationReport {
    pub timestamp: DateTime<Utc>,
    pub standard_file: String,
    pub total_resources: usize,
    pub compliant_resources: usize,
    pub non_compliant_resources: usize,
    pub tagging_support: TaggingSupportSummary,
    pub summary: ValidationSummary,
    pub results: Vec<ValidationResult>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ValidationSummary {
    pub compliance_rate: f64,
    /// count descending
    pub most_common_violations: Vec<ViolationCount>,
    pub resource_type_breakdown: BTreeMap<String, ComplianceBreakdown>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ViolationCount {
    pub violation_type: ViolationKind,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ComplianceBreakdown {
    pub total: usize,
    pub compliant: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct TaggingSupportSummary {
    pub total_resources_analyzed: usize,
    pub resources_supporting_tags: usize,
    pub resources_not_supporting_tags: usize,
    pub tagging_support_rate: f64,
    pub service_breakdown: BTreeMap<String, ServiceTaggingInfo>,
    pub category_breakdown: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ServiceTaggingInfo {
    pub total_resources: usize,
    pub taggable_resources: usize,
    pub tagging_rate: f64,
}

/// 0 for an empty population
fn rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

pub fn create_report(results: Vec<ValidationResult>, standard_file: impl Into<String>) -> ValidationReport {
    create_report_at(results, standard_file, Utc::now())
}

pub fn create_report_at(
    results: Vec<ValidationResult>,
    standard_file: impl Into<String>,
    timestamp: DateTime<Utc>,
) -> ValidationReport {
    let mut compliant_resources = 0;
    let mut violation_counts: BTreeMap<ViolationKind, usize> = BTreeMap::new();
    let mut resource_type_breakdown: BTreeMap<String, ComplianceBreakdown> = BTreeMap::new();
    let mut tagging_support = TaggingSupportSummary::default();

    for result in &results {
        if result.compliant {
            compliant_resources += 1;
        }

        for violation in &result.violations {
            *violation_counts.entry(violation.kind).or_default() += 1;
        }
        if !result.missing_tags.is_empty() {
            *violation_counts.entry(ViolationKind::MissingRequired).or_default() +=
                result.missing_tags.len();
        }

        let breakdown = resource_type_breakdown
            .entry(result.resource_type.clone())
            .or_default();
        breakdown.total += 1;
        if result.compliant {
            breakdown.compliant += 1;
        }
        breakdown.rate = rate(breakdown.compliant, breakdown.total);

        tagging_support.total_resources_analyzed += 1;
        if result.supports_tagging {
            tagging_support.resources_supporting_tags += 1;
        } else {
            tagging_support.resources_not_supporting_tags += 1;
        }

        let service = tagging_support
            .service_breakdown
            .entry(result.tagging_capability.service.clone())
            .or_default();
        service.total_resources += 1;
        if result.supports_tagging {
            service.taggable_resources += 1;
        }
        service.tagging_rate = rate(service.taggable_resources, service.total_resources);

        *tagging_support
            .category_breakdown
            .entry(result.tagging_capability.category.clone())
            .or_default() += 1;
    }

    tagging_support.tagging_support_rate = rate(
        tagging_support.resources_supporting_tags,
        tagging_support.total_resources_analyzed,
    );

    let mut most_common_violations = violation_counts
        .into_iter()
        .map(|(violation_type, count)| ViolationCount {
            violation_type,
            count,
        })
        .collect::<Vec<_>>();
    // stable, ties stay in kind order
    most_common_violations.sort_by(|a, b| b.count.cmp(&a.count));

    let total_resources = results.len();
    tracing::debug!(
        total_resources,
        compliant_resources,
        "created validation report"
    );

    ValidationReport {
        timestamp,
        standard_file: standard_file.into(),
        total_resources,
        compliant_resources,
        non_compliant_resources: total_resources - compliant_resources,
        tagging_support,
        summary: ValidationSummary {
            compliance_rate: rate(compliant_resources, total_resources),
            most_common_violations,
            resource_type_breakdown,
        },
        results,
    }
}
