//! tagging capability of resource types
//!
//! Whether a resource type can carry tags (and under which attribute) is provider knowledge the
//! validator asks for through [CapabilityLookup]. [ProviderDefaults] decides from the resource
//! type prefix only. Any `Fn(&str) -> TaggingCapability` is a lookup as well.

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TaggingCapability {
    pub supports_tagging: bool,
    /// `tags` for aws/azure, `labels` for google
    pub tag_attribute_name: String,
    pub provider_supported: bool,
    pub service: String,
    pub category: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

pub trait CapabilityLookup {
    fn capability(&self, resource_type: &str) -> TaggingCapability;
}

impl<F> CapabilityLookup for F
where
    F: Fn(&str) -> TaggingCapability,
{
    fn capability(&self, resource_type: &str) -> TaggingCapability {
        self(resource_type)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProviderDefaults;

impl CapabilityLookup for ProviderDefaults {
    fn capability(&self, resource_type: &str) -> TaggingCapability {
        let provider = [
            ("aws_", "tags", "AWS resource supports tags"),
            ("google_", "labels", "Google resource supports labels"),
            ("azurerm_", "tags", "Azure resource supports tags"),
            ("azapi_", "tags", "Azure resource supports tags"),
        ]
        .into_iter()
        .find(|(prefix, _, _)| resource_type.starts_with(prefix));

        let Some((prefix, attribute, reason)) = provider else {
            return TaggingCapability {
                supports_tagging: false,
                tag_attribute_name: "tags".to_string(),
                provider_supported: false,
                service: "unknown".to_string(),
                category: "unknown".to_string(),
                reason: "Unknown provider or resource type".to_string(),
            };
        };

        let service = if prefix == "azapi_" {
            "azapi"
        } else {
            resource_type[prefix.len()..]
                .split('_')
                .next()
                .filter(|service| !service.is_empty())
                .unwrap_or("unknown")
        };

        TaggingCapability {
            supports_tagging: true,
            tag_attribute_name: attribute.to_string(),
            provider_supported: true,
            service: service.to_string(),
            category: "taggable".to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn prefixes() {
        let aws = ProviderDefaults.capability("aws_s3_bucket");
        assert!(aws.supports_tagging);
        assert_eq!(aws.service, "s3");
        assert_eq!(aws.tag_attribute_name, "tags");

        let google = ProviderDefaults.capability("google_compute_instance");
        assert_eq!(google.tag_attribute_name, "labels");
        assert_eq!(google.service, "compute");

        assert_eq!(ProviderDefaults.capability("azapi_resource").service, "azapi");

        let unknown = ProviderDefaults.capability("random_id");
        assert!(!unknown.supports_tagging);
        assert!(!unknown.provider_supported);
    }

    #[test]
    fn closures_are_lookups() {
        let lookup = |resource_type: &str| TaggingCapability {
            supports_tagging: resource_type == "custom",
            ..ProviderDefaults.capability(resource_type)
        };
        assert!(lookup.capability("custom").supports_tagging);
        assert!(!lookup.capability("aws_instance").supports_tagging);
    }
}
