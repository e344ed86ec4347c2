//! Component descriptors
//!
//! A component is one named unit of installable software on a managed
//! cluster. The scheduler classifies components into CRD, pre and normal
//! classes at schedule time; the descriptor itself carries no class.

use serde::{Deserialize, Serialize};

/// One component of a cluster configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Component name, unique within one configuration
    pub component: String,

    /// Target namespace for the component's resources
    #[serde(default)]
    pub namespace: String,

    /// Component version to install
    #[serde(default)]
    pub version: String,

    /// Deployment profile (e.g. "production", "evaluation")
    #[serde(default)]
    pub profile: String,

    /// Optional source URL overriding the default component location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Configuration values handed to the component installer
    #[serde(default)]
    pub configuration: Vec<ConfigurationValue>,
}

impl Component {
    /// Creates a component with just a name, everything else defaulted.
    pub fn named(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            namespace: String::new(),
            version: String::new(),
            profile: String::new(),
            url: None,
            configuration: Vec::new(),
        }
    }
}

/// A single key/value configuration entry of a component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigurationValue {
    /// Configuration key
    pub key: String,
    /// Arbitrary configuration value
    #[serde(default)]
    pub value: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_decodes_with_defaults() {
        let component: Component =
            serde_json::from_str(r#"{"component": "istio"}"#).unwrap();
        assert_eq!(component.component, "istio");
        assert_eq!(component.namespace, "");
        assert!(component.configuration.is_empty());
        assert!(component.url.is_none());
    }

    #[test]
    fn test_component_decodes_configuration_values() {
        let component: Component = serde_json::from_str(
            r#"{
                "component": "monitoring",
                "namespace": "monitoring-system",
                "version": "2.4.1",
                "configuration": [
                    {"key": "global.domain", "value": "example.org"},
                    {"key": "replicas", "value": 3}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(component.namespace, "monitoring-system");
        assert_eq!(component.configuration.len(), 2);
        assert_eq!(component.configuration[1].value, serde_json::json!(3));
    }
}
