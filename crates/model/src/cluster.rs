//! Inbound cluster descriptors
//!
//! The descriptor is the payload handed to the one-shot scheduler by a caller
//! (bootstrap tooling, CLI). It is converted into the record aggregate in
//! [`crate::state`] before any scheduling happens.

use crate::component::Component;
use serde::{Deserialize, Serialize};

/// A managed cluster as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Cluster name (unique within the fleet)
    pub cluster: String,

    /// Kubeconfig granting access to the cluster
    #[serde(default)]
    pub kubeconfig: String,

    /// Free-form runtime description (region, provider, instance types)
    #[serde(default)]
    pub runtime_input: serde_json::Value,

    /// Free-form metadata attached by the caller
    #[serde(default)]
    pub metadata: serde_json::Value,

    /// Desired configuration of the cluster
    pub configuration: ClusterConfiguration,
}

/// Desired component configuration of one cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfiguration {
    /// Release version the component set belongs to
    #[serde(default)]
    pub version: String,

    /// Deployment profile applied to all components
    #[serde(default)]
    pub profile: String,

    /// Cluster administrators (email addresses)
    #[serde(default)]
    pub administrators: Vec<String>,

    /// Ordered component list
    #[serde(default)]
    pub components: Vec<Component>,
}
