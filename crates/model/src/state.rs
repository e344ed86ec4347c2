//! Cluster state records
//!
//! The record aggregate is immutable for the duration of one scheduling
//! cycle. Record payloads (runtime, metadata, components, administrators)
//! are held as serialized JSON, matching their storage representation;
//! decoding the component list is a hard error for the cycle that needs it.

use crate::cluster::Cluster;
use crate::component::Component;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Contract version stamped on records created from an inbound descriptor.
const DEFAULT_CONTRACT_VERSION: i64 = 1;

/// Identity and access record of a managed cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Cluster name
    pub cluster: String,
    /// Runtime description, serialized JSON
    pub runtime: String,
    /// Caller metadata, serialized JSON
    pub metadata: String,
    /// Kubeconfig granting access to the cluster
    pub kubeconfig: String,
    /// Contract version of the record
    pub contract: i64,
}

/// Desired configuration record of a managed cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    /// Cluster the configuration belongs to
    pub cluster: String,
    /// Release version of the component set
    pub version: String,
    /// Deployment profile
    pub profile: String,
    /// Component list, serialized JSON
    pub components: String,
    /// Administrators, serialized JSON
    pub administrators: String,
    /// Contract version of the record
    pub contract: i64,
}

impl ConfigurationRecord {
    /// Decodes the ordered component list of this configuration.
    ///
    /// Decode failures are hard errors for the scheduling cycle; the caller
    /// decides whether that aborts the run or only this cluster's cycle.
    pub fn components(&self) -> Result<Vec<Component>, ModelError> {
        serde_json::from_str(&self.components).map_err(|source| ModelError::InvalidComponents {
            cluster: self.cluster.clone(),
            source,
        })
    }
}

/// Reconciliation status of a managed cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStatus {
    /// Reconciliation requested but not started
    #[default]
    ReconcilePending,
    /// A scheduling cycle is in flight
    Reconciling,
    /// Last cycle finished without component failures
    Ready,
    /// Last cycle reported component failures
    Error,
}

/// Status record of a managed cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Current reconciliation status
    pub status: ClusterStatus,
}

/// Immutable-per-cycle aggregate of one cluster's records.
#[derive(Debug, Clone)]
pub struct ClusterState {
    /// Identity and access record
    pub cluster: ClusterRecord,
    /// Desired configuration record
    pub configuration: ConfigurationRecord,
    /// Status record
    pub status: StatusRecord,
}

impl TryFrom<&Cluster> for ClusterState {
    type Error = ModelError;

    /// Builds the record aggregate for a cluster supplied directly by a
    /// caller, stamping the default contract version.
    fn try_from(cluster: &Cluster) -> Result<Self, Self::Error> {
        let metadata = serde_json::to_string(&cluster.metadata)?;
        let runtime = serde_json::to_string(&cluster.runtime_input)?;
        let components = serde_json::to_string(&cluster.configuration.components)?;
        let administrators = serde_json::to_string(&cluster.configuration.administrators)?;

        Ok(Self {
            cluster: ClusterRecord {
                cluster: cluster.cluster.clone(),
                runtime,
                metadata,
                kubeconfig: cluster.kubeconfig.clone(),
                contract: DEFAULT_CONTRACT_VERSION,
            },
            configuration: ConfigurationRecord {
                cluster: cluster.cluster.clone(),
                version: cluster.configuration.version.clone(),
                profile: cluster.configuration.profile.clone(),
                components,
                administrators,
                contract: DEFAULT_CONTRACT_VERSION,
            },
            status: StatusRecord::default(),
        })
    }
}
