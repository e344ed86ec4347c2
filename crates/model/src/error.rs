//! Model errors

use thiserror::Error;

/// Errors raised while decoding cluster or configuration records.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A record field could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The component list of a configuration record could not be decoded
    #[error("Failed to decode components for cluster {cluster}: {source}")]
    InvalidComponents {
        /// Cluster the configuration record belongs to
        cluster: String,
        /// Underlying decode error
        source: serde_json::Error,
    },
}
