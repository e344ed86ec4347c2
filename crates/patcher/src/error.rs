//! Patch engine errors
//!
//! Conflicts are retryable, invalid patches are retryable only through the
//! force path, identity changes are a distinct fatal error so callers can
//! react specifically, and everything else propagates as-is.

use kube::error::ErrorResponse;
use thiserror::Error;

/// Errors surfaced by the patch engine.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Identity precondition failed: the merge changed apiVersion, kind or
    /// metadata.name between the original and desired object
    #[error("At least one of apiVersion, kind and name was changed")]
    IdentityChanged,

    /// The live object drifted on a field the patch also changes and
    /// overwrite is disabled
    #[error("Live object conflicts with the desired state at {0}; enable overwrite to replace live changes")]
    MergeConflict(String),

    /// The deleted object was still present when the wait timeout expired
    #[error("Timed out waiting for {namespace}/{name} to be deleted")]
    DeletionTimeout {
        /// Namespace of the object
        namespace: String,
        /// Name of the object
        name: String,
    },

    /// Force-recreate failed and restoring the previous object failed too
    #[error(
        "An error occurred force-replacing the existing object with the newly provided one: {create}. \
         Additionally, an error occurred attempting to restore the original object: {restore}"
    )]
    ReplaceAndRestoreFailed {
        /// The create failure for the desired object
        create: Box<PatchError>,
        /// The failure restoring the previous object
        restore: Box<PatchError>,
    },
}

impl PatchError {
    /// True for optimistic-concurrency write conflicts (HTTP 409).
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Kube(e) if status_code(e) == Some(409))
    }

    /// True when the server rejected the patch as structurally invalid
    /// (HTTP 422).
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Kube(e) if status_code(e) == Some(422))
    }
}

/// Status code of a Kubernetes API error response, if any.
#[must_use]
pub fn status_code(err: &kube::Error) -> Option<u16> {
    match err {
        kube::Error::Api(ErrorResponse { code, .. }) => Some(*code),
        _ => None,
    }
}

/// True when the API reported the object as absent (HTTP 404).
#[must_use]
pub fn is_not_found(err: &kube::Error) -> bool {
    status_code(err) == Some(404)
}
