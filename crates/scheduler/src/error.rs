//! Scheduler error types
//!
//! Configuration errors are fatal to the call that detects them. Factory and
//! reconciliation errors are handled differently by the two schedulers: the
//! remote scheduler logs and isolates them, the local scheduler propagates.

use fleet_model::ModelError;
use thiserror::Error;

/// Errors surfaced by the schedulers and the capability seams they call.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Worker pool size was negative
    #[error("Worker pool size cannot be < 0 (got {0})")]
    InvalidPoolSize(i64),

    /// A cluster or configuration record could not be decoded
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The worker factory could not supply a worker for a component
    #[error("Worker factory error: {0}")]
    Factory(String),

    /// A component reconciliation failed
    #[error("Reconciliation of component {component} failed: {message}")]
    Reconciliation {
        /// Component the failure belongs to
        component: String,
        /// Failure description
        message: String,
    },

    /// A reconciliation task was aborted before producing a result
    #[error("Reconciliation task failed to complete: {0}")]
    Join(String),

    /// The inventory watch failed
    #[error("Inventory watch failed: {0}")]
    Watch(String),
}
