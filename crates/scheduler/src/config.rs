//! Scheduler configuration
//!
//! Carries the externally supplied component class lists, the worker pool
//! size and the debug flag. Component classes are disjoint at schedule time:
//! membership is checked CRD first, then pre, else normal.

use crate::error::SchedulerError;

/// Pool size used when the caller passes 0.
pub const DEFAULT_POOL_SIZE: usize = 50;

/// Class of a component within one scheduling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentClass {
    /// Provisions custom resource definitions; reconciled first, sequentially
    Crd,
    /// Reconciled after CRDs and before the general set, sequentially
    Pre,
    /// Everything else; reconciled concurrently with no ordering guarantee
    Normal,
}

/// Configuration surface consumed by the schedulers.
#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    /// Names of CRD-class components
    pub crd_components: Vec<String>,
    /// Names of pre-class components
    pub pre_components: Vec<String>,
    /// Worker pool size; 0 selects [`DEFAULT_POOL_SIZE`], negative is an error
    pub workers: i64,
    /// Enables verbose per-cycle logging
    pub debug: bool,
}

impl SchedulerConfig {
    /// Validates and normalizes the worker pool size.
    pub fn effective_pool_size(&self) -> Result<usize, SchedulerError> {
        match usize::try_from(self.workers) {
            Ok(0) => Ok(DEFAULT_POOL_SIZE),
            Ok(size) => Ok(size),
            Err(_) => Err(SchedulerError::InvalidPoolSize(self.workers)),
        }
    }

    /// Classifies a component by name, CRD list first, then pre list.
    #[must_use]
    pub fn classify(&self, component: &str) -> ComponentClass {
        if self.crd_components.iter().any(|c| c == component) {
            ComponentClass::Crd
        } else if self.pre_components.iter().any(|c| c == component) {
            ComponentClass::Pre
        } else {
            ComponentClass::Normal
        }
    }
}
