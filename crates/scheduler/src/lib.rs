//! Fleet reconciliation schedulers
//!
//! Two schedulers share one contract:
//! - [`RemoteScheduler`] runs forever, pulling cluster states from an
//!   inventory watcher through a bounded queue and dispatching each cluster
//!   to a bounded pool, with CRD components reconciled before pre components
//!   and everything else fanned out concurrently.
//! - [`LocalScheduler`] runs one cluster's full component set exactly once
//!   and surfaces the first failure to its caller.
//!
//! The actual component installation logic is behind the [`Worker`] seam;
//! implementations are supplied by the surrounding system.

pub mod config;
pub mod error;
pub mod local;
pub mod remote;
pub mod traits;

#[cfg(test)]
mod test_utils;

pub use config::{ComponentClass, SchedulerConfig};
pub use error::SchedulerError;
pub use local::LocalScheduler;
pub use remote::RemoteScheduler;
pub use traits::{InventoryWatcher, Scheduler, Worker, WorkerFactory};
