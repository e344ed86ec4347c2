//! Capability seams of the scheduler
//!
//! These traits abstract the collaborators the schedulers drive: the
//! inventory stream, the worker factory and the per-component reconciliation
//! capability. Implementations are supplied by the surrounding system and
//! must be safe to call concurrently from many tasks.

use crate::error::SchedulerError;
use async_trait::async_trait;
use fleet_model::{ClusterState, Component, SchedulingId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Common contract of the remote and local schedulers.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Runs the scheduler until completion (local) or shutdown (remote).
    async fn run(&self, shutdown: CancellationToken) -> Result<(), SchedulerError>;
}

/// Produces the live stream of cluster states requiring reconciliation.
#[async_trait]
pub trait InventoryWatcher: Send + Sync {
    /// Pushes cluster states into `queue` until `shutdown` is requested.
    ///
    /// The return value is logged by the scheduler, never acted on: a failed
    /// watch stops the inventory stream but not in-flight scheduling.
    async fn run(
        &self,
        shutdown: CancellationToken,
        queue: mpsc::Sender<ClusterState>,
    ) -> Result<(), SchedulerError>;
}

/// Yields workers able to reconcile exactly one named component.
pub trait WorkerFactory: Send + Sync {
    /// Returns the worker responsible for `component`.
    fn worker_for(&self, component: &str) -> Result<Arc<dyn Worker>, SchedulerError>;
}

/// Reconciles one component against a cluster state.
///
/// The single extension point for actual component installation logic.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Reconciles `component` on the cluster described by `state`.
    ///
    /// `install_crd` tells the worker whether this call is expected to
    /// install custom resource definitions shipped with the component.
    async fn reconcile(
        &self,
        component: &Component,
        state: &ClusterState,
        scheduling_id: &SchedulingId,
        install_crd: bool,
    ) -> Result<(), SchedulerError>;
}
