//! Fleet-mode scheduler
//!
//! Continuously converts the inbound stream of cluster states into bounded,
//! ordered, per-component reconciliation work. One pool slot processes one
//! cluster's three-phase schedule; the pool bounds cross-cluster throughput
//! only. Per-component failures are logged and isolated, never propagated to
//! the caller.

use crate::config::{ComponentClass, SchedulerConfig};
use crate::error::SchedulerError;
use crate::traits::{InventoryWatcher, Scheduler, WorkerFactory};
use async_trait::async_trait;
use fleet_model::{ClusterState, Component, SchedulingId};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Scheduler for indefinite fleet operation.
pub struct RemoteScheduler {
    inventory: Arc<dyn InventoryWatcher>,
    dispatcher: Arc<Dispatcher>,
}

impl RemoteScheduler {
    /// Creates a scheduler over the given inventory stream and worker
    /// factory. Pool size validation happens in [`Scheduler::run`].
    pub fn new(
        inventory: Arc<dyn InventoryWatcher>,
        factory: Arc<dyn WorkerFactory>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            inventory,
            dispatcher: Arc::new(Dispatcher { factory, config }),
        }
    }
}

#[async_trait]
impl Scheduler for RemoteScheduler {
    /// Runs the dispatch loop until `shutdown` is requested.
    ///
    /// Cancellation is observed only at the queue-receive point. Cluster
    /// schedules already handed to the pool, and the detached normal-phase
    /// tasks they spawned, run to completion after this returns. A closed
    /// inventory stream stops dispatch but never ends the call: the only
    /// return values are a configuration error or Ok after shutdown.
    async fn run(&self, shutdown: CancellationToken) -> Result<(), SchedulerError> {
        let pool_size = self.dispatcher.config.effective_pool_size()?;
        debug!("Starting cluster worker pool with capacity {pool_size}");

        let (queue_tx, mut queue_rx) = mpsc::channel::<ClusterState>(pool_size);
        let pool = Arc::new(Semaphore::new(pool_size));

        let inventory = Arc::clone(&self.inventory);
        let watch_shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = inventory.run(watch_shutdown, queue_tx).await {
                error!("Failed to run inventory watch: {e}");
            }
        });

        loop {
            tokio::select! {
                received = queue_rx.recv() => {
                    let Some(state) = received else {
                        // A dead watcher is not a shutdown; hold here so the
                        // supervisor never sees a clean exit it did not ask for.
                        error!("Inventory queue closed, awaiting shutdown");
                        shutdown.cancelled().await;
                        return Ok(());
                    };
                    // Acquire the pool slot off the receive loop so a
                    // saturated pool never stalls intake.
                    let pool = Arc::clone(&pool);
                    let dispatcher = Arc::clone(&self.dispatcher);
                    tokio::spawn(async move {
                        match pool.acquire_owned().await {
                            Ok(_permit) => dispatcher.schedule(state).await,
                            Err(e) => {
                                error!("Failed to pass cluster to pool worker: {e}");
                            }
                        }
                    });
                }
                () = shutdown.cancelled() => {
                    debug!("Stopping remote scheduler because shutdown was requested");
                    return Ok(());
                }
            }
        }
    }
}

/// Per-cluster scheduling logic shared by all pool slots.
struct Dispatcher {
    factory: Arc<dyn WorkerFactory>,
    config: SchedulerConfig,
}

impl Dispatcher {
    /// Runs one cluster's three-phase schedule within a pool slot.
    ///
    /// CRD components first, sequentially and with CRD installation enabled;
    /// then pre components, sequentially; then everything else as detached
    /// concurrent tasks whose handles are intentionally dropped. The call
    /// returns without waiting for the normal phase.
    async fn schedule(self: Arc<Self>, state: ClusterState) {
        let scheduling_id = SchedulingId::new();

        let components = match state.configuration.components() {
            Ok(components) => components,
            Err(e) => {
                error!(
                    "Failed to get components for cluster {}: {e}",
                    state.cluster.cluster
                );
                return;
            }
        };

        if components.is_empty() {
            info!(
                "No components to reconcile for cluster {}",
                state.cluster.cluster
            );
            return;
        }

        if self.config.debug {
            debug!(
                "Scheduling cycle {scheduling_id} for cluster {} with {} components",
                state.cluster.cluster,
                components.len()
            );
        }

        for component in &components {
            if self.config.classify(&component.component) == ComponentClass::Crd {
                self.reconcile(component.clone(), state.clone(), scheduling_id.clone(), true)
                    .await;
            }
        }

        for component in &components {
            if self.config.classify(&component.component) == ComponentClass::Pre {
                self.reconcile(component.clone(), state.clone(), scheduling_id.clone(), false)
                    .await;
            }
        }

        for component in &components {
            if self.config.classify(&component.component) != ComponentClass::Normal {
                continue;
            }
            let dispatcher = Arc::clone(&self);
            let component = component.clone();
            let state = state.clone();
            let scheduling_id = scheduling_id.clone();
            tokio::spawn(async move {
                dispatcher
                    .reconcile(component, state, scheduling_id, false)
                    .await;
            });
        }
    }

    /// Reconciles one component, isolating factory and worker failures.
    async fn reconcile(
        &self,
        component: Component,
        state: ClusterState,
        scheduling_id: SchedulingId,
        install_crd: bool,
    ) {
        let worker = match self.factory.worker_for(&component.component) {
            Ok(worker) => worker,
            Err(e) => {
                error!(
                    "Error creating worker for component {}: {e}",
                    component.component
                );
                return;
            }
        };
        if let Err(e) = worker
            .reconcile(&component, &state, &scheduling_id, install_crd)
            .await
        {
            error!(
                "Error while reconciling component {}: {e}",
                component.component
            );
        }
    }
}
