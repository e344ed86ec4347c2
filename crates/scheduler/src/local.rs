//! One-shot scheduler
//!
//! Runs a single cluster's full component set exactly once and surfaces the
//! first failure to the caller. There is no phase ordering here: every
//! component, CRDs included, is reconciled concurrently with CRD
//! installation enabled. Good for CLI and bootstrap use, where a single
//! deterministic outcome matters more than ordering guarantees.

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::traits::{Scheduler, WorkerFactory};
use async_trait::async_trait;
use fleet_model::{Cluster, ClusterState, SchedulingId};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Scheduler for a single synchronous cluster run.
pub struct LocalScheduler {
    cluster: Cluster,
    factory: Arc<dyn WorkerFactory>,
    config: SchedulerConfig,
}

impl LocalScheduler {
    /// Creates a one-shot scheduler for `cluster`.
    pub fn new(cluster: Cluster, factory: Arc<dyn WorkerFactory>, config: SchedulerConfig) -> Self {
        Self {
            cluster,
            factory,
            config,
        }
    }
}

#[async_trait]
impl Scheduler for LocalScheduler {
    /// Reconciles every component of the cluster once and joins all tasks.
    ///
    /// Fails fast on record decode and worker factory errors, aborting the
    /// run without waiting for already-started tasks. The shutdown token is
    /// accepted for contract parity but not propagated into component work.
    async fn run(&self, _shutdown: CancellationToken) -> Result<(), SchedulerError> {
        let scheduling_id = SchedulingId::new();

        let state = ClusterState::try_from(&self.cluster)?;
        let components = state.configuration.components()?;

        if self.config.debug {
            debug!(
                "Local scheduling cycle {scheduling_id} for cluster {} with {} components",
                state.cluster.cluster,
                components.len()
            );
        }

        let mut tasks = Vec::with_capacity(components.len());
        for component in components {
            let worker = self.factory.worker_for(&component.component)?;
            let state = state.clone();
            let scheduling_id = scheduling_id.clone();
            tasks.push(tokio::spawn(async move {
                let result = worker
                    .reconcile(&component, &state, &scheduling_id, true)
                    .await;
                if let Err(e) = &result {
                    error!(
                        "Error while reconciling component {}: {e}",
                        component.component
                    );
                }
                result
            }));
        }

        let mut first_error = None;
        for task in tasks {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(SchedulerError::Join(e.to_string())),
            };
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Recorder, RecordingFactory, cluster_with_components};
    use tokio::sync::mpsc;

    fn scheduler_with(factory: RecordingFactory, components: &[&str]) -> LocalScheduler {
        LocalScheduler::new(
            cluster_with_components("dev-local", components),
            Arc::new(factory),
            SchedulerConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_all_components_reconcile_with_crd_installation() {
        let recorder = Recorder::default();
        let (done_tx, _done_rx) = mpsc::unbounded_channel();
        let factory = RecordingFactory::new(recorder.clone(), done_tx);
        let scheduler = scheduler_with(factory, &["cluster-essentials", "istio", "monitoring"]);

        scheduler.run(CancellationToken::new()).await.unwrap();

        let calls = recorder.calls();
        assert_eq!(calls.len(), 3);
        // no phase distinction locally, CRDs are installed by every call
        assert!(calls.iter().all(|c| c.install_crd));
        assert!(calls.iter().all(|c| c.scheduling_id == calls[0].scheduling_id));
    }

    #[tokio::test]
    async fn test_first_reconcile_error_is_surfaced_after_join() {
        let recorder = Recorder::default();
        let (done_tx, _done_rx) = mpsc::unbounded_channel();
        let mut factory = RecordingFactory::new(recorder.clone(), done_tx);
        factory.reconcile_failures = vec!["istio".to_string()];
        let scheduler = scheduler_with(factory, &["cluster-essentials", "istio", "monitoring"]);

        let err = scheduler.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Reconciliation { ref component, .. } if component == "istio"
        ));
        // every sibling still ran to completion before the error surfaced
        assert_eq!(recorder.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_factory_error_aborts_the_run() {
        let recorder = Recorder::default();
        let (done_tx, _done_rx) = mpsc::unbounded_channel();
        let mut factory = RecordingFactory::new(recorder.clone(), done_tx);
        factory.factory_failures = vec!["monitoring".to_string()];
        let scheduler = scheduler_with(factory, &["cluster-essentials", "monitoring", "istio"]);

        let err = scheduler.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, SchedulerError::Factory(_)));
        // components after the failing one were never dispatched
        assert!(!recorder.components().contains(&"istio".to_string()));
    }

    #[tokio::test]
    async fn test_empty_component_set_succeeds() {
        let recorder = Recorder::default();
        let (done_tx, _done_rx) = mpsc::unbounded_channel();
        let factory = RecordingFactory::new(recorder.clone(), done_tx);
        let scheduler = scheduler_with(factory, &[]);

        scheduler.run(CancellationToken::new()).await.unwrap();
        assert!(recorder.calls().is_empty());
    }
}
