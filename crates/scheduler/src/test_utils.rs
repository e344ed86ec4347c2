//! Test doubles for scheduler unit tests
//!
//! Recording worker/factory pair and scripted inventory watchers. The
//! recorder keeps every reconcile call; completion of asynchronous phases is
//! observed through an unbounded done-channel.

use crate::error::SchedulerError;
use crate::traits::{InventoryWatcher, Worker, WorkerFactory};
use async_trait::async_trait;
use fleet_model::{
    Cluster, ClusterConfiguration, ClusterState, Component, SchedulingId,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One observed reconcile call.
#[derive(Debug, Clone)]
pub struct ReconcileCall {
    pub component: String,
    pub scheduling_id: SchedulingId,
    pub install_crd: bool,
}

/// Shared call log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<ReconcileCall>>>,
}

impl Recorder {
    pub fn record(&self, call: ReconcileCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<ReconcileCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn components(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.component).collect()
    }
}

struct RecordingWorker {
    component: String,
    recorder: Recorder,
    done: mpsc::UnboundedSender<String>,
    fail: bool,
}

#[async_trait]
impl Worker for RecordingWorker {
    async fn reconcile(
        &self,
        component: &Component,
        _state: &ClusterState,
        scheduling_id: &SchedulingId,
        install_crd: bool,
    ) -> Result<(), SchedulerError> {
        self.recorder.record(ReconcileCall {
            component: component.component.clone(),
            scheduling_id: scheduling_id.clone(),
            install_crd,
        });
        let _ = self.done.send(component.component.clone());
        if self.fail {
            return Err(SchedulerError::Reconciliation {
                component: self.component.clone(),
                message: "scripted failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Factory producing recording workers, with scripted failures.
pub struct RecordingFactory {
    pub recorder: Recorder,
    pub done: mpsc::UnboundedSender<String>,
    /// Components for which `worker_for` fails
    pub factory_failures: Vec<String>,
    /// Components whose reconcile call fails
    pub reconcile_failures: Vec<String>,
}

impl RecordingFactory {
    pub fn new(recorder: Recorder, done: mpsc::UnboundedSender<String>) -> Self {
        Self {
            recorder,
            done,
            factory_failures: Vec::new(),
            reconcile_failures: Vec::new(),
        }
    }
}

impl WorkerFactory for RecordingFactory {
    fn worker_for(&self, component: &str) -> Result<Arc<dyn Worker>, SchedulerError> {
        if self.factory_failures.iter().any(|c| c == component) {
            return Err(SchedulerError::Factory(format!(
                "no worker registered for component {component}"
            )));
        }
        Ok(Arc::new(RecordingWorker {
            component: component.to_string(),
            recorder: self.recorder.clone(),
            done: self.done.clone(),
            fail: self.reconcile_failures.iter().any(|c| c == component),
        }))
    }
}

/// Inventory watcher sending a fixed set of states, then idling until
/// shutdown so the queue stays open.
pub struct StaticInventory {
    pub states: Vec<ClusterState>,
    pub started: Arc<AtomicBool>,
}

impl StaticInventory {
    pub fn new(states: Vec<ClusterState>) -> Self {
        Self {
            states,
            started: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl InventoryWatcher for StaticInventory {
    async fn run(
        &self,
        shutdown: CancellationToken,
        queue: mpsc::Sender<ClusterState>,
    ) -> Result<(), SchedulerError> {
        self.started.store(true, Ordering::SeqCst);
        for state in self.states.clone() {
            if queue.send(state).await.is_err() {
                break;
            }
        }
        shutdown.cancelled().await;
        Ok(())
    }
}

/// Inventory watcher that fails immediately, dropping its queue sender.
pub struct FailingInventory;

#[async_trait]
impl InventoryWatcher for FailingInventory {
    async fn run(
        &self,
        _shutdown: CancellationToken,
        queue: mpsc::Sender<ClusterState>,
    ) -> Result<(), SchedulerError> {
        drop(queue);
        Err(SchedulerError::Watch("scripted watch failure".to_string()))
    }
}

/// Builds a cluster state whose configuration holds the given components.
pub fn state_with_components(cluster: &str, components: &[&str]) -> ClusterState {
    let descriptor = cluster_with_components(cluster, components);
    ClusterState::try_from(&descriptor).unwrap()
}

/// Builds an inbound cluster descriptor with the given components.
pub fn cluster_with_components(cluster: &str, components: &[&str]) -> Cluster {
    Cluster {
        cluster: cluster.to_string(),
        kubeconfig: String::new(),
        runtime_input: serde_json::json!({}),
        metadata: serde_json::json!({}),
        configuration: ClusterConfiguration {
            version: "1.0.0".to_string(),
            profile: "evaluation".to_string(),
            administrators: Vec::new(),
            components: components.iter().map(|c| Component::named(*c)).collect(),
        },
    }
}
