//! Patch application state machine
//!
//! Computes the minimal patch from last-applied, desired and live documents,
//! submits it, and retries write conflicts with a fixed backoff against a
//! freshly fetched live object. When retries are exhausted on a conflict, or
//! the server rejects the patch as structurally invalid, force mode replaces
//! the object outright: delete, wait for absence, recreate. If recreation
//! fails the previous object is restored.

use crate::error::{self, PatchError};
use crate::helper::{PatchType, ResourceHelper};
use crate::meta::PatchMetaLookup;
use crate::{builtin, mergepatch, strategic};
use kube::api::{DeleteParams, DynamicObject, GroupVersionKind, PropagationPolicy};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Annotation holding the configuration last applied to the object, the
/// `original` input of the three-way merge.
pub const LAST_APPLIED_CONFIG_ANNOTATION: &str =
    "kubectl.kubernetes.io/last-applied-configuration";

/// Conflict retries when the caller does not pick a count.
const MAX_PATCH_RETRY: u32 = 5;
/// Fixed pause between conflict retries once backoff kicks in.
const BACKOFF_PERIOD: Duration = Duration::from_secs(1);
/// Retries attempted immediately before backoff kicks in.
const TRIES_BEFORE_BACKOFF: u32 = 1;
/// Poll interval while waiting for a deleted object to disappear.
const DELETION_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Tunables of one patch application.
#[derive(Debug, Clone)]
pub struct PatcherConfig {
    /// Replace live changes on fields the patch also touches; disabling this
    /// turns such drift into a merge conflict
    pub overwrite: bool,
    /// Delete and recreate the object when patching keeps conflicting or the
    /// patch is structurally invalid
    pub force: bool,
    /// Propagate a force deletion to dependents (foreground cascade); when
    /// disabled dependents are orphaned
    pub cascade: bool,
    /// How long a force deletion may take before giving up; zero checks
    /// absence exactly once
    pub timeout: Duration,
    /// Grace period for a force deletion in seconds; negative keeps the
    /// server default
    pub grace_period_seconds: i64,
    /// Resource version stamped into submitted patches for optimistic
    /// concurrency, if any
    pub resource_version: Option<String>,
    /// Conflict retry budget; zero picks the default of five
    pub retries: u32,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            overwrite: true,
            force: false,
            cascade: true,
            timeout: Duration::ZERO,
            grace_period_seconds: -1,
            resource_version: None,
            retries: 0,
        }
    }
}

/// Applies desired state to one resource on one cluster.
pub struct Patcher {
    helper: Arc<dyn ResourceHelper>,
    gvk: GroupVersionKind,
    openapi: Option<Arc<dyn PatchMetaLookup>>,
    config: PatcherConfig,
}

impl Patcher {
    /// Creates a patcher for one resolved resource kind.
    #[must_use]
    pub fn new(helper: Arc<dyn ResourceHelper>, gvk: GroupVersionKind, config: PatcherConfig) -> Self {
        Self {
            helper,
            gvk,
            openapi: None,
            config,
        }
    }

    /// Uses merge metadata from a served schema, preferring it over the
    /// built-in tables.
    #[must_use]
    pub fn with_openapi(mut self, lookup: Arc<dyn PatchMetaLookup>) -> Self {
        self.openapi = Some(lookup);
        self
    }

    /// Patches the live object `current` towards the desired document
    /// `modified`, returning the submitted patch bytes and the resulting
    /// object.
    ///
    /// Write conflicts are retried against a refetched live object, the
    /// first retry immediately and later ones after [`BACKOFF_PERIOD`]. An
    /// empty computed patch short-circuits without touching the API.
    pub async fn patch(
        &self,
        current: &DynamicObject,
        modified: &[u8],
        namespace: &str,
        name: &str,
    ) -> Result<(Vec<u8>, DynamicObject), PatchError> {
        let retries = if self.config.retries == 0 {
            MAX_PATCH_RETRY
        } else {
            self.config.retries
        };

        let mut live = current.clone();
        let mut outcome = self.patch_simple(&live, modified, namespace, name).await;

        let mut attempt = 1;
        while attempt <= retries && outcome.as_ref().is_err_and(|e| e.is_conflict()) {
            if attempt > TRIES_BEFORE_BACKOFF {
                tokio::time::sleep(BACKOFF_PERIOD).await;
            }
            debug!(namespace, name, attempt, "retrying patch after write conflict");
            live = self.helper.get(namespace, name).await?;
            outcome = self.patch_simple(&live, modified, namespace, name).await;
            attempt += 1;
        }

        match outcome {
            Err(err) if self.config.force && (err.is_conflict() || err.is_invalid()) => {
                warn!(
                    namespace,
                    name,
                    error = %err,
                    "patching failed, force-replacing the object"
                );
                self.delete_and_create(&live, modified, namespace, name).await
            }
            other => other,
        }
    }

    /// One patch computation and submission against the given live object.
    async fn patch_simple(
        &self,
        live: &DynamicObject,
        modified: &[u8],
        namespace: &str,
        name: &str,
    ) -> Result<(Vec<u8>, DynamicObject), PatchError> {
        let current_doc = serde_json::to_value(live)?;
        let original_doc = last_applied(live)?;
        let modified_doc: Value = serde_json::from_slice(modified)?;

        let (patch_type, patch) = match builtin::patch_meta_for(&self.gvk) {
            Some(native_meta) => {
                let schema_meta = self
                    .openapi
                    .as_ref()
                    .and_then(|lookup| lookup.lookup(&self.gvk));
                let patch = match schema_meta {
                    Some(schema_meta) => {
                        match strategic::create_three_way(
                            &original_doc,
                            &modified_doc,
                            &current_doc,
                            &schema_meta,
                            self.config.overwrite,
                        ) {
                            Ok(patch) => patch,
                            Err(err) => {
                                warn!(
                                    namespace,
                                    name,
                                    error = %err,
                                    "schema-based patch failed, falling back to built-in merge metadata"
                                );
                                strategic::create_three_way(
                                    &original_doc,
                                    &modified_doc,
                                    &current_doc,
                                    &native_meta,
                                    self.config.overwrite,
                                )?
                            }
                        }
                    }
                    None => strategic::create_three_way(
                        &original_doc,
                        &modified_doc,
                        &current_doc,
                        &native_meta,
                        self.config.overwrite,
                    )?,
                };
                (PatchType::StrategicMerge, patch)
            }
            None => (
                PatchType::JsonMerge,
                mergepatch::create_three_way(&original_doc, &modified_doc, &current_doc)?,
            ),
        };

        if mergepatch::is_empty_object(&patch) {
            debug!(namespace, name, "object unchanged, skipping patch");
            return Ok((b"{}".to_vec(), live.clone()));
        }

        let mut patch = patch;
        if let Some(resource_version) = &self.config.resource_version {
            set_resource_version(&mut patch, resource_version);
        }

        let patched = self.helper.patch(namespace, name, patch_type, &patch).await?;
        Ok((serde_json::to_vec(&patch)?, patched))
    }

    /// Replaces the object outright: delete, wait for absence, create the
    /// desired object. Restores `previous` when creation fails.
    async fn delete_and_create(
        &self,
        previous: &DynamicObject,
        modified: &[u8],
        namespace: &str,
        name: &str,
    ) -> Result<(Vec<u8>, DynamicObject), PatchError> {
        let options = DeleteParams {
            propagation_policy: Some(if self.config.cascade {
                PropagationPolicy::Foreground
            } else {
                PropagationPolicy::Orphan
            }),
            grace_period_seconds: u32::try_from(self.config.grace_period_seconds).ok(),
            ..DeleteParams::default()
        };
        self.helper.delete(namespace, name, &options).await?;
        self.wait_for_deletion(namespace, name).await?;

        let desired: DynamicObject = serde_json::from_slice(modified)?;
        match self.helper.create(namespace, &desired).await {
            Ok(created) => Ok((modified.to_vec(), created)),
            Err(create_err) => {
                warn!(
                    namespace,
                    name,
                    error = %create_err,
                    "creating the replacement object failed, restoring the previous one"
                );
                match self.helper.create(namespace, previous).await {
                    Ok(_) => Err(PatchError::Kube(create_err)),
                    Err(restore_err) => Err(PatchError::ReplaceAndRestoreFailed {
                        create: Box::new(PatchError::Kube(create_err)),
                        restore: Box::new(PatchError::Kube(restore_err)),
                    }),
                }
            }
        }
    }

    /// Polls until the object is gone or the configured timeout elapses.
    async fn wait_for_deletion(&self, namespace: &str, name: &str) -> Result<(), PatchError> {
        let deadline = Instant::now() + self.config.timeout;
        loop {
            match self.helper.get(namespace, name).await {
                Err(err) if error::is_not_found(&err) => return Ok(()),
                Err(err) => return Err(PatchError::Kube(err)),
                Ok(_) => {}
            }
            if Instant::now() >= deadline {
                return Err(PatchError::DeletionTimeout {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                });
            }
            tokio::time::sleep(DELETION_POLL_INTERVAL).await;
        }
    }
}

/// The document last applied to the object, or `{}` when the annotation is
/// absent.
fn last_applied(live: &DynamicObject) -> Result<Value, PatchError> {
    let annotation = live
        .metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(LAST_APPLIED_CONFIG_ANNOTATION));
    match annotation {
        Some(doc) => Ok(serde_json::from_str(doc)?),
        None => Ok(Value::Object(serde_json::Map::new())),
    }
}

/// Stamps the resource version into the patch metadata.
fn set_resource_version(patch: &mut Value, resource_version: &str) {
    let Value::Object(map) = patch else {
        return;
    };
    let metadata = map
        .entry("metadata")
        .or_insert_with(|| Value::Object(serde_json::Map::new()));
    if let Value::Object(metadata) = metadata {
        metadata.insert(
            "resourceVersion".to_string(),
            Value::String(resource_version.to_string()),
        );
    }
}
