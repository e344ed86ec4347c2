//! Mock resource helper for unit testing
//!
//! In-memory implementation of [`ResourceHelper`] that stores objects,
//! records every call and can be scripted to fail specific operations. No
//! running cluster required.

use crate::helper::{PatchType, ResourceHelper};
use async_trait::async_trait;
use kube::api::{DeleteParams, DynamicObject};
use kube::error::ErrorResponse;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// One recorded helper call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperCall {
    /// A live-object fetch
    Get,
    /// A patch submission of the given type
    Patch(PatchType),
    /// An object creation
    Create,
    /// An object deletion
    Delete,
}

/// In-memory [`ResourceHelper`] with scripted failures.
#[derive(Clone, Default)]
pub struct MockResourceHelper {
    objects: Arc<Mutex<HashMap<String, DynamicObject>>>,
    patch_failures: Arc<Mutex<VecDeque<ErrorResponse>>>,
    create_failures: Arc<Mutex<VecDeque<ErrorResponse>>>,
    calls: Arc<Mutex<Vec<HelperCall>>>,
}

impl MockResourceHelper {
    /// Creates an empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object (for test setup).
    pub fn put(&self, namespace: &str, name: &str, object: DynamicObject) {
        self.objects
            .lock()
            .unwrap()
            .insert(object_key(namespace, name), object);
    }

    /// Fetches a stored object (for assertions).
    #[must_use]
    pub fn stored(&self, namespace: &str, name: &str) -> Option<DynamicObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&object_key(namespace, name))
            .cloned()
    }

    /// Scripts the next patch call to fail with `error`.
    pub fn fail_next_patch(&self, error: ErrorResponse) {
        self.patch_failures.lock().unwrap().push_back(error);
    }

    /// Scripts the next create call to fail with `error`.
    pub fn fail_next_create(&self, error: ErrorResponse) {
        self.create_failures.lock().unwrap().push_back(error);
    }

    /// All calls observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<HelperCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Count of patch submissions observed so far.
    #[must_use]
    pub fn patch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, HelperCall::Patch(_)))
            .count()
    }

    fn record(&self, call: HelperCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ResourceHelper for MockResourceHelper {
    async fn get(&self, namespace: &str, name: &str) -> Result<DynamicObject, kube::Error> {
        self.record(HelperCall::Get);
        self.objects
            .lock()
            .unwrap()
            .get(&object_key(namespace, name))
            .cloned()
            .ok_or_else(|| kube::Error::Api(not_found(name)))
    }

    async fn patch(
        &self,
        namespace: &str,
        name: &str,
        patch_type: PatchType,
        patch: &Value,
    ) -> Result<DynamicObject, kube::Error> {
        self.record(HelperCall::Patch(patch_type));
        if let Some(error) = self.patch_failures.lock().unwrap().pop_front() {
            return Err(kube::Error::Api(error));
        }
        let mut objects = self.objects.lock().unwrap();
        let key = object_key(namespace, name);
        let Some(object) = objects.get(&key) else {
            return Err(kube::Error::Api(not_found(name)));
        };
        // merge semantics are close enough for both patch types here; the
        // engine's own merge math is tested directly
        let mut doc = serde_json::to_value(object).map_err(kube::Error::SerdeError)?;
        json_patch::merge(&mut doc, patch);
        let patched: DynamicObject =
            serde_json::from_value(doc).map_err(kube::Error::SerdeError)?;
        objects.insert(key, patched.clone());
        Ok(patched)
    }

    async fn create(
        &self,
        namespace: &str,
        object: &DynamicObject,
    ) -> Result<DynamicObject, kube::Error> {
        self.record(HelperCall::Create);
        if let Some(error) = self.create_failures.lock().unwrap().pop_front() {
            return Err(kube::Error::Api(error));
        }
        let name = object.metadata.name.clone().unwrap_or_default();
        self.objects
            .lock()
            .unwrap()
            .insert(object_key(namespace, &name), object.clone());
        Ok(object.clone())
    }

    async fn delete(
        &self,
        namespace: &str,
        name: &str,
        _options: &DeleteParams,
    ) -> Result<(), kube::Error> {
        self.record(HelperCall::Delete);
        self.objects
            .lock()
            .unwrap()
            .remove(&object_key(namespace, name));
        Ok(())
    }
}

fn object_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

/// Builds a test object from a full JSON document.
#[must_use]
pub fn object_from_json(doc: Value) -> DynamicObject {
    serde_json::from_value(doc).expect("valid test object")
}

/// HTTP 409 write conflict.
#[must_use]
pub fn conflict(name: &str) -> ErrorResponse {
    ErrorResponse {
        status: "Failure".to_string(),
        message: format!("Operation cannot be fulfilled on {name}: the object has been modified"),
        reason: "Conflict".to_string(),
        code: 409,
    }
}

/// HTTP 422 structurally invalid patch.
#[must_use]
pub fn invalid(name: &str) -> ErrorResponse {
    ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{name} is invalid: field is immutable"),
        reason: "Invalid".to_string(),
        code: 422,
    }
}

fn not_found(name: &str) -> ErrorResponse {
    ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{name} not found"),
        reason: "NotFound".to_string(),
        code: 404,
    }
}

/// HTTP 500 generic server failure.
#[must_use]
pub fn server_error(message: &str) -> ErrorResponse {
    ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: "InternalError".to_string(),
        code: 500,
    }
}
