//! Resource access seam
//!
//! The patch engine talks to the cluster through [`ResourceHelper`], a small
//! capability trait over one pre-resolved resource mapping. The production
//! implementation wraps a dynamically-typed `kube::Api`; tests use the
//! in-memory mock.

use async_trait::async_trait;
use kube::api::{
    ApiResource, DeleteParams, DynamicObject, Patch, PatchParams, PostParams,
};
use kube::{Api, Client};
use serde_json::Value;

/// Wire representation of a computed patch.
///
/// A closed, two-variant decision: kinds with merge metadata take the
/// strategic path, everything else the JSON merge path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchType {
    /// Three-way strategic merge patch
    StrategicMerge,
    /// Three-way JSON merge patch (RFC 7386)
    JsonMerge,
}

/// Get/patch/create/delete access to one resource type on one cluster.
///
/// Must be safe to call concurrently from many tasks.
#[async_trait]
pub trait ResourceHelper: Send + Sync {
    /// Fetches the live object.
    async fn get(&self, namespace: &str, name: &str) -> Result<DynamicObject, kube::Error>;

    /// Submits a patch of the given type.
    async fn patch(
        &self,
        namespace: &str,
        name: &str,
        patch_type: PatchType,
        patch: &Value,
    ) -> Result<DynamicObject, kube::Error>;

    /// Creates the object.
    async fn create(
        &self,
        namespace: &str,
        object: &DynamicObject,
    ) -> Result<DynamicObject, kube::Error>;

    /// Deletes the object with the given options.
    async fn delete(
        &self,
        namespace: &str,
        name: &str,
        options: &DeleteParams,
    ) -> Result<(), kube::Error>;
}

/// [`ResourceHelper`] over the Kubernetes API for one resolved resource.
pub struct KubeResourceHelper {
    client: Client,
    resource: ApiResource,
}

impl KubeResourceHelper {
    /// Creates a helper for the given resolved resource mapping.
    #[must_use]
    pub fn new(client: Client, resource: ApiResource) -> Self {
        Self { client, resource }
    }

    /// Namespaced API scope, or cluster scope when `namespace` is empty.
    fn api(&self, namespace: &str) -> Api<DynamicObject> {
        if namespace.is_empty() {
            Api::all_with(self.client.clone(), &self.resource)
        } else {
            Api::namespaced_with(self.client.clone(), namespace, &self.resource)
        }
    }
}

#[async_trait]
impl ResourceHelper for KubeResourceHelper {
    async fn get(&self, namespace: &str, name: &str) -> Result<DynamicObject, kube::Error> {
        self.api(namespace).get(name).await
    }

    async fn patch(
        &self,
        namespace: &str,
        name: &str,
        patch_type: PatchType,
        patch: &Value,
    ) -> Result<DynamicObject, kube::Error> {
        let params = PatchParams::default();
        let api = self.api(namespace);
        match patch_type {
            PatchType::StrategicMerge => {
                api.patch(name, &params, &Patch::Strategic(patch)).await
            }
            PatchType::JsonMerge => api.patch(name, &params, &Patch::Merge(patch)).await,
        }
    }

    async fn create(
        &self,
        namespace: &str,
        object: &DynamicObject,
    ) -> Result<DynamicObject, kube::Error> {
        self.api(namespace)
            .create(&PostParams::default(), object)
            .await
    }

    async fn delete(
        &self,
        namespace: &str,
        name: &str,
        options: &DeleteParams,
    ) -> Result<(), kube::Error> {
        self.api(namespace)
            .delete(name, options)
            .await
            .map(|_| ())
    }
}
