//! Built-in merge metadata for registered native kinds
//!
//! The closed set of kinds the engine knows how to patch strategically,
//! with the merge keys their list fields carry on the server. A kind absent
//! from this table is unregistered and takes the JSON merge path.

use crate::meta::{FieldMeta, PatchMeta};
use kube::api::GroupVersionKind;

/// Merge metadata for a registered kind; `None` means the kind is
/// unregistered.
#[must_use]
pub fn patch_meta_for(gvk: &GroupVersionKind) -> Option<PatchMeta> {
    match (gvk.group.as_str(), gvk.version.as_str(), gvk.kind.as_str()) {
        ("", "v1", "Pod") => Some(PatchMeta::new().with_field("spec", FieldMeta::map(pod_spec()))),
        ("", "v1", "Service") => Some(service()),
        ("", "v1", "ConfigMap" | "Secret" | "Namespace" | "PersistentVolumeClaim") => {
            Some(PatchMeta::new())
        }
        ("", "v1", "ServiceAccount") => Some(
            PatchMeta::new()
                .with_field("secrets", FieldMeta::merged_list("name", PatchMeta::new()))
                .with_field(
                    "imagePullSecrets",
                    FieldMeta::merged_list("name", PatchMeta::new()),
                ),
        ),
        ("apps", "v1", "Deployment" | "StatefulSet" | "DaemonSet" | "ReplicaSet") => {
            Some(workload())
        }
        ("batch", "v1", "Job") => Some(workload()),
        ("batch", "v1", "CronJob") => Some(cron_job()),
        ("rbac.authorization.k8s.io", "v1", "Role" | "ClusterRole") => Some(PatchMeta::new()),
        ("rbac.authorization.k8s.io", "v1", "RoleBinding" | "ClusterRoleBinding") => {
            Some(PatchMeta::new())
        }
        _ => None,
    }
}

fn container() -> PatchMeta {
    PatchMeta::new()
        .with_field("env", FieldMeta::merged_list("name", PatchMeta::new()))
        .with_field(
            "ports",
            FieldMeta::merged_list("containerPort", PatchMeta::new()),
        )
        .with_field(
            "volumeMounts",
            FieldMeta::merged_list("mountPath", PatchMeta::new()),
        )
}

fn pod_spec() -> PatchMeta {
    PatchMeta::new()
        .with_field("containers", FieldMeta::merged_list("name", container()))
        .with_field(
            "initContainers",
            FieldMeta::merged_list("name", container()),
        )
        .with_field("volumes", FieldMeta::merged_list("name", PatchMeta::new()))
        .with_field(
            "imagePullSecrets",
            FieldMeta::merged_list("name", PatchMeta::new()),
        )
}

fn pod_template() -> PatchMeta {
    PatchMeta::new().with_field("spec", FieldMeta::map(pod_spec()))
}

fn workload() -> PatchMeta {
    PatchMeta::new().with_field(
        "spec",
        FieldMeta::map(PatchMeta::new().with_field("template", FieldMeta::map(pod_template()))),
    )
}

fn cron_job() -> PatchMeta {
    PatchMeta::new().with_field(
        "spec",
        FieldMeta::map(PatchMeta::new().with_field("jobTemplate", FieldMeta::map(workload()))),
    )
}

fn service() -> PatchMeta {
    PatchMeta::new().with_field(
        "spec",
        FieldMeta::map(
            PatchMeta::new().with_field("ports", FieldMeta::merged_list("port", PatchMeta::new())),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gvk(group: &str, version: &str, kind: &str) -> GroupVersionKind {
        GroupVersionKind::gvk(group, version, kind)
    }

    #[test]
    fn test_workloads_are_registered() {
        assert!(patch_meta_for(&gvk("apps", "v1", "Deployment")).is_some());
        assert!(patch_meta_for(&gvk("", "v1", "Pod")).is_some());
        assert!(patch_meta_for(&gvk("batch", "v1", "CronJob")).is_some());
    }

    #[test]
    fn test_custom_resources_are_unregistered() {
        assert!(patch_meta_for(&gvk("example.org", "v1alpha1", "Widget")).is_none());
        assert!(patch_meta_for(&gvk("apps", "v2", "Deployment")).is_none());
    }

    #[test]
    fn test_deployment_containers_merge_by_name() {
        let meta = patch_meta_for(&gvk("apps", "v1", "Deployment")).unwrap();
        let containers = meta
            .field("spec")
            .and_then(|f| f.nested.field("template"))
            .and_then(|f| f.nested.field("spec"))
            .and_then(|f| f.nested.field("containers"))
            .unwrap();
        assert_eq!(containers.merge_key.as_deref(), Some("name"));
    }
}
