//! Field merge metadata
//!
//! Describes, per field, how a strategic merge treats the value: maps merge
//! recursively, lists with a merge key merge element-wise, everything else
//! is atomic. Metadata comes either from the built-in tables
//! ([`crate::builtin`]) or from a caller-supplied lookup backed by a served
//! schema.

use kube::api::GroupVersionKind;
use std::collections::BTreeMap;

/// Merge metadata for the fields of one object level.
#[derive(Debug, Clone, Default)]
pub struct PatchMeta {
    fields: BTreeMap<String, FieldMeta>,
}

impl PatchMeta {
    /// Empty metadata: every field merges structurally, every list is atomic.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds metadata for a named field.
    #[must_use]
    pub fn with_field(mut self, name: &str, meta: FieldMeta) -> Self {
        self.fields.insert(name.to_string(), meta);
        self
    }

    /// Metadata of a named field, if any.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name)
    }
}

/// Merge metadata of one field.
#[derive(Debug, Clone, Default)]
pub struct FieldMeta {
    /// Key merging list elements; `None` makes lists atomic
    pub merge_key: Option<String>,
    /// Metadata of nested fields (map values or list elements)
    pub nested: PatchMeta,
}

impl FieldMeta {
    /// A map field with nested metadata.
    #[must_use]
    pub fn map(nested: PatchMeta) -> Self {
        Self {
            merge_key: None,
            nested,
        }
    }

    /// A list field merged element-wise by `merge_key`.
    #[must_use]
    pub fn merged_list(merge_key: &str, element: PatchMeta) -> Self {
        Self {
            merge_key: Some(merge_key.to_string()),
            nested: element,
        }
    }
}

/// Source of merge metadata keyed by group/version/kind.
///
/// Implementations are typically backed by a schema served by the target
/// cluster; the patcher prefers them over the built-in tables and falls back
/// when lookup or patch computation fails.
pub trait PatchMetaLookup: Send + Sync {
    /// Metadata for the given kind, if the source knows it.
    fn lookup(&self, gvk: &GroupVersionKind) -> Option<PatchMeta>;
}
