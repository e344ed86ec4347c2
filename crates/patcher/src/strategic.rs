//! Three-way strategic merge patch
//!
//! Like the JSON merge path, but list fields carrying a merge key are diffed
//! element-wise: changed and added elements appear keyed in the patch,
//! removed elements become `$patch: delete` directives. Lists without a
//! merge key stay atomic. When `overwrite` is disabled, live drift on a
//! field the patch also changes is a merge conflict.

use crate::error::PatchError;
use crate::mergepatch;
use crate::meta::PatchMeta;
use serde_json::{Map, Value};

/// Directive key understood by strategic merge endpoints.
pub const PATCH_DIRECTIVE: &str = "$patch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiffMode {
    /// Fields added or changed between the two documents
    AddsAndUpdates,
    /// Fields removed between the two documents
    Deletions,
}

/// Computes the three-way strategic merge patch from last-applied
/// (`original`), desired (`modified`) and live (`current`) documents.
pub fn create_three_way(
    original: &Value,
    modified: &Value,
    current: &Value,
    meta: &PatchMeta,
    overwrite: bool,
) -> Result<Value, PatchError> {
    let delta = diff_maps(current, modified, meta, DiffMode::AddsAndUpdates);
    let deletions = diff_maps(original, modified, meta, DiffMode::Deletions);

    if !overwrite {
        let drift = diff_maps(original, current, meta, DiffMode::AddsAndUpdates);
        if let Some(field) = first_conflict(&drift, &delta, "") {
            return Err(PatchError::MergeConflict(field));
        }
    }

    Ok(mergepatch::merge(deletions, &delta))
}

fn diff_maps(from: &Value, to: &Value, meta: &PatchMeta, mode: DiffMode) -> Value {
    let (Value::Object(from_map), Value::Object(to_map)) = (from, to) else {
        return Value::Object(Map::new());
    };

    let structural = PatchMeta::default();
    let mut patch = Map::new();
    match mode {
        DiffMode::AddsAndUpdates => {
            for (key, to_value) in to_map {
                let Some(from_value) = from_map.get(key) else {
                    patch.insert(key.clone(), to_value.clone());
                    continue;
                };
                if from_value == to_value {
                    continue;
                }
                let field_meta = meta.field(key);
                match (from_value, to_value) {
                    (Value::Object(_), Value::Object(_)) => {
                        let nested_meta = field_meta.map_or(&structural, |f| &f.nested);
                        let nested = diff_maps(from_value, to_value, nested_meta, mode);
                        if !mergepatch::is_empty_object(&nested) {
                            patch.insert(key.clone(), nested);
                        }
                    }
                    (Value::Array(from_items), Value::Array(to_items)) => {
                        let merged = field_meta.and_then(|f| {
                            let merge_key = f.merge_key.as_deref()?;
                            list_delta(from_items, to_items, merge_key, &f.nested)
                        });
                        match merged {
                            Some(items) if items.is_empty() => {}
                            Some(items) => {
                                patch.insert(key.clone(), Value::Array(items));
                            }
                            // atomic list, replace wholesale
                            None => {
                                patch.insert(key.clone(), to_value.clone());
                            }
                        }
                    }
                    _ => {
                        patch.insert(key.clone(), to_value.clone());
                    }
                }
            }
        }
        DiffMode::Deletions => {
            for (key, from_value) in from_map {
                let Some(to_value) = to_map.get(key) else {
                    patch.insert(key.clone(), Value::Null);
                    continue;
                };
                let field_meta = meta.field(key);
                match (from_value, to_value) {
                    (Value::Object(_), Value::Object(_)) => {
                        let nested_meta = field_meta.map_or(&structural, |f| &f.nested);
                        let nested = diff_maps(from_value, to_value, nested_meta, mode);
                        if !mergepatch::is_empty_object(&nested) {
                            patch.insert(key.clone(), nested);
                        }
                    }
                    (Value::Array(from_items), Value::Array(to_items)) => {
                        if let Some(merge_key) =
                            field_meta.and_then(|f| f.merge_key.as_deref())
                        {
                            let directives = list_deletions(from_items, to_items, merge_key);
                            if !directives.is_empty() {
                                patch.insert(key.clone(), Value::Array(directives));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    Value::Object(patch)
}

/// Element-wise delta of a merge-key list; `None` falls back to atomic
/// replacement (an element is missing the key or is not an object).
fn list_delta(
    from_items: &[Value],
    to_items: &[Value],
    merge_key: &str,
    element_meta: &PatchMeta,
) -> Option<Vec<Value>> {
    let mut out = Vec::new();
    for to_item in to_items {
        let key_value = to_item.as_object()?.get(merge_key)?;
        let from_item = from_items
            .iter()
            .find(|item| item.get(merge_key) == Some(key_value));
        match from_item {
            None => out.push(to_item.clone()),
            Some(from_item) if from_item == to_item => {}
            Some(from_item) => {
                let mut delta =
                    diff_maps(from_item, to_item, element_meta, DiffMode::AddsAndUpdates);
                if let Value::Object(map) = &mut delta {
                    map.insert(merge_key.to_string(), key_value.clone());
                }
                out.push(delta);
            }
        }
    }
    Some(out)
}

/// `$patch: delete` directives for keyed elements removed from the list.
fn list_deletions(from_items: &[Value], to_items: &[Value], merge_key: &str) -> Vec<Value> {
    let mut out = Vec::new();
    for from_item in from_items {
        let Some(key_value) = from_item.get(merge_key) else {
            continue;
        };
        let still_present = to_items
            .iter()
            .any(|item| item.get(merge_key) == Some(key_value));
        if !still_present {
            let mut directive = Map::new();
            directive.insert(merge_key.to_string(), key_value.clone());
            directive.insert(PATCH_DIRECTIVE.to_string(), Value::String("delete".to_string()));
            out.push(Value::Object(directive));
        }
    }
    out
}

/// First field where live drift and the desired delta disagree, as a dotted
/// path. Matching map entries recurse; anything else that differs conflicts.
fn first_conflict(drift: &Value, delta: &Value, path: &str) -> Option<String> {
    let (Value::Object(drift_map), Value::Object(delta_map)) = (drift, delta) else {
        return (drift != delta).then(|| path.to_string());
    };
    for (key, drift_value) in drift_map {
        let Some(delta_value) = delta_map.get(key) else {
            continue;
        };
        if drift_value == delta_value {
            continue;
        }
        let child = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        match (drift_value, delta_value) {
            (Value::Object(_), Value::Object(_)) => {
                if let Some(found) = first_conflict(drift_value, delta_value, &child) {
                    return Some(found);
                }
            }
            _ => return Some(child),
        }
    }
    None
}
