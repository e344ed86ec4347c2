//! Three-way JSON merge patch (RFC 7386)
//!
//! Fallback path for kinds without merge metadata. The three-way patch
//! combines additions and updates (live vs desired) with deletions (last
//! applied vs desired), so externally-made live changes the desired spec
//! does not touch are preserved. Identity fields must not change between
//! merge inputs; a violation is a distinct precondition failure.

use crate::error::PatchError;
use serde_json::{Map, Value};

/// Computes the RFC 7386 merge patch transforming `from` into `to`.
///
/// Objects are diffed recursively, removed keys become explicit nulls, and
/// everything else (arrays included) is replaced wholesale.
#[must_use]
pub fn diff(from: &Value, to: &Value) -> Value {
    diff_inner(from, to, true)
}

fn diff_inner(from: &Value, to: &Value, mark_deletions: bool) -> Value {
    let (Value::Object(from_map), Value::Object(to_map)) = (from, to) else {
        return if from == to {
            Value::Object(Map::new())
        } else {
            to.clone()
        };
    };

    let mut patch = Map::new();
    for (key, to_value) in to_map {
        match from_map.get(key) {
            Some(from_value) if from_value == to_value => {}
            Some(from_value) if from_value.is_object() && to_value.is_object() => {
                let nested = diff_inner(from_value, to_value, mark_deletions);
                if !is_empty_object(&nested) {
                    patch.insert(key.clone(), nested);
                }
            }
            _ => {
                patch.insert(key.clone(), to_value.clone());
            }
        }
    }
    if mark_deletions {
        for key in from_map.keys() {
            if !to_map.contains_key(key) {
                patch.insert(key.clone(), Value::Null);
            }
        }
    }
    Value::Object(patch)
}

/// Computes the three-way JSON merge patch from last-applied (`original`),
/// desired (`modified`) and live (`current`) documents.
///
/// Deletions come exclusively from the original→modified comparison; the
/// current→modified delta contributes additions and updates only, so a live
/// field the desired document never mentions is never deleted.
pub fn create_three_way(
    original: &Value,
    modified: &Value,
    current: &Value,
) -> Result<Value, PatchError> {
    let additions = diff_inner(current, modified, false);
    let deletions = deletions_only(&diff(original, modified));

    require_identity_unchanged(&additions)?;
    require_identity_unchanged(&deletions)?;

    Ok(merge(deletions, &additions))
}

/// True when the value is `{}`.
#[must_use]
pub fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}

/// Keeps only the deletion entries (null leaves) of a merge patch.
fn deletions_only(patch: &Value) -> Value {
    let Value::Object(map) = patch else {
        return Value::Object(Map::new());
    };
    let mut out = Map::new();
    for (key, value) in map {
        match value {
            Value::Null => {
                out.insert(key.clone(), Value::Null);
            }
            Value::Object(_) => {
                let nested = deletions_only(value);
                if !is_empty_object(&nested) {
                    out.insert(key.clone(), nested);
                }
            }
            _ => {}
        }
    }
    Value::Object(out)
}

/// Merges two patches; `overlay` entries win over `base` entries.
pub(crate) fn merge(base: Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.remove(key) {
                    Some(base_value) => {
                        base_map.insert(key.clone(), merge(base_value, overlay_value));
                    }
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Fails when the patch touches apiVersion, kind or metadata.name.
fn require_identity_unchanged(patch: &Value) -> Result<(), PatchError> {
    if patch.get("apiVersion").is_some() || patch.get("kind").is_some() {
        return Err(PatchError::IdentityChanged);
    }
    if patch.pointer("/metadata/name").is_some() {
        return Err(PatchError::IdentityChanged);
    }
    Ok(())
}
