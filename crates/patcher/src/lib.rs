//! Fleet patch engine
//!
//! Computes and applies a minimal patch that transforms a live Kubernetes
//! resource into the desired one, tolerating optimistic-concurrency
//! conflicts and structurally un-patchable changes.
//!
//! For kinds with built-in merge metadata a three-way strategic merge patch
//! is computed ([`strategic`]); everything else falls back to a three-way
//! JSON merge patch with identity preconditions ([`mergepatch`]). Conflicts
//! are retried with a fixed backoff; when retries are exhausted and the
//! caller opted into force mode, the object is deleted and recreated, with
//! rollback to the previous object if recreation fails.

pub mod builtin;
pub mod error;
pub mod helper;
pub mod mergepatch;
pub mod meta;
pub mod patcher;
pub mod strategic;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use error::PatchError;
pub use helper::{KubeResourceHelper, PatchType, ResourceHelper};
pub use meta::{FieldMeta, PatchMeta, PatchMetaLookup};
pub use patcher::{LAST_APPLIED_CONFIG_ANNOTATION, Patcher, PatcherConfig};
