// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The workload finalizer, held while any dependency carries a link to the workload.

use crate::constants::FINALIZER;
use crate::error::Result;
use crate::kubernetes::patch_guarded;
use crate::types::{Workload, WorkloadRef};
use kube::{Client, ResourceExt};
use serde_json::json;
use tracing::info;

pub fn has_finalizer(finalizers: &[String]) -> bool {
    finalizers.iter().any(|f| f == FINALIZER)
}

/// `finalizers` with ours appended, unless already present
pub fn add_finalizer(finalizers: &[String]) -> Vec<String> {
    let mut updated = finalizers.to_vec();
    if !has_finalizer(finalizers) {
        updated.push(FINALIZER.to_string());
    }
    updated
}

/// `finalizers` without ours, keeping the order of the rest
pub fn remove_finalizer(finalizers: &[String]) -> Vec<String> {
    finalizers
        .iter()
        .filter(|f| f.as_str() != FINALIZER)
        .cloned()
        .collect()
}

/// Add the finalizer to `workload` if missing, returning the updated object.
///
/// Never adds it to a workload that is already being deleted.
pub async fn ensure_finalizer<K: Workload>(client: &Client, workload: K) -> Result<K> {
    if has_finalizer(workload.finalizers()) || workload.meta().deletion_timestamp.is_some() {
        return Ok(workload);
    }

    info!("Adding finalizer to {}", WorkloadRef::of(&workload));
    let finalizers = add_finalizer(workload.finalizers());
    patch_guarded(client, &workload, json!({ "metadata": { "finalizers": finalizers } })).await
}

/// Remove the finalizer from `workload` if present, returning the updated object
pub async fn drop_finalizer<K: Workload>(client: &Client, workload: K) -> Result<K> {
    if !has_finalizer(workload.finalizers()) {
        return Ok(workload);
    }

    info!("Removing finalizer from {}", WorkloadRef::of(&workload));
    let finalizers = remove_finalizer(workload.finalizers());
    patch_guarded(client, &workload, json!({ "metadata": { "finalizers": finalizers } })).await
}
