// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Non-controlling owner references from dependencies back to the workloads
//! that use them, so a dependency change can be mapped to its consumers.

use crate::dependencies::FetchedDependencies;
use crate::error::Result;
use crate::kubernetes::{get_optional, list_owned_by, patch_guarded};
use crate::types::{DependencyKey, DependencyObject, DependencySet, Workload, WorkloadRef};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Client, ResourceExt};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

/// Owner reference pointing at `workload`, `None` if it has not been persisted yet
pub fn owner_reference_for<K: Workload>(workload: &K) -> Option<OwnerReference> {
    let uid = workload.meta().uid.clone()?;
    Some(OwnerReference {
        api_version: K::api_version(&()).into_owned(),
        kind: K::kind(&()).into_owned(),
        name: workload.name_any(),
        uid,
        controller: Some(false),
        block_owner_deletion: Some(false),
    })
}

/// `refs` with `owner` added, or `None` if an equivalent reference is already present
pub fn with_owner_reference(
    refs: &[OwnerReference],
    owner: &OwnerReference,
) -> Option<Vec<OwnerReference>> {
    if refs.iter().any(|r| r.uid == owner.uid) {
        return None;
    }
    let mut updated = refs.to_vec();
    updated.push(owner.clone());
    Some(updated)
}

/// `refs` without the reference to `uid`, or `None` if there is none
pub fn without_owner_reference(refs: &[OwnerReference], uid: &str) -> Option<Vec<OwnerReference>> {
    if !refs.iter().any(|r| r.uid == uid) {
        return None;
    }
    Some(refs.iter().filter(|r| r.uid != uid).cloned().collect())
}

/// Number of fetched dependencies that can carry a link to `workload`.
///
/// Owner references cannot cross namespaces, so only dependencies in the
/// workload's own namespace count.
pub fn linkable_count<K: Workload>(workload: &K, fetched: &FetchedDependencies) -> usize {
    let namespace = workload.namespace().unwrap_or_default();
    fetched
        .config_maps
        .keys()
        .chain(fetched.secrets.keys())
        .filter(|k| k.namespace == namespace)
        .count()
}

/// Link every fetched same-namespace dependency to `workload` and unlink the
/// ones it no longer uses.
///
/// Returns the number of dependencies still linked once the pass is done.
/// That includes linked dependencies that could not be fetched this time.
#[instrument(skip_all, fields(workload = %WorkloadRef::of(workload)))]
pub async fn update_owner_references<K: Workload>(
    client: &Client,
    workload: &K,
    deps: &DependencySet,
    fetched: &FetchedDependencies,
) -> Result<usize> {
    let Some(owner) = owner_reference_for(workload) else {
        return Ok(0);
    };
    let namespace = workload.namespace().unwrap_or_default();

    let mut linked = link_all(client, &owner, &namespace, &fetched.config_maps).await?;
    linked.extend(link_all(client, &owner, &namespace, &fetched.secrets).await?);

    linked.extend(unlink_stale::<ConfigMap>(client, &namespace, &owner.uid, deps).await?);
    linked.extend(unlink_stale::<Secret>(client, &namespace, &owner.uid, deps).await?);

    Ok(linked.len())
}

/// Remove every link to `workload`: from the dependencies that still list it
/// as an owner, and from any of `deps` that does.
#[instrument(skip_all, fields(workload = %WorkloadRef::of(workload)))]
pub async fn remove_owner_references<K: Workload>(
    client: &Client,
    workload: &K,
    deps: &DependencySet,
) -> Result<()> {
    let Some(uid) = workload.meta().uid.clone() else {
        return Ok(());
    };
    let namespace = workload.namespace().unwrap_or_default();

    unlink_all::<ConfigMap>(client, &namespace, &uid, deps).await?;
    unlink_all::<Secret>(client, &namespace, &uid, deps).await?;
    Ok(())
}

async fn link_all<D: DependencyObject>(
    client: &Client,
    owner: &OwnerReference,
    namespace: &str,
    objects: &BTreeMap<DependencyKey, D>,
) -> Result<BTreeSet<DependencyKey>> {
    let mut linked = BTreeSet::new();
    for (key, obj) in objects.iter().filter(|(k, _)| k.namespace == namespace) {
        match with_owner_reference(obj.owner_references(), owner) {
            None => {
                linked.insert(key.clone());
            }
            Some(refs) => {
                if set_owner_references(client, obj, refs).await? {
                    info!("Linked {} to {} {}", key, owner.kind, owner.name);
                    linked.insert(key.clone());
                }
            }
        }
    }
    Ok(linked)
}

/// Unlink listed dependencies that are no longer used, returning the ones kept
async fn unlink_stale<D: DependencyObject>(
    client: &Client,
    namespace: &str,
    uid: &str,
    deps: &DependencySet,
) -> Result<BTreeSet<DependencyKey>> {
    let mut kept = BTreeSet::new();
    for obj in list_owned_by::<D>(client, namespace, uid).await? {
        let key = DependencyKey::of(&obj);
        if deps.contains(&key) {
            kept.insert(key);
            continue;
        }
        if let Some(refs) = without_owner_reference(obj.owner_references(), uid) {
            if set_owner_references(client, &obj, refs).await? {
                info!("Unlinked {}, no longer a dependency", key);
            }
        }
    }
    Ok(kept)
}

async fn unlink_all<D: DependencyObject>(
    client: &Client,
    namespace: &str,
    uid: &str,
    deps: &DependencySet,
) -> Result<()> {
    let mut targets: BTreeMap<DependencyKey, D> = list_owned_by::<D>(client, namespace, uid)
        .await?
        .into_iter()
        .map(|obj| (DependencyKey::of(&obj), obj))
        .collect();

    let resolved = deps
        .of_kind(D::KIND)
        .map(|(k, _)| k)
        .filter(|k| k.namespace == namespace && !targets.contains_key(*k))
        .cloned()
        .collect::<Vec<_>>();
    for key in resolved {
        match get_optional::<D>(client, &key.namespace, &key.name).await {
            Ok(Some(obj)) => {
                targets.insert(key, obj);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to fetch {} for cleanup: {}", key, e),
        }
    }

    for (key, obj) in targets {
        if let Some(refs) = without_owner_reference(obj.owner_references(), uid) {
            if set_owner_references(client, &obj, refs).await? {
                info!("Unlinked {}", key);
            }
        }
    }
    Ok(())
}

/// Replace the owner references of `obj`; `false` if it was deleted meanwhile
async fn set_owner_references<D: DependencyObject>(
    client: &Client,
    obj: &D,
    refs: Vec<OwnerReference>,
) -> Result<bool> {
    let patch = json!({ "metadata": { "ownerReferences": refs } });
    match patch_guarded(client, obj, patch).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => {
            debug!("{} is gone, skipping", DependencyKey::of(obj));
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
