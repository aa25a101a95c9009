// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespaced object access: lookups that tolerate absence, owner listing and optimistic patches

use crate::constants::OPERATOR_NAME;
use crate::error::{Result, WaveError};
use kube::{
    api::{ListParams, Patch, PatchParams},
    core::NamespaceResourceScope,
    Api, Client, Resource, ResourceExt,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Get an object by name, `None` if it does not exist
pub async fn get_optional<K>(client: &Client, namespace: &str, name: &str) -> Result<Option<K>>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    Ok(api.get_opt(name).await?)
}

/// List objects in `namespace` carrying an owner reference with `owner_uid`
#[instrument(skip(client), fields(kind = %K::kind(&())))]
pub async fn list_owned_by<K>(client: &Client, namespace: &str, owner_uid: &str) -> Result<Vec<K>>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    let list = api.list(&ListParams::default()).await?;

    let owned: Vec<K> = list
        .items
        .into_iter()
        .filter(|obj| obj.owner_references().iter().any(|r| r.uid == owner_uid))
        .collect();

    debug!("Found {} owned objects in {}", owned.len(), namespace);
    Ok(owned)
}

/// Apply a JSON merge patch to `obj`, guarded by its current resourceVersion.
///
/// A stale resourceVersion surfaces as [`WaveError::WriteConflict`].
pub async fn patch_guarded<K>(client: &Client, obj: &K, mut patch: Value) -> Result<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let namespace = obj.namespace().unwrap_or_default();
    let name = obj.name_any();

    if let Some(rv) = obj.resource_version() {
        patch["metadata"]["resourceVersion"] = Value::String(rv);
    }

    let api: Api<K> = Api::namespaced(client.clone(), &namespace);
    api.patch(&name, &PatchParams::apply(OPERATOR_NAME), &Patch::Merge(&patch))
        .await
        .map_err(|e| WaveError::from_write(e, &K::kind(&()), &namespace, &name))
}
