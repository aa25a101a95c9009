// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fetching the live ConfigMaps and Secrets a workload depends on.

use crate::error::{Result, WaveError};
use crate::kubernetes::get_optional;
use crate::types::{DependencyKey, DependencyKind, DependencyObject, DependencySet};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::Client;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Live dependency objects, keyed like the [`DependencySet`] they were fetched for.
///
/// Dependencies that do not exist are simply absent.
#[derive(Debug, Clone, Default)]
pub struct FetchedDependencies {
    pub config_maps: BTreeMap<DependencyKey, ConfigMap>,
    pub secrets: BTreeMap<DependencyKey, Secret>,
}

impl FetchedDependencies {
    pub fn len(&self) -> usize {
        self.config_maps.len() + self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.config_maps.is_empty() && self.secrets.is_empty()
    }
}

/// Fetch every object named in `deps`.
///
/// A missing object is treated as absent. A failed lookup is logged and the
/// object treated as absent too, unless every lookup failed, which fails the pass.
#[instrument(skip(client, deps), fields(dependencies = deps.len()))]
pub async fn fetch_dependencies(
    client: &Client,
    deps: &DependencySet,
) -> Result<FetchedDependencies> {
    let mut fetched = FetchedDependencies::default();
    let mut failed = 0;

    for key in deps.keys() {
        let result = match key.kind {
            DependencyKind::ConfigMap => fetch_into(client, key, &mut fetched.config_maps).await,
            DependencyKind::Secret => fetch_into(client, key, &mut fetched.secrets).await,
        };

        match result {
            Ok(true) => {}
            Ok(false) => debug!("{} does not exist, treating as empty", key),
            Err(e) => {
                warn!("Failed to fetch {}: {}", key, e);
                failed += 1;
            }
        }
    }

    if failed > 0 && failed == deps.len() {
        return Err(WaveError::DependencyFetch { failed });
    }

    Ok(fetched)
}

async fn fetch_into<D: DependencyObject>(
    client: &Client,
    key: &DependencyKey,
    into: &mut BTreeMap<DependencyKey, D>,
) -> Result<bool> {
    match get_optional::<D>(client, &key.namespace, &key.name).await? {
        Some(obj) => {
            into.insert(key.clone(), obj);
            Ok(true)
        }
        None => Ok(false),
    }
}
