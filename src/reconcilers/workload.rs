// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Workload reconciler - keeps the config-hash annotation of opted-in workloads
//! in step with the ConfigMaps and Secrets they use.

use crate::annotations::{current_fingerprint, is_opted_in, set_fingerprint};
use crate::config::Config;
use crate::dependencies::{fetch_dependencies, fingerprint, resolve, Fingerprint};
use crate::error::{Result, WaveError};
use crate::kubernetes::patch_guarded;
use crate::ownership::{
    drop_finalizer, ensure_finalizer, has_finalizer, linkable_count, remove_owner_references,
    update_owner_references,
};
use crate::types::{DependencyObject, DependencySet, Workload, WorkloadRef};
use futures::StreamExt;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{
    runtime::{controller::Action, reflector::ObjectRef, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use serde_json::json;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// How a reconciliation pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The workload no longer exists
    NotFound,
    /// Not opted in; any links and the finalizer have been cleaned up
    OptedOut,
    /// Fingerprint was already current
    Unchanged,
    /// A new fingerprint was written to the pod template
    Patched,
    /// The workload is being deleted and has been released
    FinalizerRemoved,
}

pub struct WorkloadReconciler<K> {
    client: Client,
    config: Config,
    _kind: PhantomData<fn() -> K>,
}

impl<K: Workload> WorkloadReconciler<K> {
    pub fn new(client: Client, config: Config) -> Self {
        Self {
            client,
            config,
            _kind: PhantomData,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let (workloads, config_maps, secrets) = match self.config.watch_namespace.as_deref() {
            Some(ns) => (
                Api::<K>::namespaced(self.client.clone(), ns),
                Api::<ConfigMap>::namespaced(self.client.clone(), ns),
                Api::<Secret>::namespaced(self.client.clone(), ns),
            ),
            None => (
                Api::<K>::all(self.client.clone()),
                Api::<ConfigMap>::all(self.client.clone()),
                Api::<Secret>::all(self.client.clone()),
            ),
        };
        info!("Starting {} reconciler", K::KIND);
        let context = Arc::new(self);

        Controller::new(workloads, WatcherConfig::default())
            .watches(config_maps, WatcherConfig::default(), owners_of::<K, ConfigMap>)
            .watches(secrets, WatcherConfig::default(), owners_of::<K, Secret>)
            .shutdown_on_signal()
            .run(reconcile::<K>, error_policy::<K>, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled {}: {:?}", K::KIND, o),
                    Err(e) => warn!("{} reconciliation error: {:?}", K::KIND, e),
                }
            })
            .await;

        Ok(())
    }

    /// Run one pass of the state machine for the named workload.
    ///
    /// The workload is always re-read so a stale cache never drives a write.
    #[instrument(skip_all, fields(workload = %target))]
    pub async fn reconcile_workload(&self, target: &WorkloadRef) -> Result<Outcome> {
        let api: Api<K> = Api::namespaced(self.client.clone(), &target.namespace);
        let Some(workload) = api.get_opt(&target.name).await? else {
            debug!("Workload is gone");
            return Ok(Outcome::NotFound);
        };

        if workload.meta().deletion_timestamp.is_some() {
            return self.release(workload, Outcome::FinalizerRemoved).await;
        }

        if !is_opted_in(&workload) {
            return self.release(workload, Outcome::OptedOut).await;
        }

        let deps = resolve(&workload)?;
        let fetched = fetch_dependencies(&self.client, &deps).await?;
        let hash = fingerprint(&fetched, &deps);

        let stored = workload.pod_template().and_then(current_fingerprint);
        let (workload, outcome) = if hash.matches(stored) {
            debug!("Fingerprint {} is current", hash);
            (workload, Outcome::Unchanged)
        } else {
            match self.write_fingerprint(workload, &hash).await {
                Ok(updated) => updated,
                Err(e) if e.is_not_found() => return Ok(Outcome::NotFound),
                Err(e) => return Err(e),
            }
        };

        // The finalizer goes on before the first link and comes off after the last
        let linkable = linkable_count(&workload, &fetched);
        let workload = if linkable > 0 {
            ensure_finalizer(&self.client, workload).await?
        } else {
            workload
        };

        let linked = update_owner_references(&self.client, &workload, &deps, &fetched).await?;
        if linked == 0 {
            drop_finalizer(&self.client, workload).await?;
        }

        Ok(outcome)
    }

    async fn write_fingerprint(&self, workload: K, hash: &Fingerprint) -> Result<(K, Outcome)> {
        let mut updated = workload.clone();
        let Some(template) = updated.pod_template_mut() else {
            return Ok((workload, Outcome::Unchanged));
        };
        set_fingerprint(template, hash.as_str());
        let annotations = template
            .metadata
            .as_ref()
            .and_then(|m| m.annotations.clone());

        let patch = json!({
            "spec": { "template": { "metadata": { "annotations": annotations } } }
        });
        let patched = patch_guarded(&self.client, &workload, patch).await?;
        info!("Updated {} to fingerprint {}", WorkloadRef::of(&patched), hash);
        Ok((patched, Outcome::Patched))
    }

    /// Strip every link to `workload` and drop its finalizer.
    ///
    /// Links only exist while the finalizer does, so a workload without it
    /// needs no cleanup.
    async fn release(&self, workload: K, outcome: Outcome) -> Result<Outcome> {
        if !has_finalizer(workload.finalizers()) {
            return Ok(outcome);
        }

        let deps = resolve(&workload).unwrap_or_else(|e| {
            warn!("Cleaning up without resolved dependencies: {}", e);
            DependencySet::new()
        });
        remove_owner_references(&self.client, &workload, &deps).await?;

        match drop_finalizer(&self.client, workload).await {
            Ok(_) => Ok(outcome),
            Err(e) if e.is_not_found() => Ok(Outcome::NotFound),
            Err(e) => Err(e),
        }
    }
}

/// Workloads of kind `K` that `obj` is linked to
fn owners_of<K: Workload, D: DependencyObject>(obj: D) -> Vec<ObjectRef<K>> {
    let Some(namespace) = obj.namespace() else {
        return vec![];
    };
    let api_version = K::api_version(&());
    let kind = K::kind(&());

    obj.owner_references()
        .iter()
        .filter(|r| r.kind == kind && r.api_version == api_version)
        .map(|r| ObjectRef::<K>::new(&r.name).within(&namespace))
        .collect()
}

async fn reconcile<K: Workload>(
    workload: Arc<K>,
    ctx: Arc<WorkloadReconciler<K>>,
) -> Result<Action> {
    let target = WorkloadRef::of(workload.as_ref());
    let outcome = ctx.reconcile_workload(&target).await?;

    debug!("Reconciled {}: {:?}", target, outcome);
    Ok(match outcome {
        Outcome::Unchanged | Outcome::Patched => Action::requeue(ctx.config.resync_interval),
        Outcome::NotFound | Outcome::OptedOut | Outcome::FinalizerRemoved => {
            Action::await_change()
        }
    })
}

fn error_policy<K: Workload>(
    workload: Arc<K>,
    error: &WaveError,
    ctx: Arc<WorkloadReconciler<K>>,
) -> Action {
    let target = WorkloadRef::of(workload.as_ref());
    if error.is_conflict() {
        debug!("Conflict on {}, retrying: {}", target, error);
        return Action::requeue(ctx.config.conflict_requeue);
    }
    error!("Reconciliation of {} failed: {}", target, error);
    Action::requeue(ctx.config.error_requeue)
}
