// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Discovers which ConfigMaps and Secrets a workload's pod template references.

use crate::annotations::extra_dependencies;
use crate::constants::annotations;
use crate::error::{Result, WaveError};
use crate::types::{
    DependencyKey, DependencyKind, DependencyMetadata, DependencySet, Workload, WorkloadRef,
};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec, Volume};
use kube::ResourceExt;
use tracing::{debug, instrument};

/// Resolve every dependency of a workload: its pod template plus the extra-dependency annotations
#[instrument(skip(workload), fields(workload = %WorkloadRef::of(workload)))]
pub fn resolve<K: Workload>(workload: &K) -> Result<DependencySet> {
    let namespace = workload.namespace().unwrap_or_default();

    let mut deps = workload
        .pod_template()
        .map(|t| resolve_pod_template(t, &namespace))
        .unwrap_or_default();

    for (key, kind) in [
        (annotations::EXTRA_CONFIGMAPS, DependencyKind::ConfigMap),
        (annotations::EXTRA_SECRETS, DependencyKind::Secret),
    ] {
        if let Some(raw) = extra_dependencies(workload, key) {
            for dep in parse_extra_dependencies(raw, kind, &namespace)? {
                deps.insert(dep, DependencyMetadata::AllKeys);
            }
        }
    }

    debug!("Resolved {} dependencies", deps.len());
    Ok(deps)
}

/// Walk a pod template for ConfigMap and Secret references in `namespace`
pub fn resolve_pod_template(template: &PodTemplateSpec, namespace: &str) -> DependencySet {
    let mut deps = DependencySet::new();
    if let Some(spec) = template.spec.as_ref() {
        collect_pod_spec(spec, namespace, &mut deps);
    }
    deps
}

fn collect_pod_spec(spec: &PodSpec, namespace: &str, deps: &mut DependencySet) {
    for volume in spec.volumes.iter().flatten() {
        collect_volume(volume, namespace, deps);
    }

    let init = spec.init_containers.iter().flatten();
    for container in spec.containers.iter().chain(init) {
        collect_container(container, namespace, deps);
    }
}

fn collect_volume(volume: &Volume, namespace: &str, deps: &mut DependencySet) {
    // key-to-path items on plain volumes are deliberately ignored: the whole object is tracked
    if let Some(cm) = &volume.config_map {
        add(deps, DependencyKind::ConfigMap, namespace, &cm.name, DependencyMetadata::AllKeys);
    }
    if let Some(name) = volume.secret.as_ref().and_then(|s| s.secret_name.as_deref()) {
        add(deps, DependencyKind::Secret, namespace, name, DependencyMetadata::AllKeys);
    }

    let sources = volume.projected.as_ref().and_then(|p| p.sources.as_ref());
    for source in sources.into_iter().flatten() {
        if let Some(cm) = &source.config_map {
            let metadata = projection_metadata(cm.items.as_deref());
            add(deps, DependencyKind::ConfigMap, namespace, &cm.name, metadata);
        }
        if let Some(secret) = &source.secret {
            let metadata = projection_metadata(secret.items.as_deref());
            add(deps, DependencyKind::Secret, namespace, &secret.name, metadata);
        }
    }
}

fn projection_metadata(
    items: Option<&[k8s_openapi::api::core::v1::KeyToPath]>,
) -> DependencyMetadata {
    match items {
        Some(items) if !items.is_empty() => {
            DependencyMetadata::keys(items.iter().map(|i| i.key.as_str()))
        }
        _ => DependencyMetadata::AllKeys,
    }
}

fn collect_container(container: &Container, namespace: &str, deps: &mut DependencySet) {
    for var in container.env.iter().flatten() {
        let Some(source) = &var.value_from else {
            continue;
        };
        if let Some(sel) = &source.config_map_key_ref {
            add(
                deps,
                DependencyKind::ConfigMap,
                namespace,
                &sel.name,
                DependencyMetadata::key(sel.key.as_str()),
            );
        }
        if let Some(sel) = &source.secret_key_ref {
            add(
                deps,
                DependencyKind::Secret,
                namespace,
                &sel.name,
                DependencyMetadata::key(sel.key.as_str()),
            );
        }
    }

    for source in container.env_from.iter().flatten() {
        if let Some(cm) = &source.config_map_ref {
            add(deps, DependencyKind::ConfigMap, namespace, &cm.name, DependencyMetadata::AllKeys);
        }
        if let Some(secret) = &source.secret_ref {
            add(deps, DependencyKind::Secret, namespace, &secret.name, DependencyMetadata::AllKeys);
        }
    }
}

fn add(
    deps: &mut DependencySet,
    kind: DependencyKind,
    namespace: &str,
    name: &str,
    metadata: DependencyMetadata,
) {
    if name.is_empty() {
        return;
    }
    deps.insert(DependencyKey::new(kind, namespace, name), metadata);
}

/// Parse a comma-separated `[namespace/]name` list.
///
/// Empty tokens (e.g. a trailing comma) are skipped; anything else that is
/// not a valid namespace/object name is an error.
pub fn parse_extra_dependencies(
    raw: &str,
    kind: DependencyKind,
    default_namespace: &str,
) -> Result<Vec<DependencyKey>> {
    let mut keys = Vec::new();

    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (namespace, name) = match token.split_once('/') {
            Some((ns, name)) => (ns, name),
            None => (default_namespace, token),
        };

        if !is_valid_namespace(namespace) || !is_valid_object_name(name) {
            return Err(WaveError::InvalidAnnotation(format!(
                "invalid extra {} reference {:?}",
                kind, token
            )));
        }

        keys.push(DependencyKey::new(kind, namespace, name));
    }

    Ok(keys)
}

/// RFC 1123 label, as required for namespaces
fn is_valid_namespace(s: &str) -> bool {
    s.len() <= 63 && is_dns_label(s)
}

/// RFC 1123 subdomain, as required for ConfigMap and Secret names
fn is_valid_object_name(s: &str) -> bool {
    s.len() <= 253 && s.split('.').all(is_dns_label)
}

fn is_dns_label(s: &str) -> bool {
    let bytes = s.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes
                    .iter()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        }
        _ => false,
    }
}
