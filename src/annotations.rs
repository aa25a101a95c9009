// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reading and writing the annotations Wave owns.

use crate::constants::annotations;
use k8s_openapi::api::core::v1::PodTemplateSpec;
use kube::ResourceExt;

/// Check if a workload opted in with the exact required annotation value
pub fn is_opted_in<K: ResourceExt>(workload: &K) -> bool {
    workload
        .annotations()
        .get(annotations::UPDATE_ON_CONFIG_CHANGE)
        .is_some_and(|v| v == annotations::REQUIRED_VALUE)
}

/// Raw extra-dependency list stored under `key`, if any
pub fn extra_dependencies<'a, K: ResourceExt>(workload: &'a K, key: &str) -> Option<&'a str> {
    workload.annotations().get(key).map(|s| s.as_str())
}

/// Fingerprint currently stored on the pod template
pub fn current_fingerprint(template: &PodTemplateSpec) -> Option<&str> {
    template
        .metadata
        .as_ref()
        .and_then(|m| m.annotations.as_ref())
        .and_then(|a| a.get(annotations::CONFIG_HASH))
        .map(|s| s.as_str())
}

/// Store `fingerprint` on the pod template, leaving other annotations in place
pub fn set_fingerprint(template: &mut PodTemplateSpec, fingerprint: &str) {
    template
        .metadata
        .get_or_insert_with(Default::default)
        .annotations
        .get_or_insert_with(Default::default)
        .insert(annotations::CONFIG_HASH.to_string(), fingerprint.to_string());
}
