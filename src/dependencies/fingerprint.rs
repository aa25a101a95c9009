// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deterministic digest over exactly the dependency data a workload uses.
//!
//! Only data keys enter the digest, never object metadata, so label or
//! annotation edits on a ConfigMap or Secret do not restart anything.
//! Entries are visited in (kind, namespace, name) order and keys within an
//! object in sorted order, which makes the result independent of the order
//! references appear in the pod template.

use crate::dependencies::fetch::FetchedDependencies;
use crate::types::{DependencyKey, DependencyKind, DependencyMetadata, DependencySet};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Hex-encoded SHA-256 over the relevant dependency data
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this fingerprint equals the one stored on a pod template
    pub fn matches(&self, stored: Option<&str>) -> bool {
        stored == Some(self.as_str())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint for a resolved dependency set
pub fn fingerprint(objects: &FetchedDependencies, deps: &DependencySet) -> Fingerprint {
    let mut hasher = CanonicalHasher::default();

    hasher.section(b"configmaps");
    for (key, metadata) in deps.of_kind(DependencyKind::ConfigMap) {
        hasher.object(key);
        let cm = objects.config_maps.get(key);
        let data = cm.and_then(|cm| cm.data.as_ref());
        let binary = cm.and_then(|cm| cm.binary_data.as_ref());
        hasher.pairs(selected(data, metadata).map(|(k, v)| (k.as_str(), v.as_bytes())));
        hasher.pairs(selected(binary, metadata).map(|(k, v)| (k.as_str(), v.0.as_slice())));
    }

    hasher.section(b"secrets");
    for (key, metadata) in deps.of_kind(DependencyKind::Secret) {
        hasher.object(key);
        // stringData is write-only; the API server folds it into data
        let data = objects.secrets.get(key).and_then(|s| s.data.as_ref());
        hasher.pairs(selected(data, metadata).map(|(k, v)| (k.as_str(), v.0.as_slice())));
    }

    Fingerprint(format!("{:x}", hasher.inner.finalize()))
}

/// Compute the fingerprint from unmerged findings, e.g. straight from several resolver passes.
///
/// Duplicates are merged first, so repeating an entry never changes the result.
pub fn fingerprint_entries<I>(objects: &FetchedDependencies, entries: I) -> Fingerprint
where
    I: IntoIterator<Item = (DependencyKey, DependencyMetadata)>,
{
    fingerprint(objects, &entries.into_iter().collect())
}

/// Pairs of `map` the metadata asks for; requested keys missing from the map contribute nothing
fn selected<'a, V>(
    map: Option<&'a BTreeMap<String, V>>,
    metadata: &'a DependencyMetadata,
) -> impl Iterator<Item = (&'a String, &'a V)> + 'a {
    map.into_iter()
        .flatten()
        .filter(move |(k, _)| metadata.includes(k))
}

/// Feeds length-prefixed fields into SHA-256 so no two inputs share an encoding
#[derive(Default)]
struct CanonicalHasher {
    inner: Sha256,
}

impl CanonicalHasher {
    fn field(&mut self, bytes: &[u8]) {
        self.inner.update((bytes.len() as u64).to_be_bytes());
        self.inner.update(bytes);
    }

    fn section(&mut self, tag: &[u8]) {
        self.field(tag);
    }

    fn object(&mut self, key: &DependencyKey) {
        self.field(key.namespace.as_bytes());
        self.field(key.name.as_bytes());
    }

    fn pairs<'a>(&mut self, pairs: impl Iterator<Item = (&'a str, &'a [u8])>) {
        let pairs: Vec<_> = pairs.collect();
        self.inner.update((pairs.len() as u64).to_be_bytes());
        for (key, value) in pairs {
            self.field(key.as_bytes());
            self.field(value);
        }
    }
}
