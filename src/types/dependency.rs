// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ConfigMap and Secret dependencies of a workload.

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::core::NamespaceResourceScope;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencyKind {
    ConfigMap,
    Secret,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::ConfigMap => "ConfigMap",
            DependencyKind::Secret => "Secret",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API objects a workload can depend on
pub trait DependencyObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const KIND: DependencyKind;
}

impl DependencyObject for ConfigMap {
    const KIND: DependencyKind = DependencyKind::ConfigMap;
}

impl DependencyObject for Secret {
    const KIND: DependencyKind = DependencyKind::Secret;
}

/// Uniquely identifies a dependency object.
///
/// Ordering is (kind, namespace, name), which is the canonical order the
/// fingerprint is built in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyKey {
    pub kind: DependencyKind,
    pub namespace: String,
    pub name: String,
}

impl DependencyKey {
    pub fn new(kind: DependencyKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn config_map(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DependencyKind::ConfigMap, namespace, name)
    }

    pub fn secret(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DependencyKind::Secret, namespace, name)
    }

    /// Key of a live dependency object
    pub fn of<D: DependencyObject>(obj: &D) -> Self {
        Self::new(
            D::KIND,
            obj.meta().namespace.clone().unwrap_or_default(),
            obj.meta().name.clone().unwrap_or_default(),
        )
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Which data keys of a dependency matter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyMetadata {
    AllKeys,
    Keys(BTreeSet<String>),
}

impl DependencyMetadata {
    pub fn key(key: impl Into<String>) -> Self {
        DependencyMetadata::Keys(BTreeSet::from([key.into()]))
    }

    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DependencyMetadata::Keys(keys.into_iter().map(Into::into).collect())
    }

    /// Whether `key` contributes to the fingerprint
    pub fn includes(&self, key: &str) -> bool {
        match self {
            DependencyMetadata::AllKeys => true,
            DependencyMetadata::Keys(keys) => keys.contains(key),
        }
    }

    /// Merge another finding for the same dependency: `AllKeys` wins, key sets union.
    pub fn merge(&mut self, other: DependencyMetadata) {
        match (&mut *self, other) {
            (DependencyMetadata::AllKeys, _) => {}
            (this, DependencyMetadata::AllKeys) => *this = DependencyMetadata::AllKeys,
            (DependencyMetadata::Keys(keys), DependencyMetadata::Keys(more)) => keys.extend(more),
        }
    }
}

/// Resolved dependencies of one workload, keyed uniquely by [`DependencyKey`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    entries: BTreeMap<DependencyKey, DependencyMetadata>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding, merging with any earlier finding for the same key
    pub fn insert(&mut self, key: DependencyKey, metadata: DependencyMetadata) {
        match self.entries.entry(key) {
            Entry::Vacant(e) => {
                e.insert(metadata);
            }
            Entry::Occupied(mut e) => e.get_mut().merge(metadata),
        }
    }

    pub fn get(&self, key: &DependencyKey) -> Option<&DependencyMetadata> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical (kind, namespace, name) order
    pub fn iter(&self) -> impl Iterator<Item = (&DependencyKey, &DependencyMetadata)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &DependencyKey> {
        self.entries.keys()
    }

    pub fn of_kind(
        &self,
        kind: DependencyKind,
    ) -> impl Iterator<Item = (&DependencyKey, &DependencyMetadata)> {
        self.entries.iter().filter(move |(k, _)| k.kind == kind)
    }
}

impl FromIterator<(DependencyKey, DependencyMetadata)> for DependencySet {
    fn from_iter<T: IntoIterator<Item = (DependencyKey, DependencyMetadata)>>(iter: T) -> Self {
        let mut set = DependencySet::new();
        for (key, metadata) in iter {
            set.insert(key, metadata);
        }
        set
    }
}
