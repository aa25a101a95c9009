// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Core data model: workloads and their ConfigMap/Secret dependencies.

pub mod dependency;
pub mod workload;

pub use dependency::{
    DependencyKey, DependencyKind, DependencyMetadata, DependencyObject, DependencySet,
};
pub use workload::{Workload, WorkloadKind, WorkloadRef};
