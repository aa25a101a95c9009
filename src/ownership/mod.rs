// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Links between workloads and their dependencies: owner references on the
//! dependencies, and a finalizer on the workload while any link exists.

pub mod finalizer;
pub mod owner_refs;

pub use finalizer::{add_finalizer, drop_finalizer, ensure_finalizer, has_finalizer, remove_finalizer};
pub use owner_refs::{
    linkable_count, owner_reference_for, remove_owner_references, update_owner_references,
    with_owner_reference, without_owner_reference,
};
