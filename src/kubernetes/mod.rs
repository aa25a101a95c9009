// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes API helpers shared by the dependency and ownership code.

pub mod objects;

pub use objects::{get_optional, list_owned_by, patch_guarded};
