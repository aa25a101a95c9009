// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Dependency resolution, fetching and fingerprinting.

pub mod fetch;
pub mod fingerprint;
pub mod resolver;

pub use fetch::{fetch_dependencies, FetchedDependencies};
pub use fingerprint::{fingerprint, fingerprint_entries, Fingerprint};
pub use resolver::{parse_extra_dependencies, resolve, resolve_pod_template};
