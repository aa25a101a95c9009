// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used by Wave
pub mod annotations {
    /// When set to [`REQUIRED_VALUE`], enables config-change rollouts for this workload
    pub const UPDATE_ON_CONFIG_CHANGE: &str = "wave.pusher.com/update-on-config-change";
    /// Value the opt-in annotation must carry, compared exactly
    pub const REQUIRED_VALUE: &str = "true";
    /// Comma-separated `[namespace/]name` list of additional ConfigMaps to track
    pub const EXTRA_CONFIGMAPS: &str = "wave.pusher.com/extra-configmaps";
    /// Comma-separated `[namespace/]name` list of additional Secrets to track
    pub const EXTRA_SECRETS: &str = "wave.pusher.com/extra-secrets";
    /// Fingerprint of the referenced config, stored on the pod template
    pub const CONFIG_HASH: &str = "wave.pusher.com/config-hash";
}

/// Finalizer guarding removal of owner references from dependencies
pub const FINALIZER: &str = "wave.pusher.com/finalizer";

/// The operator name used as field manager for API writes
pub const OPERATOR_NAME: &str = "wave";

/// Requeue defaults, overridable through [`crate::config::Config`]
pub mod requeue {
    /// Seconds between level-triggered resyncs of a healthy workload
    pub const RESYNC_INTERVAL_SECS: u64 = 300;
    /// Seconds before retrying a pass that failed
    pub const ERROR_INTERVAL_SECS: u64 = 60;
    /// Seconds before retrying a pass that lost an optimistic-concurrency race
    pub const CONFLICT_INTERVAL_SECS: u64 = 1;
}
