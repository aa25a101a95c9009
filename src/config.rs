// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Context;

use crate::constants::requeue;
use crate::error::{Result, WaveError};

use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Restrict all watches to this namespace; cluster-wide when unset
    pub watch_namespace: Option<String>,
    pub resync_interval: Duration,
    pub error_requeue: Duration,
    pub conflict_requeue: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            watch_namespace: None,
            resync_interval: Duration::from_secs(requeue::RESYNC_INTERVAL_SECS),
            error_requeue: Duration::from_secs(requeue::ERROR_INTERVAL_SECS),
            conflict_requeue: Duration::from_secs(requeue::CONFLICT_INTERVAL_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
            .context("Failed to load configuration from environment")
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty());

        Ok(Config {
            watch_namespace,
            resync_interval: seconds(&lookup, "RESYNC_INTERVAL_SECS", requeue::RESYNC_INTERVAL_SECS)?,
            error_requeue: seconds(&lookup, "ERROR_REQUEUE_SECS", requeue::ERROR_INTERVAL_SECS)?,
            conflict_requeue: seconds(
                &lookup,
                "CONFLICT_REQUEUE_SECS",
                requeue::CONFLICT_INTERVAL_SECS,
            )?,
        })
    }
}

fn seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<Duration> {
    let Some(raw) = lookup(key) else {
        return Ok(Duration::from_secs(default));
    };

    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| WaveError::Config(format!("{}={:?} is not a number of seconds: {}", key, raw, e)))
}
