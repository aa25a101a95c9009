// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaveError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("None of the {failed} dependencies could be fetched")]
    DependencyFetch { failed: usize },

    #[error("Write conflict: {0}")]
    WriteConflict(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl WaveError {
    /// Classify a failed write to `kind namespace/name`.
    ///
    /// A stale resourceVersion becomes [`WaveError::WriteConflict`] and a
    /// vanished object [`WaveError::NotFound`].
    pub fn from_write(err: kube::Error, kind: &str, namespace: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 409 => WaveError::WriteConflict(format!(
                "{} {}/{}: {}",
                kind, namespace, name, resp.message
            )),
            kube::Error::Api(resp) if resp.code == 404 => WaveError::NotFound {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            other => WaveError::KubeError(other),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, WaveError::WriteConflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            WaveError::NotFound { .. } => true,
            WaveError::KubeError(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, WaveError>;
