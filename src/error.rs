//! Error types for the task store, the validator and configuration.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::validate::TaskDraft;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No record carries the requested id.
    #[error("task not found: {0}")]
    NotFound(String),

    /// The id is not a UUID, so no record could carry it.
    #[error("invalid id format: {0}")]
    InvalidId(String),

    /// The collection could not be durably written; the change was not applied.
    #[error("failed to write tasks to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Input rejected by the validator, together with the values the user typed
/// so they can be shown again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid task: {}", .errors.join("; "))]
pub struct ValidationError {
    pub errors: Vec<String>,
    pub values: TaskDraft,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
