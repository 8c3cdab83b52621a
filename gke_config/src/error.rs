//! Error types for the gke_config crate.

use thiserror::Error;

/// Result type for gke_config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised when a handler needs a default that was never configured.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("project_id argument not provided and no default project is configured (set it with `gcloud config set project PROJECT_ID`)")]
    MissingProject,

    #[error("location argument not provided and no default location is configured (set it with `gcloud config set compute/region REGION`)")]
    MissingLocation,
}
