//! Error types for the artifact substrate

use thiserror::Error;

/// Substrate error type
#[derive(Error, Debug)]
pub enum Error {
    /// No artifact with the given id or location
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// An artifact is already installed from this location
    #[error("Artifact already installed from '{0}'")]
    AlreadyInstalled(String),

    /// An artifact with the same symbolic name and version exists
    #[error("Artifact identity conflict: {identity}")]
    IdentityConflict {
        /// Conflicting identity
        identity: crate::models::ArtifactIdentity,
    },

    /// The artifact was uninstalled; its handle is permanently invalid
    #[error("Artifact from '{0}' is uninstalled")]
    ArtifactUninstalled(String),

    /// Descriptor at the location is unreachable or malformed
    #[error("Failed to read descriptor at '{location}': {message}")]
    Descriptor {
        /// Artifact location
        location: String,
        /// What went wrong
        message: String,
    },

    /// Malformed service filter expression
    #[error("Invalid filter expression: {0}")]
    InvalidFilter(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
