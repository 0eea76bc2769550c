//! # Capability Orchestration
//!
//! Capability dependency resolution and artifact lifecycle orchestration.
//!
//! This crate provides the core orchestration logic for bringing a
//! substrate (embedded in-process, or remote behind a management
//! protocol) from an empty state to one that provides a requested set of
//! named services. Capabilities are dependency-ordered bundles of
//! artifact locations; the orchestrator transitively installs and starts
//! the minimum necessary artifacts, never reinstalls what already
//! satisfies a requirement, and tears everything down in deterministic
//! LIFO order.
//!
//! ## Example
//!
//! ```no_run
//! use capability_orchestration::{Capability, Orchestrator};
//! use artifact_substrate::EmbeddedSubstrate;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let log = Arc::new(Capability::new("log").with_artifact("/artifacts/log.art"));
//! let http = Arc::new(
//!     Capability::new("http")
//!         .provides("http", None)
//!         .with_dependency(log)
//!         .with_artifact("/artifacts/http.art"),
//! );
//!
//! let mut orchestrator = Orchestrator::local(Arc::new(EmbeddedSubstrate::new()));
//! orchestrator.add_capability(&http).await?;
//!
//! let report = orchestrator.shutdown().await;
//! assert!(report.is_clean());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]

mod capability;
mod orchestrator;
mod query;
mod registry;
mod strategy;

pub use capability::{Capability, ProvidedService};
pub use orchestrator::{Orchestrator, TeardownFailure, TeardownReport};
pub use query::{POLL_INTERVAL, ServiceQuery};
pub use registry::ArtifactRegistry;
pub use strategy::{
    ArtifactHandle, ArtifactStrategy, LocalStrategy, ManagedStrategy, ManagementClient,
    ManagementEndpoint, ManagementError,
};

/// Error types for orchestration operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed service filter expression; never retried
    #[error("Invalid filter expression: {0}")]
    InvalidFilter(String),

    /// An artifact's identity could not be determined
    #[error("Failed to read descriptor for '{location}': {message}")]
    Descriptor {
        /// Artifact location
        location: String,
        /// What went wrong
        message: String,
    },

    /// Installation failed
    #[error("Failed to install artifact from '{location}': {message}")]
    Install {
        /// Artifact location
        location: String,
        /// What went wrong
        message: String,
    },

    /// A start/stop/uninstall operation failed
    #[error("Lifecycle operation '{operation}' failed for '{location}': {message}")]
    Lifecycle {
        /// Artifact location
        location: String,
        /// Failing operation
        operation: String,
        /// What went wrong
        message: String,
    },

    /// The capability dependency graph contains a cycle
    #[error("Cyclic capability dependency involving '{0}'")]
    CyclicDependency(String),

    /// Management protocol error from the managed strategy
    #[error("Management protocol error: {0}")]
    Management(String),

    /// Embedded substrate error
    #[error("Substrate error: {0}")]
    Substrate(#[from] artifact_substrate::Error),
}
