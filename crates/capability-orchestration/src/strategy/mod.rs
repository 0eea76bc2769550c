//! Artifact execution strategies
//!
//! The orchestrator delegates all physical artifact work to an
//! [`ArtifactStrategy`]. Two implementations satisfy the same contract:
//! [`LocalStrategy`] against an embedded in-process substrate, and
//! [`ManagedStrategy`] against a remote substrate reached through a
//! management protocol. The orchestrator never branches on which one is
//! active.

mod local;
mod managed;

pub use local::LocalStrategy;
pub use managed::{ManagedStrategy, ManagementClient, ManagementEndpoint, ManagementError};

use crate::Error;
use artifact_substrate::{ArtifactIdentity, ArtifactState};
use async_trait::async_trait;
use uuid::Uuid;

/// Handle to an artifact installed through a strategy
///
/// The handle itself is immutable; lifecycle state is owned by the
/// strategy and queried through [`ArtifactStrategy::state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    /// Substrate-assigned artifact id
    pub id: Uuid,

    /// Identity read from the artifact descriptor
    pub identity: ArtifactIdentity,

    /// Location the artifact was installed from
    pub location: String,
}

/// Contract for physically managing artifacts in a substrate
///
/// Both the local and the managed variant must satisfy these semantics
/// identically; in particular every operation on an already-uninstalled
/// handle fails fast.
#[async_trait]
pub trait ArtifactStrategy: Send + Sync {
    /// Install an artifact from a location
    ///
    /// On success the substrate holds the artifact in the `Installed`
    /// state. Fails with [`Error::Install`] on any failure: missing
    /// artifact, malformed descriptor, or identity conflict at the
    /// substrate level.
    async fn install(&self, location: &str) -> std::result::Result<ArtifactHandle, Error>;

    /// Start an installed artifact
    async fn start(&self, handle: &ArtifactHandle) -> std::result::Result<(), Error>;

    /// Stop a started artifact
    async fn stop(&self, handle: &ArtifactHandle) -> std::result::Result<(), Error>;

    /// Uninstall an artifact; its handle becomes permanently invalid
    async fn uninstall(&self, handle: &ArtifactHandle) -> std::result::Result<(), Error>;

    /// Resolve an artifact's identity from its descriptor without
    /// installing it
    ///
    /// Used before installation to detect whether an artifact with this
    /// identity is already registered.
    async fn identity(&self, location: &str) -> std::result::Result<ArtifactIdentity, Error>;

    /// Current lifecycle state of an artifact
    async fn state(&self, handle: &ArtifactHandle) -> std::result::Result<ArtifactState, Error>;
}
