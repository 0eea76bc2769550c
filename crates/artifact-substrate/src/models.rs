//! Data models shared by the embedded substrate and the orchestration layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Immutable identity of an installable artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactIdentity {
    /// Symbolic name, unique per artifact within a substrate
    pub symbolic_name: String,

    /// Artifact version
    pub version: String,
}

impl ArtifactIdentity {
    /// Create a new identity
    pub fn new(symbolic_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for ArtifactIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{}", self.symbolic_name, self.version)
    }
}

/// Lifecycle state of an installed artifact
///
/// `Uninstalled` is terminal: any further lifecycle operation on an
/// uninstalled artifact fails fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArtifactState {
    /// Installed but not yet resolved
    Installed,
    /// Resolved and ready to start
    Resolved,
    /// Start in progress
    Starting,
    /// Running, services published
    Active,
    /// Stop in progress
    Stopping,
    /// Removed from the substrate (terminal)
    Uninstalled,
}

/// An artifact installed in the substrate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Unique id assigned at install time
    pub id: Uuid,

    /// Identity read from the artifact descriptor
    pub identity: ArtifactIdentity,

    /// Location the artifact was installed from
    pub location: String,

    /// Current lifecycle state
    pub state: ArtifactState,

    /// When the artifact was installed
    pub installed_at: DateTime<Utc>,
}

/// A service published in the substrate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Service type name (e.g., "http")
    pub name: String,

    /// Service properties, matched by filter expressions
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl ServiceRecord {
    /// Create a service record with no properties
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    /// Add a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// JSON descriptor stored at an artifact location
///
/// The embedded substrate installs artifacts described by these manifests.
/// Services listed here are published while the artifact is active and
/// withdrawn when it stops.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactManifest {
    /// Symbolic name of the artifact
    pub symbolic_name: String,

    /// Artifact version
    pub version: String,

    /// Services the artifact provides while active
    #[serde(default)]
    pub services: Vec<ServiceRecord>,
}

impl ArtifactManifest {
    /// Identity declared by this manifest
    pub fn identity(&self) -> ArtifactIdentity {
        ArtifactIdentity::new(&self.symbolic_name, &self.version)
    }
}
