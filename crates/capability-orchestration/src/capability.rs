//! Capability descriptors
//!
//! A capability is a named, dependency-ordered bundle of artifact
//! locations representing one reusable feature. Descriptors are immutable
//! once constructed; all installation bookkeeping lives in the
//! [`Orchestrator`](crate::Orchestrator), so the same descriptor can be
//! shared across independent orchestrator instances.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Service a capability provides once installed
///
/// Used as the idempotency probe: when a matching service already exists
/// in the target environment, the capability is considered satisfied and
/// none of its artifacts are installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidedService {
    /// Service type name looked up in the substrate
    pub name: String,

    /// Optional filter over service properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// A reusable feature bundle
///
/// Dependencies are installed before the capability's own artifacts and
/// removed after them; declaration order is significant in both
/// directions.
#[derive(Debug, Clone)]
pub struct Capability {
    name: String,
    provides: Option<ProvidedService>,
    dependencies: Vec<Arc<Capability>>,
    artifact_locations: Vec<String>,
}

impl Capability {
    /// Create a capability with no dependencies, artifacts or provided
    /// service
    ///
    /// The name identifies the capability within an orchestrator; two
    /// distinct capabilities handed to the same orchestrator must not
    /// share a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provides: None,
            dependencies: Vec::new(),
            artifact_locations: Vec::new(),
        }
    }

    /// Declare the service this capability provides
    ///
    /// A capability without a provided service is always (re)installed,
    /// subject to artifact-level idempotency.
    pub fn provides(mut self, name: impl Into<String>, filter: Option<&str>) -> Self {
        self.provides = Some(ProvidedService {
            name: name.into(),
            filter: filter.map(str::to_string),
        });
        self
    }

    /// Append a dependency; dependencies install in declared order
    pub fn with_dependency(mut self, dependency: Arc<Capability>) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Append an artifact location; artifacts install in declared order
    pub fn with_artifact(mut self, location: impl Into<String>) -> Self {
        self.artifact_locations.push(location.into());
        self
    }

    /// Capability name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provided service, if any
    pub fn provided_service(&self) -> Option<&ProvidedService> {
        self.provides.as_ref()
    }

    /// Dependencies in declared order
    pub fn dependencies(&self) -> &[Arc<Capability>] {
        &self.dependencies
    }

    /// Artifact locations in declared order
    pub fn artifact_locations(&self) -> &[String] {
        &self.artifact_locations
    }
}
