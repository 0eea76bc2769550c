//! Insertion-ordered registry of installed artifacts

use crate::strategy::ArtifactHandle;
use artifact_substrate::ArtifactIdentity;
use indexmap::IndexMap;

/// Ordered map from artifact location to installed handle
///
/// Insertion order is preserved so teardown can process the reverse of
/// however artifacts were actually installed, regardless of which
/// capability contributed them. This cross-capability LIFO ordering is
/// what keeps a shared dependency installed while a later-installed
/// consumer of it still exists.
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    entries: IndexMap<String, ArtifactHandle>,
}

impl ArtifactRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Record a handle under the location it was installed from
    pub fn insert(&mut self, handle: ArtifactHandle) {
        self.entries.insert(handle.location.clone(), handle);
    }

    /// Whether an artifact from this location is registered
    pub fn contains_location(&self, location: &str) -> bool {
        self.entries.contains_key(location)
    }

    /// Find a registered handle by artifact identity
    pub fn find_by_identity(&self, identity: &ArtifactIdentity) -> Option<&ArtifactHandle> {
        self.entries.values().find(|h| &h.identity == identity)
    }

    /// Remove the entry for a location, preserving the order of the rest
    pub fn remove(&mut self, location: &str) -> Option<ArtifactHandle> {
        self.entries.shift_remove(location)
    }

    /// Drain all entries in reverse insertion order
    pub fn drain_reverse(&mut self) -> Vec<ArtifactHandle> {
        let mut handles: Vec<ArtifactHandle> = self.entries.drain(..).map(|(_, h)| h).collect();
        handles.reverse();
        handles
    }

    /// Registered handles in insertion order
    pub fn handles(&self) -> Vec<ArtifactHandle> {
        self.entries.values().cloned().collect()
    }

    /// Number of registered artifacts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
