//! Artifact descriptor reading
//!
//! The orchestration layer never parses descriptor formats itself; it
//! resolves artifact identities through a [`DescriptorReader`].

use crate::{
    error::{Error, Result},
    models::{ArtifactIdentity, ArtifactManifest},
};
use async_trait::async_trait;

/// Resolves the identity of an artifact from its location without
/// installing it
#[async_trait]
pub trait DescriptorReader: Send + Sync {
    /// Read `(symbolic name, version)` from the descriptor at `location`
    ///
    /// Fails with [`Error::Descriptor`] if the location is unreachable or
    /// the descriptor is absent or malformed.
    async fn read_identity(&self, location: &str) -> Result<ArtifactIdentity>;
}

/// Reads identities from JSON manifests on the local filesystem
///
/// The location is interpreted as a path to an [`ArtifactManifest`] file.
#[derive(Debug, Default, Clone)]
pub struct JsonDescriptorReader;

impl JsonDescriptorReader {
    /// Create a new reader
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DescriptorReader for JsonDescriptorReader {
    async fn read_identity(&self, location: &str) -> Result<ArtifactIdentity> {
        let manifest = load_manifest(location).await?;
        Ok(manifest.identity())
    }
}

/// Load and parse the manifest at `location`
pub async fn load_manifest(location: &str) -> Result<ArtifactManifest> {
    let content = async_fs::read_to_string(location)
        .await
        .map_err(|e| Error::Descriptor {
            location: location.to_string(),
            message: e.to_string(),
        })?;

    serde_json::from_str(&content).map_err(|e| Error::Descriptor {
        location: location.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_manifest(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[smol_potat::test]
    async fn test_read_identity() {
        let dir = tempfile::tempdir().unwrap();
        let location = write_manifest(
            &dir,
            "log.art",
            r#"{"symbolicName": "org.example.log", "version": "1.2.0"}"#,
        );

        let reader = JsonDescriptorReader::new();
        let identity = reader.read_identity(&location).await.unwrap();
        assert_eq!(identity.symbolic_name, "org.example.log");
        assert_eq!(identity.version, "1.2.0");
    }

    #[smol_potat::test]
    async fn test_missing_descriptor() {
        let reader = JsonDescriptorReader::new();
        let result = reader.read_identity("/nonexistent/path.art").await;
        assert!(matches!(result, Err(Error::Descriptor { .. })));
    }

    #[smol_potat::test]
    async fn test_malformed_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let location = write_manifest(&dir, "bad.art", "not json");

        let reader = JsonDescriptorReader::new();
        let result = reader.read_identity(&location).await;
        assert!(matches!(result, Err(Error::Descriptor { .. })));
    }
}
