//! Embedded in-process substrate

use crate::{
    descriptor::{DescriptorReader, JsonDescriptorReader, load_manifest},
    error::{Error, Result},
    filter::Filter,
    models::{ArtifactIdentity, ArtifactManifest, ArtifactRecord, ArtifactState, ServiceRecord},
};
use chrono::Utc;
use futures::lock::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// A service currently published in the substrate
#[derive(Debug, Clone)]
struct PublishedService {
    /// Artifact that published the service, if any
    owner: Option<Uuid>,
    record: ServiceRecord,
}

#[derive(Default)]
struct SubstrateState {
    /// Installed artifacts by id; uninstalled artifacts remain as
    /// tombstones so later lifecycle calls can fail fast
    artifacts: HashMap<Uuid, ArtifactRecord>,
    /// Manifests of installed artifacts
    manifests: HashMap<Uuid, ArtifactManifest>,
    /// Published services
    services: Vec<PublishedService>,
}

/// In-process artifact container
///
/// Hosts installed artifacts and the services they publish. Shared via
/// `Arc`; interior state is behind an async mutex so the substrate can be
/// used from strategy objects that only hold `&self`.
pub struct EmbeddedSubstrate {
    reader: Arc<dyn DescriptorReader>,
    inner: Mutex<SubstrateState>,
}

impl EmbeddedSubstrate {
    /// Create a substrate that reads JSON manifests from the filesystem
    pub fn new() -> Self {
        Self::with_reader(Arc::new(JsonDescriptorReader::new()))
    }

    /// Create a substrate with a custom descriptor reader
    pub fn with_reader(reader: Arc<dyn DescriptorReader>) -> Self {
        Self {
            reader,
            inner: Mutex::new(SubstrateState::default()),
        }
    }

    /// Read an artifact's identity without installing it
    pub async fn read_identity(&self, location: &str) -> Result<ArtifactIdentity> {
        self.reader.read_identity(location).await
    }

    /// Install an artifact from a location
    ///
    /// Fails if the descriptor cannot be read, if the location is already
    /// installed, or if an installed artifact carries the same identity.
    pub async fn install(&self, location: &str) -> Result<ArtifactRecord> {
        let manifest = load_manifest(location).await?;
        let identity = manifest.identity();

        let mut state = self.inner.lock().await;

        let live = state
            .artifacts
            .values()
            .filter(|r| r.state != ArtifactState::Uninstalled);
        for record in live {
            if record.location == location {
                return Err(Error::AlreadyInstalled(location.to_string()));
            }
            if record.identity == identity {
                return Err(Error::IdentityConflict { identity });
            }
        }

        let record = ArtifactRecord {
            id: Uuid::new_v4(),
            identity,
            location: location.to_string(),
            state: ArtifactState::Installed,
            installed_at: Utc::now(),
        };

        info!("Installed artifact {} from '{}'", record.identity, location);

        state.manifests.insert(record.id, manifest);
        state.artifacts.insert(record.id, record.clone());
        Ok(record)
    }

    /// Start an installed artifact and publish its manifest services
    pub async fn start(&self, id: Uuid) -> Result<()> {
        let mut state = self.inner.lock().await;
        let record = live_artifact(&mut state.artifacts, id)?;
        record.state = ArtifactState::Starting;
        let location = record.location.clone();

        let published: Vec<PublishedService> = state
            .manifests
            .get(&id)
            .map(|m| m.services.clone())
            .unwrap_or_default()
            .into_iter()
            .map(|record| PublishedService {
                owner: Some(id),
                record,
            })
            .collect();

        debug!(
            "Starting artifact from '{}', publishing {} services",
            location,
            published.len()
        );
        state.services.extend(published);

        if let Some(record) = state.artifacts.get_mut(&id) {
            record.state = ArtifactState::Active;
        }
        Ok(())
    }

    /// Stop an artifact and withdraw its services
    pub async fn stop(&self, id: Uuid) -> Result<()> {
        let mut state = self.inner.lock().await;
        let record = live_artifact(&mut state.artifacts, id)?;
        record.state = ArtifactState::Stopping;
        let location = record.location.clone();

        state.services.retain(|s| s.owner != Some(id));
        debug!("Stopped artifact from '{}'", location);

        if let Some(record) = state.artifacts.get_mut(&id) {
            record.state = ArtifactState::Resolved;
        }
        Ok(())
    }

    /// Uninstall an artifact
    ///
    /// The artifact's services are withdrawn and its state becomes the
    /// terminal `Uninstalled`; any further operation on the id fails.
    pub async fn uninstall(&self, id: Uuid) -> Result<()> {
        let mut state = self.inner.lock().await;
        let record = live_artifact(&mut state.artifacts, id)?;
        record.state = ArtifactState::Uninstalled;
        let location = record.location.clone();

        state.services.retain(|s| s.owner != Some(id));
        state.manifests.remove(&id);

        info!("Uninstalled artifact from '{}'", location);
        Ok(())
    }

    /// Current lifecycle state of an artifact
    pub async fn state(&self, id: Uuid) -> Result<ArtifactState> {
        let state = self.inner.lock().await;
        state
            .artifacts
            .get(&id)
            .map(|r| r.state)
            .ok_or_else(|| Error::ArtifactNotFound(id.to_string()))
    }

    /// Publish a service that is not owned by any artifact
    ///
    /// Used for services provided by the environment itself rather than
    /// by an installed artifact.
    pub async fn register_service(&self, record: ServiceRecord) {
        let mut state = self.inner.lock().await;
        debug!("Registered external service '{}'", record.name);
        state.services.push(PublishedService {
            owner: None,
            record,
        });
    }

    /// Find published services by type name and optional filter
    pub async fn find_services(
        &self,
        name: &str,
        filter: Option<&str>,
    ) -> Result<Vec<ServiceRecord>> {
        let filter = filter.map(Filter::parse).transpose()?;

        let state = self.inner.lock().await;
        let matches: Vec<ServiceRecord> = state
            .services
            .iter()
            .filter(|s| s.record.name == name)
            .filter(|s| {
                filter
                    .as_ref()
                    .is_none_or(|f| f.matches(&s.record.properties))
            })
            .map(|s| s.record.clone())
            .collect();

        debug!("Found {} services for type '{}'", matches.len(), name);
        Ok(matches)
    }

    /// List installed artifacts, uninstalled tombstones excluded
    pub async fn installed_artifacts(&self) -> Vec<ArtifactRecord> {
        let state = self.inner.lock().await;
        state
            .artifacts
            .values()
            .filter(|r| r.state != ArtifactState::Uninstalled)
            .cloned()
            .collect()
    }
}

impl Default for EmbeddedSubstrate {
    fn default() -> Self {
        Self::new()
    }
}

/// Look up a mutable artifact record, failing fast on unknown ids and
/// uninstalled tombstones
fn live_artifact(
    artifacts: &mut HashMap<Uuid, ArtifactRecord>,
    id: Uuid,
) -> Result<&mut ArtifactRecord> {
    let record = artifacts
        .get_mut(&id)
        .ok_or_else(|| Error::ArtifactNotFound(id.to_string()))?;
    if record.state == ArtifactState::Uninstalled {
        return Err(Error::ArtifactUninstalled(record.location.clone()));
    }
    Ok(record)
}
