//! Local strategy backed by the embedded substrate

use super::{ArtifactHandle, ArtifactStrategy};
use crate::{Error, query::ServiceQuery};
use artifact_substrate::{
    ArtifactIdentity, ArtifactState, EmbeddedSubstrate, Error as SubstrateError, ServiceRecord,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Executes artifact lifecycle operations in-process against an
/// [`EmbeddedSubstrate`]
///
/// Also answers service queries from the same substrate, so one instance
/// can serve as both the strategy and the [`ServiceQuery`] of an
/// orchestrator.
pub struct LocalStrategy {
    substrate: Arc<EmbeddedSubstrate>,
}

impl LocalStrategy {
    /// Create a strategy over the given substrate
    pub fn new(substrate: Arc<EmbeddedSubstrate>) -> Self {
        Self { substrate }
    }

    /// The substrate this strategy operates on
    pub fn substrate(&self) -> &Arc<EmbeddedSubstrate> {
        &self.substrate
    }

    fn lifecycle_error(operation: &'static str, handle: &ArtifactHandle, error: SubstrateError) -> Error {
        Error::Lifecycle {
            location: handle.location.clone(),
            operation: operation.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl ArtifactStrategy for LocalStrategy {
    async fn install(&self, location: &str) -> std::result::Result<ArtifactHandle, Error> {
        debug!("Installing artifact from '{}' into embedded substrate", location);
        let record = self
            .substrate
            .install(location)
            .await
            .map_err(|e| Error::Install {
                location: location.to_string(),
                message: e.to_string(),
            })?;

        Ok(ArtifactHandle {
            id: record.id,
            identity: record.identity,
            location: record.location,
        })
    }

    async fn start(&self, handle: &ArtifactHandle) -> std::result::Result<(), Error> {
        self.substrate
            .start(handle.id)
            .await
            .map_err(|e| Self::lifecycle_error("start", handle, e))
    }

    async fn stop(&self, handle: &ArtifactHandle) -> std::result::Result<(), Error> {
        self.substrate
            .stop(handle.id)
            .await
            .map_err(|e| Self::lifecycle_error("stop", handle, e))
    }

    async fn uninstall(&self, handle: &ArtifactHandle) -> std::result::Result<(), Error> {
        self.substrate
            .uninstall(handle.id)
            .await
            .map_err(|e| Self::lifecycle_error("uninstall", handle, e))
    }

    async fn identity(&self, location: &str) -> std::result::Result<ArtifactIdentity, Error> {
        self.substrate
            .read_identity(location)
            .await
            .map_err(|e| Error::Descriptor {
                location: location.to_string(),
                message: e.to_string(),
            })
    }

    async fn state(&self, handle: &ArtifactHandle) -> std::result::Result<ArtifactState, Error> {
        Ok(self.substrate.state(handle.id).await?)
    }
}

#[async_trait]
impl ServiceQuery for LocalStrategy {
    async fn find(
        &self,
        service_name: &str,
        filter: Option<&str>,
    ) -> std::result::Result<Vec<ServiceRecord>, Error> {
        self.substrate
            .find_services(service_name, filter)
            .await
            .map_err(|e| match e {
                SubstrateError::InvalidFilter(expr) => Error::InvalidFilter(expr),
                other => Error::Substrate(other),
            })
    }
}
