//! Managed strategy against a remote substrate
//!
//! The remote substrate is reached through a management protocol whose
//! transport is out of scope here: callers inject a [`ManagementClient`]
//! that can invoke named operations with JSON arguments. This strategy
//! translates lifecycle calls into protocol operations and protocol
//! faults back into the same error kinds the local strategy raises.

use super::{ArtifactHandle, ArtifactStrategy};
use crate::{Error, query::ServiceQuery};
use artifact_substrate::{ArtifactIdentity, ArtifactState, ServiceRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::debug;
use uuid::Uuid;

/// Management protocol error
#[derive(ThisError, Debug)]
pub enum ManagementError {
    /// Could not reach the management endpoint
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint rejected the operation
    #[error("Management fault [{code}]: {message}")]
    Fault {
        /// Machine-readable fault code
        code: String,
        /// Human-readable fault detail
        message: String,
    },
}

impl ManagementError {
    fn code(&self) -> Option<&str> {
        match self {
            ManagementError::Fault { code, .. } => Some(code.as_str()),
            ManagementError::Transport(_) => None,
        }
    }
}

/// Connection descriptor for a remote management endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementEndpoint {
    /// Hostname or IP of the managed substrate
    pub host: String,

    /// Management port
    pub port: u16,
}

impl std::fmt::Display for ManagementEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Invokes operations on a remote management endpoint
///
/// Implementations own the wire protocol and transport; the strategy only
/// sees `invoke(operation, args) -> result`.
#[async_trait]
pub trait ManagementClient: Send + Sync {
    /// Invoke a named management operation
    async fn invoke(
        &self,
        operation: &str,
        args: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ManagementError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstallResult {
    id: Uuid,
    symbolic_name: String,
    version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityResult {
    symbolic_name: String,
    version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateResult {
    state: ArtifactState,
}

/// Executes artifact lifecycle operations against a remote substrate
pub struct ManagedStrategy {
    client: Arc<dyn ManagementClient>,
}

impl ManagedStrategy {
    /// Create a strategy over an injected management client
    pub fn new(client: Arc<dyn ManagementClient>) -> Self {
        Self { client }
    }

    fn decode<T: serde::de::DeserializeOwned>(
        value: serde_json::Value,
    ) -> std::result::Result<T, Error> {
        serde_json::from_value(value)
            .map_err(|e| Error::Management(format!("Malformed response payload: {}", e)))
    }

    async fn lifecycle_op(
        &self,
        operation_name: &'static str,
        protocol_operation: &'static str,
        handle: &ArtifactHandle,
    ) -> std::result::Result<(), Error> {
        debug!(
            "Invoking {} for '{}' on managed substrate",
            protocol_operation, handle.location
        );
        self.client
            .invoke(protocol_operation, serde_json::json!({ "id": handle.id }))
            .await
            .map_err(|e| Error::Lifecycle {
                location: handle.location.clone(),
                operation: operation_name.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactStrategy for ManagedStrategy {
    async fn install(&self, location: &str) -> std::result::Result<ArtifactHandle, Error> {
        debug!("Invoking installArtifact for '{}'", location);
        let value = self
            .client
            .invoke("installArtifact", serde_json::json!({ "location": location }))
            .await
            .map_err(|e| Error::Install {
                location: location.to_string(),
                message: e.to_string(),
            })?;

        let result: InstallResult = Self::decode(value)?;
        Ok(ArtifactHandle {
            id: result.id,
            identity: ArtifactIdentity::new(result.symbolic_name, result.version),
            location: location.to_string(),
        })
    }

    async fn start(&self, handle: &ArtifactHandle) -> std::result::Result<(), Error> {
        self.lifecycle_op("start", "startArtifact", handle).await
    }

    async fn stop(&self, handle: &ArtifactHandle) -> std::result::Result<(), Error> {
        self.lifecycle_op("stop", "stopArtifact", handle).await
    }

    async fn uninstall(&self, handle: &ArtifactHandle) -> std::result::Result<(), Error> {
        self.lifecycle_op("uninstall", "uninstallArtifact", handle)
            .await
    }

    async fn identity(&self, location: &str) -> std::result::Result<ArtifactIdentity, Error> {
        let value = self
            .client
            .invoke("artifactIdentity", serde_json::json!({ "location": location }))
            .await
            .map_err(|e| Error::Descriptor {
                location: location.to_string(),
                message: e.to_string(),
            })?;

        let result: IdentityResult = Self::decode(value)?;
        Ok(ArtifactIdentity::new(result.symbolic_name, result.version))
    }

    async fn state(&self, handle: &ArtifactHandle) -> std::result::Result<ArtifactState, Error> {
        let value = self
            .client
            .invoke("artifactState", serde_json::json!({ "id": handle.id }))
            .await
            .map_err(|e| Error::Management(e.to_string()))?;

        let result: StateResult = Self::decode(value)?;
        Ok(result.state)
    }
}

#[async_trait]
impl ServiceQuery for ManagedStrategy {
    async fn find(
        &self,
        service_name: &str,
        filter: Option<&str>,
    ) -> std::result::Result<Vec<ServiceRecord>, Error> {
        let value = self
            .client
            .invoke(
                "findServices",
                serde_json::json!({ "name": service_name, "filter": filter }),
            )
            .await
            .map_err(|e| {
                // The remote end validates filters; its fault maps back to
                // the same error kind the local strategy raises
                if e.code() == Some("invalidFilter") {
                    Error::InvalidFilter(filter.unwrap_or_default().to_string())
                } else {
                    Error::Management(e.to_string())
                }
            })?;

        Self::decode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::lock::Mutex;

    /// Scripted client recording every invocation
    struct MockClient {
        invocations: Mutex<Vec<(String, serde_json::Value)>>,
        responses: Mutex<Vec<std::result::Result<serde_json::Value, ManagementError>>>,
    }

    impl MockClient {
        fn new(
            responses: Vec<std::result::Result<serde_json::Value, ManagementError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                invocations: Mutex::new(Vec::new()),
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl ManagementClient for MockClient {
        async fn invoke(
            &self,
            operation: &str,
            args: serde_json::Value,
        ) -> std::result::Result<serde_json::Value, ManagementError> {
            self.invocations
                .lock()
                .await
                .push((operation.to_string(), args));
            self.responses.lock().await.remove(0)
        }
    }

    #[smol_potat::test]
    async fn test_install_payload_and_decoding() {
        let id = Uuid::new_v4();
        let client = MockClient::new(vec![Ok(serde_json::json!({
            "id": id,
            "symbolicName": "org.example.http",
            "version": "1.0.0"
        }))]);
        let strategy = ManagedStrategy::new(client.clone());

        let handle = strategy.install("http.art").await.unwrap();
        assert_eq!(handle.id, id);
        assert_eq!(handle.identity, ArtifactIdentity::new("org.example.http", "1.0.0"));
        assert_eq!(handle.location, "http.art");

        let invocations = client.invocations.lock().await;
        assert_eq!(invocations[0].0, "installArtifact");
        assert_eq!(invocations[0].1, serde_json::json!({ "location": "http.art" }));
    }

    #[smol_potat::test]
    async fn test_lifecycle_operations_use_artifact_id() {
        let id = Uuid::new_v4();
        let client = MockClient::new(vec![
            Ok(serde_json::json!(null)),
            Ok(serde_json::json!(null)),
            Ok(serde_json::json!(null)),
        ]);
        let strategy = ManagedStrategy::new(client.clone());
        let handle = ArtifactHandle {
            id,
            identity: ArtifactIdentity::new("org.example.http", "1.0.0"),
            location: "http.art".to_string(),
        };

        strategy.start(&handle).await.unwrap();
        strategy.stop(&handle).await.unwrap();
        strategy.uninstall(&handle).await.unwrap();

        let invocations = client.invocations.lock().await;
        let operations: Vec<&str> = invocations.iter().map(|(op, _)| op.as_str()).collect();
        assert_eq!(operations, ["startArtifact", "stopArtifact", "uninstallArtifact"]);
        for (_, args) in invocations.iter() {
            assert_eq!(args, &serde_json::json!({ "id": id }));
        }
    }

    #[smol_potat::test]
    async fn test_fault_translation() {
        let client = MockClient::new(vec![
            Err(ManagementError::Fault {
                code: "identityConflict".to_string(),
                message: "already present".to_string(),
            }),
            Err(ManagementError::Fault {
                code: "artifactUninstalled".to_string(),
                message: "gone".to_string(),
            }),
            Err(ManagementError::Fault {
                code: "invalidFilter".to_string(),
                message: "bad expression".to_string(),
            }),
        ]);
        let strategy = ManagedStrategy::new(client);
        let handle = ArtifactHandle {
            id: Uuid::new_v4(),
            identity: ArtifactIdentity::new("a", "1"),
            location: "a.art".to_string(),
        };

        assert!(matches!(
            strategy.install("a.art").await,
            Err(Error::Install { .. })
        ));
        assert!(matches!(
            strategy.stop(&handle).await,
            Err(Error::Lifecycle { .. })
        ));
        assert!(matches!(
            strategy.find("http", Some("(bad")).await,
            Err(Error::InvalidFilter(_))
        ));
    }

    #[smol_potat::test]
    async fn test_find_services_decodes_records() {
        let client = MockClient::new(vec![Ok(serde_json::json!([
            { "name": "http", "properties": { "port": "8080" } }
        ]))]);
        let strategy = ManagedStrategy::new(client);

        let found = strategy.find("http", None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "http");
        assert_eq!(found[0].properties.get("port").unwrap(), "8080");
    }
}
