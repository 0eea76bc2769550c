//! Capability-driven orchestration engine
//!
//! Composes a [`ServiceQuery`], an [`ArtifactStrategy`] and an
//! [`ArtifactRegistry`] to bring a substrate from empty to one providing
//! the services of the requested capabilities, installing the minimum
//! necessary artifacts and tearing them down in deterministic LIFO order.

use crate::{
    Error,
    capability::Capability,
    query::ServiceQuery,
    registry::ArtifactRegistry,
    strategy::{ArtifactHandle, ArtifactStrategy, LocalStrategy},
};
use artifact_substrate::EmbeddedSubstrate;
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A teardown failure that was logged and suppressed
///
/// Teardown favors maximal cleanup progress over surfacing every failure,
/// so stop/uninstall errors are collected here instead of propagating.
#[derive(Debug)]
pub struct TeardownFailure {
    /// Location of the artifact the operation failed on
    pub location: String,

    /// Failing operation ("stop" or "uninstall")
    pub operation: &'static str,

    /// Error message
    pub message: String,
}

/// Accumulated outcome of a teardown pass
#[derive(Debug, Default)]
pub struct TeardownReport {
    failures: Vec<TeardownFailure>,
}

impl TeardownReport {
    /// Whether every teardown operation succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Suppressed failures in the order they occurred
    pub fn failures(&self) -> &[TeardownFailure] {
        &self.failures
    }

    fn record(&mut self, handle: &ArtifactHandle, operation: &'static str, error: &Error) {
        warn!(
            "Failed to {} artifact from '{}' during teardown: {}",
            operation, handle.location, error
        );
        self.failures.push(TeardownFailure {
            location: handle.location.clone(),
            operation,
            message: error.to_string(),
        });
    }
}

/// The capability orchestrator
///
/// Single-caller, sequential: methods take `&mut self` and the
/// orchestrator holds no internal locking. The strategy and query are
/// injected; the orchestrator never branches on which implementation is
/// active.
pub struct Orchestrator {
    strategy: Arc<dyn ArtifactStrategy>,
    query: Arc<dyn ServiceQuery>,
    registry: ArtifactRegistry,
    /// Capabilities this orchestrator newly installed, in order added.
    /// Capabilities skipped as already satisfied are never recorded and
    /// therefore never torn down: the orchestrator never undoes something
    /// it did not do.
    added: Vec<Arc<Capability>>,
    /// Handles installed on behalf of each capability, in install order
    installed: HashMap<String, Vec<ArtifactHandle>>,
}

impl Orchestrator {
    /// Create an orchestrator over an injected strategy and service query
    pub fn new(strategy: Arc<dyn ArtifactStrategy>, query: Arc<dyn ServiceQuery>) -> Self {
        Self {
            strategy,
            query,
            registry: ArtifactRegistry::new(),
            added: Vec::new(),
            installed: HashMap::new(),
        }
    }

    /// Create an orchestrator executing in-process against an embedded
    /// substrate
    pub fn local(substrate: Arc<EmbeddedSubstrate>) -> Self {
        let strategy = Arc::new(LocalStrategy::new(substrate));
        Self::new(strategy.clone(), strategy)
    }

    /// Install a capability and, transitively, its dependencies
    ///
    /// Dependencies install first, in declared order. A capability whose
    /// provided service already exists is skipped (its dependencies are
    /// not retroactively removed). Artifacts already registered by
    /// location or identity are skipped individually. Install/start
    /// failures propagate immediately; already-started siblings are not
    /// rolled back — callers needing transactional semantics call
    /// [`shutdown`](Self::shutdown) on failure.
    pub async fn add_capability(&mut self, capability: &Arc<Capability>) -> Result<(), Error> {
        let mut path = Vec::new();
        let mut completed = HashSet::new();
        self.add_inner(capability, &mut path, &mut completed).await
    }

    fn add_inner<'a>(
        &'a mut self,
        capability: &'a Arc<Capability>,
        path: &'a mut Vec<String>,
        completed: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let name = capability.name().to_string();

            // A capability finished earlier in this call (diamond graph)
            // is skipped; one still on the current path is a cycle.
            if completed.contains(&name) {
                return Ok(());
            }
            if path.contains(&name) {
                return Err(Error::CyclicDependency(name));
            }
            path.push(name.clone());

            for dependency in capability.dependencies() {
                self.add_inner(dependency, path, completed).await?;
            }

            if let Some(provided) = capability.provided_service() {
                let existing = self
                    .query
                    .find(&provided.name, provided.filter.as_deref())
                    .await?;
                if !existing.is_empty() {
                    info!(
                        "Capability '{}' already satisfied by {} existing '{}' service(s)",
                        name,
                        existing.len(),
                        provided.name
                    );
                    path.pop();
                    completed.insert(name);
                    return Ok(());
                }
            }

            for location in capability.artifact_locations() {
                let identity = self.strategy.identity(location).await?;

                if self.registry.contains_location(location) {
                    debug!("Artifact from '{}' already registered, skipping", location);
                    continue;
                }
                if let Some(existing) = self.registry.find_by_identity(&identity) {
                    debug!(
                        "Artifact {} already registered from '{}', skipping '{}'",
                        identity, existing.location, location
                    );
                    continue;
                }

                info!("Installing artifact {} from '{}'", identity, location);
                let handle = self.strategy.install(location).await?;
                self.strategy.start(&handle).await?;

                self.registry.insert(handle.clone());
                self.installed
                    .entry(name.clone())
                    .or_default()
                    .push(handle);
            }

            if !self.added.iter().any(|c| c.name() == name) {
                self.added.push(capability.clone());
            }

            path.pop();
            completed.insert(name);
            Ok(())
        })
    }

    /// Remove a capability installed by this orchestrator
    ///
    /// Mirrors [`add_capability`](Self::add_capability) exactly in
    /// reverse: the capability's own artifacts are stopped and
    /// uninstalled in reverse install order, then its dependencies are
    /// removed in reverse declared order, so a dependency is never
    /// removed while the capability that required it still exists. Every
    /// stop/uninstall failure is logged and collected into the returned
    /// report; teardown never aborts early.
    pub async fn remove_capability(&mut self, capability: &Capability) -> TeardownReport {
        let mut report = TeardownReport::default();
        self.remove_inner(capability, &mut report).await;
        report
    }

    fn remove_inner<'a>(
        &'a mut self,
        capability: &'a Capability,
        report: &'a mut TeardownReport,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if let Some(pos) = self.added.iter().position(|c| c.name() == capability.name()) {
                self.added.remove(pos);
                let handles = self.installed.remove(capability.name()).unwrap_or_default();
                info!(
                    "Removing capability '{}' ({} artifacts)",
                    capability.name(),
                    handles.len()
                );
                for handle in handles.iter().rev() {
                    self.teardown_artifact(handle, report).await;
                }
            }

            for dependency in capability.dependencies().iter().rev() {
                self.remove_inner(dependency, report).await;
            }
        })
    }

    /// Failsafe stop-then-uninstall; the registry entry goes away
    /// regardless of the outcome
    async fn teardown_artifact(&mut self, handle: &ArtifactHandle, report: &mut TeardownReport) {
        if let Err(e) = self.strategy.stop(handle).await {
            report.record(handle, "stop", &e);
        }
        if let Err(e) = self.strategy.uninstall(handle).await {
            report.record(handle, "uninstall", &e);
        }
        self.registry.remove(&handle.location);
    }

    /// Tear down everything this orchestrator installed
    ///
    /// Uninstalls every registered artifact in reverse insertion order —
    /// strategy-global and independent of which capability contributed
    /// the artifact, so shared artifacts are torn down exactly once,
    /// last-installed-first — then clears the capability bookkeeping.
    /// Idempotent: a second call is a no-op with an empty report.
    pub async fn shutdown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();

        let handles = self.registry.drain_reverse();
        if !handles.is_empty() {
            info!("Shutting down: tearing down {} artifacts", handles.len());
        }
        for handle in &handles {
            if let Err(e) = self.strategy.stop(handle).await {
                report.record(handle, "stop", &e);
            }
            if let Err(e) = self.strategy.uninstall(handle).await {
                report.record(handle, "uninstall", &e);
            }
        }

        // The artifacts are already gone; re-running per-capability
        // teardown would only attempt stop/uninstall on dead handles.
        self.installed.clear();
        self.added.clear();
        report
    }

    /// Registered artifact handles in installation order
    pub fn installed_artifacts(&self) -> Vec<ArtifactHandle> {
        self.registry.handles()
    }

    /// Whether a matching service already exists in the environment
    pub async fn is_service_satisfied(
        &self,
        service_name: &str,
        filter: Option<&str>,
    ) -> Result<bool, Error> {
        Ok(!self.query.find(service_name, filter).await?.is_empty())
    }

    /// Names of capabilities this orchestrator installed, in order added
    pub fn added_capabilities(&self) -> Vec<&str> {
        self.added.iter().map(|c| c.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifact_substrate::{ArtifactIdentity, ArtifactState, ServiceRecord};
    use async_trait::async_trait;
    use uuid::Uuid;

    /// Strategy whose artifacts always install and never conflict
    struct NullStrategy;

    #[async_trait]
    impl ArtifactStrategy for NullStrategy {
        async fn install(&self, location: &str) -> Result<ArtifactHandle, Error> {
            Ok(ArtifactHandle {
                id: Uuid::new_v4(),
                identity: ArtifactIdentity::new(location, "1.0.0"),
                location: location.to_string(),
            })
        }
        async fn start(&self, _: &ArtifactHandle) -> Result<(), Error> {
            Ok(())
        }
        async fn stop(&self, _: &ArtifactHandle) -> Result<(), Error> {
            Ok(())
        }
        async fn uninstall(&self, _: &ArtifactHandle) -> Result<(), Error> {
            Ok(())
        }
        async fn identity(&self, location: &str) -> Result<ArtifactIdentity, Error> {
            Ok(ArtifactIdentity::new(location, "1.0.0"))
        }
        async fn state(&self, _: &ArtifactHandle) -> Result<ArtifactState, Error> {
            Ok(ArtifactState::Active)
        }
    }

    #[async_trait]
    impl ServiceQuery for NullStrategy {
        async fn find(
            &self,
            _: &str,
            _: Option<&str>,
        ) -> Result<Vec<ServiceRecord>, Error> {
            Ok(Vec::new())
        }
    }

    fn orchestrator() -> Orchestrator {
        let strategy = Arc::new(NullStrategy);
        Orchestrator::new(strategy.clone(), strategy)
    }

    #[smol_potat::test]
    async fn test_cyclic_dependency_detected() {
        // The builder cannot close a cycle with Arcs, so fake one with
        // two capabilities that share a name with an ancestor.
        let inner = Arc::new(
            Capability::new("a").with_dependency(Arc::new(Capability::new("b").with_dependency(
                Arc::new(Capability::new("a").with_artifact("a.art")),
            ))),
        );

        let mut orchestrator = orchestrator();
        let result = orchestrator.add_capability(&inner).await;
        assert!(matches!(result, Err(Error::CyclicDependency(name)) if name == "a"));
    }

    #[smol_potat::test]
    async fn test_diamond_graph_is_not_a_cycle() {
        let base = Arc::new(Capability::new("base").with_artifact("base.art"));
        let left = Arc::new(Capability::new("left").with_dependency(base.clone()));
        let right = Arc::new(Capability::new("right").with_dependency(base.clone()));
        let top = Arc::new(
            Capability::new("top")
                .with_dependency(left)
                .with_dependency(right)
                .with_artifact("top.art"),
        );

        let mut orchestrator = orchestrator();
        orchestrator.add_capability(&top).await.unwrap();
        assert_eq!(
            orchestrator.added_capabilities(),
            ["base", "left", "right", "top"]
        );
    }

    #[smol_potat::test]
    async fn test_capability_recorded_once() {
        let cap = Arc::new(Capability::new("plain").with_artifact("plain.art"));

        let mut orchestrator = orchestrator();
        orchestrator.add_capability(&cap).await.unwrap();
        orchestrator.add_capability(&cap).await.unwrap();
        assert_eq!(orchestrator.added_capabilities(), ["plain"]);
        assert_eq!(orchestrator.installed_artifacts().len(), 1);
    }
}
