//! Service lookup contract
//!
//! The orchestrator probes the target environment for existing services
//! before installing a capability; a non-empty result means the
//! capability is already satisfied.

use crate::Error;
use artifact_substrate::ServiceRecord;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

/// Interval between polls in [`ServiceQuery::find_within`]
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Queries existing service handles from the target environment
///
/// Lookups have no side effects. Malformed filter expressions fail
/// immediately with [`Error::InvalidFilter`] and are never retried.
#[async_trait]
pub trait ServiceQuery: Send + Sync {
    /// Find services by type name and optional filter expression
    async fn find(
        &self,
        service_name: &str,
        filter: Option<&str>,
    ) -> std::result::Result<Vec<ServiceRecord>, Error>;

    /// Poll [`find`](Self::find) until a non-empty result or the timeout
    /// elapses, returning whatever was last observed (possibly empty)
    ///
    /// Polls every [`POLL_INTERVAL`]; the wait is bounded by `timeout`
    /// and never blocks indefinitely.
    async fn find_within(
        &self,
        service_name: &str,
        filter: Option<&str>,
        timeout: Duration,
    ) -> std::result::Result<Vec<ServiceRecord>, Error> {
        let deadline = Instant::now() + timeout;
        loop {
            let found = self.find(service_name, filter).await?;
            if !found.is_empty() || Instant::now() >= deadline {
                return Ok(found);
            }
            debug!(
                "No '{}' service yet, polling again in {:?}",
                service_name, POLL_INTERVAL
            );
            smol::Timer::after(POLL_INTERVAL).await;
        }
    }
}
