//! # Artifact Substrate
//!
//! Embedded in-process substrate for the capability harness.
//!
//! A substrate physically hosts installed artifacts and the services they
//! publish. This crate provides the embedded variant: an in-process
//! container that installs artifacts from JSON manifest locations, drives
//! their lifecycle, and answers service lookups by type and LDAP-style
//! filter expression. It also defines the [`DescriptorReader`] seam the
//! orchestration layer uses to resolve artifact identities without
//! installing anything.
//!
//! ## Example
//!
//! ```no_run
//! use artifact_substrate::EmbeddedSubstrate;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let substrate = EmbeddedSubstrate::new();
//!
//! let record = substrate.install("/artifacts/http.art").await?;
//! substrate.start(record.id).await?;
//!
//! let services = substrate.find_services("http", Some("(port=8080)")).await?;
//! assert!(!services.is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]

mod container;
mod descriptor;
mod error;
mod filter;
mod models;

pub use container::EmbeddedSubstrate;
pub use descriptor::{DescriptorReader, JsonDescriptorReader, load_manifest};
pub use error::{Error, Result};
pub use filter::Filter;
pub use models::{
    ArtifactIdentity, ArtifactManifest, ArtifactRecord, ArtifactState, ServiceRecord,
};
