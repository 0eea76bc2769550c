//! # Capability Configuration
//!
//! YAML configuration parser for the capability harness.
//!
//! This crate parses `capabilities.yaml` files describing which substrate
//! to orchestrate against and the capability graph to install, and
//! converts them into the orchestrator's [`Capability`] descriptors.
//!
//! [`Capability`]: capability_orchestration::Capability

#![warn(missing_docs)]

use capability_orchestration::ManagementEndpoint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub mod parser;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Environment variable not found
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// A capability references an undeclared dependency
    #[error("Capability '{capability}' depends on unknown capability '{dependency}'")]
    UnknownDependency {
        /// Referencing capability
        capability: String,
        /// Missing dependency name
        dependency: String,
    },

    /// The declared capability graph contains a cycle
    #[error("Cyclic capability dependency involving '{0}'")]
    CyclicDependency(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Optional deployment name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Which substrate to orchestrate against
    #[serde(default)]
    pub substrate: SubstrateConfig,

    /// Declared capabilities by name
    pub capabilities: HashMap<String, CapabilitySpec>,
}

/// Substrate selection
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SubstrateConfig {
    /// Embedded in-process substrate
    #[default]
    Embedded,
    /// Remote substrate behind a management endpoint
    Managed {
        /// Hostname or IP of the managed substrate
        host: String,
        /// Management port
        port: u16,
    },
}

impl SubstrateConfig {
    /// Management endpoint for the managed mode, if configured
    pub fn endpoint(&self) -> Option<ManagementEndpoint> {
        match self {
            SubstrateConfig::Embedded => None,
            SubstrateConfig::Managed { host, port } => Some(ManagementEndpoint {
                host: host.clone(),
                port: *port,
            }),
        }
    }
}

/// One declared capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySpec {
    /// Service the capability provides once installed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provides: Option<ProvidesSpec>,

    /// Names of capabilities that must install first, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    /// Artifact locations, in install order; `${VAR}` and
    /// `${VAR:-default}` references are substituted from the environment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<String>,
}

/// Provided-service declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidesSpec {
    /// Service type name
    pub service: String,

    /// Optional filter over service properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}
