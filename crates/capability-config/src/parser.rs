//! Configuration parsing with environment variable substitution

use crate::{CapabilitySpec, Config, ConfigError, Result};
use capability_orchestration::Capability;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Parse a YAML configuration file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parse YAML configuration from a string
pub fn parse_str(content: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    // Check version
    if config.version != "1.0" {
        return Err(ConfigError::ValidationError(format!(
            "Unsupported version: {}, expected 1.0",
            config.version
        )));
    }

    // Check all dependency references exist
    for (name, spec) in &config.capabilities {
        for dep in &spec.dependencies {
            if !config.capabilities.contains_key(dep) {
                return Err(ConfigError::UnknownDependency {
                    capability: name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Substitute environment variables in a string
///
/// Supports `${VAR}` and `${VAR:-default}`.
pub fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = input.to_string();
    let mut errors = Vec::new();

    for cap in re.captures_iter(input) {
        let full_match = &cap[0];
        let var_expr = &cap[1];

        // Handle default values: ${VAR:-default}
        let (var_name, default_value) = if let Some(pos) = var_expr.find(":-") {
            (&var_expr[..pos], Some(&var_expr[pos + 2..]))
        } else {
            (var_expr, None)
        };

        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(full_match, &value);
            }
            Err(_) => {
                if let Some(default) = default_value {
                    result = result.replace(full_match, default);
                } else {
                    errors.push(var_name.to_string());
                }
            }
        }
    }

    if !errors.is_empty() {
        return Err(ConfigError::EnvVarNotFound(errors.join(", ")));
    }

    Ok(result)
}

/// Build the capability graph declared by the configuration
///
/// Dependencies are shared: a capability required by several others is
/// built once and referenced from each. Artifact locations have their
/// environment references substituted. A dependency cycle in the
/// declarations is rejected.
pub fn build_capabilities(config: &Config) -> Result<HashMap<String, Arc<Capability>>> {
    let mut built: HashMap<String, Arc<Capability>> = HashMap::new();

    for name in config.capabilities.keys() {
        let mut path = HashSet::new();
        build_one(name, &config.capabilities, &mut built, &mut path)?;
    }

    Ok(built)
}

fn build_one(
    name: &str,
    specs: &HashMap<String, CapabilitySpec>,
    built: &mut HashMap<String, Arc<Capability>>,
    path: &mut HashSet<String>,
) -> Result<Arc<Capability>> {
    if let Some(existing) = built.get(name) {
        return Ok(existing.clone());
    }
    if !path.insert(name.to_string()) {
        return Err(ConfigError::CyclicDependency(name.to_string()));
    }

    // Validated earlier, so the spec exists
    let spec = &specs[name];

    let mut capability = Capability::new(name);
    if let Some(provides) = &spec.provides {
        capability = capability.provides(&provides.service, provides.filter.as_deref());
    }
    for dep in &spec.dependencies {
        let dependency = build_one(dep, specs, built, path)?;
        capability = capability.with_dependency(dependency);
    }
    for artifact in &spec.artifacts {
        capability = capability.with_artifact(substitute_env_vars(artifact)?);
    }

    path.remove(name);
    let capability = Arc::new(capability);
    built.insert(name.to_string(), capability.clone());
    Ok(capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
version: "1.0"
name: web-stack
substrate:
  mode: embedded
capabilities:
  log:
    artifacts:
      - /artifacts/log.art
  http:
    provides:
      service: http
      filter: "(port=8080)"
    dependencies:
      - log
    artifacts:
      - /artifacts/http.art
"#;

    #[test]
    fn test_parse_example() {
        let config = parse_str(EXAMPLE).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.name.as_deref(), Some("web-stack"));
        assert_eq!(config.capabilities.len(), 2);
        assert!(config.substrate.endpoint().is_none());

        let http = &config.capabilities["http"];
        assert_eq!(http.provides.as_ref().unwrap().service, "http");
        assert_eq!(http.dependencies, ["log"]);
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capabilities.yaml");
        std::fs::write(&path, EXAMPLE).unwrap();

        let config = parse_file(&path).unwrap();
        assert_eq!(config.capabilities.len(), 2);
    }

    #[test]
    fn test_managed_substrate_endpoint() {
        let config = parse_str(
            r#"
version: "1.0"
substrate:
  mode: managed
  host: substrate.internal
  port: 9999
capabilities: {}
"#,
        )
        .unwrap();

        let endpoint = config.substrate.endpoint().unwrap();
        assert_eq!(endpoint.host, "substrate.internal");
        assert_eq!(endpoint.port, 9999);
    }

    #[test]
    fn test_unsupported_version() {
        let result = parse_str("version: \"2.0\"\ncapabilities: {}\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_unknown_dependency() {
        let result = parse_str(
            r#"
version: "1.0"
capabilities:
  http:
    dependencies: [log]
"#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::UnknownDependency { capability, dependency })
                if capability == "http" && dependency == "log"
        ));
    }

    #[test]
    fn test_build_capability_graph() {
        let config = parse_str(EXAMPLE).unwrap();
        let capabilities = build_capabilities(&config).unwrap();

        let http = &capabilities["http"];
        assert_eq!(http.name(), "http");
        assert_eq!(http.dependencies().len(), 1);
        assert_eq!(http.dependencies()[0].name(), "log");
        assert_eq!(http.artifact_locations(), ["/artifacts/http.art"]);

        // The shared dependency is the same descriptor
        assert!(Arc::ptr_eq(&http.dependencies()[0], &capabilities["log"]));
    }

    #[test]
    fn test_cyclic_declarations_rejected() {
        let config = parse_str(
            r#"
version: "1.0"
capabilities:
  a:
    dependencies: [b]
  b:
    dependencies: [a]
"#,
        )
        .unwrap();
        let result = build_capabilities(&config);
        assert!(matches!(result, Err(ConfigError::CyclicDependency(_))));
    }

    #[test]
    fn test_env_substitution() {
        // set_var is unsafe in edition 2024; the var is test-local
        unsafe {
            std::env::set_var("CAP_TEST_DIR", "/opt/artifacts");
        }
        assert_eq!(
            substitute_env_vars("${CAP_TEST_DIR}/log.art").unwrap(),
            "/opt/artifacts/log.art"
        );
        assert_eq!(
            substitute_env_vars("${CAP_TEST_MISSING:-/fallback}/log.art").unwrap(),
            "/fallback/log.art"
        );
        assert!(matches!(
            substitute_env_vars("${CAP_TEST_MISSING}/log.art"),
            Err(ConfigError::EnvVarNotFound(_))
        ));
    }

    #[test]
    fn test_substitution_applied_to_artifacts() {
        unsafe {
            std::env::set_var("CAP_TEST_ROOT", "/srv");
        }
        let config = parse_str(
            r#"
version: "1.0"
capabilities:
  log:
    artifacts:
      - ${CAP_TEST_ROOT}/log.art
"#,
        )
        .unwrap();
        let capabilities = build_capabilities(&config).unwrap();
        assert_eq!(capabilities["log"].artifact_locations(), ["/srv/log.art"]);
    }
}
