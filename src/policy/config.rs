//! Policy document loading.
//!
//! A policy is a YAML document with a top-level `policy` mapping. Each
//! recognised key enables one rule:
//!
//! ```yaml
//! policy:
//!   enforce_authorized_registries:
//!     enabled: true
//!     registries: ["Docker Hub", "gcr.io"]
//!   forbid_floating_tags:
//!     enabled: true
//!     forbidden_tags: ["latest"]
//!   forbid_root:
//!     enabled: true
//! ```
//!
//! Unknown keys are ignored; a key without `enabled: true` is disabled.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::PolicyError;

/// Default policy file name, looked up in the working directory.
pub const DEFAULT_POLICY_FILE: &str = "policy.yaml";

/// A parsed policy file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyDocument {
    pub policy: PolicyConfig,
}

impl PolicyDocument {
    /// Load a policy document from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, PolicyError> {
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => PolicyError::NotFound {
                path: path.to_path_buf(),
            },
            _ => PolicyError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load a policy document from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PolicyError> {
        serde_yaml::from_str(yaml).map_err(|e| PolicyError::InvalidConfig(e.to_string()))
    }
}

/// One optional entry per rule kind, in evaluation order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub enforce_authorized_registries: Option<RegistriesConfig>,
    pub forbid_floating_tags: Option<TagsConfig>,
    pub forbid_insecure_registries: Option<ToggleConfig>,
    pub forbid_root: Option<ToggleConfig>,
    pub forbid_privileged_ports: Option<ToggleConfig>,
    pub forbid_packages: Option<PackagesConfig>,
    pub forbid_secrets: Option<SecretsConfig>,
}

/// A rule with no parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToggleConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistriesConfig {
    #[serde(default)]
    pub enabled: bool,
    pub registries: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagsConfig {
    #[serde(default)]
    pub enabled: bool,
    pub forbidden_tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackagesConfig {
    #[serde(default)]
    pub enabled: bool,
    pub forbidden_packages: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretsConfig {
    #[serde(default)]
    pub enabled: bool,
    pub secrets_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_patterns: Vec<String>,
}

/// Find a policy file in the standard locations.
///
/// Search order:
/// 1. policy.yaml in current directory
/// 2. .dockerfile-audit.yaml in current directory
/// 3. dockerfile-audit/policy.yaml in the user config directory
pub fn find_policy_file() -> Option<PathBuf> {
    let search_paths = [DEFAULT_POLICY_FILE, ".dockerfile-audit.yaml"];

    for path in &search_paths {
        let path = Path::new(path);
        if path.is_file() {
            return Some(path.to_path_buf());
        }
    }

    // Try user config directory
    let config_path = dirs::config_dir()?.join("dockerfile-audit").join("policy.yaml");
    config_path.is_file().then_some(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
policy:
  enforce_authorized_registries:
    enabled: true
    registries:
      - Docker Hub
      - gcr.io
  forbid_root:
    enabled: false
  forbid_secrets:
    enabled: true
    secrets_patterns: ["id_rsa"]
  something_else:
    enabled: true
"#;
        let doc = PolicyDocument::from_yaml_str(yaml).unwrap();
        let registries = doc.policy.enforce_authorized_registries.unwrap();
        assert!(registries.enabled);
        assert_eq!(registries.registries.unwrap(), ["Docker Hub", "gcr.io"]);
        assert!(!doc.policy.forbid_root.unwrap().enabled);
        let secrets = doc.policy.forbid_secrets.unwrap();
        assert!(secrets.allowed_patterns.is_empty());
        assert!(doc.policy.forbid_packages.is_none());
    }

    #[test]
    fn test_missing_enabled_means_disabled() {
        let doc = PolicyDocument::from_yaml_str("policy:\n  forbid_root: {}\n").unwrap();
        assert!(!doc.policy.forbid_root.unwrap().enabled);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            PolicyDocument::from_yaml_str("not: [valid"),
            Err(PolicyError::InvalidConfig(_))
        ));
        assert!(matches!(
            PolicyDocument::from_yaml_str("rules: {}\n"),
            Err(PolicyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = PolicyDocument::from_yaml_file(Path::new("/no/such/policy.yaml")).unwrap_err();
        assert!(matches!(err, PolicyError::NotFound { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "policy:\n  forbid_root:\n    enabled: true").unwrap();
        let doc = PolicyDocument::from_yaml_file(file.path()).unwrap();
        assert!(doc.policy.forbid_root.unwrap().enabled);
    }
}
