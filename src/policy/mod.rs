//! Policy engine.
//!
//! A `Policy` is the ordered set of enabled rules built from a policy
//! document. It is immutable once built and shared by every audited file.

pub mod config;
pub mod rules;

use log::{debug, error, warn};
use serde::Serialize;
use std::path::Path;

pub use config::{find_policy_file, PolicyConfig, PolicyDocument, DEFAULT_POLICY_FILE};
pub use rules::Rule;

use crate::dockerfile::Dockerfile;
use crate::error::PolicyError;
use crate::types::{AuditResult, RuleKind};
use rules::{
    EnforceRegistry, ForbidInsecureRegistries, ForbidPackages, ForbidPrivilegedPorts, ForbidRoot,
    ForbidSecrets, ForbidTags,
};

/// One enabled rule, as shown in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub description: String,
    pub details: String,
}

/// The set of enabled rules.
#[derive(Debug, Default)]
pub struct Policy {
    rules: Vec<Box<dyn Rule>>,
}

/// Log and discard an enabled rule whose required list is missing.
fn required<'a>(key: &str, field: &str, value: &'a Option<Vec<String>>) -> Option<&'a [String]> {
    let list = value.as_deref();
    if list.is_none() {
        warn!("{} is enabled but no {} are defined, skipping.", key, field);
    }
    list
}

impl Policy {
    /// Build a policy from an explicit rule list.
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Build the enabled rules from a parsed configuration.
    pub fn from_config(config: &PolicyConfig) -> Result<Self, PolicyError> {
        let mut rules: Vec<Box<dyn Rule>> = Vec::new();

        match &config.enforce_authorized_registries {
            Some(c) if c.enabled => {
                if let Some(registries) =
                    required("enforce_authorized_registries", "registries", &c.registries)
                {
                    rules.push(Box::new(EnforceRegistry::new(registries.to_vec())));
                }
            }
            Some(_) => {}
            None => debug!("No enforce_authorized_registries found in policy, skipping."),
        }

        match &config.forbid_floating_tags {
            Some(c) if c.enabled => {
                if let Some(tags) = required("forbid_floating_tags", "forbidden_tags", &c.forbidden_tags) {
                    rules.push(Box::new(ForbidTags::new(tags.to_vec())));
                }
            }
            Some(_) => {}
            None => debug!("No forbid_floating_tags found in policy, skipping."),
        }

        match &config.forbid_insecure_registries {
            Some(c) if c.enabled => rules.push(Box::new(ForbidInsecureRegistries)),
            Some(_) => {}
            None => debug!("No forbid_insecure_registries found in policy, skipping."),
        }

        match &config.forbid_root {
            Some(c) if c.enabled => rules.push(Box::new(ForbidRoot)),
            Some(_) => {}
            None => debug!("No forbid_root found in policy, skipping."),
        }

        match &config.forbid_privileged_ports {
            Some(c) if c.enabled => rules.push(Box::new(ForbidPrivilegedPorts)),
            Some(_) => {}
            None => debug!("No forbid_privileged_ports found in policy, skipping."),
        }

        match &config.forbid_packages {
            Some(c) if c.enabled => {
                if let Some(packages) =
                    required("forbid_packages", "forbidden_packages", &c.forbidden_packages)
                {
                    rules.push(Box::new(ForbidPackages::new(packages.to_vec())?));
                }
            }
            Some(_) => {}
            None => debug!("No forbid_packages found in policy, skipping."),
        }

        match &config.forbid_secrets {
            Some(c) if c.enabled => match &c.secrets_patterns {
                None => error!("forbid_secrets rule added but no secrets_patterns defined."),
                Some(patterns) if patterns.is_empty() => {
                    warn!("secrets_patterns defined but with an empty list. Skipping.")
                }
                Some(patterns) => {
                    rules.push(Box::new(ForbidSecrets::new(patterns, &c.allowed_patterns)?))
                }
            },
            Some(_) => {}
            None => debug!("No forbid_secrets found in policy, skipping."),
        }

        debug!(
            "Enabled policy rules: {:?}",
            rules.iter().map(|r| r.kind().as_str()).collect::<Vec<_>>()
        );
        Ok(Self { rules })
    }

    /// Load a policy from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let document = PolicyDocument::from_yaml_file(path.as_ref())?;
        Self::from_config(&document.policy)
    }

    /// Load a policy from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PolicyError> {
        let document = PolicyDocument::from_yaml_str(yaml)?;
        Self::from_config(&document.policy)
    }

    /// Load the first policy file found in the standard locations.
    pub fn find_and_load() -> Result<Self, PolicyError> {
        match find_policy_file() {
            Some(path) => {
                debug!("Using policy file {}", path.display());
                Self::from_yaml_file(path)
            }
            None => Err(PolicyError::NotFound {
                path: DEFAULT_POLICY_FILE.into(),
            }),
        }
    }

    /// Run every enabled rule, in order, against a Dockerfile.
    pub fn evaluate(&self, dockerfile: &Dockerfile) -> AuditResult {
        let view = dockerfile.view();
        let findings = self.rules.iter().flat_map(|rule| rule.test(&view)).collect();
        AuditResult::new(dockerfile.filename(), dockerfile.maintainers(), findings)
    }

    /// Describe the enabled rules.
    pub fn summary(&self) -> Vec<RuleSummary> {
        self.rules
            .iter()
            .map(|rule| RuleSummary {
                kind: rule.kind(),
                description: rule.description().to_string(),
                details: rule.details(),
            })
            .collect()
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    const FULL_POLICY: &str = r#"
policy:
  forbid_secrets:
    enabled: true
    secrets_patterns: ['id_rsa', '\.pem$']
    allowed_patterns: ['id_rsa\.pub$']
  forbid_root:
    enabled: true
  enforce_authorized_registries:
    enabled: true
    registries: ["Docker Hub"]
  forbid_floating_tags:
    enabled: true
    forbidden_tags: ["latest"]
  forbid_insecure_registries:
    enabled: true
  forbid_privileged_ports:
    enabled: true
  forbid_packages:
    enabled: true
    forbidden_packages: ["curl"]
"#;

    #[test]
    fn test_rules_built_in_fixed_order() {
        let policy = Policy::from_yaml_str(FULL_POLICY).unwrap();
        let kinds: Vec<RuleKind> = policy.rules().iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, RuleKind::ALL.to_vec());
    }

    #[test]
    fn test_disabled_and_absent_rules_skipped() {
        let policy = Policy::from_yaml_str(
            "policy:\n  forbid_root:\n    enabled: false\n  forbid_privileged_ports:\n    enabled: true\n  something_else:\n    enabled: true\n",
        )
        .unwrap();
        assert_eq!(policy.rules().len(), 1);
        assert_eq!(policy.rules()[0].kind(), RuleKind::ForbidPrivilegedPorts);
    }

    #[test]
    fn test_empty_secret_patterns_is_noop() {
        let policy = Policy::from_yaml_str(
            "policy:\n  forbid_secrets:\n    enabled: true\n    secrets_patterns: []\n",
        )
        .unwrap();
        assert!(policy.is_empty());
    }

    #[test]
    fn test_missing_required_list_skips_rule() {
        let policy =
            Policy::from_yaml_str("policy:\n  forbid_packages:\n    enabled: true\n  forbid_secrets:\n    enabled: true\n")
                .unwrap();
        assert!(policy.is_empty());
    }

    #[test]
    fn test_invalid_secret_pattern_is_fatal() {
        let err = Policy::from_yaml_str(
            "policy:\n  forbid_secrets:\n    enabled: true\n    secrets_patterns: ['[']\n",
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPattern { .. }));
    }

    #[test]
    fn test_evaluate_concatenates_in_rule_order() {
        let policy = Policy::from_yaml_str(FULL_POLICY).unwrap();
        let df = Dockerfile::parse_str(
            "FROM quay.io/org/app\nMAINTAINER alice\nEXPOSE 80\nCOPY id_rsa /root/.ssh/\n",
        )
        .unwrap();
        let result = policy.evaluate(&df);

        assert_eq!(result.outcome, Outcome::Fail);
        assert_eq!(result.maintainers.as_deref(), Some("alice"));
        let kinds: Vec<RuleKind> = result.findings.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RuleKind::EnforceRegistry,
                RuleKind::ForbidTags,
                RuleKind::ForbidRoot,
                RuleKind::ForbidPrivilegedPorts,
                RuleKind::ForbidSecrets,
            ]
        );
    }

    #[test]
    fn test_evaluate_pass() {
        let policy = Policy::from_yaml_str(FULL_POLICY).unwrap();
        let df = Dockerfile::parse_str("FROM python:3.9\nRUN pip install flask\nUSER app\nEXPOSE 8080").unwrap();
        let result = policy.evaluate(&df);
        assert_eq!(result.outcome, Outcome::Pass, "{:?}", result.findings);
        assert_eq!(result.filename, "Dockerfile");
    }

    #[test]
    fn test_summary() {
        let policy = Policy::from_yaml_str(
            "policy:\n  forbid_floating_tags:\n    enabled: true\n    forbidden_tags: [latest, stable]\n  forbid_root:\n    enabled: true\n",
        )
        .unwrap();
        let summary = policy.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].kind, RuleKind::ForbidTags);
        assert_eq!(summary[0].details, "The following tags are forbidden: latest, stable.");
        assert_eq!(summary[1].details, "");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json[1]["type"], "FORBID_ROOT");
    }
}
