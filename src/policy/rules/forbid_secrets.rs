//! FORBID_SECRETS: ADD/COPY sources must not look like secrets.
//!
//! A source is forbidden when it matches one of the secret patterns and
//! none of the allowed patterns. Patterns are unanchored regular expressions.

use regex::Regex;

use super::Rule;
use crate::dockerfile::DirectiveView;
use crate::error::PolicyError;
use crate::types::{Finding, RuleKind};

#[derive(Debug, Clone)]
pub struct ForbidSecrets {
    patterns: Vec<Regex>,
    allowed: Vec<Regex>,
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, PolicyError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|source| PolicyError::InvalidPattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}

fn join(patterns: &[Regex]) -> String {
    patterns.iter().map(Regex::as_str).collect::<Vec<_>>().join(", ")
}

impl ForbidSecrets {
    pub fn new(patterns: &[String], allowed: &[String]) -> Result<Self, PolicyError> {
        Ok(Self {
            patterns: compile(patterns)?,
            allowed: compile(allowed)?,
        })
    }

    /// The first secret pattern matching `source`, unless an allowed pattern matches.
    fn forbidden_pattern(&self, source: &str) -> Option<&Regex> {
        let pattern = self.patterns.iter().find(|re| re.is_match(source))?;
        if self.allowed.iter().any(|re| re.is_match(source)) {
            return None;
        }
        Some(pattern)
    }
}

impl Rule for ForbidSecrets {
    fn kind(&self) -> RuleKind {
        RuleKind::ForbidSecrets
    }

    fn description(&self) -> &'static str {
        "Forbid the inclusion of secrets in the image."
    }

    fn details(&self) -> String {
        format!(
            "The following patterns are forbidden: {}.\nThe following patterns are whitelisted: {}.",
            join(&self.patterns),
            join(&self.allowed)
        )
    }

    fn test(&self, view: &DirectiveView<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for transfer in view.transfers() {
            for source in &transfer.item.sources {
                if let Some(pattern) = self.forbidden_pattern(source) {
                    findings.push(
                        Finding::new(
                            self.kind(),
                            format!(
                                "Forbidden file matching pattern \"{}\" is added into the image.",
                                pattern.as_str()
                            ),
                            "The ADD/COPY statement should be changed or removed. Secrets should be provisioned using a safer and stateless way (Vault, Kubernetes secrets) instead.",
                        )
                        .with_statement(transfer.raw_text()),
                    );
                }
            }
        }

        findings
    }
}
