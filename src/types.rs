//! Core types for dockerfile-audit.
//!
//! - `RuleKind` - Policy rule identifiers (e.g., `FORBID_ROOT`)
//! - `Finding` - A single policy violation
//! - `Outcome` - Pass/fail verdict for one file
//! - `AuditResult` - Everything reported about one audited Dockerfile

use serde::Serialize;
use std::fmt;

/// The kinds of policy rules the engine knows about.
///
/// Declaration order is the order rules are built from a policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    /// Only pull base images from approved registries.
    EnforceRegistry,
    /// Disallow floating tags such as `latest`.
    ForbidTags,
    /// Disallow registries reached over plain HTTP.
    ForbidInsecureRegistries,
    /// The image must not run as root.
    ForbidRoot,
    /// Disallow exposing ports below 1025.
    ForbidPrivilegedPorts,
    /// Disallow installing specific packages.
    ForbidPackages,
    /// Disallow copying secret-looking files into the image.
    ForbidSecrets,
}

impl RuleKind {
    /// All rule kinds, in declaration order.
    pub const ALL: [RuleKind; 7] = [
        Self::EnforceRegistry,
        Self::ForbidTags,
        Self::ForbidInsecureRegistries,
        Self::ForbidRoot,
        Self::ForbidPrivilegedPorts,
        Self::ForbidPackages,
        Self::ForbidSecrets,
    ];

    /// Get the string representation used in machine-readable output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnforceRegistry => "ENFORCE_REGISTRY",
            Self::ForbidTags => "FORBID_TAGS",
            Self::ForbidInsecureRegistries => "FORBID_INSECURE_REGISTRIES",
            Self::ForbidRoot => "FORBID_ROOT",
            Self::ForbidPrivilegedPorts => "FORBID_PRIVILEGED_PORTS",
            Self::ForbidPackages => "FORBID_PACKAGES",
            Self::ForbidSecrets => "FORBID_SECRETS",
        }
    }

    /// Parse a rule kind from its machine-readable name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A policy violation found while evaluating a Dockerfile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// The rule that produced this finding.
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// What is wrong.
    pub details: String,
    /// How to fix it.
    pub mitigation: String,
    /// The offending source statement, when the finding can be pinned to one.
    pub statement: Option<String>,
}

impl Finding {
    /// Create a finding that is not tied to a specific statement.
    pub fn new(kind: RuleKind, details: impl Into<String>, mitigation: impl Into<String>) -> Self {
        Self {
            kind,
            details: details.into(),
            mitigation: mitigation.into(),
            statement: None,
        }
    }

    /// Attach the offending statement.
    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = Some(statement.into());
        self
    }
}

/// Verdict of a single audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[default]
    Pass,
    Fail,
}

impl Outcome {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The result of auditing one Dockerfile against a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditResult {
    /// File name (without directories) of the audited Dockerfile.
    pub filename: String,
    /// Maintainers declared in the file, if any.
    pub maintainers: Option<String>,
    /// `Fail` iff `findings` is non-empty.
    pub outcome: Outcome,
    /// All findings, in rule order.
    pub findings: Vec<Finding>,
}

impl AuditResult {
    /// Build a result; the outcome is derived from the findings.
    pub fn new(
        filename: impl Into<String>,
        maintainers: Option<String>,
        findings: Vec<Finding>,
    ) -> Self {
        let outcome = if findings.is_empty() {
            Outcome::Pass
        } else {
            Outcome::Fail
        };
        Self {
            filename: filename.into(),
            maintainers,
            outcome,
            findings,
        }
    }

    /// Check if the audit passed.
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    /// Count findings produced by a given rule.
    pub fn count_of(&self, kind: RuleKind) -> usize {
        self.findings.iter().filter(|f| f.kind == kind).count()
    }
}
