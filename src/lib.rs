//! # dockerfile-audit
//!
//! Parses Dockerfiles into a typed directive model and evaluates them
//! against a declarative security policy, without building any image.
//!
//! ## Features
//!
//! - **Parsing**: Continuations, comments and ENV substitution are normalised, then a
//!   nom grammar turns each logical line into a typed `Directive`
//! - **Multi-stage aware**: Stage aliases and the last build stage are tracked
//! - **Policy rules**: Registries, floating tags, insecure registries, root user,
//!   privileged ports, forbidden packages, secrets
//! - **Batch auditing**: A directory is audited in parallel, keeping input order
//! - **Output**: Terminal, JSON and LaTeX report sources
//!
//! ## Example
//!
//! ```rust,no_run
//! use dockerfile_audit::{Auditor, Policy};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = Policy::from_yaml_file("policy.yaml")?;
//! let auditor = Auditor::new(policy);
//! let result = auditor.audit_file("Dockerfile")?;
//! println!("{}: {}", result.filename, result.outcome);
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod cli;
pub mod dockerfile;
pub mod error;
pub mod formatter;
pub mod parser;
pub mod policy;
pub mod report;
pub mod shell;
pub mod types;

// Re-export commonly used types and functions
pub use audit::{Auditor, BatchReport, SkippedFile};
pub use dockerfile::{DirectiveView, Dockerfile};
pub use error::{AuditError, ParseError, PolicyError, ReportError, Result};
pub use parser::{normalize, parse_dockerfile, Directive, DirectiveKind, DirectivePos};
pub use policy::{Policy, Rule, RuleSummary};
pub use types::{AuditResult, Finding, Outcome, RuleKind};

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
