//! Error types for dockerfile-audit.
//!
//! Per-file errors (`ParseError`) are recoverable: a batch records them and
//! moves on. Policy errors (`PolicyError`) are fatal and abort the run before
//! any file is audited.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while turning a file into a `Dockerfile`.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The path does not exist, is a directory, or could not be read as UTF-8.
    #[error("{path} is not a readable Dockerfile: {reason}")]
    NotADockerfile { path: PathBuf, reason: String },

    /// The file exists but contains nothing once comments and blank lines are removed.
    #[error("{path} is empty")]
    EmptyFile { path: PathBuf },

    /// The grammar rejected part of the input. `line` counts lines of the
    /// normalised text.
    #[error("line {line}: {message}")]
    Malformed { line: u32, message: String },
}

impl ParseError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotADockerfile { .. } => "not-a-dockerfile",
            Self::EmptyFile { .. } => "empty-file",
            Self::Malformed { .. } => "malformed",
        }
    }
}

/// Errors raised while splitting a shell command into words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
}

/// Errors that can occur when loading a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy file does not exist.
    #[error("Policy file {path} does not exist")]
    NotFound { path: PathBuf },

    /// The policy file exists but could not be read.
    #[error("Failed to read policy file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or does not have the expected shape.
    #[error("Invalid policy configuration: {0}")]
    InvalidConfig(String),

    /// A secret or allow-list pattern is not a valid regular expression.
    #[error("Invalid pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while rendering the LaTeX report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The template could not be loaded or rendered.
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// The report could not be written.
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type for the binary and the batch driver.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dockerfile-audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;
