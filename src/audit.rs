//! Single-file and batch auditing.
//!
//! A batch is either one file or the direct entries of a directory, sorted
//! by file name. Entries are parsed and evaluated in parallel; results keep
//! the input order. Files that cannot be parsed are recorded as skipped.

use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::dockerfile::Dockerfile;
use crate::error::ParseError;
use crate::policy::Policy;
use crate::types::AuditResult;

/// A file that could not be audited.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: ParseError,
}

/// Results of auditing one path.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Audited files in input order.
    pub results: Vec<AuditResult>,
    /// Files that failed to parse, in input order.
    pub skipped: Vec<SkippedFile>,
}

impl BatchReport {
    /// True when no file was audited successfully.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// True when any audited file failed the policy.
    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}

/// Audits Dockerfiles against a policy.
#[derive(Debug)]
pub struct Auditor {
    policy: Policy,
}

impl Auditor {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Parse and evaluate a single file.
    pub fn audit_file(&self, path: impl AsRef<Path>) -> Result<AuditResult, ParseError> {
        let path = path.as_ref();
        debug!("Auditing {}", path.display());
        let dockerfile = Dockerfile::from_path(path)?;
        Ok(self.policy.evaluate(&dockerfile))
    }

    /// Audit a file, or every direct entry of a directory.
    pub fn audit_path(&self, path: impl AsRef<Path>) -> BatchReport {
        let path = path.as_ref();
        let files = if path.is_dir() {
            let entries = list_entries(path);
            info!("Scanning {} files in {}", entries.len(), path.display());
            entries
        } else {
            info!("Scanning file: {}", path.display());
            vec![path.to_path_buf()]
        };
        self.audit_files(files)
    }

    /// Audit an explicit list of files, keeping their order.
    pub fn audit_files(&self, files: Vec<PathBuf>) -> BatchReport {
        let outcomes: Vec<(PathBuf, Result<AuditResult, ParseError>)> = files
            .into_par_iter()
            .map(|file| {
                let outcome = self.audit_file(&file);
                (file, outcome)
            })
            .collect();

        let mut report = BatchReport::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(result) => report.results.push(result),
                Err(error) => {
                    warn!("Skipping {}: {}", path.display(), error);
                    report.skipped.push(SkippedFile { path, error });
                }
            }
        }
        report
    }
}

/// Direct entries of a directory, sorted by file name.
fn list_entries(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.into_path()),
            Err(e) => {
                warn!("Cannot read directory entry: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn auditor() -> Auditor {
        let policy =
            Policy::from_yaml_str("policy:\n  forbid_root:\n    enabled: true\n").unwrap();
        Auditor::new(policy)
    }

    #[test]
    fn test_audit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.Dockerfile");
        fs::write(&path, "FROM alpine:3.19\nUSER root\n").unwrap();

        let result = auditor().audit_file(&path).unwrap();
        assert_eq!(result.filename, "app.Dockerfile");
        assert!(!result.passed());
    }

    #[test]
    fn test_directory_with_good_and_empty_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.Dockerfile"), "FROM alpine\nUSER app\n").unwrap();
        fs::write(dir.path().join("b.Dockerfile"), "# nothing here\n\n").unwrap();

        let report = auditor().audit_path(dir.path());
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0].error, ParseError::EmptyFile { .. }));
        assert_eq!(report.passed_count(), 1);
        assert!(!report.has_failures());
    }

    #[test]
    fn test_directory_order_is_by_name() {
        let dir = TempDir::new().unwrap();
        for name in ["c", "a", "b"] {
            fs::write(dir.path().join(name), "FROM alpine\n").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("d"), "FROM alpine\n").unwrap();

        let report = auditor().audit_path(dir.path());
        let names: Vec<&str> = report.results.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(report.failed_count(), 3);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0].error, ParseError::NotADockerfile { .. }));
    }

    #[test]
    fn test_missing_path_is_skipped() {
        let report = auditor().audit_path("/definitely/not/here/Dockerfile");
        assert!(report.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }
}
