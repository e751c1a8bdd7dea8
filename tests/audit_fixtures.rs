//! Library-level audits of the fixture Dockerfiles.

use std::fs;
use std::path::{Path, PathBuf};

use dockerfile_audit::{Auditor, Outcome, ParseError, Policy, RuleKind};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn auditor() -> Auditor {
    let policy = Policy::from_yaml_file(fixtures().join("policy.yaml")).unwrap();
    Auditor::new(policy)
}

fn fixture(name: &str) -> PathBuf {
    fixtures().join("dockerfiles").join(name)
}

fn kinds(findings: &[dockerfile_audit::Finding]) -> Vec<RuleKind> {
    findings.iter().map(|f| f.kind).collect()
}

#[test]
fn test_policy_fixture_enables_every_rule() {
    let policy = Policy::from_yaml_file(fixtures().join("policy.yaml")).unwrap();
    let enabled: Vec<RuleKind> = policy.summary().iter().map(|s| s.kind).collect();
    assert_eq!(enabled, RuleKind::ALL.to_vec());
}

#[test]
fn test_compliant_file_passes() {
    let result = auditor().audit_file(fixture("01-compliant.Dockerfile")).unwrap();
    assert_eq!(result.outcome, Outcome::Pass, "{:#?}", result.findings);
    assert_eq!(result.filename, "01-compliant.Dockerfile");
    assert_eq!(result.maintainers.as_deref(), Some("platform-team@example.com"));
}

#[test]
fn test_last_user_root_fails() {
    let result = auditor().audit_file(fixture("02-root.Dockerfile")).unwrap();
    assert_eq!(result.outcome, Outcome::Fail);
    assert_eq!(kinds(&result.findings), vec![RuleKind::ForbidRoot]);
    assert_eq!(result.findings[0].statement.as_deref(), Some("USER root"));
    assert_eq!(result.maintainers.as_deref(), Some("Jane Doe, John Roe"));
}

#[test]
fn test_multistage_file() {
    let result = auditor().audit_file(fixture("03-multistage.Dockerfile")).unwrap();

    // Stage references are exempt from the registry check but not from the tag check.
    assert_eq!(
        kinds(&result.findings),
        vec![
            RuleKind::ForbidTags,
            RuleKind::ForbidTags,
            RuleKind::ForbidPackages,
            RuleKind::ForbidPackages,
        ]
    );
    assert_eq!(result.findings[0].statement.as_deref(), Some("FROM build AS test"));
    assert_eq!(result.findings[1].statement.as_deref(), Some("FROM runtime"));

    // The last stage has no RUN, so the loose text match applies to the whole file.
    let packages: Vec<&str> = result.findings[2..].iter().map(|f| f.details.as_str()).collect();
    assert_eq!(
        packages,
        vec![
            "Forbidden package \"curl\" is installed or used.",
            "Forbidden package \"netcat\" is installed or used.",
        ]
    );
    assert_eq!(
        result.findings[2].statement.as_deref(),
        Some("RUN apt-get update && apt-get install -y curl netcat && apt-get remove -y netcat")
    );
}

#[test]
fn test_insecure_file_collects_every_rule_in_order() {
    let result = auditor().audit_file(fixture("04-insecure.Dockerfile")).unwrap();
    assert_eq!(
        kinds(&result.findings),
        vec![
            RuleKind::EnforceRegistry,
            RuleKind::ForbidTags,
            RuleKind::ForbidInsecureRegistries,
            RuleKind::ForbidPrivilegedPorts,
            RuleKind::ForbidPackages,
            RuleKind::ForbidPackages,
            RuleKind::ForbidSecrets,
            RuleKind::ForbidSecrets,
            RuleKind::ForbidSecrets,
        ]
    );

    let details: Vec<&str> = result.findings.iter().map(|f| f.details.as_str()).collect();
    assert_eq!(
        details[0],
        "Registry http://registry.internal:5000 is not an allowed registry to pull images from."
    );
    assert!(details[3].contains("privileged port: 443."));
    assert_eq!(details[4], "Forbidden package \"curl\" is installed.");
    assert_eq!(details[5], "Forbidden package \"sudo\" is installed.");
    assert!(details[6].contains(r"\.env$"));
    assert!(details[7].contains("\"id_rsa\""));
    assert!(details[8].contains(r"\.pem$"));
    assert_eq!(result.findings[3].statement.as_deref(), Some("EXPOSE 443 3000"));
    assert_eq!(
        result.findings[7].statement.as_deref(),
        Some("COPY id_rsa.pub id_rsa /root/.ssh/")
    );
}

#[test]
fn test_empty_and_malformed_are_errors() {
    let auditor = auditor();
    assert!(matches!(
        auditor.audit_file(fixture("05-empty.Dockerfile")),
        Err(ParseError::EmptyFile { .. })
    ));
    match auditor.audit_file(fixture("06-malformed.Dockerfile")) {
        Err(ParseError::Malformed { line, message }) => {
            assert_eq!(line, 2);
            assert!(message.contains("FOO"), "{}", message);
        }
        other => panic!("expected a malformed error, got {:?}", other),
    }
}

#[test]
fn test_fixture_directory_batch() {
    let report = auditor().audit_path(fixtures().join("dockerfiles"));

    let names: Vec<&str> = report.results.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "01-compliant.Dockerfile",
            "02-root.Dockerfile",
            "03-multistage.Dockerfile",
            "04-insecure.Dockerfile",
        ]
    );
    assert_eq!(report.passed_count(), 1);
    assert_eq!(report.failed_count(), 3);

    let skipped: Vec<&str> = report
        .skipped
        .iter()
        .map(|s| s.path.file_name().unwrap().to_str().unwrap())
        .collect();
    assert_eq!(skipped, vec!["05-empty.Dockerfile", "06-malformed.Dockerfile"]);
}

#[test]
fn test_one_good_one_empty_file() {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture("01-compliant.Dockerfile"), dir.path().join("Dockerfile")).unwrap();
    fs::write(dir.path().join("Dockerfile.empty"), "").unwrap();

    let report = auditor().audit_path(dir.path());
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(!report.is_empty());
}

#[test]
fn test_directory_with_nothing_parseable() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a"), "\n\n").unwrap();

    let report = auditor().audit_path(dir.path());
    assert!(report.is_empty());
    assert_eq!(report.skipped.len(), 1);
}
