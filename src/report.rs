//! LaTeX report rendering.
//!
//! Renders the report source with tera from the embedded template or a user
//! supplied one. All text coming from Dockerfiles and policies is escaped
//! before it reaches the template. Compiling the source to PDF is left to
//! the caller.

use chrono::Local;
use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tera::{Context, Tera};

use crate::audit::BatchReport;
use crate::error::ReportError;
use crate::policy::Policy;
use crate::types::{AuditResult, RuleKind};

/// Default report file name.
pub const DEFAULT_REPORT_FILE: &str = "report.tex";

const TEMPLATE_NAME: &str = "report.tex";
const EMBEDDED_TEMPLATE: &str = include_str!("../templates/report.tex.tera");

/// Break width for regular cells.
const WRAP: usize = 25;
/// Break width for statements, which are set in a tiny font.
const WRAP_TINY: usize = 48;

/// Escape LaTeX special characters, allowing line breaks every `width` characters.
pub fn latex_escape(text: &str, width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(width.max(1))
        .map(|chunk| {
            let mut out = String::with_capacity(chunk.len());
            for &c in chunk {
                match c {
                    '\\' => out.push_str("\\textbackslash{}"),
                    '~' => out.push_str("\\textasciitilde{}"),
                    '^' => out.push_str("\\textasciicircum{}"),
                    '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                        out.push('\\');
                        out.push(c);
                    }
                    _ => out.push(c),
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join("\\allowbreak ")
}

fn escape_opt(text: Option<&str>, width: usize) -> String {
    text.map(|t| latex_escape(t, width))
        .unwrap_or_else(|| "N/A".to_string())
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 10_000.0 / total as f64).round() / 100.0
}

/// Pass/fail totals for the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub success_percentage: f64,
    pub failed_percentage: f64,
    pub compliance_level: &'static str,
    pub compliance_color: &'static str,
}

impl SummaryStats {
    pub fn from_batch(report: &BatchReport) -> Self {
        let total = report.results.len();
        let passed = report.passed_count();
        let failed = total - passed;
        let success_percentage = percentage(passed, total);
        let (compliance_level, compliance_color) = compliance(success_percentage);

        Self {
            total,
            passed,
            failed,
            skipped: report.skipped.len(),
            success_percentage,
            failed_percentage: percentage(failed, total),
            compliance_level,
            compliance_color,
        }
    }
}

/// Compliance level and table color for a pass percentage.
fn compliance(success: f64) -> (&'static str, &'static str) {
    match success {
        s if s < 10.0 => ("Poor", "red!50"),
        s if s < 25.0 => ("Low", "red!30"),
        s if s < 50.0 => ("Medium", "orange!50"),
        s if s < 80.0 => ("Fair", "green!20"),
        s if s < 100.0 => ("Good", "green!35"),
        _ => ("Perfect", "green!50"),
    }
}

/// Findings for one enabled rule across the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleStats {
    pub kind: String,
    pub count: usize,
    pub percentage: f64,
}

/// Violation counts per enabled rule, in policy order.
pub fn violation_stats(policy: &Policy, report: &BatchReport) -> Vec<RuleStats> {
    let kinds: Vec<RuleKind> = policy.rules().iter().map(|r| r.kind()).collect();
    let counts: Vec<usize> = kinds
        .iter()
        .map(|&kind| report.results.iter().map(|r| r.count_of(kind)).sum())
        .collect();
    let total: usize = counts.iter().sum();

    kinds
        .iter()
        .zip(counts)
        .map(|(kind, count)| RuleStats {
            kind: latex_escape(kind.as_str(), WRAP),
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct RuleRow {
    kind: String,
    description: String,
    details: String,
}

#[derive(Debug, Serialize)]
struct FindingRow {
    kind: String,
    details: String,
    mitigation: String,
    statement: String,
}

#[derive(Debug, Serialize)]
struct ResultRow {
    filename: String,
    maintainers: String,
    passed: bool,
    findings: Vec<FindingRow>,
}

impl From<&AuditResult> for ResultRow {
    fn from(result: &AuditResult) -> Self {
        Self {
            filename: latex_escape(&result.filename, WRAP),
            maintainers: escape_opt(result.maintainers.as_deref(), WRAP),
            passed: result.passed(),
            findings: result
                .findings
                .iter()
                .map(|f| FindingRow {
                    kind: latex_escape(f.kind.as_str(), WRAP),
                    details: latex_escape(&f.details, WRAP),
                    mitigation: latex_escape(&f.mitigation, WRAP),
                    statement: escape_opt(f.statement.as_deref(), WRAP_TINY),
                })
                .collect(),
        }
    }
}

/// Renders LaTeX report sources.
#[derive(Debug)]
pub struct ReportRenderer {
    tera: Tera,
}

impl ReportRenderer {
    /// Use the embedded template.
    pub fn new() -> Result<Self, ReportError> {
        Self::from_template_str(EMBEDDED_TEMPLATE)
    }

    /// Use a template file.
    pub fn from_template_file(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        debug!("Loading report template {}", path.display());
        let template = fs::read_to_string(path)?;
        Self::from_template_str(&template)
    }

    pub fn from_template_str(template: &str) -> Result<Self, ReportError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, template)?;
        Ok(Self { tera })
    }

    /// Render the report source.
    pub fn render(&self, policy: &Policy, report: &BatchReport) -> Result<String, ReportError> {
        let rules: Vec<RuleRow> = policy
            .summary()
            .into_iter()
            .map(|s| RuleRow {
                kind: latex_escape(s.kind.as_str(), WRAP),
                description: latex_escape(&s.description, WRAP),
                details: latex_escape(&s.details, WRAP),
            })
            .collect();
        let results: Vec<ResultRow> = report.results.iter().map(ResultRow::from).collect();

        let mut context = Context::new();
        context.insert("generated_at", &Local::now().format("%Y-%m-%d %H:%M").to_string());
        context.insert("rules", &rules);
        context.insert("summary", &SummaryStats::from_batch(report));
        context.insert("violations", &violation_stats(policy, report));
        context.insert("results", &results);

        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }

    /// Render the report source and write it to `path`.
    pub fn write(&self, policy: &Policy, report: &BatchReport, path: impl AsRef<Path>) -> Result<(), ReportError> {
        info!("Starting report generation.");
        let source = self.render(policy, report)?;
        fs::write(path.as_ref(), source)?;
        info!("Report generated: {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Finding;

    fn policy() -> Policy {
        Policy::from_yaml_str(
            "policy:\n  forbid_root:\n    enabled: true\n  forbid_floating_tags:\n    enabled: true\n    forbidden_tags: [latest]\n",
        )
        .unwrap()
    }

    fn batch() -> BatchReport {
        let finding = Finding::new(RuleKind::ForbidRoot, "root user", "drop privileges")
            .with_statement("USER root");
        BatchReport {
            results: vec![
                AuditResult::new("my_app.Dockerfile", None, vec![finding]),
                AuditResult::new("ok", Some("a&b".to_string()), vec![]),
            ],
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_latex_escape() {
        assert_eq!(latex_escape("a_b 50% $x & #1", 80), r"a\_b 50\% \$x \& \#1");
        assert_eq!(latex_escape(r"C:\{x}", 80), r"C:\textbackslash{}\{x\}");
        assert_eq!(latex_escape("abcdef", 3), r"abc\allowbreak def");
    }

    #[test]
    fn test_summary_stats() {
        let stats = SummaryStats::from_batch(&batch());
        assert_eq!(stats.total, 2);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.success_percentage, 50.0);
        assert_eq!(stats.compliance_level, "Fair");
    }

    #[test]
    fn test_compliance_levels() {
        assert_eq!(compliance(0.0).0, "Poor");
        assert_eq!(compliance(80.0).0, "Good");
        assert_eq!(compliance(100.0).0, "Perfect");
    }

    #[test]
    fn test_violation_stats_follow_policy_order() {
        let stats = violation_stats(&policy(), &batch());
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].kind, r"FORBID\_TAGS");
        assert_eq!(stats[0].count, 0);
        assert_eq!(stats[1].kind, r"FORBID\_ROOT");
        assert_eq!(stats[1].count, 1);
        assert_eq!(stats[1].percentage, 100.0);
    }

    #[test]
    fn test_render_embedded_template() {
        let source = ReportRenderer::new().unwrap().render(&policy(), &batch()).unwrap();
        assert!(source.starts_with("\\documentclass"));
        assert!(source.contains(r"\subsection{my\_app.Dockerfile}"));
        assert!(source.contains(r"\textbf{Maintainers:} N/A"));
        assert!(source.contains(r"\textbf{Maintainers:} a\&b"));
        assert!(source.contains(r"\texttt{\tiny USER root }"));
        assert!(source.contains(r"\cellcolor{green!20}"));
    }

    #[test]
    fn test_custom_template() {
        let renderer =
            ReportRenderer::from_template_str("{{ summary.total }} files, {{ rules | length }} rules").unwrap();
        assert_eq!(renderer.render(&policy(), &batch()).unwrap(), "2 files, 2 rules");
    }

    #[test]
    fn test_invalid_template() {
        assert!(matches!(
            ReportRenderer::from_template_str("{% for %}"),
            Err(ReportError::Template(_))
        ));
    }
}
