//! TTY formatter.
//!
//! One block per audited file: the outcome, then each finding with its
//! offending statement and mitigation. Uses ANSI escape codes for colors.

use crate::audit::BatchReport;
use crate::formatter::Formatter;
use crate::types::{AuditResult, Outcome};
use std::io::Write;

/// TTY (terminal) output formatter with colors.
#[derive(Debug, Clone)]
pub struct TtyFormatter {
    /// Use colors in output.
    pub colors: bool,
}

impl Default for TtyFormatter {
    fn default() -> Self {
        Self { colors: true }
    }
}

impl TtyFormatter {
    /// Create a new TTY formatter with colors enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a TTY formatter without colors.
    pub fn no_color() -> Self {
        Self { colors: false }
    }

    fn outcome_color(&self, outcome: Outcome) -> &'static str {
        if !self.colors {
            return "";
        }
        match outcome {
            Outcome::Pass => "\x1b[1;32m", // Bold green
            Outcome::Fail => "\x1b[1;31m", // Bold red
        }
    }

    fn reset(&self) -> &'static str {
        if self.colors { "\x1b[0m" } else { "" }
    }

    fn dim(&self) -> &'static str {
        if self.colors { "\x1b[2m" } else { "" }
    }

    fn bold(&self) -> &'static str {
        if self.colors { "\x1b[1m" } else { "" }
    }

    fn yellow(&self) -> &'static str {
        if self.colors { "\x1b[1;33m" } else { "" }
    }

    fn write_result<W: Write>(&self, result: &AuditResult, writer: &mut W) -> std::io::Result<()> {
        let (bold, dim, reset) = (self.bold(), self.dim(), self.reset());
        let badge = match result.outcome {
            Outcome::Pass => "PASS",
            Outcome::Fail => "FAIL",
        };

        write!(
            writer,
            "{}{}{} {}{}{}",
            self.outcome_color(result.outcome),
            badge,
            reset,
            bold,
            result.filename,
            reset
        )?;
        if let Some(maintainers) = &result.maintainers {
            write!(writer, " {}({}){}", dim, maintainers, reset)?;
        }
        writeln!(writer)?;

        for finding in &result.findings {
            writeln!(writer, "  {}{}{}: {}", self.yellow(), finding.kind, reset, finding.details)?;
            if let Some(statement) = &finding.statement {
                writeln!(writer, "    {}> {}{}", dim, statement, reset)?;
            }
            writeln!(writer, "    {}fix:{} {}", dim, reset, finding.mitigation)?;
        }

        Ok(())
    }
}

impl Formatter for TtyFormatter {
    fn format<W: Write>(&self, report: &BatchReport, writer: &mut W) -> std::io::Result<()> {
        for result in &report.results {
            self.write_result(result, writer)?;
        }

        for skipped in &report.skipped {
            writeln!(
                writer,
                "{}SKIP{} {}: {}",
                self.dim(),
                self.reset(),
                skipped.path.display(),
                skipped.error
            )?;
        }

        if report.results.is_empty() {
            return Ok(());
        }

        // Summary line
        let passed = report.passed_count();
        let failed = report.failed_count();
        writeln!(writer)?;
        writeln!(
            writer,
            "{}{} passed{}, {}{} failed{}, {} skipped",
            self.outcome_color(Outcome::Pass),
            passed,
            self.reset(),
            self.outcome_color(Outcome::Fail),
            failed,
            self.reset(),
            report.skipped.len()
        )
    }
}
