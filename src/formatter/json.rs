//! JSON formatter.
//!
//! Emits the audited files as a JSON array of results, in input order.
//! Skipped files are not part of the output.

use crate::audit::BatchReport;
use crate::formatter::Formatter;
use std::io::Write;

/// JSON output formatter.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    /// Pretty-print the JSON output.
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON formatter with pretty-printing enabled.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Formatter for JsonFormatter {
    fn format<W: Write>(&self, report: &BatchReport, writer: &mut W) -> std::io::Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(&report.results)
        } else {
            serde_json::to_string(&report.results)
        }
        .map_err(std::io::Error::other)?;

        writeln!(writer, "{}", json)
    }
}
