use clap::Parser;
use dockerfile_audit::cli::Cli;
use dockerfile_audit::formatter::{self, JsonFormatter, Formatter};
use dockerfile_audit::report::ReportRenderer;
use dockerfile_audit::{Auditor, BatchReport, Policy};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::process;

/// Exit status when `--fail-on-findings` is set and a file fails the policy.
const EXIT_FINDINGS: i32 = 3;

fn main() {
    let cli = Cli::parse();
    cli.init_logging();

    // Load the policy before touching any Dockerfile
    let policy = match &cli.policy {
        Some(path) => Policy::from_yaml_file(path),
        None => Policy::find_and_load(),
    };
    let policy = match policy {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match run(&cli, policy) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli, policy: Policy) -> dockerfile_audit::Result<i32> {
    if policy.is_empty() {
        warn!("No rule is enabled in the policy, every file will pass.");
    }

    let auditor = Auditor::new(policy);
    let batch = auditor.audit_path(&cli.dockerfile);

    if batch.is_empty() {
        warn!("No files were processed, reports will be skipped.");
        return Ok(0);
    }

    if !cli.quiet {
        let colors = !cli.no_color && io::stdout().is_terminal();
        let stdout = io::stdout();
        let mut out = stdout.lock();
        formatter::format_report(&batch, cli.format.into(), colors, &mut out)?;
        out.flush()?;
    }

    if cli.json {
        write_json(&batch, cli)?;
    }

    if cli.report {
        debug!("Preparing to generate LaTeX report.");
        let renderer = match &cli.report_template {
            Some(path) => ReportRenderer::from_template_file(path)?,
            None => ReportRenderer::new()?,
        };
        renderer.write(auditor.policy(), &batch, &cli.report_name)?;
    }

    if cli.fail_on_findings && batch.has_failures() {
        return Ok(EXIT_FINDINGS);
    }
    Ok(0)
}

fn write_json(batch: &BatchReport, cli: &Cli) -> dockerfile_audit::Result<()> {
    let mut writer = BufWriter::new(File::create(&cli.json_outfile)?);
    JsonFormatter::pretty().format(batch, &mut writer)?;
    writer.flush()?;
    info!("JSON results written to {}", cli.json_outfile.display());
    Ok(())
}
