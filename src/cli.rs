use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::formatter::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "dockerfile-audit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Audit Dockerfiles against a security policy")]
#[command(long_about = "Parses Dockerfiles without building them and checks them against a declarative policy: approved registries, floating tags, insecure registries, root users, privileged ports, forbidden packages and secrets copied into the image.")]
pub struct Cli {
    /// The Dockerfile to audit. Can be both a file or a directory
    #[arg(short, long, value_name = "PATH")]
    pub dockerfile: PathBuf,

    /// The policy to use for the audit [default: policy.yaml, then the user config directory]
    #[arg(short, long, value_name = "FILE")]
    pub policy: Option<PathBuf>,

    /// Generate a JSON file with the findings
    #[arg(short, long)]
    pub json: bool,

    /// Name of the JSON file
    #[arg(short = 'o', long, value_name = "FILE", default_value = "dockerfile-audit.json")]
    pub json_outfile: PathBuf,

    /// Generate a LaTeX report about the findings
    #[arg(short, long)]
    pub report: bool,

    /// Name of the LaTeX report
    #[arg(short = 'n', long, value_name = "FILE", default_value = crate::report::DEFAULT_REPORT_FILE)]
    pub report_name: PathBuf,

    /// Template for the report instead of the built-in one
    #[arg(short = 't', long, value_name = "FILE")]
    pub report_template: Option<PathBuf>,

    /// Console output format
    #[arg(long, value_enum, default_value = "tty")]
    pub format: FormatArg,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Exit with status 3 when any file fails the policy
    #[arg(long)]
    pub fail_on_findings: bool,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Tty,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Tty => OutputFormat::Tty,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
