use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wiremap")]
#[command(about = "Compile-time dependency-injection graph compiler", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile module files into registration plans
    Compile {
        /// Module files or directories containing `*.wiremap.*` files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Configuration file (defaults to the nearest .wiremap.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file, or directory for `--format rust` (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Severity for a long-lived component capturing a shorter-lived one
        #[arg(long = "lifetime-mismatch", value_enum)]
        lifetime_mismatch: Option<Severity>,

        /// Severity for a long-lived component capturing a shorter-lived disposable one
        #[arg(long = "captive-dependency", value_enum)]
        captive_dependency: Option<Severity>,

        /// Handling of identities registered by more than one module
        #[arg(long = "conflict-policy", value_enum)]
        conflict_policy: Option<ConflictPolicy>,

        /// Number of parallel jobs (0 = all cores)
        #[arg(short = 'j', long = "jobs", default_value = "0")]
        jobs: usize,

        /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
    Rust,
    Dot,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Severity {
    Silent,
    Warn,
    Throw,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConflictPolicy {
    Fail,
    FirstWins,
    LastWins,
}

impl From<OutputFormat> for crate::io::output::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Json => crate::io::output::OutputFormat::Json,
            OutputFormat::Markdown => crate::io::output::OutputFormat::Markdown,
            OutputFormat::Terminal => crate::io::output::OutputFormat::Terminal,
            OutputFormat::Rust => crate::io::output::OutputFormat::Rust,
            OutputFormat::Dot => crate::io::output::OutputFormat::Dot,
        }
    }
}

impl From<Severity> for crate::diagnostics::ReportSeverity {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Silent => crate::diagnostics::ReportSeverity::Silent,
            Severity::Warn => crate::diagnostics::ReportSeverity::Warn,
            Severity::Throw => crate::diagnostics::ReportSeverity::Throw,
        }
    }
}

impl From<ConflictPolicy> for crate::registry::ConflictPolicy {
    fn from(p: ConflictPolicy) -> Self {
        match p {
            ConflictPolicy::Fail => crate::registry::ConflictPolicy::Fail,
            ConflictPolicy::FirstWins => crate::registry::ConflictPolicy::FirstWins,
            ConflictPolicy::LastWins => crate::registry::ConflictPolicy::LastWins,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
