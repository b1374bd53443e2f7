use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the GradeBridge binary.
#[derive(Debug, Parser)]
#[command(
    name = "gradebridge",
    version,
    about = "Render assignment submissions into a printable document"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "GRADEBRIDGE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render the printable HTML document for one submission.
    Print(PrintArgs),
    /// Print the page plan as JSON without rendering it.
    Plan(PlanArgs),
    /// Show how a content string splits into text and math segments.
    Segments(SegmentsArgs),
}

impl Command {
    pub fn logging(&self) -> &LoggingOverrides {
        match self {
            Command::Print(args) => &args.logging,
            Command::Plan(args) => &args.logging,
            Command::Segments(args) => &args.logging,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct DocumentInput {
    /// Assignment definition (JSON).
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub assignment: PathBuf,

    /// Submission data or exported backup (JSON).
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub submission: PathBuf,

    /// Student name; defaults to the backup's when one is supplied.
    #[arg(long = "student-name", value_name = "NAME")]
    pub student_name: Option<String>,

    /// Student id; defaults to the backup's when one is supplied.
    #[arg(long = "student-id", value_name = "ID")]
    pub student_id: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MathOverrides {
    /// Override the math backend (katex|disabled).
    #[arg(long = "math-backend", value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Override how often a missing backend is probed.
    #[arg(long = "math-poll-interval-ms", value_name = "MILLIS")]
    pub poll_interval_ms: Option<u64>,

    /// Override how long to wait for the backend before falling back.
    #[arg(long = "math-timeout-ms", value_name = "MILLIS")]
    pub timeout_ms: Option<u64>,

    /// Override the number of rendered formulas kept in memory.
    #[arg(long = "math-cache-capacity", value_name = "COUNT")]
    pub cache_capacity: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct PrintArgs {
    #[command(flatten)]
    pub input: DocumentInput,

    /// Write the document here instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Override the footer printed on the title page.
    #[arg(long = "product-label", value_name = "TEXT")]
    pub product_label: Option<String>,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub math: MathOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub input: DocumentInput,

    #[command(flatten)]
    pub logging: LoggingOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct SegmentsArgs {
    /// Content to segment; read from stdin when omitted.
    #[arg(value_name = "TEXT")]
    pub text: Option<String>,

    #[command(flatten)]
    pub logging: LoggingOverrides,
}
