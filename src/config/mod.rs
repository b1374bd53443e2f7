//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{num::NonZeroUsize, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::{application::print::DEFAULT_PRODUCT_LABEL, cache::DEFAULT_MATH_CACHE_CAPACITY};

pub use cli::{
    CliArgs, Command, DocumentInput, LoggingOverrides, MathOverrides, PlanArgs, PrintArgs,
    SegmentsArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "gradebridge";
const ENV_PREFIX: &str = "GRADEBRIDGE";
const DEFAULT_MATH_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_MATH_TIMEOUT_MS: u64 = 30_000;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub math: MathSettings,
    pub print: PrintSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathBackendKind {
    Katex,
    Disabled,
}

impl FromStr for MathBackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "katex" => Ok(Self::Katex),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            other => Err(format!("unknown backend `{other}` (expected katex or disabled)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MathSettings {
    pub backend: MathBackendKind,
    pub poll_interval: Duration,
    pub timeout: Duration,
    pub cache_capacity: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct PrintSettings {
    pub product_label: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_command_overrides(&cli.command);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    math: RawMathSettings,
    print: RawPrintSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawMathSettings {
    backend: Option<String>,
    poll_interval_ms: Option<u64>,
    timeout_ms: Option<u64>,
    cache_capacity: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPrintSettings {
    product_label: Option<String>,
}

impl RawSettings {
    fn apply_command_overrides(&mut self, command: &Command) {
        self.apply_logging_overrides(command.logging());
        if let Command::Print(args) = command {
            self.apply_math_overrides(&args.math);
            if let Some(label) = args.product_label.as_ref() {
                self.print.product_label = Some(label.clone());
            }
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_math_overrides(&mut self, overrides: &MathOverrides) {
        if let Some(backend) = overrides.backend.as_ref() {
            self.math.backend = Some(backend.clone());
        }
        if let Some(value) = overrides.poll_interval_ms {
            self.math.poll_interval_ms = Some(value);
        }
        if let Some(value) = overrides.timeout_ms {
            self.math.timeout_ms = Some(value);
        }
        if let Some(value) = overrides.cache_capacity {
            self.math.cache_capacity = Some(value);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            math,
            print,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            math: build_math_settings(math)?,
            print: build_print_settings(print)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_math_settings(math: RawMathSettings) -> Result<MathSettings, LoadError> {
    let backend = match math.backend {
        Some(value) => value
            .parse()
            .map_err(|reason| LoadError::invalid("math.backend", reason))?,
        None => MathBackendKind::Katex,
    };

    let poll_interval_ms = math
        .poll_interval_ms
        .unwrap_or(DEFAULT_MATH_POLL_INTERVAL_MS);
    if poll_interval_ms == 0 {
        return Err(LoadError::invalid(
            "math.poll_interval_ms",
            "must be greater than zero",
        ));
    }

    let timeout_ms = math.timeout_ms.unwrap_or(DEFAULT_MATH_TIMEOUT_MS);
    if timeout_ms < poll_interval_ms {
        return Err(LoadError::invalid(
            "math.timeout_ms",
            format!("must be at least the poll interval ({poll_interval_ms} ms)"),
        ));
    }

    let cache_capacity = match math.cache_capacity {
        Some(capacity) => usize::try_from(capacity).ok(),
        None => Some(DEFAULT_MATH_CACHE_CAPACITY),
    }
    .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            LoadError::invalid(
                "math.cache_capacity",
                "must be greater than zero and fit in usize",
            )
        })?;

    Ok(MathSettings {
        backend,
        poll_interval: Duration::from_millis(poll_interval_ms),
        timeout: Duration::from_millis(timeout_ms),
        cache_capacity,
    })
}

fn build_print_settings(print: RawPrintSettings) -> Result<PrintSettings, LoadError> {
    let product_label = match print.product_label {
        Some(label) => {
            let trimmed = label.trim();
            if trimmed.is_empty() {
                return Err(LoadError::invalid(
                    "print.product_label",
                    "must not be empty",
                ));
            }
            trimmed.to_string()
        }
        None => DEFAULT_PRODUCT_LABEL.to_string(),
    };

    Ok(PrintSettings { product_label })
}
