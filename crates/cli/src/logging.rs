use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Console line layout. `full` adds timestamps and event targets; the file
/// sink always uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
}

/// Console and optional file sinks. Built once per process by `main`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub file: Option<PathBuf>,
    pub file_level: LevelFilter,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::INFO,
            file: None,
            file_level: LevelFilter::DEBUG,
            format: LogFormat::Compact,
        }
    }
}

impl LogConfig {
    pub fn console(verbose: bool) -> Self {
        Self {
            console_level: if verbose {
                LevelFilter::DEBUG
            } else {
                LevelFilter::INFO
            },
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file(mut self, path: &Path) -> Self {
        self.file = Some(path.to_path_buf());
        self
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the console level;
/// the file sink always records at `file_level` without ANSI colors.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let console_filter = EnvFilter::builder()
        .with_default_directive(config.console_level.into())
        .from_env_lossy();
    let console = match config.format {
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed(),
        LogFormat::Full => fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed(),
    };

    let file = match &config.file {
        Some(path) => {
            let handle = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(handle))
                    .with_filter(config.file_level),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))
}
