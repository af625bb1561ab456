//! Tracing subscriber setup for the readiness binary
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary (or to an embedding service that brings its own).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::error::{ReadinessError, Result};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Where and how verbosely the binary logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,

    /// Also write JSON lines to this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Start a new file each day instead of appending to one
    pub rotation: bool,

    /// Emit span enter/close events on stderr
    pub include_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            file_path: None,
            rotation: true,
            include_spans: false,
        }
    }
}

/// Levels from quietest to loudest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// One step louder per `-v`, saturating at trace
    pub fn raised_by(self, verbosity: u8) -> LogLevel {
        let index = self as usize + verbosity as usize;
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if wanted == "warning" {
            return Ok(LogLevel::Warn);
        }
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| format!("unknown log level '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored
    Pretty,
    /// One JSON object per event
    Json,
    Compact,
}

impl LogFormat {
    pub const ALL: [LogFormat; 3] = [LogFormat::Pretty, LogFormat::Json, LogFormat::Compact];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| format!("unknown log format '{}'", s))
    }
}

/// Filter used when `RUST_LOG` is unset: this crate's events at the configured level
pub fn default_filter_directive(config: &LogConfig) -> String {
    format!("readiness={}", config.level.as_str())
}

fn stderr_layer<S>(config: &LogConfig) -> BoxedLayer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let base = fmt::layer().with_writer(std::io::stderr).with_target(true);
    match config.format {
        LogFormat::Pretty => {
            let span_events = if config.include_spans {
                FmtSpan::ENTER | FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            };
            base.pretty()
                .with_line_number(true)
                .with_span_events(span_events)
                .boxed()
        }
        LogFormat::Json => base
            .json()
            .with_current_span(config.include_spans)
            .with_span_list(config.include_spans)
            .boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

fn file_layer<S>(path: &Path, rotation: bool) -> Result<BoxedLayer<S>>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory)?;

    let layer = fmt::layer().json().with_ansi(false).with_target(true);
    if rotation {
        let prefix = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("readiness.log");
        Ok(layer
            .with_writer(tracing_appender::rolling::daily(directory, prefix))
            .boxed())
    } else {
        let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(layer.with_writer(Mutex::new(file)).boxed())
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter_directive(config)));

    let file = config
        .file_path
        .as_deref()
        .map(|path| file_layer(path, config.rotation))
        .transpose()?;

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer(config))
        .with(file)
        .try_init()
        .map_err(|e| ReadinessError::Internal(format!("subscriber already set: {}", e)))?;

    tracing::debug!(
        level = config.level.as_str(),
        format = config.format.as_str(),
        file = ?config.file_path,
        "logging ready"
    );
    Ok(())
}
