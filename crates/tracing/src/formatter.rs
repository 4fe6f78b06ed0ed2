use crate::layers::BoxedLayer;
use clap::ValueEnum;
use std::{fmt, fmt::Display};
use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Output format of a log layer.
#[derive(Debug, Copy, Clone, ValueEnum, Eq, PartialEq, Default)]
pub enum LogFormat {
    /// One JSON object per record.
    Json,

    /// logfmt (key=value) records.
    #[value(name = "logfmt")]
    LogFmt,

    /// Human-readable, terminal-friendly records.
    #[default]
    Terminal,
}

impl LogFormat {
    /// Builds a boxed layer for this format.
    ///
    /// `color` controls ANSI output (`never` disables it, `RUST_LOG_STYLE` overrides it) and
    /// `file_writer` redirects the layer away from stdout. The logfmt layer always writes to
    /// stdout.
    pub fn apply(
        &self,
        filter: EnvFilter,
        color: Option<String>,
        file_writer: Option<NonBlocking>,
    ) -> BoxedLayer<Registry> {
        let ansi = match color {
            Some(color) if file_writer.is_none() => std::env::var("RUST_LOG_STYLE")
                .map(|val| val != "never")
                .unwrap_or(color != "never"),
            _ => false,
        };
        // Targets are noise at INFO; show them once DEBUG or TRACE is enabled, unless
        // `RUST_LOG_TARGET` says otherwise.
        let target = std::env::var("RUST_LOG_TARGET").map(|val| val != "0").unwrap_or_else(|_| {
            filter.max_level_hint().is_none_or(|max_level| max_level > tracing::Level::INFO)
        });

        match self {
            Self::Json => {
                let layer =
                    tracing_subscriber::fmt::layer().json().with_ansi(ansi).with_target(target);

                if let Some(writer) = file_writer {
                    layer.with_writer(writer).with_filter(filter).boxed()
                } else {
                    layer.with_filter(filter).boxed()
                }
            }
            Self::LogFmt => tracing_logfmt::layer().with_filter(filter).boxed(),
            Self::Terminal => {
                let layer = tracing_subscriber::fmt::layer().with_ansi(ansi).with_target(target);

                if let Some(writer) = file_writer {
                    layer.with_writer(writer).with_filter(filter).boxed()
                } else {
                    layer.with_filter(filter).boxed()
                }
            }
        }
    }
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::LogFmt => write!(f, "logfmt"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}
