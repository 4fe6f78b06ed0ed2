//!  Logging setup for the zkprobe binaries.
//!
//!  The crate builds a [`tracing_subscriber`] registry out of a stdout layer and an optional
//!  diagnostic file layer. The entry point is [`ProbeTracer`], which is configured with a
//!  [`LayerInfo`] per destination and installed with [`Tracer::init`]. If no file layer is
//!  configured, only stdout is used.
//!
//!  # Examples
//!
//!  ```
//!  use zkprobe_tracing::{
//!      LayerInfo, LogFormat, ProbeTracer, Tracer,
//!      tracing::level_filters::LevelFilter,
//!  };
//!
//!  fn main() -> eyre::Result<()> {
//!      let tracer = ProbeTracer::new().with_stdout(LayerInfo::new(
//!          LogFormat::LogFmt,
//!          LevelFilter::INFO.to_string(),
//!          "zkprobe::dispatch=debug".to_string(),
//!          None,
//!      ));
//!
//!      let _handle = tracer.init()?;
//!      Ok(())
//!  }
//!  ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

// Re-export tracing crates
pub use tracing;
pub use tracing_appender;
pub use tracing_subscriber;

pub use formatter::LogFormat;
pub use layers::FileInfo;
pub use test_tracer::TestTracer;

mod formatter;
mod layers;
mod test_tracer;

use crate::layers::Layers;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

///  Tracer for application logging.
///
///  Holds the stdout layer configuration and, optionally, a file layer.
#[derive(Debug, Clone)]
pub struct ProbeTracer {
    stdout: LayerInfo,
    file: Option<(LayerInfo, FileInfo)>,
}

impl ProbeTracer {
    ///  Constructs a new tracer with the default stdout layer and no file layer.
    pub fn new() -> Self {
        Self { stdout: LayerInfo::default(), file: None }
    }

    ///  Sets a custom configuration for the stdout layer.
    pub fn with_stdout(mut self, config: LayerInfo) -> Self {
        self.stdout = config;
        self
    }

    ///  Sets the file layer configuration and associated file info.
    ///
    ///  # Arguments
    ///  * `config` - The `LayerInfo` to use for the file layer.
    ///  * `file_info` - Where the log file lives.
    pub fn with_file(mut self, config: LayerInfo, file_info: FileInfo) -> Self {
        self.file = Some((config, file_info));
        self
    }
}

impl Default for ProbeTracer {
    fn default() -> Self {
        Self::new()
    }
}

///  Configuration for a logging layer.
///
///  Holds the format, the default directive used when `RUST_LOG` is unset, extra filter
///  directives, and the color mode.
#[derive(Debug, Clone)]
pub struct LayerInfo {
    format: LogFormat,
    default_directive: String,
    filters: String,
    color: Option<String>,
}

impl LayerInfo {
    ///  Constructs a new `LayerInfo`.
    ///
    ///  # Arguments
    ///  * `format` - Output format of the layer.
    ///  * `default_directive` - Directive applied when `RUST_LOG` is not set.
    ///  * `filters` - Comma separated additional directives.
    ///  * `color` - `always`, `auto` or `never`; `None` disables ANSI codes.
    pub const fn new(
        format: LogFormat,
        default_directive: String,
        filters: String,
        color: Option<String>,
    ) -> Self {
        Self { format, default_directive, filters, color }
    }
}

impl Default for LayerInfo {
    ///  Terminal format, INFO level, no extra filters, colored output.
    fn default() -> Self {
        Self {
            format: LogFormat::Terminal,
            default_directive: LevelFilter::INFO.to_string(),
            filters: String::new(),
            color: Some("always".to_string()),
        }
    }
}

/// Handle returned by [`Tracer::init`].
///
/// Dropping it flushes and stops the file writer, so keep it alive for the whole run.
#[derive(Debug, Default)]
pub struct TracerHandle {
    /// Guard for the file layer, if any
    pub file_guard: Option<WorkerGuard>,
}

/// Trait defining a general interface for logging configuration.
pub trait Tracer {
    /// Initialize the logging configuration.
    ///
    /// Returns a [`TracerHandle`] that owns the file writer guard, or an error if a filter
    /// directive could not be parsed.
    fn init(self) -> eyre::Result<TracerHandle>;
}

impl Tracer for ProbeTracer {
    fn init(self) -> eyre::Result<TracerHandle> {
        let mut layers = Layers::new();

        layers.stdout(
            self.stdout.format,
            self.stdout.default_directive.parse()?,
            &self.stdout.filters,
            self.stdout.color,
        )?;

        let file_guard = if let Some((config, file_info)) = self.file {
            Some(layers.file(config.format, &config.filters, file_info)?)
        } else {
            None
        };

        // The error is returned if the global default subscriber is already set,
        // so it's safe to ignore it
        let _ =
            tracing_subscriber::registry().with(layers.into_inner()).try_init().inspect_err(|e| {
                tracing::warn!(%e, "Tracing subscriber could not be initialized");
            });

        Ok(TracerHandle { file_guard })
    }
}

///  Initializes a tracing subscriber for tests.
///
///  The filter is configurable via `RUST_LOG`.
///
///  # Note
///
///  The subscriber will silently fail if it could not be installed.
pub fn init_test_tracing() {
    let _ = TestTracer::default().init();
}
