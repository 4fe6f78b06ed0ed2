use crate::formatter::LogFormat;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::Directive, EnvFilter, Layer, Registry};

/// A boxed tracing [Layer].
pub(crate) type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Default [directives](Directive) for [`EnvFilter`] which silence the HTTP stack underneath
/// the dispatcher.
const DEFAULT_ENV_FILTER_DIRECTIVES: [&str; 4] =
    ["hyper_util=off", "h2=off", "rustls=off", "reqwest=warn"];

/// Collection of layers that gets installed on the global registry.
pub(crate) struct Layers {
    inner: Vec<BoxedLayer<Registry>>,
}

impl Layers {
    pub(crate) fn new() -> Self {
        Self { inner: vec![] }
    }

    pub(crate) fn into_inner(self) -> Vec<BoxedLayer<Registry>> {
        self.inner
    }

    /// Adds a stdout layer.
    pub(crate) fn stdout(
        &mut self,
        format: LogFormat,
        default_directive: Directive,
        filters: &str,
        color: Option<String>,
    ) -> eyre::Result<()> {
        let filter = build_env_filter(Some(default_directive), filters)?;
        let layer = format.apply(filter, color, None);
        self.inner.push(layer);
        Ok(())
    }

    /// Adds a file layer and returns the guard of its background writer.
    pub(crate) fn file(
        &mut self,
        format: LogFormat,
        filter: &str,
        file_info: FileInfo,
    ) -> eyre::Result<WorkerGuard> {
        let (writer, guard) = file_info.create_log_writer()?;
        let file_filter = build_env_filter(None, filter)?;
        let layer = format.apply(file_filter, None, Some(writer));
        self.inner.push(layer);
        Ok(guard)
    }
}

/// Location of the diagnostic log file.
#[derive(Debug, Clone)]
pub struct FileInfo {
    dir: PathBuf,
    file_name: String,
}

impl FileInfo {
    /// Creates a new `FileInfo` for `dir/file_name`.
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self { dir: dir.into(), file_name: file_name.into() }
    }

    /// Splits a full path into directory and file name.
    pub fn from_path(path: &Path) -> Self {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "zkprobe.log".to_string());
        Self { dir, file_name }
    }

    fn create_log_writer(
        &self,
    ) -> eyre::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
        if !self.dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&self.dir)?;
        }
        let appender = tracing_appender::rolling::never(&self.dir, &self.file_name);
        Ok(tracing_appender::non_blocking(appender))
    }
}

/// Builds an [`EnvFilter`] from `RUST_LOG`, the optional default directive, the defaults in
/// [`DEFAULT_ENV_FILTER_DIRECTIVES`] and the comma separated `directives`.
pub(crate) fn build_env_filter(
    default_directive: Option<Directive>,
    directives: &str,
) -> eyre::Result<EnvFilter> {
    let env_filter = if let Some(default_directive) = default_directive {
        EnvFilter::builder().with_default_directive(default_directive).from_env_lossy()
    } else {
        EnvFilter::builder().from_env_lossy()
    };

    DEFAULT_ENV_FILTER_DIRECTIVES
        .into_iter()
        .chain(directives.split(',').filter(|d| !d.is_empty()))
        .try_fold(env_filter, |env_filter, directive| {
            Ok(env_filter.add_directive(directive.parse()?))
        })
}
