use std::{fs, path::Path};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

pub const LOG_FILE_NAME: &str = "vanilla-qa.log";

#[derive(Clone, Copy, Debug)]
pub enum JsonLogFormat {
    Pretty,
    Compact,
}

/// Initializes the tracing subscriber with layered output:
/// 1. Stdout, shaped by the `log_json`, `json_format` and `verbose` flags.
/// 2. File, JSON debug logs to `<log_dir>/vanilla-qa.log` when a directory is given.
///
/// Returns a WorkerGuard that main() must hold so file logs get flushed.
pub fn init(
    verbose: bool,
    log_json: bool,
    json_format: JsonLogFormat,
    log_dir: Option<&Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let registry = tracing_subscriber::registry();
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_env_filter(verbose));

    let (file_layer, guard) = match log_dir {
        Some(dir) => match fs::create_dir_all(dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                let layer = fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_filter(Targets::new().with_default(tracing::Level::DEBUG));
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("Warning: Failed to create log dir {dir:?}: {e}");
                (None, None)
            }
        },
        None => (None, None),
    };

    let stdout_layer: Box<dyn Layer<Registry> + Send + Sync> = if log_json {
        match json_format {
            JsonLogFormat::Pretty => Box::new(
                fmt::layer()
                    .json()
                    .with_writer(|| PrettyJsonWriter::new(std::io::stdout()))
                    .with_filter(stdout_filter),
            ),
            JsonLogFormat::Compact => Box::new(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stdout)
                    .with_filter(stdout_filter),
            ),
        }
    } else if verbose {
        Box::new(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(stdout_filter),
        )
    } else {
        Box::new(
            fmt::layer()
                .with_writer(std::io::stdout)
                .without_time()
                .with_target(false)
                .with_level(true)
                .with_filter(stdout_filter),
        )
    };

    registry.with(stdout_layer).with(file_layer).init();

    guard
}

struct PrettyJsonWriter<W: std::io::Write> {
    inner: W,
}

impl<W: std::io::Write> PrettyJsonWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: std::io::Write> std::io::Write for PrettyJsonWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        // The JSON formatter emits one event per write.
        if let Ok(s) = std::str::from_utf8(buf) {
            let trimmed = s.trim();
            if trimmed.starts_with('{')
                && trimmed.ends_with('}')
                && let Ok(val) = serde_json::from_str::<serde_json::Value>(trimmed)
                && serde_json::to_writer_pretty(&mut self.inner, &val).is_ok()
            {
                let _ = self.inner.write(b"\n");
                return Ok(buf.len());
            }
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn default_env_filter(verbose: bool) -> EnvFilter {
    let directives = if verbose {
        "vanilla_qa=debug,rig_core=warn,info"
    } else {
        "vanilla_qa=info,rig_core=warn,warn"
    };
    EnvFilter::new(directives)
}
