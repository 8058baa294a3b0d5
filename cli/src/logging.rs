//! Subscriber setup: console on stderr, plus an optional daily log file.

use config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_SUFFIX: &str = "log";

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must live until
/// the process exits. When the log file cannot be opened the export still
/// runs with console logging only.
pub fn init(console_level: Option<&str>, file: Option<&LoggingConfig>) -> Option<WorkerGuard> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter(console_level));

    let (file_layer, guard, open_error) = match file.filter(|logging| logging.enabled) {
        Some(logging) => match file_appender(logging) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(EnvFilter::new(&logging.level));
                (Some(layer), Some(guard), None)
            }
            Err(e) => (None, None, Some(e))
        },
        None => (None, None, None)
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    if let (Some(e), Some(logging)) = (open_error, file) {
        tracing::warn!(directory = %logging.directory, error = %e, "Log file disabled");
    }
    guard
}

/// `<directory>/<filename>.<YYYY-MM-DD>.log`, rotated daily, keeping
/// `max_files` files.
fn file_appender(logging: &LoggingConfig) -> Result<RollingFileAppender, String> {
    std::fs::create_dir_all(&logging.directory).map_err(|e| e.to_string())?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(logging.filename.as_str())
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(logging.max_files)
        .build(&logging.directory)
        .map_err(|e| e.to_string())
}

/// `--log-level` wins over `RUST_LOG`; with neither set, `info`.
fn console_filter(log_level: Option<&str>) -> EnvFilter {
    match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_appender_creates_directory() {
        let dir = TempDir::new().unwrap();
        let logging = LoggingConfig {
            directory: dir.path().join("nested/logs").display().to_string(),
            filename: "export".to_string(),
            ..Default::default()
        };

        assert!(file_appender(&logging).is_ok());
        let names: Vec<String> = std::fs::read_dir(dir.path().join("nested/logs"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("export."));
        assert!(names[0].ends_with(".log"));
    }

    #[test]
    fn test_file_appender_rejects_file_as_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let logging = LoggingConfig {
            directory: file.path().display().to_string(),
            ..Default::default()
        };

        assert!(file_appender(&logging).is_err());
    }
}
