use anyhow::Result;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_PREFIX: &str = "task-logger";

/// Build the filter: an explicit flag, then RUST_LOG directives as written,
/// then the configured level. Flag and configured levels apply to this crate only.
pub fn resolve_filter(flag: Option<LevelFilter>, rust_log: Option<&str>, configured: &str) -> EnvFilter {
    if let Some(level) = flag {
        return crate_filter(&level.to_string());
    }

    if let Some(directives) = rust_log.filter(|directives| !directives.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("Ignoring invalid RUST_LOG '{}': {}", directives, e),
        }
    }

    crate_filter(configured)
}

fn crate_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "{}={}",
        env!("CARGO_PKG_NAME").replace('-', "_"),
        level.trim().to_lowercase()
    ))
}

/// Install the global subscriber: stderr plus a daily rotated file in `logs_dir`
pub fn enable_logging(logs_dir: &Path, filter: EnvFilter) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(logs_dir)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr.and(appender))
        .with_ansi(false)
        .init();
    Ok(())
}

#[cfg(test)]
pub static TEST_LOGGING: std::sync::LazyLock<()> = std::sync::LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .init()
});

#[cfg(test)]
mod tests {
    use super::*;

    fn shown(filter: EnvFilter) -> String {
        filter.to_string().to_lowercase()
    }

    #[test]
    fn test_flag_wins_over_env_and_config() {
        let filter = resolve_filter(Some(LevelFilter::DEBUG), Some("task_logger=trace"), "warn");
        assert!(shown(filter).contains("task_logger=debug"));
    }

    #[test]
    fn test_rust_log_directives_are_used_as_written() {
        let filter = resolve_filter(None, Some("task_logger=debug"), "warn");
        let text = shown(filter);
        assert!(text.contains("task_logger=debug"));
        assert!(!text.contains("task_logger=task_logger"));

        let filter = resolve_filter(None, Some("warn,task_logger=trace"), "error");
        assert!(shown(filter).contains("task_logger=trace"));
    }

    #[test]
    fn test_missing_or_invalid_rust_log_falls_back_to_config() {
        assert!(shown(resolve_filter(None, None, "info")).contains("task_logger=info"));
        assert!(shown(resolve_filter(None, Some("  "), "info")).contains("task_logger=info"));
        assert!(shown(resolve_filter(None, Some("task_logger=notalevel"), "info")).contains("task_logger=info"));
    }
}
