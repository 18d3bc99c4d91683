use std::ffi::OsStr;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

const QUERY_LOG_DIRECTIVE: &str = "campus_portal::db=debug";

fn stderr_filter(base: EnvFilter, query_debug: bool) -> anyhow::Result<EnvFilter> {
    let filter = base.add_directive("info".parse()?);
    if query_debug {
        return Ok(filter.add_directive(QUERY_LOG_DIRECTIVE.parse()?));
    }
    Ok(filter)
}

/// Colored stderr plus a daily-rolling JSON file. Keep the returned guard
/// alive for the life of the process or buffered file lines are lost.
pub fn init(log_file_path: &Path, query_debug: bool) -> anyhow::Result<WorkerGuard> {
    let log_dir = log_file_path.parent().unwrap_or(Path::new("logs"));
    let log_file_name = log_file_path
        .file_name()
        .unwrap_or(OsStr::new("campus-portal.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter(EnvFilter::from_env("RUST_LOG"), query_debug)?);

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_debug_enables_db_timings_on_stderr() {
        let filter = stderr_filter(EnvFilter::new(""), true).unwrap();
        assert!(filter.to_string().contains(QUERY_LOG_DIRECTIVE));
    }

    #[test]
    fn db_timings_stay_quiet_by_default() {
        let filter = stderr_filter(EnvFilter::new(""), false).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("info"));
        assert!(!rendered.contains("campus_portal::db"));
    }
}
