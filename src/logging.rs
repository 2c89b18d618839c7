use std::io::Write;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::prelude::*;

const DEFAULT_FILTER: &str = "info,jonnybox=debug";
const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "jonnybox.log";

/// Install the global subscriber: stdout always, plus `logs/jonnybox.log`
/// in debug builds. Keep the returned guard alive until exit so buffered
/// file lines are flushed.
pub fn setup_logging() -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER));

    let (writer, guard) = if cfg!(debug_assertions) {
        session_log(Path::new(LOG_DIR)).unzip()
    } else {
        (None, None)
    };
    // A `None` layer is a no-op, so release builds share the same stack.
    let file_layer = writer.map(|writer| {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .init();

    guard
}

/// Open the session log, marking where this run starts. `None` if the
/// directory cannot be created; logging then goes to stdout only.
fn session_log(dir: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Failed to create {}: {}", dir.display(), e);
        return None;
    }

    let path = dir.join(LOG_FILE);
    if let Ok(mut file) = std::fs::OpenOptions::new().append(true).open(&path) {
        let started = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(file, "\n--- jonnybox session {started} ---\n");
    }

    Some(tracing_appender::non_blocking(
        tracing_appender::rolling::never(dir, LOG_FILE),
    ))
}
