use std::path::Path;
use std::sync::Mutex;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `TYPEWISE_LOG=typewise=debug`
pub const LOG_ENV: &str = "TYPEWISE_LOG";
const DEFAULT_FILTER: &str = "info";

static TRACING_GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);

/// Send tracing output to a daily-rolling file in `dir`. The terminal belongs
/// to the TUI, so nothing is written to stdout or stderr.
///
/// Returns false if a global subscriber was already installed.
pub fn init(dir: &Path) -> bool {
    let file_appender = tracing_appender::rolling::daily(dir, "typewise.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        store_tracing_guard(guard);
        tracing::info!(dir = %dir.display(), "tracing initialized");
    }
    installed
}

fn store_tracing_guard(guard: WorkerGuard) {
    if let Ok(mut slot) = TRACING_GUARD.lock() {
        *slot = Some(guard);
    }
}

/// Flush buffered log lines; call before the process exits.
pub fn shutdown() {
    if let Ok(mut slot) = TRACING_GUARD.lock() {
        slot.take();
    }
}
