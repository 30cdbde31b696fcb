use std::error::Error;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/** create a non blocking tracing file appender writing to `<dir>/<who>.log` */
pub fn setup_file_appender<P: AsRef<Path>>(dir: P, who: &str) -> (NonBlocking, WorkerGuard) {
    let file_appender = rolling::never(dir.as_ref(), format!("{}.log", who));

    tracing_appender::non_blocking(file_appender)
}

/** create a RUST_LOG env based log filter, falling back to `default_level` */
pub fn env_filter(default_level: LevelFilter) -> EnvFilter {
    EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy()
}

/**
 * Initialize tracing-subscriber with env filter based on RUST_LOG env variable.
 * fmt layer is used to print logs to stderr, keeping stdout for command output.
 * When `log_dir` is given, a second fmt layer writes to a log file there.
 * `log` records from the library crates are bridged into tracing.
 */
pub fn init_tracing_subscriber(
    log_dir: Option<&Path>,
    who: &str,
    default_level: LevelFilter,
) -> Result<LogGuard, Box<dyn Error>> {
    let format = fmt::format()
        .with_level(true)
        .with_ansi(true)
        .with_target(false)
        .with_source_location(true)
        .compact();

    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            let (file_writer, guard) = setup_file_appender(dir, who);
            let layer = fmt::layer()
                .event_format(format.clone().with_ansi(false))
                .with_writer(file_writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    let stderr_layer = fmt::layer().event_format(format).with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(env_filter(default_level));

    match subscriber.try_init() {
        Ok(_) => Ok(LogGuard { _file_appender_guard: file_guard }),
        Err(err) => Err(Box::new(err)),
    }
}

/// Keeps the file appender worker alive; dropping it flushes pending lines
pub struct LogGuard {
    _file_appender_guard: Option<WorkerGuard>,
}
