use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::utils::get_data_dir;

pub const LOG_ENV: &str = "LEXED_LOG";
pub const LOG_FILE_NAME: &str = "lexed.log";

const DEFAULT_DIRECTIVES: &str = "lexed=info";

/// Sends tracing output to `lexed.log` in the data dir; the terminal belongs
/// to the CLI output and the practice screen. Keep the guard alive until
/// exit so buffered lines are flushed.
pub fn init_logging() -> Result<WorkerGuard> {
    let data_dir = get_data_dir()?;
    let appender = tracing_appender::rolling::never(&data_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
        .context("Failed to install the log subscriber")?;

    Ok(guard)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}
