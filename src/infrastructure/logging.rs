use std::io;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::{config::AppConfig, infrastructure::directories::ResolvedPaths};

/// Console output goes to stderr; stdout is reserved for move actions.
///
/// File output is flushed when the returned guard is dropped.
pub fn init_tracing(config: &AppConfig, paths: &ResolvedPaths) -> Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::daily(&paths.logs_dir, "autofile.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_ansi(true);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        target: "lifecycle",
        logs = %paths.logs_dir.display(),
        classifier_enabled = config.classifier.enabled,
        "tracing initialized"
    );
    Ok(guard)
}
