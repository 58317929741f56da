//! Logging Infrastructure
//!
//! - console output, pretty for development or JSON for production
//! - optional daily rotating file output (`lookbook.YYYY-MM-DD`, 14 files kept)
//!
//! `RUST_LOG` overrides the level passed in.

use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, prelude::*};

/// Rotated log files kept on disk
const MAX_LOG_FILES: usize = 14;

/// Log file prefix
const LOG_FILE_PREFIX: &str = "lookbook";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the logging system
///
/// # Arguments
/// * `level` - Log level (e.g., "info", "debug", "lookbook_client=trace")
/// * `json_format` - JSON console output instead of pretty
/// * `log_dir` - Optional directory for daily rotating JSON logs
///
/// Fails if a global subscriber is already installed.
pub fn init_logger(level: &str, json_format: bool, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if json_format {
        layers.push(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        );
    } else {
        layers.push(fmt::layer().with_target(true).with_thread_ids(false).boxed());
    }

    if let Some(dir) = log_dir {
        layers.push(file_layer(dir)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

/// Daily rotating JSON file layer under `dir`
fn file_layer(dir: &Path) -> anyhow::Result<BoxedLayer> {
    fs::create_dir_all(dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)?;

    Ok(fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(appender))
        .boxed())
}
