// Copyright (c) 2026 rezky_nightky

//! The alternate screen owns stdout, so diagnostics go to a file.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_NAME: &str = "hollowterm.log";

/// `RUST_LOG` if set and valid, `info` otherwise.
pub fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn build_subscriber(file: File, filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(false);
    tracing_subscriber::registry().with(fmt_layer).with(filter)
}

/// Appends to `path`, creating parent directories as needed.
pub fn init(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    build_subscriber(file, default_filter())
        .try_init()
        .context("installing tracing subscriber")?;
    Ok(())
}
