//! Logging init: append to a file under the XDG state dir, or stderr when that
//! file cannot be opened.
//!
//! Stdout carries the generated snippet, so no sink here ever targets it.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,npm_pin_core=debug,npm_pin=debug";

/// Where log lines end up after [`init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    File(PathBuf),
    Stderr,
}

/// `~/.local/state/npm-pin/npm-pin.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("npm-pin")?;
    Ok(xdg_dirs.get_state_home().join("npm-pin.log"))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))
}

/// Installs the global subscriber. Filter comes from `RUST_LOG`, else
/// `DEFAULT_FILTER`. A second call is a no-op.
pub fn init() -> LogSink {
    let opened = log_file_path().and_then(|path| open_log_file(&path).map(|file| (path, file)));
    match opened {
        Ok((path, file)) => {
            install(BoxMakeWriter::new(Mutex::new(file)));
            tracing::debug!("npm-pin logging to {}", path.display());
            LogSink::File(path)
        }
        Err(err) => {
            install(BoxMakeWriter::new(io::stderr));
            tracing::warn!("file logging unavailable: {:#}", err);
            LogSink::Stderr
        }
    }
}

fn install(writer: BoxMakeWriter) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
}
