use crate::retry::RetryPolicy;
use crate::snippet::ArchiveTemplate;
use crate::tarball::{self, TarballSpec, DEFAULT_REGISTRY};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

/// Global configuration loaded from `~/.config/npm-pin/config.toml`.
/// Missing keys take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    /// Registry base URL.
    pub registry: String,
    /// npm package whose tarball is pinned.
    pub package: String,
    /// `name` of the http_archive; derived from `package` when unset.
    pub archive_name: Option<String>,
    /// `strip_prefix` of the http_archive (npm tarballs unpack into `package/`).
    pub strip_prefix: String,
    /// Body of the generated BUILD file.
    pub build_file_content: String,
    /// Connect timeout for the GET, in seconds.
    pub connect_timeout_secs: u64,
    /// Overall timeout for the GET, in seconds.
    pub timeout_secs: u64,
    /// Optional retry policy; if missing, a single attempt is made.
    pub retry: Option<RetryConfig>,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY.to_string(),
            package: "esbuild-linux-arm64".to_string(),
            archive_name: None,
            strip_prefix: "package".to_string(),
            build_file_content: r#"exports_files(["bin/esbuild"])"#.to_string(),
            connect_timeout_secs: 30,
            timeout_secs: 300,
            retry: None,
        }
    }
}

impl PinConfig {
    pub fn tarball_spec(&self) -> Result<TarballSpec> {
        TarballSpec::new(&self.registry, &self.package)
    }

    pub fn archive_template(&self) -> ArchiveTemplate {
        ArchiveTemplate {
            name: self
                .archive_name
                .clone()
                .unwrap_or_else(|| tarball::default_archive_name(&self.package)),
            strip_prefix: self.strip_prefix.clone(),
            build_file_content: self.build_file_content.clone(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("npm-pin")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PinConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PinConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path. The file must exist.
pub fn load_from(path: &Path) -> Result<PinConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: PinConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    cfg.tarball_spec()
        .with_context(|| format!("invalid config {}", path.display()))?;
    RetryPolicy::from_config(cfg.retry.as_ref())
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
