//! CLI for npm-pin.

mod commands;

use anyhow::Result;
use clap::Parser;
use npm_pin_core::config::{self, PinConfig};
use npm_pin_core::pin::Pinner;
use std::io;
use std::path::PathBuf;

use commands::{run_print, run_update};

/// Pin an npm tarball: download it, SHA-256 it, and print an http_archive block.
#[derive(Debug, Parser)]
#[command(name = "npm-pin")]
#[command(about = "Print a pinned Bazel http_archive for an npm tarball", long_about = None)]
pub struct Cli {
    /// Package version to pin, used verbatim in the URL (e.g. 0.15.18).
    pub version: String,

    /// npm package to pin (default from config: esbuild-linux-arm64).
    #[arg(long)]
    pub package: Option<String>,

    /// http_archive name (default: derived from the package name).
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Registry base URL (default from config: https://registry.npmjs.org).
    #[arg(long, value_name = "URL")]
    pub registry: Option<String>,

    /// Hash this local tarball instead of downloading it.
    #[arg(long, value_name = "PATH")]
    pub from_file: Option<PathBuf>,

    /// Rewrite url and sha256 of the matching http_archive in this .bzl file instead of printing.
    #[arg(long, value_name = "FILE")]
    pub update: Option<PathBuf>,

    /// Read configuration from this file instead of ~/.config/npm-pin/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        Cli::parse().run()
    }

    pub fn run(self) -> Result<()> {
        let cfg = self.load_config()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let pinner = Pinner::from_config(&cfg)?;
        let template = cfg.archive_template();
        let pin = match &self.from_file {
            Some(path) => pinner.from_file(&self.version, path)?,
            None => pinner.fetch(&self.version)?,
        };

        match &self.update {
            Some(path) => run_update(path, &pin, &template),
            None => run_print(&mut io::stdout().lock(), &pin, &template),
        }
    }

    fn load_config(&self) -> Result<PinConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        self.apply_overrides(&mut cfg);
        Ok(cfg)
    }

    /// Flags win over the config file. A new `--package` drops a configured
    /// archive name so the name follows the package unless `--name` is given.
    fn apply_overrides(&self, cfg: &mut PinConfig) {
        if let Some(registry) = &self.registry {
            cfg.registry = registry.clone();
        }
        if let Some(package) = &self.package {
            cfg.package = package.clone();
            cfg.archive_name = None;
        }
        if let Some(name) = &self.name {
            cfg.archive_name = Some(name.clone());
        }
    }
}

#[cfg(test)]
mod tests;
