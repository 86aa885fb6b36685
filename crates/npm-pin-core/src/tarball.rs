//! npm tarball URL construction.
//!
//! npm serves every published version of a package at
//! `<registry>/<package>/-/<basename>-<version>.tgz`, where `<basename>` is the
//! package name without its `@scope/` prefix.

use anyhow::{bail, Context, Result};

/// Public npm registry.
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Where tarballs are fetched from: a registry base URL and a package name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarballSpec {
    registry: String,
    package: String,
}

impl TarballSpec {
    /// Validates `registry` as an absolute http(s) URL and keeps it without a
    /// trailing slash.
    pub fn new(registry: &str, package: &str) -> Result<Self> {
        let parsed = url::Url::parse(registry)
            .with_context(|| format!("invalid registry URL {:?}", registry))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            bail!("registry URL must be http or https, got {:?}", registry);
        }
        if package.is_empty() {
            bail!("package name is empty");
        }
        Ok(Self {
            registry: registry.trim_end_matches('/').to_string(),
            package: package.to_string(),
        })
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Tarball URL for `version`. The version is inserted verbatim.
    pub fn url_for(&self, version: &str) -> String {
        format!(
            "{}/{}/-/{}-{}.tgz",
            self.registry,
            self.package,
            unscoped(&self.package),
            version
        )
    }
}

/// `@scope/name` -> `name`; unscoped names are returned unchanged.
fn unscoped(package: &str) -> &str {
    match package.strip_prefix('@') {
        Some(rest) => rest.split_once('/').map(|(_, name)| name).unwrap_or(rest),
        None => package,
    }
}

/// Bazel repository name derived from a package name:
/// `esbuild-linux-arm64` -> `esbuild_linux_arm64`,
/// `@esbuild/linux-arm64` -> `esbuild_linux_arm64`.
pub fn default_archive_name(package: &str) -> String {
    package
        .trim_start_matches('@')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
