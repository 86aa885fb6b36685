//! Fetch-and-checksum: build the tarball URL for a version, download it,
//! and hash the bytes.

use crate::checksum;
use crate::config::PinConfig;
use crate::fetch::{self, FetchOptions};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::tarball::TarballSpec;
use anyhow::{Context, Result};
use std::path::Path;

/// A version pinned to its tarball URL and SHA-256.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub version: String,
    pub url: String,
    /// Lowercase hex.
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct Pinner {
    spec: TarballSpec,
    fetch: FetchOptions,
    retry: RetryPolicy,
}

impl Pinner {
    pub fn new(spec: TarballSpec, fetch: FetchOptions, retry: RetryPolicy) -> Self {
        Self { spec, fetch, retry }
    }

    pub fn from_config(cfg: &PinConfig) -> Result<Self> {
        Ok(Self::new(
            cfg.tarball_spec()?,
            FetchOptions::from(cfg),
            RetryPolicy::from_config(cfg.retry.as_ref())?,
        ))
    }

    /// Downloads the tarball for `version` and hashes it.
    ///
    /// Fails on any transport error or non-2xx status (an unpublished version
    /// is a 404); no `Pin` is produced in that case.
    pub fn fetch(&self, version: &str) -> Result<Pin> {
        let url = self.spec.url_for(version);
        tracing::info!("fetching {}", url);
        let body = run_with_retry(&self.retry, || fetch::get(&url, &self.fetch))
            .with_context(|| format!("GET {}", url))?;
        let sha256 = checksum::sha256_bytes(&body);
        tracing::info!("{} bytes, sha256={}", body.len(), sha256);
        Ok(Pin {
            version: version.to_string(),
            url,
            sha256,
        })
    }

    /// Hashes an already-downloaded tarball; the URL is still the one `version`
    /// maps to.
    pub fn from_file(&self, version: &str, path: &Path) -> Result<Pin> {
        let url = self.spec.url_for(version);
        let sha256 = checksum::sha256_path(path)?;
        tracing::info!("hashed {} for {}, sha256={}", path.display(), url, sha256);
        Ok(Pin {
            version: version.to_string(),
            url,
            sha256,
        })
    }
}
