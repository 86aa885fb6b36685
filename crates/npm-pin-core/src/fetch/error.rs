//! Error type for a single tarball GET, kept typed so the retry policy can
//! classify it before it is converted to `anyhow`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (DNS, connect, timeout, TLS, ...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Response had a non-2xx status; 404 usually means the version is not published.
    #[error("HTTP {0}")]
    Http(u32),
    /// 2xx response with no body. Hashing it would pin a bogus checksum.
    #[error("empty response body")]
    Empty,
}
