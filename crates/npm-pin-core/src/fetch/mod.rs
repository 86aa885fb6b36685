//! Blocking HTTP GET of a whole tarball into memory.
//!
//! Uses the curl crate (libcurl) with a single Easy handle. Redirects are
//! followed; any status outside 2xx is an error.

mod error;

pub use error::FetchError;

use crate::config::PinConfig;
use std::time::Duration;

const MAX_REDIRECTIONS: u32 = 10;
const USER_AGENT: &str = concat!("npm-pin/", env!("CARGO_PKG_VERSION"));

/// Curl timeouts for the GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(300),
        }
    }
}

impl From<&PinConfig> for FetchOptions {
    fn from(cfg: &PinConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

/// GETs `url` and returns the full response body.
pub fn get(url: &str, opts: &FetchOptions) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.useragent(USER_AGENT)?;
    easy.follow_location(true)?;
    easy.max_redirections(MAX_REDIRECTIONS)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    tracing::debug!("GET {} -> HTTP {} ({} bytes)", url, code, body.len());
    if !(200..300).contains(&code) {
        return Err(FetchError::Http(code));
    }
    if body.is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(body)
}
