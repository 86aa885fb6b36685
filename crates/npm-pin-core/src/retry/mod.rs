//! Retry and backoff policy for the tarball GET.
//!
//! Error classification (timeouts, throttling, connection failures) and
//! exponential backoff decisions. The default policy makes one attempt.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
