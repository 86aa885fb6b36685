pub mod config;
pub mod logging;

pub mod bzl;
pub mod checksum;
pub mod fetch;
pub mod pin;
pub mod retry;
pub mod snippet;
pub mod tarball;
