use anyhow::Result;
use npm_pin_core::bzl;
use npm_pin_core::pin::Pin;
use npm_pin_core::snippet::ArchiveTemplate;
use std::path::Path;

/// Rewrite the matching http_archive in `path` and report it on stderr.
pub fn run_update(path: &Path, pin: &Pin, template: &ArchiveTemplate) -> Result<()> {
    bzl::update_bzl_file(path, pin, template)?;
    eprintln!(
        "{}: {} -> {} (sha256 {})",
        path.display(),
        template.name,
        pin.version,
        pin.sha256
    );
    Ok(())
}
