use anyhow::{Context, Result};
use npm_pin_core::pin::Pin;
use npm_pin_core::snippet::ArchiveTemplate;
use std::io::Write;

/// Write the http_archive block for `pin` to `out`.
pub fn run_print(out: &mut impl Write, pin: &Pin, template: &ArchiveTemplate) -> Result<()> {
    out.write_all(template.render(pin).as_bytes())
        .and_then(|()| out.flush())
        .context("write snippet")
}
