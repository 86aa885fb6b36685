//! Rendering of the Bazel `http_archive` block for a pinned tarball.

use crate::pin::Pin;

/// Fixed parts of the emitted `http_archive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTemplate {
    pub name: String,
    pub strip_prefix: String,
    pub build_file_content: String,
}

impl ArchiveTemplate {
    /// Renders the block, newline-terminated. Only `pin.url` and `pin.sha256`
    /// vary between versions.
    pub fn render(&self, pin: &Pin) -> String {
        format!(
            concat!(
                "http_archive(\n",
                "    name = \"{name}\",\n",
                "    urls = [\n",
                "        \"{url}\",\n",
                "    ],\n",
                "    strip_prefix = \"{strip_prefix}\",\n",
                "    build_file_content = \"\"\"{build}\"\"\",\n",
                "    sha256 = \"{sha256}\",\n",
                ")\n",
            ),
            name = self.name,
            url = pin.url,
            strip_prefix = self.strip_prefix,
            build = self.build_file_content,
            sha256 = pin.sha256,
        )
    }
}
