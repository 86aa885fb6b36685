//! In-place update of a pinned `http_archive` inside a `.bzl` file.
//!
//! Finds the `http_archive(...)` call whose `name` matches, then rewrites the
//! first entry of its `urls` list and its `sha256` value. The rest of the file
//! is kept byte-for-byte. The scanner understands just enough Starlark to
//! skip strings (including `"""` strings) and `#` comments while matching
//! brackets.

use crate::pin::Pin;
use crate::snippet::ArchiveTemplate;
use anyhow::{Context, Result};
use std::fs;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BzlError {
    #[error("no http_archive with name = {0:?}")]
    NotFound(String),
    #[error("http_archive {0:?} has no sha256 attribute")]
    MissingSha256(String),
    #[error("http_archive {0:?} has no urls list")]
    MissingUrls(String),
    #[error("unterminated string or call starting at byte {0}")]
    Unterminated(usize),
}

/// String-valued keyword arguments and the first `urls` entry of one call.
/// Ranges are absolute byte offsets of the string contents, without quotes.
#[derive(Debug, Default)]
struct ArchiveCall {
    attrs: Vec<(String, Range<usize>)>,
    first_url: Option<Range<usize>>,
}

impl ArchiveCall {
    fn attr<'a>(&self, text: &'a str, key: &str) -> Option<(&'a str, Range<usize>)> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, r)| (&text[r.clone()], r.clone()))
    }
}

/// Returns `text` with the matching archive's url and sha256 replaced.
///
/// A url written as a format template (`"...-%s.tgz" % version`) is left
/// alone; only the checksum changes.
pub fn update_bzl(text: &str, pin: &Pin, template: &ArchiveTemplate) -> Result<String, BzlError> {
    let name = template.name.as_str();
    let call = find_archive(text, name)?.ok_or_else(|| BzlError::NotFound(name.to_string()))?;

    let (_, sha_range) = call
        .attr(text, "sha256")
        .ok_or_else(|| BzlError::MissingSha256(name.to_string()))?;
    let url_range = call
        .first_url
        .clone()
        .ok_or_else(|| BzlError::MissingUrls(name.to_string()))?;

    let mut edits = vec![(sha_range, pin.sha256.as_str())];
    let current_url = &text[url_range.clone()];
    if current_url.contains("%s") || current_url.contains("{version}") {
        tracing::debug!("keeping templated url {:?}", current_url);
    } else {
        edits.push((url_range, pin.url.as_str()));
    }

    // Apply back to front so earlier offsets stay valid.
    edits.sort_by_key(|(r, _)| std::cmp::Reverse(r.start));
    let mut out = text.to_string();
    for (range, replacement) in edits {
        out.replace_range(range, replacement);
    }
    Ok(out)
}

/// Reads `path`, updates the matching archive, and writes the file back.
pub fn update_bzl_file(path: &Path, pin: &Pin, template: &ArchiveTemplate) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let updated =
        update_bzl(&text, pin, template).with_context(|| format!("update {}", path.display()))?;
    if updated == text {
        tracing::info!("{} already pinned to {}", path.display(), pin.sha256);
        return Ok(());
    }
    let tmp = path.with_extension("bzl.tmp");
    fs::write(&tmp, updated).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename to {}", path.display()))?;
    tracing::info!("updated {} to {}", path.display(), pin.url);
    Ok(())
}

/// Walks the file token by token so that `http_archive` inside a comment or a
/// string literal never counts as a call.
fn find_archive(text: &str, name: &str) -> Result<Option<ArchiveCall>, BzlError> {
    const CALLEE: &[u8] = b"http_archive";
    let b = text.as_bytes();
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'#' => {
                while i < b.len() && b[i] != b'\n' {
                    i += 1;
                }
            }
            b'"' | b'\'' => i = read_string(b, i)?.1,
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let start = i;
                while i < b.len() && is_ident_byte(b[i]) {
                    i += 1;
                }
                if &b[start..i] != CALLEE {
                    continue;
                }
                let mut open = i;
                while open < b.len() && b[open].is_ascii_whitespace() {
                    open += 1;
                }
                if b.get(open) != Some(&b'(') {
                    continue;
                }
                let (call, end) = scan_call(b, open)?;
                if call.attr(text, "name").map(|(v, _)| v) == Some(name) {
                    return Ok(Some(call));
                }
                i = end;
            }
            _ => i += 1,
        }
    }
    Ok(None)
}

/// Scans a call whose `(` is at `open`. Returns the call and the offset just
/// past its closing `)`.
fn scan_call(b: &[u8], open: usize) -> Result<(ArchiveCall, usize), BzlError> {
    let mut call = ArchiveCall::default();
    let mut depth = 1usize;
    let mut pending_key: Option<String> = None;
    let mut in_urls = false;
    let mut i = open + 1;

    while i < b.len() {
        let c = b[i];
        match c {
            b'#' => {
                while i < b.len() && b[i] != b'\n' {
                    i += 1;
                }
            }
            b'"' | b'\'' => {
                let (content, next) = read_string(b, i)?;
                if depth == 1 {
                    if let Some(key) = pending_key.take() {
                        call.attrs.push((key, content));
                    }
                } else if depth == 2 && in_urls && call.first_url.is_none() {
                    call.first_url = Some(content);
                }
                i = next;
            }
            b'(' | b'[' | b'{' => {
                if depth == 1 {
                    in_urls = c == b'[' && pending_key.as_deref() == Some("urls");
                    pending_key = None;
                }
                depth += 1;
                i += 1;
            }
            b')' | b']' | b'}' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Ok((call, i));
                }
                if depth == 1 {
                    in_urls = false;
                }
            }
            c if depth == 1 && (c.is_ascii_alphabetic() || c == b'_') => {
                let start = i;
                while i < b.len() && is_ident_byte(b[i]) {
                    i += 1;
                }
                let mut j = i;
                while j < b.len() && (b[j] == b' ' || b[j] == b'\t') {
                    j += 1;
                }
                if b.get(j) == Some(&b'=') && b.get(j + 1) != Some(&b'=') {
                    // Identifiers are ASCII.
                    pending_key = Some(String::from_utf8_lossy(&b[start..i]).into_owned());
                    i = j + 1;
                } else {
                    pending_key = None;
                }
            }
            c if c.is_ascii_whitespace() => i += 1,
            _ => {
                if depth == 1 {
                    pending_key = None;
                }
                i += 1;
            }
        }
    }
    Err(BzlError::Unterminated(open))
}

/// Reads a string literal starting at its opening quote. Returns the range of
/// its contents and the offset after the closing quote.
fn read_string(b: &[u8], start: usize) -> Result<(Range<usize>, usize), BzlError> {
    let quote = b[start];
    let triple = [quote, quote, quote];
    if b[start..].starts_with(&triple) {
        let body = start + 3;
        let len = b[body..]
            .windows(3)
            .position(|w| w == &triple[..])
            .ok_or(BzlError::Unterminated(start))?;
        return Ok((body..body + len, body + len + 3));
    }
    let mut i = start + 1;
    while i < b.len() {
        match b[i] {
            b'\\' => i += 2,
            c if c == quote => return Ok((start + 1..i, i + 1)),
            b'\n' => break,
            _ => i += 1,
        }
    }
    Err(BzlError::Unterminated(start))
}

fn is_ident_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PinConfig;

    const REPO_BZL: &str = r#"load("@bazel_tools//tools/build_defs/repo:http.bzl", "http_archive")

def esbuild_repositories():
    # amd64 build
    http_archive(
        name = "esbuild_linux_amd64",
        urls = [
            "https://registry.npmjs.org/esbuild-linux-64/-/esbuild-linux-64-0.14.1.tgz",
        ],
        strip_prefix = "package",
        build_file_content = """exports_files(["bin/esbuild"])""",
        sha256 = "1111111111111111111111111111111111111111111111111111111111111111",
    )
    http_archive(
        name = "esbuild_linux_arm64",
        urls = [
            "https://registry.npmjs.org/esbuild-linux-arm64/-/esbuild-linux-arm64-0.14.1.tgz",  # mirror below
            "https://mirror.example.com/esbuild-linux-arm64-0.14.1.tgz",
        ],
        strip_prefix = "package",
        build_file_content = """exports_files(["bin/esbuild"])""",
        sha256 = "2222222222222222222222222222222222222222222222222222222222222222",
    )
"#;

    fn new_pin() -> Pin {
        Pin {
            version: "0.15.18".to_string(),
            url: "https://registry.npmjs.org/esbuild-linux-arm64/-/esbuild-linux-arm64-0.15.18.tgz"
                .to_string(),
            sha256: "abababababababababababababababababababababababababababababababab".to_string(),
        }
    }

    #[test]
    fn updates_only_matching_archive() {
        let template = PinConfig::default().archive_template();
        let out = update_bzl(REPO_BZL, &new_pin(), &template).unwrap();

        assert!(out.contains("esbuild-linux-64-0.14.1.tgz"));
        assert!(out.contains("1111111111111111111111111111111111111111111111111111111111111111"));
        assert!(!out.contains("2222222222222222222222222222222222222222222222222222222222222222"));
        assert!(out.contains(
            "\"https://registry.npmjs.org/esbuild-linux-arm64/-/esbuild-linux-arm64-0.15.18.tgz\",  # mirror below"
        ));
        // Only the first url entry is touched.
        assert!(out.contains("https://mirror.example.com/esbuild-linux-arm64-0.14.1.tgz"));
        assert_eq!(out.lines().count(), REPO_BZL.lines().count());
    }

    #[test]
    fn update_is_idempotent() {
        let template = PinConfig::default().archive_template();
        let once = update_bzl(REPO_BZL, &new_pin(), &template).unwrap();
        let twice = update_bzl(&once, &new_pin(), &template).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn templated_url_kept() {
        let text = r#"http_archive(
    name = "esbuild_linux_arm64",
    urls = [
        "https://registry.npmjs.org/esbuild-linux-arm64/-/esbuild-linux-arm64-%s.tgz" % version,
    ],
    sha256 = "old",
)
"#;
        let template = PinConfig::default().archive_template();
        let out = update_bzl(text, &new_pin(), &template).unwrap();
        assert!(out.contains("-%s.tgz\" % version,"));
        assert!(out.contains(&format!("sha256 = \"{}\"", new_pin().sha256)));
    }

    #[test]
    fn missing_archive_errors() {
        let mut template = PinConfig::default().archive_template();
        template.name = "esbuild_darwin_arm64".to_string();
        assert_eq!(
            update_bzl(REPO_BZL, &new_pin(), &template),
            Err(BzlError::NotFound("esbuild_darwin_arm64".to_string()))
        );
    }

    #[test]
    fn missing_sha256_errors() {
        let text = "http_archive(name = \"esbuild_linux_arm64\", urls = [\"u\"])\n";
        let template = PinConfig::default().archive_template();
        assert_eq!(
            update_bzl(text, &new_pin(), &template),
            Err(BzlError::MissingSha256("esbuild_linux_arm64".to_string()))
        );
    }

    #[test]
    fn missing_urls_errors() {
        let text = "http_archive(name = \"esbuild_linux_arm64\", url = \"u\", sha256 = \"x\")\n";
        let template = PinConfig::default().archive_template();
        assert_eq!(
            update_bzl(text, &new_pin(), &template),
            Err(BzlError::MissingUrls("esbuild_linux_arm64".to_string()))
        );
    }

    #[test]
    fn name_inside_string_does_not_match() {
        let text = r#"http_archive(
    name = "other",
    build_file_content = """name = "esbuild_linux_arm64" """,
    urls = ["u"],
    sha256 = "x",
)
"#;
        let template = PinConfig::default().archive_template();
        assert!(matches!(
            update_bzl(text, &new_pin(), &template),
            Err(BzlError::NotFound(_))
        ));
    }

    #[test]
    fn commented_out_archive_is_skipped() {
        let text = r#"# http_archive(name = "esbuild_linux_arm64", urls = ["old-url"], sha256 = "old")
http_archive(
    name = "esbuild_linux_arm64",
    urls = ["live-url"],
    sha256 = "live",
)
"#;
        let template = PinConfig::default().archive_template();
        let out = update_bzl(text, &new_pin(), &template).unwrap();
        assert!(out.starts_with(
            "# http_archive(name = \"esbuild_linux_arm64\", urls = [\"old-url\"], sha256 = \"old\")\n"
        ));
        assert!(out.contains(&format!("urls = [\"{}\"]", new_pin().url)));
        assert!(out.contains(&format!("sha256 = \"{}\"", new_pin().sha256)));
        assert!(!out.contains("live"));
    }

    #[test]
    fn archive_inside_string_is_skipped() {
        let text = r#"DOC = "http_archive(name = 'esbuild_linux_arm64', urls = ['doc'], sha256 = 'doc')"
http_archive(name = "esbuild_linux_arm64", urls = ["live-url"], sha256 = "live")
"#;
        let template = PinConfig::default().archive_template();
        let out = update_bzl(text, &new_pin(), &template).unwrap();
        assert!(out.contains("urls = ['doc'], sha256 = 'doc'"));
        assert!(!out.contains("live"));
    }

    #[test]
    fn commented_out_only_is_not_found() {
        let text = "# http_archive(name = \"esbuild_linux_arm64\", urls = [\"u\"], sha256 = \"x\")\n";
        let template = PinConfig::default().archive_template();
        assert!(matches!(
            update_bzl(text, &new_pin(), &template),
            Err(BzlError::NotFound(_))
        ));
    }

    #[test]
    fn unterminated_call_errors() {
        let text = "http_archive(\n    name = \"esbuild_linux_arm64\",\n";
        let template = PinConfig::default().archive_template();
        assert!(matches!(
            update_bzl(text, &new_pin(), &template),
            Err(BzlError::Unterminated(_))
        ));
    }

    #[test]
    fn update_file_rewrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("esbuild_repo.bzl");
        fs::write(&path, REPO_BZL).unwrap();
        let template = PinConfig::default().archive_template();
        update_bzl_file(&path, &new_pin(), &template).unwrap();
        let out = fs::read_to_string(&path).unwrap();
        assert!(out.contains(&new_pin().sha256));
        assert!(!dir.path().join("esbuild_repo.bzl.tmp").exists());
    }
}
