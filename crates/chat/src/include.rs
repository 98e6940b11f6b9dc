//! Include resolver: expands file and glob references into content parts.
//!
//! Each line of an include block is one path spec:
//!
//! ```text
//! >>> include
//!
//! src/main.rs
//! ~/notes/todo.md
//! docs/**/*.md
//! screenshots/*.png
//! ```
//!
//! - Specs containing `*`, `?` or `[` are globbed (`**` recurses); matches
//!   come back in lexical path order. Wildcards never match a leading `.`,
//!   so hidden files are only included when named. Other specs are literal
//!   paths.
//! - Relative specs resolve against the resolver's base directory but keep
//!   their relative form in the rendered header.
//! - Images (by extension) become data-URI parts; UTF-8 files become
//!   `==> {path} <==\n{content}` text parts; anything else becomes a
//!   `Binary file, cannot display` placeholder.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use vimai_core::ContentPart;
use vimai_core::error::IncludeError;

/// Extensions treated as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Body used for files that cannot be shown as text.
pub const BINARY_PLACEHOLDER: &str = "Binary file, cannot display";

/// How an include target is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    Image,
    Text,
    Binary,
}

/// A file selected by a path spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeTarget {
    /// Path used for reading.
    pub path: PathBuf,
    /// Path shown in the `==> … <==` header.
    pub display: String,
}

/// Resolves include specs against a base directory.
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    base_dir: PathBuf,
}

impl IncludeResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolver rooted at the process working directory.
    pub fn from_current_dir() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve every non-blank line of an include block, in line order.
    pub fn resolve_block(&self, block: &str) -> Vec<ContentPart> {
        block
            .lines()
            .filter(|line| !line.trim().is_empty())
            .flat_map(|line| self.resolve(line))
            .collect()
    }

    /// Resolve one path spec. Unreadable files degrade to a placeholder part.
    pub fn resolve(&self, path_spec: &str) -> Vec<ContentPart> {
        let targets = match self.expand(path_spec) {
            Ok(targets) => targets,
            Err(e) => {
                warn!("Skipping include '{}': {e}", path_spec.trim());
                return Vec::new();
            }
        };

        targets
            .iter()
            .map(|target| {
                self.load(target).unwrap_or_else(|e| {
                    warn!("Include degraded to placeholder: {e}");
                    placeholder(&target.display)
                })
            })
            .collect()
    }

    /// Resolve one path spec, failing on the first unreadable file.
    pub fn resolve_strict(&self, path_spec: &str) -> Result<Vec<ContentPart>, IncludeError> {
        self.expand(path_spec)?
            .iter()
            .map(|target| self.load(target))
            .collect()
    }

    /// Expand a path spec into concrete file targets.
    pub fn expand(&self, path_spec: &str) -> Result<Vec<IncludeTarget>, IncludeError> {
        let spec = path_spec.trim();
        if spec.is_empty() {
            return Ok(Vec::new());
        }

        let expanded = expand_tilde(spec);
        let relative = Path::new(&expanded).is_relative();

        if !has_glob_meta(&expanded) {
            let path = if relative {
                self.base_dir.join(&expanded)
            } else {
                PathBuf::from(&expanded)
            };
            if path.is_dir() {
                debug!("Include '{}' is a directory, skipping", expanded);
                return Ok(Vec::new());
            }
            return Ok(vec![IncludeTarget {
                path,
                display: expanded,
            }]);
        }

        let pattern = if relative {
            let base = glob::Pattern::escape(&self.base_dir.to_string_lossy());
            format!("{}/{}", base.trim_end_matches('/'), expanded)
        } else {
            expanded.clone()
        };

        let options = glob::MatchOptions {
            require_literal_leading_dot: true,
            ..Default::default()
        };
        let entries = glob::glob_with(&pattern, options).map_err(|e| IncludeError::InvalidPattern {
            pattern: spec.to_string(),
            reason: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Glob entry unreadable: {e}");
                    None
                }
            })
            .filter(|path| !path.is_dir())
            .collect();
        paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        debug!(pattern = %pattern, matches = paths.len(), "Expanded include glob");

        Ok(paths
            .into_iter()
            .map(|path| {
                let display = if relative {
                    path.strip_prefix(&self.base_dir)
                        .unwrap_or(&path)
                        .display()
                        .to_string()
                } else {
                    path.display().to_string()
                };
                IncludeTarget { path, display }
            })
            .collect())
    }

    fn load(&self, target: &IncludeTarget) -> Result<ContentPart, IncludeError> {
        let bytes = std::fs::read(&target.path).map_err(|e| IncludeError::Unreadable {
            path: target.display.clone(),
            reason: e.to_string(),
        })?;

        Ok(match classify(&target.path, &bytes) {
            IncludeKind::Image => ContentPart::image(data_uri(&target.path, &bytes)),
            IncludeKind::Text => {
                let text = String::from_utf8_lossy(&bytes);
                ContentPart::text(format!(
                    "==> {} <==\n{}",
                    target.display,
                    strip_trailing_newline(&text)
                ))
            }
            IncludeKind::Binary => placeholder(&target.display),
        })
    }
}

/// Classify a file by extension, then by whether its bytes are UTF-8.
pub fn classify(path: &Path, bytes: &[u8]) -> IncludeKind {
    if is_image_path(path) {
        IncludeKind::Image
    } else if std::str::from_utf8(bytes).is_ok() {
        IncludeKind::Text
    } else {
        IncludeKind::Binary
    }
}

pub fn is_image_path(path: &Path) -> bool {
    image_extension(path).is_some()
}

fn image_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Read an image file into a `data:image/<ext>;base64,…` URI.
pub fn encode_image(path: &Path) -> Result<String, IncludeError> {
    let bytes = std::fs::read(path).map_err(|e| IncludeError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(data_uri(path, &bytes))
}

fn data_uri(path: &Path, bytes: &[u8]) -> String {
    let ext = image_extension(path).unwrap_or_else(|| "png".into());
    format!("data:image/{ext};base64,{}", STANDARD.encode(bytes))
}

fn placeholder(display: &str) -> ContentPart {
    ContentPart::text(format!("==> {display} <==\n{BINARY_PLACEHOLDER}"))
}

fn has_glob_meta(spec: &str) -> bool {
    spec.contains(['*', '?', '['])
}

fn strip_trailing_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

/// Expand ~ to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if (path.starts_with("~/") || path == "~")
        && let Ok(home) = home_dir()
    {
        return path.replacen('~', &home, 1);
    }
    path.to_string()
}

fn home_dir() -> Result<String, std::env::VarError> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn image_detection_is_case_insensitive() {
        assert!(is_image_path(Path::new("test.jpg")));
        assert!(is_image_path(Path::new("test.PNG")));
        assert!(is_image_path(Path::new("a/b/c.WebP")));
        assert!(!is_image_path(Path::new("test.txt")));
        assert!(!is_image_path(Path::new("jpg")));
    }

    #[test]
    fn text_file_gets_header_and_single_newline_stripped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", b"hello\n\n");
        let parts = IncludeResolver::new(dir.path()).resolve("a.txt");
        assert_eq!(parts, vec![ContentPart::text("==> a.txt <==\nhello\n")]);
    }

    #[test]
    fn binary_file_gets_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "blob.bin", &[0xff, 0xfe, 0x00, 0x9f]);
        let parts = IncludeResolver::new(dir.path()).resolve("blob.bin");
        assert_eq!(
            parts,
            vec![ContentPart::text("==> blob.bin <==\nBinary file, cannot display")]
        );
    }

    #[test]
    fn image_file_becomes_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "pic.PNG", b"image data\n");
        let parts = IncludeResolver::new(dir.path()).resolve("pic.PNG");
        assert_eq!(
            parts,
            vec![ContentPart::image("data:image/png;base64,aW1hZ2UgZGF0YQo=")]
        );
    }

    #[test]
    fn missing_literal_path_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let parts = IncludeResolver::new(dir.path()).resolve("nope.txt");
        assert_eq!(
            parts,
            vec![ContentPart::text("==> nope.txt <==\nBinary file, cannot display")]
        );
    }

    #[test]
    fn strict_mode_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = IncludeResolver::new(dir.path())
            .resolve_strict("nope.txt")
            .unwrap_err();
        match err {
            IncludeError::Unreadable { path, .. } => assert_eq!(path, "nope.txt"),
            other => panic!("Expected Unreadable, got: {other}"),
        }
    }

    #[test]
    fn recursive_glob_is_sorted_and_relative() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b/z.md", b"z");
        write(dir.path(), "a/deep/y.md", b"y");
        write(dir.path(), "a/x.md", b"x");
        write(dir.path(), "a/skip.txt", b"no");

        let parts = IncludeResolver::new(dir.path()).resolve("**/*.md");
        let texts: Vec<&str> = parts.iter().filter_map(ContentPart::as_text).collect();
        assert_eq!(
            texts,
            vec!["==> a/deep/y.md <==\ny", "==> a/x.md <==\nx", "==> b/z.md <==\nz"]
        );
    }

    #[test]
    fn glob_order_compares_path_strings() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/x.md", b"x");
        write(dir.path(), "a-b/y.md", b"y");

        let parts = IncludeResolver::new(dir.path()).resolve("**/*.md");
        let texts: Vec<&str> = parts.iter().filter_map(ContentPart::as_text).collect();
        assert_eq!(texts, vec!["==> a-b/y.md <==\ny", "==> a/x.md <==\nx"]);
    }

    #[test]
    fn wildcards_skip_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".env", b"SECRET=1");
        write(dir.path(), ".git/config", b"[core]");
        write(dir.path(), "a.txt", b"a");
        let resolver = IncludeResolver::new(dir.path());

        let texts: Vec<String> = resolver
            .resolve("**/*")
            .iter()
            .filter_map(|p| p.as_text().map(str::to_string))
            .collect();
        assert_eq!(texts, vec!["==> a.txt <==\na"]);

        assert_eq!(
            resolver.resolve(".env"),
            vec![ContentPart::text("==> .env <==\nSECRET=1")]
        );
        assert_eq!(resolver.resolve(".git/*").len(), 1);
    }

    #[test]
    fn absolute_glob_keeps_absolute_display() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "one.txt", b"1");
        let spec = format!("{}/*.txt", dir.path().display());
        let parts = IncludeResolver::new("/").resolve(&spec);
        assert_eq!(
            parts,
            vec![ContentPart::text(format!("==> {} <==\n1", file.display()))]
        );
    }

    #[test]
    fn glob_without_matches_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(IncludeResolver::new(dir.path()).resolve("*.rs").is_empty());
    }

    #[test]
    fn directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "sub/file.txt", b"f");
        let resolver = IncludeResolver::new(dir.path());
        assert!(resolver.resolve("sub").is_empty());
        assert_eq!(resolver.resolve("*").len(), 0);
    }

    #[test]
    fn block_lines_resolve_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "2.txt", b"two");
        write(dir.path(), "1.txt", b"one");
        let parts = IncludeResolver::new(dir.path()).resolve_block("2.txt\n\n  1.txt  \n");
        assert_eq!(
            parts,
            vec![
                ContentPart::text("==> 2.txt <==\ntwo"),
                ContentPart::text("==> 1.txt <==\none"),
            ]
        );
    }

    #[test]
    fn encode_missing_image_fails() {
        assert!(encode_image(Path::new("/nonexistent/image.jpg")).is_err());
    }

    #[test]
    fn classify_by_extension_then_content() {
        assert_eq!(classify(Path::new("x.gif"), &[0xff]), IncludeKind::Image);
        assert_eq!(classify(Path::new("x.txt"), b"ok"), IncludeKind::Text);
        assert_eq!(classify(Path::new("x.txt"), &[0xc3, 0x28]), IncludeKind::Binary);
    }
}
