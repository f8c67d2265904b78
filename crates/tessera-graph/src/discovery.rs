//! Content record discovery.
//!
//! Walks the content path, keeps regular files whose path relative to the
//! content root matches the extractor's glob, and returns them sorted so
//! repeated builds over unchanged input see records in the same order.

use regex::Regex;
use std::path::{Path, PathBuf};
use tessera_core::{Error, Result};
use tracing::debug;
use walkdir::WalkDir;

/// A compiled `content_pattern` glob.
///
/// Supports `**` (any depth, including none when followed by `/`), `*`
/// (within one path segment) and `?` (one character). Matching is against
/// `/`-separated paths relative to the content root.
#[derive(Debug, Clone)]
pub struct ContentPattern {
    glob: String,
    regex: Regex,
}

impl ContentPattern {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the glob cannot be compiled.
    pub fn new(glob: &str) -> Result<Self> {
        let escaped = regex::escape(glob)
            .replace(r"\*\*/", "(?:.*/)?")
            .replace(r"\*\*", ".*")
            .replace(r"\*", "[^/]*")
            .replace(r"\?", "[^/]");
        let regex = Regex::new(&format!("^{escaped}$"))
            .map_err(|e| Error::config(format!("invalid content pattern '{glob}': {e}")))?;
        Ok(Self {
            glob: glob.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.glob
    }

    /// Whether `relative` (relative to the content root) is selected.
    #[must_use]
    pub fn matches(&self, relative: &Path) -> bool {
        let normalized: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        self.regex.is_match(&normalized.join("/"))
    }
}

/// All records under `content_path` selected by `pattern`, sorted.
///
/// Hidden files and directories (leading `.`) are skipped; symlinks are not
/// followed.
///
/// # Errors
///
/// Returns a path-tagged [`Error::Io`] if `content_path` is missing or a
/// directory cannot be read.
pub fn discover_records(content_path: &Path, pattern: &ContentPattern) -> Result<Vec<PathBuf>> {
    if !content_path.is_dir() {
        return Err(Error::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "content path is not a directory"),
            content_path,
        ));
    }

    let mut records = Vec::new();
    let walker = WalkDir::new(content_path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(content_path).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            Error::io_with_path(source, path)
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(content_path) else {
            continue;
        };
        if pattern.matches(relative) {
            records.push(entry.into_path());
        }
    }

    records.sort();
    debug!(
        content_path = %content_path.display(),
        pattern = pattern.as_str(),
        count = records.len(),
        "discovered content records"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn double_star_matches_any_depth_including_root() {
        let p = ContentPattern::new("**/*.md").unwrap();
        assert!(p.matches(Path::new("a.md")));
        assert!(p.matches(Path::new("x/y/z.md")));
        assert!(!p.matches(Path::new("x/y/z.txt")));
    }

    #[test]
    fn single_star_stays_in_segment() {
        let p = ContentPattern::new("concepts/*.md").unwrap();
        assert!(p.matches(Path::new("concepts/a.md")));
        assert!(!p.matches(Path::new("concepts/deep/a.md")));
        assert!(!p.matches(Path::new("other/a.md")));
    }

    #[test]
    fn default_pattern_selects_everything() {
        let p = ContentPattern::new("**/*").unwrap();
        assert!(p.matches(Path::new("README")));
        assert!(p.matches(Path::new("a/b/c.json")));
    }

    #[test]
    fn discovery_is_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.md");
        touch(dir.path(), "a.md");
        touch(dir.path(), "nested/c.md");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), ".hidden/d.md");

        let p = ContentPattern::new("**/*.md").unwrap();
        let found = discover_records(dir.path(), &p).unwrap();
        let rel: Vec<_> = found
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("a.md"),
                PathBuf::from("b.md"),
                PathBuf::from("nested/c.md")
            ]
        );
    }

    #[test]
    fn missing_content_path_is_io_error() {
        let p = ContentPattern::new("**/*").unwrap();
        let err = discover_records(Path::new("/no/such/content"), &p).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("/no/such/content"));
    }
}
