//! Content fingerprints for cache freshness.
//!
//! A fingerprint summarises the record set a graph was built from. It is a
//! BLAKE3 hash over the sorted records' relative paths plus either their
//! `(size, mtime_ns)` metadata or their full bytes, rendered as
//! `blake3:<hex>`. Any added, removed, renamed or modified record changes it.

use crate::discovery::{ContentPattern, discover_records};
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tessera_core::config::FingerprintMode;
use tessera_core::{Error, Result};
use tracing::instrument;

const PREFIX: &str = "blake3:";

/// Fingerprint the given record files. `records` need not be sorted.
///
/// Paths are hashed relative to `content_path` so moving the whole content
/// tree does not invalidate a cache.
///
/// # Errors
///
/// Returns a path-tagged [`Error::Io`] if a record's metadata (or, in
/// [`FingerprintMode::Contents`], its bytes) cannot be read.
pub fn fingerprint_records(
    content_path: &Path,
    records: &[impl AsRef<Path>],
    mode: FingerprintMode,
) -> Result<String> {
    let mut sorted: Vec<&Path> = records.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut hasher = blake3::Hasher::new();
    for path in sorted {
        let relative = path.strip_prefix(content_path).unwrap_or(path);
        hasher.update(relative.to_string_lossy().as_bytes());
        hasher.update(b"\x00");

        match mode {
            FingerprintMode::Metadata => {
                let meta = fs::metadata(path).map_err(|e| Error::io_with_path(e, path))?;
                let mtime_ns = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map_or(0, |d| d.as_nanos());
                hasher.update(&meta.len().to_le_bytes());
                hasher.update(&mtime_ns.to_le_bytes());
            }
            FingerprintMode::Contents => {
                let bytes = fs::read(path).map_err(|e| Error::io_with_path(e, path))?;
                hasher.update(&(bytes.len() as u64).to_le_bytes());
                hasher.update(&bytes);
            }
        }
        hasher.update(b"\n");
    }

    Ok(format!("{PREFIX}{}", hasher.finalize().to_hex()))
}

/// Discover the records `pattern` selects under `content_path` and
/// fingerprint them.
///
/// # Errors
///
/// Propagates discovery and file-access failures.
#[instrument(skip(pattern), fields(pattern = pattern.as_str()))]
pub fn compute_fingerprint(
    content_path: &Path,
    pattern: &ContentPattern,
    mode: FingerprintMode,
) -> Result<String> {
    let records = discover_records(content_path, pattern)?;
    fingerprint_records(content_path, &records, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, body: &str) {
        fs::write(dir.path().join(rel), body).unwrap();
    }

    fn all() -> ContentPattern {
        ContentPattern::new("**/*").unwrap()
    }

    #[test]
    fn fingerprint_is_prefixed_and_stable() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.md", "alpha");
        let first = compute_fingerprint(dir.path(), &all(), FingerprintMode::Metadata).unwrap();
        let second = compute_fingerprint(dir.path(), &all(), FingerprintMode::Metadata).unwrap();
        assert!(first.starts_with("blake3:"));
        assert_eq!(first.len(), PREFIX.len() + 64);
        assert_eq!(first, second);
    }

    #[test]
    fn added_record_changes_fingerprint() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.md", "alpha");
        let before = compute_fingerprint(dir.path(), &all(), FingerprintMode::Metadata).unwrap();
        write(&dir, "b.md", "beta");
        let after = compute_fingerprint(dir.path(), &all(), FingerprintMode::Metadata).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn content_mode_sees_same_size_edits() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.md", "aaaa");
        let before = compute_fingerprint(dir.path(), &all(), FingerprintMode::Contents).unwrap();
        write(&dir, "a.md", "bbbb");
        let after = compute_fingerprint(dir.path(), &all(), FingerprintMode::Contents).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn relocated_tree_keeps_fingerprint_in_content_mode() {
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();
        write(&one, "a.md", "same");
        write(&two, "a.md", "same");
        assert_eq!(
            compute_fingerprint(one.path(), &all(), FingerprintMode::Contents).unwrap(),
            compute_fingerprint(two.path(), &all(), FingerprintMode::Contents).unwrap()
        );
    }

    #[test]
    fn unreadable_record_is_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.md");
        let err = fingerprint_records(dir.path(), &[missing], FingerprintMode::Metadata).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
