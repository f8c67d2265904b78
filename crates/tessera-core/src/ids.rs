//! Stable node id derivation.

use std::path::Path;

/// Normalize an identifier to lowercase kebab-case.
///
/// Trims, lowercases, treats underscores as spaces and collapses runs of
/// whitespace into single hyphens.
///
/// ```
/// use tessera_core::ids::normalize_id;
///
/// assert_eq!(normalize_id("Voice Leading"), "voice-leading");
/// assert_eq!(normalize_id("non_chord_tone"), "non-chord-tone");
/// assert_eq!(normalize_id("  Mixed   Case  "), "mixed-case");
/// ```
#[must_use]
pub fn normalize_id(id: &str) -> String {
    id.trim()
        .to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("-")
}

/// Node id from a record path's file stem, or `None` when there is no stem.
///
/// ```
/// use std::path::Path;
/// use tessera_core::ids::id_from_path;
///
/// assert_eq!(
///     id_from_path(Path::new("/data/concepts/Voice_Leading.md")),
///     Some("voice-leading".to_string())
/// );
/// assert_eq!(id_from_path(Path::new("/")), None);
/// ```
#[must_use]
pub fn id_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(normalize_id)
        .filter(|id| !id.is_empty())
}
