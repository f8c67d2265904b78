//! Content record collaborators: raw text reading and front-matter splitting.
//!
//! The graph builder consumes both through traits so embedders can swap in
//! their own I/O (virtual file systems, archives) or front-matter dialects.
//! The stock implementations read UTF-8 files from disk and split YAML
//! front-matter delimited by `---` lines.

use crate::error::{Error, Result};
use serde_yaml::Value;
use std::path::Path;

/// Reads the raw text of one content record.
pub trait ContentReader: Send + Sync {
    /// # Errors
    ///
    /// Returns a path-tagged [`Error::Io`] when the record cannot be read.
    fn read_to_string(&self, path: &Path) -> Result<String>;
}

/// [`ContentReader`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl ContentReader for FsReader {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))
    }
}

/// A record split into its front-matter document and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitRecord<'a> {
    /// Parsed front-matter; `Value::Null` when the record has none.
    pub frontmatter: Value,
    pub body: &'a str,
    /// Whether front-matter delimiters were present.
    pub had_frontmatter: bool,
}

/// Splits raw record text into a generic document and body.
pub trait FrontmatterSplitter: Send + Sync {
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when delimiters are present but the block
    /// is unterminated or not a valid document.
    fn split<'a>(&self, raw: &'a str) -> Result<SplitRecord<'a>>;
}

/// YAML front-matter between a leading `---` line and the next `---` line.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFrontmatter;

const DELIMITER: &str = "---";

impl FrontmatterSplitter for YamlFrontmatter {
    fn split<'a>(&self, raw: &'a str) -> Result<SplitRecord<'a>> {
        let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let Some(after_open) = strip_delimiter_line(text) else {
            return Ok(SplitRecord {
                frontmatter: Value::Null,
                body: text,
                had_frontmatter: false,
            });
        };

        let mut offset = 0;
        for line in after_open.split_inclusive('\n') {
            if line.trim_end_matches(['\r', '\n']) == DELIMITER {
                let yaml = &after_open[..offset];
                let body = &after_open[offset + line.len()..];
                let frontmatter = if yaml.trim().is_empty() {
                    Value::Null
                } else {
                    serde_yaml::from_str::<Value>(yaml)
                        .map_err(|e| Error::parse(format!("invalid front-matter: {e}")))?
                };
                return Ok(SplitRecord {
                    frontmatter,
                    body,
                    had_frontmatter: true,
                });
            }
            offset += line.len();
        }

        Err(Error::parse(
            "front-matter opening delimiter has no closing delimiter",
        ))
    }
}

/// If `text` starts with a `---` line, return what follows that line.
fn strip_delimiter_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(DELIMITER)?;
    if let Some(rest) = rest.strip_prefix("\r\n") {
        return Some(rest);
    }
    if let Some(rest) = rest.strip_prefix('\n') {
        return Some(rest);
    }
    None
}

/// Read a string field from a front-matter mapping.
#[must_use]
pub fn get_str<'v>(frontmatter: &'v Value, key: &str) -> Option<&'v str> {
    frontmatter.get(key)?.as_str()
}

/// Read a list of strings from a front-matter mapping.
///
/// A scalar string is treated as a one-element list; non-string entries
/// are skipped.
#[must_use]
pub fn get_string_list(frontmatter: &Value, key: &str) -> Vec<String> {
    match frontmatter.get(key) {
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_yaml_and_body() {
        let raw = "---\ntitle: Test\ntags:\n  - a\n  - b\n---\n\n# Heading\nBody\n";
        let split = YamlFrontmatter.split(raw).unwrap();
        assert!(split.had_frontmatter);
        assert_eq!(get_str(&split.frontmatter, "title"), Some("Test"));
        assert_eq!(get_string_list(&split.frontmatter, "tags"), vec!["a", "b"]);
        assert_eq!(split.body, "\n# Heading\nBody\n");
    }

    #[test]
    fn no_delimiters_means_null_frontmatter() {
        let raw = "just a body";
        let split = YamlFrontmatter.split(raw).unwrap();
        assert!(!split.had_frontmatter);
        assert_eq!(split.frontmatter, Value::Null);
        assert_eq!(split.body, raw);
    }

    #[test]
    fn empty_block_is_null() {
        let split = YamlFrontmatter.split("---\n---\nbody").unwrap();
        assert!(split.had_frontmatter);
        assert_eq!(split.frontmatter, Value::Null);
        assert_eq!(split.body, "body");
    }

    #[test]
    fn crlf_line_endings() {
        let split = YamlFrontmatter
            .split("---\r\ntitle: Win\r\n---\r\nbody")
            .unwrap();
        assert_eq!(get_str(&split.frontmatter, "title"), Some("Win"));
        assert_eq!(split.body, "body");
    }

    #[test]
    fn unterminated_block_is_parse_error() {
        let err = YamlFrontmatter.split("---\ntitle: x\nbody").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let err = YamlFrontmatter
            .split("---\ntitle: [unclosed\n---\nbody")
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn horizontal_rule_in_body_is_not_frontmatter() {
        let split = YamlFrontmatter.split("intro\n---\nmore").unwrap();
        assert!(!split.had_frontmatter);
    }

    #[test]
    fn scalar_list_field_becomes_single_item() {
        let value: Value = serde_yaml::from_str("related: b").unwrap();
        assert_eq!(get_string_list(&value, "related"), vec!["b"]);
        assert!(get_string_list(&value, "missing").is_empty());
    }

    #[test]
    fn fs_reader_tags_missing_path() {
        let err = FsReader
            .read_to_string(Path::new("/definitely/not/here.md"))
            .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.md"));
    }
}
