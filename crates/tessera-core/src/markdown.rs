//! Markdown body helpers for extraction adapters.
//!
//! Adapters that derive `BodyText` edges usually look for a heading such as
//! `## Related Concepts` and a list item like `- **Prerequisite**: a, b`.
//! These helpers do the section slicing on top of `pulldown-cmark` so each
//! adapter does not need its own markdown scanner.
//!
//! ```
//! use tessera_core::markdown::extract_list_from_section;
//!
//! let body = "## Related Concepts\n\n- **Prerequisite**: concept-a, concept-b\n- **See also**: concept-c\n";
//! let prereqs = extract_list_from_section(body, "Related Concepts", "Prerequisite");
//! assert_eq!(prereqs, vec!["concept-a", "concept-b"]);
//! ```

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use std::ops::Range;

#[derive(Debug)]
struct Section {
    title: String,
    level: HeadingLevel,
    heading_start: usize,
    content_start: usize,
}

fn scan_headings(body: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut open: Option<(HeadingLevel, usize, String)> = None;

    for (event, range) in Parser::new(body).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                open = Some((level, range.start, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, title)) = open.as_mut() {
                    title.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, heading_start, title)) = open.take() {
                    sections.push(Section {
                        title: title.trim().to_string(),
                        level,
                        heading_start,
                        content_start: range.end,
                    });
                }
            }
            _ => {}
        }
    }

    sections
}

fn section_range(body: &str, heading: &str) -> Option<Range<usize>> {
    let sections = scan_headings(body);
    let position = sections
        .iter()
        .position(|s| s.title.eq_ignore_ascii_case(heading.trim()))?;
    let found = &sections[position];

    let end = sections[position + 1..]
        .iter()
        .find(|s| s.level <= found.level)
        .map_or(body.len(), |s| s.heading_start);

    Some(found.content_start..end)
}

/// Raw markdown under `heading` up to the next heading of the same or a
/// higher level. Heading match is case-insensitive.
#[must_use]
pub fn extract_section_content(body: &str, heading: &str) -> Option<String> {
    let range = section_range(body, heading)?;
    Some(body[range].trim().to_string())
}

/// Plain text of every list item under `heading`.
#[must_use]
pub fn extract_list_items(body: &str, heading: &str) -> Vec<String> {
    let Some(range) = section_range(body, heading) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let mut stack: Vec<String> = Vec::new();

    for event in Parser::new(&body[range]) {
        match event {
            Event::Start(Tag::Item) => stack.push(String::new()),
            Event::End(TagEnd::Item) => {
                if let Some(text) = stack.pop() {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        items.push(text);
                    }
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(current) = stack.last_mut() {
                    current.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(current) = stack.last_mut() {
                    current.push(' ');
                }
            }
            _ => {}
        }
    }

    items
}

/// Comma-separated values of the list item labelled `keyword` under
/// `heading` (`- **Keyword**: a, b` → `["a", "b"]`).
#[must_use]
pub fn extract_list_from_section(body: &str, heading: &str, keyword: &str) -> Vec<String> {
    extract_list_items(body, heading)
        .into_iter()
        .filter_map(|item| {
            let (label, values) = item.split_once(':')?;
            label
                .trim()
                .eq_ignore_ascii_case(keyword.trim())
                .then(|| parse_keyword_values(values))
        })
        .flatten()
        .collect()
}

fn parse_keyword_values(values: &str) -> Vec<String> {
    values
        .split(',')
        .map(|v| {
            v.trim()
                .trim_start_matches("[[")
                .trim_end_matches("]]")
                .trim_matches('`')
                .trim()
                .to_string()
        })
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = r"# Picardy Third

A major chord at the end of a minor-key piece.

## Related Concepts

- **Prerequisite**: major-triad, minor-key
- **Leads to**: modal-mixture
- **See also**: [[borrowed-chords]]

### Nested

- not part of the keyword lists

## Sources

- Tymoczko ch. 3
";

    #[test]
    fn keyword_values_are_split() {
        assert_eq!(
            extract_list_from_section(NOTE, "Related Concepts", "Prerequisite"),
            vec!["major-triad", "minor-key"]
        );
        assert_eq!(
            extract_list_from_section(NOTE, "related concepts", "leads to"),
            vec!["modal-mixture"]
        );
    }

    #[test]
    fn wikilinks_are_unwrapped() {
        assert_eq!(
            extract_list_from_section(NOTE, "Related Concepts", "See also"),
            vec!["borrowed-chords"]
        );
    }

    #[test]
    fn missing_section_or_keyword_is_empty() {
        assert!(extract_list_from_section(NOTE, "Nope", "Prerequisite").is_empty());
        assert!(extract_list_from_section(NOTE, "Related Concepts", "Extends").is_empty());
    }

    #[test]
    fn section_content_stops_at_same_level_heading() {
        let content = extract_section_content(NOTE, "Related Concepts").unwrap();
        assert!(content.contains("major-triad"));
        assert!(content.contains("### Nested"));
        assert!(!content.contains("Tymoczko"));
    }

    #[test]
    fn list_items_include_nested_subsections() {
        let items = extract_list_items(NOTE, "Related Concepts");
        assert_eq!(items.len(), 4);
        assert_eq!(items[0], "Prerequisite: major-triad, minor-key");
    }

    #[test]
    fn last_section_runs_to_end() {
        let content = extract_section_content(NOTE, "Sources").unwrap();
        assert_eq!(content, "- Tymoczko ch. 3");
    }
}
