#![allow(dead_code)]

//! A small lesson-plan domain used by the integration tests.
//!
//! Records are markdown files with YAML front-matter:
//!
//! ```text
//! ---
//! title: Limits
//! unit: calculus
//! requires: [algebra]
//! see_also: [sequences]
//! ---
//! ```

use serde_yaml::Value;
use std::fs;
use std::path::Path;
use tessera_core::content::{get_str, get_string_list};
use tessera_core::ids::id_from_path;
use tessera_core::{Error, Result};
use tessera_graph::{Edge, GraphExtractor, Node, Relationship};

#[derive(Debug, Clone)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LessonLinks {
    pub requires: Vec<String>,
    pub see_also: Vec<String>,
}

#[derive(Debug, Default)]
pub struct LessonExtractor;

impl GraphExtractor for LessonExtractor {
    type NodeData = Lesson;
    type EdgeData = LessonLinks;

    fn extract_node(
        &self,
        _base_path: &Path,
        record_path: &Path,
        frontmatter: &Value,
        _body: &str,
    ) -> Result<Lesson> {
        let id = id_from_path(record_path)
            .ok_or_else(|| Error::parse(format!("no id for {}", record_path.display())))?;
        let title = get_str(frontmatter, "title")
            .ok_or_else(|| Error::parse(format!("lesson {id} has no title")))?;
        Ok(Lesson {
            id,
            title: title.to_string(),
            unit: get_str(frontmatter, "unit").map(String::from),
        })
    }

    fn extract_edges(&self, frontmatter: &Value, _body: &str) -> Result<Option<LessonLinks>> {
        let links = LessonLinks {
            requires: get_string_list(frontmatter, "requires"),
            see_also: get_string_list(frontmatter, "see_also"),
        };
        if links.requires.is_empty() && links.see_also.is_empty() {
            Ok(None)
        } else {
            Ok(Some(links))
        }
    }

    fn to_graph_node(&self, lesson: &Lesson) -> Node {
        let node = Node::new(&lesson.id, &lesson.title);
        match &lesson.unit {
            Some(unit) => node.with_category(unit),
            None => node,
        }
    }

    fn to_graph_edges(&self, from_id: &str, links: &LessonLinks) -> Vec<Edge> {
        let requires = links
            .requires
            .iter()
            .map(|to| Edge::new(from_id, to, Relationship::Prerequisite));
        let see_also = links
            .see_also
            .iter()
            .map(|to| Edge::new(from_id, to, Relationship::RelatesTo));
        requires.chain(see_also).collect()
    }

    fn content_pattern(&self) -> &str {
        "**/*.md"
    }

    fn name(&self) -> &str {
        "lessons"
    }
}

/// Write `body` to `<dir>/<name>`, creating parent directories.
pub fn write_record(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
}

/// Front-matter-only lesson record.
pub fn lesson(title: &str, requires: &[&str], see_also: &[&str]) -> String {
    format!(
        "---\ntitle: {title}\nrequires: [{}]\nsee_also: [{}]\n---\n\n# {title}\n",
        requires.join(", "),
        see_also.join(", ")
    )
}
