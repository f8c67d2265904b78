//! Generic graph vocabulary shared by every domain.
//!
//! Domains never extend these types directly. Domain-specific relations go
//! through [`Relationship::Custom`], domain-specific node kinds through
//! [`NodeType::Custom`], and anything else through [`Node::metadata`],
//! which the engine stores but never interprets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Relationship
// ---------------------------------------------------------------------------

/// Typed relationship carried by an [`Edge`].
///
/// An edge `a -[Prerequisite]-> b` reads "`a` requires `b`".
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Prerequisite,
    LeadsTo,
    #[default]
    RelatesTo,
    Extends,
    Introduces,
    Covers,
    VariantOf,
    ContrastsWith,
    AnswersQuestion,
    /// Domain-defined relation, named by the domain.
    Custom(String),
}

impl Relationship {
    /// Weight given to new edges of this type when the source gives none.
    ///
    /// Higher is stronger; path search treats `1 / weight` as the cost.
    #[must_use]
    pub const fn default_weight(&self) -> f32 {
        match self {
            Self::Prerequisite | Self::LeadsTo => 1.0,
            Self::Extends | Self::VariantOf => 0.9,
            Self::Introduces | Self::Covers => 0.8,
            Self::RelatesTo | Self::ContrastsWith => 0.7,
            Self::AnswersQuestion => 0.6,
            Self::Custom(_) => 0.5,
        }
    }

    /// Snake-case name, or the custom name as given.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Prerequisite => "prerequisite",
            Self::LeadsTo => "leads_to",
            Self::RelatesTo => "relates_to",
            Self::Extends => "extends",
            Self::Introduces => "introduces",
            Self::Covers => "covers",
            Self::VariantOf => "variant_of",
            Self::ContrastsWith => "contrasts_with",
            Self::AnswersQuestion => "answers_question",
            Self::Custom(name) => name,
        }
    }

    /// Symmetric relations hold in both directions, so `a -[r]-> b` and
    /// `b -[r]-> a` describe the same fact and are stored once.
    #[must_use]
    pub const fn is_symmetric(&self) -> bool {
        matches!(self, Self::RelatesTo | Self::ContrastsWith)
    }

    /// Lenient parse for hand-written sources (manual edge files, body text).
    ///
    /// Case, hyphens and spaces are ignored and a few common aliases are
    /// accepted. Anything unrecognised becomes [`Relationship::Custom`].
    ///
    /// ```
    /// use tessera_graph::Relationship;
    ///
    /// assert_eq!(Relationship::parse("prereq"), Relationship::Prerequisite);
    /// assert_eq!(Relationship::parse("Leads-To"), Relationship::LeadsTo);
    /// assert_eq!(
    ///     Relationship::parse("implies"),
    ///     Relationship::Custom("implies".to_string())
    /// );
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "prerequisite" | "prereq" | "requires" => Self::Prerequisite,
            "leads_to" | "leadsto" => Self::LeadsTo,
            "relates_to" | "relatesto" | "related" | "related_to" => Self::RelatesTo,
            "extends" => Self::Extends,
            "introduces" => Self::Introduces,
            "covers" => Self::Covers,
            "variant_of" | "variantof" => Self::VariantOf,
            "contrasts_with" | "contrastswith" => Self::ContrastsWith,
            "answers_question" | "answersquestion" | "answers_questions" => {
                Self::AnswersQuestion
            }
            _ => Self::Custom(normalized),
        }
    }
}

impl Relationship {
    /// A domain-defined relationship. Names that match a built-in
    /// relationship (after [`Relationship::parse`] normalization) resolve to
    /// that built-in instead of shadowing it.
    #[must_use]
    pub fn custom(name: &str) -> Self {
        Self::parse(name)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// EdgeOrigin
// ---------------------------------------------------------------------------

/// Where an edge came from. Used for debugging and selective regeneration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOrigin {
    /// Declared in a record's structured front-matter.
    #[default]
    Frontmatter,
    /// Harvested from a record's body text.
    BodyText,
    /// Loaded from the curated manual-edges document.
    Manual,
    /// Derived by an algorithm rather than declared by content.
    Inferred,
}

// ---------------------------------------------------------------------------
// NodeType
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Built from a content record.
    #[default]
    Domain,
    /// Appended at runtime to record an interaction (a query, a session).
    Interaction,
    Custom(String),
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A graph vertex representing one domain entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable unique id. Never changes once the node is in a graph.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub category: Option<String>,
    /// Provenance, e.g. the source document a variant was taken from.
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default = "default_canonical")]
    pub is_canonical: bool,
    /// For variants, the id of the canonical node this one specialises.
    #[serde(default)]
    pub canonical_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

const fn default_canonical() -> bool {
    true
}

impl Node {
    /// Canonical domain node with no category, source or metadata.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            node_type: NodeType::default(),
            category: None,
            source_id: None,
            is_canonical: true,
            canonical_id: None,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Mark this node as a source-specific variant of `canonical_id`.
    #[must_use]
    pub fn as_variant_of(mut self, canonical_id: impl Into<String>) -> Self {
        self.is_canonical = false;
        self.canonical_id = Some(canonical_id.into());
        self
    }

    #[must_use]
    pub fn with_node_type(mut self, node_type: NodeType) -> Self {
        self.node_type = node_type;
        self
    }

    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// A directed, typed, weighted relationship between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub relationship: Relationship,
    pub weight: f32,
    #[serde(default)]
    pub origin: EdgeOrigin,
}

impl Edge {
    /// Edge with the relationship's default weight and `Frontmatter` origin.
    pub fn new(from: impl Into<String>, to: impl Into<String>, relationship: Relationship) -> Self {
        let weight = relationship.default_weight();
        Self {
            from: from.into(),
            to: to.into(),
            relationship,
            weight,
            origin: EdgeOrigin::default(),
        }
    }

    #[must_use]
    pub const fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub const fn with_origin(mut self, origin: EdgeOrigin) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// Identity used for duplicate suppression.
    ///
    /// Symmetric relationships key on the unordered endpoint pair so the
    /// two declarations of one fact collapse.
    #[must_use]
    pub fn key(&self) -> EdgeKey {
        let (a, b) = if self.relationship.is_symmetric() && self.to < self.from {
            (&self.to, &self.from)
        } else {
            (&self.from, &self.to)
        };
        EdgeKey {
            from: a.clone(),
            to: b.clone(),
            relationship: self.relationship.clone(),
        }
    }

    /// `from -[relationship]-> to`, as used in build diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{} -[{}]-> {}", self.from, self.relationship, self.to)
    }
}

/// Duplicate-suppression identity of an edge. See [`Edge::key`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub from: String,
    pub to: String,
    pub relationship: Relationship,
}

// Ordered by name. A `Custom` whose name collides with a built-in sorts
// right after that built-in and never compares equal to it, which keeps
// `Ord` consistent with `Eq`. Use `Relationship::custom` or `parse` to avoid
// the collision in the first place.
impl PartialOrd for Relationship {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Relationship {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name()
            .cmp(other.name())
            .then_with(|| matches!(self, Self::Custom(_)).cmp(&matches!(other, Self::Custom(_))))
    }
}
