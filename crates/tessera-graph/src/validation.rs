//! Structural auditing.
//!
//! [`validate`] never fails as a call: a malformed graph yields
//! `valid == false` plus categorized issues. Issues describe data quality;
//! the graph stays fully queryable.
//!
//! | Check                              | Severity |
//! |------------------------------------|----------|
//! | Node with no edges                 | warning  |
//! | Edge from a node to itself         | error    |
//! | Repeated (from, to, relationship)  | warning  |
//! | Cycle among `Prerequisite` edges   | error    |
//! | Variant without a valid canonical  | error    |
//! | Several disconnected components    | info     |

use crate::store::GraphData;
use crate::types::{EdgeKey, Relationship};
use petgraph::algo::{connected_components, tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    OrphanNode,
    SelfLoop,
    DuplicateEdge,
    PrerequisiteCycle,
    BrokenCanonicalRef,
    DisconnectedComponents,
}

impl IssueKind {
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::SelfLoop | Self::PrerequisiteCycle | Self::BrokenCanonicalRef => Severity::Error,
            Self::OrphanNode | Self::DuplicateEdge => Severity::Warning,
            Self::DisconnectedComponents => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
    /// Nodes involved, for cross-referencing.
    pub node_ids: Vec<String>,
}

impl ValidationIssue {
    fn new(kind: IssueKind, message: impl Into<String>, node_ids: Vec<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            node_ids,
        }
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.severity(), self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// `true` when there are no errors. Warnings do not affect validity.
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub info: Vec<ValidationIssue>,
}

impl ValidationResult {
    fn push(&mut self, issue: ValidationIssue) {
        match issue.severity() {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
            Severity::Info => self.info.push(issue),
        }
    }

    /// All issues of one kind, whatever their severity bucket.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.errors
            .iter()
            .chain(&self.warnings)
            .chain(&self.info)
            .filter(move |issue| issue.kind == kind)
    }

    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.info.len()
    }
}

/// Audit `graph`.
#[must_use]
pub fn validate(graph: &GraphData) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_orphans(graph, &mut result);
    check_self_loops(graph, &mut result);
    check_duplicates(graph, &mut result);
    check_prerequisite_cycles(graph, &mut result);
    check_canonical_refs(graph, &mut result);
    check_components(graph, &mut result);

    result.valid = result.errors.is_empty();
    debug!(
        valid = result.valid,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "validated graph"
    );
    result
}

fn check_orphans(graph: &GraphData, result: &mut ValidationResult) {
    let pg = graph.graph();
    for idx in pg.node_indices() {
        if pg.neighbors_undirected(idx).next().is_none() {
            let id = pg[idx].id.clone();
            result.push(ValidationIssue::new(
                IssueKind::OrphanNode,
                format!("node '{id}' has no edges"),
                vec![id],
            ));
        }
    }
}

fn check_self_loops(graph: &GraphData, result: &mut ValidationResult) {
    let pg = graph.graph();
    for edge in pg.edge_references().filter(|e| e.source() == e.target()) {
        let id = pg[edge.source()].id.clone();
        result.push(ValidationIssue::new(
            IssueKind::SelfLoop,
            format!("self-loop {}", edge.weight().describe()),
            vec![id],
        ));
    }
}

fn check_duplicates(graph: &GraphData, result: &mut ValidationResult) {
    let mut counts: BTreeMap<EdgeKey, usize> = BTreeMap::new();
    for edge in graph.graph().edge_weights() {
        *counts.entry(edge.key()).or_insert(0) += 1;
    }
    for (key, count) in counts.into_iter().filter(|(_, c)| *c > 1) {
        result.push(ValidationIssue::new(
            IssueKind::DuplicateEdge,
            format!(
                "{} -[{}]-> {} appears {count} times",
                key.from, key.relationship, key.to
            ),
            vec![key.from, key.to],
        ));
    }
}

fn check_prerequisite_cycles(graph: &GraphData, result: &mut ValidationResult) {
    let pg = graph.graph();
    let mut sub: DiGraph<NodeIndex, ()> = DiGraph::new();
    let mut local: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    // Self-loops are reported by their own check.
    for edge in pg.edge_references().filter(|e| {
        e.weight().relationship == Relationship::Prerequisite && e.source() != e.target()
    }) {
        let a = *local
            .entry(edge.source())
            .or_insert_with(|| sub.add_node(edge.source()));
        let b = *local
            .entry(edge.target())
            .or_insert_with(|| sub.add_node(edge.target()));
        sub.update_edge(a, b, ());
    }

    if toposort(&sub, None).is_ok() {
        return;
    }

    let mut cycles: Vec<Vec<String>> = tarjan_scc(&sub)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut ids: Vec<String> = component
                .into_iter()
                .map(|l| pg[sub[l]].id.clone())
                .collect();
            ids.sort_unstable();
            ids
        })
        .collect();
    cycles.sort_unstable();

    for ids in cycles {
        result.push(ValidationIssue::new(
            IssueKind::PrerequisiteCycle,
            format!("prerequisite cycle among {}", ids.join(", ")),
            ids,
        ));
    }
}

fn check_canonical_refs(graph: &GraphData, result: &mut ValidationResult) {
    for node in graph.iter_nodes() {
        let problem = match (&node.canonical_id, node.is_canonical) {
            (None, false) => Some("is a variant without a canonical_id".to_string()),
            (Some(target), _) if !graph.contains_node(target) => {
                Some(format!("references missing canonical node '{target}'"))
            }
            (Some(target), _) => match graph.get_node(target) {
                Some(canonical) if !canonical.is_canonical => {
                    Some(format!("references '{target}', which is itself a variant"))
                }
                _ => None,
            },
            (None, true) => None,
        };

        if let Some(problem) = problem {
            let mut ids = vec![node.id.clone()];
            ids.extend(node.canonical_id.clone());
            result.push(ValidationIssue::new(
                IssueKind::BrokenCanonicalRef,
                format!("node '{}' {problem}", node.id),
                ids,
            ));
        }
    }
}

fn check_components(graph: &GraphData, result: &mut ValidationResult) {
    if graph.node_count() < 2 {
        return;
    }
    let components = connected_components(graph.graph());
    if components > 1 {
        result.push(ValidationIssue::new(
            IssueKind::DisconnectedComponents,
            format!("graph splits into {components} disconnected components"),
            Vec::new(),
        ));
    }
}
