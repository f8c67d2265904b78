//! Flat, serializable views of query results for transport layers.
//!
//! Nodes carry an open metadata bag that consumers rarely need; these types
//! keep only what a response body shows.

use crate::algorithms::{NeighborhoodResult, PathResult};
use crate::types::{Edge, Node};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub is_canonical: bool,
}

impl From<&Node> for NodeSummary {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            title: node.title.clone(),
            category: node.category.clone(),
            is_canonical: node.is_canonical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeInfo {
    pub from: String,
    pub to: String,
    pub relationship: String,
    pub weight: f32,
}

impl From<&Edge> for EdgeInfo {
    fn from(edge: &Edge) -> Self {
        Self {
            from: edge.from.clone(),
            to: edge.to.clone(),
            relationship: edge.relationship.name().to_string(),
            weight: edge.weight,
        }
    }
}

/// One node on a path and the relationship leading to the next one
/// (`None` on the last step).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub node: NodeSummary,
    pub relationship_to_next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborInfo {
    pub node: NodeSummary,
    pub distance: usize,
}

impl PathResult {
    #[must_use]
    pub fn steps(&self) -> Vec<PathStep> {
        self.path
            .iter()
            .enumerate()
            .map(|(i, node)| PathStep {
                node: NodeSummary::from(node),
                relationship_to_next: self.edges.get(i).map(|e| e.relationship.name().to_string()),
            })
            .collect()
    }
}

impl NeighborhoodResult {
    /// Reached nodes (center excluded) with their hop distance.
    #[must_use]
    pub fn neighbors(&self) -> Vec<NeighborInfo> {
        self.nodes
            .iter()
            .map(|node| NeighborInfo {
                node: NodeSummary::from(node),
                distance: self.distances.get(&node.id).copied().unwrap_or_default(),
            })
            .collect()
    }

    #[must_use]
    pub fn edge_infos(&self) -> Vec<EdgeInfo> {
        self.edges.iter().map(EdgeInfo::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{neighborhood, shortest_path};
    use crate::store::GraphData;
    use crate::types::Relationship;

    fn chain() -> GraphData {
        let mut g = GraphData::new();
        g.add_node(Node::new("a", "Alpha").with_category("greek"));
        g.add_node(Node::new("b", "Beta"));
        g.add_node(Node::new("c", "Gamma"));
        g.add_edge(Edge::new("a", "b", Relationship::LeadsTo)).unwrap();
        g.add_edge(Edge::new("b", "c", Relationship::Extends)).unwrap();
        g
    }

    #[test]
    fn path_steps_name_the_next_relationship() {
        let steps = shortest_path(&chain(), "a", "c").unwrap().steps();
        let rels: Vec<_> = steps.iter().map(|s| s.relationship_to_next.as_deref()).collect();
        assert_eq!(rels, vec![Some("leads_to"), Some("extends"), None]);
        assert_eq!(steps[0].node.title, "Alpha");
    }

    #[test]
    fn neighbors_carry_distance() {
        let result = neighborhood(&chain(), "a", 2, None).unwrap();
        let neighbors = result.neighbors();
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].node.id, "b");
        assert_eq!(neighbors[0].distance, 1);
        assert_eq!(neighbors[1].distance, 2);
        assert_eq!(result.edge_infos().len(), 2);
    }

    #[test]
    fn summary_json_omits_missing_category() {
        let json = serde_json::to_value(NodeSummary::from(&Node::new("b", "Beta"))).unwrap();
        assert!(json.get("category").is_none());
        let json = serde_json::to_value(NodeSummary::from(&Node::new("a", "A").with_category("x")))
            .unwrap();
        assert_eq!(json["category"], "x");
    }
}
