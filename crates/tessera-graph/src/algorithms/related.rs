use crate::store::GraphData;
use crate::types::{Node, Relationship};
use petgraph::Direction;
use tessera_core::Result;

/// Nodes joined to `node_id` by any of `relationships`, in one direction.
///
/// `Outgoing` yields targets of edges leaving the node, `Incoming` the
/// sources of edges entering it. An empty `relationships` slice matches
/// every relationship.
///
/// # Errors
///
/// Returns [`tessera_core::Error::NotFound`] if `node_id` is not a node.
pub fn get_related(
    graph: &GraphData,
    node_id: &str,
    relationships: &[Relationship],
    direction: Direction,
) -> Result<Vec<(Node, Relationship)>> {
    let (idx, _) = graph.require(node_id)?;
    let pg = graph.graph();

    let mut related: Vec<(Node, Relationship)> = graph
        .incident(idx, direction)
        .filter(|(_, edge)| relationships.is_empty() || relationships.contains(&edge.relationship))
        .map(|(other, edge)| (pg[other].clone(), edge.relationship.clone()))
        .collect();
    related.sort_by(|a, b| a.0.id.cmp(&b.0.id).then_with(|| a.1.cmp(&b.1)));
    Ok(related)
}

fn nodes_only(related: Vec<(Node, Relationship)>) -> Vec<Node> {
    related.into_iter().map(|(node, _)| node).collect()
}

impl GraphData {
    /// Direct prerequisites of `node_id` (what it requires).
    ///
    /// # Errors
    ///
    /// Returns [`tessera_core::Error::NotFound`] for an unknown id.
    pub fn prerequisites(&self, node_id: &str) -> Result<Vec<Node>> {
        get_related(self, node_id, &[Relationship::Prerequisite], Direction::Outgoing)
            .map(nodes_only)
    }

    /// Nodes that list `node_id` as a prerequisite.
    ///
    /// # Errors
    ///
    /// Returns [`tessera_core::Error::NotFound`] for an unknown id.
    pub fn dependents(&self, node_id: &str) -> Result<Vec<Node>> {
        get_related(self, node_id, &[Relationship::Prerequisite], Direction::Incoming)
            .map(nodes_only)
    }

    /// Targets of `node_id`'s outgoing `relationship` edges. Symmetric
    /// relationships are matched in both directions.
    ///
    /// # Errors
    ///
    /// Returns [`tessera_core::Error::NotFound`] for an unknown id.
    pub fn related_by(&self, node_id: &str, relationship: &Relationship) -> Result<Vec<Node>> {
        let rels = std::slice::from_ref(relationship);
        let mut nodes = nodes_only(get_related(self, node_id, rels, Direction::Outgoing)?);
        if relationship.is_symmetric() {
            for node in nodes_only(get_related(self, node_id, rels, Direction::Incoming)?) {
                if !nodes.iter().any(|n| n.id == node.id) {
                    nodes.push(node);
                }
            }
            nodes.sort_by(|a, b| a.id.cmp(&b.id));
        }
        Ok(nodes)
    }
}
