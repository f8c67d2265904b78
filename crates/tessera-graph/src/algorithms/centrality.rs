use crate::store::GraphData;
use crate::types::Node;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Degree centrality
// ---------------------------------------------------------------------------

/// Normalized degree centrality of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityScore {
    pub node_id: String,
    /// `(in + out) / (2 (n - 1))`, in `[0, 1]` for simple graphs.
    pub degree: f64,
    /// `in / (n - 1)`.
    pub in_degree: f64,
    /// `out / (n - 1)`.
    pub out_degree: f64,
}

/// Degree centrality for every node, highest first (ties by id).
///
/// Empty for graphs with fewer than two nodes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_centrality(graph: &GraphData) -> Vec<CentralityScore> {
    let n = graph.node_count();
    if n < 2 {
        return Vec::new();
    }
    let denom = (n - 1) as f64;

    let mut scores: Vec<CentralityScore> = graph
        .graph()
        .node_indices()
        .map(|idx| {
            let in_deg = graph.in_degree(idx) as f64;
            let out_deg = graph.out_degree(idx) as f64;
            CentralityScore {
                node_id: graph.graph()[idx].id.clone(),
                degree: (in_deg + out_deg) / (2.0 * denom),
                in_degree: in_deg / denom,
                out_degree: out_deg / denom,
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.degree
            .total_cmp(&a.degree)
            .then_with(|| a.node_id.cmp(&b.node_id))
    });
    scores
}

// ---------------------------------------------------------------------------
// Bridges
// ---------------------------------------------------------------------------

/// Gateway score of one node. See [`bridge_scores`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeScore {
    pub node_id: String,
    pub score: f64,
    /// Distinct categories among the node's neighbors in either direction.
    pub neighbor_categories: usize,
}

/// Connectivity-balance score for every node, highest first (ties by id).
///
/// `score = (min(in, out) + 1) * (distinct neighbor categories + 1)`. A
/// node that is both required by and leads into many differently
/// categorized nodes sits between clusters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bridge_scores(graph: &GraphData) -> Vec<BridgeScore> {
    let pg = graph.graph();
    let mut scores: Vec<BridgeScore> = pg
        .node_indices()
        .map(|idx| {
            let balance = graph.in_degree(idx).min(graph.out_degree(idx));
            let categories: HashSet<&str> = pg
                .neighbors_directed(idx, Direction::Outgoing)
                .chain(pg.neighbors_directed(idx, Direction::Incoming))
                .filter_map(|n| pg[n].category.as_deref())
                .collect();
            BridgeScore {
                node_id: pg[idx].id.clone(),
                score: (balance as f64 + 1.0) * (categories.len() as f64 + 1.0),
                neighbor_categories: categories.len(),
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.node_id.cmp(&b.node_id))
    });
    scores
}

/// The `limit` highest-scoring bridge nodes.
#[must_use]
pub fn find_bridges(graph: &GraphData, limit: usize) -> Vec<Node> {
    bridge_scores(graph)
        .into_iter()
        .take(limit)
        .filter_map(|s| graph.get_node(&s.node_id).cloned())
        .collect()
}
