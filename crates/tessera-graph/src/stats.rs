//! Descriptive statistics for a knowledge graph.
//!
//! Everything here is a single O(V + E) pass over the store.
//!
//! - **density**: `edge_count / (node_count * (node_count - 1))`; zero for
//!   graphs with fewer than two nodes.
//! - **avg_degree**: mean of in-degree + out-degree over all nodes.
//! - **max_in_degree / max_out_degree**: the node with the highest degree;
//!   ties go to the first node encountered in insertion order.
//! - **component_count**: weakly connected components. A value greater
//!   than 1 means the graph splits into disjoint subgraphs.

use crate::store::GraphData;
use petgraph::algo::connected_components;
use serde::Serialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// GraphStats
// ---------------------------------------------------------------------------

/// One node's extreme degree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegreeLeader {
    pub node_id: String,
    pub degree: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub canonical_count: usize,
    pub variant_count: usize,
    /// Node count per category. Uncategorized nodes are counted separately.
    pub category_distribution: BTreeMap<String, usize>,
    pub uncategorized_count: usize,
    /// Edge count per relationship name.
    pub relationship_distribution: BTreeMap<String, usize>,
    /// Nodes with no incident edges.
    pub orphan_count: usize,
    pub avg_degree: f64,
    pub density: f64,
    pub component_count: usize,
    pub max_in_degree: Option<DegreeLeader>,
    pub max_out_degree: Option<DegreeLeader>,
}

impl GraphStats {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(graph: &GraphData) -> Self {
        let pg = graph.graph();
        let node_count = pg.node_count();
        let edge_count = pg.edge_count();

        let mut canonical_count = 0;
        let mut category_distribution: BTreeMap<String, usize> = BTreeMap::new();
        let mut uncategorized_count = 0;
        let mut orphan_count = 0;
        let mut max_in: Option<DegreeLeader> = None;
        let mut max_out: Option<DegreeLeader> = None;

        for idx in pg.node_indices() {
            let node = &pg[idx];
            if node.is_canonical {
                canonical_count += 1;
            }
            match &node.category {
                Some(category) => *category_distribution.entry(category.clone()).or_insert(0) += 1,
                None => uncategorized_count += 1,
            }

            let in_deg = graph.in_degree(idx);
            let out_deg = graph.out_degree(idx);
            if in_deg + out_deg == 0 {
                orphan_count += 1;
            }
            raise(&mut max_in, &node.id, in_deg);
            raise(&mut max_out, &node.id, out_deg);
        }

        let mut relationship_distribution: BTreeMap<String, usize> = BTreeMap::new();
        for edge in pg.edge_weights() {
            *relationship_distribution
                .entry(edge.relationship.name().to_string())
                .or_insert(0) += 1;
        }

        let avg_degree = if node_count == 0 {
            0.0
        } else {
            (2 * edge_count) as f64 / node_count as f64
        };

        Self {
            node_count,
            edge_count,
            canonical_count,
            variant_count: node_count - canonical_count,
            category_distribution,
            uncategorized_count,
            relationship_distribution,
            orphan_count,
            avg_degree,
            density: compute_density(node_count, edge_count),
            component_count: if node_count == 0 {
                0
            } else {
                connected_components(pg)
            },
            max_in_degree: max_in,
            max_out_degree: max_out,
        }
    }
}

/// Replace `leader` only on a strictly greater degree.
fn raise(leader: &mut Option<DegreeLeader>, node_id: &str, degree: usize) {
    if leader.as_ref().is_none_or(|l| degree > l.degree) {
        *leader = Some(DegreeLeader {
            node_id: node_id.to_string(),
            degree,
        });
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0;
    }
    edge_count as f64 / (node_count * (node_count - 1)) as f64
}

impl GraphData {
    /// Shorthand for [`GraphStats::compute`].
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats::compute(self)
    }
}
