use crate::store::GraphData;
use crate::types::{Edge, Node};
use petgraph::algo::astar;
use petgraph::visit::EdgeRef;
use tessera_core::Result;

/// Floor applied to weights before inverting, so zero or negative weights
/// cannot produce infinite or negative costs.
const MIN_WEIGHT: f32 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    /// Nodes from start to end inclusive. Empty when not found.
    pub path: Vec<Node>,
    /// The edge taken between each consecutive pair in `path`.
    pub edges: Vec<Edge>,
    /// Sum of the traversed edges' weights.
    pub total_weight: f32,
    /// Sum of the traversed edges' costs (see [`edge_cost`]).
    pub total_cost: f32,
    pub found: bool,
}

impl PathResult {
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            path: Vec::new(),
            edges: Vec::new(),
            total_weight: 0.0,
            total_cost: 0.0,
            found: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Traversal cost of an edge: stronger relationships are cheaper.
#[must_use]
pub fn edge_cost(edge: &Edge) -> f32 {
    1.0 / edge.weight.max(MIN_WEIGHT)
}

/// Cheapest directed path from `from_id` to `to_id`.
///
/// An unreachable target is a normal outcome reported as
/// [`PathResult::not_found`]. Between two nodes joined by several edges the
/// cheapest one is reported.
///
/// # Errors
///
/// Returns [`tessera_core::Error::NotFound`] if either id is not a node.
pub fn shortest_path(graph: &GraphData, from_id: &str, to_id: &str) -> Result<PathResult> {
    let (from_idx, from_node) = graph.require(from_id)?;
    let (to_idx, _) = graph.require(to_id)?;

    if from_idx == to_idx {
        return Ok(PathResult {
            path: vec![from_node.clone()],
            edges: Vec::new(),
            total_weight: 0.0,
            total_cost: 0.0,
            found: true,
        });
    }

    let pg = graph.graph();
    let Some((total_cost, indices)) = astar(
        pg,
        from_idx,
        |n| n == to_idx,
        |e| edge_cost(e.weight()),
        |_| 0.0_f32,
    ) else {
        return Ok(PathResult::not_found());
    };

    let mut edges = Vec::with_capacity(indices.len().saturating_sub(1));
    for pair in indices.windows(2) {
        let cheapest = pg
            .edges_connecting(pair[0], pair[1])
            .map(|e| e.weight())
            .min_by(|a, b| edge_cost(a).total_cmp(&edge_cost(b)));
        if let Some(edge) = cheapest {
            edges.push(edge.clone());
        }
    }

    Ok(PathResult {
        path: indices.iter().map(|&idx| pg[idx].clone()).collect(),
        total_weight: edges.iter().map(|e| e.weight).sum(),
        edges,
        total_cost,
        found: true,
    })
}
