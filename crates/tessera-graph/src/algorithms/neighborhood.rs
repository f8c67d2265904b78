use crate::store::GraphData;
use crate::types::{Edge, Node, Relationship};
use petgraph::Direction;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};
use tessera_core::Result;
use tessera_core::config::QueryConfig;

/// Hard cap on exploration radius.
pub const MAX_RADIUS: usize = 10;

#[derive(Debug, Clone)]
pub struct NeighborhoodResult {
    pub center: Node,
    /// Nodes reached within the radius, excluding the center, in BFS order.
    pub nodes: Vec<Node>,
    /// Every traversed edge; both endpoints lie within the radius.
    pub edges: Vec<Edge>,
    /// Hop distance from the center, including the center itself at 0.
    pub distances: HashMap<String, usize>,
}

impl NeighborhoodResult {
    /// Center first, then the reached nodes.
    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        std::iter::once(&self.center).chain(&self.nodes)
    }
}

/// Nodes within `radius` hops of `center_id`, following edges in both
/// directions.
///
/// `radius` is clamped to [`MAX_RADIUS`]. With a `relationship_filter`,
/// only edges of those relationships are traversed.
///
/// # Errors
///
/// Returns [`tessera_core::Error::NotFound`] if `center_id` is not a node.
pub fn neighborhood(
    graph: &GraphData,
    center_id: &str,
    radius: usize,
    relationship_filter: Option<&[Relationship]>,
) -> Result<NeighborhoodResult> {
    explore(graph, center_id, radius.min(MAX_RADIUS), relationship_filter)
}

/// [`neighborhood`] driven by query config: `radius` defaults to
/// `default_radius` and is clamped to `max_radius` (itself never above
/// [`MAX_RADIUS`]).
///
/// # Errors
///
/// See [`neighborhood`].
pub fn neighborhood_with(
    graph: &GraphData,
    center_id: &str,
    radius: Option<usize>,
    relationship_filter: Option<&[Relationship]>,
    config: &QueryConfig,
) -> Result<NeighborhoodResult> {
    let cap = config.max_radius.min(MAX_RADIUS);
    let radius = radius.unwrap_or(config.default_radius).min(cap);
    explore(graph, center_id, radius, relationship_filter)
}

fn explore(
    graph: &GraphData,
    center_id: &str,
    radius: usize,
    filter: Option<&[Relationship]>,
) -> Result<NeighborhoodResult> {
    let (center_idx, center) = graph.require(center_id)?;
    let pg = graph.graph();

    let mut visited: HashSet<NodeIndex> = HashSet::from([center_idx]);
    let mut seen_edges: HashSet<EdgeIndex> = HashSet::new();
    let mut distances = HashMap::from([(center.id.clone(), 0)]);
    let mut queue = VecDeque::from([(center_idx, 0_usize)]);
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    while let Some((current, dist)) = queue.pop_front() {
        if dist >= radius {
            continue;
        }

        for direction in [Direction::Outgoing, Direction::Incoming] {
            for edge_ref in pg.edges_directed(current, direction) {
                let edge = edge_ref.weight();
                if filter.is_some_and(|f| !f.contains(&edge.relationship)) {
                    continue;
                }

                let neighbor = match direction {
                    Direction::Outgoing => edge_ref.target(),
                    Direction::Incoming => edge_ref.source(),
                };

                if seen_edges.insert(edge_ref.id()) {
                    edges.push(edge.clone());
                }
                if visited.insert(neighbor) {
                    let node = &pg[neighbor];
                    distances.insert(node.id.clone(), dist + 1);
                    nodes.push(node.clone());
                    queue.push_back((neighbor, dist + 1));
                }
            }
        }
    }

    Ok(NeighborhoodResult {
        center: center.clone(),
        nodes,
        edges,
        distances,
    })
}
