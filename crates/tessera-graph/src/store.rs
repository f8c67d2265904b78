//! The graph data store.
//!
//! [`GraphData`] owns a petgraph [`DiGraph`] whose weights are the full
//! [`Node`]/[`Edge`] values, an id → [`NodeIndex`] map for O(1) lookup, the
//! flattened edge list in insertion order and the set of edge keys used for
//! duplicate suppression.
//!
//! Nodes iterate in insertion (index) order, which is also the order
//! persistence writes them and statistics break ties by.

use crate::types::{Edge, EdgeKey, Node};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use tessera_core::{Error, Result};

/// Outcome of [`GraphData::insert_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Added,
    /// An edge with the same [`EdgeKey`] already exists.
    Duplicate,
    /// At least one endpoint is not a node in this graph.
    Dangling,
}

#[derive(Debug, Clone, Default)]
pub struct GraphData {
    graph: DiGraph<Node, Edge>,
    node_indices: HashMap<String, NodeIndex>,
    edges: Vec<Edge>,
    edge_keys: HashSet<EdgeKey>,
}

impl GraphData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-assembled petgraph graph.
    ///
    /// The graph is taken as is, including any duplicate edges, so
    /// structural validation can audit graphs this store would not build
    /// itself. Later node ids shadow earlier ones in the index map.
    #[must_use]
    pub fn from_petgraph(graph: DiGraph<Node, Edge>) -> Self {
        let node_indices = graph
            .node_indices()
            .map(|idx| (graph[idx].id.clone(), idx))
            .collect();
        let edges: Vec<Edge> = graph.edge_weights().cloned().collect();
        let edge_keys = edges.iter().map(Edge::key).collect();
        Self {
            graph,
            node_indices,
            edges,
            edge_keys,
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    #[must_use]
    pub fn graph(&self) -> &DiGraph<Node, Edge> {
        &self.graph
    }

    #[must_use]
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.get_index(id).map(|idx| &self.graph[idx])
    }

    #[must_use]
    pub fn get_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_indices.get(id).copied()
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Look up a node or fail with [`Error::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when `id` is not in the graph.
    pub fn require(&self, id: &str) -> Result<(NodeIndex, &Node)> {
        let idx = self
            .get_index(id)
            .ok_or_else(|| Error::not_found("node", id))?;
        Ok((idx, &self.graph[idx]))
    }

    /// Nodes in insertion order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.iter_nodes().map(|n| n.id.as_str())
    }

    /// Edges in insertion order.
    pub fn iter_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn contains_edge_key(&self, key: &EdgeKey) -> bool {
        self.edge_keys.contains(key)
    }

    #[must_use]
    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    #[must_use]
    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Insert `node`, or return the index of the node that already has its id.
    ///
    /// Existing nodes are never replaced: ids are immutable once assigned.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        if let Some(idx) = self.get_index(&node.id) {
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_indices.insert(id, idx);
        idx
    }

    /// Insert `edge` unless it is dangling or a duplicate.
    pub fn insert_edge(&mut self, edge: Edge) -> EdgeInsert {
        let (Some(from), Some(to)) = (self.get_index(&edge.from), self.get_index(&edge.to)) else {
            return EdgeInsert::Dangling;
        };
        if !self.edge_keys.insert(edge.key()) {
            return EdgeInsert::Duplicate;
        }
        self.graph.add_edge(from, to, edge.clone());
        self.edges.push(edge);
        EdgeInsert::Added
    }

    /// Insert `edge`, requiring both endpoints to exist.
    ///
    /// Returns `false` when the edge duplicates one already present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] naming the first missing endpoint.
    pub fn add_edge(&mut self, edge: Edge) -> Result<bool> {
        for endpoint in [&edge.from, &edge.to] {
            if !self.contains_node(endpoint) {
                return Err(Error::not_found("node", endpoint.as_str()));
            }
        }
        Ok(self.insert_edge(edge) == EdgeInsert::Added)
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let idx = self.node_indices.remove(id)?;
        let node = self.graph.remove_node(idx)?;

        self.edges.retain(|e| e.from != id && e.to != id);
        self.edge_keys = self.edges.iter().map(Edge::key).collect();

        // petgraph moves the last node into the freed slot.
        self.node_indices = self
            .graph
            .node_indices()
            .map(|ni| (self.graph[ni].id.clone(), ni))
            .collect();

        Some(node)
    }

    /// Edges leaving or entering `idx`, with the node at the far end.
    pub(crate) fn incident(
        &self,
        idx: NodeIndex,
        direction: Direction,
    ) -> impl Iterator<Item = (NodeIndex, &Edge)> {
        self.graph
            .edges_directed(idx, direction)
            .map(move |e| match direction {
                Direction::Outgoing => (e.target(), e.weight()),
                Direction::Incoming => (e.source(), e.weight()),
            })
    }
}
