//! Guarded handle for serving a built graph to many readers.
//!
//! A [`GraphData`] is owned by whoever built it. Once it is handed to a
//! server it goes behind a [`SharedGraph`]: any number of concurrent
//! readers, one writer at a time, and writers limited to
//! [`SharedGraph::record_interaction`] and [`SharedGraph::replace`].

use crate::store::{EdgeInsert, GraphData};
use crate::types::{Edge, Node, NodeType};
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;
use tessera_core::{Error, Result};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<GraphData>>,
}

impl SharedGraph {
    #[must_use]
    pub fn new(graph: GraphData) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    /// Read access for queries. Hold the guard only as long as needed:
    /// writers wait for every outstanding reader.
    pub fn read(&self) -> RwLockReadGuard<'_, GraphData> {
        self.inner.read()
    }

    /// Add an interaction node and the edges that tie it into the graph.
    ///
    /// `node` is tagged [`NodeType::Interaction`] unless it already carries
    /// a custom type. Every edge endpoint must be an existing node or the
    /// new node itself; nothing is written if one is missing. Returns the
    /// number of edges added, which excludes duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown edge endpoint.
    pub fn record_interaction(&self, mut node: Node, edges: Vec<Edge>) -> Result<usize> {
        if node.node_type == NodeType::Domain {
            node.node_type = NodeType::Interaction;
        }

        let mut graph = self.inner.write();
        for edge in &edges {
            for endpoint in [&edge.from, &edge.to] {
                if *endpoint != node.id && !graph.contains_node(endpoint) {
                    return Err(Error::not_found("node", endpoint.as_str()));
                }
            }
        }

        let node_id = node.id.clone();
        graph.add_node(node);
        let added = edges
            .into_iter()
            .filter(|edge| graph.insert_edge(edge.clone()) == EdgeInsert::Added)
            .count();
        debug!(node = %node_id, edges = added, "recorded interaction");
        Ok(added)
    }

    /// Swap in a freshly built graph. Readers holding a guard keep seeing
    /// the old one until they release it.
    pub fn replace(&self, graph: GraphData) -> GraphData {
        info!(nodes = graph.node_count(), edges = graph.edge_count(), "replacing shared graph");
        std::mem::replace(&mut *self.inner.write(), graph)
    }
}

impl From<GraphData> for SharedGraph {
    fn from(graph: GraphData) -> Self {
        Self::new(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeOrigin, Relationship};
    use std::thread;

    fn base() -> GraphData {
        let mut g = GraphData::new();
        g.add_node(Node::new("modes", "Modes"));
        g.add_node(Node::new("scales", "Scales"));
        g.add_edge(Edge::new("modes", "scales", Relationship::Prerequisite)).unwrap();
        g
    }

    #[test]
    fn interaction_is_added_and_tagged() {
        let shared = SharedGraph::new(base());
        let added = shared
            .record_interaction(
                Node::new("q-1", "What is a mode?"),
                vec![
                    Edge::new("q-1", "modes", Relationship::AnswersQuestion)
                        .with_origin(EdgeOrigin::Inferred),
                ],
            )
            .unwrap();
        assert_eq!(added, 1);

        let graph = shared.read();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.get_node("q-1").unwrap().node_type, NodeType::Interaction);
    }

    #[test]
    fn unknown_endpoint_writes_nothing() {
        let shared = SharedGraph::new(base());
        let err = shared
            .record_interaction(
                Node::new("q-2", "Q"),
                vec![
                    Edge::new("q-2", "modes", Relationship::RelatesTo),
                    Edge::new("q-2", "ghost", Relationship::RelatesTo),
                ],
            )
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(shared.read().node_count(), 2);
        assert_eq!(shared.read().edge_count(), 1);
    }

    #[test]
    fn replace_returns_previous_graph() {
        let shared = SharedGraph::new(GraphData::new());
        let old = shared.replace(base());
        assert!(old.is_empty());
        assert_eq!(shared.read().node_count(), 2);
    }

    #[test]
    fn concurrent_readers_and_writer() {
        let shared = SharedGraph::new(base());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let id = format!("q-{i}");
                    shared
                        .record_interaction(
                            Node::new(id.clone(), "Q"),
                            vec![Edge::new(id, "scales", Relationship::RelatesTo)],
                        )
                        .unwrap();
                    shared.read().node_count()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap() >= 3);
        }
        assert_eq!(shared.read().node_count(), 6);
        assert_eq!(shared.read().edge_count(), 5);
    }
}
