use crate::store::GraphData;
use crate::types::{Node, Relationship};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, VecDeque};
use tessera_core::Result;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PrerequisitesResult {
    pub target: Node,
    /// Transitive prerequisites of `target`, foundations first.
    pub ordered: Vec<Node>,
    /// The prerequisite chain contains a cycle. `ordered` is then sorted
    /// by id rather than by dependency.
    pub has_cycles: bool,
}

/// Everything `target_id` transitively requires, in learning order.
///
/// Follows outgoing `Prerequisite` edges (`a -[Prerequisite]-> b` means `a`
/// requires `b`) and orders the result so every node appears after the
/// nodes it requires. The target itself is never included.
///
/// # Errors
///
/// Returns [`tessera_core::Error::NotFound`] if `target_id` is not a node.
pub fn prerequisites_sorted(graph: &GraphData, target_id: &str) -> Result<PrerequisitesResult> {
    let (target_idx, target) = graph.require(target_id)?;

    // Collect the prerequisite closure in BFS order, target included.
    let mut local: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut sub: DiGraph<NodeIndex, ()> = DiGraph::new();
    local.insert(target_idx, sub.add_node(target_idx));
    let mut queue = VecDeque::from([target_idx]);

    while let Some(current) = queue.pop_front() {
        for (next, edge) in graph.incident(current, Direction::Outgoing) {
            if edge.relationship != Relationship::Prerequisite {
                continue;
            }
            let next_local = *local.entry(next).or_insert_with(|| {
                queue.push_back(next);
                sub.add_node(next)
            });
            sub.update_edge(local[&current], next_local, ());
        }
    }

    let pg = graph.graph();
    let (ordered, has_cycles) = match toposort(&sub, None) {
        Ok(sorted) => {
            // toposort puts requirers before requirements; learning order
            // is the reverse.
            let ordered = sorted
                .into_iter()
                .rev()
                .map(|l| sub[l])
                .filter(|&idx| idx != target_idx)
                .map(|idx| pg[idx].clone())
                .collect();
            (ordered, false)
        }
        Err(cycle) => {
            debug!(
                target = target_id,
                at = %pg[sub[cycle.node_id()]].id,
                "prerequisite cycle; falling back to id order"
            );
            let mut ordered: Vec<Node> = sub
                .node_weights()
                .filter(|&&idx| idx != target_idx)
                .map(|&idx| pg[idx].clone())
                .collect();
            ordered.sort_by(|a, b| a.id.cmp(&b.id));
            (ordered, true)
        }
    };

    Ok(PrerequisitesResult {
        target: target.clone(),
        ordered,
        has_cycles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Edge;

    fn graph(edges: &[(&str, &str)]) -> GraphData {
        let mut g = GraphData::new();
        for (from, to) in edges {
            g.add_node(Node::new(*from, *from));
            g.add_node(Node::new(*to, *to));
        }
        for (from, to) in edges {
            g.add_edge(Edge::new(*from, *to, Relationship::Prerequisite)).unwrap();
        }
        g
    }

    fn ids(result: &PrerequisitesResult) -> Vec<&str> {
        result.ordered.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn direct_prerequisite() {
        let result = prerequisites_sorted(&graph(&[("a", "b")]), "a").unwrap();
        assert_eq!(ids(&result), vec!["b"]);
        assert!(!result.has_cycles);
    }

    #[test]
    fn foundations_come_first() {
        // calculus requires algebra and limits; limits requires algebra;
        // algebra requires arithmetic.
        let g = graph(&[
            ("calculus", "algebra"),
            ("calculus", "limits"),
            ("limits", "algebra"),
            ("algebra", "arithmetic"),
        ]);
        let result = prerequisites_sorted(&g, "calculus").unwrap();
        assert_eq!(ids(&result), vec!["arithmetic", "algebra", "limits"]);
    }

    #[test]
    fn leaf_has_no_prerequisites() {
        let result = prerequisites_sorted(&graph(&[("a", "b")]), "b").unwrap();
        assert!(result.ordered.is_empty());
        assert!(!result.has_cycles);
    }

    #[test]
    fn other_relationships_are_ignored() {
        let mut g = graph(&[("a", "b")]);
        g.add_node(Node::new("c", "c"));
        g.add_edge(Edge::new("a", "c", Relationship::LeadsTo)).unwrap();
        let result = prerequisites_sorted(&g, "a").unwrap();
        assert_eq!(ids(&result), vec!["b"]);
    }

    #[test]
    fn cycle_is_reported_for_every_member() {
        let g = graph(&[("a", "b"), ("b", "c"), ("c", "a")]);
        for id in ["a", "b", "c"] {
            let result = prerequisites_sorted(&g, id).unwrap();
            assert!(result.has_cycles, "{id}");
            assert_eq!(result.ordered.len(), 2);
        }
        let result = prerequisites_sorted(&g, "a").unwrap();
        assert_eq!(ids(&result), vec!["b", "c"]);
    }

    #[test]
    fn unknown_target_is_not_found() {
        let err = prerequisites_sorted(&graph(&[("a", "b")]), "nope").unwrap_err();
        assert!(err.is_not_found());
    }
}
