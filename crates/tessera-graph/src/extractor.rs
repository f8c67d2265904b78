//! The domain boundary.
//!
//! A [`GraphExtractor`] turns one content record into domain node/edge data
//! (fallible) and converts that data into generic [`Node`]s and [`Edge`]s
//! (infallible). The builder is generic over the extractor and never sees a
//! concrete domain type.

use crate::types::{Edge, Node};
use serde_yaml::Value;
use std::path::Path;
use tessera_core::Result;

/// Capability a knowledge domain implements to feed the graph builder.
///
/// `extract_*` may run concurrently on several records, hence `Send + Sync`.
pub trait GraphExtractor: Send + Sync {
    /// Domain-specific node payload.
    type NodeData: Send;
    /// Domain-specific relationship payload.
    type EdgeData: Send;

    /// Interpret one record as a node.
    ///
    /// `frontmatter` is the record's generic front-matter document
    /// (`Value::Null` when it has none). Implementations must derive a
    /// stable id and a title.
    ///
    /// # Errors
    ///
    /// Returns [`tessera_core::Error::Parse`] when the record cannot be
    /// interpreted.
    fn extract_node(
        &self,
        base_path: &Path,
        record_path: &Path,
        frontmatter: &Value,
        body: &str,
    ) -> Result<Self::NodeData>;

    /// Interpret one record's relationships. `Ok(None)` means the record
    /// declares none.
    ///
    /// # Errors
    ///
    /// Returns [`tessera_core::Error::Parse`] when declared relationships
    /// are malformed.
    fn extract_edges(&self, frontmatter: &Value, body: &str) -> Result<Option<Self::EdgeData>>;

    fn to_graph_node(&self, node_data: &Self::NodeData) -> Node;

    /// Edges originating at `from_id`. Targets may name nodes that do not
    /// exist; the builder drops those.
    fn to_graph_edges(&self, from_id: &str, edge_data: &Self::EdgeData) -> Vec<Edge>;

    /// Glob selecting records under the content path, relative to it.
    fn content_pattern(&self) -> &str {
        "**/*"
    }

    /// Human-readable domain name for diagnostics.
    fn name(&self) -> &str;
}
