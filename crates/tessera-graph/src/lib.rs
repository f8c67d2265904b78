#![forbid(unsafe_code)]
//! tessera-graph library.
//!
//! A domain-agnostic knowledge graph. A [`GraphExtractor`] turns content
//! records into nodes and edges; [`GraphBuilder`] runs it over a content
//! tree in two phases (all nodes, then all edges) and merges curated manual
//! edges. The resulting [`GraphData`] answers path, neighborhood,
//! prerequisite, centrality and bridge queries, can be audited with
//! [`validation::validate`], and round-trips through a JSON snapshot.
//!
//! # Conventions
//!
//! - **Errors**: Return [`tessera_core::Result`]. Per-record failures during a
//!   build follow the configured [`tessera_core::config::ErrorPolicy`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Determinism**: Query results are ordered; ties break by node id.

pub mod algorithms;
pub mod builder;
pub mod discovery;
pub mod extractor;
pub mod fingerprint;
pub mod persistence;
pub mod shared;
pub mod stats;
pub mod store;
pub mod summary;
pub mod types;
pub mod validation;

pub use builder::{BuildError, BuildStats, GraphBuilder, ManualEdge};
pub use extractor::GraphExtractor;
pub use shared::SharedGraph;
pub use stats::GraphStats;
pub use store::GraphData;
pub use summary::{EdgeInfo, NeighborInfo, NodeSummary, PathStep};
pub use types::{Edge, EdgeOrigin, Node, NodeType, Relationship};
pub use validation::{ValidationResult, validate};
