//! Read-only graph algorithms.
//!
//! Every function here takes `&GraphData` and never mutates it, so any
//! number of queries may run concurrently against one snapshot.
//!
//! - [`neighborhood`]: bounded breadth-first exploration in both directions.
//! - [`shortest_path`]: weighted path search, cost `1 / weight`.
//! - [`prerequisites_sorted`]: dependency ordering over `Prerequisite` edges.
//! - [`calculate_centrality`] and [`find_bridges`]: structural importance.
//! - [`get_related`]: typed relationship lookup in one direction.

mod centrality;
mod neighborhood;
mod path;
mod prerequisites;
mod related;

pub use centrality::{BridgeScore, CentralityScore, bridge_scores, calculate_centrality, find_bridges};
pub use neighborhood::{MAX_RADIUS, NeighborhoodResult, neighborhood, neighborhood_with};
pub use path::{PathResult, edge_cost, shortest_path};
pub use prerequisites::{PrerequisitesResult, prerequisites_sorted};
pub use related::get_related;
