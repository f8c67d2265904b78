//! Graph snapshots on disk.
//!
//! A snapshot is one JSON document:
//!
//! ```json
//! {
//!   "nodes": [ { "id": "...", "title": "...", ... } ],
//!   "edges": [ { "from": "...", "to": "...", "relationship": "prerequisite", ... } ],
//!   "metadata": {
//!     "built_at": "2026-01-01T00:00:00Z",
//!     "builder_version": "0.4.0",
//!     "content_fingerprint": "blake3:...",
//!     "source_record_count": 42
//!   }
//! }
//! ```
//!
//! Writes go to a sibling temp file that is renamed over the target while
//! holding an exclusive advisory lock; reads hold a shared lock. Loading
//! applies the same dangling-edge and duplicate policy as the builder.

use crate::store::{EdgeInsert, GraphData};
use crate::types::{Edge, Node};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tessera_core::lock::{DEFAULT_LOCK_TIMEOUT, SnapshotReadLock, SnapshotWriteLock, lock_path_for};
use tessera_core::{Error, Result};
use tracing::{debug, info, instrument, warn};

/// Version string stamped into snapshots written by this crate.
pub const BUILDER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub built_at: DateTime<Utc>,
    pub builder_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_record_count: Option<usize>,
}

impl Default for GraphMetadata {
    fn default() -> Self {
        Self {
            built_at: Utc::now(),
            builder_version: BUILDER_VERSION.to_string(),
            content_fingerprint: None,
            source_record_count: None,
        }
    }
}

impl GraphMetadata {
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.content_fingerprint = Some(fingerprint.into());
        self
    }

    #[must_use]
    pub const fn with_record_count(mut self, count: usize) -> Self {
        self.source_record_count = Some(count);
        self
    }
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    nodes: Vec<&'a Node>,
    edges: &'a [Edge],
    metadata: &'a GraphMetadata,
}

#[derive(Deserialize)]
struct SnapshotIn {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    metadata: GraphMetadata,
}

#[derive(Deserialize)]
struct MetadataOnly {
    metadata: GraphMetadata,
}

/// A loaded snapshot and what was discarded while rebuilding it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub graph: GraphData,
    pub metadata: GraphMetadata,
    /// Edges whose endpoints were missing from the node list.
    pub dangling_edges: usize,
    /// Edges that repeated an earlier (from, to, relationship).
    pub duplicate_edges: usize,
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

/// Write `graph` to `destination`, creating parent directories.
///
/// `metadata` defaults to "built now by this version" with no fingerprint.
///
/// # Errors
///
/// Returns [`Error::Io`] for file-system failures or lock timeouts and
/// [`Error::Serialization`] if encoding fails.
#[instrument(skip(graph, metadata), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn save(graph: &GraphData, destination: &Path, metadata: Option<GraphMetadata>) -> Result<()> {
    save_with_timeout(graph, destination, metadata, DEFAULT_LOCK_TIMEOUT)
}

/// [`save`] with an explicit lock wait.
///
/// # Errors
///
/// See [`save`].
pub fn save_with_timeout(
    graph: &GraphData,
    destination: &Path,
    metadata: Option<GraphMetadata>,
    timeout: Duration,
) -> Result<()> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let metadata = metadata.unwrap_or_default();
    let document = SnapshotOut {
        nodes: graph.iter_nodes().collect(),
        edges: graph.edges(),
        metadata: &metadata,
    };
    let encoded = serde_json::to_vec_pretty(&document)
        .map_err(|e| Error::serialization(format!("encode snapshot: {e}")))?;

    let _lock = SnapshotWriteLock::acquire(&lock_path_for(destination), timeout)?;

    let tmp = temp_path_for(destination);
    let mut file = fs::File::create(&tmp).map_err(|e| Error::io_with_path(e, &tmp))?;
    file.write_all(&encoded)
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::io_with_path(e, &tmp))?;
    drop(file);
    fs::rename(&tmp, destination).map_err(|e| Error::io_with_path(e, destination))?;

    info!(path = %destination.display(), bytes = encoded.len(), "saved graph snapshot");
    Ok(())
}

pub(crate) fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    destination.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Rebuild the graph stored at `source`.
///
/// # Errors
///
/// Returns a path-tagged [`Error::Io`] if the file cannot be read and
/// [`Error::Serialization`] if it is not a valid snapshot.
pub fn load(source: &Path) -> Result<GraphData> {
    load_snapshot(source).map(|snapshot| snapshot.graph)
}

/// Rebuild the graph stored at `source`, keeping its metadata and drop counts.
///
/// # Errors
///
/// See [`load`].
#[instrument]
pub fn load_snapshot(source: &Path) -> Result<Snapshot> {
    let raw = read_locked(source)?;
    let document: SnapshotIn = serde_json::from_slice(&raw).map_err(|e| {
        Error::serialization(format!("malformed snapshot {}: {e}", source.display()))
    })?;

    let mut graph = GraphData::new();
    for node in document.nodes {
        graph.add_node(node);
    }

    let mut dangling_edges = 0;
    let mut duplicate_edges = 0;
    for edge in document.edges {
        match graph.insert_edge(edge) {
            EdgeInsert::Added => {}
            EdgeInsert::Dangling => dangling_edges += 1,
            EdgeInsert::Duplicate => duplicate_edges += 1,
        }
    }

    if dangling_edges + duplicate_edges > 0 {
        warn!(
            path = %source.display(),
            dangling_edges,
            duplicate_edges,
            "dropped edges while loading snapshot"
        );
    }
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "loaded graph snapshot"
    );

    Ok(Snapshot {
        graph,
        metadata: document.metadata,
        dangling_edges,
        duplicate_edges,
    })
}

/// Read only the metadata block of a snapshot.
///
/// # Errors
///
/// See [`load`].
pub fn load_metadata(source: &Path) -> Result<GraphMetadata> {
    let raw = read_locked(source)?;
    let document: MetadataOnly = serde_json::from_slice(&raw).map_err(|e| {
        Error::serialization(format!("malformed snapshot {}: {e}", source.display()))
    })?;
    Ok(document.metadata)
}

fn read_locked(source: &Path) -> Result<Vec<u8>> {
    if !source.exists() {
        return Err(Error::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "snapshot does not exist"),
            source,
        ));
    }
    let _lock = SnapshotReadLock::acquire(&lock_path_for(source), DEFAULT_LOCK_TIMEOUT)?;
    fs::read(source).map_err(|e| Error::io_with_path(e, source))
}

// ---------------------------------------------------------------------------
// Freshness
// ---------------------------------------------------------------------------

/// Whether the snapshot at `cache_path` was built from content with
/// `current_fingerprint`.
///
/// Missing, unreadable or fingerprint-less snapshots are simply not fresh.
#[must_use]
pub fn is_fresh(cache_path: &Path, current_fingerprint: &str) -> bool {
    match load_metadata(cache_path) {
        Ok(metadata) => metadata.content_fingerprint.as_deref() == Some(current_fingerprint),
        Err(e) => {
            debug!(path = %cache_path.display(), error = %e, "cache not usable");
            false
        }
    }
}
