//! Two-phase graph construction.
//!
//! # Pipeline
//!
//! 1. **Discovery.** Records under the content path that match the
//!    extractor's `content_pattern` are listed and sorted.
//! 2. **Extraction.** Each record is read, split into front-matter and body,
//!    and handed to [`GraphExtractor::extract_node`] and
//!    [`GraphExtractor::extract_edges`]. This step runs on a bounded rayon
//!    pool; results come back in discovery order.
//! 3. **Phase 1: nodes.** Extracted nodes are inserted serially. Record
//!    failures are handled by the [`ErrorPolicy`]. Edge data is buffered
//!    per source node because its targets may not exist yet.
//! 4. **Phase 2: edges.** Only after every node is committed are buffered
//!    edges converted and inserted. Edges naming an absent node are dropped
//!    and listed in [`BuildStats::dangling_refs`]; repeats are counted in
//!    [`BuildStats::deduped_edges`].
//! 5. **Manual edges.** An optional curated JSON list is merged with the
//!    same existence check and duplicate suppression.
//!
//! With a cache path configured, a snapshot whose fingerprint matches the
//! current content is loaded instead, and a fresh build is saved back.
//!
//! The builder's own files (the cache snapshot, its lock and temp siblings,
//! the manual-edges file) are never treated as records, even when they sit
//! inside the content tree.

use crate::discovery::{ContentPattern, discover_records};
use crate::extractor::GraphExtractor;
use crate::fingerprint::fingerprint_records;
use crate::persistence::{self, GraphMetadata};
use crate::store::{EdgeInsert, GraphData};
use crate::types::{Edge, EdgeOrigin, Relationship};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tessera_core::config::{BuildConfig, ErrorPolicy, FingerprintMode};
use tessera_core::content::{ContentReader, FrontmatterSplitter, FsReader, YamlFrontmatter};
use tessera_core::lock::lock_path_for;
use tessera_core::{Error, ErrorCode, Result};
use tracing::{debug, info, instrument, warn};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One record (or the manual-edges file) that failed during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError {
    pub file: PathBuf,
    pub code: ErrorCode,
    pub message: String,
}

impl BuildError {
    fn new(file: &Path, err: &Error) -> Self {
        Self {
            file: file.to_path_buf(),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.file.display(), self.message, self.code)
    }
}

/// Counters and diagnostics for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub nodes_created: usize,
    /// Edges inserted from records. Manual edges are counted separately.
    pub edges_created: usize,
    /// Records the build attempted, successful or not.
    pub files_processed: usize,
    /// Records that produced no node.
    pub files_skipped: usize,
    /// Failures surfaced under [`ErrorPolicy::Collect`].
    pub errors: Vec<BuildError>,
    pub manual_edges_loaded: usize,
    /// `from -[rel]-> to` for every edge dropped for a missing endpoint.
    pub dangling_refs: Vec<String>,
    pub deduped_edges: usize,
    /// Records whose id was already taken by an earlier record.
    pub duplicate_node_ids: Vec<String>,
    pub from_cache: bool,
}

impl BuildStats {
    /// Number of edges dropped because an endpoint did not exist.
    #[must_use]
    pub fn dangling_count(&self) -> usize {
        self.dangling_refs.len()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A curated edge from the manual-edges document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualEdge {
    pub from: String,
    pub to: String,
    /// Relationship name, parsed leniently with [`Relationship::parse`].
    pub relationship: String,
    #[serde(default)]
    pub weight: Option<f32>,
}

impl ManualEdge {
    #[must_use]
    pub fn to_edge(&self) -> Edge {
        let relationship = Relationship::parse(&self.relationship);
        let weight = self
            .weight
            .unwrap_or_else(|| relationship.default_weight());
        Edge::new(&self.from, &self.to, relationship)
            .with_weight(weight)
            .with_origin(EdgeOrigin::Manual)
    }
}

/// Build stage reported to a progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Discovery,
    Nodes,
    Edges,
    ManualEdges,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProgress {
    pub phase: BuildPhase,
    pub completed: usize,
    pub total: usize,
}

/// Progress observer. Invoked synchronously on the building thread.
pub type ProgressCallback = Box<dyn Fn(&BuildProgress) + Send + Sync>;

// ---------------------------------------------------------------------------
// GraphBuilder
// ---------------------------------------------------------------------------

struct Extracted<E: GraphExtractor> {
    node: E::NodeData,
    edges: Result<Option<E::EdgeData>>,
}

pub struct GraphBuilder<E: GraphExtractor> {
    extractor: E,
    content_path: Option<PathBuf>,
    manual_edges_path: Option<PathBuf>,
    error_policy: ErrorPolicy,
    cache_path: Option<PathBuf>,
    skip_cache: bool,
    parallelism: usize,
    fingerprint_mode: FingerprintMode,
    reader: Box<dyn ContentReader>,
    splitter: Box<dyn FrontmatterSplitter>,
    progress: Option<ProgressCallback>,
}

impl<E: GraphExtractor> fmt::Debug for GraphBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("extractor", &self.extractor.name())
            .field("content_path", &self.content_path)
            .field("manual_edges_path", &self.manual_edges_path)
            .field("error_policy", &self.error_policy)
            .field("cache_path", &self.cache_path)
            .field("skip_cache", &self.skip_cache)
            .field("parallelism", &self.parallelism)
            .finish_non_exhaustive()
    }
}

impl<E: GraphExtractor> GraphBuilder<E> {
    /// Builder with the `Collect` policy, no cache, sequential extraction,
    /// a file-system reader and YAML front-matter.
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            content_path: None,
            manual_edges_path: None,
            error_policy: ErrorPolicy::default(),
            cache_path: None,
            skip_cache: false,
            parallelism: 1,
            fingerprint_mode: FingerprintMode::default(),
            reader: Box::new(FsReader),
            splitter: Box::new(YamlFrontmatter),
            progress: None,
        }
    }

    /// Builder wired from the `[build]` config section.
    pub fn from_config(extractor: E, config: &BuildConfig) -> Self {
        let mut builder = Self::new(extractor)
            .with_error_policy(config.error_policy)
            .with_parallelism(config.parallelism)
            .with_fingerprint_mode(config.fingerprint);
        builder.content_path.clone_from(&config.content_path);
        builder.manual_edges_path.clone_from(&config.manual_edges_path);
        builder.cache_path.clone_from(&config.cache_path);
        builder
    }

    #[must_use]
    pub fn with_content_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.content_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_manual_edges(mut self, path: impl Into<PathBuf>) -> Self {
        self.manual_edges_path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    #[must_use]
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Ignore any cached snapshot and always rebuild (the result is still saved).
    #[must_use]
    pub const fn skip_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }

    /// Bound on records extracted concurrently. `0` is treated as `1`.
    #[must_use]
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = threads.max(1);
        self
    }

    #[must_use]
    pub const fn with_fingerprint_mode(mut self, mode: FingerprintMode) -> Self {
        self.fingerprint_mode = mode;
        self
    }

    #[must_use]
    pub fn with_reader(mut self, reader: impl ContentReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    #[must_use]
    pub fn with_splitter(mut self, splitter: impl FrontmatterSplitter + 'static) -> Self {
        self.splitter = Box::new(splitter);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, callback: impl Fn(&BuildProgress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub const fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Fingerprint of the current content (and manual-edges file, if any).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] without a content path, otherwise
    /// propagates discovery and file-access failures.
    pub fn fingerprint(&self) -> Result<String> {
        let content_path = self.require_content_path()?;
        let records = self.discover(content_path)?;
        self.fingerprint_for(content_path, records)
    }

    /// Records selected by the extractor's pattern, minus the builder's own
    /// cache and manual-edges files.
    fn discover(&self, content_path: &Path) -> Result<Vec<PathBuf>> {
        let pattern = ContentPattern::new(self.extractor.content_pattern())?;
        let mut records = discover_records(content_path, &pattern)?;

        let own = self.own_files();
        if !own.is_empty() {
            let before = records.len();
            records.retain(|record| {
                !own.iter()
                    .any(|o| o.file_name() == record.file_name() && resolve(record) == *o)
            });
            if records.len() < before {
                debug!(excluded = before - records.len(), "excluded builder files from records");
            }
        }
        Ok(records)
    }

    fn own_files(&self) -> Vec<PathBuf> {
        let mut own = Vec::new();
        if let Some(cache) = &self.cache_path {
            own.push(resolve(cache));
            own.push(resolve(&lock_path_for(cache)));
            own.push(resolve(&persistence::temp_path_for(cache)));
        }
        if let Some(manual) = &self.manual_edges_path {
            own.push(resolve(manual));
        }
        own
    }

    fn fingerprint_for(&self, content_path: &Path, mut records: Vec<PathBuf>) -> Result<String> {
        if let Some(manual) = self.manual_edges_path.as_ref().filter(|p| p.is_file()) {
            records.push(manual.clone());
        }
        fingerprint_records(content_path, &records, self.fingerprint_mode)
    }

    fn require_content_path(&self) -> Result<&Path> {
        self.content_path
            .as_deref()
            .ok_or_else(|| Error::config("content path not set; call with_content_path()"))
    }

    fn report(&self, phase: BuildPhase, completed: usize, total: usize) {
        if let Some(callback) = &self.progress {
            callback(&BuildProgress {
                phase,
                completed,
                total,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    /// Build the graph.
    ///
    /// Record-level failures follow the configured [`ErrorPolicy`]; under
    /// `Collect` and `Skip` the returned graph holds every record that
    /// extracted cleanly.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no content path is set or the extractor's
    ///   content pattern is invalid.
    /// - [`Error::Io`] if the content path cannot be walked.
    /// - The first record failure in discovery order under `FailFast`.
    #[instrument(skip(self), fields(extractor = self.extractor.name()))]
    pub fn build(&self) -> Result<(GraphData, BuildStats)> {
        let started = Instant::now();
        let content_path = self.require_content_path()?;

        self.report(BuildPhase::Discovery, 0, 0);
        let records = self.discover(content_path)?;
        self.report(BuildPhase::Discovery, records.len(), records.len());

        let fingerprint = match &self.cache_path {
            Some(_) => Some(self.fingerprint_for(content_path, records.clone())?),
            None => None,
        };

        if let (Some(cache_path), Some(fingerprint)) = (&self.cache_path, &fingerprint) {
            if !self.skip_cache && persistence::is_fresh(cache_path, fingerprint) {
                match persistence::load(cache_path) {
                    Ok(graph) => {
                        info!(path = %cache_path.display(), "graph cache is fresh; loaded snapshot");
                        let stats = BuildStats {
                            nodes_created: graph.node_count(),
                            edges_created: graph.edge_count(),
                            from_cache: true,
                            ..BuildStats::default()
                        };
                        self.report(BuildPhase::Done, 1, 1);
                        return Ok((graph, stats));
                    }
                    Err(e) => warn!(error = %e, "fresh cache failed to load; rebuilding"),
                }
            }
        }

        let mut stats = BuildStats::default();
        let mut graph = GraphData::new();

        let extracted = self.extract_all(content_path, &records)?;

        // Phase 1: nodes.
        let total = records.len();
        let mut pending: Vec<(String, E::EdgeData)> = Vec::new();
        for (i, (path, outcome)) in records.iter().zip(extracted).enumerate() {
            stats.files_processed += 1;
            match outcome {
                Ok(Extracted { node, edges }) => {
                    let node = self.extractor.to_graph_node(&node);
                    let id = node.id.clone();
                    if graph.contains_node(&id) {
                        // The whole record is discarded, relationships included.
                        warn!(id = %id, file = %path.display(), "duplicate node id; keeping first");
                        stats.duplicate_node_ids.push(id);
                        self.report(BuildPhase::Nodes, i + 1, total);
                        continue;
                    }
                    graph.add_node(node);
                    stats.nodes_created += 1;
                    match edges {
                        Ok(Some(edge_data)) => pending.push((id, edge_data)),
                        Ok(None) => {}
                        Err(e) => self.handle_failure(path, e, &mut stats, false)?,
                    }
                }
                Err(e) => self.handle_failure(path, e, &mut stats, true)?,
            }
            self.report(BuildPhase::Nodes, i + 1, total);
        }

        // Phase 2: edges. Every node is committed at this point.
        let total = pending.len();
        for (i, (from_id, edge_data)) in pending.iter().enumerate() {
            for edge in self.extractor.to_graph_edges(from_id, edge_data) {
                let described = edge.describe();
                match graph.insert_edge(edge) {
                    EdgeInsert::Added => stats.edges_created += 1,
                    EdgeInsert::Duplicate => stats.deduped_edges += 1,
                    EdgeInsert::Dangling => {
                        debug!(edge = %described, "dropping dangling edge");
                        stats.dangling_refs.push(described);
                    }
                }
            }
            self.report(BuildPhase::Edges, i + 1, total);
        }

        if let Some(manual_path) = &self.manual_edges_path {
            match load_manual_edges(manual_path) {
                Ok(manual) => {
                    let total = manual.len();
                    stats.manual_edges_loaded = merge_manual_edges(&mut graph, &manual, &mut stats);
                    self.report(BuildPhase::ManualEdges, total, total);
                }
                Err(e) => self.handle_failure(manual_path, e, &mut stats, false)?,
            }
        }

        if let (Some(cache_path), Some(fingerprint)) = (&self.cache_path, fingerprint) {
            let metadata = GraphMetadata::default()
                .with_fingerprint(fingerprint)
                .with_record_count(stats.files_processed);
            if let Err(e) = persistence::save(&graph, cache_path, Some(metadata)) {
                warn!(path = %cache_path.display(), error = %e, "failed to save graph cache");
            }
        }

        if !stats.dangling_refs.is_empty() {
            info!(count = stats.dangling_count(), "dropped dangling edge references");
        }
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            files_processed = stats.files_processed,
            files_skipped = stats.files_skipped,
            errors = stats.errors.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "graph build complete"
        );
        self.report(BuildPhase::Done, 1, 1);

        Ok((graph, stats))
    }

    /// Apply the error policy to one failure. `skipped` marks failures
    /// that cost the record its node.
    fn handle_failure(
        &self,
        file: &Path,
        err: Error,
        stats: &mut BuildStats,
        skipped: bool,
    ) -> Result<()> {
        if skipped {
            stats.files_skipped += 1;
        }
        match self.error_policy {
            ErrorPolicy::FailFast => Err(err),
            ErrorPolicy::Collect => {
                warn!(file = %file.display(), error = %err, "record failed");
                stats.errors.push(BuildError::new(file, &err));
                Ok(())
            }
            ErrorPolicy::Skip => {
                debug!(file = %file.display(), error = %err, "skipping record");
                Ok(())
            }
        }
    }

    fn extract_all(
        &self,
        content_path: &Path,
        records: &[PathBuf],
    ) -> Result<Vec<Result<Extracted<E>>>> {
        if self.parallelism <= 1 || records.len() < 2 {
            return Ok(records
                .iter()
                .map(|path| self.extract_record(content_path, path))
                .collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .thread_name(|i| format!("tessera-extract-{i}"))
            .build()
            .map_err(|e| Error::config(format!("cannot start extraction pool: {e}")))?;

        debug!(threads = self.parallelism, records = records.len(), "parallel extraction");
        Ok(pool.install(|| {
            records
                .par_iter()
                .map(|path| self.extract_record(content_path, path))
                .collect()
        }))
    }

    fn extract_record(&self, content_path: &Path, path: &Path) -> Result<Extracted<E>> {
        let raw = self.reader.read_to_string(path)?;
        let split = self.splitter.split(&raw).map_err(|e| match e {
            Error::Parse(msg) => Error::parse(format!("{}: {msg}", path.display())),
            other => other,
        })?;

        let node = self
            .extractor
            .extract_node(content_path, path, &split.frontmatter, split.body)?;
        let edges = self.extractor.extract_edges(&split.frontmatter, split.body);
        Ok(Extracted { node, edges })
    }
}

/// `path` with its parent directory canonicalized, so a relative cache path
/// and a discovered absolute record compare equal. Falls back to `path` as
/// given when the parent does not exist.
fn resolve(path: &Path) -> PathBuf {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    fs::canonicalize(parent).map_or_else(|_| path.to_path_buf(), |dir| dir.join(name))
}

// ---------------------------------------------------------------------------
// Manual edges
// ---------------------------------------------------------------------------

/// Read the manual-edges document. A missing file yields no edges.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file exists but cannot be read and
/// [`Error::Parse`] if it is not a JSON list of [`ManualEdge`]s.
pub fn load_manual_edges(path: &Path) -> Result<Vec<ManualEdge>> {
    if !path.exists() {
        debug!(path = %path.display(), "no manual edges file");
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::parse(format!("invalid manual edges {}: {e}", path.display())))
}

/// Merge manual edges into `graph`, returning how many were added.
fn merge_manual_edges(graph: &mut GraphData, manual: &[ManualEdge], stats: &mut BuildStats) -> usize {
    let mut loaded = 0;
    for entry in manual {
        let edge = entry.to_edge();
        let described = edge.describe();
        match graph.insert_edge(edge) {
            EdgeInsert::Added => loaded += 1,
            EdgeInsert::Duplicate => stats.deduped_edges += 1,
            EdgeInsert::Dangling => stats.dangling_refs.push(format!("manual: {described}")),
        }
    }
    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::mock::{MockEdges, MockExtractor, MockNode};
    use crate::types::Node;
    use serde_yaml::Value;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// [`MockExtractor`] with the trait's default match-everything pattern.
    struct AllFiles;

    impl GraphExtractor for AllFiles {
        type NodeData = MockNode;
        type EdgeData = MockEdges;

        fn extract_node(
            &self,
            base_path: &Path,
            record_path: &Path,
            frontmatter: &Value,
            body: &str,
        ) -> Result<MockNode> {
            MockExtractor.extract_node(base_path, record_path, frontmatter, body)
        }

        fn extract_edges(&self, frontmatter: &Value, body: &str) -> Result<Option<MockEdges>> {
            MockExtractor.extract_edges(frontmatter, body)
        }

        fn to_graph_node(&self, data: &MockNode) -> Node {
            MockExtractor.to_graph_node(data)
        }

        fn to_graph_edges(&self, from_id: &str, data: &MockEdges) -> Vec<Edge> {
            MockExtractor.to_graph_edges(from_id, data)
        }

        fn name(&self) -> &str {
            "all-files"
        }
    }

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn corpus() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "---\ntitle: A\nprerequisites: [b]\nrelated: [c]\n---\nbody");
        write(dir.path(), "b.md", "---\ntitle: B\n---\n");
        write(dir.path(), "c.md", "---\ntitle: C\nrelated: [a]\nleads_to: [ghost]\n---\n");
        dir
    }

    #[test]
    fn missing_content_path_is_config_error() {
        let err = GraphBuilder::new(MockExtractor).build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn two_phase_build_resolves_forward_references() {
        let dir = corpus();
        let (graph, stats) = GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .build()
            .unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(stats.nodes_created, 3);
        assert_eq!(stats.files_processed, 3);
        // a->b prerequisite, a<->c relates_to once.
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(stats.edges_created, 2);
        assert_eq!(stats.deduped_edges, 1);
        assert_eq!(stats.dangling_refs, vec!["c -[leads_to]-> ghost".to_string()]);
        assert_eq!(stats.files_skipped, 0);
    }

    #[test]
    fn collect_policy_keeps_good_records() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "good.md", "---\ntitle: Good\n---\n");
        write(dir.path(), "bad.md", "---\nnot_a_title: 1\n---\n");

        let (graph, stats) = GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .build()
            .unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(stats.files_processed, 2);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.errors.len(), 1);
        assert!(stats.errors[0].file.ends_with("bad.md"));
        assert_eq!(stats.errors[0].code, ErrorCode::RecordParseError);
    }

    #[test]
    fn fail_fast_aborts_on_first_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "---\ntitle: [broken\n---\n");
        write(dir.path(), "b.md", "---\ntitle: B\n---\n");

        let err = GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .with_error_policy(ErrorPolicy::FailFast)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("a.md"));
    }

    #[test]
    fn skip_policy_counts_without_collecting() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "bad.md", "no front matter");
        let (graph, stats) = GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .with_error_policy(ErrorPolicy::Skip)
            .build()
            .unwrap();
        assert!(graph.is_empty());
        assert_eq!(stats.files_skipped, 1);
        assert!(stats.errors.is_empty());
    }

    #[test]
    fn parallel_extraction_matches_sequential() {
        let dir = corpus();
        let build = |threads| {
            GraphBuilder::new(MockExtractor)
                .with_content_path(dir.path())
                .with_parallelism(threads)
                .build()
                .unwrap()
        };
        let (seq, seq_stats) = build(1);
        let (par, par_stats) = build(4);
        assert_eq!(seq.edges(), par.edges());
        assert_eq!(seq.node_ids().collect::<Vec<_>>(), par.node_ids().collect::<Vec<_>>());
        assert_eq!(seq_stats, par_stats);
    }

    #[test]
    fn manual_edges_merge_with_dedup_and_dangling_checks() {
        let dir = corpus();
        let manual = dir.path().join("manual.json");
        fs::write(
            &manual,
            r#"[
                {"from": "b", "to": "c", "relationship": "extends", "weight": 0.42},
                {"from": "a", "to": "b", "relationship": "prereq"},
                {"from": "b", "to": "nowhere", "relationship": "covers"}
            ]"#,
        )
        .unwrap();

        let (graph, stats) = GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .with_manual_edges(&manual)
            .build()
            .unwrap();

        assert_eq!(stats.manual_edges_loaded, 1);
        assert_eq!(stats.deduped_edges, 2);
        assert!(stats.dangling_refs.contains(&"manual: b -[covers]-> nowhere".to_string()));
        let extends = graph
            .iter_edges()
            .find(|e| e.relationship == Relationship::Extends)
            .unwrap();
        assert_eq!(extends.origin, EdgeOrigin::Manual);
        assert!((extends.weight - 0.42).abs() < f32::EPSILON);
    }

    #[test]
    fn absent_manual_edges_file_is_not_an_error() {
        let dir = corpus();
        let (_, stats) = GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .with_manual_edges(dir.path().join("missing.json"))
            .build()
            .unwrap();
        assert_eq!(stats.manual_edges_loaded, 0);
        assert!(stats.errors.is_empty());
    }

    #[test]
    fn malformed_manual_edges_follow_policy() {
        let dir = corpus();
        let manual = dir.path().join("manual.json");
        fs::write(&manual, "{ not a list").unwrap();
        let (graph, stats) = GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .with_manual_edges(&manual)
            .build()
            .unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(stats.errors.len(), 1);
        assert_eq!(stats.files_skipped, 0);
    }

    #[test]
    fn cache_round_trip_skips_rebuild() {
        let dir = corpus();
        let cache = dir.path().join(".cache/graph.json");
        let builder = GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .with_cache_path(&cache);

        let (first, first_stats) = builder.build().unwrap();
        assert!(!first_stats.from_cache);
        assert!(cache.exists());

        let (second, second_stats) = builder.build().unwrap();
        assert!(second_stats.from_cache);
        assert_eq!(second.node_count(), first.node_count());
        assert_eq!(second.edge_count(), first.edge_count());

        write(dir.path(), "d.md", "---\ntitle: D\n---\n");
        let (third, third_stats) = builder.build().unwrap();
        assert!(!third_stats.from_cache);
        assert_eq!(third.node_count(), 4);
    }

    #[test]
    fn skip_cache_forces_rebuild() {
        let dir = corpus();
        let cache = dir.path().join(".cache/graph.json");
        GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .with_cache_path(&cache)
            .build()
            .unwrap();
        let (_, stats) = GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .with_cache_path(&cache)
            .skip_cache()
            .build()
            .unwrap();
        assert!(!stats.from_cache);
    }

    #[test]
    fn duplicate_ids_keep_first_record() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("x")).unwrap();
        write(dir.path(), "same.md", "---\ntitle: First\n---\n");
        write(&dir.path().join("x"), "same.md", "---\ntitle: Second\n---\n");
        let (graph, stats) = GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .build()
            .unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.get_node("same").unwrap().title, "First");
        assert_eq!(stats.duplicate_node_ids, vec!["same".to_string()]);
    }

    #[test]
    fn duplicate_id_record_contributes_no_edges() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("x")).unwrap();
        write(dir.path(), "same.md", "---\ntitle: First\n---\n");
        write(dir.path(), "other.md", "---\ntitle: Other\n---\n");
        write(
            &dir.path().join("x"),
            "same.md",
            "---\ntitle: Second\nprerequisites: [other]\nleads_to: [ghost]\n---\n",
        );
        let (graph, stats) = GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .build()
            .unwrap();
        assert_eq!(graph.get_node("same").unwrap().title, "First");
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(stats.edges_created, 0);
        assert!(stats.dangling_refs.is_empty());
        assert_eq!(stats.duplicate_node_ids, vec!["same".to_string()]);
    }

    #[test]
    fn own_files_inside_content_tree_are_not_records() {
        let dir = corpus();
        let cache = dir.path().join("graph.json");
        let manual = dir.path().join("manual.json");
        fs::write(
            &manual,
            r#"[{"from": "b", "to": "c", "relationship": "extends"}]"#,
        )
        .unwrap();
        let builder = GraphBuilder::new(AllFiles)
            .with_content_path(dir.path())
            .with_cache_path(&cache)
            .with_manual_edges(&manual);

        let before = builder.fingerprint().unwrap();
        let (first, first_stats) = builder.build().unwrap();
        assert!(first_stats.errors.is_empty(), "{:?}", first_stats.errors);
        assert_eq!(first_stats.files_processed, 3);
        assert_eq!(first_stats.manual_edges_loaded, 1);
        assert!(cache.exists());
        assert_eq!(builder.fingerprint().unwrap(), before);

        let (second, second_stats) = builder.build().unwrap();
        assert!(second_stats.from_cache);
        assert!(second_stats.errors.is_empty());
        assert_eq!(second.node_count(), first.node_count());
        assert_eq!(second.edge_count(), first.edge_count());

        let (_, third_stats) = builder.build().unwrap();
        assert!(third_stats.from_cache);
    }

    #[test]
    fn progress_reaches_done() {
        let dir = corpus();
        let seen: Arc<Mutex<Vec<BuildProgress>>> = Arc::default();
        let sink = Arc::clone(&seen);
        GraphBuilder::new(MockExtractor)
            .with_content_path(dir.path())
            .on_progress(move |p| sink.lock().unwrap().push(*p))
            .build()
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first().unwrap().phase, BuildPhase::Discovery);
        assert_eq!(seen.last().unwrap().phase, BuildPhase::Done);
        let nodes: Vec<_> = seen.iter().filter(|p| p.phase == BuildPhase::Nodes).collect();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[2].completed, 3);
        let first_edge = seen.iter().position(|p| p.phase == BuildPhase::Edges).unwrap();
        let last_node = seen.iter().rposition(|p| p.phase == BuildPhase::Nodes).unwrap();
        assert!(last_node < first_edge);
    }

    #[test]
    fn from_config_wires_paths_and_policy() {
        let dir = corpus();
        let config = BuildConfig {
            content_path: Some(dir.path().to_path_buf()),
            error_policy: ErrorPolicy::Skip,
            parallelism: 2,
            ..BuildConfig::default()
        };
        let builder = GraphBuilder::from_config(MockExtractor, &config);
        assert_eq!(builder.error_policy, ErrorPolicy::Skip);
        assert_eq!(builder.parallelism, 2);
        let (graph, _) = builder.build().unwrap();
        assert_eq!(graph.node_count(), 3);
    }
}
