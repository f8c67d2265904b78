use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Result alias used across all tessera crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the engine.
///
/// Traversal dead-ends, dangling edge references and missing optional inputs
/// are *not* errors; they are reported as data by the calling operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller referenced an id that does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// A record could not be interpreted by the domain adapter or splitter.
    #[error("parse error: {0}")]
    Parse(String),

    /// Build configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// File-system access failed.
    #[error("{}", display_io(.path.as_deref(), .source))]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: io::Error,
    },

    /// A persisted document is malformed or could not be written.
    #[error("serialization error: {0}")]
    Serialization(String),
}

fn display_io(path: Option<&Path>, source: &io::Error) -> String {
    match path {
        Some(path) => format!("I/O error at {}: {source}", path.display()),
        None => format!("I/O error: {source}"),
    }
}

impl Error {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    #[must_use]
    pub const fn io(source: io::Error) -> Self {
        Self::Io { path: None, source }
    }

    pub fn io_with_path(source: io::Error, path: impl AsRef<Path>) -> Self {
        Self::Io {
            path: Some(path.as_ref().to_path_buf()),
            source,
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Machine-readable code for this error.
    ///
    /// A `WouldBlock` I/O error is a lock wait that timed out and reports
    /// [`ErrorCode::LockContention`].
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NodeNotFound,
            Self::Parse(_) => ErrorCode::RecordParseError,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::Io { source, .. } if source.kind() == io::ErrorKind::WouldBlock => {
                ErrorCode::LockContention
            }
            Self::Io { .. } => ErrorCode::IoFailure,
            Self::Serialization(_) => ErrorCode::SnapshotCorrupt,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalid,
    NodeNotFound,
    RecordParseError,
    IoFailure,
    LockContention,
    SnapshotCorrupt,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigInvalid => "E1001",
            Self::NodeNotFound => "E2001",
            Self::RecordParseError => "E3001",
            Self::IoFailure => "E5001",
            Self::LockContention => "E5002",
            Self::SnapshotCorrupt => "E6001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigInvalid => "Invalid engine configuration",
            Self::NodeNotFound => "Node not found",
            Self::RecordParseError => "Content record could not be parsed",
            Self::IoFailure => "File-system access failed",
            Self::LockContention => "Lock contention",
            Self::SnapshotCorrupt => "Graph snapshot is malformed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid => {
                Some("Set build.content_path and fix syntax in .tessera/config.toml.")
            }
            Self::NodeNotFound => None,
            Self::RecordParseError => Some("Check the record's front-matter delimiters and YAML."),
            Self::IoFailure => Some("Check that the path exists and is readable."),
            Self::LockContention => Some("Retry after the other process releases the cache lock."),
            Self::SnapshotCorrupt => Some("Delete the cache file and rebuild the graph."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
