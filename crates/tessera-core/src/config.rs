use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Project-relative location of the engine config file.
pub const PROJECT_CONFIG_PATH: &str = ".tessera/config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

/// How the builder reacts when a single record fails to extract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Abort the build on the first failing record.
    FailFast,
    /// Keep going and report every failure in the build result.
    #[default]
    Collect,
    /// Keep going, log failures, count them as skipped.
    Skip,
}

impl ErrorPolicy {
    /// Parse a policy name (`collect`, `fail_fast`/`fail-fast`, `skip`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "collect" => Some(Self::Collect),
            "fail_fast" | "failfast" => Some(Self::FailFast),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// What the content fingerprint is computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintMode {
    /// Relative path, size and modification time of every record (no reads).
    #[default]
    Metadata,
    /// Relative path and full bytes of every record.
    Contents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub content_path: Option<PathBuf>,
    #[serde(default)]
    pub manual_edges_path: Option<PathBuf>,
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    /// Upper bound on records extracted concurrently. `1` disables parallelism.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    #[serde(default)]
    pub fingerprint: FingerprintMode,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_path: None,
            manual_edges_path: None,
            cache_path: None,
            error_policy: ErrorPolicy::default(),
            parallelism: default_parallelism(),
            fingerprint: FingerprintMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Hard cap on neighborhood radius.
    #[serde(default = "default_max_radius")]
    pub max_radius: usize,
    #[serde(default = "default_radius")]
    pub default_radius: usize,
    #[serde(default = "default_bridge_limit")]
    pub bridge_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_radius: default_max_radius(),
            default_radius: default_radius(),
            bridge_limit: default_bridge_limit(),
        }
    }
}

impl EngineConfig {
    /// Apply `TESSERA_*` environment overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `TESSERA_ERROR_POLICY` names an unknown policy.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| env::var(key).ok())
    }

    /// Apply overrides using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the error-policy override is not recognised.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("TESSERA_CONTENT_PATH").filter(|v| !v.trim().is_empty()) {
            self.build.content_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("TESSERA_CACHE_PATH").filter(|v| !v.trim().is_empty()) {
            self.build.cache_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup("TESSERA_ERROR_POLICY") {
            self.build.error_policy = ErrorPolicy::parse(&raw)
                .ok_or_else(|| Error::config(format!("unknown error policy '{raw}'")))?;
        }
        Ok(self)
    }
}

/// Load an engine config from `path`. A missing file yields defaults.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file exists but cannot be read and
/// [`Error::Config`] if it is not valid TOML for [`EngineConfig`].
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;

    let config = toml::from_str::<EngineConfig>(&content)
        .map_err(|e| Error::config(format!("failed to parse {}: {e}", path.display())))?;

    if config.build.parallelism == 0 {
        return Err(Error::config(format!(
            "{}: build.parallelism must be at least 1",
            path.display()
        )));
    }

    tracing::debug!(path = %path.display(), "loaded engine config");
    Ok(config)
}

/// Load `<project_root>/.tessera/config.toml`.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_project_config(project_root: &Path) -> Result<EngineConfig> {
    load_config(&project_root.join(PROJECT_CONFIG_PATH))
}

/// Load `<config_dir>/tessera/config.toml` from the user's config directory.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_user_config() -> Result<EngineConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(EngineConfig::default());
    };
    load_config(&config_dir.join("tessera/config.toml"))
}

/// Project config if present, else the user config, then env overrides.
///
/// # Errors
///
/// Propagates read/parse failures from either file and invalid env overrides.
pub fn resolve_config(project_root: &Path) -> Result<EngineConfig> {
    let config = if project_root.join(PROJECT_CONFIG_PATH).exists() {
        load_project_config(project_root)?
    } else {
        load_user_config()?
    };
    config.apply_env()
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get().min(8))
}

const fn default_max_radius() -> usize {
    10
}

const fn default_radius() -> usize {
    1
}

const fn default_bridge_limit() -> usize {
    10
}
