//! Tracing subscriber bootstrap for binaries and tests embedding the engine.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! embedding program's call. [`init`] is the stock setup: an `EnvFilter`
//! read from `TESSERA_LOG` (falling back to `RUST_LOG`) and either a compact
//! or a JSON formatter.

use std::env;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// Read `TESSERA_LOG_FORMAT` (`json` or anything else for compact).
    #[must_use]
    pub fn from_env() -> Self {
        match env::var("TESSERA_LOG_FORMAT").as_deref() {
            Ok("json") => Self::Json,
            _ => Self::Compact,
        }
    }
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "tessera_core=debug,tessera_graph=debug,info"
    } else {
        "tessera_core=info,tessera_graph=info,warn"
    }
}

fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env("TESSERA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// Install the global subscriber.
///
/// Returns `false` when a global subscriber was already set (for example by
/// a second call, or by a test harness); the existing one is kept.
pub fn init(format: LogFormat, verbose: bool) -> bool {
    let registry = tracing_subscriber::registry().with(build_filter(verbose));

    let installed = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_ansi(false))
            .try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
    };

    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_directives_enable_debug() {
        assert!(default_directives(true).contains("tessera_graph=debug"));
        assert!(default_directives(false).contains("tessera_graph=info"));
    }

    #[test]
    fn second_init_is_a_noop() {
        let _ = init(LogFormat::Compact, false);
        assert!(!init(LogFormat::Json, true));
    }
}
