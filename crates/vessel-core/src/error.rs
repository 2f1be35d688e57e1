use std::path::PathBuf;
use thiserror::Error;

use crate::container::error_formatter::PluginError;

/// Crate-wide error type. Hook-level failures are carried as [`Error::Plugin`];
/// everything else is infrastructure.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("project root not found from {start}")]
    ProjectNotFound { start: PathBuf },

    /// Raised when a request-serving hook is invoked on an environment past
    /// `close()` and `recoverable` is false.
    #[error("plugin container closed")]
    ClosedServer,

    /// Raised when the dependency optimizer invalidates `id` mid-transform.
    /// Expected during the crawl; `warmupRequest` and idle waiters swallow it.
    #[error("optimized dependency {id} is outdated")]
    OutdatedOptimizedDep { id: String },

    /// A plugin called a `PluginContext` method the current environment
    /// doesn't support (`emitFile`, `setAssetSource`, `getFileName` in serve
    /// mode). Non-fatal: callers log a warning and return a placeholder.
    #[error("{method} is not supported in this environment")]
    UnsupportedContextMethod { method: &'static str },

    /// `this.load` could not produce a module graph node for `id`.
    #[error("module graph could not resolve an entry for {id}")]
    ModuleInfoMissing { id: String },

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Stable sentinel code for the two errors upstream HTTP/WS callers
    /// pattern-match on: `ERR_CLOSED_SERVER` maps to a 504,
    /// `ERR_OUTDATED_OPTIMIZED_DEP` to a retry.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::ClosedServer => Some("ERR_CLOSED_SERVER"),
            Self::OutdatedOptimizedDep { .. } => Some("ERR_OUTDATED_OPTIMIZED_DEP"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_server_has_sentinel_code() {
        assert_eq!(Error::ClosedServer.code(), Some("ERR_CLOSED_SERVER"));
    }

    #[test]
    fn outdated_dep_has_sentinel_code() {
        let err = Error::OutdatedOptimizedDep {
            id: "/src/main.js".into(),
        };
        assert_eq!(err.code(), Some("ERR_OUTDATED_OPTIMIZED_DEP"));
    }

    #[test]
    fn other_errors_have_no_code() {
        assert_eq!(Error::other("boom").code(), None);
    }
}
