use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Resolved configuration handed to a [`crate::environment::DevEnvironment`].
///
/// Resolution itself (reading a `vite.config.*`-equivalent, merging CLI
/// flags, loading `.env` files) happens upstream of this crate; this is the
/// already-merged shape the container consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Project root, used as the default resolve base and as the `importer`
    /// when `resolveId` is called without one.
    pub root: PathBuf,

    pub mode: Mode,

    pub resolve: ResolveOptions,

    pub dev: DevOptions,

    pub log_level: LogLevel,
}

/// Only `Dev` is supported by this container; other modes are accepted so
/// callers upstream can construct a config uniformly, but the container
/// refuses to build one for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Dev,
    Build,
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveOptions {
    pub alias: HashMap<String, String>,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevOptions {
    /// Whether `close()` leaves in-flight hook chains to finish
    /// (`recoverable = true`) or fails them at the next hook boundary with
    /// `ClosedServer`.
    pub recoverable_close: bool,

    pub optimize_deps: OptimizeDepsOptions,
}

impl Default for DevOptions {
    fn default() -> Self {
        Self {
            recoverable_close: false,
            optimize_deps: OptimizeDepsOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizeDepsOptions {
    pub no_discovery: bool,
    pub include: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl EnvironmentConfig {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            mode: Mode::default(),
            resolve: ResolveOptions::default(),
            dev: DevOptions::default(),
            log_level: LogLevel::default(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_recoverable_close(mut self, recoverable: bool) -> Self {
        self.dev.recoverable_close = recoverable;
        self
    }

    /// Default `importer` used by `resolveId` when the caller doesn't supply
    /// one: `root/index.html`.
    #[must_use]
    pub fn default_importer(&self) -> PathBuf {
        self.root.join("index.html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_importer_joins_root() {
        let cfg = EnvironmentConfig::new(PathBuf::from("/project"));
        assert_eq!(cfg.default_importer(), PathBuf::from("/project/index.html"));
    }

    #[test]
    fn builder_methods_chain() {
        let cfg = EnvironmentConfig::new(PathBuf::from("/p"))
            .with_mode(Mode::Dev)
            .with_recoverable_close(true);
        assert_eq!(cfg.mode, Mode::Dev);
        assert!(cfg.dev.recoverable_close);
    }
}
