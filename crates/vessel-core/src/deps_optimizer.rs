//! Dependency pre-bundling optimizer selection.
//!
//! The optimizer itself — the thing that actually pre-bundles bare imports
//! into single files under a cache directory — is an external collaborator,
//! out of scope here. What's in scope is the *selection policy*: which
//! variant an environment gets, and the narrow interface the
//! container/environment drive it through. Bare-import discovery reuses
//! [`crate::imports::scan_imports`].

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::OptimizeDepsOptions;
use crate::imports::scan_imports;

/// The narrow interface the environment drives an optimizer through.
#[async_trait]
pub trait DepsOptimizer: Send + Sync {
    /// Record bare imports discovered while crawling `source`.
    async fn discover(&self, source: &str);

    /// Whether `id` has been invalidated since it was last bundled —
    /// surfaces as `Error::OutdatedOptimizedDep` to callers mid-transform.
    async fn is_outdated(&self, id: &str) -> bool;

    async fn close(&self);
}

/// `no_discovery` with an empty `include` list: no optimizer at all.
#[derive(Default)]
pub struct NoneOptimizer;

#[async_trait]
impl DepsOptimizer for NoneOptimizer {
    async fn discover(&self, _source: &str) {}
    async fn is_outdated(&self, _id: &str) -> bool {
        false
    }
    async fn close(&self) {}
}

/// The `client` environment with discovery enabled: scans every crawled
/// module for bare specifiers.
#[derive(Default)]
pub struct AutoDiscoveryOptimizer {
    discovered: RwLock<HashSet<String>>,
    outdated: RwLock<HashSet<String>>,
}

impl AutoDiscoveryOptimizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mark_outdated(&self, id: &str) {
        self.outdated.write().await.insert(id.to_string());
    }

    pub async fn discovered_specifiers(&self) -> Vec<String> {
        self.discovered.read().await.iter().cloned().collect()
    }
}

#[async_trait]
impl DepsOptimizer for AutoDiscoveryOptimizer {
    async fn discover(&self, source: &str) {
        let bare: Vec<String> = scan_imports(source)
            .into_iter()
            .map(|spec| spec.raw)
            .filter(|raw| is_bare_specifier(raw))
            .collect();
        if bare.is_empty() {
            return;
        }
        self.discovered.write().await.extend(bare);
    }

    async fn is_outdated(&self, id: &str) -> bool {
        self.outdated.read().await.contains(id)
    }

    async fn close(&self) {}
}

/// Every other environment: only the explicitly configured `include` list
/// is pre-bundled, no crawl-time discovery.
pub struct ExplicitOnlyOptimizer {
    include: HashSet<String>,
    outdated: RwLock<HashSet<String>>,
}

impl ExplicitOnlyOptimizer {
    #[must_use]
    pub fn new(include: Vec<String>) -> Self {
        Self {
            include: include.into_iter().collect(),
            outdated: RwLock::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn includes(&self, specifier: &str) -> bool {
        self.include.contains(specifier)
    }
}

#[async_trait]
impl DepsOptimizer for ExplicitOnlyOptimizer {
    async fn discover(&self, _source: &str) {}

    async fn is_outdated(&self, id: &str) -> bool {
        self.outdated.read().await.contains(id)
    }

    async fn close(&self) {}
}

fn is_bare_specifier(raw: &str) -> bool {
    !(raw.starts_with('.') || raw.starts_with('/') || crate::paths::is_external_url(raw))
}

/// `provided` wins unconditionally; otherwise the policy is derived from
/// the environment name and config.
#[must_use]
pub fn select_deps_optimizer(
    environment_name: &str,
    provided: Option<Arc<dyn DepsOptimizer>>,
    opts: &OptimizeDepsOptions,
) -> Arc<dyn DepsOptimizer> {
    if let Some(optimizer) = provided {
        return optimizer;
    }

    if opts.no_discovery && opts.include.is_empty() {
        return Arc::new(NoneOptimizer);
    }

    if environment_name == "client" && !opts.no_discovery {
        return Arc::new(AutoDiscoveryOptimizer::new());
    }

    Arc::new(ExplicitOnlyOptimizer::new(opts.include.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(no_discovery: bool, include: Vec<&str>) -> OptimizeDepsOptions {
        OptimizeDepsOptions {
            no_discovery,
            include: include.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn provided_optimizer_always_wins() {
        let provided: Arc<dyn DepsOptimizer> = Arc::new(NoneOptimizer);
        let selected = select_deps_optimizer("client", Some(provided.clone()), &opts(false, vec!["react"]));
        assert!(Arc::ptr_eq(&provided, &selected));
    }

    #[tokio::test]
    async fn no_discovery_and_empty_include_selects_none() {
        let selected = select_deps_optimizer("client", None, &opts(true, vec![]));
        assert!(!selected.is_outdated("anything").await);
        selected.discover("import 'react'").await;
    }

    #[tokio::test]
    async fn non_client_gets_explicit_only_and_ignores_discovery() {
        let selected = select_deps_optimizer("ssr", None, &opts(false, vec!["lodash"]));
        selected.discover("import 'react'").await;
        assert!(!selected.is_outdated("lodash").await);
    }

    #[tokio::test]
    async fn auto_discovery_collects_bare_specifiers() {
        let optimizer = AutoDiscoveryOptimizer::new();
        optimizer
            .discover("import React from \"react\"; import './local';")
            .await;
        assert_eq!(optimizer.discovered_specifiers().await, vec!["react".to_string()]);
    }
}
