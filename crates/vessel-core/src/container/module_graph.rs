//! Module graph handle consumed by the container.
//!
//! The concrete module graph is out of scope; this defines the narrow
//! interface the container relies on, plus a minimal in-memory
//! implementation so the container is runnable and testable standalone —
//! modeled on `HmrModuleGraph` in `dev/hmr.rs`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

/// A node in the module graph.
#[derive(Debug, Clone, Default)]
pub struct ModuleNode {
    pub url: String,
    pub file: Option<String>,
    pub importers: HashSet<String>,
    pub is_self_accepting: bool,
    pub last_hmr_timestamp: u64,
    pub last_hmr_invalidation_received: bool,
    /// Opaque per-plugin metadata bag, merged by `_updateModuleInfo`.
    pub meta: HashMap<String, Value>,
    /// Ids recorded via `addWatchFile` across `load`/`transform` for this
    /// module.
    pub added_imports: HashSet<String>,
}

impl ModuleNode {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// The operations the container performs against a module graph.
#[async_trait]
pub trait ModuleGraphHandle: Send + Sync {
    async fn ensure_entry_from_url(&self, url: &str) -> Arc<RwLock<ModuleNode>>;
    async fn get_module_by_id(&self, id: &str) -> Option<Arc<RwLock<ModuleNode>>>;
    async fn ids(&self) -> Vec<String>;
}

/// In-memory graph; not a production implementation, just enough to drive
/// the container end-to-end without an external collaborator.
#[derive(Default)]
pub struct InMemoryModuleGraph {
    nodes: RwLock<HashMap<String, Arc<RwLock<ModuleNode>>>>,
}

impl InMemoryModuleGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModuleGraphHandle for InMemoryModuleGraph {
    async fn ensure_entry_from_url(&self, url: &str) -> Arc<RwLock<ModuleNode>> {
        if let Some(existing) = self.nodes.read().await.get(url) {
            return existing.clone();
        }
        let mut nodes = self.nodes.write().await;
        nodes
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(ModuleNode::new(url))))
            .clone()
    }

    async fn get_module_by_id(&self, id: &str) -> Option<Arc<RwLock<ModuleNode>>> {
        self.nodes.read().await.get(id).cloned()
    }

    async fn ids(&self) -> Vec<String> {
        self.nodes.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_entry_is_idempotent() {
        let graph = InMemoryModuleGraph::new();
        let a = graph.ensure_entry_from_url("/a.js").await;
        let b = graph.ensure_entry_from_url("/a.js").await;
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn get_module_by_id_returns_none_for_unknown() {
        let graph = InMemoryModuleGraph::new();
        assert!(graph.get_module_by_id("/missing.js").await.is_none());
    }

    #[tokio::test]
    async fn ids_lists_registered_urls() {
        let graph = InMemoryModuleGraph::new();
        graph.ensure_entry_from_url("/a.js").await;
        graph.ensure_entry_from_url("/b.js").await;
        let mut ids = graph.ids().await;
        ids.sort();
        assert_eq!(ids, vec!["/a.js".to_string(), "/b.js".to_string()]);
    }
}
