//! The per-environment dev server: owns a plugin container, a module graph,
//! a hot channel, and the crawl-idle/request-tracking machinery that ties
//! them together for a single named environment (`client`, `ssr`, ...).

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::EnvironmentConfig;
use crate::container::{
    LoadOptions, ModuleGraphHandle, ModuleInfo, Plugin, PluginContainer, ResolveOptions,
    ResolvedId, TransformResult,
};
use crate::container::module_graph::{InMemoryModuleGraph, ModuleNode};
use crate::crawl_end::{CrawlEndFinder, IdleOutcome};
use crate::deps_optimizer::{select_deps_optimizer, DepsOptimizer};
use crate::error::Error;
use crate::hot_channel::{HotChannel, InvalidatePayload, NoopHotChannel};

/// Lazily constructed: a `DevEnvironment` can be built before its plugin
/// list is finalized, and the container only comes into existence once
/// `init()` runs.
enum ContainerState {
    Uninitialized(Vec<Arc<dyn Plugin>>),
    Ready(Arc<PluginContainer>),
}

pub struct DevEnvironment {
    pub name: String,
    config: Arc<EnvironmentConfig>,
    module_graph: Arc<dyn ModuleGraphHandle>,
    hot_channel: Arc<dyn HotChannel>,
    deps_optimizer: Arc<dyn DepsOptimizer>,
    crawl_end: Arc<CrawlEndFinder>,
    container: RwLock<ContainerState>,
}

impl DevEnvironment {
    #[must_use]
    pub fn new(name: impl Into<String>, config: EnvironmentConfig, plugins: Vec<Arc<dyn Plugin>>) -> Self {
        let config = Arc::new(config);
        let name = name.into();
        let deps_optimizer = select_deps_optimizer(&name, None, &config.dev.optimize_deps);
        Self {
            name,
            config,
            module_graph: Arc::new(InMemoryModuleGraph::new()),
            hot_channel: Arc::new(NoopHotChannel),
            deps_optimizer,
            crawl_end: Arc::new(CrawlEndFinder::new()),
            container: RwLock::new(ContainerState::Uninitialized(plugins)),
        }
    }

    #[must_use]
    pub fn with_hot_channel(mut self, channel: Arc<dyn HotChannel>) -> Self {
        self.hot_channel = channel;
        self
    }

    #[must_use]
    pub fn with_deps_optimizer(mut self, optimizer: Arc<dyn DepsOptimizer>) -> Self {
        self.deps_optimizer = optimizer;
        self
    }

    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.config.root.clone()
    }

    /// Builds the plugin container from the configured plugin list and
    /// wires the `hmr-invalidate` listener. Idempotent: later calls are a
    /// no-op once the container is ready.
    pub async fn init(&self) -> Arc<PluginContainer> {
        let mut state = self.container.write().await;
        let plugins = match &mut *state {
            ContainerState::Ready(container) => return container.clone(),
            ContainerState::Uninitialized(plugins) => std::mem::take(plugins),
        };

        let container = PluginContainer::new(plugins, self.config.clone(), self.module_graph.clone());
        *state = ContainerState::Ready(container.clone());
        drop(state);

        self.register_hmr_invalidate_listener();
        container
    }

    async fn container(&self) -> Arc<PluginContainer> {
        if let ContainerState::Ready(container) = &*self.container.read().await {
            return container.clone();
        }
        self.init().await
    }

    /// Listens for `hmr-invalidate` events on the hot channel: a
    /// self-accepting module with a positive HMR timestamp that hasn't
    /// already been invalidated this wave gets marked invalidated and its
    /// importers are notified to re-fetch.
    fn register_hmr_invalidate_listener(&self) {
        let module_graph = self.module_graph.clone();
        let hot_channel = self.hot_channel.clone();
        let environment_name = self.name.clone();

        tokio::spawn(async move {
            let module_graph = module_graph.clone();
            hot_channel
                .on(
                    "hmr-invalidate",
                    Arc::new(move |payload: Value| {
                        let module_graph = module_graph.clone();
                        let environment_name = environment_name.clone();
                        tokio::spawn(async move {
                            handle_hmr_invalidate(&module_graph, &environment_name, payload).await;
                        });
                    }),
                )
                .await;
        });
    }

    pub async fn resolve_id(&self, id: &str, importer: Option<&str>) -> Result<Option<ResolvedId>, Error> {
        self.container().await.resolve_id(id, importer, ResolveOptions::default()).await
    }

    /// Loads and transforms `id`, tracking it as an in-flight request for
    /// crawl-idle purposes. Registers itself with the finder so a concurrent
    /// `waitForRequestsIdle()` call observes it, and settles the
    /// registration once the work finishes regardless of outcome.
    pub async fn transform_request(&self, id: &str) -> Result<TransformResult, Error> {
        let container = self.container().await;
        let node = self.module_graph.ensure_entry_from_url(id).await;
        node.write().await.file = Some(id.to_string());

        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        self.crawl_end
            .register_request_processing(id, move || async move {
                let _ = done_rx.await;
            })
            .await;

        let outcome = self.run_transform(&container, id).await;
        let _ = done_tx.send(());
        outcome
    }

    async fn run_transform(&self, container: &Arc<PluginContainer>, id: &str) -> Result<TransformResult, Error> {
        let loaded = container.load(id, &LoadOptions::default()).await?;
        let code = loaded.map(|out| out.code).unwrap_or_default();

        self.deps_optimizer.discover(&code).await;
        let result = container.transform(&code, id).await?;

        if self.deps_optimizer.is_outdated(id).await {
            return Err(Error::OutdatedOptimizedDep { id: id.to_string() });
        }
        Ok(result)
    }

    pub async fn fetch_module(&self, id: &str) -> Result<Option<ModuleInfo>, Error> {
        let Some(node) = self.module_graph.get_module_by_id(id).await else {
            return Ok(None);
        };
        let node = node.read().await;
        Ok(Some(ModuleInfo::from_node(id, &node)))
    }

    /// Like `transform_request`, but swallows the two expected
    /// crawl-in-progress errors rather than surfacing them — used to
    /// opportunistically pre-warm modules during the initial crawl.
    pub async fn warmup_request(&self, id: &str) {
        let container = self.container().await;
        self.module_graph.ensure_entry_from_url(id).await;
        if let Err(err) = self.run_transform(&container, id).await {
            log_warmup_error(id, &err);
        }
    }

    pub async fn register_request_processing<F, Fut>(&self, id: &str, done_fn: F)
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.crawl_end.register_request_processing(id, done_fn).await;
    }

    pub async fn wait_for_requests_idle(&self, ignored_id: Option<&str>) -> IdleOutcome {
        self.crawl_end.wait_for_requests_idle(ignored_id).await
    }

    pub async fn on_crawl_end<F: FnOnce() + Send + 'static>(&self, cb: F) {
        self.crawl_end.on_crawl_end(cb).await;
    }

    pub async fn close(&self) -> Result<(), Error> {
        self.crawl_end.cancel().await;
        self.deps_optimizer.close().await;
        self.hot_channel.close().await;
        if let ContainerState::Ready(container) = &*self.container.read().await {
            container.close().await?;
        }
        Ok(())
    }
}

fn log_warmup_error(id: &str, err: &Error) {
    match err.code() {
        Some("ERR_CLOSED_SERVER" | "ERR_OUTDATED_OPTIMIZED_DEP") => {
            tracing::debug!(id, "warmup request superseded: {err}");
        }
        _ => tracing::warn!(id, "warmup request failed: {err}"),
    }
}

async fn handle_hmr_invalidate(graph: &Arc<dyn ModuleGraphHandle>, environment_name: &str, payload: Value) {
    let Some(path) = payload.get("path").and_then(Value::as_str) else {
        return;
    };
    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .map(String::from);
    let invalidate = InvalidatePayload {
        path: path.to_string(),
        message,
    };

    let Some(node) = graph.get_module_by_id(&invalidate.path).await else {
        return;
    };

    let mut node = node.write().await;
    if !should_invalidate(&node) {
        return;
    }

    node.last_hmr_invalidation_received = true;
    tracing::info!(
        environment = environment_name,
        module = %invalidate.path,
        reason = invalidate.message.as_deref().unwrap_or("unspecified"),
        "hmr invalidate",
    );

    let timestamp = node.last_hmr_timestamp;
    let importers: Vec<String> = node.importers.iter().cloned().collect();
    drop(node);
    for importer in importers {
        if let Some(importer_node) = graph.get_module_by_id(&importer).await {
            importer_node.write().await.last_hmr_timestamp = timestamp;
        }
    }
}

/// Invalidation only fires for a self-accepting module that has actually
/// been through at least one HMR update and hasn't already been flagged
/// this wave — a second `hmr-invalidate` at the same timestamp is a no-op.
fn should_invalidate(node: &ModuleNode) -> bool {
    node.is_self_accepting && node.last_hmr_timestamp > 0 && !node.last_hmr_invalidation_received
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EnvironmentConfig {
        EnvironmentConfig::new(PathBuf::from("/proj"))
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let env = DevEnvironment::new("client", config(), Vec::new());
        let a = env.init().await;
        let b = env.init().await;
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn fetch_module_returns_none_before_crawl() {
        let env = DevEnvironment::new("client", config(), Vec::new());
        assert!(env.fetch_module("/a.js").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transform_request_surfaces_outdated_optimized_dep() {
        use crate::deps_optimizer::AutoDiscoveryOptimizer;

        let optimizer = Arc::new(AutoDiscoveryOptimizer::new());
        optimizer.mark_outdated("/a.js").await;
        let env = DevEnvironment::new("client", config(), Vec::new()).with_deps_optimizer(optimizer);

        let err = env.transform_request("/a.js").await.unwrap_err();
        assert_eq!(err.code(), Some("ERR_OUTDATED_OPTIMIZED_DEP"));
    }

    #[tokio::test]
    async fn transform_request_registers_with_crawl_end_finder() {
        let env = Arc::new(DevEnvironment::new("client", config(), Vec::new()));
        let running = {
            let env = env.clone();
            tokio::spawn(async move { env.transform_request("/a.js").await })
        };

        let outcome = env.wait_for_requests_idle(None).await;
        assert_eq!(outcome, IdleOutcome::Fired);
        running.await.unwrap().unwrap();
    }

    #[test]
    fn should_invalidate_requires_self_accepting_and_prior_update() {
        let mut node = ModuleNode::new("/a.js");
        assert!(!should_invalidate(&node));

        node.is_self_accepting = true;
        assert!(!should_invalidate(&node));

        node.last_hmr_timestamp = 1;
        assert!(should_invalidate(&node));

        node.last_hmr_invalidation_received = true;
        assert!(!should_invalidate(&node));
    }

    #[tokio::test]
    async fn hmr_invalidate_propagates_timestamp_to_importers() {
        let graph: Arc<dyn ModuleGraphHandle> = Arc::new(InMemoryModuleGraph::new());
        let target = graph.ensure_entry_from_url("/child.js").await;
        {
            let mut target = target.write().await;
            target.is_self_accepting = true;
            target.last_hmr_timestamp = 100;
            target.importers.insert("/parent.js".to_string());
        }
        let importer = graph.ensure_entry_from_url("/parent.js").await;
        importer.write().await.last_hmr_timestamp = 1;

        handle_hmr_invalidate(
            &graph,
            "client",
            serde_json::json!({"path": "/child.js", "message": "edit"}),
        )
        .await;

        assert!(target.read().await.last_hmr_invalidation_received);
        assert_eq!(importer.read().await.last_hmr_timestamp, 100);
    }
}
