//! The hook driver: sorts plugins per hook, fans calls out according to
//! each hook's concurrency contract, and tracks in-flight hook calls so
//! `close()` can wait for quiescence before running the terminal hooks.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Notify, RwLock};

use crate::config::EnvironmentConfig;
use crate::container::context::{CombinedMapResult, PluginContext, TransformContext, TransformResult};
use crate::container::error_formatter::{ActiveContext, ErrorFormatter, HookError};
use crate::container::hook::sort_plugins_for_hook;
use crate::container::module_graph::ModuleGraphHandle;
use crate::container::plugin::{
    hooks, LoadOptions, LoadOutput, MapInput, Plugin, ResolveOptions, ResolvedId,
    TransformHookOutput, WatchChangeKind,
};
use crate::container::source_map::MapEntry;
use crate::error::Error;

/// RAII accounting for in-flight hook calls. `close()` awaits every guard
/// dropping before proceeding to `buildEnd`/`closeBundle`.
#[derive(Default)]
struct HookPromiseTracker {
    count: AtomicU64,
    idle: Notify,
}

impl HookPromiseTracker {
    fn guard(self: &Arc<Self>) -> HookGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        HookGuard {
            tracker: self.clone(),
        }
    }

    async fn wait_idle(&self) {
        loop {
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            self.idle.notified().await;
        }
    }
}

struct HookGuard {
    tracker: Arc<HookPromiseTracker>,
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        if self.tracker.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.idle.notify_waiters();
        }
    }
}

pub struct PluginContainer {
    plugins: Vec<Arc<dyn Plugin>>,
    config: Arc<EnvironmentConfig>,
    module_graph: Arc<dyn ModuleGraphHandle>,
    watch_files: Arc<RwLock<HashSet<String>>>,
    resolved_options: RwLock<Value>,
    closed: AtomicBool,
    tracker: Arc<HookPromiseTracker>,
}

impl PluginContainer {
    #[must_use]
    pub fn new(
        plugins: Vec<Arc<dyn Plugin>>,
        config: Arc<EnvironmentConfig>,
        module_graph: Arc<dyn ModuleGraphHandle>,
    ) -> Arc<Self> {
        Arc::new(Self {
            plugins,
            config,
            module_graph,
            watch_files: Arc::new(RwLock::new(HashSet::new())),
            resolved_options: RwLock::new(Value::Null),
            closed: AtomicBool::new(false),
            tracker: Arc::new(HookPromiseTracker::default()),
        })
    }

    pub(crate) fn module_graph(&self) -> &Arc<dyn ModuleGraphHandle> {
        &self.module_graph
    }

    pub(crate) fn watch_files(&self) -> &Arc<RwLock<HashSet<String>>> {
        &self.watch_files
    }

    fn sorted_indices(&self, hook: &'static str) -> Vec<usize> {
        let entries: Vec<_> = self
            .plugins
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.hook_meta(hook)))
            .collect();
        sort_plugins_for_hook(&entries)
    }

    /// `ClosedServer` unless the environment is configured as recoverable,
    /// in which case in-flight callers are allowed to complete.
    fn ensure_open(&self) -> Result<(), Error> {
        if self.closed.load(Ordering::SeqCst) && !self.config.dev.recoverable_close {
            return Err(Error::ClosedServer);
        }
        Ok(())
    }

    fn enrich<C: ActiveContext>(&self, err: HookError, ctx: &mut C) -> Error {
        Error::Plugin(ErrorFormatter::format(err, ctx))
    }

    /// Fold the input options through every `options` hook, sequentially,
    /// in sorted order.
    pub async fn run_options(self: &Arc<Self>, input: Value) -> Result<Value, Error> {
        let _guard = self.tracker.guard();
        let mut acc = input;

        for idx in self.sorted_indices(hooks::OPTIONS) {
            self.ensure_open()?;
            let plugin = &self.plugins[idx];
            let mut ctx = PluginContext::new(self.clone(), hooks::OPTIONS, Some(plugin.name().to_string()));
            match plugin.options(&ctx, acc.clone()).await {
                Ok(Some(result)) if !result.is_null() && result != Value::Bool(false) => {
                    acc = result;
                }
                Ok(_) => {}
                Err(err) => return Err(self.enrich(err, &mut ctx)),
            }
        }

        *self.resolved_options.write().await = acc.clone();
        Ok(acc)
    }

    /// Run `buildStart` in parallel, honoring per-plugin `sequential`
    /// barriers.
    pub async fn run_build_start(self: &Arc<Self>) -> Result<(), Error> {
        self.ensure_open()?;
        let order = self.sorted_indices(hooks::BUILD_START);

        let mut pending: Vec<tokio::task::JoinHandle<Result<(), Error>>> = Vec::new();
        for idx in order {
            let plugin = self.plugins[idx].clone();
            let meta = plugin.hook_meta(hooks::BUILD_START);

            if meta.sequential {
                for handle in pending.drain(..) {
                    handle.await.map_err(|e| Error::other(e.to_string()))??;
                }
                self.run_single_build_start(plugin).await?;
                continue;
            }

            let this = self.clone();
            pending.push(tokio::spawn(async move { this.run_single_build_start(plugin).await }));
        }

        for handle in pending {
            handle.await.map_err(|e| Error::other(e.to_string()))??;
        }
        Ok(())
    }

    async fn run_single_build_start(self: &Arc<Self>, plugin: Arc<dyn Plugin>) -> Result<(), Error> {
        let _guard = self.tracker.guard();
        let mut ctx = PluginContext::new(self.clone(), hooks::BUILD_START, Some(plugin.name().to_string()));
        plugin
            .build_start(&ctx)
            .await
            .map_err(|e| self.enrich(e, &mut ctx))
    }

    /// First-non-null across sorted plugins, honoring the skip set for
    /// self-recursion guarding.
    pub async fn resolve_id(
        self: &Arc<Self>,
        id: &str,
        importer: Option<&str>,
        opts: ResolveOptions,
    ) -> Result<Option<ResolvedId>, Error> {
        self.resolve_id_with_skip(id, importer, opts, HashSet::new()).await
    }

    pub(crate) async fn resolve_id_with_skip(
        self: &Arc<Self>,
        id: &str,
        importer: Option<&str>,
        opts: ResolveOptions,
        skip: HashSet<String>,
    ) -> Result<Option<ResolvedId>, Error> {
        self.ensure_open()?;
        let _guard = self.tracker.guard();

        let importer_owned = importer.map(String::from).unwrap_or_else(|| {
            self.config.default_importer().to_string_lossy().into_owned()
        });

        for idx in self.sorted_indices(hooks::RESOLVE_ID) {
            let plugin = &self.plugins[idx];
            if skip.contains(plugin.name()) {
                continue;
            }

            let mut ctx = PluginContext::with_skip(
                self.clone(),
                hooks::RESOLVE_ID,
                Some(plugin.name().to_string()),
                skip.clone(),
            );
            ctx.active_id = Some(id.to_string());

            match plugin
                .resolve_id(&ctx, id, Some(importer_owned.as_str()), &opts)
                .await
            {
                Ok(Some(out)) => {
                    let mut resolved: ResolvedId = out.into();
                    resolved.id = if crate::paths::is_external_url(&resolved.id) {
                        resolved.id
                    } else {
                        crate::paths::normalize_id(&resolved.id)
                    };
                    return Ok(Some(resolved));
                }
                Ok(None) => continue,
                Err(err) => return Err(self.enrich(err, &mut ctx)),
            }
        }

        Ok(None)
    }

    /// First-non-null across sorted plugins.
    pub async fn load(self: &Arc<Self>, id: &str, opts: &LoadOptions) -> Result<Option<LoadOutput>, Error> {
        self.ensure_open()?;
        let _guard = self.tracker.guard();

        for idx in self.sorted_indices(hooks::LOAD) {
            let plugin = &self.plugins[idx];
            let mut ctx = PluginContext::new(self.clone(), hooks::LOAD, Some(plugin.name().to_string()));
            ctx.active_id = Some(id.to_string());

            match plugin.load(&ctx, id, opts).await {
                Ok(Some(result)) => return Ok(Some(result)),
                Ok(None) => continue,
                Err(err) => return Err(self.enrich(err, &mut ctx)),
            }
        }

        Ok(None)
    }

    /// Accumulating pipeline across sorted plugins: each plugin sees the
    /// previous plugin's output code.
    pub async fn transform(self: &Arc<Self>, code: &str, id: &str) -> Result<TransformResult, Error> {
        self.ensure_open()?;
        let _guard = self.tracker.guard();

        let mut ctx = TransformContext::new(self.clone(), id, code, None);
        if let Some(node) = self.module_graph.get_module_by_id(id).await {
            let added: Vec<String> = node.read().await.added_imports.iter().cloned().collect();
            ctx.inherit_added_imports(added);
        }

        let mut current_code = code.to_string();

        for idx in self.sorted_indices(hooks::TRANSFORM) {
            let plugin = &self.plugins[idx];
            ctx.base.active_plugin = Some(plugin.name().to_string());
            ctx.base.active_id = Some(id.to_string());
            ctx.base.active_code = Some(current_code.clone());

            match plugin.transform(&mut ctx, &current_code, id).await {
                Ok(Some(TransformHookOutput::Code(new_code))) => {
                    current_code = new_code;
                }
                Ok(Some(TransformHookOutput::Full { code, map, meta })) => {
                    if let Some(new_code) = code {
                        current_code = new_code;
                    }
                    if let Some(map) = map {
                        ctx.sourcemap_chain.push(match map {
                            MapInput::Sentinel => MapEntry::Sentinel,
                            MapInput::Value(v) => MapEntry::Json(v),
                        });
                    }
                    if let Some(Value::Object(meta)) = meta {
                        if let Some(node) = self.module_graph.get_module_by_id(id).await {
                            node.write().await.meta.extend(meta);
                        }
                    }
                }
                Ok(None) => {}
                Err(err) => return Err(self.enrich(err, &mut ctx)),
            }
        }

        // Unlike the public `getCombinedSourcemap()` plugins call on the
        // context, the driver's own return value may legitimately carry the
        // empty sentinel straight through.
        let combined: CombinedMapResult = ctx.sourcemap_chain.collapse().into();
        Ok(TransformResult {
            code: current_code,
            map: combined,
        })
    }

    /// Parallel, unaggregated: every plugin's `watchChange` runs against a
    /// fresh context, and results are not merged.
    pub async fn watch_change(self: &Arc<Self>, id: &str, change: WatchChangeKind) -> Result<(), Error> {
        self.ensure_open()?;
        let order = self.sorted_indices(hooks::WATCH_CHANGE);

        let mut handles = Vec::new();
        for idx in order {
            let plugin = self.plugins[idx].clone();
            let this = self.clone();
            let id = id.to_string();
            handles.push(tokio::spawn(async move {
                let _guard = this.tracker.guard();
                let mut ctx = PluginContext::new(this.clone(), hooks::WATCH_CHANGE, Some(plugin.name().to_string()));
                plugin
                    .watch_change(&ctx, &id, change)
                    .await
                    .map_err(|e| this.enrich(e, &mut ctx))
            }));
        }

        for handle in handles {
            handle.await.map_err(|e| Error::other(e.to_string()))??;
        }
        Ok(())
    }

    /// Idempotent close. Drains pending hooks, then runs `buildEnd` and
    /// `closeBundle` each fully before the next begins.
    pub async fn close(self: &Arc<Self>) -> Result<(), Error> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.tracker.wait_idle().await;
        self.run_parallel_terminal(hooks::BUILD_END).await?;
        self.run_parallel_terminal(hooks::CLOSE_BUNDLE).await?;
        Ok(())
    }

    async fn run_parallel_terminal(self: &Arc<Self>, hook: &'static str) -> Result<(), Error> {
        let order = self.sorted_indices(hook);
        let mut handles = Vec::new();

        for idx in order {
            let plugin = self.plugins[idx].clone();
            let this = self.clone();
            handles.push(tokio::spawn(async move {
                let mut ctx = PluginContext::new(this.clone(), hook, Some(plugin.name().to_string()));
                let result = if hook == hooks::BUILD_END {
                    plugin.build_end(&ctx, None).await
                } else {
                    plugin.close_bundle(&ctx).await
                };
                result.map_err(|e| this.enrich(e, &mut ctx))
            }));
        }

        for handle in handles {
            handle.await.map_err(|e| Error::other(e.to_string()))??;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::module_graph::InMemoryModuleGraph;
    use crate::container::plugin::{HookResult, ResolveIdOutput};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex as StdMutex;

    struct RecordingPlugin {
        name: &'static str,
        resolves_to: Option<&'static str>,
        calls: Arc<StdMutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Plugin for RecordingPlugin {
        fn name(&self) -> &str {
            self.name
        }

        async fn resolve_id(
            &self,
            _ctx: &PluginContext,
            _id: &str,
            _importer: Option<&str>,
            _opts: &ResolveOptions,
        ) -> HookResult<Option<ResolveIdOutput>> {
            self.calls.lock().unwrap().push(self.name);
            Ok(self.resolves_to.map(|s| ResolveIdOutput::Id(s.to_string())))
        }
    }

    fn container_with(plugins: Vec<Arc<dyn Plugin>>) -> Arc<PluginContainer> {
        PluginContainer::new(
            plugins,
            Arc::new(EnvironmentConfig::new(PathBuf::from("/proj"))),
            Arc::new(InMemoryModuleGraph::new()),
        )
    }

    use crate::config::EnvironmentConfig;

    #[tokio::test]
    async fn resolve_id_short_circuits_on_first_non_null() {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let p1 = Arc::new(RecordingPlugin {
            name: "p1",
            resolves_to: None,
            calls: calls.clone(),
        });
        let p2 = Arc::new(RecordingPlugin {
            name: "p2",
            resolves_to: Some("/abs/a.js"),
            calls: calls.clone(),
        });
        let p3 = Arc::new(RecordingPlugin {
            name: "p3",
            resolves_to: Some("/abs/b.js"),
            calls: calls.clone(),
        });

        let container = container_with(vec![p1, p2, p3]);
        let resolved = container
            .resolve_id("a", None, ResolveOptions::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.id, "/abs/a.js");
        assert_eq!(*calls.lock().unwrap(), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn closed_container_rejects_resolve_id() {
        let container = container_with(Vec::new());
        container.close().await.unwrap();
        let err = container
            .resolve_id("a", None, ResolveOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("ERR_CLOSED_SERVER"));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let container = container_with(Vec::new());
        container.close().await.unwrap();
        container.close().await.unwrap();
    }

    struct AppendingTransform {
        name: &'static str,
        suffix: &'static str,
    }

    #[async_trait]
    impl Plugin for AppendingTransform {
        fn name(&self) -> &str {
            self.name
        }

        async fn transform(
            &self,
            _ctx: &mut TransformContext,
            code: &str,
            _id: &str,
        ) -> HookResult<Option<TransformHookOutput>> {
            Ok(Some(TransformHookOutput::Code(format!("{code}{}", self.suffix))))
        }
    }

    #[tokio::test]
    async fn transform_accumulates_across_three_plugins() {
        let container = container_with(vec![
            Arc::new(AppendingTransform { name: "a", suffix: ";a" }),
            Arc::new(AppendingTransform { name: "b", suffix: ";b" }),
            Arc::new(AppendingTransform { name: "c", suffix: ";c" }),
        ]);

        let result = container.transform("code", "/x.js").await.unwrap();
        assert_eq!(result.code, "code;a;b;c");
    }

    #[tokio::test]
    async fn transform_with_no_map_contributions_yields_null_map() {
        let container = container_with(vec![Arc::new(AppendingTransform {
            name: "a",
            suffix: ";a",
        })]);

        let result = container.transform("code", "/x.js").await.unwrap();
        assert!(matches!(result.map, CombinedMapResult::Null));
    }

    struct CountingTerminalPlugin {
        name: &'static str,
        build_end_calls: Arc<StdMutex<usize>>,
        close_bundle_calls: Arc<StdMutex<usize>>,
    }

    #[async_trait]
    impl Plugin for CountingTerminalPlugin {
        fn name(&self) -> &str {
            self.name
        }

        async fn build_end(&self, _ctx: &PluginContext, _err: Option<&HookError>) -> HookResult<()> {
            *self.build_end_calls.lock().unwrap() += 1;
            Ok(())
        }

        async fn close_bundle(&self, _ctx: &PluginContext) -> HookResult<()> {
            *self.close_bundle_calls.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn close_runs_build_end_and_close_bundle_exactly_once_per_plugin() {
        let build_end_calls = Arc::new(StdMutex::new(0));
        let close_bundle_calls = Arc::new(StdMutex::new(0));
        let container = container_with(vec![Arc::new(CountingTerminalPlugin {
            name: "p1",
            build_end_calls: build_end_calls.clone(),
            close_bundle_calls: close_bundle_calls.clone(),
        })]);

        container.close().await.unwrap();
        container.close().await.unwrap();

        assert_eq!(*build_end_calls.lock().unwrap(), 1);
        assert_eq!(*close_bundle_calls.lock().unwrap(), 1);
    }
}
