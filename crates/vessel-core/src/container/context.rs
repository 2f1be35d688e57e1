//! The `this` object exposed to hook invocations.
//!
//! Constructed fresh per hook call rather than carried in process-wide
//! state, so concurrently interleaved hook chains never alias each other's
//! "currently active plugin".

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::container::container::PluginContainer;
use crate::container::error_formatter::{ActiveContext, ErrorPos, HookError, Loc, RawHookError};
use crate::container::module_info::ModuleInfo;
use crate::container::plugin::{LoadOptions, ResolvedId};
use crate::container::source_map::{CombinedMap, MapEntry, SourceMapChain};
use crate::error::Error;

/// `{code, map}` as returned from a full `transform()` driver call. `map`
/// may collapse to the empty sentinel; this is represented as
/// `CombinedMapResult::Sentinel`.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub code: String,
    pub map: CombinedMapResult,
}

#[derive(Debug, Clone)]
pub enum CombinedMapResult {
    Sentinel,
    Null,
    Map(Arc<sourcemap::SourceMap>),
}

impl From<CombinedMap> for CombinedMapResult {
    fn from(map: CombinedMap) -> Self {
        match map {
            CombinedMap::Sentinel => Self::Sentinel,
            CombinedMap::Null => Self::Null,
            CombinedMap::Map(m) => Self::Map(Arc::new(m)),
        }
    }
}

/// Options accepted by `PluginContext::resolve`.
#[derive(Debug, Clone)]
pub struct ResolveCallOptions {
    pub is_entry: bool,
    pub ssr: bool,
    /// Unless `false`, the currently active plugin is added to the skip set
    /// before re-entering `resolveId`, guarding against self-recursion.
    pub skip_self: bool,
}

impl Default for ResolveCallOptions {
    fn default() -> Self {
        Self {
            is_entry: false,
            ssr: false,
            skip_self: true,
        }
    }
}

pub struct PluginContext {
    pub(crate) container: Arc<PluginContainer>,
    pub hook: &'static str,
    pub active_plugin: Option<String>,
    pub active_id: Option<String>,
    pub active_code: Option<String>,
    pub(crate) skip: HashSet<String>,
    pub(crate) added_imports: HashSet<String>,
}

impl PluginContext {
    #[must_use]
    pub fn new(
        container: Arc<PluginContainer>,
        hook: &'static str,
        active_plugin: Option<String>,
    ) -> Self {
        Self::with_skip(container, hook, active_plugin, HashSet::new())
    }

    #[must_use]
    pub fn with_skip(
        container: Arc<PluginContainer>,
        hook: &'static str,
        active_plugin: Option<String>,
        skip: HashSet<String>,
    ) -> Self {
        Self {
            container,
            hook,
            active_plugin,
            active_id: None,
            active_code: None,
            skip,
            added_imports: HashSet::new(),
        }
    }

    /// Delegate to the JS/TS parser; touches no plugin state.
    pub fn parse(
        &self,
        code: &str,
        options: js_parser::ParserOptions,
    ) -> Result<js_parser::Ast, js_parser::ParseError> {
        js_parser::parse(code, options)
    }

    /// Re-enters `resolveId` with the skip-self recursion guard.
    pub async fn resolve(
        &self,
        id: &str,
        importer: Option<&str>,
        opts: ResolveCallOptions,
    ) -> Result<Option<ResolvedId>, Error> {
        let mut skip = self.skip.clone();
        if opts.skip_self {
            if let Some(name) = &self.active_plugin {
                skip.insert(name.clone());
            }
        }
        self.container
            .resolve_id_with_skip(id, importer, opts.into(), skip)
            .await
    }

    /// Ensure graph entry, run `load`, and — only if it produced code —
    /// run `transform` on the result.
    pub async fn load(&mut self, id: &str, opts: LoadOptions) -> Result<ModuleInfo, Error> {
        let node = self.container.module_graph().ensure_entry_from_url(id).await;
        let load_result = self.container.load(id, &opts).await?;

        match load_result {
            Some(loaded) => {
                {
                    let mut node = node.write().await;
                    if let Some(Value::Object(meta)) = loaded.meta {
                        node.meta.extend(meta);
                    }
                    node.added_imports.extend(self.added_imports.iter().cloned());
                }
                let _ = self.container.transform(&loaded.code, id).await?;
                let node = node.read().await;
                Ok(ModuleInfo::from_node(id, &node))
            }
            None => {
                let mut node = node.write().await;
                node.added_imports.extend(self.added_imports.iter().cloned());
                Ok(ModuleInfo::from_node(id, &node))
            }
        }
    }

    pub async fn get_module_info(&self, id: &str) -> Option<ModuleInfo> {
        let node = self.container.module_graph().get_module_by_id(id).await?;
        let node = node.read().await;
        Some(ModuleInfo::from_node(id, &node))
    }

    pub async fn get_module_ids(&self) -> Vec<String> {
        self.container.module_graph().ids().await
    }

    pub async fn add_watch_file(&mut self, id: &str) {
        self.container.watch_files().write().await.insert(id.to_string());
        self.added_imports.insert(id.to_string());
    }

    pub async fn get_watch_files(&self) -> Vec<String> {
        self.container.watch_files().read().await.iter().cloned().collect()
    }

    /// `emitFile`/`setAssetSource`/`getFileName`: always warn and return a
    /// placeholder, never fail the plugin.
    pub fn emit_file(&self) -> String {
        tracing::warn!(
            plugin = ?self.active_plugin,
            "emitFile is not supported in serve mode"
        );
        String::new()
    }

    pub fn set_asset_source(&self) {
        tracing::warn!(
            plugin = ?self.active_plugin,
            "setAssetSource is not supported in serve mode"
        );
    }

    pub fn get_file_name(&self) -> String {
        tracing::warn!(
            plugin = ?self.active_plugin,
            "getFileName is not supported in serve mode"
        );
        String::new()
    }

    pub fn warn(&mut self, message: impl Into<String>, pos: Option<ErrorPos>) {
        let mut raw = RawHookError::new(message);
        raw.pos = pos;
        let formatted = crate::container::error_formatter::ErrorFormatter::format(
            HookError::Raw(raw),
            self,
        );
        tracing::warn!(plugin = %formatted.plugin, message = %formatted.message, "plugin warning");
    }

    /// The plugin's explicit signal that its contribution is fatal. Returns
    /// the enriched error for the caller to propagate with `return Err(...)`.
    pub fn error(&mut self, message: impl Into<String>, pos: Option<ErrorPos>) -> Error {
        let mut raw = RawHookError::new(message);
        raw.pos = pos;
        let formatted = crate::container::error_formatter::ErrorFormatter::format(
            HookError::Raw(raw),
            self,
        );
        Error::Plugin(formatted)
    }
}

impl ActiveContext for PluginContext {
    fn active_plugin_name(&self) -> Option<&str> {
        self.active_plugin.as_deref()
    }
    fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }
    fn active_code(&self) -> Option<&str> {
        self.active_code.as_deref()
    }
    fn hook(&self) -> &'static str {
        self.hook
    }
}

impl From<ResolveCallOptions> for crate::container::plugin::ResolveOptions {
    fn from(opts: ResolveCallOptions) -> Self {
        Self {
            is_entry: opts.is_entry,
            ssr: opts.ssr,
            scan: false,
            custom: None,
            attributes: None,
        }
    }
}

/// Extends [`PluginContext`] with the state accumulated across a single
/// `transform` pipeline run.
pub struct TransformContext {
    pub base: PluginContext,
    pub filename: String,
    pub original_code: String,
    pub sourcemap_chain: SourceMapChain,
}

impl TransformContext {
    #[must_use]
    pub fn new(
        container: Arc<PluginContainer>,
        id: &str,
        code: &str,
        in_map: Option<MapEntry>,
    ) -> Self {
        let mut sourcemap_chain = SourceMapChain::new(id, code);
        if let Some(entry) = in_map {
            sourcemap_chain.push(entry);
        }
        Self {
            base: PluginContext::new(container, crate::container::plugin::hooks::TRANSFORM, None),
            filename: id.to_string(),
            original_code: code.to_string(),
            sourcemap_chain,
        }
    }

    /// Inherit the added-imports set recorded by a prior `load` on the same
    /// module node.
    pub fn inherit_added_imports(&mut self, imports: impl IntoIterator<Item = String>) {
        self.base.added_imports.extend(imports);
    }

    /// Always returns a real map; synthesizes an identity map when the
    /// chain has collapsed to nothing meaningful.
    pub fn get_combined_sourcemap(&mut self) -> sourcemap::SourceMap {
        self.sourcemap_chain.get_combined_sourcemap()
    }
}

impl std::ops::Deref for TransformContext {
    type Target = PluginContext;
    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl std::ops::DerefMut for TransformContext {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

impl ActiveContext for TransformContext {
    fn active_plugin_name(&self) -> Option<&str> {
        self.base.active_plugin_name()
    }
    fn active_id(&self) -> Option<&str> {
        self.base.active_id.as_deref().or(Some(self.filename.as_str()))
    }
    fn active_code(&self) -> Option<&str> {
        self.base.active_code()
    }
    fn hook(&self) -> &'static str {
        self.base.hook()
    }

    /// Remap a computed location through the accumulated source-map chain
    /// back to the original source. A non-destructive peek — the chain the
    /// final transform result still needs is left untouched.
    fn remap_via_sourcemap(&mut self, loc: &Loc) -> Option<Loc> {
        let (line, column) = (loc.line?, loc.column?);
        let CombinedMap::Map(map) = self.sourcemap_chain.peek_combined() else {
            return None;
        };
        let token = map.lookup_token(line.saturating_sub(1) as u32, column as u32)?;
        Some(Loc {
            file: token.get_source().map(ToOwned::to_owned).or_else(|| loc.file.clone()),
            line: Some(token.get_src_line() as usize + 1),
            column: Some(token.get_src_col() as usize),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvironmentConfig;
    use crate::container::module_graph::InMemoryModuleGraph;
    use std::path::PathBuf;

    fn test_container() -> Arc<PluginContainer> {
        PluginContainer::new(
            Vec::new(),
            Arc::new(EnvironmentConfig::new(PathBuf::from("/proj"))),
            Arc::new(InMemoryModuleGraph::new()),
        )
    }

    #[tokio::test]
    async fn add_watch_file_records_in_both_sets() {
        let container = test_container();
        let mut ctx = PluginContext::new(container.clone(), "load", None);
        ctx.add_watch_file("/a.css").await;
        assert_eq!(ctx.get_watch_files().await, vec!["/a.css".to_string()]);
        assert!(ctx.added_imports.contains("/a.css"));
    }

    #[tokio::test]
    async fn get_module_info_is_none_for_unknown_id() {
        let container = test_container();
        let ctx = PluginContext::new(container, "load", None);
        assert!(ctx.get_module_info("/missing.js").await.is_none());
    }
}
