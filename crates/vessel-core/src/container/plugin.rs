//! The `Plugin` trait and the per-hook data shapes the container exchanges
//! with it.
//!
//! Generalizes a synchronous `Plugin` trait (`bundler/plugin.rs`) to the
//! async, Rollup-compatible hook set this container drives: every hook is
//! optional and defaults to a no-op, so a plugin implements only the
//! handful it cares about.

use async_trait::async_trait;
use serde_json::Value;

use crate::container::context::{PluginContext, TransformContext};
use crate::container::error_formatter::HookError;
use crate::container::hook::HookMeta;

pub type HookResult<T> = Result<T, HookError>;

/// Hook name constants, used both for `Plugin::hook_meta` lookups and for
/// `PluginError::hook` attribution.
pub mod hooks {
    pub const OPTIONS: &str = "options";
    pub const BUILD_START: &str = "buildStart";
    pub const RESOLVE_ID: &str = "resolveId";
    pub const LOAD: &str = "load";
    pub const TRANSFORM: &str = "transform";
    pub const WATCH_CHANGE: &str = "watchChange";
    pub const BUILD_END: &str = "buildEnd";
    pub const CLOSE_BUNDLE: &str = "closeBundle";
}

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub is_entry: bool,
    pub ssr: bool,
    pub scan: bool,
    pub custom: Option<Value>,
    pub attributes: Option<Value>,
}

/// What a `resolveId` handler may hand back: a bare specifier (becomes
/// `{id}`) or a full record.
#[derive(Debug, Clone)]
pub enum ResolveIdOutput {
    Id(String),
    Full(ResolvedId),
}

#[derive(Debug, Clone)]
pub struct ResolvedId {
    pub id: String,
    pub external: bool,
    pub meta: Option<Value>,
}

impl ResolvedId {
    #[must_use]
    pub fn from_bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: false,
            meta: None,
        }
    }
}

impl From<ResolveIdOutput> for ResolvedId {
    fn from(out: ResolveIdOutput) -> Self {
        match out {
            ResolveIdOutput::Id(id) => Self::from_bare(id),
            ResolveIdOutput::Full(full) => full,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub ssr: bool,
}

/// A `{mappings: ""}`-sentinel-aware map value as it travels from plugin to
/// container.
#[derive(Debug, Clone)]
pub enum MapInput {
    Sentinel,
    Value(Value),
}

#[derive(Debug, Clone)]
pub struct LoadOutput {
    pub code: String,
    pub map: Option<MapInput>,
    pub meta: Option<Value>,
}

/// What a `transform` handler may hand back.
#[derive(Debug, Clone)]
pub enum TransformHookOutput {
    Code(String),
    Full {
        code: Option<String>,
        map: Option<MapInput>,
        meta: Option<Value>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchChangeKind {
    Create,
    Update,
    Delete,
}

/// A user-supplied record of hooks, driven by the container in the
/// Rollup-compatible protocol. Every hook defaults to a no-op so a plugin
/// implements only what it needs.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Per-hook ordering/sequential metadata. Most plugins never override
    /// this; the default places every hook in the default tier, non-sequential.
    fn hook_meta(&self, _hook: &'static str) -> HookMeta {
        HookMeta::default()
    }

    async fn options(&self, _ctx: &PluginContext, _input: Value) -> HookResult<Option<Value>> {
        Ok(None)
    }

    async fn build_start(&self, _ctx: &PluginContext) -> HookResult<()> {
        Ok(())
    }

    async fn resolve_id(
        &self,
        _ctx: &PluginContext,
        _id: &str,
        _importer: Option<&str>,
        _opts: &ResolveOptions,
    ) -> HookResult<Option<ResolveIdOutput>> {
        Ok(None)
    }

    async fn load(
        &self,
        _ctx: &PluginContext,
        _id: &str,
        _opts: &LoadOptions,
    ) -> HookResult<Option<LoadOutput>> {
        Ok(None)
    }

    async fn transform(
        &self,
        _ctx: &mut TransformContext,
        _code: &str,
        _id: &str,
    ) -> HookResult<Option<TransformHookOutput>> {
        Ok(None)
    }

    async fn watch_change(
        &self,
        _ctx: &PluginContext,
        _id: &str,
        _change: WatchChangeKind,
    ) -> HookResult<()> {
        Ok(())
    }

    async fn build_end(&self, _ctx: &PluginContext, _err: Option<&HookError>) -> HookResult<()> {
        Ok(())
    }

    async fn close_bundle(&self, _ctx: &PluginContext) -> HookResult<()> {
        Ok(())
    }
}
