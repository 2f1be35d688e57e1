//! The per-environment plugin container: hook ordering, context identity,
//! error enrichment, and source-map chaining.

pub mod container;
pub mod context;
pub mod error_formatter;
pub mod hook;
pub mod module_graph;
pub mod module_info;
pub mod plugin;
pub mod source_map;

pub use container::PluginContainer;
pub use context::{PluginContext, ResolveCallOptions, TransformContext, TransformResult};
pub use error_formatter::{ErrorFormatter, HookError, Loc, PluginError, RawHookError};
pub use hook::{HookMeta, HookOrder};
pub use module_graph::{InMemoryModuleGraph, ModuleGraphHandle, ModuleNode};
pub use module_info::ModuleInfo;
pub use plugin::{
    hooks, LoadOptions, LoadOutput, MapInput, Plugin, ResolveIdOutput, ResolveOptions, ResolvedId,
    TransformHookOutput, WatchChangeKind,
};
