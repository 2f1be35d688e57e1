#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod container;
pub mod crawl_end;
pub mod deps_optimizer;
pub mod environment;
pub mod error;
pub mod hot_channel;
pub mod imports;
pub mod paths;

pub use config::EnvironmentConfig;
pub use container::{PluginContainer, PluginContext, TransformContext};
pub use crawl_end::{CrawlEndFinder, IdleOutcome};
pub use deps_optimizer::{select_deps_optimizer, DepsOptimizer};
pub use environment::DevEnvironment;
pub use error::Error;
pub use hot_channel::{HotChannel, InvalidatePayload};
pub use imports::{scan_imports, ImportSpecCore};
