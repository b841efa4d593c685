pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;
pub mod validator;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::storage::LocalStorage;
pub use config::GeneratorConfig;
pub use core::{etl::EtlEngine, pipeline::GeneratorPipeline};
pub use utils::error::{Result, SchedError};
pub use validator::SchemaChecker;
