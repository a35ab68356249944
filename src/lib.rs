pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use app::{build_news_pipeline, TaskFilter, TASK_ORDER};
pub use config::Settings;
pub use core::{PipelineTask, TaskContext, TaskResult, TaskSequence};
pub use utils::error::{EtlError, Result};
