pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use adapters::{LlmClient, TimetableClient};
pub use app::pipelines::CatalogPipeline;
pub use config::TomlConfig;
pub use core::planner::SchedulePlanner;
pub use domain::model::{PlannerInput, PlannerOutcome};
pub use utils::error::{PlannerError, Result};
