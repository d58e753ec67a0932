#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::{AudioInput, PlannerInput};
#[cfg(feature = "cli")]
use crate::utils::error::{PlannerError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub use toml_config::TomlConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "cusched")]
#[command(about = "Turn a course request into candidate timetables")]
pub struct CliConfig {
    #[arg(long, short = 'c', help = "Path to the TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Course request as plain text")]
    pub text: Option<String>,

    #[arg(long, help = "Course request as an audio recording")]
    pub audio: Option<String>,

    #[arg(long, help = "Override timetable.term_code")]
    pub term_code: Option<String>,

    #[arg(long, help = "Override output.path")]
    pub output_path: Option<String>,

    #[arg(long, help = "Override timetable.concurrent_requests")]
    pub concurrent_requests: Option<usize>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU/memory at each phase")]
    pub monitor: bool,

    #[arg(long, help = "Write the run archive to the output path")]
    pub persist: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// The file configuration (or defaults) with command-line overrides applied.
    pub fn load_config(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        self.apply_to(&mut config);
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut TomlConfig) {
        if let Some(term_code) = &self.term_code {
            config.timetable.term_code = term_code.clone();
        }
        if let Some(path) = &self.output_path {
            config.output.path = path.clone();
        }
        if let Some(n) = self.concurrent_requests {
            config.timetable.concurrent_requests = n;
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }
        if self.persist {
            config.output.persist = true;
        }
    }

    /// Text wins over audio. Neither is left for the planner to reject.
    pub async fn planner_input(&self) -> Result<PlannerInput> {
        let text = self.text.clone();
        if text.as_deref().is_some_and(|t| !t.trim().is_empty()) {
            return Ok(PlannerInput { raw_text: text, audio: None });
        }

        let audio = match &self.audio {
            Some(path) => Some(AudioInput::from_path(path).await.map_err(|e| {
                PlannerError::input(format!("Cannot read audio file '{}': {}", path, e))
            })?),
            None => None,
        };
        Ok(PlannerInput { raw_text: text, audio })
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            validation::validate_path("config", path)?;
        }
        if let Some(term_code) = &self.term_code {
            validation::validate_term_code("term_code", term_code)?;
        }
        if let Some(n) = self.concurrent_requests {
            validation::validate_positive_number("concurrent_requests", n, 1)?;
        }
        if let Some(path) = &self.audio {
            validation::validate_path("audio", path)?;
        }
        Ok(())
    }
}
