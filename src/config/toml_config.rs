use crate::domain::model::GenerationLimits;
use crate::utils::error::{PlannerError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static env var regex"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub timetable: TimetableConfig,
    pub courses: CoursesConfig,
    pub llm: LlmConfig,
    pub synthesis: SynthesisConfig,
    pub output: OutputConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableConfig {
    pub endpoint: String,
    pub term_code: String,
    pub session_id: String,
    /// Level filter sent as `sel_levl` (UG = undergraduate).
    pub level: String,
    pub timeout_seconds: u64,
    pub concurrent_requests: usize,
    pub cookie: Option<String>,
    pub headers: HashMap<String, String>,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://central.carleton.ca/prod/bwysched.p_course_search".to_string(),
            term_code: "202510".to_string(),
            session_id: "22963932".to_string(),
            level: "UG".to_string(),
            timeout_seconds: 20,
            concurrent_requests: 4,
            cookie: None,
            headers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoursesConfig {
    pub allowed_codes: Vec<String>,
    /// Comma-separated code list, as written by `update_codes`.
    pub allowed_codes_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub transcription_model: String,
    pub transcription_prompt: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: Some("${GROQ_API_KEY}".to_string()),
            chat_model: "llama3-70b-8192".to_string(),
            transcription_model: "whisper-large-v3-turbo".to_string(),
            transcription_prompt: Some("Specify context or spelling".to_string()),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub max_credits: f64,
    pub min_schedules: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        let limits = GenerationLimits::default();
        Self {
            max_credits: limits.max_credits,
            min_schedules: limits.min_schedules,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    /// Write the run archive (catalog, sections, manifest) after each run.
    pub persist: bool,
    pub archive_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
            persist: false,
            archive_name: "catalog_run.zip".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

/// Parses the allowed-codes file format: comma separated, blanks dropped.
pub fn parse_code_list(content: &str) -> Vec<String> {
    content
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_placeholder(value: &str) -> bool {
    ENV_VAR_RE.is_match(value)
}

/// Resolves a secret-ish setting: `${VAR}` placeholders are substituted, and
/// blank or still-unresolved values count as unset.
pub fn resolve_secret(value: Option<&str>) -> Option<String> {
    value
        .map(TomlConfig::substitute_env_vars)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !is_placeholder(v))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PlannerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| PlannerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay literal.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("timetable.endpoint", &self.timetable.endpoint)?;
        validation::validate_term_code("timetable.term_code", &self.timetable.term_code)?;
        validation::validate_non_empty_string("timetable.session_id", &self.timetable.session_id)?;
        validation::validate_non_empty_string("timetable.level", &self.timetable.level)?;
        validation::validate_positive_number(
            "timetable.concurrent_requests",
            self.timetable.concurrent_requests,
            1,
        )?;
        validation::validate_range("timetable.timeout_seconds", self.timetable.timeout_seconds, 1, 600)?;

        validation::validate_course_codes("courses.allowed_codes", &self.courses.allowed_codes)?;
        if let Some(path) = &self.courses.allowed_codes_file {
            validation::validate_path("courses.allowed_codes_file", path)?;
        }

        validation::validate_url("llm.base_url", &self.llm.base_url)?;
        validation::validate_non_empty_string("llm.chat_model", &self.llm.chat_model)?;
        validation::validate_range("llm.timeout_seconds", self.llm.timeout_seconds, 1, 600)?;

        validation::validate_range("synthesis.max_credits", self.synthesis.max_credits, 0.5, 10.0)?;
        validation::validate_range("synthesis.min_schedules", self.synthesis.min_schedules, 1, 20)?;

        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_non_empty_string("output.archive_name", &self.output.archive_name)?;

        Ok(())
    }

    /// The API key, if one was configured and its placeholder resolves.
    ///
    /// Placeholders are resolved again here because section defaults are
    /// applied after the file-level substitution pass.
    pub fn api_key(&self) -> Option<String> {
        resolve_secret(self.llm.api_key.as_deref())
    }

    pub fn require_api_key(&self) -> Result<String> {
        self.api_key().ok_or_else(|| PlannerError::MissingConfigError {
            field: "llm.api_key (or GROQ_API_KEY)".to_string(),
        })
    }

    /// Inline codes followed by those from `allowed_codes_file`, duplicates dropped.
    pub async fn load_allowed_codes(&self) -> Result<Vec<String>> {
        let mut codes = self.courses.allowed_codes.clone();
        if let Some(path) = &self.courses.allowed_codes_file {
            let content = tokio::fs::read_to_string(path).await?;
            codes.extend(parse_code_list(&content));
        }

        let mut seen = std::collections::HashSet::new();
        codes.retain(|code| seen.insert(crate::core::normalize::normalize(code)));
        Ok(codes)
    }

    pub fn generation_limits(&self) -> GenerationLimits {
        GenerationLimits {
            max_credits: self.synthesis.max_credits,
            min_schedules: self.synthesis.min_schedules,
        }
    }

    pub fn output_path(&self) -> &str {
        &self.output.path
    }

    pub fn concurrent_requests(&self) -> usize {
        self.timetable.concurrent_requests
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[timetable]
term_code = "202520"
concurrent_requests = 2

[courses]
allowed_codes = ["COMP1405", "MATH1007"]

[synthesis]
max_credits = 2.0
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.timetable.term_code, "202520");
        assert_eq!(config.concurrent_requests(), 2);
        assert_eq!(config.timetable.level, "UG");
        assert_eq!(config.courses.allowed_codes.len(), 2);
        assert_eq!(config.generation_limits().max_credits, 2.0);
        assert_eq!(config.generation_limits().min_schedules, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(
            config.timetable.endpoint,
            "https://central.carleton.ca/prod/bwysched.p_course_search"
        );
        assert_eq!(config.llm.chat_model, "llama3-70b-8192");
        assert!(!config.output.persist);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CUSCHED_TEST_API_KEY", "gsk_test");

        let toml_content = r#"
[llm]
api_key = "${CUSCHED_TEST_API_KEY}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_key().as_deref(), Some("gsk_test"));

        std::env::remove_var("CUSCHED_TEST_API_KEY");
    }

    #[test]
    fn test_unresolved_api_key_counts_as_missing() {
        let toml_content = r#"
[llm]
api_key = "${CUSCHED_SURELY_UNSET_VARIABLE}"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_key(), None);
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[timetable]
endpoint = "invalid-url"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let bad_term = TomlConfig::from_toml_str("[timetable]\nterm_code = \"fall\"\n").unwrap();
        assert!(bad_term.validate().is_err());

        let bad_codes =
            TomlConfig::from_toml_str("[courses]\nallowed_codes = [\"COMP\"]\n").unwrap();
        assert!(bad_codes.validate().is_err());
    }

    #[test]
    fn test_parse_code_list() {
        assert_eq!(
            parse_code_list("COMP1405, COMP1406,,  MATH1007 ,\n"),
            vec!["COMP1405", "COMP1406", "MATH1007"]
        );
        assert!(parse_code_list("").is_empty());
    }

    #[tokio::test]
    async fn test_load_allowed_codes_merges_file() {
        let mut codes_file = NamedTempFile::new().unwrap();
        codes_file.write_all(b"COMP1405, STAT2507").unwrap();

        let mut config = TomlConfig::default();
        config.courses.allowed_codes = vec!["comp 1405".to_string(), "MATH1007".to_string()];
        config.courses.allowed_codes_file = Some(codes_file.path().to_str().unwrap().to_string());

        let codes = config.load_allowed_codes().await.unwrap();
        assert_eq!(codes, vec!["comp 1405", "MATH1007", "STAT2507"]);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[output]
path = "./runs"
persist = true
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.output_path(), "./runs");
        assert!(config.output.persist);
    }
}
