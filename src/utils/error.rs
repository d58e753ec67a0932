use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Input error: {message}")]
    InputError { message: String },

    #[error("Audio payload too large: {message}")]
    PayloadTooLarge { message: String },

    #[error("Course code extraction failed: {message}")]
    ExtractionError { message: String },

    #[error("Timetable fetch failed for {department}: {message}")]
    FetchError { department: String, message: String },

    #[error("Schedule synthesis failed: {message}")]
    SynthesisError { message: String },

    #[error("Markup parsing error: {message}")]
    ParseError { message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, PlannerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Collaborator,
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PlannerError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::InputError {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::ExtractionError {
            message: message.into(),
        }
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::SynthesisError {
            message: message.into(),
        }
    }

    pub fn fetch(department: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchError {
            department: department.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InputError { .. } | Self::PayloadTooLarge { .. } => ErrorCategory::Input,
            Self::ExtractionError { .. } | Self::SynthesisError { .. } => {
                ErrorCategory::Collaborator
            }
            Self::FetchError { .. } | Self::HttpError(_) => ErrorCategory::Network,
            Self::ParseError { .. }
            | Self::CsvError(_)
            | Self::SerializationError(_) => ErrorCategory::Data,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::ZipError(_) => ErrorCategory::System,
        }
    }

    /// Fetch failures are recovered per department, so they never rank above `Low`.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::FetchError { .. } => ErrorSeverity::Low,
            Self::HttpError(_) | Self::SynthesisError { .. } | Self::ExtractionError { .. } => {
                ErrorSeverity::Medium
            }
            Self::InputError { .. }
            | Self::PayloadTooLarge { .. }
            | Self::ParseError { .. }
            | Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::High,
            Self::IoError(_) | Self::ZipError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InputError { message } => format!("No usable course request: {}", message),
            Self::PayloadTooLarge { .. } => {
                "Audio file is too large. Please provide a smaller file or use raw text input."
                    .to_string()
            }
            Self::ExtractionError { .. } => {
                "Could not work out which courses you asked for".to_string()
            }
            Self::FetchError { department, .. } => {
                format!("Timetable for {} is unavailable right now", department)
            }
            Self::SynthesisError { .. } => "Could not generate schedules".to_string(),
            Self::HttpError(_) => "A network request failed".to_string(),
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => format!("Configuration problem: {}", self),
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Provide a non-empty text request, or a smaller audio file",
            ErrorCategory::Collaborator => {
                "Check the LLM API key and model names in the [llm] section"
            }
            ErrorCategory::Network => "Check network access to the timetable endpoint",
            ErrorCategory::Data => "Inspect the fetched markup; the timetable layout may have changed",
            ErrorCategory::Configuration => "Review the TOML config and CLI overrides",
            ErrorCategory::System => "Check that the output path exists and is writable",
        }
    }
}
