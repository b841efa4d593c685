use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Cannot read input file {path}: {source}")]
    InputReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid source record #{index}: {reason}")]
    SourceRecordError { index: usize, reason: String },

    #[error("Schema error for '{schema}': {reason}")]
    SchemaError { schema: String, reason: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Output,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl SchedError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SchedError::MissingConfigError { .. }
            | SchedError::InvalidConfigValueError { .. }
            | SchedError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            SchedError::InputReadError { .. }
            | SchedError::SourceRecordError { .. }
            | SchedError::YamlError(_) => ErrorCategory::Input,
            SchedError::IoError(_) | SchedError::SerializationError(_) => ErrorCategory::Output,
            SchedError::SchemaError { .. } | SchedError::ValidationError { .. } => {
                ErrorCategory::Validation
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SchedError::ValidationError { .. } => ErrorSeverity::Medium,
            SchedError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            SchedError::MissingConfigError { field } => {
                format!("Missing required setting '{}'", field)
            }
            SchedError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            SchedError::ConfigValidationError { field, message } => {
                format!("Could not read configuration ({}): {}", field, message)
            }
            SchedError::InputReadError { path, source } => {
                format!("Could not read '{}': {}", path, source)
            }
            SchedError::SourceRecordError { index, reason } => {
                format!("Input location #{} is malformed: {}", index, reason)
            }
            SchedError::IoError(e) => format!("File system operation failed: {}", e),
            SchedError::SerializationError(e) => {
                format!("Could not encode or decode JSON: {}", e)
            }
            SchedError::YamlError(e) => format!("Could not decode YAML: {}", e),
            SchedError::SchemaError { schema, reason } => {
                format!("Schema '{}' could not be used: {}", schema, reason)
            }
            SchedError::ValidationError { message } => message.clone(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        if let SchedError::InputReadError { .. } = self {
            return "Check that the input file path exists and is readable";
        }
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the TOML file and command-line flags (run with --help)"
            }
            ErrorCategory::Input => {
                "Fix the input file so every location has a name, an address and valid slot counts"
            }
            ErrorCategory::Output => "Make sure the output directory exists and is writable",
            ErrorCategory::Validation => {
                "Inspect the listed violations and regenerate or fix the files"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedError>;
