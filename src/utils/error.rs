use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("News API request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Object store {operation} failed: {message}")]
    StoreError { operation: String, message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unexpected error: {message}")]
    Unexpected { message: String },

    #[error("Task '{task}' failed after {attempts} attempt(s): {source}")]
    TaskFailed {
        task: String,
        attempts: u32,
        #[source]
        source: Box<EtlError>,
    },
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Storage,
    Data,
    Database,
    Unexpected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn config(message: impl Into<String>) -> Self {
        EtlError::ConfigError {
            message: message.into(),
        }
    }

    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        EtlError::StoreError {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::NetworkError(_) => ErrorCategory::Network,
            EtlError::StoreError { .. } | EtlError::IoError(_) => ErrorCategory::Storage,
            EtlError::FileNotFound { .. }
            | EtlError::ValidationError { .. }
            | EtlError::CsvError(_)
            | EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::DatabaseError(_) => ErrorCategory::Database,
            EtlError::Unexpected { .. } => ErrorCategory::Unexpected,
            EtlError::TaskFailed { source, .. } => source.category(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Storage | ErrorCategory::Database => {
                ErrorSeverity::Medium
            }
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Unexpected => ErrorSeverity::Critical,
        }
    }

    /// Transient failures that a later attempt may get past.
    pub fn is_retryable(&self) -> bool {
        match self {
            EtlError::TaskFailed { source, .. } => source.is_retryable(),
            EtlError::NetworkError(e) => {
                // 4xx 除了 429 都是請求本身的問題
                match e.status() {
                    Some(status) => status.is_server_error() || status.as_u16() == 429,
                    None => true,
                }
            }
            _ => matches!(
                self.category(),
                ErrorCategory::Storage | ErrorCategory::Database
            ),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the environment variables (or .env / TOML config) for missing or malformed values"
            }
            ErrorCategory::Network => {
                "Check network connectivity, the NEWS_API_KEY quota and the news API status"
            }
            ErrorCategory::Storage => {
                "Check AWS credentials, bucket name, region and local directory permissions"
            }
            ErrorCategory::Data => {
                "Make sure the cleaning step ran and produced a non-empty CSV at the configured path"
            }
            ErrorCategory::Database => {
                "Check that PostgreSQL is reachable and the POSTGRES_* settings are correct"
            }
            ErrorCategory::Unexpected => "Inspect the logs under logs/ for the full error chain",
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}
