use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Server responded with {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Server reported an error: {message}")]
    ServerError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Column index {column} not found (table has {available} columns)")]
    ColumnNotFound { column: usize, available: usize },

    #[error("Row {row} not found (table has {available} rows)")]
    RowNotFound { row: usize, available: usize },

    #[error("Issue {index} not found ({outstanding} outstanding)")]
    IssueNotFound { index: usize, outstanding: usize },

    #[error("Issue {index} has no suggested value")]
    NoSuggestion { index: usize },

    #[error("No input provided: {message}")]
    EmptyInput { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Server,
    Data,
    Correction,
    Input,
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

impl FixError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FixError::ApiError(_) => ErrorCategory::Network,
            FixError::HttpStatus { .. } | FixError::ServerError { .. } => ErrorCategory::Server,
            FixError::CsvError(_) | FixError::SerializationError(_) => ErrorCategory::Data,
            FixError::ColumnNotFound { .. }
            | FixError::RowNotFound { .. }
            | FixError::IssueNotFound { .. }
            | FixError::NoSuggestion { .. } => ErrorCategory::Correction,
            FixError::EmptyInput { .. } => ErrorCategory::Input,
            FixError::ConfigValidationError { .. } | FixError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            FixError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一修正失敗不影響其他資料
            ErrorCategory::Correction => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Server => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Input | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FixError::ApiError(e) if e.is_timeout() => {
                "The analysis server did not answer in time".to_string()
            }
            FixError::ApiError(e) if e.is_connect() => {
                "Could not connect to the analysis server".to_string()
            }
            FixError::ApiError(_) => "Failed to communicate with the analysis server".to_string(),
            FixError::HttpStatus { status, body } => {
                format!("The server rejected the request ({}): {}", status, body)
            }
            FixError::ServerError { message } => format!("The server reported: {}", message),
            FixError::CsvError(e) => format!("The CSV data could not be read: {}", e),
            FixError::SerializationError(e) => {
                format!("Unexpected data format from server: {}", e)
            }
            FixError::ColumnNotFound { column, .. } => {
                format!("The issue points to column {} which does not exist", column)
            }
            FixError::RowNotFound { row, .. } => {
                format!("The issue points to line {} which does not exist", row + 1)
            }
            FixError::IssueNotFound { index, .. } => format!("There is no issue number {}", index),
            FixError::NoSuggestion { .. } => {
                "This issue has no automatic fix and must be corrected manually".to_string()
            }
            FixError::EmptyInput { message } => message.clone(),
            FixError::IoError(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the server is running and that --api-base points to it"
            }
            ErrorCategory::Server => "Check the input file format (.csv, .xls or .xlsx) and try again",
            ErrorCategory::Data => "Make sure the file is UTF-8 CSV with a header line",
            ErrorCategory::Correction => "Re-run the analysis to refresh the issue list",
            ErrorCategory::Input => "Pass a file with --file or paste data with --text",
            ErrorCategory::Configuration => "Review the command line flags and the TOML config file",
            ErrorCategory::System => "Check file permissions and free disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, FixError>;
