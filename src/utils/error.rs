use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Template rendering error: {0}")]
    TemplateError(#[from] askama::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Query error: {message}")]
    QueryError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Database,
    Data,
    Io,
    Configuration,
    Rendering,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DashboardError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DashboardError::DatabaseError(_) | DashboardError::QueryError { .. } => {
                ErrorCategory::Database
            }
            DashboardError::CsvError(_)
            | DashboardError::SerializationError(_)
            | DashboardError::ProcessingError { .. } => ErrorCategory::Data,
            DashboardError::IoError(_) => ErrorCategory::Io,
            DashboardError::ConfigError { .. }
            | DashboardError::MissingConfigError { .. }
            | DashboardError::InvalidConfigValueError { .. }
            | DashboardError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            DashboardError::TemplateError(_) => ErrorCategory::Rendering,
            DashboardError::ValidationError { .. } => ErrorCategory::Validation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::Database => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Rendering => ErrorSeverity::High,
            ErrorCategory::Io | ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for a failed command; never 0.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::High => 1,
            ErrorSeverity::Low | ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DashboardError::DatabaseError(_) => {
                "Check DB_HOST/DB_PORT/DB_USER/DB_PASSWORD and that PostgreSQL is reachable"
            }
            DashboardError::QueryError { .. } => {
                "Check the SQL templates in SQL_DIR and the parameters they reference"
            }
            DashboardError::CsvError(_) => "Check that the CSV file has a header row and consistent columns",
            DashboardError::IoError(_) => "Check that the file exists and the process can read/write it",
            DashboardError::SerializationError(_) => "Inspect the data for values that cannot be serialized",
            DashboardError::TemplateError(_) => "Check the HTML template under templates/",
            DashboardError::ConfigError { .. }
            | DashboardError::MissingConfigError { .. }
            | DashboardError::InvalidConfigValueError { .. }
            | DashboardError::ConfigValidationError { .. } => {
                "Review the environment variables and the --config file"
            }
            DashboardError::ProcessingError { .. } => "Check that the source table has the expected columns",
            DashboardError::ValidationError { .. } => "Adjust the filter selection and try again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Database => format!("Could not read dashboard data from the database: {}", self),
            ErrorCategory::Data => format!("Dashboard data could not be processed: {}", self),
            ErrorCategory::Io => format!("File access failed: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Rendering => format!("Dashboard page could not be rendered: {}", self),
            ErrorCategory::Validation => format!("Invalid request: {}", self),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::Configuration => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("❌ Request failed: {} (Category: {:?})", self, self.category());
        } else {
            tracing::warn!("⚠️ Rejected request: {}", self);
        }
        (status, self.user_friendly_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_commands_exit_non_zero() {
        let bad_path = DashboardError::ValidationError {
            message: "output path is not valid UTF-8".to_string(),
        };
        assert_eq!(bad_path.severity(), ErrorSeverity::Low);
        assert_eq!(bad_path.exit_code(), 2);

        let query = DashboardError::QueryError {
            message: "connection refused".to_string(),
        };
        assert_eq!(query.exit_code(), 2);

        let io = DashboardError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "aug_25.csv"));
        assert_eq!(io.exit_code(), 3);
    }

    #[test]
    fn test_category_and_severity() {
        let err = DashboardError::QueryError {
            message: "missing parameter".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Database);
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        let err = DashboardError::MissingConfigError {
            field: "database.host".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_status_code_mapping() {
        let err = DashboardError::ValidationError {
            message: "unknown age group".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = DashboardError::ProcessingError {
            message: "boom".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_user_friendly_message_mentions_cause() {
        let err = DashboardError::ValidationError {
            message: "year out of range".to_string(),
        };
        let msg = err.user_friendly_message();
        assert!(msg.starts_with("Invalid request"));
        assert!(msg.contains("year out of range"));
    }
}
