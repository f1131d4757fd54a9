//! Application-wide error taxonomy.
//!
//! Every fallible operation in the workspace surfaces an `AppError`. The
//! variants map one-to-one onto the categories the HTTP layer reports:
//! validation problems abort a request before any I/O, local I/O and provider
//! problems abort the current upload only, and configuration problems are
//! fatal at startup.

use thiserror::Error;

/// Log severity hint attached to each error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Warn,
    Error,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Client sent something we refuse to process (bad MIME type, missing
    /// field). Rejected before any disk write.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Declared or observed payload size exceeds the ceiling for its target.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Staging read/write failure local to the current upload.
    #[error("Local I/O error: {0}")]
    LocalIo(String),

    /// Remote object store create/permission/delete failure, including
    /// timeouts.
    #[error("Remote store error: {0}")]
    Provider(String),

    /// Missing credentials or folder ids. Fatal at startup, never per-request.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code the API layer reports for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) => 400,
            AppError::PayloadTooLarge(_) => 413,
            AppError::NotFound(_) => 404,
            AppError::Provider(_) => 502,
            AppError::LocalIo(_)
            | AppError::Configuration(_)
            | AppError::Database(_)
            | AppError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "VALIDATION_ERROR",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::LocalIo(_) => "LOCAL_IO_ERROR",
            AppError::Provider(_) => "PROVIDER_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) | AppError::PayloadTooLarge(_) => "ValidationError",
            AppError::NotFound(_) => "NotFound",
            AppError::LocalIo(_) => "LocalIoError",
            AppError::Provider(_) => "ProviderError",
            AppError::Configuration(_) => "ConfigurationError",
            AppError::Database(_) => "DatabaseError",
            AppError::Internal(_) => "InternalError",
        }
    }

    /// Client mistakes are noise at error level; provider hiccups are
    /// expected operational events.
    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::InvalidInput(_) | AppError::PayloadTooLarge(_) | AppError::NotFound(_) => {
                LogLevel::Debug
            }
            AppError::Provider(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }

    pub fn client_message(&self) -> String {
        self.to_string()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::LocalIo(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AppError::InvalidInput("x".into()).http_status_code(), 400);
        assert_eq!(AppError::PayloadTooLarge("x".into()).http_status_code(), 413);
        assert_eq!(AppError::Provider("x".into()).http_status_code(), 502);
        assert_eq!(AppError::LocalIo("x".into()).http_status_code(), 500);
    }

    #[test]
    fn client_errors_log_at_debug() {
        assert_eq!(AppError::InvalidInput("x".into()).log_level(), LogLevel::Debug);
        assert_eq!(AppError::Provider("x".into()).log_level(), LogLevel::Warn);
        assert_eq!(AppError::Database("x".into()).log_level(), LogLevel::Error);
    }
}
