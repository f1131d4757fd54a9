//! Environment-backed configuration.
//!
//! Loaded once at startup. Provider credentials and the two target folder
//! ids are required; their absence is a `ConfigurationError` and the process
//! refuses to serve traffic.

use crate::AppError;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    database_url: String,
    database_max_connections: u32,
    server_host: String,
    server_port: u16,
    environment: String,

    staging_dir: PathBuf,

    drive_token: String,
    drive_api_base: Option<String>,
    video_folder_id: String,
    document_folder_id: String,
}

fn required(name: &str) -> Result<String, AppError> {
    std::env::var(name).map_err(|_| {
        AppError::Configuration(format!("Missing required environment variable: {}", name))
    })
}

fn optional(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        // A missing .env file is fine; real deployments use the environment.
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: optional("DATABASE_MAX_CONNECTIONS", "10")
                .parse()
                .map_err(|_| {
                    AppError::Configuration(
                        "DATABASE_MAX_CONNECTIONS must be a positive integer".to_string(),
                    )
                })?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "3000").parse().map_err(|_| {
                AppError::Configuration("SERVER_PORT must be a valid port number".to_string())
            })?,
            environment: optional("ENVIRONMENT", "development"),
            staging_dir: PathBuf::from(optional("STAGING_DIR", "tmp/staging")),
            drive_token: required("DRIVE_ACCESS_TOKEN")?,
            drive_api_base: std::env::var("DRIVE_API_BASE").ok(),
            video_folder_id: required("DRIVE_VIDEO_FOLDER_ID")?,
            document_folder_id: required("DRIVE_DOCUMENT_FOLDER_ID")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.drive_token.trim().is_empty() {
            return Err(AppError::Configuration(
                "DRIVE_ACCESS_TOKEN must not be empty".to_string(),
            ));
        }
        if self.video_folder_id.trim().is_empty() || self.document_folder_id.trim().is_empty() {
            return Err(AppError::Configuration(
                "Provider folder ids must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn database_max_connections(&self) -> u32 {
        self.database_max_connections
    }

    pub fn server_host(&self) -> &str {
        &self.server_host
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    pub fn staging_dir(&self) -> &PathBuf {
        &self.staging_dir
    }

    pub fn drive_token(&self) -> &str {
        &self.drive_token
    }

    /// Custom provider endpoint, used by tests and self-hosted gateways.
    pub fn drive_api_base(&self) -> Option<&str> {
        self.drive_api_base.as_deref()
    }

    pub fn video_folder_id(&self) -> &str {
        &self.video_folder_id
    }

    pub fn document_folder_id(&self) -> &str {
        &self.document_folder_id
    }
}
