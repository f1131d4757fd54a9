//! HTTP error response conversion for `AppError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cursus_core::{AppError, LogLevel};
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling.
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse. Needed because of
/// the orphan rule: IntoResponse is axum's trait and AppError lives in
/// cursus-core.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

static PRODUCTION: OnceLock<bool> = OnceLock::new();

/// Record whether we run in production. Called once during startup wiring;
/// error responses consult this instead of the process environment.
pub fn set_production(production: bool) {
    let _ = PRODUCTION.set(production);
}

fn is_production() -> bool {
    *PRODUCTION.get().unwrap_or(&false)
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Request failed");
        }
    }
}

fn response_body(error: &AppError, production: bool) -> ErrorResponse {
    // The error category stays out of production responses; the message
    // itself already carries the client-facing text.
    let details = if production {
        None
    } else {
        Some(error.error_type().to_string())
    };

    ErrorResponse {
        error: error.client_message(),
        code: error.error_code().to_string(),
        details,
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = Json(response_body(app_error, is_production()));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_responses_omit_details() {
        let body = response_body(&AppError::Provider("upstream 503".into()), true);
        assert!(body.details.is_none());
        assert_eq!(body.code, "PROVIDER_ERROR");
    }

    #[test]
    fn details_add_to_the_error_text_rather_than_repeat_it() {
        let body = response_body(&AppError::InvalidInput("bad mime type".into()), false);
        assert_eq!(body.details.as_deref(), Some("ValidationError"));
        assert_ne!(body.details.as_deref(), Some(body.error.as_str()));
    }
}
