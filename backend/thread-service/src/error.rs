/// Error types for Thread Service
///
/// Errors are converted to JSON HTTP responses for API clients.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for thread-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Where callers are sent when they have not completed onboarding
pub const ONBOARDING_PATH: &str = "/onboarding";

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Caller is authenticated but has no onboarded profile yet
    #[error("Onboarding required")]
    OnboardingRequired,

    #[error("Internal error: {0}")]
    Internal(String),

    /// Failure raised by a write or detail read, with operation context attached
    #[error("{context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    pub fn persistence(context: impl Into<String>, source: AppError) -> Self {
        AppError::Persistence {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, skipping any `Persistence` wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Persistence { source, .. } => source.root(),
            other => other,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::CacheError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::OnboardingRequired => StatusCode::FORBIDDEN,
            AppError::Persistence { source, .. } => source.status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        if matches!(self.root(), AppError::OnboardingRequired) {
            return HttpResponse::build(status).json(serde_json::json!({
                "error": error_msg,
                "status": status.as_u16(),
                "redirect": ONBOARDING_PATH,
            }));
        }

        HttpResponse::build(status).json(serde_json::json!({
            "error": error_msg,
            "status": status.as_u16(),
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".to_string()),
            other => AppError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
