/// Error types for library-service
///
/// Every request-terminating outcome of the delivery engine is a variant
/// here. The engine only ever returns these as typed values; the mapping to
/// HTTP status codes lives in the `ResponseError` impl and nowhere else.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;

/// Result type for library-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Neither carrier supplied a token
    #[error("Authentication required")]
    Unauthenticated,

    /// A token was supplied but failed signature, expiry or claim checks
    #[error("Invalid authentication token: {0}")]
    InvalidToken(String),

    /// No video record with this id
    #[error("Video not found")]
    AssetNotFound,

    /// The record exists but its bytes are gone from the media root
    #[error("Video file not found on storage")]
    AssetFileMissing,

    /// Policy denial
    #[error("{0}")]
    Forbidden(String),

    /// Video is still being processed
    #[error("Video is still processing. Please wait.")]
    NotReady,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    /// Backing-store I/O failed before any byte was sent
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn kind(&self) -> (&'static str, &'static str) {
        match self {
            AppError::Unauthenticated => ("authentication_error", "AUTHENTICATION_REQUIRED"),
            AppError::InvalidToken(_) => ("authentication_error", "INVALID_TOKEN"),
            AppError::AssetNotFound => ("not_found_error", "VIDEO_NOT_FOUND"),
            AppError::AssetFileMissing => ("not_found_error", "VIDEO_FILE_MISSING"),
            AppError::Forbidden(_) => ("authorization_error", "ACCESS_DENIED"),
            AppError::NotReady => ("processing", "VIDEO_PROCESSING"),
            AppError::BadRequest(_) => ("validation_error", "INVALID_REQUEST"),
            AppError::Database(_) => ("server_error", "DATABASE_ERROR"),
            AppError::Storage(_) => ("server_error", "STORAGE_ERROR"),
            AppError::Internal(_) => ("server_error", "INTERNAL_SERVER_ERROR"),
        }
    }
}

/// JSON body attached to every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::AssetNotFound => StatusCode::NOT_FOUND,
            AppError::AssetFileMissing => StatusCode::GONE,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotReady => StatusCode::ACCEPTED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (error_type, code) = self.kind();

        // Infrastructure details stay in the logs
        let message = match self {
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message,
            status: status.as_u16(),
            error_type: error_type.to_string(),
            code: code.to_string(),
        })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_documented_status_codes() {
        let cases = [
            (AppError::Unauthenticated, 401),
            (AppError::InvalidToken("expired".into()), 401),
            (AppError::Forbidden("no".into()), 403),
            (AppError::AssetNotFound, 404),
            (AppError::AssetFileMissing, 410),
            (AppError::NotReady, 202),
            (AppError::BadRequest("bad id".into()), 400),
            (AppError::Storage("EIO".into()), 500),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code().as_u16(), expected, "{err:?}");
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let resp = AppError::Database("password=hunter2".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
