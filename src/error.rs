use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::response::ErrorBody;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Session refers to a user that no longer exists")]
    StaleSession,

    #[error("Administrator privileges required")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Body the JSON extractor could not accept; keeps the extractor's status.
    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error("Failed to create order")]
    OrderCreationFailed(#[source] DbErr),

    #[error("Internal Server Error")]
    OrmError(#[from] DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::StaleSession | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidBody { status, .. } => *status,
            AppError::OrderCreationFailed(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

// Ids are UUIDs; anything else cannot name a stored row.
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "unparseable path");
        AppError::not_found("Not Found")
    }
}

/// True when the store rejected a write because of a unique index.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Causes stay in the log; clients only see the display message.
        match &self {
            AppError::OrderCreationFailed(cause) => {
                tracing::error!(error = %cause, "order creation rolled back");
            }
            AppError::OrmError(cause) => tracing::error!(error = %cause, "database error"),
            AppError::Internal(cause) => tracing::error!(error = %cause, "internal error"),
            _ => {}
        }

        (status, axum::Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_taxonomy() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::StaleSession.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::not_found("Product not found").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("taken".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::validation("bad price").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::OrderCreationFailed(DbErr::Custom("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn body_rejections_keep_the_extractor_status() {
        let err = AppError::InvalidBody {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message: "Expected request with `Content-Type: application/json`".into(),
        };
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(err.to_string().contains("Content-Type"));
    }

    #[test]
    fn internal_failures_do_not_leak_their_cause() {
        let err = AppError::OrmError(DbErr::Custom("relation \"users\" is broken".into()));
        assert_eq!(err.to_string(), "Internal Server Error");

        let err = AppError::OrderCreationFailed(DbErr::Custom("fk violation".into()));
        assert_eq!(err.to_string(), "Failed to create order");
    }
}
