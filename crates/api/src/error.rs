use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use studygate_core::codes::ErrorCode;
use studygate_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Refusals carry an [`ErrorCode`] from the shared registry, which fixes the
/// HTTP status, wire code and description. Domain and database errors are
/// logged and rendered as the generic internal-error envelope so details
/// never leak to clients.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A refusal from the shared error-code registry.
    #[error("{}", .0.info().description)]
    Refusal(ErrorCode),

    /// A domain-level error from `studygate_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<ErrorCode> for AppError {
    fn from(code: ErrorCode) -> Self {
        AppError::Refusal(code)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = match self {
            AppError::Refusal(code) => code,
            AppError::Core(err) => {
                tracing::error!(error = %err, "Domain error while handling request");
                ErrorCode::ApplicationError
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error while handling request");
                ErrorCode::ApplicationError
            }
        };

        let info = code.info();
        let status =
            StatusCode::from_u16(info.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = json!({
            "status": info.status,
            "error_type": info.error_type,
            "error_code": info.code,
            "error_description": info.description,
            "timestamp": chrono::Utc::now().timestamp_millis(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a sqlx error onto the refusal registry where a unique constraint
/// identifies the conflict, keeping everything else a plain database error.
///
/// PostgreSQL reports unique violations as error code `23505` with the
/// violated constraint name attached. The schema names its unique
/// constraints `uq_*`, so the conflicting entity can be recovered without
/// string-matching error messages.
pub fn classify_sqlx_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            match db_err.constraint() {
                Some("uq_sites_study_location") => {
                    return AppError::Refusal(ErrorCode::SiteExists)
                }
                Some("uq_participant_registry_study_email") => {
                    return AppError::Refusal(ErrorCode::EmailExists)
                }
                Some("uq_locations_custom_id") => {
                    return AppError::Refusal(ErrorCode::CustomIdExists)
                }
                Some("uq_locations_name") => {
                    return AppError::Refusal(ErrorCode::LocationNameExists)
                }
                Some("uq_admin_users_email") => {
                    return AppError::Refusal(ErrorCode::EmailExists)
                }
                _ => {}
            }
        }
    }
    AppError::Database(err)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn error_code_converts_to_refusal() {
        let err = AppError::from(ErrorCode::SiteNotFound);
        assert_matches!(err, AppError::Refusal(ErrorCode::SiteNotFound));
    }

    #[test]
    fn row_not_found_stays_a_database_error() {
        let err = classify_sqlx_error(sqlx::Error::RowNotFound);
        assert_matches!(err, AppError::Database(sqlx::Error::RowNotFound));
    }
}
