//! Caller identification extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use studygate_core::codes::ErrorCode;
use studygate_db::models::AdminUser;
use studygate_db::repositories::AdminUserRepo;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the numeric id of the admin making the request.
///
/// Authentication happens upstream; by the time a request reaches this
/// service the header value is a trusted admin id.
pub const USER_ID_HEADER: &str = "userId";

/// The admin user identified by the `userId` request header.
///
/// Use this as an extractor parameter in any handler that needs the caller:
///
/// ```ignore
/// async fn my_handler(Caller(admin): Caller) -> AppResult<MessageResponse> {
///     tracing::info!(admin_user_id = admin.id, "handling request");
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Caller(pub AdminUser);

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Refusal(ErrorCode::MissingRequiredArguments))?;

        let admin_user_id = raw
            .trim()
            .parse()
            .map_err(|_| AppError::Refusal(ErrorCode::InvalidArguments))?;

        let admin = AdminUserRepo::find_by_id(&state.pool, admin_user_id)
            .await?
            .ok_or(AppError::Refusal(ErrorCode::UserNotFound))?;

        Ok(Caller(admin))
    }
}
