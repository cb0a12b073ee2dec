//! Route definitions for admin account management.

use axum::routing::{post, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// User routes mounted at `/users`.
///
/// ```text
/// POST /                 -> create_user (super admin only)
/// PUT  /{adminUserId}    -> update_user (super admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(users::create_user))
        .route("/{adminUserId}", put(users::update_user))
}
