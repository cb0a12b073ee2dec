//! Route definitions for study-level operations.

use axum::routing::patch;
use axum::Router;

use crate::handlers::sites;
use crate::state::AppState;

/// Study routes mounted at `/studies`.
///
/// ```text
/// PATCH /{studyId}/targetEnrollment  -> update_target_enrollment
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{studyId}/targetEnrollment",
        patch(sites::update_target_enrollment),
    )
}
