pub mod health;
pub mod locations;
pub mod sites;
pub mod studies;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/participant-manager` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /locations                            list, create
/// /locations/{locationId}               get, update (rename / status flip)
///
/// /sites                                overview (GET), add site (POST)
/// /sites/{id}/decommission              status flip (PUT)
/// /sites/{id}/participants              registry (GET), add email (POST)
/// /sites/{id}/participants/invite       send invitations (POST)
/// /sites/{id}/participants/import       import CSV (POST, multipart)
/// /sites/{id}/participants/status       bulk onboarding override (PATCH)
/// /sites/{id}/participant               registry entry detail (GET, id = registry entry)
///
/// /studies/{studyId}/targetEnrollment   update enrollment target (PATCH)
///
/// /users                                create admin account (POST)
/// /users/{adminUserId}                  update admin account (PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Location registry.
        .nest("/locations", locations::router())
        // Sites overview and the per-site participant registry.
        .nest("/sites", sites::router())
        // Study-level enrollment target.
        .nest("/studies", studies::router())
        // Admin account management.
        .nest("/users", users::router())
}
