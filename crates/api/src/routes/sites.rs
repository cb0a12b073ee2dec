//! Route definitions for sites and their participant registries.
//!
//! Every path parameter at the first segment is named `{id}` because the
//! router requires one name per position. On the `/participant` detail
//! route it is a participant registry id, everywhere else a site id.

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::handlers::{participants, sites};
use crate::state::AppState;

/// Site routes mounted at `/sites`.
///
/// ```text
/// GET   /                           -> get_sites (overview, grouped by study)
/// POST  /                           -> add_site
/// PUT   /{id}/decommission          -> toggle_site_status
/// GET   /{id}/participants          -> get_participants (?onboardingStatus=)
/// POST  /{id}/participants          -> add_new_participant
/// POST  /{id}/participants/invite   -> invite_participants
/// POST  /{id}/participants/import   -> import_participants (multipart `file`)
/// PATCH /{id}/participants/status   -> update_onboarding_status
/// GET   /{id}/participant           -> get_participant_details (id = registry entry)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sites::get_sites).post(sites::add_site))
        .route("/{id}/decommission", put(sites::toggle_site_status))
        .route(
            "/{id}/participants",
            get(participants::get_participants).post(participants::add_new_participant),
        )
        .route(
            "/{id}/participants/invite",
            post(participants::invite_participants),
        )
        .route(
            "/{id}/participants/import",
            post(participants::import_participants),
        )
        .route(
            "/{id}/participants/status",
            patch(participants::update_onboarding_status),
        )
        .route("/{id}/participant", get(participants::get_participant_details))
}
