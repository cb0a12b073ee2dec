//! Route definitions for the location registry.

use axum::routing::get;
use axum::Router;

use crate::handlers::locations;
use crate::state::AppState;

/// Location routes mounted at `/locations`.
///
/// ```text
/// GET  /                 -> get_locations (?excludeStudyId= for the new-site picker)
/// POST /                 -> add_location
/// GET  /{locationId}     -> get_location_by_id
/// PUT  /{locationId}     -> update_location (rename / decommission / reactivate)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(locations::get_locations).post(locations::add_location),
        )
        .route(
            "/{locationId}",
            get(locations::get_location_by_id).put(locations::update_location),
        )
}
