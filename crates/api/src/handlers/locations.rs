//! Handlers for the `/locations` resource.
//!
//! Location access is gated by the per-admin `location_permission` column
//! rather than scope rows: any level may read, `ReadEdit` may create and
//! update, and super admins bypass the column entirely.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use studygate_core::codes::{ErrorCode, MessageCode};
use studygate_core::permissions::Permission;
use studygate_core::status::LocationStatus;
use studygate_core::types::DbId;
use studygate_db::models::{AdminUser, Location, LocationWithStudies, NewLocation, UpdateLocation};
use studygate_db::repositories::LocationRepo;
use studygate_events::{AuditEvent, AuditEventKind};

use crate::error::{classify_sqlx_error, AppError, AppResult};
use crate::middleware::caller::Caller;
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddLocationRequest {
    #[validate(length(min = 2, max = 50), custom(function = validate_custom_id))]
    pub custom_id: String,
    #[validate(length(min = 2, max = 255))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLocationRequest {
    #[validate(length(min = 2, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<i16>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationListQuery {
    pub exclude_study_id: Option<DbId>,
}

/// Wire shape of a location, with the studies attached via sites when the
/// listing includes them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetail {
    pub location_id: DbId,
    pub custom_id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: i16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studies_count: Option<usize>,
}

impl From<Location> for LocationDetail {
    fn from(row: Location) -> Self {
        Self {
            location_id: row.id,
            custom_id: row.custom_id,
            name: row.name,
            description: row.description,
            status: row.status,
            study_names: None,
            studies_count: None,
        }
    }
}

impl From<LocationWithStudies> for LocationDetail {
    fn from(row: LocationWithStudies) -> Self {
        let study_names: Vec<String> = row
            .study_names
            .map(|joined| {
                joined
                    .split(',')
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            location_id: row.id,
            custom_id: row.custom_id,
            name: row.name,
            description: row.description,
            status: row.status,
            studies_count: Some(study_names.len()),
            study_names: Some(study_names),
        }
    }
}

fn validate_custom_id(value: &str) -> Result<(), ValidationError> {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("custom_id"))
    }
}

/// Any location permission level is enough to read the registry.
fn location_view_allowed(admin: &AdminUser) -> AppResult<()> {
    if admin.super_admin {
        return Ok(());
    }
    if admin.location_access()? == Permission::NoPermission {
        return Err(ErrorCode::LocationAccessDenied.into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /locations
///
/// Registers a new physical location. Uniqueness of `customId` and `name`
/// is enforced by the schema and surfaced as registry refusals.
pub async fn add_location(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Json(body): Json<AddLocationRequest>,
) -> AppResult<MessageResponse> {
    body.validate()
        .map_err(|_| AppError::Refusal(ErrorCode::BadRequest))?;

    if !admin.super_admin && admin.location_access()? != Permission::ReadEdit {
        return Err(ErrorCode::LocationAccessDenied.into());
    }

    let location = LocationRepo::create(
        &state.pool,
        &NewLocation {
            custom_id: body.custom_id,
            name: body.name,
            description: body.description,
            created_by: admin.id,
        },
    )
    .await
    .map_err(classify_sqlx_error)?;

    state.recorder.record(
        AuditEvent::new(AuditEventKind::NewLocationAdded)
            .by_user(admin.id)
            .describing(format!("Location {} added", location.custom_id)),
    );
    tracing::info!(location_id = location.id, "Location created");

    Ok(MessageResponse::of(MessageCode::AddLocationSuccess).with("locationId", location.id))
}

/// PUT /locations/{locationId}
///
/// Renames, decommissions or reactivates a location. A `status` field makes
/// the request a status flip; otherwise it is a rename/describe edit. The
/// default location refuses every shape.
pub async fn update_location(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Path(location_id): Path<DbId>,
    Json(body): Json<UpdateLocationRequest>,
) -> AppResult<MessageResponse> {
    body.validate()
        .map_err(|_| AppError::Refusal(ErrorCode::BadRequest))?;
    let new_status = match body.status {
        Some(raw) => Some(
            LocationStatus::from_id(raw).ok_or(AppError::Refusal(ErrorCode::BadRequest))?,
        ),
        None => None,
    };

    if !admin.super_admin && admin.location_access()? != Permission::ReadEdit {
        return Err(ErrorCode::LocationUpdateDenied.into());
    }

    let location = LocationRepo::find_by_id(&state.pool, location_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::LocationNotFound))?;

    if location.is_default {
        return Err(ErrorCode::DefaultSiteModifyDenied.into());
    }

    let current = location.location_status()?;
    match new_status {
        Some(LocationStatus::Inactive) => {
            if current == LocationStatus::Inactive {
                return Err(ErrorCode::AlreadyDecommissioned.into());
            }
            if LocationRepo::active_site_count(&state.pool, location_id).await? > 0 {
                return Err(ErrorCode::CannotDecommission.into());
            }
        }
        Some(LocationStatus::Active) => {
            if current == LocationStatus::Active {
                return Err(ErrorCode::CannotReactivate.into());
            }
        }
        None => {}
    }

    let updated = LocationRepo::update(
        &state.pool,
        location_id,
        &UpdateLocation {
            name: body.name,
            description: body.description,
            status: body.status,
        },
    )
    .await
    .map_err(classify_sqlx_error)?
    .ok_or(AppError::Refusal(ErrorCode::LocationNotFound))?;

    let (kind, message) = match new_status {
        Some(LocationStatus::Inactive) => (
            AuditEventKind::LocationDecommissioned,
            MessageCode::DecommissionSuccess,
        ),
        Some(LocationStatus::Active) => (
            AuditEventKind::LocationActivated,
            MessageCode::ReactivateSuccess,
        ),
        None => (
            AuditEventKind::LocationEdited,
            MessageCode::LocationUpdateSuccess,
        ),
    };

    state.recorder.record(
        AuditEvent::new(kind)
            .by_user(admin.id)
            .describing(format!("Location {} updated", updated.custom_id)),
    );
    tracing::info!(location_id = updated.id, status = updated.status, "Location updated");

    Ok(MessageResponse::of(message)
        .with("locationId", updated.id)
        .with("status", updated.status))
}

/// GET /locations
///
/// Without query parameters: the full registry, each row with the names of
/// studies holding a site there. With `excludeStudyId`: active locations
/// still free for a new site of that study.
pub async fn get_locations(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Query(query): Query<LocationListQuery>,
) -> AppResult<MessageResponse> {
    location_view_allowed(&admin)?;

    if let Some(study_id) = query.exclude_study_id {
        let details: Vec<LocationDetail> =
            LocationRepo::list_for_new_site(&state.pool, study_id)
                .await?
                .into_iter()
                .map(LocationDetail::from)
                .collect();
        return Ok(
            MessageResponse::of(MessageCode::GetLocationForSiteSuccess).with("locations", details)
        );
    }

    let details: Vec<LocationDetail> = LocationRepo::list_with_studies(&state.pool)
        .await?
        .into_iter()
        .map(LocationDetail::from)
        .collect();
    Ok(MessageResponse::of(MessageCode::GetLocationSuccess).with("locations", details))
}

/// GET /locations/{locationId}
pub async fn get_location_by_id(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Path(location_id): Path<DbId>,
) -> AppResult<MessageResponse> {
    location_view_allowed(&admin)?;

    let row = LocationRepo::find_with_studies(&state.pool, location_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::LocationNotFound))?;

    Ok(MessageResponse::of(MessageCode::GetLocationSuccess)
        .with("location", LocationDetail::from(row)))
}
