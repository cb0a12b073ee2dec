//! Handlers for the `/users` resource: admin account management.
//!
//! Only super admins may manage accounts. A non-super-admin account must be
//! created with something to do: either a location permission or at least
//! one app/study/site grant. Account emails are not sent inline; the
//! handlers enqueue an outbox task and the background scheduler delivers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use validator::Validate;

use studygate_core::codes::{ErrorCode, MessageCode};
use studygate_core::permissions::Permission;
use studygate_core::status::AdminStatus;
use studygate_core::token::generate_security_code;
use studygate_core::types::DbId;
use studygate_db::models::{
    AdminPermissionSet, AppPermissionEntry, EmailTaskKind, NewAdminUser, SitePermissionEntry,
    StudyPermissionEntry, UpdateAdminUser,
};
use studygate_db::repositories::{AdminUserRepo, EmailTaskRepo, PermissionRepo};
use studygate_events::{AuditEvent, AuditEventKind};

use crate::error::{classify_sqlx_error, AppError, AppResult};
use crate::middleware::caller::Caller;
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub super_admin: bool,
    #[serde(default)]
    pub location_permission: i16,
    #[serde(default)]
    pub permissions: PermissionGrants,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub phone: Option<String>,
    pub super_admin: bool,
    #[serde(default)]
    pub location_permission: i16,
    #[serde(default)]
    pub permissions: PermissionGrants,
}

/// Requested grants per scope. Site grants use `edit` on the wire like the
/// other two; it maps to the `can_edit` column.
#[derive(Debug, Default, Deserialize)]
pub struct PermissionGrants {
    #[serde(default)]
    pub apps: Vec<AppGrant>,
    #[serde(default)]
    pub studies: Vec<StudyGrant>,
    #[serde(default)]
    pub sites: Vec<SiteGrant>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppGrant {
    pub app_id: DbId,
    pub edit: i16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyGrant {
    pub app_id: DbId,
    pub study_id: DbId,
    pub edit: i16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteGrant {
    pub app_id: DbId,
    pub study_id: DbId,
    pub site_id: DbId,
    pub edit: i16,
}

fn permission_level(raw: i16) -> AppResult<Permission> {
    Permission::from_id(raw).ok_or(AppError::Refusal(ErrorCode::BadRequest))
}

/// Check every grant's level and collect them into insertable entries.
fn to_permission_set(grants: &PermissionGrants) -> AppResult<AdminPermissionSet> {
    let mut set = AdminPermissionSet::default();
    for grant in &grants.apps {
        permission_level(grant.edit)?;
        set.apps.push(AppPermissionEntry {
            app_id: grant.app_id,
            edit: grant.edit,
        });
    }
    for grant in &grants.studies {
        permission_level(grant.edit)?;
        set.studies.push(StudyPermissionEntry {
            app_id: grant.app_id,
            study_id: grant.study_id,
            edit: grant.edit,
        });
    }
    for grant in &grants.sites {
        permission_level(grant.edit)?;
        set.sites.push(SitePermissionEntry {
            app_id: grant.app_id,
            study_id: grant.study_id,
            site_id: grant.site_id,
            can_edit: grant.edit,
        });
    }
    Ok(set)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /users
///
/// Creates an admin account in `Invited` status with a fresh security code.
/// Super-admin targets get no permission rows; their flag grants everything.
pub async fn create_user(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<MessageResponse> {
    if !admin.super_admin {
        return Err(ErrorCode::NotSuperAdminAccess.into());
    }
    body.validate()
        .map_err(|_| AppError::Refusal(ErrorCode::BadRequest))?;
    let location = permission_level(body.location_permission)?;
    let set = to_permission_set(&body.permissions)?;

    if AdminUserRepo::find_by_email(&state.pool, &body.email)
        .await?
        .is_some()
    {
        return Err(ErrorCode::EmailExists.into());
    }

    if !body.super_admin && location == Permission::NoPermission && set.is_empty() {
        return Err(ErrorCode::PermissionMissing.into());
    }

    let user = AdminUserRepo::create(
        &state.pool,
        &NewAdminUser {
            email: body.email,
            first_name: body.first_name,
            last_name: body.last_name,
            phone: body.phone,
            location_permission: body.location_permission,
            super_admin: body.super_admin,
            status: AdminStatus::Invited.id(),
            security_code: generate_security_code(),
            security_code_expires_at: Utc::now()
                + Duration::days(state.config.security_code_expiry_days),
            created_by: admin.id,
        },
    )
    .await
    .map_err(classify_sqlx_error)?;

    if !body.super_admin {
        PermissionRepo::insert_app_batch(&state.pool, user.id, &set.apps, admin.id).await?;
        PermissionRepo::insert_study_batch(&state.pool, user.id, &set.studies, admin.id).await?;
        PermissionRepo::insert_site_batch(&state.pool, user.id, &set.sites, admin.id).await?;
    }

    EmailTaskRepo::enqueue(&state.pool, user.id, EmailTaskKind::AccountCreated).await?;

    state.recorder.record(
        AuditEvent::new(AuditEventKind::NewUserCreated)
            .by_user(admin.id)
            .describing(format!("Admin account {} created", user.id)),
    );
    tracing::info!(user_id = user.id, super_admin = user.super_admin, "Admin account created");

    Ok(MessageResponse::of(MessageCode::AddNewUserSuccess).with("userId", user.id))
}

/// PUT /users/{adminUserId}
///
/// Updates an admin account and replaces its grants. The permission rows
/// are always dropped first; a target that stays (or becomes) a regular
/// admin gets the supplied set re-inserted, a super admin gets none.
pub async fn update_user(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Path(user_id): Path<DbId>,
    Json(body): Json<UpdateUserRequest>,
) -> AppResult<MessageResponse> {
    if !admin.super_admin {
        return Err(ErrorCode::NotSuperAdminAccess.into());
    }
    body.validate()
        .map_err(|_| AppError::Refusal(ErrorCode::BadRequest))?;
    let location = permission_level(body.location_permission)?;
    let set = to_permission_set(&body.permissions)?;

    AdminUserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::UserNotFound))?;

    if !body.super_admin && location == Permission::NoPermission && set.is_empty() {
        return Err(ErrorCode::PermissionMissing.into());
    }

    let updated = AdminUserRepo::update(
        &state.pool,
        user_id,
        &UpdateAdminUser {
            first_name: Some(body.first_name),
            last_name: Some(body.last_name),
            phone: body.phone,
            super_admin: Some(body.super_admin),
            location_permission: Some(body.location_permission),
        },
    )
    .await
    .map_err(classify_sqlx_error)?
    .ok_or(AppError::Refusal(ErrorCode::UserNotFound))?;

    PermissionRepo::delete_all_for_admin(&state.pool, user_id).await?;
    if !body.super_admin {
        PermissionRepo::insert_app_batch(&state.pool, user_id, &set.apps, admin.id).await?;
        PermissionRepo::insert_study_batch(&state.pool, user_id, &set.studies, admin.id).await?;
        PermissionRepo::insert_site_batch(&state.pool, user_id, &set.sites, admin.id).await?;
    }

    EmailTaskRepo::enqueue(&state.pool, user_id, EmailTaskKind::AccountUpdated).await?;

    state.recorder.record(
        AuditEvent::new(AuditEventKind::UserRecordUpdated)
            .by_user(admin.id)
            .describing(format!("Admin account {} updated", updated.id)),
    );
    tracing::info!(user_id = updated.id, super_admin = updated.super_admin, "Admin account updated");

    Ok(MessageResponse::of(MessageCode::UpdateUserSuccess).with("userId", updated.id))
}
