//! Handlers for the `/sites` resource and the per-study enrollment target.
//!
//! Site maintenance is governed by the paired study/app permission rows: when
//! an admin holds both, either row may grant edit; when either row is missing
//! the configured policy decides. Super admins skip that check everywhere
//! except the status flip, which requires a site-permission row for anyone.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use studygate_core::codes::{ErrorCode, MessageCode};
use studygate_core::enrollment::enrollment_percentage;
use studygate_core::permissions::{
    edit_permission_allowed, plan_decommission_downgrade, seed_site_permissions, Permission,
    PermissionHolder,
};
use studygate_core::status::{LocationStatus, SiteStatus, StudyType};
use studygate_core::types::DbId;
use studygate_db::models::{AdminUser, NewSite, SiteOverview};
use studygate_db::repositories::{
    LocationRepo, ParticipantRepo, PermissionRepo, SiteRepo, StudyRepo,
};
use studygate_events::{AuditEvent, AuditEventKind};

use crate::error::{classify_sqlx_error, AppError, AppResult};
use crate::middleware::caller::Caller;
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSiteRequest {
    pub study_id: DbId,
    pub location_id: DbId,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTargetEnrollmentRequest {
    #[validate(range(min = 1))]
    pub target_enrollment: i32,
}

/// One site inside the sites overview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub site_id: DbId,
    pub name: String,
    pub status: i16,
    pub invited: i64,
    pub enrolled: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_percentage: Option<f64>,
    pub edit: i16,
}

/// One study inside the sites overview, carrying its sites and the counts
/// summed over them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySummary {
    pub study_id: DbId,
    pub custom_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub study_type: String,
    pub app_id: DbId,
    pub sites_count: usize,
    pub invited: i64,
    pub enrolled: i64,
    pub sites: Vec<SiteSummary>,
}

/// Decide whether the admin may maintain sites of the study.
///
/// Looks up the study permission row and, when present, the app permission
/// row it points at, then applies [`edit_permission_allowed`]. Super admins
/// pass unconditionally.
async fn site_edit_allowed(
    state: &AppState,
    admin: &AdminUser,
    study_id: DbId,
) -> AppResult<bool> {
    if admin.super_admin {
        return Ok(true);
    }
    let study_perm = PermissionRepo::find_study(&state.pool, admin.id, study_id).await?;
    let app_perm = match &study_perm {
        Some(row) => PermissionRepo::find_app(&state.pool, admin.id, row.app_id).await?,
        None => None,
    };
    let study_edit = study_perm.as_ref().map(|row| row.level()).transpose()?;
    let app_edit = app_perm.as_ref().map(|row| row.level()).transpose()?;
    Ok(edit_permission_allowed(
        study_edit,
        app_edit,
        state.config.permission_policy(),
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /sites
///
/// Adds a site for a close study at a location, then copies every study
/// permission holder onto the new site with the creating admin raised to
/// edit. Open studies enroll everywhere and never get explicit sites.
pub async fn add_site(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Json(body): Json<AddSiteRequest>,
) -> AppResult<MessageResponse> {
    if !site_edit_allowed(&state, &admin, body.study_id).await? {
        return Err(ErrorCode::SitePermissionAccessDenied.into());
    }

    if SiteRepo::find_by_study_and_location(&state.pool, body.study_id, body.location_id)
        .await?
        .is_some()
    {
        return Err(ErrorCode::SiteExists.into());
    }

    let study = StudyRepo::find_by_id(&state.pool, body.study_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::StudyNotFound))?;
    if study.kind()? == StudyType::Open {
        return Err(ErrorCode::CannotAddSiteForOpenStudy.into());
    }

    let location = LocationRepo::find_by_id(&state.pool, body.location_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::LocationNotFound))?;
    if location.location_status()? == LocationStatus::Inactive {
        return Err(ErrorCode::CannotAddSiteForDecommissionedLocation.into());
    }

    let site = SiteRepo::create(
        &state.pool,
        &NewSite {
            study_id: body.study_id,
            location_id: body.location_id,
            created_by: admin.id,
        },
    )
    .await
    .map_err(classify_sqlx_error)?;

    let mut holders = Vec::new();
    for row in PermissionRepo::study_holders(&state.pool, study.id).await? {
        holders.push(PermissionHolder {
            admin_user_id: row.admin_user_id,
            edit: row.level()?,
        });
    }
    let seeds = seed_site_permissions(&holders, admin.id);
    PermissionRepo::seed_site(&state.pool, study.app_id, study.id, site.id, &seeds, admin.id)
        .await?;

    state.recorder.record(
        AuditEvent::new(AuditEventKind::SiteAddedForStudy)
            .by_user(admin.id)
            .with_study(study.id)
            .with_site(site.id)
            .describing(format!(
                "Site {} added for study {}",
                site.id, study.custom_study_id
            )),
    );
    tracing::info!(site_id = site.id, study_id = study.id, "Site created");

    Ok(MessageResponse::of(MessageCode::AddSiteSuccess).with("siteId", site.id))
}

/// PUT /sites/{siteId}/decommission
///
/// Flips the site status. An active site is decommissioned: holders who also
/// hold a study permission keep read-view on the site, the rest lose their
/// row, and every yet-to-join registry entry is disabled. A decommissioned
/// site is simply brought back.
///
/// The caller must hold a site-permission row; a super admin without one is
/// refused like anyone else.
pub async fn toggle_site_status(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Path(site_id): Path<DbId>,
) -> AppResult<MessageResponse> {
    let perm = PermissionRepo::find_site(&state.pool, admin.id, site_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::SiteNotFound))?;

    let study = StudyRepo::find_by_id(&state.pool, perm.study_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::StudyNotFound))?;
    if study.kind()? == StudyType::Open {
        return Err(ErrorCode::CannotDecommissionSiteForOpenStudy.into());
    }

    if !site_edit_allowed(&state, &admin, study.id).await? {
        return Err(ErrorCode::SitePermissionAccessDenied.into());
    }

    // Checked before the flip direction, so a study with enrolled or active
    // participants refuses reactivation too.
    if ParticipantRepo::enrolled_or_active_count(&state.pool, study.id).await? > 0 {
        return Err(ErrorCode::CannotDecommissionSiteForEnrolledActiveStatus.into());
    }

    let site = SiteRepo::find_by_id(&state.pool, site_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::SiteNotFound))?;

    match site.site_status()? {
        SiteStatus::Deactive => {
            SiteRepo::update_status(&state.pool, site_id, SiteStatus::Active.id()).await?;

            state.recorder.record(
                AuditEvent::new(AuditEventKind::SiteActivatedForStudy)
                    .by_user(admin.id)
                    .with_study(study.id)
                    .with_site(site_id)
                    .describing(format!(
                        "Site {} activated for study {}",
                        site_id, study.custom_study_id
                    )),
            );
            tracing::info!(site_id, "Site recommissioned");

            Ok(MessageResponse::of(MessageCode::RecommissionSiteSuccess)
                .with("siteId", site_id)
                .with("status", "Active"))
        }
        SiteStatus::Active => {
            SiteRepo::update_status(&state.pool, site_id, SiteStatus::Deactive.id()).await?;

            let site_admins = PermissionRepo::site_holder_ids(&state.pool, site_id).await?;
            let study_admins = PermissionRepo::study_holder_ids(&state.pool, study.id).await?;
            let plan = plan_decommission_downgrade(&site_admins, &study_admins);
            PermissionRepo::downgrade_site_holders(&state.pool, site_id, &plan.downgrade_to_view)
                .await?;
            PermissionRepo::revoke_site_holders(&state.pool, site_id, &plan.revoke).await?;

            let disabled = ParticipantRepo::disable_yet_to_join(&state.pool, site_id).await?;

            state.recorder.record(
                AuditEvent::new(AuditEventKind::SiteDecommissionedForStudy)
                    .by_user(admin.id)
                    .with_study(study.id)
                    .with_site(site_id)
                    .describing(format!(
                        "Site {} decommissioned for study {}",
                        site_id, study.custom_study_id
                    )),
            );
            tracing::info!(site_id, disabled, "Site decommissioned");

            Ok(MessageResponse::of(MessageCode::DecommissionSiteSuccess)
                .with("siteId", site_id)
                .with("status", "Deactive"))
        }
    }
}

/// GET /sites
///
/// The sites overview, grouped by study. Super admins see every site with
/// edit access; everyone else sees the sites they hold a permission row on,
/// and holding none is a refusal rather than an empty list.
pub async fn get_sites(
    State(state): State<AppState>,
    Caller(admin): Caller,
) -> AppResult<MessageResponse> {
    let overviews = if admin.super_admin {
        SiteRepo::all_overviews(&state.pool).await?
    } else {
        SiteRepo::overviews_for_admin(&state.pool, admin.id).await?
    };
    if overviews.is_empty() && !admin.super_admin {
        return Err(ErrorCode::SiteNotFound.into());
    }

    let site_ids: Vec<DbId> = overviews.iter().map(|row| row.site_id).collect();
    let invited: HashMap<DbId, i64> = SiteRepo::invited_counts(&state.pool, &site_ids)
        .await?
        .into_iter()
        .map(|row| (row.site_id, row.count))
        .collect();
    let enrolled: HashMap<DbId, i64> = SiteRepo::enrolled_counts(&state.pool, &site_ids)
        .await?
        .into_iter()
        .map(|row| (row.site_id, row.count))
        .collect();

    let mut studies: Vec<StudySummary> = Vec::new();
    for row in overviews {
        let site = site_summary(&row, &invited, &enrolled)?;
        // Overview rows come back ordered by study, so grouping only needs
        // to look at the last entry.
        match studies.last_mut() {
            Some(study) if study.study_id == row.study_id => {
                study.sites_count += 1;
                study.invited += site.invited;
                study.enrolled += site.enrolled;
                study.sites.push(site);
            }
            _ => studies.push(StudySummary {
                study_id: row.study_id,
                custom_id: row.custom_study_id,
                name: row.study_name,
                study_type: row.study_type,
                app_id: row.app_id,
                sites_count: 1,
                invited: site.invited,
                enrolled: site.enrolled,
                sites: vec![site],
            }),
        }
    }

    Ok(MessageResponse::of(MessageCode::GetSitesSuccess).with("studies", studies))
}

fn site_summary(
    row: &SiteOverview,
    invited: &HashMap<DbId, i64>,
    enrolled: &HashMap<DbId, i64>,
) -> AppResult<SiteSummary> {
    let kind = row.kind()?;
    let invited_count = invited.get(&row.site_id).copied().unwrap_or(0);
    let enrolled_count = enrolled.get(&row.site_id).copied().unwrap_or(0);
    let target = row.target_enrollment.map(i64::from);

    // Open studies enroll against the target rather than sent invitations.
    let shown_invited = match kind {
        StudyType::Open => target.unwrap_or(0),
        StudyType::Close => invited_count,
    };

    Ok(SiteSummary {
        site_id: row.site_id,
        name: row.location_name.clone(),
        status: row.status,
        invited: shown_invited,
        enrolled: enrolled_count,
        enrollment_percentage: enrollment_percentage(kind, target, invited_count, enrolled_count),
        edit: row.can_edit,
    })
}

/// PATCH /studies/{studyId}/targetEnrollment
///
/// Updates the enrollment target of an open study. The target lives on the
/// study's single site, so the study must have one and it must be active.
pub async fn update_target_enrollment(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Path(study_id): Path<DbId>,
    Json(body): Json<UpdateTargetEnrollmentRequest>,
) -> AppResult<MessageResponse> {
    body.validate()
        .map_err(|_| AppError::Refusal(ErrorCode::BadRequest))?;

    if !admin.super_admin {
        let level = match PermissionRepo::find_study(&state.pool, admin.id, study_id).await? {
            Some(row) => row.level()?,
            None => Permission::NoPermission,
        };
        if level != Permission::ReadEdit {
            return Err(ErrorCode::StudyPermissionAccessDenied.into());
        }
    }

    let study = StudyRepo::find_by_id(&state.pool, study_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::StudyNotFound))?;
    if study.kind()? == StudyType::Close {
        return Err(ErrorCode::CannotUpdateEnrollmentTargetForCloseStudy.into());
    }

    let site = SiteRepo::first_for_study(&state.pool, study_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::SiteNotFound))?;
    if site.site_status()? == SiteStatus::Deactive {
        return Err(ErrorCode::CannotUpdateEnrollmentTargetForDecommissionedSite.into());
    }

    SiteRepo::update_target_enrollment(&state.pool, site.id, body.target_enrollment).await?;

    state.recorder.record(
        AuditEvent::new(AuditEventKind::EnrollmentTargetUpdated)
            .by_user(admin.id)
            .with_study(study_id)
            .with_site(site.id)
            .describing(format!(
                "Enrollment target for study {} set to {}",
                study.custom_study_id, body.target_enrollment
            )),
    );
    tracing::info!(
        study_id,
        site_id = site.id,
        target = body.target_enrollment,
        "Enrollment target updated"
    );

    Ok(MessageResponse::of(MessageCode::TargetEnrollmentUpdateSuccess)
        .with("siteId", site.id)
        .with("targetEnrollment", body.target_enrollment))
}
