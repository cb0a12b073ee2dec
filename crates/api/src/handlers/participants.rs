//! Handlers for the participant registry under `/sites/{siteId}`.
//!
//! Every write path here is fail-closed: the caller must hold a
//! site-permission row at edit level, and super admins get no shortcut.
//! Site scoping is enforced in the queries themselves, so an id smuggled in
//! from another site is ignored rather than refused.

use std::collections::{HashMap, HashSet};

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use studygate_core::codes::{ErrorCode, MessageCode};
use studygate_core::enrollment::{EnrollmentStatus, NOT_APPLICABLE, YET_TO_ENROLL};
use studygate_core::error::CoreError;
use studygate_core::import::{parse_email_sheet, ImportError};
use studygate_core::onboarding::{
    count_by_status, OnboardingCounts, OnboardingFilter, OnboardingStatus,
};
use studygate_core::permissions::Permission;
use studygate_core::status::{SiteStatus, StudyType};
use studygate_core::templates::render_template;
use studygate_core::token::generate_enrollment_token;
use studygate_core::types::{DbId, Timestamp};
use studygate_db::models::{NewParticipant, ParticipantStudy, SiteContext};
use studygate_db::repositories::{ParticipantRepo, PermissionRepo, SiteRepo};
use studygate_events::{AuditEvent, AuditEventKind, EmailMessage, EmailOutcome};

use crate::error::{classify_sqlx_error, AppError, AppResult};
use crate::middleware::caller::Caller;
use crate::response::MessageResponse;
use crate::state::AppState;

/// Wire format for enrollment dates, with `-` standing in for absent ones.
const ENROLLMENT_DATE_FORMAT: &str = "%m/%d/%Y";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct AddParticipantRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InviteParticipantsRequest {
    #[validate(length(min = 1))]
    pub ids: Vec<DbId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOnboardingStatusRequest {
    #[validate(length(min = 1))]
    pub ids: Vec<DbId>,
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantListQuery {
    pub onboarding_status: Option<String>,
}

/// One registry row in the participants listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRow {
    pub id: DbId,
    pub email: String,
    pub onboarding_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_date: Option<Timestamp>,
    pub invitation_count: i64,
    pub enrollment_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_date: Option<Timestamp>,
}

/// The registry of one site: the site header, the status histogram and the
/// participant rows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRegistryDetail {
    pub site_id: DbId,
    pub site_status: i16,
    pub location_name: String,
    pub study_id: DbId,
    pub custom_study_id: String,
    pub study_name: String,
    pub study_type: String,
    pub app_id: DbId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_enrollment: Option<i32>,
    pub count_by_status: OnboardingCounts,
    pub registry_participants: Vec<ParticipantRow>,
}

/// One row of a participant's enrollment history. Dates render as strings
/// so a missing one can show as `-`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRecord {
    pub enrollment_status: String,
    pub enrollment_date: String,
    pub withdrawal_date: String,
}

/// A single registry entry with its surroundings and enrollment history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDetails {
    pub id: DbId,
    pub email: String,
    pub onboarding_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_date: Option<Timestamp>,
    pub invitation_count: i64,
    pub site_id: DbId,
    pub location_name: String,
    pub study_id: DbId,
    pub custom_study_id: String,
    pub study_name: String,
    pub app_id: DbId,
    pub app_name: String,
    pub enrollments: Vec<EnrollmentRecord>,
}

fn format_enrollment_date(date: Option<Timestamp>) -> String {
    date.map(|d| d.format(ENROLLMENT_DATE_FORMAT).to_string())
        .unwrap_or_else(|| NOT_APPLICABLE.to_string())
}

/// Load the site with its study and location, refusing when it does not
/// exist or is decommissioned.
async fn active_site_context(state: &AppState, site_id: DbId) -> AppResult<SiteContext> {
    let context = SiteRepo::find_context(&state.pool, site_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::SiteNotExistOrInactive))?;
    if context.site_status()? != SiteStatus::Active {
        return Err(ErrorCode::SiteNotExistOrInactive.into());
    }
    Ok(context)
}

/// Registry writes require an edit-level site permission row. There is no
/// super-admin shortcut and no policy fallback on this path.
async fn manage_site_allowed(state: &AppState, admin_id: DbId, site_id: DbId) -> AppResult<()> {
    let perm = PermissionRepo::find_site(&state.pool, admin_id, site_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::ManageSitePermissionAccessDenied))?;
    if perm.level()? != Permission::ReadEdit {
        return Err(ErrorCode::ManageSitePermissionAccessDenied.into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /sites/{siteId}/participants
///
/// Registers one email in the site's registry. Emails are unique per study
/// whatever their onboarding status; re-adding one whose participant already
/// enrolled is its own refusal.
pub async fn add_new_participant(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Path(site_id): Path<DbId>,
    Json(body): Json<AddParticipantRequest>,
) -> AppResult<MessageResponse> {
    body.validate()
        .map_err(|_| AppError::Refusal(ErrorCode::BadRequest))?;

    let context = active_site_context(&state, site_id).await?;
    manage_site_allowed(&state, admin.id, site_id).await?;
    if context.kind()? == StudyType::Open {
        return Err(ErrorCode::OpenStudy.into());
    }

    if let Some(existing) =
        ParticipantRepo::find_by_study_and_email(&state.pool, context.study_id, &body.email).await?
    {
        for enrollment in
            ParticipantRepo::enrollments_for_registry(&state.pool, existing.id).await?
        {
            if enrollment.enrollment()? == EnrollmentStatus::Enrolled {
                return Err(ErrorCode::EnrolledParticipant.into());
            }
        }
        state.recorder.record(
            AuditEvent::new(AuditEventKind::ParticipantEmailAddFailure)
                .by_user(admin.id)
                .with_site(site_id)
                .with_participant(existing.id)
                .describing(format!(
                    "Duplicate email refused for study {}",
                    context.custom_study_id
                )),
        );
        return Err(ErrorCode::EmailExists.into());
    }

    let participant = ParticipantRepo::create(
        &state.pool,
        &NewParticipant {
            study_id: context.study_id,
            site_id,
            email: body.email,
            created_by: admin.id,
        },
    )
    .await
    .map_err(classify_sqlx_error)?;

    state.recorder.record(
        AuditEvent::new(AuditEventKind::ParticipantEmailAddSuccess)
            .by_user(admin.id)
            .with_site(site_id)
            .with_participant(participant.id)
            .describing(format!(
                "Participant email added for study {}",
                context.custom_study_id
            )),
    );
    tracing::info!(participant_id = participant.id, site_id, "Participant added");

    Ok(MessageResponse::of(MessageCode::AddParticipantSuccess)
        .with("participantId", participant.id))
}

/// POST /sites/{siteId}/participants/invite
///
/// Sends invitation emails to the requested registry entries. A row is
/// eligible when it belongs to this site and sits in `New` or `Invited`;
/// everything else the caller asked for lands in the failed list. The email
/// goes out first and the row is only updated once the relay accepts it, so
/// a failed send leaves no half-invited state.
pub async fn invite_participants(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Path(site_id): Path<DbId>,
    Json(body): Json<InviteParticipantsRequest>,
) -> AppResult<MessageResponse> {
    body.validate()
        .map_err(|_| AppError::Refusal(ErrorCode::BadRequest))?;

    let context = active_site_context(&state, site_id).await?;
    manage_site_allowed(&state, admin.id, site_id).await?;

    let rows = ParticipantRepo::find_by_ids(&state.pool, &body.ids).await?;
    let looked_up: Vec<DbId> = rows.iter().map(|row| row.id).collect();
    let mut invited: Vec<DbId> = Vec::new();

    for row in &rows {
        if row.site_id != site_id {
            continue;
        }
        if !matches!(
            row.onboarding()?,
            OnboardingStatus::New | OnboardingStatus::Invited
        ) {
            continue;
        }

        let token = generate_enrollment_token();
        let args = [
            ("study name", context.study_name.as_str()),
            ("org name", state.config.org_name.as_str()),
            ("enrolment token", token.as_str()),
            ("contact email address", state.config.contact_email.as_str()),
        ];
        let message = EmailMessage {
            to: row.email.clone(),
            subject: render_template(&state.config.invite_subject, &args),
            body: render_template(&state.config.invite_body, &args),
        };

        match state.mailer.send(&message).await {
            EmailOutcome::Accepted => {
                let expires_at =
                    Utc::now() + Duration::hours(state.config.enrollment_token_expiry_hours);
                ParticipantRepo::record_invitation(&state.pool, row.id, &token, expires_at)
                    .await?;
                state.recorder.record(
                    AuditEvent::new(AuditEventKind::InvitationEmailSent)
                        .by_user(admin.id)
                        .with_site(site_id)
                        .with_participant(row.id)
                        .describing(format!("Invitation sent for participant {}", row.id)),
                );
                invited.push(row.id);
            }
            EmailOutcome::Failed { reason } => {
                tracing::warn!(participant_id = row.id, %reason, "Invitation email failed");
                state.recorder.record(
                    AuditEvent::new(AuditEventKind::InvitationEmailFailed)
                        .by_user(admin.id)
                        .with_site(site_id)
                        .with_participant(row.id)
                        .describing(format!("Invitation failed for participant {}", row.id)),
                );
            }
        }
    }

    let invited_set: HashSet<DbId> = invited.iter().copied().collect();
    let failed: Vec<DbId> = looked_up
        .into_iter()
        .filter(|id| !invited_set.contains(id))
        .collect();

    tracing::info!(
        site_id,
        invited = invited.len(),
        failed = failed.len(),
        "Participant invitations processed"
    );

    Ok(MessageResponse::of(MessageCode::ParticipantsInvitedSuccess)
        .with("invitedParticipantIds", invited)
        .with("failedParticipantIds", failed))
}

/// POST /sites/{siteId}/participants/import
///
/// Imports a CSV of email addresses, field name `file`. The sheet's second
/// column must be headed `Email Address`; each following row contributes
/// that cell to exactly one of the three result buckets.
pub async fn import_participants(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Path(site_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<MessageResponse> {
    let context = active_site_context(&state, site_id).await?;
    if context.kind()? == StudyType::Open {
        return Err(ErrorCode::OpenStudy.into());
    }
    manage_site_allowed(&state, admin.id, site_id).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::Refusal(ErrorCode::FailedToImportParticipants))?
    {
        if field.name() == Some("file") {
            upload = Some(
                field
                    .bytes()
                    .await
                    .map_err(|_| AppError::Refusal(ErrorCode::FailedToImportParticipants))?,
            );
            break;
        }
    }
    let upload = upload.ok_or(AppError::Refusal(ErrorCode::FailedToImportParticipants))?;

    let sheet = parse_email_sheet(&upload).map_err(|err| match err {
        ImportError::HeaderMismatch => {
            AppError::Refusal(ErrorCode::DocumentNotInPrescribedFormat)
        }
        ImportError::Unreadable(_) => AppError::Refusal(ErrorCode::FailedToImportParticipants),
    })?;

    let existing: HashSet<String> =
        ParticipantRepo::existing_emails_for_study(&state.pool, context.study_id, &sheet.valid_emails)
            .await?
            .into_iter()
            .collect();
    let mut duplicate_emails = Vec::new();
    let mut fresh = Vec::new();
    for email in sheet.valid_emails {
        if existing.contains(&email) {
            duplicate_emails.push(email);
        } else {
            fresh.push(email);
        }
    }

    let created =
        ParticipantRepo::import_batch(&state.pool, context.study_id, site_id, &fresh, admin.id)
            .await
            .map_err(classify_sqlx_error)?;
    let imported_emails: Vec<String> = created.into_iter().map(|row| row.email).collect();

    state.recorder.record(
        AuditEvent::new(AuditEventKind::ParticipantsEmailListImported)
            .by_user(admin.id)
            .with_site(site_id)
            .describing(format!(
                "{} participant emails imported for study {}",
                imported_emails.len(),
                context.custom_study_id
            )),
    );
    tracing::info!(
        site_id,
        imported = imported_emails.len(),
        invalid = sheet.invalid_emails.len(),
        duplicate = duplicate_emails.len(),
        "Participant import processed"
    );

    Ok(MessageResponse::of(MessageCode::ImportParticipantSuccess)
        .with("importedEmails", imported_emails)
        .with("invalidEmails", sheet.invalid_emails)
        .with("duplicateEmails", duplicate_emails))
}

/// PATCH /sites/{siteId}/participants/status
///
/// Bulk onboarding status override. Disabling stamps `disabled_date` and
/// voids the token; re-enabling to `New` clears the stamp; the other two
/// are status-only flips. The update is scoped to rows of this site.
pub async fn update_onboarding_status(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Path(site_id): Path<DbId>,
    Json(body): Json<UpdateOnboardingStatusRequest>,
) -> AppResult<MessageResponse> {
    body.validate()
        .map_err(|_| AppError::Refusal(ErrorCode::BadRequest))?;
    let status = OnboardingStatus::from_code(&body.status)
        .ok_or(AppError::Refusal(ErrorCode::InvalidOnboardingStatus))?;

    active_site_context(&state, site_id).await?;
    manage_site_allowed(&state, admin.id, site_id).await?;

    let updated = match status {
        OnboardingStatus::New => {
            ParticipantRepo::mark_new_batch(&state.pool, site_id, &body.ids).await?
        }
        OnboardingStatus::Invited => {
            ParticipantRepo::mark_invited_batch(&state.pool, site_id, &body.ids).await?
        }
        OnboardingStatus::Enrolled => {
            ParticipantRepo::mark_enrolled_batch(&state.pool, site_id, &body.ids).await?
        }
        OnboardingStatus::Disabled => {
            ParticipantRepo::mark_disabled_batch(&state.pool, site_id, &body.ids).await?
        }
    };

    state.recorder.record(
        AuditEvent::new(AuditEventKind::OnboardingStatusUpdated)
            .by_user(admin.id)
            .with_site(site_id)
            .describing(format!(
                "{updated} participants moved to onboarding status {}",
                status.label()
            )),
    );
    tracing::info!(site_id, updated, status = status.code(), "Onboarding status updated");

    Ok(MessageResponse::of(MessageCode::UpdateStatusSuccess))
}

/// GET /sites/{siteId}/participants?onboardingStatus=
///
/// The registry of one site: header, per-status histogram (with the `A`
/// total) and the rows, optionally filtered to one status code. Any
/// permission level on the site may read.
pub async fn get_participants(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Path(site_id): Path<DbId>,
    Query(query): Query<ParticipantListQuery>,
) -> AppResult<MessageResponse> {
    let context = SiteRepo::find_context(&state.pool, site_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::SiteNotFound))?;

    let perm = PermissionRepo::find_site(&state.pool, admin.id, site_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::ManageSitePermissionAccessDenied))?;
    if perm.level()? == Permission::NoPermission {
        return Err(ErrorCode::ManageSitePermissionAccessDenied.into());
    }

    let filter = OnboardingFilter::parse(query.onboarding_status.as_deref())
        .ok_or(AppError::Refusal(ErrorCode::InvalidOnboardingStatus))?;

    let mut statuses = Vec::new();
    for code in ParticipantRepo::onboarding_codes_by_site(&state.pool, site_id).await? {
        statuses.push(OnboardingStatus::from_code(&code).ok_or_else(|| {
            CoreError::Internal(format!(
                "participant at site {site_id} has unknown onboarding status {code:?}"
            ))
        })?);
    }
    let counts = count_by_status(statuses);

    let status_filter = match filter {
        OnboardingFilter::All => None,
        OnboardingFilter::Only(status) => Some(status.code()),
    };
    let rows = ParticipantRepo::list_by_site(&state.pool, site_id, status_filter).await?;

    // Enrollment rows come back oldest first, so the map retains the
    // newest per registry entry.
    let mut latest_enrollment: HashMap<DbId, ParticipantStudy> = HashMap::new();
    for enrollment in ParticipantRepo::enrollments_by_site(&state.pool, site_id).await? {
        latest_enrollment.insert(enrollment.participant_registry_id, enrollment);
    }

    let mut participants = Vec::with_capacity(rows.len());
    for row in rows {
        let onboarding = row.onboarding()?;
        let (enrollment_status, enrollment_date) = match latest_enrollment.get(&row.id) {
            Some(enrollment) => (enrollment.status.clone(), enrollment.enrolled_at),
            None => (YET_TO_ENROLL.to_string(), None),
        };
        participants.push(ParticipantRow {
            id: row.id,
            email: row.email,
            onboarding_status: onboarding.label(),
            invitation_date: row.invitation_date,
            invitation_count: row.invitation_count,
            enrollment_status,
            enrollment_date,
        });
    }

    let detail = ParticipantRegistryDetail {
        site_id: context.site_id,
        site_status: context.status,
        location_name: context.location_name,
        study_id: context.study_id,
        custom_study_id: context.custom_study_id,
        study_name: context.study_name,
        study_type: context.study_type,
        app_id: context.app_id,
        target_enrollment: context.target_enrollment,
        count_by_status: counts,
        registry_participants: participants,
    };

    Ok(MessageResponse::of(MessageCode::GetParticipantRegistrySuccess)
        .with("participantRegistryDetail", detail))
}

/// GET /sites/{participantRegistryId}/participant
///
/// A single registry entry with its site surroundings and enrollment
/// history. A participant who never enrolled gets one synthetic history row
/// with `-` dates.
pub async fn get_participant_details(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Path(registry_id): Path<DbId>,
) -> AppResult<MessageResponse> {
    let registry = ParticipantRepo::find_by_id(&state.pool, registry_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::ParticipantRegistrySiteNotFound))?;

    PermissionRepo::find_site(&state.pool, admin.id, registry.site_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::ManageSitePermissionAccessDenied))?;

    let context = SiteRepo::find_context(&state.pool, registry.site_id)
        .await?
        .ok_or(AppError::Refusal(ErrorCode::SiteNotFound))?;

    let onboarding = registry.onboarding()?;

    let history = ParticipantRepo::enrollments_for_registry(&state.pool, registry.id).await?;
    let enrollments = if history.is_empty() {
        vec![EnrollmentRecord {
            enrollment_status: YET_TO_ENROLL.to_string(),
            enrollment_date: NOT_APPLICABLE.to_string(),
            withdrawal_date: NOT_APPLICABLE.to_string(),
        }]
    } else {
        history
            .into_iter()
            .map(|row| EnrollmentRecord {
                enrollment_status: row.status,
                enrollment_date: format_enrollment_date(row.enrolled_at),
                withdrawal_date: format_enrollment_date(row.withdrawn_at),
            })
            .collect()
    };

    let details = ParticipantDetails {
        id: registry.id,
        email: registry.email,
        onboarding_status: onboarding.label(),
        invitation_date: registry.invitation_date,
        invitation_count: registry.invitation_count,
        site_id: context.site_id,
        location_name: context.location_name,
        study_id: context.study_id,
        custom_study_id: context.custom_study_id,
        study_name: context.study_name,
        app_id: context.app_id,
        app_name: context.app_name,
        enrollments,
    };

    Ok(MessageResponse::of(MessageCode::GetParticipantDetailsSuccess)
        .with("participant", details))
}
