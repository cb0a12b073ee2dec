//! The audit envelope and the catalogue of recorded operations.
//!
//! Every state-changing operation of the portal records exactly one
//! [`AuditEvent`] after its mutation commits. The envelope carries the ids
//! of whichever scopes the operation touched; unset scopes stay `NULL` in
//! the trail.

use studygate_core::types::DbId;
use studygate_db::models::audit::NewAuditEvent;

// ---------------------------------------------------------------------------
// AuditEventKind
// ---------------------------------------------------------------------------

/// The operations recorded in the audit trail.
///
/// `name` values are part of the persisted trail and must not be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEventKind {
    NewLocationAdded,
    LocationEdited,
    LocationDecommissioned,
    LocationActivated,
    SiteAddedForStudy,
    SiteDecommissionedForStudy,
    SiteActivatedForStudy,
    ParticipantEmailAddSuccess,
    ParticipantEmailAddFailure,
    ParticipantsEmailListImported,
    InvitationEmailSent,
    InvitationEmailFailed,
    OnboardingStatusUpdated,
    EnrollmentTargetUpdated,
    NewUserCreated,
    UserRecordUpdated,
}

impl AuditEventKind {
    /// The stored event name.
    pub fn name(self) -> &'static str {
        match self {
            AuditEventKind::NewLocationAdded => "NEW_LOCATION_ADDED",
            AuditEventKind::LocationEdited => "LOCATION_EDITED",
            AuditEventKind::LocationDecommissioned => "LOCATION_DECOMMISSIONED",
            AuditEventKind::LocationActivated => "LOCATION_ACTIVATED",
            AuditEventKind::SiteAddedForStudy => "SITE_ADDED_FOR_STUDY",
            AuditEventKind::SiteDecommissionedForStudy => "SITE_DECOMMISSIONED_FOR_STUDY",
            AuditEventKind::SiteActivatedForStudy => "SITE_ACTIVATED_FOR_STUDY",
            AuditEventKind::ParticipantEmailAddSuccess => "PARTICIPANT_EMAIL_ADD_SUCCESS",
            AuditEventKind::ParticipantEmailAddFailure => "PARTICIPANT_EMAIL_ADD_FAILURE",
            AuditEventKind::ParticipantsEmailListImported => "PARTICIPANTS_EMAIL_LIST_IMPORTED",
            AuditEventKind::InvitationEmailSent => "INVITATION_EMAIL_SENT",
            AuditEventKind::InvitationEmailFailed => "INVITATION_EMAIL_FAILED",
            AuditEventKind::OnboardingStatusUpdated => "ONBOARDING_STATUS_UPDATED",
            AuditEventKind::EnrollmentTargetUpdated => "ENROLLMENT_TARGET_UPDATED",
            AuditEventKind::NewUserCreated => "NEW_USER_CREATED",
            AuditEventKind::UserRecordUpdated => "USER_RECORD_UPDATED",
        }
    }

    /// Description recorded when the caller does not supply one.
    pub fn default_description(self) -> &'static str {
        match self {
            AuditEventKind::NewLocationAdded => "New location added",
            AuditEventKind::LocationEdited => "Location details edited",
            AuditEventKind::LocationDecommissioned => "Location decommissioned",
            AuditEventKind::LocationActivated => "Location activated",
            AuditEventKind::SiteAddedForStudy => "Site added for study",
            AuditEventKind::SiteDecommissionedForStudy => "Site decommissioned for study",
            AuditEventKind::SiteActivatedForStudy => "Site activated for study",
            AuditEventKind::ParticipantEmailAddSuccess => {
                "Participant email added to the site registry"
            }
            AuditEventKind::ParticipantEmailAddFailure => {
                "Participant email rejected as a duplicate"
            }
            AuditEventKind::ParticipantsEmailListImported => "Participant email list imported",
            AuditEventKind::InvitationEmailSent => "Enrollment invitation email sent",
            AuditEventKind::InvitationEmailFailed => {
                "Enrollment invitation email could not be sent"
            }
            AuditEventKind::OnboardingStatusUpdated => "Participant onboarding status updated",
            AuditEventKind::EnrollmentTargetUpdated => "Enrollment target updated",
            AuditEventKind::NewUserCreated => "New admin user account created",
            AuditEventKind::UserRecordUpdated => "Admin user account updated",
        }
    }
}

// ---------------------------------------------------------------------------
// AuditEvent
// ---------------------------------------------------------------------------

/// One recorded operation, before it reaches the trail.
///
/// Constructed via [`AuditEvent::new`] and enriched with the builder
/// methods; only the scopes an operation touched are set.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub kind: AuditEventKind,
    /// The admin who performed the operation.
    pub user_id: Option<DbId>,
    pub app_id: Option<DbId>,
    pub study_id: Option<DbId>,
    pub site_id: Option<DbId>,
    pub participant_id: Option<DbId>,
    pub description: String,
}

impl AuditEvent {
    /// Create an event of the given kind with its default description and
    /// no scopes.
    pub fn new(kind: AuditEventKind) -> Self {
        Self {
            kind,
            user_id: None,
            app_id: None,
            study_id: None,
            site_id: None,
            participant_id: None,
            description: kind.default_description().to_string(),
        }
    }

    /// Attach the acting admin.
    pub fn by_user(mut self, user_id: DbId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_app(mut self, app_id: DbId) -> Self {
        self.app_id = Some(app_id);
        self
    }

    pub fn with_study(mut self, study_id: DbId) -> Self {
        self.study_id = Some(study_id);
        self
    }

    pub fn with_site(mut self, site_id: DbId) -> Self {
        self.site_id = Some(site_id);
        self
    }

    pub fn with_participant(mut self, participant_id: DbId) -> Self {
        self.participant_id = Some(participant_id);
        self
    }

    /// Replace the default description.
    pub fn describing(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl From<AuditEvent> for NewAuditEvent {
    fn from(event: AuditEvent) -> Self {
        NewAuditEvent {
            event_name: event.kind.name().to_string(),
            user_id: event.user_id,
            app_id: event.app_id,
            study_id: event.study_id,
            site_id: event.site_id,
            participant_id: event.participant_id,
            description: event.description,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
