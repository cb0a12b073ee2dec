//! Participant registry and enrollment entity models.

use sqlx::FromRow;
use studygate_core::enrollment::EnrollmentStatus;
use studygate_core::error::CoreError;
use studygate_core::onboarding::OnboardingStatus;
use studygate_core::types::{DbId, Timestamp};

/// Row from the `participant_registry` table.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantRegistry {
    pub id: DbId,
    pub study_id: DbId,
    pub site_id: DbId,
    pub email: String,
    pub onboarding_status: String,
    pub enrollment_token: Option<String>,
    pub enrollment_token_expires_at: Option<Timestamp>,
    pub invitation_date: Option<Timestamp>,
    pub invitation_count: i64,
    pub disabled_date: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ParticipantRegistry {
    /// Typed view of the raw `onboarding_status` column.
    pub fn onboarding(&self) -> Result<OnboardingStatus, CoreError> {
        OnboardingStatus::from_code(&self.onboarding_status).ok_or_else(|| {
            CoreError::Internal(format!(
                "participant {} has unknown onboarding status {:?}",
                self.id, self.onboarding_status
            ))
        })
    }
}

/// Input for inserting a new registry entry. New entries always start in
/// onboarding status `N`.
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub study_id: DbId,
    pub site_id: DbId,
    pub email: String,
    pub created_by: DbId,
}

/// Row from the `participant_studies` table.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantStudy {
    pub id: DbId,
    pub participant_registry_id: DbId,
    pub study_id: DbId,
    pub site_id: Option<DbId>,
    pub status: String,
    pub enrolled_at: Option<Timestamp>,
    pub withdrawn_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ParticipantStudy {
    /// Typed view of the raw `status` column.
    pub fn enrollment(&self) -> Result<EnrollmentStatus, CoreError> {
        EnrollmentStatus::parse(&self.status).ok_or_else(|| {
            CoreError::Internal(format!(
                "enrollment {} has unknown status {:?}",
                self.id, self.status
            ))
        })
    }
}

/// Input for inserting an enrollment record.
#[derive(Debug, Clone)]
pub struct NewParticipantStudy {
    pub participant_registry_id: DbId,
    pub study_id: DbId,
    pub site_id: Option<DbId>,
    pub status: String,
    pub enrolled_at: Option<Timestamp>,
    pub withdrawn_at: Option<Timestamp>,
}
