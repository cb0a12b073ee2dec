//! Site entity model and query projections.

use serde::Serialize;
use sqlx::FromRow;
use studygate_core::error::CoreError;
use studygate_core::status::{SiteStatus, StudyType};
use studygate_core::types::{DbId, Timestamp};

/// Row from the `sites` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Site {
    pub id: DbId,
    pub study_id: DbId,
    pub location_id: DbId,
    pub status: i16,
    pub target_enrollment: Option<i32>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Site {
    /// Typed view of the raw `status` column.
    pub fn site_status(&self) -> Result<SiteStatus, CoreError> {
        SiteStatus::from_id(self.status).ok_or_else(|| {
            CoreError::Internal(format!("site {} has unknown status {}", self.id, self.status))
        })
    }
}

/// Input for inserting a new site. New sites always start active.
#[derive(Debug, Clone)]
pub struct NewSite {
    pub study_id: DbId,
    pub location_id: DbId,
    pub created_by: DbId,
}

/// Site row joined with its study, app and location, as needed by the
/// participant operations and invitation emails.
#[derive(Debug, Clone, FromRow)]
pub struct SiteContext {
    pub site_id: DbId,
    pub status: i16,
    pub target_enrollment: Option<i32>,
    pub study_id: DbId,
    pub study_name: String,
    pub custom_study_id: String,
    pub study_type: String,
    pub app_id: DbId,
    pub app_name: String,
    pub location_id: DbId,
    pub location_name: String,
}

impl SiteContext {
    /// Typed view of the raw site `status` column.
    pub fn site_status(&self) -> Result<SiteStatus, CoreError> {
        SiteStatus::from_id(self.status).ok_or_else(|| {
            CoreError::Internal(format!(
                "site {} has unknown status {}",
                self.site_id, self.status
            ))
        })
    }

    /// Typed view of the raw `study_type` column.
    pub fn kind(&self) -> Result<StudyType, CoreError> {
        StudyType::parse(&self.study_type).ok_or_else(|| {
            CoreError::Internal(format!(
                "study {} has unknown study type {:?}",
                self.study_id, self.study_type
            ))
        })
    }
}

/// One site a given admin holds a permission on, joined with everything the
/// sites overview renders.
#[derive(Debug, Clone, FromRow)]
pub struct SiteOverview {
    pub site_id: DbId,
    pub status: i16,
    pub target_enrollment: Option<i32>,
    pub location_name: String,
    pub study_id: DbId,
    pub study_name: String,
    pub custom_study_id: String,
    pub study_type: String,
    pub app_id: DbId,
    pub can_edit: i16,
}

impl SiteOverview {
    /// Typed view of the raw `study_type` column.
    pub fn kind(&self) -> Result<StudyType, CoreError> {
        StudyType::parse(&self.study_type).ok_or_else(|| {
            CoreError::Internal(format!(
                "study {} has unknown study type {:?}",
                self.study_id, self.study_type
            ))
        })
    }
}

/// Per-site tally used for invited and enrolled counts.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct SiteCount {
    pub site_id: DbId,
    pub count: i64,
}
