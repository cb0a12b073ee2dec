//! Study entity model.

use serde::Serialize;
use sqlx::FromRow;
use studygate_core::error::CoreError;
use studygate_core::status::StudyType;
use studygate_core::types::{DbId, Timestamp};

/// Row from the `studies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Study {
    pub id: DbId,
    pub app_id: DbId,
    pub custom_study_id: String,
    pub name: String,
    pub study_type: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Study {
    /// Typed view of the raw `study_type` column.
    pub fn kind(&self) -> Result<StudyType, CoreError> {
        StudyType::parse(&self.study_type).ok_or_else(|| {
            CoreError::Internal(format!(
                "study {} has unknown study type {:?}",
                self.id, self.study_type
            ))
        })
    }
}

/// Study row joined with its app, as needed for audit payloads and
/// invitation emails.
#[derive(Debug, Clone, FromRow)]
pub struct StudyWithApp {
    pub id: DbId,
    pub app_id: DbId,
    pub custom_study_id: String,
    pub name: String,
    pub study_type: String,
    pub app_name: String,
    pub custom_app_id: String,
}

impl StudyWithApp {
    /// Typed view of the raw `study_type` column.
    pub fn kind(&self) -> Result<StudyType, CoreError> {
        StudyType::parse(&self.study_type).ok_or_else(|| {
            CoreError::Internal(format!(
                "study {} has unknown study type {:?}",
                self.id, self.study_type
            ))
        })
    }
}

/// Input for inserting a new study.
#[derive(Debug, Clone)]
pub struct NewStudy {
    pub app_id: DbId,
    pub custom_study_id: String,
    pub name: String,
    pub study_type: String,
}
