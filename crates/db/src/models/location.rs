//! Location entity model and input DTOs.

use serde::Serialize;
use sqlx::FromRow;
use studygate_core::error::CoreError;
use studygate_core::status::LocationStatus;
use studygate_core::types::{DbId, Timestamp};

/// Row from the `locations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Location {
    pub id: DbId,
    pub custom_id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: i16,
    pub is_default: bool,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Location {
    /// Typed view of the raw `status` column.
    pub fn location_status(&self) -> Result<LocationStatus, CoreError> {
        LocationStatus::from_id(self.status).ok_or_else(|| {
            CoreError::Internal(format!(
                "location {} has unknown status {}",
                self.id, self.status
            ))
        })
    }
}

/// Location row joined with the names of studies holding a site there,
/// aggregated into one comma-separated string.
#[derive(Debug, Clone, FromRow)]
pub struct LocationWithStudies {
    pub id: DbId,
    pub custom_id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: i16,
    pub is_default: bool,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub study_names: Option<String>,
}

/// Input for inserting a new location. New locations always start active
/// and non-default.
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub custom_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: DbId,
}

/// Partial update of a location. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct UpdateLocation {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<i16>,
}
