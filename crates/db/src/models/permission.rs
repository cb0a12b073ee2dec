//! Permission row models for the app, study and site level.

use sqlx::FromRow;
use studygate_core::error::CoreError;
use studygate_core::permissions::Permission;
use studygate_core::types::{DbId, Timestamp};

fn parse_permission(value: i16, row: &'static str, id: DbId) -> Result<Permission, CoreError> {
    Permission::from_id(value).ok_or_else(|| {
        CoreError::Internal(format!("{row} permission {id} has unknown level {value}"))
    })
}

/// Row from the `app_permissions` table.
#[derive(Debug, Clone, FromRow)]
pub struct AppPermission {
    pub id: DbId,
    pub admin_user_id: DbId,
    pub app_id: DbId,
    pub edit: i16,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AppPermission {
    /// Typed view of the raw `edit` column.
    pub fn level(&self) -> Result<Permission, CoreError> {
        parse_permission(self.edit, "app", self.id)
    }
}

/// Row from the `study_permissions` table.
#[derive(Debug, Clone, FromRow)]
pub struct StudyPermission {
    pub id: DbId,
    pub admin_user_id: DbId,
    pub app_id: DbId,
    pub study_id: DbId,
    pub edit: i16,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl StudyPermission {
    /// Typed view of the raw `edit` column.
    pub fn level(&self) -> Result<Permission, CoreError> {
        parse_permission(self.edit, "study", self.id)
    }
}

/// Row from the `site_permissions` table.
#[derive(Debug, Clone, FromRow)]
pub struct SitePermission {
    pub id: DbId,
    pub admin_user_id: DbId,
    pub app_id: DbId,
    pub study_id: DbId,
    pub site_id: DbId,
    pub can_edit: i16,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SitePermission {
    /// Typed view of the raw `can_edit` column.
    pub fn level(&self) -> Result<Permission, CoreError> {
        parse_permission(self.can_edit, "site", self.id)
    }
}

/// One app-level grant to insert for an admin.
#[derive(Debug, Clone, Copy)]
pub struct AppPermissionEntry {
    pub app_id: DbId,
    pub edit: i16,
}

/// One study-level grant to insert for an admin.
#[derive(Debug, Clone, Copy)]
pub struct StudyPermissionEntry {
    pub app_id: DbId,
    pub study_id: DbId,
    pub edit: i16,
}

/// One site-level grant to insert for an admin.
#[derive(Debug, Clone, Copy)]
pub struct SitePermissionEntry {
    pub app_id: DbId,
    pub study_id: DbId,
    pub site_id: DbId,
    pub can_edit: i16,
}

/// The full permission assignment of a non-super admin.
#[derive(Debug, Clone, Default)]
pub struct AdminPermissionSet {
    pub apps: Vec<AppPermissionEntry>,
    pub studies: Vec<StudyPermissionEntry>,
    pub sites: Vec<SitePermissionEntry>,
}

impl AdminPermissionSet {
    /// Whether the set grants nothing at any level.
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty() && self.studies.is_empty() && self.sites.is_empty()
    }
}
