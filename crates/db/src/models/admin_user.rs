//! Admin user entity model and input DTOs.

use sqlx::FromRow;
use studygate_core::error::CoreError;
use studygate_core::permissions::Permission;
use studygate_core::status::AdminStatus;
use studygate_core::types::{DbId, Timestamp};

/// Full admin row from the `admin_users` table.
///
/// Contains the account security code -- never serialize this to API
/// responses directly.
#[derive(Debug, Clone, FromRow)]
pub struct AdminUser {
    pub id: DbId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub location_permission: i16,
    pub super_admin: bool,
    pub status: i16,
    pub security_code: Option<String>,
    pub security_code_expires_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AdminUser {
    /// Typed view of the raw `status` column.
    pub fn account_status(&self) -> Result<AdminStatus, CoreError> {
        AdminStatus::from_id(self.status).ok_or_else(|| {
            CoreError::Internal(format!(
                "admin user {} has unknown status {}",
                self.id, self.status
            ))
        })
    }

    /// Typed view of the raw `location_permission` column.
    pub fn location_access(&self) -> Result<Permission, CoreError> {
        Permission::from_id(self.location_permission).ok_or_else(|| {
            CoreError::Internal(format!(
                "admin user {} has unknown location permission {}",
                self.id, self.location_permission
            ))
        })
    }
}

/// Input for inserting a new admin account.
#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub location_permission: i16,
    pub super_admin: bool,
    pub status: i16,
    pub security_code: String,
    pub security_code_expires_at: Timestamp,
    pub created_by: DbId,
}

/// Partial update of an admin's profile and access level. Only non-`None`
/// fields are applied.
#[derive(Debug, Clone, Default)]
pub struct UpdateAdminUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub super_admin: Option<bool>,
    pub location_permission: Option<i16>,
}
