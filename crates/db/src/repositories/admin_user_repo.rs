//! Repository for the `admin_users` table.

use sqlx::PgPool;
use studygate_core::types::DbId;

use crate::models::admin_user::{AdminUser, NewAdminUser, UpdateAdminUser};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, first_name, last_name, phone, location_permission, \
                       super_admin, status, security_code, security_code_expires_at, \
                       created_by, created_at, updated_at";

/// Provides CRUD operations for admin accounts.
pub struct AdminUserRepo;

impl AdminUserRepo {
    /// Insert a new admin account, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewAdminUser) -> Result<AdminUser, sqlx::Error> {
        let query = format!(
            "INSERT INTO admin_users (email, first_name, last_name, phone, location_permission, \
                                      super_admin, status, security_code, \
                                      security_code_expires_at, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AdminUser>(&query)
            .bind(&input.email)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.phone)
            .bind(input.location_permission)
            .bind(input.super_admin)
            .bind(input.status)
            .bind(&input.security_code)
            .bind(input.security_code_expires_at)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find an admin by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AdminUser>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM admin_users WHERE id = $1");
        sqlx::query_as::<_, AdminUser>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an admin by email (case-sensitive).
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<AdminUser>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM admin_users WHERE email = $1");
        sqlx::query_as::<_, AdminUser>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Update an admin's profile and access level. Only non-`None` fields in
    /// `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAdminUser,
    ) -> Result<Option<AdminUser>, sqlx::Error> {
        let query = format!(
            "UPDATE admin_users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                super_admin = COALESCE($5, super_admin),
                location_permission = COALESCE($6, location_permission)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AdminUser>(&query)
            .bind(id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.phone)
            .bind(input.super_admin)
            .bind(input.location_permission)
            .fetch_optional(pool)
            .await
    }
}
