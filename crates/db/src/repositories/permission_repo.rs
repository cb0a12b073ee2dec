//! Repository for the app, study and site permission tables.
//!
//! Lookup methods fetch raw rows; the decisions over them live in
//! `studygate_core::permissions`. All batch writes are single multi-row
//! parameterized statements.

use sqlx::PgPool;
use studygate_core::permissions::SitePermissionSeed;
use studygate_core::types::DbId;

use crate::models::permission::{
    AppPermission, AppPermissionEntry, SitePermission, SitePermissionEntry, StudyPermission,
    StudyPermissionEntry,
};

const APP_COLUMNS: &str = "id, admin_user_id, app_id, edit, created_by, created_at, updated_at";

const STUDY_COLUMNS: &str =
    "id, admin_user_id, app_id, study_id, edit, created_by, created_at, updated_at";

const SITE_COLUMNS: &str =
    "id, admin_user_id, app_id, study_id, site_id, can_edit, created_by, created_at, updated_at";

/// Provides lookups and batch writes for permission rows.
pub struct PermissionRepo;

impl PermissionRepo {
    /// Find an admin's permission row for an app.
    pub async fn find_app(
        pool: &PgPool,
        admin_user_id: DbId,
        app_id: DbId,
    ) -> Result<Option<AppPermission>, sqlx::Error> {
        let query = format!(
            "SELECT {APP_COLUMNS} FROM app_permissions WHERE admin_user_id = $1 AND app_id = $2"
        );
        sqlx::query_as::<_, AppPermission>(&query)
            .bind(admin_user_id)
            .bind(app_id)
            .fetch_optional(pool)
            .await
    }

    /// Find an admin's permission row for a study.
    pub async fn find_study(
        pool: &PgPool,
        admin_user_id: DbId,
        study_id: DbId,
    ) -> Result<Option<StudyPermission>, sqlx::Error> {
        let query = format!(
            "SELECT {STUDY_COLUMNS} FROM study_permissions
             WHERE admin_user_id = $1 AND study_id = $2"
        );
        sqlx::query_as::<_, StudyPermission>(&query)
            .bind(admin_user_id)
            .bind(study_id)
            .fetch_optional(pool)
            .await
    }

    /// Find an admin's permission row for a site.
    pub async fn find_site(
        pool: &PgPool,
        admin_user_id: DbId,
        site_id: DbId,
    ) -> Result<Option<SitePermission>, sqlx::Error> {
        let query = format!(
            "SELECT {SITE_COLUMNS} FROM site_permissions
             WHERE admin_user_id = $1 AND site_id = $2"
        );
        sqlx::query_as::<_, SitePermission>(&query)
            .bind(admin_user_id)
            .bind(site_id)
            .fetch_optional(pool)
            .await
    }

    /// List every permission row held on a study, for seeding site
    /// permissions when a site is added under it.
    pub async fn study_holders(
        pool: &PgPool,
        study_id: DbId,
    ) -> Result<Vec<StudyPermission>, sqlx::Error> {
        let query =
            format!("SELECT {STUDY_COLUMNS} FROM study_permissions WHERE study_id = $1 ORDER BY id");
        sqlx::query_as::<_, StudyPermission>(&query)
            .bind(study_id)
            .fetch_all(pool)
            .await
    }

    /// List the admins holding a permission row on a site.
    pub async fn site_holder_ids(pool: &PgPool, site_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT admin_user_id FROM site_permissions WHERE site_id = $1 ORDER BY id",
        )
        .bind(site_id)
        .fetch_all(pool)
        .await
    }

    /// List the admins holding any permission row on a study, at any level.
    pub async fn study_holder_ids(pool: &PgPool, study_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT admin_user_id FROM study_permissions WHERE study_id = $1 ORDER BY id",
        )
        .bind(study_id)
        .fetch_all(pool)
        .await
    }

    /// Insert the site-permission seeds for a newly added site.
    pub async fn seed_site(
        pool: &PgPool,
        app_id: DbId,
        study_id: DbId,
        site_id: DbId,
        seeds: &[SitePermissionSeed],
        created_by: DbId,
    ) -> Result<u64, sqlx::Error> {
        if seeds.is_empty() {
            return Ok(0);
        }
        let mut query = String::from(
            "INSERT INTO site_permissions \
             (admin_user_id, app_id, study_id, site_id, can_edit, created_by) VALUES ",
        );
        push_value_rows(&mut query, seeds.len(), 6);
        let mut insert = sqlx::query(&query);
        for seed in seeds {
            insert = insert
                .bind(seed.admin_user_id)
                .bind(app_id)
                .bind(study_id)
                .bind(site_id)
                .bind(seed.can_edit.id())
                .bind(created_by);
        }
        let result = insert.execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Reduce the named admins' site permission to read-view.
    pub async fn downgrade_site_holders(
        pool: &PgPool,
        site_id: DbId,
        admin_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if admin_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE site_permissions SET can_edit = 1
             WHERE site_id = $1 AND admin_user_id = ANY($2)",
        )
        .bind(site_id)
        .bind(admin_ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Remove the named admins' site permission rows entirely.
    pub async fn revoke_site_holders(
        pool: &PgPool,
        site_id: DbId,
        admin_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if admin_ids.is_empty() {
            return Ok(0);
        }
        let result =
            sqlx::query("DELETE FROM site_permissions WHERE site_id = $1 AND admin_user_id = ANY($2)")
                .bind(site_id)
                .bind(admin_ids)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Insert app-level grants for an admin.
    pub async fn insert_app_batch(
        pool: &PgPool,
        admin_user_id: DbId,
        entries: &[AppPermissionEntry],
        created_by: DbId,
    ) -> Result<u64, sqlx::Error> {
        if entries.is_empty() {
            return Ok(0);
        }
        let mut query = String::from(
            "INSERT INTO app_permissions (admin_user_id, app_id, edit, created_by) VALUES ",
        );
        push_value_rows(&mut query, entries.len(), 4);
        let mut insert = sqlx::query(&query);
        for entry in entries {
            insert = insert
                .bind(admin_user_id)
                .bind(entry.app_id)
                .bind(entry.edit)
                .bind(created_by);
        }
        let result = insert.execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Insert study-level grants for an admin.
    pub async fn insert_study_batch(
        pool: &PgPool,
        admin_user_id: DbId,
        entries: &[StudyPermissionEntry],
        created_by: DbId,
    ) -> Result<u64, sqlx::Error> {
        if entries.is_empty() {
            return Ok(0);
        }
        let mut query = String::from(
            "INSERT INTO study_permissions \
             (admin_user_id, app_id, study_id, edit, created_by) VALUES ",
        );
        push_value_rows(&mut query, entries.len(), 5);
        let mut insert = sqlx::query(&query);
        for entry in entries {
            insert = insert
                .bind(admin_user_id)
                .bind(entry.app_id)
                .bind(entry.study_id)
                .bind(entry.edit)
                .bind(created_by);
        }
        let result = insert.execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Insert site-level grants for an admin.
    pub async fn insert_site_batch(
        pool: &PgPool,
        admin_user_id: DbId,
        entries: &[SitePermissionEntry],
        created_by: DbId,
    ) -> Result<u64, sqlx::Error> {
        if entries.is_empty() {
            return Ok(0);
        }
        let mut query = String::from(
            "INSERT INTO site_permissions \
             (admin_user_id, app_id, study_id, site_id, can_edit, created_by) VALUES ",
        );
        push_value_rows(&mut query, entries.len(), 6);
        let mut insert = sqlx::query(&query);
        for entry in entries {
            insert = insert
                .bind(admin_user_id)
                .bind(entry.app_id)
                .bind(entry.study_id)
                .bind(entry.site_id)
                .bind(entry.can_edit)
                .bind(created_by);
        }
        let result = insert.execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete every permission row of an admin across all three scopes.
    pub async fn delete_all_for_admin(
        pool: &PgPool,
        admin_user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let mut deleted = 0;
        for table in ["app_permissions", "study_permissions", "site_permissions"] {
            let query = format!("DELETE FROM {table} WHERE admin_user_id = $1");
            let result = sqlx::query(&query).bind(admin_user_id).execute(pool).await?;
            deleted += result.rows_affected();
        }
        Ok(deleted)
    }
}

/// Append `(${n}, ${n+1}, ...)` value groups for a multi-row INSERT.
fn push_value_rows(query: &mut String, rows: usize, params_per_row: u32) {
    let mut param = 1u32;
    for row in 0..rows {
        if row > 0 {
            query.push_str(", ");
        }
        query.push('(');
        for i in 0..params_per_row {
            if i > 0 {
                query.push_str(", ");
            }
            query.push_str(&format!("${param}"));
            param += 1;
        }
        query.push(')');
    }
}
