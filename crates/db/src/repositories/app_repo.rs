//! Repository for the `apps` table.

use sqlx::PgPool;
use studygate_core::types::DbId;

use crate::models::app::{App, NewApp};

const COLUMNS: &str = "id, custom_app_id, name, created_at, updated_at";

/// Provides CRUD operations for apps.
pub struct AppRepo;

impl AppRepo {
    /// Insert a new app, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewApp) -> Result<App, sqlx::Error> {
        let query = format!(
            "INSERT INTO apps (custom_app_id, name)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, App>(&query)
            .bind(&input.custom_app_id)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    /// Find an app by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<App>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM apps WHERE id = $1");
        sqlx::query_as::<_, App>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
