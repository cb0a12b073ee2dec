//! Repository for the `studies` table.

use sqlx::PgPool;
use studygate_core::types::DbId;

use crate::models::study::{NewStudy, Study, StudyWithApp};

const COLUMNS: &str = "id, app_id, custom_study_id, name, study_type, created_at, updated_at";

const WITH_APP_COLUMNS: &str = "s.id, s.app_id, s.custom_study_id, s.name, s.study_type, \
                                a.name AS app_name, a.custom_app_id";

/// Provides CRUD operations for studies.
pub struct StudyRepo;

impl StudyRepo {
    /// Insert a new study, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewStudy) -> Result<Study, sqlx::Error> {
        let query = format!(
            "INSERT INTO studies (app_id, custom_study_id, name, study_type)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Study>(&query)
            .bind(input.app_id)
            .bind(&input.custom_study_id)
            .bind(&input.name)
            .bind(&input.study_type)
            .fetch_one(pool)
            .await
    }

    /// Find a study by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Study>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM studies WHERE id = $1");
        sqlx::query_as::<_, Study>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a study joined with its app.
    pub async fn find_with_app(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<StudyWithApp>, sqlx::Error> {
        let query = format!(
            "SELECT {WITH_APP_COLUMNS}
             FROM studies s
             JOIN apps a ON a.id = s.app_id
             WHERE s.id = $1"
        );
        sqlx::query_as::<_, StudyWithApp>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
