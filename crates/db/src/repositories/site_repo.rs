//! Repository for the `sites` table and the joined projections behind the
//! sites overview.

use sqlx::PgPool;
use studygate_core::types::DbId;

use crate::models::site::{NewSite, Site, SiteContext, SiteCount, SiteOverview};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, study_id, location_id, status, target_enrollment, created_by, created_at, updated_at";

/// Site joined with its study, app and location.
const CONTEXT_COLUMNS: &str = "si.id AS site_id, si.status, si.target_enrollment, \
     st.id AS study_id, st.name AS study_name, st.custom_study_id, st.study_type, \
     a.id AS app_id, a.name AS app_name, l.id AS location_id, l.name AS location_name";

const CONTEXT_JOIN: &str = "FROM sites si \
     JOIN studies st ON st.id = si.study_id \
     JOIN apps a ON a.id = st.app_id \
     JOIN locations l ON l.id = si.location_id";

/// Everything the sites overview renders per site, except the counts.
const OVERVIEW_COLUMNS: &str = "si.id AS site_id, si.status, si.target_enrollment, \
     l.name AS location_name, st.id AS study_id, st.name AS study_name, \
     st.custom_study_id, st.study_type, st.app_id";

const OVERVIEW_JOIN: &str = "JOIN studies st ON st.id = si.study_id \
     JOIN locations l ON l.id = si.location_id";

/// Provides CRUD operations for sites.
pub struct SiteRepo;

impl SiteRepo {
    /// Insert a new site, returning the created row. New sites start
    /// active (table default).
    pub async fn create(pool: &PgPool, input: &NewSite) -> Result<Site, sqlx::Error> {
        let query = format!(
            "INSERT INTO sites (study_id, location_id, created_by)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Site>(&query)
            .bind(input.study_id)
            .bind(input.location_id)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a site by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Site>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sites WHERE id = $1");
        sqlx::query_as::<_, Site>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the site of a study at a location, if one exists.
    pub async fn find_by_study_and_location(
        pool: &PgPool,
        study_id: DbId,
        location_id: DbId,
    ) -> Result<Option<Site>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sites WHERE study_id = $1 AND location_id = $2");
        sqlx::query_as::<_, Site>(&query)
            .bind(study_id)
            .bind(location_id)
            .fetch_optional(pool)
            .await
    }

    /// Find the first site of a study. Open studies carry a single site;
    /// for close studies this is simply the oldest.
    pub async fn first_for_study(
        pool: &PgPool,
        study_id: DbId,
    ) -> Result<Option<Site>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sites WHERE study_id = $1 ORDER BY id LIMIT 1");
        sqlx::query_as::<_, Site>(&query)
            .bind(study_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a site joined with its study, app and location.
    pub async fn find_context(
        pool: &PgPool,
        site_id: DbId,
    ) -> Result<Option<SiteContext>, sqlx::Error> {
        let query = format!("SELECT {CONTEXT_COLUMNS} {CONTEXT_JOIN} WHERE si.id = $1");
        sqlx::query_as::<_, SiteContext>(&query)
            .bind(site_id)
            .fetch_optional(pool)
            .await
    }

    /// Set the site status. Returns `true` if the row was updated.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: i16,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE sites SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the enrollment target. Returns `true` if the row was updated.
    pub async fn update_target_enrollment(
        pool: &PgPool,
        id: DbId,
        target_enrollment: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE sites SET target_enrollment = $2 WHERE id = $1")
            .bind(id)
            .bind(target_enrollment)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List every site the admin holds a site permission on, joined with
    /// study and location, carrying the admin's `can_edit` level.
    pub async fn overviews_for_admin(
        pool: &PgPool,
        admin_user_id: DbId,
    ) -> Result<Vec<SiteOverview>, sqlx::Error> {
        let query = format!(
            "SELECT {OVERVIEW_COLUMNS}, sp.can_edit
             FROM site_permissions sp
             JOIN sites si ON si.id = sp.site_id
             {OVERVIEW_JOIN}
             WHERE sp.admin_user_id = $1
             ORDER BY st.id, si.id"
        );
        sqlx::query_as::<_, SiteOverview>(&query)
            .bind(admin_user_id)
            .fetch_all(pool)
            .await
    }

    /// List every site with edit access, for super admins who hold no
    /// permission rows.
    pub async fn all_overviews(pool: &PgPool) -> Result<Vec<SiteOverview>, sqlx::Error> {
        let query = format!(
            "SELECT {OVERVIEW_COLUMNS}, 2::SMALLINT AS can_edit
             FROM sites si
             {OVERVIEW_JOIN}
             ORDER BY st.id, si.id"
        );
        sqlx::query_as::<_, SiteOverview>(&query).fetch_all(pool).await
    }

    /// Sum sent invitations per site over every registry row. A participant
    /// invited three times contributes three.
    pub async fn invited_counts(
        pool: &PgPool,
        site_ids: &[DbId],
    ) -> Result<Vec<SiteCount>, sqlx::Error> {
        sqlx::query_as::<_, SiteCount>(
            "SELECT site_id, COALESCE(SUM(invitation_count), 0)::BIGINT AS count
             FROM participant_registry
             WHERE site_id = ANY($1)
             GROUP BY site_id",
        )
        .bind(site_ids)
        .fetch_all(pool)
        .await
    }

    /// Count participant-study rows per site, regardless of enrollment
    /// status.
    pub async fn enrolled_counts(
        pool: &PgPool,
        site_ids: &[DbId],
    ) -> Result<Vec<SiteCount>, sqlx::Error> {
        sqlx::query_as::<_, SiteCount>(
            "SELECT site_id, COUNT(*) AS count
             FROM participant_studies
             WHERE site_id = ANY($1)
             GROUP BY site_id",
        )
        .bind(site_ids)
        .fetch_all(pool)
        .await
    }
}
