//! Repository for the `locations` table.

use sqlx::PgPool;
use studygate_core::types::DbId;

use crate::models::location::{Location, LocationWithStudies, NewLocation, UpdateLocation};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, custom_id, name, description, status, is_default, created_by, created_at, updated_at";

/// Location columns joined with the aggregated names of studies that hold a
/// site at the location.
const WITH_STUDIES_COLUMNS: &str = "l.id, l.custom_id, l.name, l.description, l.status, \
     l.is_default, l.created_by, l.created_at, l.updated_at, \
     STRING_AGG(DISTINCT s.name, ', ' ORDER BY s.name) AS study_names";

const WITH_STUDIES_JOIN: &str = "FROM locations l \
     LEFT JOIN sites si ON si.location_id = l.id \
     LEFT JOIN studies s ON s.id = si.study_id";

/// Provides CRUD operations for locations.
pub struct LocationRepo;

impl LocationRepo {
    /// Insert a new location, returning the created row. New locations
    /// start active and non-default (table defaults).
    pub async fn create(pool: &PgPool, input: &NewLocation) -> Result<Location, sqlx::Error> {
        let query = format!(
            "INSERT INTO locations (custom_id, name, description, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Location>(&query)
            .bind(&input.custom_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a location by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Location>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM locations WHERE id = $1");
        sqlx::query_as::<_, Location>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a location joined with the names of studies holding a site
    /// there.
    pub async fn find_with_studies(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<LocationWithStudies>, sqlx::Error> {
        let query = format!(
            "SELECT {WITH_STUDIES_COLUMNS} {WITH_STUDIES_JOIN}
             WHERE l.id = $1
             GROUP BY l.id"
        );
        sqlx::query_as::<_, LocationWithStudies>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all locations with their attached study names, newest first.
    pub async fn list_with_studies(pool: &PgPool) -> Result<Vec<LocationWithStudies>, sqlx::Error> {
        let query = format!(
            "SELECT {WITH_STUDIES_COLUMNS} {WITH_STUDIES_JOIN}
             GROUP BY l.id
             ORDER BY l.created_at DESC, l.id DESC"
        );
        sqlx::query_as::<_, LocationWithStudies>(&query)
            .fetch_all(pool)
            .await
    }

    /// List active locations not yet hosting a site of the given study,
    /// for picking the location of a new site.
    pub async fn list_for_new_site(
        pool: &PgPool,
        study_id: DbId,
    ) -> Result<Vec<Location>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM locations
             WHERE status = 1
               AND id NOT IN (SELECT location_id FROM sites WHERE study_id = $1)
             ORDER BY name"
        );
        sqlx::query_as::<_, Location>(&query)
            .bind(study_id)
            .fetch_all(pool)
            .await
    }

    /// Update a location. Only non-`None` fields in `input` are applied;
    /// `custom_id` is immutable and never touched.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateLocation,
    ) -> Result<Option<Location>, sqlx::Error> {
        let query = format!(
            "UPDATE locations SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Location>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status)
            .fetch_optional(pool)
            .await
    }

    /// Count sites at the location that are still active.
    pub async fn active_site_count(pool: &PgPool, location_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM sites WHERE location_id = $1 AND status = 1")
            .bind(location_id)
            .fetch_one(pool)
            .await
    }
}
