//! Repository for the `participant_registry` and `participant_studies`
//! tables.

use sqlx::PgPool;
use studygate_core::types::{DbId, Timestamp};

use crate::models::participant::{
    NewParticipant, NewParticipantStudy, ParticipantRegistry, ParticipantStudy,
};

/// Column list shared across registry queries to avoid repetition.
const REGISTRY_COLUMNS: &str = "id, study_id, site_id, email, onboarding_status, \
     enrollment_token, enrollment_token_expires_at, invitation_date, invitation_count, \
     disabled_date, created_by, created_at, updated_at";

const STUDY_ROW_COLUMNS: &str = "id, participant_registry_id, study_id, site_id, status, \
     enrolled_at, withdrawn_at, created_at, updated_at";

/// Provides CRUD operations for the participant registry and the
/// enrollment records hanging off it.
pub struct ParticipantRepo;

impl ParticipantRepo {
    /// Insert a new registry entry, returning the created row. New entries
    /// start in onboarding status `N` (table default).
    pub async fn create(
        pool: &PgPool,
        input: &NewParticipant,
    ) -> Result<ParticipantRegistry, sqlx::Error> {
        let query = format!(
            "INSERT INTO participant_registry (study_id, site_id, email, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {REGISTRY_COLUMNS}"
        );
        sqlx::query_as::<_, ParticipantRegistry>(&query)
            .bind(input.study_id)
            .bind(input.site_id)
            .bind(&input.email)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a registry entry by internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ParticipantRegistry>, sqlx::Error> {
        let query = format!("SELECT {REGISTRY_COLUMNS} FROM participant_registry WHERE id = $1");
        sqlx::query_as::<_, ParticipantRegistry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the registry entries with the given IDs. Unknown IDs are
    /// silently absent from the result.
    pub async fn find_by_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<ParticipantRegistry>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {REGISTRY_COLUMNS} FROM participant_registry WHERE id = ANY($1) ORDER BY id"
        );
        sqlx::query_as::<_, ParticipantRegistry>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Find the registry entry for an email within a study. Uniqueness is
    /// per `(study, email)` regardless of onboarding status.
    pub async fn find_by_study_and_email(
        pool: &PgPool,
        study_id: DbId,
        email: &str,
    ) -> Result<Option<ParticipantRegistry>, sqlx::Error> {
        let query = format!(
            "SELECT {REGISTRY_COLUMNS} FROM participant_registry
             WHERE study_id = $1 AND email = $2"
        );
        sqlx::query_as::<_, ParticipantRegistry>(&query)
            .bind(study_id)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// List the registry of a site, optionally filtered to one onboarding
    /// status code, newest first.
    pub async fn list_by_site(
        pool: &PgPool,
        site_id: DbId,
        onboarding_status: Option<&str>,
    ) -> Result<Vec<ParticipantRegistry>, sqlx::Error> {
        match onboarding_status {
            Some(code) => {
                let query = format!(
                    "SELECT {REGISTRY_COLUMNS} FROM participant_registry
                     WHERE site_id = $1 AND onboarding_status = $2
                     ORDER BY created_at DESC, id DESC"
                );
                sqlx::query_as::<_, ParticipantRegistry>(&query)
                    .bind(site_id)
                    .bind(code)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {REGISTRY_COLUMNS} FROM participant_registry
                     WHERE site_id = $1
                     ORDER BY created_at DESC, id DESC"
                );
                sqlx::query_as::<_, ParticipantRegistry>(&query)
                    .bind(site_id)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Fetch the raw onboarding status codes of every registry entry at a
    /// site, for the status histogram.
    pub async fn onboarding_codes_by_site(
        pool: &PgPool,
        site_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT onboarding_status FROM participant_registry WHERE site_id = $1")
            .bind(site_id)
            .fetch_all(pool)
            .await
    }

    /// Record an accepted invitation: store the fresh token and expiry and
    /// stamp the invitation date. A row still in `N` transitions to `I` and
    /// its invitation count increments; re-invited rows keep both.
    ///
    /// Returns `true` if the row was updated.
    pub async fn record_invitation(
        pool: &PgPool,
        id: DbId,
        token: &str,
        expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE participant_registry SET
                invitation_count = invitation_count
                    + CASE WHEN onboarding_status = 'N' THEN 1 ELSE 0 END,
                onboarding_status = CASE WHEN onboarding_status = 'N' THEN 'I'
                                         ELSE onboarding_status END,
                enrollment_token = $2,
                enrollment_token_expires_at = $3,
                invitation_date = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bulk re-enable registry entries of a site: status back to `N`,
    /// `disabled_date` cleared.
    pub async fn mark_new_batch(
        pool: &PgPool,
        site_id: DbId,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE participant_registry SET onboarding_status = 'N', disabled_date = NULL
             WHERE site_id = $1 AND id = ANY($2)",
        )
        .bind(site_id)
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Bulk move registry entries of a site to `I`. Status-only edit: no
    /// token, no invitation date, no email.
    pub async fn mark_invited_batch(
        pool: &PgPool,
        site_id: DbId,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE participant_registry SET onboarding_status = 'I'
             WHERE site_id = $1 AND id = ANY($2)",
        )
        .bind(site_id)
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Bulk move registry entries of a site to `E`. Status-only edit.
    pub async fn mark_enrolled_batch(
        pool: &PgPool,
        site_id: DbId,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE participant_registry SET onboarding_status = 'E'
             WHERE site_id = $1 AND id = ANY($2)",
        )
        .bind(site_id)
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Bulk disable registry entries of a site: stamp `disabled_date` and
    /// void the enrollment token.
    pub async fn mark_disabled_batch(
        pool: &PgPool,
        site_id: DbId,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE participant_registry SET onboarding_status = 'D',
                disabled_date = NOW(), enrollment_token = NULL
             WHERE site_id = $1 AND id = ANY($2)",
        )
        .bind(site_id)
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Of the given addresses, return those already registered in the
    /// study.
    pub async fn existing_emails_for_study(
        pool: &PgPool,
        study_id: DbId,
        emails: &[String],
    ) -> Result<Vec<String>, sqlx::Error> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar(
            "SELECT email FROM participant_registry WHERE study_id = $1 AND email = ANY($2)",
        )
        .bind(study_id)
        .bind(emails)
        .fetch_all(pool)
        .await
    }

    /// Insert one registry entry per email in a single multi-row
    /// statement, returning the created rows.
    pub async fn import_batch(
        pool: &PgPool,
        study_id: DbId,
        site_id: DbId,
        emails: &[String],
        created_by: DbId,
    ) -> Result<Vec<ParticipantRegistry>, sqlx::Error> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }
        let mut query =
            String::from("INSERT INTO participant_registry (study_id, site_id, email, created_by) VALUES ");
        let mut param = 1u32;
        for i in 0..emails.len() {
            if i > 0 {
                query.push_str(", ");
            }
            query.push_str(&format!(
                "(${}, ${}, ${}, ${})",
                param,
                param + 1,
                param + 2,
                param + 3
            ));
            param += 4;
        }
        query.push_str(&format!(" RETURNING {REGISTRY_COLUMNS}"));
        let mut insert = sqlx::query_as::<_, ParticipantRegistry>(&query);
        for email in emails {
            insert = insert
                .bind(study_id)
                .bind(site_id)
                .bind(email)
                .bind(created_by);
        }
        insert.fetch_all(pool).await
    }

    /// Count enrollment rows of a study that block its sites from being
    /// decommissioned (status `enrolled` or `active`). Scoped to the study,
    /// not the site, matching the historical decommission guard.
    pub async fn enrolled_or_active_count(
        pool: &PgPool,
        study_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM participant_studies
             WHERE study_id = $1 AND status IN ('enrolled', 'active')",
        )
        .bind(study_id)
        .fetch_one(pool)
        .await
    }

    /// Decommission cascade: force the registry entries of the site's
    /// `yetToJoin` enrollments to onboarding status `D`. Enrollment rows
    /// themselves are left untouched.
    pub async fn disable_yet_to_join(pool: &PgPool, site_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE participant_registry SET onboarding_status = 'D'
             WHERE id IN (SELECT participant_registry_id FROM participant_studies
                          WHERE site_id = $1 AND status = 'yetToJoin')",
        )
        .bind(site_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Insert an enrollment record, returning the created row.
    pub async fn create_enrollment(
        pool: &PgPool,
        input: &NewParticipantStudy,
    ) -> Result<ParticipantStudy, sqlx::Error> {
        let query = format!(
            "INSERT INTO participant_studies \
             (participant_registry_id, study_id, site_id, status, enrolled_at, withdrawn_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {STUDY_ROW_COLUMNS}"
        );
        sqlx::query_as::<_, ParticipantStudy>(&query)
            .bind(input.participant_registry_id)
            .bind(input.study_id)
            .bind(input.site_id)
            .bind(&input.status)
            .bind(input.enrolled_at)
            .bind(input.withdrawn_at)
            .fetch_one(pool)
            .await
    }

    /// List the enrollment history of a registry entry, oldest first.
    pub async fn enrollments_for_registry(
        pool: &PgPool,
        participant_registry_id: DbId,
    ) -> Result<Vec<ParticipantStudy>, sqlx::Error> {
        let query = format!(
            "SELECT {STUDY_ROW_COLUMNS} FROM participant_studies
             WHERE participant_registry_id = $1
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, ParticipantStudy>(&query)
            .bind(participant_registry_id)
            .fetch_all(pool)
            .await
    }

    /// All enrollment records tied to a site, oldest first per registry entry.
    pub async fn enrollments_by_site(
        pool: &PgPool,
        site_id: DbId,
    ) -> Result<Vec<ParticipantStudy>, sqlx::Error> {
        let query = format!(
            "SELECT {STUDY_ROW_COLUMNS} FROM participant_studies
             WHERE site_id = $1
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, ParticipantStudy>(&query)
            .bind(site_id)
            .fetch_all(pool)
            .await
    }
}
