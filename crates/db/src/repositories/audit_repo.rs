//! Repository for the append-only `audit_events` table.

use sqlx::PgPool;

use crate::models::audit::{AuditEvent, NewAuditEvent};

const COLUMNS: &str = "id, event_name, user_id, app_id, study_id, site_id, participant_id, \
                       description, occurred_at";

/// Provides inserts and reads over the audit trail. There is no update:
/// rows are immutable once written.
pub struct AuditRepo;

impl AuditRepo {
    /// Append one audit event, returning the stored row.
    pub async fn insert(pool: &PgPool, input: &NewAuditEvent) -> Result<AuditEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_events \
             (event_name, user_id, app_id, study_id, site_id, participant_id, description)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditEvent>(&query)
            .bind(&input.event_name)
            .bind(input.user_id)
            .bind(input.app_id)
            .bind(input.study_id)
            .bind(input.site_id)
            .bind(input.participant_id)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// List the most recent events, newest first.
    pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<AuditEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audit_events ORDER BY id DESC LIMIT $1");
        sqlx::query_as::<_, AuditEvent>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// List every stored occurrence of one event name, oldest first.
    pub async fn list_by_event(
        pool: &PgPool,
        event_name: &str,
    ) -> Result<Vec<AuditEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audit_events WHERE event_name = $1 ORDER BY id");
        sqlx::query_as::<_, AuditEvent>(&query)
            .bind(event_name)
            .fetch_all(pool)
            .await
    }
}
