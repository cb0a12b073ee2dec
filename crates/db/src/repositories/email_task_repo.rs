//! Repository for the `email_tasks` outbox table.

use sqlx::PgPool;
use studygate_core::types::DbId;

use crate::models::email_task::{EmailTask, EmailTaskKind, TASK_PENDING};

const COLUMNS: &str = "id, admin_user_id, kind, status, attempts, created_at, updated_at";

/// Provides the outbox operations for account emails.
pub struct EmailTaskRepo;

impl EmailTaskRepo {
    /// Enqueue an account email for an admin. Tasks start Pending.
    pub async fn enqueue(
        pool: &PgPool,
        admin_user_id: DbId,
        kind: EmailTaskKind,
    ) -> Result<EmailTask, sqlx::Error> {
        let query = format!(
            "INSERT INTO email_tasks (admin_user_id, kind)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailTask>(&query)
            .bind(admin_user_id)
            .bind(kind.as_str())
            .fetch_one(pool)
            .await
    }

    /// List Pending tasks, oldest first, bounded to one delivery batch.
    pub async fn list_pending(pool: &PgPool, limit: i64) -> Result<Vec<EmailTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM email_tasks
             WHERE status = $1
             ORDER BY created_at, id
             LIMIT $2"
        );
        sqlx::query_as::<_, EmailTask>(&query)
            .bind(TASK_PENDING)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Claim a Pending task for delivery. The conditional update is the
    /// lease: it succeeds for exactly one caller even with several
    /// instances polling the same table.
    ///
    /// Returns `true` if this caller now holds the task.
    pub async fn claim(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE email_tasks SET status = 1, attempts = attempts + 1
             WHERE id = $1 AND status = 0",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Release a claimed task back to Pending after a failed send, making
    /// it claimable by a later tick.
    pub async fn release(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE email_tasks SET status = 0 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a task after a successful send (or for a vanished admin).
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM email_tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
