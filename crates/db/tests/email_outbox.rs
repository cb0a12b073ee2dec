//! Integration tests for the account-email outbox.
//!
//! The claim/release/delete cycle is the delivery lease: a task may be
//! claimed by exactly one poller, returns to pending after a failed send
//! and disappears after a successful one.

use sqlx::PgPool;
use studygate_db::models::email_task::{EmailTaskKind, TASK_CLAIMED, TASK_PENDING};
use studygate_db::repositories::EmailTaskRepo;

async fn seed_admin(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO admin_users (email, first_name, last_name, super_admin, status)
         VALUES ($1, 'Seed', 'Admin', TRUE, 1)
         RETURNING id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_enqueue_and_list_pending_oldest_first(pool: PgPool) {
    let admin = seed_admin(&pool, "outbox@example.com").await;

    let first = EmailTaskRepo::enqueue(&pool, admin, EmailTaskKind::AccountCreated)
        .await
        .unwrap();
    assert_eq!(first.status, TASK_PENDING);
    assert_eq!(first.attempts, 0);
    assert_eq!(first.task_kind().unwrap(), EmailTaskKind::AccountCreated);
    let second = EmailTaskRepo::enqueue(&pool, admin, EmailTaskKind::AccountUpdated)
        .await
        .unwrap();

    let pending = EmailTaskRepo::list_pending(&pool, 10).await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].id, first.id);
    assert_eq!(pending[1].id, second.id);

    let bounded = EmailTaskRepo::list_pending(&pool, 1).await.unwrap();
    assert_eq!(bounded.len(), 1);
    assert_eq!(bounded[0].id, first.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_claim_is_exclusive_until_released(pool: PgPool) {
    let admin = seed_admin(&pool, "outbox@example.com").await;
    let task = EmailTaskRepo::enqueue(&pool, admin, EmailTaskKind::AccountCreated)
        .await
        .unwrap();

    assert!(EmailTaskRepo::claim(&pool, task.id).await.unwrap());
    // Second claimant loses.
    assert!(!EmailTaskRepo::claim(&pool, task.id).await.unwrap());

    let (status, attempts): (i16, i32) =
        sqlx::query_as("SELECT status, attempts FROM email_tasks WHERE id = $1")
            .bind(task.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, TASK_CLAIMED);
    assert_eq!(attempts, 1);
    assert!(EmailTaskRepo::list_pending(&pool, 10).await.unwrap().is_empty());

    // A failed send releases the task; the next pass claims it again.
    assert!(EmailTaskRepo::release(&pool, task.id).await.unwrap());
    assert_eq!(EmailTaskRepo::list_pending(&pool, 10).await.unwrap().len(), 1);
    assert!(EmailTaskRepo::claim(&pool, task.id).await.unwrap());
    let (_, attempts): (i16, i32) =
        sqlx::query_as("SELECT status, attempts FROM email_tasks WHERE id = $1")
            .bind(task.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(attempts, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_after_delivery(pool: PgPool) {
    let admin = seed_admin(&pool, "outbox@example.com").await;
    let task = EmailTaskRepo::enqueue(&pool, admin, EmailTaskKind::AccountUpdated)
        .await
        .unwrap();
    EmailTaskRepo::claim(&pool, task.id).await.unwrap();

    assert!(EmailTaskRepo::delete(&pool, task.id).await.unwrap());
    assert!(!EmailTaskRepo::delete(&pool, task.id).await.unwrap());
    assert!(EmailTaskRepo::list_pending(&pool, 10).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tasks_vanish_with_their_admin(pool: PgPool) {
    let admin = seed_admin(&pool, "doomed@example.com").await;
    EmailTaskRepo::enqueue(&pool, admin, EmailTaskKind::AccountCreated)
        .await
        .unwrap();

    sqlx::query("DELETE FROM admin_users WHERE id = $1")
        .bind(admin)
        .execute(&pool)
        .await
        .unwrap();
    assert!(EmailTaskRepo::list_pending(&pool, 10).await.unwrap().is_empty());
}
