//! Integration tests for the email outbox delivery loop, driven with stub
//! mailers against a real `email_tasks` table.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{RecordingMailer, RejectingMailer};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use studygate_api::background::email_outbox;
use studygate_db::models::EmailTaskKind;
use studygate_db::repositories::EmailTaskRepo;
use studygate_events::EmailSender;

/// Spawn the delivery loop, give the immediate first tick time to run, then
/// stop it.
async fn run_one_pass(pool: PgPool, mailer: Arc<dyn EmailSender>) {
    let config = Arc::new(common::test_config());
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(email_outbox::run(pool, config, mailer, cancel.clone()));

    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel.cancel();
    handle.await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: delivery clears the task and carries the activation link
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn outbox_delivers_created_account_email_and_clears_task(pool: PgPool) {
    let admin = common::seed_admin(&pool, "invitee@studygate.local", 1).await;
    EmailTaskRepo::enqueue(&pool, admin.id, EmailTaskKind::AccountCreated)
        .await
        .unwrap();

    let mailer = Arc::new(RecordingMailer::default());
    run_one_pass(pool.clone(), mailer.clone()).await;

    {
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "invitee@studygate.local");
        assert_eq!(sent[0].subject, "Your StudyGate account has been created");
        // The seed helper stores the security code "seed-code".
        assert!(sent[0]
            .body
            .contains("http://localhost:4200/set-up-account/seed-code"));
    }

    let pending = EmailTaskRepo::list_pending(&pool, 10).await.unwrap();
    assert!(pending.is_empty());
}

// ---------------------------------------------------------------------------
// Test: a refused send goes back to Pending for the next tick
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn outbox_releases_failed_tasks_for_retry(pool: PgPool) {
    let admin = common::seed_admin(&pool, "unreached@studygate.local", 1).await;
    EmailTaskRepo::enqueue(&pool, admin.id, EmailTaskKind::AccountUpdated)
        .await
        .unwrap();

    run_one_pass(pool.clone(), Arc::new(RejectingMailer)).await;

    let pending = EmailTaskRepo::list_pending(&pool, 10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].admin_user_id, admin.id);
    assert!(pending[0].attempts >= 1);
}
