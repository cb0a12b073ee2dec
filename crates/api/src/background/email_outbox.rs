//! Outbox delivery of account emails.
//!
//! Polls the `email_tasks` table on a fixed interval and delivers each
//! Pending task through the shared mailer. The claim UPDATE is the only
//! concurrency control, so several instances can poll the same table;
//! delivery is at-least-once.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use studygate_core::templates::render_template;
use studygate_db::models::{AdminUser, EmailTask, EmailTaskKind};
use studygate_db::repositories::{AdminUserRepo, EmailTaskRepo};
use studygate_events::{EmailMessage, EmailOutcome, EmailSender};

use crate::config::ServerConfig;

/// How many Pending tasks one tick takes on.
const DELIVERY_BATCH: i64 = 20;

const ACCOUNT_CREATED_SUBJECT: &str = "Your {org name} account has been created";
const ACCOUNT_CREATED_BODY: &str = "Hi {first name},\n\n\
An account has been created for you on the {org name} participant manager.\n\
Set up your account here: {activation link}\n\n\
For questions, contact {contact email address}.";

const ACCOUNT_UPDATED_SUBJECT: &str = "Your {org name} account has been updated";
const ACCOUNT_UPDATED_BODY: &str = "Hi {first name},\n\n\
Your {org name} participant manager account and its permissions were updated.\n\n\
For questions, contact {contact email address}.";

/// Run the outbox delivery loop until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    config: Arc<ServerConfig>,
    mailer: Arc<dyn EmailSender>,
    cancel: CancellationToken,
) {
    tracing::info!(
        poll_secs = config.email_outbox_poll_secs,
        "Email outbox scheduler started"
    );

    let mut interval =
        tokio::time::interval(Duration::from_secs(config.email_outbox_poll_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Email outbox scheduler stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = deliver_pending(&pool, &config, mailer.as_ref()).await {
                    tracing::error!(error = %e, "Email outbox: delivery pass failed");
                }
            }
        }
    }
}

/// One delivery pass over the Pending batch.
async fn deliver_pending(
    pool: &PgPool,
    config: &ServerConfig,
    mailer: &dyn EmailSender,
) -> Result<(), sqlx::Error> {
    let tasks = EmailTaskRepo::list_pending(pool, DELIVERY_BATCH).await?;
    for task in tasks {
        // Another instance may have taken it since the listing.
        if !EmailTaskRepo::claim(pool, task.id).await? {
            continue;
        }

        let Some(user) = AdminUserRepo::find_by_id(pool, task.admin_user_id).await? else {
            tracing::warn!(
                task_id = task.id,
                admin_user_id = task.admin_user_id,
                "Email outbox: admin vanished, dropping task"
            );
            EmailTaskRepo::delete(pool, task.id).await?;
            continue;
        };

        let message = match build_message(&task, &user, config) {
            Ok(message) => message,
            Err(reason) => {
                tracing::error!(task_id = task.id, %reason, "Email outbox: task not renderable, dropping");
                EmailTaskRepo::delete(pool, task.id).await?;
                continue;
            }
        };

        match mailer.send(&message).await {
            EmailOutcome::Accepted => {
                EmailTaskRepo::delete(pool, task.id).await?;
                tracing::info!(task_id = task.id, kind = %task.kind, "Email outbox: delivered");
            }
            EmailOutcome::Failed { reason } => {
                EmailTaskRepo::release(pool, task.id).await?;
                tracing::warn!(task_id = task.id, %reason, "Email outbox: send failed, released for retry");
            }
        }
    }
    Ok(())
}

/// Render the account email for one task. The created email carries the
/// activation link built from the portal URL and the security code.
fn build_message(
    task: &EmailTask,
    user: &AdminUser,
    config: &ServerConfig,
) -> Result<EmailMessage, String> {
    let kind = task.task_kind().map_err(|e| e.to_string())?;
    let (subject_template, body_template) = match kind {
        EmailTaskKind::AccountCreated => (ACCOUNT_CREATED_SUBJECT, ACCOUNT_CREATED_BODY),
        EmailTaskKind::AccountUpdated => (ACCOUNT_UPDATED_SUBJECT, ACCOUNT_UPDATED_BODY),
    };

    let activation_link = match kind {
        EmailTaskKind::AccountCreated => {
            let code = user.security_code.as_deref().ok_or_else(|| {
                format!("admin {} has no security code for the activation link", user.id)
            })?;
            format!(
                "{}/set-up-account/{}",
                config.admin_portal_url.trim_end_matches('/'),
                code
            )
        }
        EmailTaskKind::AccountUpdated => String::new(),
    };

    let args = [
        ("first name", user.first_name.as_str()),
        ("org name", config.org_name.as_str()),
        ("activation link", activation_link.as_str()),
        ("contact email address", config.contact_email.as_str()),
    ];

    Ok(EmailMessage {
        to: user.email.clone(),
        subject: render_template(subject_template, &args),
        body: render_template(body_template, &args),
    })
}
