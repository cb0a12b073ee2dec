//! Outbox entity model for account emails.

use sqlx::FromRow;
use studygate_core::error::CoreError;
use studygate_core::types::{DbId, Timestamp};

/// Outbox task status: waiting to be delivered.
pub const TASK_PENDING: i16 = 0;

/// Outbox task status: claimed by a delivery pass.
pub const TASK_CLAIMED: i16 = 1;

/// Which account email a task delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTaskKind {
    AccountCreated,
    AccountUpdated,
}

impl EmailTaskKind {
    /// Return the persisted value.
    pub fn as_str(self) -> &'static str {
        match self {
            EmailTaskKind::AccountCreated => "account_created",
            EmailTaskKind::AccountUpdated => "account_updated",
        }
    }

    /// Look up a kind by its persisted value.
    pub fn parse(value: &str) -> Option<EmailTaskKind> {
        match value {
            "account_created" => Some(EmailTaskKind::AccountCreated),
            "account_updated" => Some(EmailTaskKind::AccountUpdated),
            _ => None,
        }
    }
}

/// Row from the `email_tasks` table.
#[derive(Debug, Clone, FromRow)]
pub struct EmailTask {
    pub id: DbId,
    pub admin_user_id: DbId,
    pub kind: String,
    pub status: i16,
    pub attempts: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EmailTask {
    /// Typed view of the raw `kind` column.
    pub fn task_kind(&self) -> Result<EmailTaskKind, CoreError> {
        EmailTaskKind::parse(&self.kind).ok_or_else(|| {
            CoreError::Internal(format!(
                "email task {} has unknown kind {:?}",
                self.id, self.kind
            ))
        })
    }
}
