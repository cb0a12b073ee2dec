//! Audit trail entity model.

use sqlx::FromRow;
use studygate_core::types::{DbId, Timestamp};

/// Row from the append-only `audit_events` table. Rows are never updated
/// after insert.
#[derive(Debug, Clone, FromRow)]
pub struct AuditEvent {
    pub id: DbId,
    pub event_name: String,
    pub user_id: Option<DbId>,
    pub app_id: Option<DbId>,
    pub study_id: Option<DbId>,
    pub site_id: Option<DbId>,
    pub participant_id: Option<DbId>,
    pub description: String,
    pub occurred_at: Timestamp,
}

/// Input for appending one audit event. Scope ids are optional; an event
/// carries only the ids that apply to it.
#[derive(Debug, Clone, Default)]
pub struct NewAuditEvent {
    pub event_name: String,
    pub user_id: Option<DbId>,
    pub app_id: Option<DbId>,
    pub study_id: Option<DbId>,
    pub site_id: Option<DbId>,
    pub participant_id: Option<DbId>,
    pub description: String,
}
