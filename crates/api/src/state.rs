use std::sync::Arc;

use studygate_events::{AuditRecorder, EmailSender};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: studygate_db::DbPool,
    /// Server configuration (permission policy, email templates, timeouts).
    pub config: Arc<ServerConfig>,
    /// Outgoing email transport. `NoopSender` when SMTP is not configured.
    pub mailer: Arc<dyn EmailSender>,
    /// Broadcast handle for enrollment audit events.
    pub recorder: Arc<AuditRecorder>,
}
