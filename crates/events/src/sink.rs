//! Durable audit persistence.
//!
//! [`AuditSink`] subscribes to the [`AuditRecorder`](crate::bus::AuditRecorder)
//! broadcast channel and appends every received [`AuditEvent`] to the
//! `audit_events` table. It runs as a long-lived background task and shuts
//! down when the recorder is dropped.

use tokio::sync::broadcast;

use studygate_db::models::audit::NewAuditEvent;
use studygate_db::repositories::AuditRepo;
use studygate_db::DbPool;

use crate::audit::AuditEvent;

/// Background service that persists audit events to the database.
pub struct AuditSink;

impl AuditSink {
    /// Run the persistence loop.
    ///
    /// Persists every event received on `receiver`. A failed insert is
    /// logged and dropped; the trail is best-effort and never propagates
    /// back into request handling. The loop exits when the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<AuditEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let record = NewAuditEvent::from(event);
                    if let Err(e) = AuditRepo::insert(&pool, &record).await {
                        tracing::warn!(
                            error = %e,
                            event_name = %record.event_name,
                            "Failed to persist audit event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Audit sink lagged, events were not persisted");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Audit recorder closed, sink shutting down");
                    break;
                }
            }
        }
    }
}
