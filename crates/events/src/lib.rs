//! Audit trail and email delivery infrastructure.
//!
//! This crate provides the cross-cutting event plumbing of the portal:
//!
//! - [`AuditEvent`] — the canonical audit envelope, one variant kind per
//!   recorded operation.
//! - [`AuditRecorder`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`; recording never blocks a request.
//! - [`AuditSink`] — background service that durably writes every recorded
//!   event to the `audit_events` table.
//! - [`email`] — the [`EmailSender`] seam with an SMTP implementation and
//!   a no-op fallback for unconfigured deployments.

pub mod audit;
pub mod bus;
pub mod email;
pub mod sink;

pub use audit::{AuditEvent, AuditEventKind};
pub use bus::AuditRecorder;
pub use email::{EmailConfig, EmailMessage, EmailOutcome, EmailSender, NoopSender, SmtpSender};
pub use sink::AuditSink;
