//! Request handlers.
//!
//! Each submodule covers one resource of the participant manager. Handlers
//! run the operation's validation pipeline in a fixed order, delegate
//! persistence to the repositories in `studygate_db`, record audit events
//! through the shared [`AuditRecorder`](studygate_events::AuditRecorder)
//! after the mutation, and answer with the envelope types in
//! [`crate::response`] / [`crate::error`].

pub mod locations;
pub mod participants;
pub mod sites;
pub mod users;
