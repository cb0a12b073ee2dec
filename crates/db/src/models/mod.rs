//! Entity structs and input DTOs for the study management schema.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - Plain input structs for inserts and partial updates
//! - Typed accessors converting raw status columns into core enums;
//!   an unknown stored value is reported as [`CoreError::Internal`]
//!   rather than panicking
//!
//! [`CoreError::Internal`]: studygate_core::CoreError::Internal

pub mod admin_user;
pub mod app;
pub mod audit;
pub mod email_task;
pub mod location;
pub mod participant;
pub mod permission;
pub mod site;
pub mod study;

pub use admin_user::{AdminUser, NewAdminUser, UpdateAdminUser};
pub use app::{App, NewApp};
pub use audit::{AuditEvent, NewAuditEvent};
pub use email_task::{EmailTask, EmailTaskKind, TASK_CLAIMED, TASK_PENDING};
pub use location::{Location, LocationWithStudies, NewLocation, UpdateLocation};
pub use participant::{NewParticipant, NewParticipantStudy, ParticipantRegistry, ParticipantStudy};
pub use permission::{
    AdminPermissionSet, AppPermission, AppPermissionEntry, SitePermission, SitePermissionEntry,
    StudyPermission, StudyPermissionEntry,
};
pub use site::{NewSite, Site, SiteContext, SiteCount, SiteOverview};
pub use study::{NewStudy, Study, StudyWithApp};
