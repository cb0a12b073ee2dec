//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod admin_user_repo;
pub mod app_repo;
pub mod audit_repo;
pub mod email_task_repo;
pub mod location_repo;
pub mod participant_repo;
pub mod permission_repo;
pub mod site_repo;
pub mod study_repo;

pub use admin_user_repo::AdminUserRepo;
pub use app_repo::AppRepo;
pub use audit_repo::AuditRepo;
pub use email_task_repo::EmailTaskRepo;
pub use location_repo::LocationRepo;
pub use participant_repo::ParticipantRepo;
pub use permission_repo::PermissionRepo;
pub use site_repo::SiteRepo;
pub use study_repo::StudyRepo;
