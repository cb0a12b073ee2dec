//! Domain rules for study, site and participant management.
//!
//! Everything in this crate is pure and pool-free: wire code registries,
//! permission set math, lifecycle statuses, enrollment arithmetic, token
//! generation, import-sheet parsing and email template substitution. The
//! database and HTTP layers build on these rules without this crate knowing
//! about either.

pub mod codes;
pub mod enrollment;
pub mod error;
pub mod import;
pub mod onboarding;
pub mod permissions;
pub mod status;
pub mod templates;
pub mod token;
pub mod types;

pub use codes::{ErrorCode, ErrorInfo, MessageCode, MessageInfo};
pub use error::CoreError;
pub use types::{DbId, Timestamp};
