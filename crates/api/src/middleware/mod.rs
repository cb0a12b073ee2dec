//! Request extractors shared across handlers.
//!
//! - [`caller::Caller`] -- Resolves the `userId` request header to an admin
//!   user row, rejecting requests with a missing, malformed or unknown id.

pub mod caller;
