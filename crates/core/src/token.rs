//! Random token generation for enrollment and account activation.

use rand::Rng;

/// Length of a participant enrollment token (alphanumeric characters).
pub const ENROLLMENT_TOKEN_LENGTH: usize = 8;

/// Length of an admin account security code (alphanumeric characters).
pub const SECURITY_CODE_LENGTH: usize = 32;

fn random_alphanumeric(length: usize) -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Generate the token a participant presents when enrolling into a close
/// study. Mixed-case alphanumeric, [`ENROLLMENT_TOKEN_LENGTH`] characters.
pub fn generate_enrollment_token() -> String {
    random_alphanumeric(ENROLLMENT_TOKEN_LENGTH)
}

/// Generate the one-time security code embedded in an admin's account
/// activation link. Mixed-case alphanumeric, [`SECURITY_CODE_LENGTH`]
/// characters.
pub fn generate_security_code() -> String {
    random_alphanumeric(SECURITY_CODE_LENGTH)
}
