use studygate_core::permissions::PermissionPolicy;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8081`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ALLOWED_ORIGINS`.
    pub cors_allowed_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long an enrollment token stays valid after an invitation,
    /// in hours (default: `48`).
    pub enrollment_token_expiry_hours: i64,
    /// How long the security code on a freshly created admin account stays
    /// valid, in days (default: `30`).
    pub security_code_expiry_days: i64,
    /// How often the account email outbox is polled, in seconds
    /// (default: `60`).
    pub email_outbox_poll_secs: u64,
    /// Legacy permission fallback: when an admin holds neither a study-level
    /// nor an app-level permission row for a site, site edits are allowed
    /// when this is `true` (default: `true`).
    pub missing_permission_defaults_to_allowed: bool,
    /// Organisation name substituted into outgoing emails.
    pub org_name: String,
    /// Support contact address substituted into outgoing emails.
    pub contact_email: String,
    /// Base URL of the admin portal, used to build account activation links.
    pub admin_portal_url: String,
    /// Subject template for participant invitation emails.
    pub invite_subject: String,
    /// Body template for participant invitation emails.
    pub invite_body: String,
}

/// Default subject for participant invitations.
const DEFAULT_INVITE_SUBJECT: &str = "You have been invited to join the {study name} study";

/// Default body for participant invitations. Placeholders are filled per
/// participant at send time.
const DEFAULT_INVITE_BODY: &str = "Hello,\n\n\
    You have been invited by {org name} to join the {study name} study.\n\
    Enter the enrollment token {enrolment token} in the study app to get started.\n\n\
    If you have any questions, contact us at {contact email address}.\n\n\
    Thank you.";

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                                  | Default                   |
    /// |------------------------------------------|---------------------------|
    /// | `HOST`                                   | `0.0.0.0`                 |
    /// | `PORT`                                   | `8081`                    |
    /// | `CORS_ALLOWED_ORIGINS`                   | `http://localhost:4200`   |
    /// | `REQUEST_TIMEOUT_SECS`                   | `30`                      |
    /// | `ENROLLMENT_TOKEN_EXPIRY_HOURS`          | `48`                      |
    /// | `SECURITY_CODE_EXPIRY_DAYS`              | `30`                      |
    /// | `EMAIL_OUTBOX_POLL_SECS`                 | `60`                      |
    /// | `MISSING_PERMISSION_DEFAULTS_TO_ALLOWED` | `true`                    |
    /// | `ORG_NAME`                               | `StudyGate`               |
    /// | `CONTACT_EMAIL`                          | `support@studygate.local` |
    /// | `ADMIN_PORTAL_URL`                       | `http://localhost:4200`   |
    /// | `PARTICIPANT_INVITE_SUBJECT`             | built-in template         |
    /// | `PARTICIPANT_INVITE_BODY`                | built-in template         |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8081".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_allowed_origins: Vec<String> = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:4200".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let enrollment_token_expiry_hours: i64 = std::env::var("ENROLLMENT_TOKEN_EXPIRY_HOURS")
            .unwrap_or_else(|_| "48".into())
            .parse()
            .expect("ENROLLMENT_TOKEN_EXPIRY_HOURS must be a valid i64");

        let security_code_expiry_days: i64 = std::env::var("SECURITY_CODE_EXPIRY_DAYS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SECURITY_CODE_EXPIRY_DAYS must be a valid i64");

        let email_outbox_poll_secs: u64 = std::env::var("EMAIL_OUTBOX_POLL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("EMAIL_OUTBOX_POLL_SECS must be a valid u64");

        let missing_permission_defaults_to_allowed: bool =
            std::env::var("MISSING_PERMISSION_DEFAULTS_TO_ALLOWED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .expect("MISSING_PERMISSION_DEFAULTS_TO_ALLOWED must be true or false");

        let org_name = std::env::var("ORG_NAME").unwrap_or_else(|_| "StudyGate".into());

        let contact_email =
            std::env::var("CONTACT_EMAIL").unwrap_or_else(|_| "support@studygate.local".into());

        let admin_portal_url =
            std::env::var("ADMIN_PORTAL_URL").unwrap_or_else(|_| "http://localhost:4200".into());

        let invite_subject = std::env::var("PARTICIPANT_INVITE_SUBJECT")
            .unwrap_or_else(|_| DEFAULT_INVITE_SUBJECT.into());

        let invite_body = std::env::var("PARTICIPANT_INVITE_BODY")
            .unwrap_or_else(|_| DEFAULT_INVITE_BODY.into());

        Self {
            host,
            port,
            cors_allowed_origins,
            request_timeout_secs,
            enrollment_token_expiry_hours,
            security_code_expiry_days,
            email_outbox_poll_secs,
            missing_permission_defaults_to_allowed,
            org_name,
            contact_email,
            admin_portal_url,
            invite_subject,
            invite_body,
        }
    }

    /// Permission evaluation policy derived from this configuration.
    pub fn permission_policy(&self) -> PermissionPolicy {
        PermissionPolicy {
            missing_permission_defaults_to_allowed: self.missing_permission_defaults_to_allowed,
        }
    }
}
