//! Email delivery via SMTP, behind a swappable sender seam.
//!
//! Handlers talk to [`EmailSender`] only; production wires in
//! [`SmtpSender`] over the `lettre` async transport, and deployments
//! without SMTP configured fall back to [`NoopSender`]. Configuration is
//! loaded from environment variables; if `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None`.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

// ---------------------------------------------------------------------------
// Message and outcome
// ---------------------------------------------------------------------------

/// A plain-text email ready for delivery.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// What became of one delivery attempt.
///
/// `Accepted` means the relay took the message, not that it reached the
/// recipient; that is as much as SMTP can promise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailOutcome {
    Accepted,
    Failed { reason: String },
}

impl EmailOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, EmailOutcome::Accepted)
    }
}

/// Delivery seam between handlers and the SMTP transport.
///
/// A failed send is reported through [`EmailOutcome`], never an `Err`:
/// callers decide per recipient how a failure affects their operation.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> EmailOutcome;
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failure constructing the SMTP transport.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `FROM_EMAIL` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@studygate.local";

/// Configuration for the SMTP sender.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and the no-op sender should be used.
    ///
    /// | Variable        | Required | Default                    |
    /// |-----------------|----------|----------------------------|
    /// | `SMTP_HOST`     | yes      | —                          |
    /// | `SMTP_PORT`     | no       | `587`                      |
    /// | `FROM_EMAIL`    | no       | `noreply@studygate.local`  |
    /// | `SMTP_USER`     | no       | —                          |
    /// | `SMTP_PASSWORD` | no       | —                          |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("FROM_EMAIL")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// SmtpSender
// ---------------------------------------------------------------------------

/// Sends email over an async STARTTLS SMTP connection.
pub struct SmtpSender {
    from_address: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSender {
    /// Build the transport for the given configuration.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            from_address: config.from_address.clone(),
            transport: builder.build(),
        })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, String> {
        let from: Mailbox = self.from_address.parse().map_err(|e| format!("{e}"))?;
        let to: Mailbox = message.to.parse().map_err(|e| format!("{e}"))?;
        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, message: &EmailMessage) -> EmailOutcome {
        let email = match self.build_message(message) {
            Ok(email) => email,
            Err(reason) => {
                tracing::warn!(to = %message.to, %reason, "Could not assemble email");
                return EmailOutcome::Failed { reason };
            }
        };
        match self.transport.send(email).await {
            Ok(_) => {
                tracing::info!(to = %message.to, subject = %message.subject, "Email accepted for delivery");
                EmailOutcome::Accepted
            }
            Err(e) => {
                tracing::warn!(to = %message.to, error = %e, "Email send failed");
                EmailOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// NoopSender
// ---------------------------------------------------------------------------

/// Stand-in used when SMTP is not configured. Logs each message and
/// reports acceptance so onboarding flows still proceed in development
/// deployments.
pub struct NoopSender;

#[async_trait]
impl EmailSender for NoopSender {
    async fn send(&self, message: &EmailMessage) -> EmailOutcome {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "SMTP not configured, dropping email"
        );
        EmailOutcome::Accepted
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
