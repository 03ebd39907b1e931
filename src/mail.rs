//! Outbound email.
//!
//! The server only needs "send this HTML to that address". Delivery is behind
//! the `Mailer` trait: `SmtpMailer` sends for real, `LogMailer` only logs, and
//! tests record messages with `MemoryMailer`.

use std::sync::Mutex;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
    #[error("invalid mail configuration: {0}")]
    Config(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

/// Writes every message to the log instead of delivering it.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        info!(to = %to, subject = %subject, body = %html, "Outgoing email");
        Ok(())
    }
}

/// Transport security for the SMTP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    /// Plain connection upgraded with STARTTLS
    StartTls,
    /// TLS from the first byte (usually port 465)
    Tls,
    /// No encryption. Local relays only.
    None,
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub tls: SmtpTls,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address, e.g. `Rolegate <no-reply@example.com>`
    pub from: String,
}

/// Delivers mail through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the transport. No connection is made until the first send.
    pub fn new(settings: SmtpSettings) -> Result<Self, MailError> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| MailError::Config(format!("sender address: {e}")))?;

        let builder = match settings.tls {
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|e| MailError::Config(e.to_string()))?,
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .map_err(|e| MailError::Config(e.to_string()))?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host),
        };
        let mut builder = builder.port(settings.port);
        if let Some(username) = settings.username {
            builder = builder.credentials(Credentials::new(
                username,
                settings.password.unwrap_or_default(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| MailError::Delivery(format!("recipient address: {e}")))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        debug!(code = %response.code(), "SMTP relay accepted message");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Keeps sent messages in memory. Can be switched to fail every send.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: Mutex<bool>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut f) = self.failing.lock() {
            *f = failing;
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_to(&self, to: &str) -> Option<SentMail> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        if self.failing.lock().map(|f| *f).unwrap_or(false) {
            return Err(MailError::Delivery("mailer configured to fail".into()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                html: html.to_string(),
            });
        }
        Ok(())
    }
}

pub const ACTIVATION_SUBJECT: &str = "Activate your account";
pub const RESET_SUBJECT: &str = "Reset your password";

pub fn activation_html(link: &str) -> String {
    format!(
        "<h1>Welcome!</h1>\n\
         <p>To activate your account follow the link:</p>\n\
         <a href=\"{link}\">{link}</a>\n\
         <p>The link is valid for 24 hours.</p>"
    )
}

pub fn reset_html(link: &str) -> String {
    format!(
        "<h1>Password Reset</h1>\n\
         <p>Click the link to reset your password (valid for 24 hours):</p>\n\
         <a href=\"{link}\">{link}</a>"
    )
}
