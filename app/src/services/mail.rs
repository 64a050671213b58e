//! Outgoing notifications
//!
//! Controllers take the mailer as an optional collaborator: when no
//! [`Mailer`] is bound, notifications are skipped rather than failing the
//! request.

use press::injectable;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("could not send mail to {to}: {reason}")]
pub struct MailError {
    pub to: String,
    pub reason: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them
#[injectable]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        info!(to, subject, bytes = body.len(), "mail sent");
        Ok(())
    }
}
