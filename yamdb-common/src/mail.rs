//! Mail collaborator for confirmation codes
//!
//! Delivery transport is outside this service; the backends here either log
//! the message or drop it into a directory for a relay to pick up. Sending is
//! synchronous and a failure is returned to the caller.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::messages::{MessageKey, Messages};
use crate::{Error, Result};

/// Confirmation code message ready to dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationMail {
    pub to: String,
    pub code: i64,
    pub subject: String,
    pub body: String,
}

impl ConfirmationMail {
    pub fn new(messages: &Messages, to: &str, code: i64) -> Self {
        Self {
            to: to.to_string(),
            code,
            subject: messages.get(MessageKey::MailSubject).to_string(),
            body: messages.render(MessageKey::MailBody, &[("code", &code.to_string())]),
        }
    }
}

pub trait Mailer: Send + Sync {
    fn send(&self, mail: &ConfirmationMail) -> Result<()>;
}

/// Writes each message to the log
#[derive(Debug, Clone)]
pub struct LogMailer {
    pub from: String,
}

impl Mailer for LogMailer {
    fn send(&self, mail: &ConfirmationMail) -> Result<()> {
        info!(
            from = %self.from,
            to = %mail.to,
            subject = %mail.subject,
            "Confirmation mail: {}",
            mail.body
        );
        Ok(())
    }
}

/// Writes each message as a file into an outbox directory
#[derive(Debug)]
pub struct FileMailer {
    pub from: String,
    pub dir: PathBuf,
    sequence: AtomicU64,
}

impl FileMailer {
    pub fn new(from: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            dir: dir.into(),
            sequence: AtomicU64::new(0),
        }
    }
}

impl Mailer for FileMailer {
    fn send(&self, mail: &ConfirmationMail) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Mail(format!("Cannot create outbox {}: {}", self.dir.display(), e)))?;

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let file_name = format!("{}-{}.eml", Utc::now().format("%Y%m%d-%H%M%S%.6f"), seq);
        let path = self.dir.join(file_name);

        let mut content = String::new();
        // Writing to a String cannot fail
        let _ = write!(
            content,
            "From: {}\nTo: {}\nSubject: {}\n\n{}\n",
            self.from, mail.to, mail.subject, mail.body
        );

        std::fs::write(&path, content)
            .map_err(|e| Error::Mail(format!("Cannot write {}: {}", path.display(), e)))?;

        info!("Queued confirmation mail for {} at {}", mail.to, path.display());
        Ok(())
    }
}

/// Mail backend selected in the bootstrap config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailBackend {
    #[default]
    Log,
    File,
}
