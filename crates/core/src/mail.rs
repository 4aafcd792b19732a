//! Delivery of generated books by e-mail.
//!
//! [`Mailer`] is the seam the [`Publisher`](crate::Publisher) sends through;
//! [`SmtpMailer`] is the real implementation, a STARTTLS relay login per
//! message.

use std::future::Future;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::Result;
use crate::config::MailAccount;

pub const SUBJECT_PREFIX: &str = "Convert: ";
pub const EPUB_MIME: &str = "application/epub+zip";

/// SMTP connection timeout in seconds.
pub const SMTP_TIMEOUT: u64 = 30;

/// A composed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub subject: String,
    pub body: String,
}

/// Subject and plain-text body announcing the book for `title`.
pub fn email_content(title: &str, source: &str, sent_at: DateTime<Local>) -> Envelope {
    Envelope {
        subject: format!("{SUBJECT_PREFIX}{title}"),
        body: format!("Article: {title}\nSource: {source}\nSent on: {}", sent_at.format("%Y-%m-%d %H:%M:%S")),
    }
}

/// Sends one message with one attachment.
pub trait Mailer {
    fn send(
        &self, account: &MailAccount, envelope: &Envelope, attachment: &Path,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Mailer backed by lettre's tokio SMTP transport.
#[cfg(feature = "email")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpMailer;

#[cfg(feature = "email")]
impl Mailer for SmtpMailer {
    async fn send(&self, account: &MailAccount, envelope: &Envelope, attachment: &Path) -> Result<()> {
        smtp::send_email(account, envelope, attachment).await
    }
}

#[cfg(feature = "email")]
mod smtp {
    use std::path::Path;
    use std::time::Duration;

    use lettre::message::header::ContentType;
    use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

    use super::{EPUB_MIME, Envelope, SMTP_TIMEOUT};
    use crate::config::MailAccount;
    use crate::{QuireError, Result};

    fn mail_error(e: impl std::fmt::Display) -> QuireError {
        QuireError::Mail(e.to_string())
    }

    fn mailbox(address: &str) -> Result<Mailbox> {
        address
            .parse()
            .map_err(|e| QuireError::ConfigError(format!("invalid e-mail address '{address}': {e}")))
    }

    pub(super) async fn send_email(account: &MailAccount, envelope: &Envelope, attachment: &Path) -> Result<()> {
        let bytes = std::fs::read(attachment)?;
        let file_name = attachment
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "article.epub".to_string());

        let content_type = ContentType::parse(EPUB_MIME).map_err(mail_error)?;

        let message = Message::builder()
            .from(mailbox(&account.from_email)?)
            .to(mailbox(&account.kindle_email)?)
            .subject(envelope.subject.as_str())
            .date_now()
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(envelope.body.clone()))
                    .singlepart(Attachment::new(file_name).body(bytes, content_type)),
            )
            .map_err(mail_error)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&account.smtp_server)
            .map_err(mail_error)?
            .port(account.smtp_port)
            .credentials(Credentials::new(account.from_email.clone(), account.password.clone()))
            .timeout(Some(Duration::from_secs(SMTP_TIMEOUT)))
            .build();

        tracing::info!(server = %account.smtp_server, port = account.smtp_port, "sending e-mail");
        transport.send(message).await.map_err(mail_error)?;

        Ok(())
    }
}
