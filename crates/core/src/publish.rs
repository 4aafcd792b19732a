//! What can be done with an extracted article: print it, package it, or send
//! the package to a reading device.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::article::ExtractedArticle;
use crate::config::Settings;
use crate::epub::write_epub;
use crate::library::mark_sent;
#[cfg(feature = "email")]
use crate::mail::SmtpMailer;
use crate::mail::{Mailer, email_content};
use crate::{QuireError, Result};

pub const PRINT_HEADER: &str = "=== Extracted Article ===";
pub const PRINT_FOOTER: &str = "=== End of Article ===";

/// Plain-text rendering used for console output.
pub fn render_text(article: &ExtractedArticle) -> String {
    let mut out = String::new();
    out.push_str(PRINT_HEADER);
    out.push_str("\n\n");
    out.push_str(&format!("Title: {}\n", article.title));
    if let Some(author) = &article.author {
        out.push_str(&format!("Author: {}\n", author));
    }
    out.push_str(&format!("Source: {}\n\n", article.source_reference));
    out.push_str(&article.body);
    out.push_str("\n\n");
    out.push_str(PRINT_FOOTER);
    out
}

/// Result of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipient: String,
    /// New name of the source file, when one was renamed.
    pub marked_file: Option<PathBuf>,
}

pub struct Publisher<M> {
    settings: Settings,
    mailer: M,
}

#[cfg(feature = "email")]
impl Publisher<SmtpMailer> {
    pub fn new(settings: Settings) -> Self {
        Self::with_mailer(settings, SmtpMailer)
    }
}

impl<M: Mailer> Publisher<M> {
    pub fn with_mailer(settings: Settings, mailer: M) -> Self {
        Self { settings, mailer }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Writes the book into `output_dir`, or the configured directory.
    pub fn create_epub(&self, article: &ExtractedArticle, output_dir: Option<&Path>) -> Result<PathBuf> {
        let dir = match output_dir {
            Some(dir) => dir,
            None => self.settings.epub_dir()?,
        };
        write_epub(article, dir)
    }

    /// Packages `article` and mails it to the configured device.
    ///
    /// E-mail settings are checked before anything is written. After a
    /// successful send the book is deleted and `source_file`, if any, is
    /// renamed with the sent prefix; neither cleanup step can fail the
    /// delivery. After a failed send the book is kept and its path is part
    /// of the error.
    pub async fn send_to_device(&self, article: &ExtractedArticle, source_file: Option<&Path>) -> Result<Delivery> {
        let account = self.settings.require_email()?;
        let epub = self.create_epub(article, None)?;
        let envelope = email_content(&article.title, &article.source_reference, Local::now());

        if let Err(e) = self.mailer.send(&account, &envelope, &epub).await {
            let reason = match e {
                QuireError::Mail(reason) => reason,
                other => other.to_string(),
            };
            tracing::warn!(path = %epub.display(), "delivery failed, ePub kept");
            return Err(QuireError::Mail(format!("{reason} (ePub kept at {})", epub.display())));
        }

        tracing::info!(to = %account.kindle_email, "article delivered");

        if let Err(e) = fs::remove_file(&epub) {
            tracing::warn!(path = %epub.display(), error = %e, "could not remove delivered ePub");
        }

        let marked_file = source_file.and_then(|path| match mark_sent(path) {
            Ok(renamed) => Some(renamed),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not mark source file as sent");
                None
            }
        });

        Ok(Delivery { recipient: account.kindle_email, marked_file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EMAIL_PASSWORD, EPUB_OUTPUT_DIR, FROM_EMAIL, KINDLE_EMAIL, MailAccount};
    use crate::mail::Envelope;
    use std::sync::Mutex;

    /// Records what would have been sent.
    #[derive(Default)]
    struct RecordingMailer {
        fail: bool,
        sent: Mutex<Vec<(Envelope, PathBuf, bool)>>,
    }

    impl Mailer for RecordingMailer {
        async fn send(&self, _account: &MailAccount, envelope: &Envelope, attachment: &Path) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((envelope.clone(), attachment.to_path_buf(), attachment.exists()));
            if self.fail { Err(QuireError::Mail("relay said no".into())) } else { Ok(()) }
        }
    }

    fn settings(epub_dir: &Path, with_email: bool) -> Settings {
        let epub_dir = epub_dir.to_string_lossy().into_owned();
        Settings::from_lookup(move |key| match key {
            EPUB_OUTPUT_DIR => Some(epub_dir.clone()),
            FROM_EMAIL if with_email => Some("me@example.com".into()),
            EMAIL_PASSWORD if with_email => Some("secret".into()),
            KINDLE_EMAIL if with_email => Some("me@kindle.com".into()),
            _ => None,
        })
    }

    fn article() -> ExtractedArticle {
        ExtractedArticle::new("A Story", "Intro\n\nText.", Some("Jane".into()), "Local file: story.html").unwrap()
    }

    fn block_on<T>(future: impl std::future::Future<Output = T>) -> T {
        tokio::runtime::Runtime::new().unwrap().block_on(future)
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&article());
        assert!(text.starts_with("=== Extracted Article ===\n\nTitle: A Story\nAuthor: Jane\nSource: Local file: story.html"));
        assert!(text.contains("Intro\n\nText."));
        assert!(text.ends_with("=== End of Article ==="));
    }

    #[test]
    fn test_create_epub_uses_configured_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let publisher = Publisher::with_mailer(settings(&tmp.path().join("out"), false), RecordingMailer::default());

        let path = publisher.create_epub(&article(), None).unwrap();
        assert_eq!(path, tmp.path().join("out").join("A_Story.epub"));

        let explicit = tmp.path().join("explicit");
        let path = publisher.create_epub(&article(), Some(&explicit)).unwrap();
        assert!(path.starts_with(&explicit));
    }

    #[test]
    fn test_send_requires_settings_before_io() {
        let tmp = tempfile::tempdir().unwrap();
        let epub_dir = tmp.path().join("books");
        let publisher = Publisher::with_mailer(settings(&epub_dir, false), RecordingMailer::default());

        let result = block_on(publisher.send_to_device(&article(), None));

        assert!(matches!(result, Err(QuireError::ConfigError(_))));
        assert!(!epub_dir.exists());
        assert!(publisher.mailer.sent.lock().unwrap().is_empty());
    }

    #[cfg(feature = "email")]
    #[test]
    fn test_malformed_recipient_fails_before_io() {
        let tmp = tempfile::tempdir().unwrap();
        let epub_dir = tmp.path().join("books");
        let dir = epub_dir.to_string_lossy().into_owned();
        let settings = Settings::from_lookup(move |key| match key {
            EPUB_OUTPUT_DIR => Some(dir.clone()),
            FROM_EMAIL => Some("me@example.com".into()),
            EMAIL_PASSWORD => Some("secret".into()),
            KINDLE_EMAIL => Some("not-an-address".into()),
            _ => None,
        });
        let publisher = Publisher::with_mailer(settings, RecordingMailer::default());

        let result = block_on(publisher.send_to_device(&article(), None));

        assert!(matches!(result, Err(QuireError::ConfigError(msg)) if msg.contains("KINDLE_EMAIL")));
        assert!(!epub_dir.exists());
        assert!(publisher.mailer.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_successful_send_cleans_up_and_marks_source() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("story.html");
        fs::write(&source, "<html></html>").unwrap();
        let publisher = Publisher::with_mailer(settings(&tmp.path().join("books"), true), RecordingMailer::default());

        let delivery = block_on(publisher.send_to_device(&article(), Some(&source))).unwrap();

        assert_eq!(delivery.recipient, "me@kindle.com");
        assert_eq!(delivery.marked_file, Some(tmp.path().join("[SENT] story.html")));
        assert!(!source.exists());

        let sent = publisher.mailer.sent.lock().unwrap();
        let (envelope, attachment, existed) = &sent[0];
        assert_eq!(envelope.subject, "Convert: A Story");
        assert!(*existed);
        assert!(!attachment.exists());
    }

    #[test]
    fn test_failed_send_keeps_epub() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("story.html");
        fs::write(&source, "<html></html>").unwrap();
        let mailer = RecordingMailer { fail: true, ..Default::default() };
        let publisher = Publisher::with_mailer(settings(&tmp.path().join("books"), true), mailer);

        let err = block_on(publisher.send_to_device(&article(), Some(&source))).unwrap_err();

        let kept = tmp.path().join("books").join("A_Story.epub");
        assert!(kept.exists());
        assert!(source.exists());
        assert!(err.to_string().contains("relay said no"));
        assert!(err.to_string().contains("A_Story.epub"));
    }

    #[test]
    fn test_rename_failure_does_not_fail_delivery() {
        let tmp = tempfile::tempdir().unwrap();
        let publisher = Publisher::with_mailer(settings(&tmp.path().join("books"), true), RecordingMailer::default());

        let missing = tmp.path().join("vanished.html");
        let delivery = block_on(publisher.send_to_device(&article(), Some(&missing))).unwrap();
        assert_eq!(delivery.marked_file, None);
    }
}
