//! Settings loaded from the environment.
//!
//! The binary loads a `.env` file first, so every value below can live there.
//! Output directories always resolve; e-mail values are only checked when a
//! book is about to be sent.

use std::env;
use std::path::{Path, PathBuf};

use crate::{QuireError, Result};

pub const FROM_EMAIL: &str = "FROM_EMAIL";
pub const EMAIL_PASSWORD: &str = "EMAIL_PASSWORD";
pub const KINDLE_EMAIL: &str = "KINDLE_EMAIL";
pub const SMTP_SERVER: &str = "SMTP_SERVER";
pub const SMTP_PORT: &str = "SMTP_PORT";
pub const EPUB_OUTPUT_DIR: &str = "EPUB_OUTPUT_DIR";
pub const HTML_ARTICLES_DIR: &str = "HTML_ARTICLES_DIR";

pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

const APP_DIR: &str = "quire";

/// Everything needed to log in to the relay and address the device.
#[derive(Clone, PartialEq, Eq)]
pub struct MailAccount {
    pub from_email: String,
    pub password: String,
    pub kindle_email: String,
    pub smtp_server: String,
    pub smtp_port: u16,
}

impl std::fmt::Debug for MailAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailAccount")
            .field("from_email", &self.from_email)
            .field("password", &"<redacted>")
            .field("kindle_email", &self.kindle_email)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub from_email: Option<String>,
    pub email_password: Option<String>,
    pub kindle_email: Option<String>,
    pub smtp_server: String,
    /// Kept as written; validated by [`Settings::require_email`].
    pub smtp_port: Option<String>,
    pub epub_output_dir: PathBuf,
    pub html_articles_dir: PathBuf,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            from_email: get(FROM_EMAIL),
            email_password: get(EMAIL_PASSWORD),
            kindle_email: get(KINDLE_EMAIL),
            smtp_server: get(SMTP_SERVER).unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
            smtp_port: get(SMTP_PORT),
            epub_output_dir: get(EPUB_OUTPUT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| default_dir("epub_output")),
            html_articles_dir: get(HTML_ARTICLES_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| default_dir("html_articles")),
        }
    }

    /// The complete e-mail account.
    ///
    /// # Errors
    ///
    /// [`QuireError::ConfigError`] naming every missing variable, when an
    /// address is malformed, or when `SMTP_PORT` is not a port number.
    pub fn require_email(&self) -> Result<MailAccount> {
        let missing: Vec<&str> = [
            (FROM_EMAIL, &self.from_email),
            (EMAIL_PASSWORD, &self.email_password),
            (KINDLE_EMAIL, &self.kindle_email),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| key)
        .collect();

        if !missing.is_empty() {
            return Err(QuireError::ConfigError(format!(
                "email settings incomplete, set {} in the environment or a .env file",
                missing.join(", ")
            )));
        }

        let from_email = self.from_email.clone().unwrap_or_default();
        let kindle_email = self.kindle_email.clone().unwrap_or_default();
        check_address(FROM_EMAIL, &from_email)?;
        check_address(KINDLE_EMAIL, &kindle_email)?;

        let smtp_port = match &self.smtp_port {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| QuireError::ConfigError(format!("{SMTP_PORT} must be a port number, got '{raw}'")))?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(MailAccount {
            from_email,
            password: self.email_password.clone().unwrap_or_default(),
            kindle_email,
            smtp_server: self.smtp_server.clone(),
            smtp_port,
        })
    }

    /// The EPUB output directory, created when missing.
    pub fn epub_dir(&self) -> Result<&Path> {
        ensure_dir(&self.epub_output_dir)?;
        Ok(&self.epub_output_dir)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Create `dir` and its parents if they do not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "creating directory");
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(feature = "email")]
fn check_address(key: &str, value: &str) -> Result<()> {
    value
        .parse::<lettre::Address>()
        .map(|_| ())
        .map_err(|e| QuireError::ConfigError(format!("{key} is not a valid e-mail address, got '{value}': {e}")))
}

#[cfg(not(feature = "email"))]
fn check_address(_key: &str, _value: &str) -> Result<()> {
    Ok(())
}

fn default_dir(name: &str) -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(env::temp_dir)
        .join(APP_DIR)
        .join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]);
        assert_eq!(s.smtp_server, "smtp.gmail.com");
        assert!(s.epub_output_dir.ends_with("quire/epub_output"));
        assert!(s.html_articles_dir.ends_with("quire/html_articles"));
    }

    #[test]
    fn test_require_email_lists_missing_vars() {
        let s = settings(&[(FROM_EMAIL, "me@example.com"), (KINDLE_EMAIL, "  ")]);
        let err = s.require_email().unwrap_err().to_string();

        assert!(err.contains("EMAIL_PASSWORD"));
        assert!(err.contains("KINDLE_EMAIL"));
        assert!(!err.contains("FROM_EMAIL"));
    }

    #[test]
    fn test_require_email() {
        let s = settings(&[
            (FROM_EMAIL, "me@example.com"),
            (EMAIL_PASSWORD, "secret"),
            (KINDLE_EMAIL, "me@kindle.com"),
            (SMTP_SERVER, "smtp.example.com"),
            (SMTP_PORT, "2525"),
        ]);
        let account = s.require_email().unwrap();

        assert_eq!(account.smtp_server, "smtp.example.com");
        assert_eq!(account.smtp_port, 2525);
        assert!(!format!("{account:?}").contains("secret"));
    }

    #[test]
    fn test_bad_port() {
        let s = settings(&[
            (FROM_EMAIL, "me@example.com"),
            (EMAIL_PASSWORD, "secret"),
            (KINDLE_EMAIL, "me@kindle.com"),
            (SMTP_PORT, "smtp"),
        ]);
        assert!(matches!(s.require_email(), Err(QuireError::ConfigError(msg)) if msg.contains("SMTP_PORT")));
    }

    #[cfg(feature = "email")]
    #[test]
    fn test_malformed_addresses() {
        let s = settings(&[(FROM_EMAIL, "me at example"), (EMAIL_PASSWORD, "secret"), (KINDLE_EMAIL, "me@kindle.com")]);
        assert!(matches!(s.require_email(), Err(QuireError::ConfigError(msg)) if msg.contains("FROM_EMAIL")));

        let s = settings(&[(FROM_EMAIL, "me@example.com"), (EMAIL_PASSWORD, "secret"), (KINDLE_EMAIL, "kindle")]);
        assert!(matches!(s.require_email(), Err(QuireError::ConfigError(msg)) if msg.contains("KINDLE_EMAIL")));
    }

    #[test]
    fn test_epub_dir_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("books");
        let s = settings(&[(EPUB_OUTPUT_DIR, dir.to_str().unwrap())]);

        assert_eq!(s.epub_dir().unwrap(), dir.as_path());
        assert!(dir.is_dir());
    }
}
