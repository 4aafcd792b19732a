//! Error types for Quire operations.
//!
//! This module defines [`QuireError`], the single error type returned by
//! fetching, extraction, packaging and delivery. Variants fall into four
//! families: network failures, refusals by a domain override, extraction
//! failures and configuration problems.
//!
//! # Example
//!
//! ```rust
//! use quire_core::{QuireError, Result};
//!
//! fn first_block(body: &str) -> Result<&str> {
//!     body.split("\n\n").find(|b| !b.trim().is_empty()).ok_or(QuireError::NoContent)
//! }
//! # assert!(first_block("").is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for extraction and delivery operations.
#[derive(Error, Debug)]
pub enum QuireError {
    /// HTTP request errors from reqwest.
    ///
    /// Connection failures, DNS errors, TLS problems and body decoding errors.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} returned for {url}")]
    HttpStatus { status: u16, url: String },

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout. Unlike
    /// the other network errors this one is worth retrying.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A domain override refused to handle the source.
    ///
    /// The display text is the override's own explanation, meant to be shown
    /// to the user as-is.
    #[error("{message}")]
    Refused { domain: String, message: String },

    /// HTML parsing errors, usually an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// No body text survived every extraction tier.
    #[error("Could not extract article content")]
    NoContent,

    /// Neither the document nor the source yielded a title.
    #[error("Could not determine the article title")]
    NoTitle,

    /// Strict extraction could not find a main-content container.
    #[error("Could not locate main content on the page")]
    NoContainer,

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Standard I/O errors for file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The EPUB could not be assembled or written.
    #[error("Failed to build ePub: {0}")]
    Packaging(String),

    /// The e-mail could not be built or delivered.
    #[error("Failed to send email: {0}")]
    Mail(String),
}

impl QuireError {
    /// Whether the error came from talking to the network.
    pub fn is_network(&self) -> bool {
        match self {
            #[cfg(feature = "fetch")]
            QuireError::HttpError(_) => true,
            QuireError::HttpStatus { .. } | QuireError::Timeout { .. } | QuireError::InvalidUrl(_) => true,
            _ => false,
        }
    }

    /// Whether the same request may succeed if tried again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuireError::Timeout { .. })
    }

    /// Whether extraction ran but produced nothing usable.
    pub fn is_extraction(&self) -> bool {
        matches!(self, QuireError::NoContent | QuireError::NoTitle | QuireError::NoContainer)
    }
}

/// Result type alias for QuireError.
pub type Result<T> = std::result::Result<T, QuireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QuireError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_refused_displays_override_message() {
        let err = QuireError::Refused { domain: "example.com".into(), message: "save it locally".into() };
        assert_eq!(err.to_string(), "save it locally");
        assert!(!err.is_network());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = QuireError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
        assert!(err.is_network());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_status_error() {
        let err = QuireError::HttpStatus { status: 404, url: "https://example.com/x".into() };
        assert!(err.to_string().contains("404"));
        assert!(err.is_network());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_extraction_family() {
        assert!(QuireError::NoContent.is_extraction());
        assert!(QuireError::NoContainer.is_extraction());
        assert!(!QuireError::ConfigError("x".into()).is_extraction());
    }
}
