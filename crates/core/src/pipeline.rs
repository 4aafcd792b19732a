//! End-to-end extraction for one source.
//!
//! [`Pipeline::run`] applies domain pre-validation, fetches or reads the
//! HTML, runs the content tiers and the author extractor on the same parsed
//! document, then hands the result to domain post-processing.
//!
//! # Example
//!
//! ```rust,no_run
//! use quire_core::{Pipeline, Source};
//!
//! # async fn example() -> quire_core::Result<()> {
//! let pipeline = Pipeline::default();
//! let article = pipeline.run(&Source::from_input("https://example.com/story")).await?;
//! println!("{} ({} words)", article.title, article.word_count());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::article::{ExtractedArticle, Source};
use crate::extract::{ExtractConfig, extract_content};
use crate::fetch::{Fetch, fetch_file};
#[cfg(feature = "fetch")]
use crate::fetch::{FetchConfig, HttpFetcher};
use crate::overrides::{OverrideRegistry, host_of};
use crate::parse::Document;
use crate::{QuireError, Result};

/// Extraction orchestrator.
pub struct Pipeline<F> {
    fetcher: F,
    config: ExtractConfig,
    registry: Arc<OverrideRegistry>,
}

#[cfg(feature = "fetch")]
impl Pipeline<HttpFetcher> {
    /// A pipeline fetching over HTTP with the built-in overrides.
    pub fn new(fetch: FetchConfig, config: ExtractConfig) -> Self {
        Self::with_fetcher(HttpFetcher::new(fetch), config)
    }
}

#[cfg(feature = "fetch")]
impl Default for Pipeline<HttpFetcher> {
    fn default() -> Self {
        Self::new(FetchConfig::default(), ExtractConfig::default())
    }
}

impl<F: Fetch> Pipeline<F> {
    pub fn with_fetcher(fetcher: F, config: ExtractConfig) -> Self {
        Self { fetcher, config, registry: OverrideRegistry::global() }
    }

    /// Replaces the built-in override registry.
    pub fn with_registry(mut self, registry: Arc<OverrideRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Extract the article behind `source`.
    ///
    /// # Errors
    ///
    /// - [`QuireError::Refused`] when a domain override rejects the URL; no
    ///   request is made in that case.
    /// - Network errors from the fetcher, or I/O errors reading a file.
    /// - Extraction errors when no title or body could be found.
    pub async fn run(&self, source: &Source) -> Result<ExtractedArticle> {
        let html = match source {
            Source::Url(url) => {
                let verdict = self.registry.pre_validate(url);
                if !verdict.allowed {
                    let domain = host_of(url).unwrap_or_default();
                    tracing::info!(domain = %domain, "source refused by domain override");
                    let message = verdict.message.unwrap_or_else(|| format!("{} cannot be extracted", domain));
                    return Err(QuireError::Refused { domain, message });
                }

                tracing::info!(url = %url, "extracting article from URL");
                self.fetcher.fetch(url).await?
            }
            Source::File(path) => {
                tracing::info!(path = %path.display(), "extracting article from file");
                fetch_file(path)?
            }
        };

        self.extract_html(&html, source)
    }

    /// Everything [`run`](Self::run) does after the HTML is in hand.
    pub fn extract_html(&self, html: &str, source: &Source) -> Result<ExtractedArticle> {
        let doc = Document::parse(html)?;

        let author = doc.extract_author();
        let content = extract_content(html, &doc, source, &self.config)?;
        tracing::debug!(tier = ?content.tier, title = %content.title, "content extracted");

        let key = post_process_key(&doc, source);
        let (title, body) = self.registry.post_process(&key, content.title, content.body);

        let article = ExtractedArticle::new(title, body, author, source.reference())?;
        tracing::info!(title = %article.title, words = article.word_count(), "article ready");

        Ok(article)
    }
}

/// URL sources are post-processed under their own URL. Files use the
/// address they declare they were saved from, else their path, which no
/// override matches.
fn post_process_key(doc: &Document, source: &Source) -> String {
    match source {
        Source::Url(url) => url.clone(),
        Source::File(path) => doc.origin_url().unwrap_or_else(|| path.display().to_string()),
    }
}
