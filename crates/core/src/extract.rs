use url::Url;

use crate::article::{Source, join_blocks};
use crate::parse::{Document, Element, collapse_whitespace};
use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::{QuireError, Result};

/// Main-content containers, tried in order.
pub const CONTAINER_SELECTORS: [&str; 5] = ["article", "main", ".content", ".article-content", ".post-content"];

/// Elements whose text becomes a body block.
pub const BLOCK_SELECTOR: &str = "p, h2, h3, h4";

/// Configuration for content extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Main-content container selectors in priority order
    pub container_selectors: Vec<String>,
    /// Selector for the blocks collected inside the container
    pub block_selector: String,
    /// Fail instead of falling back to `<body>` when no container matches
    pub require_container: bool,
    /// Try the readability tier first for URL sources
    pub use_readability: bool,
    /// Non-content stripping applied before body extraction
    pub preprocess: PreprocessConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            container_selectors: CONTAINER_SELECTORS.iter().map(|s| s.to_string()).collect(),
            block_selector: BLOCK_SELECTOR.to_string(),
            require_container: false,
            use_readability: true,
            preprocess: PreprocessConfig::default(),
        }
    }
}

/// Which strategy produced the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Readability,
    Structural,
}

/// Title and body produced by one extraction tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: String,
    pub body: String,
    pub tier: Tier,
}

/// Extract title and body from `html`.
///
/// `doc` must be the parsed, unstripped `html`. URL sources try the
/// readability tier first on the stripped markup; a failure or an empty
/// field there falls through to the structural tier, whose errors are final.
pub fn extract_content(html: &str, doc: &Document, source: &Source, config: &ExtractConfig) -> Result<ExtractedContent> {
    if let Source::Url(url) = source
        && config.use_readability
        && let Some(content) = readability_tier(html, doc, url, config)
    {
        return Ok(content);
    }

    structural_tier(html, doc, source, config)
}

#[cfg(feature = "readability")]
fn readability_tier(html: &str, doc: &Document, url: &str, config: &ExtractConfig) -> Option<ExtractedContent> {
    let stripped = preprocess_html(html, &config.preprocess);

    let mut reader = match dom_smoothie::Readability::new(stripped.as_str(), Some(url), None) {
        Ok(reader) => reader,
        Err(e) => {
            tracing::debug!(error = ?e, "readability tier unavailable, using structural extraction");
            return None;
        }
    };

    let article = match reader.parse() {
        Ok(article) => article,
        Err(e) => {
            tracing::debug!(error = ?e, "readability tier failed, using structural extraction");
            return None;
        }
    };

    let content: String = article.content.into();
    let text: String = article.text_content.into();
    readable_content(doc, &article.title, &content, &text, config)
}

/// Assembles a tier 1 result. The page's own `<h1>` wins over the title
/// Readability derives from `<title>`.
#[cfg(feature = "readability")]
fn readable_content(
    doc: &Document, readable_title: &str, content_html: &str, text: &str, config: &ExtractConfig,
) -> Option<ExtractedContent> {
    let title = doc.first_text("h1").unwrap_or_else(|| collapse_whitespace(readable_title));

    let mut blocks = Document::parse(content_html)
        .ok()
        .and_then(|content| content.body().map(|body| collect_blocks(&body, &config.block_selector)))
        .unwrap_or_default();

    if blocks.is_empty() {
        blocks = text.lines().map(collapse_whitespace).filter(|l| !l.is_empty()).collect();
    }

    if title.is_empty() || blocks.is_empty() {
        tracing::debug!("readability tier returned empty fields, using structural extraction");
        return None;
    }

    Some(ExtractedContent { title, body: join_blocks(&blocks), tier: Tier::Readability })
}

#[cfg(not(feature = "readability"))]
fn readability_tier(_html: &str, _doc: &Document, _url: &str, _config: &ExtractConfig) -> Option<ExtractedContent> {
    None
}

/// Selector-driven extraction that works on any HTML.
pub fn structural_tier(html: &str, doc: &Document, source: &Source, config: &ExtractConfig) -> Result<ExtractedContent> {
    let title = find_title(doc, source).ok_or(QuireError::NoTitle)?;

    let stripped = preprocess_html(html, &config.preprocess);
    let stripped = Document::parse(&stripped)?;
    let body = main_body(&stripped, config)?;

    Ok(ExtractedContent { title, body, tier: Tier::Structural })
}

/// The article title: first `<h1>`, then `<title>` and file name for
/// files, or the host for URLs.
pub fn find_title(doc: &Document, source: &Source) -> Option<String> {
    if let Some(h1) = doc.first_text("h1") {
        return Some(h1);
    }

    match source {
        Source::Url(url) => Url::parse(url).ok()?.host_str().map(str::to_string),
        Source::File(path) => doc.title().or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().trim().to_string())
                .filter(|stem| !stem.is_empty())
        }),
    }
}

/// Body text of an already stripped document.
pub fn main_body(doc: &Document, config: &ExtractConfig) -> Result<String> {
    let container = match find_container(doc, config) {
        Some(container) => container,
        None if config.require_container => return Err(QuireError::NoContainer),
        None => doc.body().ok_or(QuireError::NoContent)?,
    };

    let mut blocks = collect_blocks(&container, &config.block_selector);

    if blocks.is_empty() {
        tracing::debug!("no blocks in container, falling back to body text");
        blocks = doc.body().map(|body| body.text_lines()).unwrap_or_default();
    }

    let body = join_blocks(&blocks);
    if body.is_empty() { Err(QuireError::NoContent) } else { Ok(body) }
}

fn find_container<'a>(doc: &'a Document, config: &ExtractConfig) -> Option<Element<'a>> {
    config.container_selectors.iter().find_map(|selector| match doc.select_first(selector) {
        Ok(found) => {
            if found.is_some() {
                tracing::debug!(selector = %selector, "main content container found");
            }
            found
        }
        Err(e) => {
            tracing::warn!(selector = %selector, error = %e, "skipping invalid container selector");
            None
        }
    })
}

/// Trimmed text of every block element under `container`, blanks dropped.
pub fn collect_blocks(container: &Element<'_>, block_selector: &str) -> Vec<String> {
    match container.select(block_selector) {
        Ok(elements) => elements
            .iter()
            .map(Element::clean_text)
            .filter(|text| !text.is_empty())
            .collect(),
        Err(e) => {
            tracing::warn!(selector = block_selector, error = %e, "invalid block selector");
            Vec::new()
        }
    }
}
