//! EPUB packaging for extracted articles.
//!
//! Every book holds a single XHTML chapter. Body blocks are classified into
//! headings and paragraphs here, since the extractor only preserves block
//! boundaries.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use epub_builder::{EpubBuilder, EpubContent, ReferenceType, ZipLibrary};
use quick_xml::escape::escape;
use regex::Regex;

use crate::article::ExtractedArticle;
use crate::overrides::host_of;
use crate::sanitize::sanitize;
use crate::{QuireError, Result};

/// Blocks at least this long are always paragraphs.
pub const HEADING_MAX_CHARS: usize = 80;

pub const FALLBACK_TITLE: &str = "Untitled Article";
pub const FALLBACK_AUTHOR: &str = "Unknown";
pub const FALLBACK_FILE_NAME: &str = "article.epub";

const CHAPTER_FILE: &str = "article.xhtml";
const LANGUAGE: &str = "en";

static UNSAFE_FILE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATOR_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

/// How a body block is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading,
    Paragraph,
}

/// Short blocks without sentence-final punctuation are headings.
pub fn classify_block(block: &str) -> BlockKind {
    let block = block.trim();
    let terminated = block.ends_with(['.', '?', '!']);

    if block.chars().count() < HEADING_MAX_CHARS && !terminated { BlockKind::Heading } else { BlockKind::Paragraph }
}

/// File name for the book of an article titled `title`.
pub fn epub_file_name(title: &str) -> String {
    let cleaned = UNSAFE_FILE_CHARS.replace_all(title, "");
    let cleaned = cleaned.trim().replace(' ', "_");
    let cleaned = SEPARATOR_RUNS.replace_all(&cleaned, "-");

    if cleaned.is_empty() { FALLBACK_FILE_NAME.to_string() } else { format!("{}.epub", cleaned) }
}

/// Book-level metadata derived from an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub language: String,
}

impl BookMetadata {
    /// Sanitized title and author. Articles without an author are credited
    /// to the host they came from.
    pub fn for_article(article: &ExtractedArticle) -> Self {
        let title = non_empty(sanitize(&article.title)).unwrap_or_else(|| FALLBACK_TITLE.to_string());

        let author = article
            .author
            .as_deref()
            .map(sanitize)
            .and_then(non_empty)
            .or_else(|| host_of(&article.source_reference))
            .unwrap_or_else(|| FALLBACK_AUTHOR.to_string());

        Self { title, author, language: LANGUAGE.to_string() }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// The chapter document: sanitized title, source line, then the classified
/// blocks.
pub fn render_chapter(article: &ExtractedArticle) -> String {
    let title = BookMetadata::for_article(article).title;
    let mut body = String::new();

    body.push_str(&format!("<h1>{}</h1>\n", escape(&title)));
    body.push_str(&format!("<p><i>Source: {}</i></p>\n", source_line(&article.source_reference)));

    for block in article.blocks() {
        let text = escape(block);
        match classify_block(block) {
            BlockKind::Heading => body.push_str(&format!("<h2>{}</h2>\n", text)),
            BlockKind::Paragraph => body.push_str(&format!("<p>{}</p>\n", text)),
        }
    }

    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<!DOCTYPE html>\n",
            "<html xmlns=\"http://www.w3.org/1999/xhtml\" xml:lang=\"{lang}\" lang=\"{lang}\">\n",
            "<head>\n<meta charset=\"UTF-8\"/>\n<title>{title}</title>\n</head>\n",
            "<body>\n{body}</body>\n</html>\n"
        ),
        lang = LANGUAGE,
        title = escape(&title),
        body = body,
    )
}

/// URL sources are linked and labelled by host; anything else is shown verbatim.
fn source_line(reference: &str) -> String {
    match host_of(reference) {
        Some(host) if reference.starts_with("http://") || reference.starts_with("https://") => format!(
            "<a href=\"{}\">{}</a>",
            escape(reference),
            escape(&host)
        ),
        _ => escape(reference).into_owned(),
    }
}

/// Builds the book in memory.
pub fn build_epub(article: &ExtractedArticle) -> Result<Vec<u8>> {
    let meta = BookMetadata::for_article(article);
    let chapter = render_chapter(article);

    let mut builder = EpubBuilder::new(ZipLibrary::new().map_err(packaging)?).map_err(packaging)?;
    builder
        .metadata("title", meta.title.as_str())
        .map_err(packaging)?
        .metadata("author", meta.author.as_str())
        .map_err(packaging)?
        .metadata("lang", meta.language.as_str())
        .map_err(packaging)?
        .add_content(
            EpubContent::new(CHAPTER_FILE, chapter.as_bytes())
                .title("Article")
                .reftype(ReferenceType::Text),
        )
        .map_err(packaging)?
        .inline_toc();

    let mut bytes = Vec::new();
    builder.generate(&mut bytes).map_err(packaging)?;
    Ok(bytes)
}

/// Writes the book for `article` into `dir`, creating it when missing, and
/// returns the path of the new file.
pub fn write_epub(article: &ExtractedArticle, dir: &Path) -> Result<PathBuf> {
    let bytes = build_epub(article)?;

    fs::create_dir_all(dir)?;
    let path = dir.join(epub_file_name(&article.title));
    fs::write(&path, bytes)?;

    tracing::info!(path = %path.display(), "ePub written");
    Ok(path)
}

fn packaging(e: impl std::fmt::Display) -> QuireError {
    QuireError::Packaging(e.to_string())
}
