//! The extracted article and the sources it can come from.
//!
//! [`ExtractedArticle`] is the single product of the extraction pipeline.
//! Its body is a sequence of blocks (paragraphs and headings) separated by a
//! blank line; downstream packaging relies on those boundaries.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{QuireError, Result};

/// Separator between blocks in [`ExtractedArticle::body`].
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Where an article is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// An `http://` or `https://` address.
    Url(String),
    /// A saved HTML page on disk.
    File(PathBuf),
}

impl Source {
    /// Classifies user input: anything starting with `http://` or `https://`
    /// is a URL, everything else a file path.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Source::Url(trimmed.to_string())
        } else {
            Source::File(PathBuf::from(trimmed))
        }
    }

    /// Human-readable attribution: the URL itself, or `Local file: <name>`.
    pub fn reference(&self) -> String {
        match self {
            Source::Url(url) => url.clone(),
            Source::File(path) => format!("Local file: {}", file_name(path)),
        }
    }

    pub fn as_file(&self) -> Option<&Path> {
        match self {
            Source::File(path) => Some(path),
            Source::Url(_) => None,
        }
    }
}

/// The complete result of extracting one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedArticle {
    /// Article headline.
    pub title: String,

    /// Paragraph and heading blocks in document order, joined by [`BLOCK_SEPARATOR`].
    pub body: String,

    /// Byline, when one could be found.
    pub author: Option<String>,

    /// The URL, or a `Local file: ...` label. Informational only.
    pub source_reference: String,
}

impl ExtractedArticle {
    /// Assembles an article, trimming title and body.
    ///
    /// # Errors
    ///
    /// [`QuireError::NoTitle`] or [`QuireError::NoContent`] when either part
    /// is blank; a half-extracted article is never returned.
    pub fn new(
        title: impl Into<String>, body: impl Into<String>, author: Option<String>, source_reference: impl Into<String>,
    ) -> Result<Self> {
        let title = title.into().trim().to_string();
        let body = body.into().trim().to_string();

        if title.is_empty() {
            return Err(QuireError::NoTitle);
        }
        if body.is_empty() {
            return Err(QuireError::NoContent);
        }

        let author = author.map(|a| a.trim().to_string()).filter(|a| !a.is_empty());

        Ok(Self { title, body, author, source_reference: source_reference.into() })
    }

    /// The non-blank blocks of the body.
    pub fn blocks(&self) -> impl Iterator<Item = &str> {
        self.body.split(BLOCK_SEPARATOR).map(str::trim).filter(|b| !b.is_empty())
    }

    /// Word count of the body.
    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }

    /// Gets the article as structured JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| QuireError::HtmlParseError(e.to_string()))
    }
}

/// Joins blocks with [`BLOCK_SEPARATOR`], dropping blank ones.
pub fn join_blocks<I, S>(blocks: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    blocks
        .into_iter()
        .filter_map(|b| {
            let b = b.as_ref().trim();
            if b.is_empty() { None } else { Some(b.to_string()) }
        })
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_input() {
        assert_eq!(Source::from_input(" https://a.com/x "), Source::Url("https://a.com/x".into()));
        assert_eq!(Source::from_input("saved/page.html"), Source::File(PathBuf::from("saved/page.html")));
    }

    #[test]
    fn test_source_reference() {
        assert_eq!(Source::Url("https://a.com/x".into()).reference(), "https://a.com/x");
        assert_eq!(Source::File(PathBuf::from("/tmp/dir/page.html")).reference(), "Local file: page.html");
    }

    #[test]
    fn test_new_rejects_blank_parts() {
        assert!(matches!(ExtractedArticle::new("  ", "body", None, "x"), Err(QuireError::NoTitle)));
        assert!(matches!(ExtractedArticle::new("Title", "\n\n ", None, "x"), Err(QuireError::NoContent)));
    }

    #[test]
    fn test_new_drops_blank_author() {
        let article = ExtractedArticle::new("T", "B", Some("  ".into()), "x").unwrap();
        assert_eq!(article.author, None);
    }

    #[test]
    fn test_blocks() {
        let article = ExtractedArticle::new("T", "One.\n\nTwo\n\n\n\nThree.", None, "x").unwrap();
        assert_eq!(article.blocks().collect::<Vec<_>>(), vec!["One.", "Two", "Three."]);
        assert_eq!(article.word_count(), 3);
    }

    #[test]
    fn test_join_blocks() {
        assert_eq!(join_blocks(["A", "  ", " B "]), "A\n\nB");
        assert_eq!(join_blocks(Vec::<String>::new()), "");
    }

    #[test]
    fn test_to_json() {
        let article = ExtractedArticle::new("T", "B", Some("Jane".into()), "https://a.com").unwrap();
        let json = article.to_json().unwrap();
        assert_eq!(json["title"], "T");
        assert_eq!(json["author"], "Jane");
        assert_eq!(json["source_reference"], "https://a.com");
    }
}
