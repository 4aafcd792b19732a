//! HTML parsing and DOM queries.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! HTML and navigating the DOM tree using CSS selectors.
//!
//! # Example
//!
//! ```rust
//! use quire_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! assert_eq!(doc.first_text("h1"), Some("Title".to_string()));
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::{QuireError, Result};

static SAVED_FROM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"saved from url=\(\d+\)(\S+)").unwrap());

/// Represents a parsed HTML document.
///
/// A Document wraps an HTML page and provides methods for querying elements
/// using CSS selectors and reading the bits of metadata extraction needs.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// html5ever recovers from any markup, so this only fails for API
    /// symmetry with the selector methods.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html })
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use quire_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Gets the first element matching a selector, if any.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = compile(selector)?;
        Ok(self.html.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Trimmed, whitespace-collapsed text of the first element matching
    /// `selector`, or `None` when it is missing or blank.
    pub fn first_text(&self, selector: &str) -> Option<String> {
        let element = self.select_first(selector).ok()??;
        let text = element.clean_text();
        if text.is_empty() { None } else { Some(text) }
    }

    /// Gets the title of the document.
    ///
    /// Returns the content of the `<title>` element if present and not blank.
    pub fn title(&self) -> Option<String> {
        self.first_text("title")
    }

    /// Gets the `<body>` element.
    pub fn body(&'_ self) -> Option<Element<'_>> {
        self.select_first("body").ok().flatten()
    }

    /// Looks up `<meta {attr}="{value}" content="...">`, comparing the
    /// attribute value without regard to ASCII case.
    pub fn meta_content(&self, attr: &str, value: &str) -> Option<String> {
        let sel = Selector::parse("meta[content]").ok()?;
        self.html
            .select(&sel)
            .filter(|el| el.value().attr(attr).is_some_and(|v| v.trim().eq_ignore_ascii_case(value)))
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string)
    }

    /// The address the page was saved from, if the document declares one.
    ///
    /// Checks `<link rel="canonical">`, `og:url`, then the
    /// `<!-- saved from url=(NNNN)... -->` marker browsers write into saved pages.
    pub fn origin_url(&self) -> Option<String> {
        if let Ok(Some(link)) = self.select_first("link[rel=\"canonical\"][href]")
            && let Some(href) = link.attr("href")
            && is_web_url(href)
        {
            return Some(href.trim().to_string());
        }

        if let Some(og) = self.meta_content("property", "og:url")
            && is_web_url(&og)
        {
            return Some(og);
        }

        self.html
            .tree
            .nodes()
            .filter_map(|node| node.value().as_comment().map(|c| String::from(&**c)))
            .find_map(|comment| SAVED_FROM.captures(&comment).map(|caps| caps[1].to_string()))
    }
}

/// A wrapper around scraper's ElementRef.
///
/// # Example
///
/// ```rust
/// use quire_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the text content of this element.
    ///
    /// Returns the concatenation of all text nodes within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Text with every whitespace run folded into a single space and the
    /// ends trimmed.
    pub fn clean_text(&self) -> String {
        collapse_whitespace(&self.text())
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// The non-blank text lines under this element, in document order.
    pub fn text_lines(&self) -> Vec<String> {
        self.element
            .text()
            .flat_map(str::lines)
            .map(collapse_whitespace)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Folds whitespace runs into single spaces and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| QuireError::HtmlParseError(format!("Invalid selector: {}", e)))
}

fn is_web_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}
