use std::sync::LazyLock;

use regex::Regex;

use crate::Document;
use crate::parse::collapse_whitespace;

/// Byline selectors in priority order: author-labelled classes and ids
/// first, explicit author attributes next, generic containers last.
const AUTHOR_SELECTORS: &[&str] = &[
    "[class*=\"author\"]",
    "[id*=\"author\"]",
    "[class*=\"byline\"]",
    "[id*=\"byline\"]",
    "[class*=\"writer\"]",
    "[class*=\"journalist\"]",
    "[class*=\"autor\"]",
    "[class*=\"firma\"]",
    "[class*=\"periodista\"]",
    "[class*=\"redactor\"]",
    "[rel=\"author\"]",
    "[itemprop=\"author\"]",
    "[data-author]",
    "[itemtype*=\"schema.org/Person\"] [itemprop=\"name\"]",
    "[itemtype*=\"schema.org/Person\"]",
    "address",
];

/// `(attribute, value)` pairs of the meta tags consulted when no byline
/// element matched.
const AUTHOR_META: &[(&str, &str)] = &[
    ("name", "author"),
    ("property", "article:author"),
    ("name", "dc.creator"),
    ("name", "twitter:creator"),
];

const MAX_AUTHOR_CHARS: usize = 100;
const MAX_NAME_TOKENS: usize = 6;

static LABEL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:written\s+by|escrito\s+por|by|por|autor|author)\b\s*:?\s*").unwrap());

static HANDLE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[@#].*$").unwrap());

static NAME_SHAPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-zÀ-ÖØ-öø-ɏ\s.'’\-]+$").unwrap());

impl Document {
    /// Extract the article author.
    ///
    /// Byline elements are tried first, in [`AUTHOR_SELECTORS`] order; the
    /// first candidate that still looks like a person's name after label and
    /// handle stripping wins. Meta tags are the fallback.
    pub fn extract_author(&self) -> Option<String> {
        for selector in AUTHOR_SELECTORS {
            let Ok(elements) = self.select(selector) else {
                continue;
            };

            for element in elements {
                let mut raw = element.clean_text();
                if raw.is_empty() {
                    raw = element
                        .attr("content")
                        .or_else(|| element.attr("data-author"))
                        .map(collapse_whitespace)
                        .unwrap_or_default();
                }

                if let Some(name) = clean_byline(&raw) {
                    tracing::debug!(selector, author = %name, "author found in byline");
                    return Some(name);
                }
            }
        }

        for (attr, value) in AUTHOR_META {
            if let Some(content) = self.meta_content(attr, value) {
                let content = content.trim_start_matches('@').trim();
                let len = content.chars().count();
                if (2..=MAX_AUTHOR_CHARS).contains(&len) {
                    tracing::debug!(meta = value, author = content, "author found in meta tag");
                    return Some(content.to_string());
                }
            }
        }

        None
    }
}

/// Reduce a byline to a bare name, or `None` if it does not look like one.
pub fn clean_byline(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.chars().count() > MAX_AUTHOR_CHARS {
        return None;
    }

    let name = LABEL_PREFIX.replace(raw, "");
    let name = name.split('|').next().unwrap_or_default();
    let name = HANDLE_SUFFIX.replace(name, "");
    let name = name.trim();

    if is_name_shaped(name) { Some(name.to_string()) } else { None }
}

fn is_name_shaped(candidate: &str) -> bool {
    let tokens = candidate.split_whitespace().count();
    (1..=MAX_NAME_TOKENS).contains(&tokens) && NAME_SHAPE.is_match(candidate)
}
