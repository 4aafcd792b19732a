use std::borrow::Cow;

use lol_html::{ElementContentHandlers, HtmlRewriter, Selector, Settings, element};

/// Elements whose text never belongs to an article body.
pub const NON_CONTENT_TAGS: [&str; 7] = ["script", "style", "nav", "footer", "header", "aside", "form"];

/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Tags removed together with everything inside them
    pub strip_tags: Vec<String>,
    /// Whether to drop HTML comments
    pub remove_comments: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { strip_tags: NON_CONTENT_TAGS.iter().map(|t| t.to_string()).collect(), remove_comments: true }
    }
}

/// Remove non-content elements and comments from an HTML document.
///
/// Falls back to the untouched input if the rewriter rejects the markup, so
/// callers always get something parseable back.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut output = Vec::with_capacity(html.len());

    let mut handlers: Vec<(Cow<'_, Selector>, ElementContentHandlers<'_>)> = Vec::new();
    for tag in &config.strip_tags {
        if tag.parse::<Selector>().is_err() {
            tracing::warn!(tag = %tag, "ignoring invalid strip selector");
            continue;
        }
        handlers.push(element!(tag.as_str(), |el| {
            el.remove();
            Ok(())
        }));
    }

    let mut settings = Settings::new();
    settings.element_content_handlers = handlers;
    if config.remove_comments {
        settings.document_content_handlers = vec![lol_html::doc_comments!(|c| {
            c.remove();
            Ok(())
        })];
    }

    let mut rewriter = HtmlRewriter::new(settings, |c: &[u8]| output.extend_from_slice(c));

    if let Err(e) = rewriter.write(html.as_bytes()) {
        tracing::debug!(error = %e, "html rewriter failed, keeping original markup");
        return html.to_string();
    }

    if let Err(e) = rewriter.end() {
        tracing::debug!(error = %e, "html rewriter failed, keeping original markup");
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { String::from_utf8_lossy(&output).into_owned() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(html: &str) -> String {
        preprocess_html(html, &PreprocessConfig::default())
    }

    #[test]
    fn test_strips_every_non_content_tag() {
        let html = r#"<html><head><style>.x{}</style><script>var leak = 1;</script></head><body>
            <header>Site header</header>
            <nav>Menu</nav>
            <article><p>Keep me</p><aside>Related links</aside></article>
            <form><label>Subscribe</label></form>
            <footer>Copyright</footer>
        </body></html>"#;

        let result = strip(html);

        assert!(result.contains("Keep me"));
        for leaked in ["leak", ".x{}", "Site header", "Menu", "Related links", "Subscribe", "Copyright"] {
            assert!(!result.contains(leaked), "{leaked} survived stripping");
        }
    }

    #[test]
    fn test_removes_comments() {
        let result = strip("<p>Text<!-- hidden note --></p>");
        assert!(result.contains("Text"));
        assert!(!result.contains("hidden note"));
    }

    #[test]
    fn test_custom_tags() {
        let config = PreprocessConfig { strip_tags: vec!["figure".into()], remove_comments: false };
        let result = preprocess_html("<p>Body</p><figure>Caption</figure><nav>Menu</nav>", &config);
        assert!(!result.contains("Caption"));
        assert!(result.contains("Menu"));
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        let config = PreprocessConfig { strip_tags: vec!["[[bad".into(), "nav".into()], remove_comments: false };
        let result = preprocess_html("<p>Body</p><nav>Menu</nav>", &config);
        assert!(result.contains("Body"));
        assert!(!result.contains("Menu"));
    }
}
