//! Per-domain extraction overrides.
//!
//! A [`DomainOverride`] pairs a bare domain (`cenital.com`, no scheme, no
//! `www.`) with one [`OverrideKind`]. The [`OverrideRegistry`] resolves a URL
//! to its override by exact host match first and parent domain second, so
//! `foo.substack.com` picks up the `substack.com` entry.
//!
//! The built-in registry is created once per process by
//! [`OverrideRegistry::global`] and never mutated afterwards.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use url::Url;

static GLOBAL: LazyLock<Arc<OverrideRegistry>> = LazyLock::new(|| Arc::new(OverrideRegistry::builtin()));

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

const SUBSTACK_MESSAGE: &str = "Substack articles require JavaScript to render content and cannot be \
extracted automatically. Consider saving the article as HTML from your browser and using the \
'From a HTML File' option instead.";

const CENITAL_TRAILER: &str = "Otras lecturas";

const CENITAL_APPEAL: &str = "¿Por qué pagar por algo que puedo leer gratis? En Cenital entendemos al \
periodismo como un servicio público. Por eso nuestras notas siempre estarán accesibles para todos. \
Pero investigar es caro y la parte más ardua del trabajo periodístico no se ve. Por eso le pedimos \
a quienes puedan que se sumen a nuestro círculo de Mejores amigos y nos permitan seguir creciendo. \
Si te gusta lo que hacemos, sumate vos también. Sumate";

/// Outcome of running pre-validation for a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub allowed: bool,
    pub message: Option<String>,
}

impl Verdict {
    pub fn allow() -> Self {
        Self { allowed: true, message: None }
    }

    pub fn refuse(message: impl Into<String>) -> Self {
        Self { allowed: false, message: Some(message.into()) }
    }
}

/// What an override does with the sources of its domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideKind {
    /// Accept everything and leave the output alone.
    Passthrough,
    /// Refuse extraction up front, explaining why.
    Refuse { message: String },
    /// Rewrite the body after extraction.
    Trim {
        /// Everything from the first occurrence of this marker on is dropped.
        cut_at: Option<String>,
        /// Exact paragraphs removed wherever they appear.
        remove: Vec<String>,
    },
}

/// A behavior registered for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainOverride {
    pub domain: String,
    pub kind: OverrideKind,
}

impl DomainOverride {
    pub fn new(domain: impl Into<String>, kind: OverrideKind) -> Self {
        Self { domain: domain.into(), kind }
    }

    /// Substack renders posts client-side, so the static page has no body.
    pub fn substack() -> Self {
        Self::new("substack.com", OverrideKind::Refuse { message: SUBSTACK_MESSAGE.to_string() })
    }

    /// Cenital appends a reading list and a donation appeal to every article.
    pub fn cenital() -> Self {
        Self::new(
            "cenital.com",
            OverrideKind::Trim { cut_at: Some(CENITAL_TRAILER.to_string()), remove: vec![CENITAL_APPEAL.to_string()] },
        )
    }

    pub fn pre_validate(&self, _url: &str) -> Verdict {
        match &self.kind {
            OverrideKind::Refuse { message } => Verdict::refuse(message.clone()),
            OverrideKind::Passthrough | OverrideKind::Trim { .. } => Verdict::allow(),
        }
    }

    pub fn post_process(&self, title: String, body: String) -> (String, String) {
        let OverrideKind::Trim { cut_at, remove } = &self.kind else {
            return (title, body);
        };

        let mut body = body;

        if let Some(marker) = cut_at
            && let Some(idx) = body.find(marker.as_str())
        {
            body = body[..idx].trim().to_string();
        }

        for paragraph in remove {
            if body.contains(paragraph.as_str()) {
                body = body.replace(paragraph.as_str(), "").trim().to_string();
                body = BLANK_RUNS.replace_all(&body, "\n\n").into_owned();
            }
        }

        (title, body)
    }
}

/// Domain to override lookup table.
///
/// Registration order is kept: when several parent domains match a host,
/// the earliest registered one wins.
#[derive(Debug, Clone, Default)]
pub struct OverrideRegistry {
    overrides: Vec<DomainOverride>,
}

impl OverrideRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry holding the built-in overrides.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(DomainOverride::substack());
        registry.register(DomainOverride::cenital());
        registry
    }

    /// The process-wide built-in registry.
    pub fn global() -> Arc<OverrideRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Adds an override, replacing any existing entry for the same domain.
    pub fn register(&mut self, entry: DomainOverride) {
        let domain = normalize_domain(&entry.domain);
        let entry = DomainOverride { domain, ..entry };

        match self.overrides.iter_mut().find(|o| o.domain == entry.domain) {
            Some(existing) => *existing = entry,
            None => self.overrides.push(entry),
        }
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.overrides.iter().map(|o| o.domain.as_str())
    }

    /// Finds the override for `url`, if any.
    pub fn resolve(&self, url: &str) -> Option<&DomainOverride> {
        let host = host_of(url)?;

        if let Some(found) = self.overrides.iter().find(|o| o.domain == host) {
            return Some(found);
        }

        self.overrides.iter().find(|o| {
            host.strip_suffix(o.domain.as_str())
                .is_some_and(|rest| rest.len() > 1 && rest.ends_with('.'))
        })
    }

    pub fn pre_validate(&self, url: &str) -> Verdict {
        match self.resolve(url) {
            Some(entry) => entry.pre_validate(url),
            None => Verdict::allow(),
        }
    }

    /// Runs post-processing for `source_key`, the URL (or origin hint) the
    /// article came from.
    pub fn post_process(&self, source_key: &str, title: String, body: String) -> (String, String) {
        match self.resolve(source_key) {
            Some(entry) => {
                tracing::debug!(domain = %entry.domain, "applying domain post-processing");
                entry.post_process(title, body)
            }
            None => (title, body),
        }
    }
}

/// The lowercase host of `url` without a leading `www.`.
///
/// Returns `None` for anything that is not an absolute URL with a host, which
/// includes local file paths.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;
    Some(normalize_domain(host))
}

fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('.').to_lowercase();
    match domain.strip_prefix("www.") {
        Some(bare) => bare.to_string(),
        None => domain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://sub.substack.com/p/x", Some("substack.com"))]
    #[case("https://substack.com/home", Some("substack.com"))]
    #[case("https://www.cenital.com/una-nota/", Some("cenital.com"))]
    #[case("https://CENITAL.com/", Some("cenital.com"))]
    #[case("https://example.com", None)]
    #[case("https://notsubstack.com/p/x", None)]
    #[case("/home/me/articles/cenital.com.html", None)]
    #[case("", None)]
    fn test_resolve(#[case] url: &str, #[case] expected: Option<&str>) {
        let registry = OverrideRegistry::builtin();
        assert_eq!(registry.resolve(url).map(|o| o.domain.as_str()), expected);
    }

    #[test]
    fn test_substack_refuses() {
        let registry = OverrideRegistry::builtin();
        let verdict = registry.pre_validate("https://someone.substack.com/p/post");

        assert!(!verdict.allowed);
        assert!(verdict.message.unwrap().contains("HTML File"));
    }

    #[test]
    fn test_unregistered_domain_is_allowed() {
        let registry = OverrideRegistry::builtin();
        assert_eq!(registry.pre_validate("https://example.com/a"), Verdict::allow());
    }

    #[test]
    fn test_register_replaces_existing_domain() {
        let mut registry = OverrideRegistry::builtin();
        registry.register(DomainOverride::new("www.Substack.com", OverrideKind::Passthrough));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.domains().collect::<Vec<_>>(), vec!["substack.com", "cenital.com"]);
        assert!(registry.pre_validate("https://a.substack.com/p/x").allowed);
    }

    #[test]
    fn test_exact_match_beats_parent() {
        let mut registry = OverrideRegistry::new();
        registry.register(DomainOverride::new("example.com", OverrideKind::Refuse { message: "parent".into() }));
        registry.register(DomainOverride::new("blog.example.com", OverrideKind::Passthrough));

        assert!(registry.pre_validate("https://blog.example.com/post").allowed);
        assert!(!registry.pre_validate("https://shop.example.com/").allowed);
    }

    #[test]
    fn test_cenital_removes_appeal_and_collapses_blank_lines() {
        let registry = OverrideRegistry::builtin();
        let body = format!("Primer párrafo.\n\n{CENITAL_APPEAL}\n\n\n\nSegundo párrafo.");

        let (title, body) = registry.post_process("https://cenital.com/nota", "Título".into(), body);

        assert_eq!(title, "Título");
        assert_eq!(body, "Primer párrafo.\n\nSegundo párrafo.");
    }

    #[test]
    fn test_cenital_cuts_trailing_section() {
        let registry = OverrideRegistry::builtin();
        let body = "Cuerpo de la nota.\n\nOtras lecturas\n\nUna nota vieja.".to_string();

        let (_, body) = registry.post_process("https://www.cenital.com/nota", "T".into(), body);

        assert_eq!(body, "Cuerpo de la nota.");
    }

    #[test]
    fn test_cenital_leaves_unrelated_body_untouched() {
        let entry = DomainOverride::cenital();
        let body = "Uno.\n\n\n\nDos.".to_string();

        let (_, out) = entry.post_process("T".into(), body.clone());

        assert_eq!(out, body);
    }

    #[test]
    fn test_post_process_without_override_is_identity() {
        let registry = OverrideRegistry::builtin();
        let (title, body) = registry.post_process("/tmp/saved.html", "T".into(), "Otras lecturas".into());
        assert_eq!((title.as_str(), body.as_str()), ("T", "Otras lecturas"));
    }

    #[test]
    fn test_global_is_shared() {
        let a = OverrideRegistry::global();
        let b = OverrideRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.resolve("https://x.substack.com").is_some());
    }
}
