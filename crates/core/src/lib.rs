pub mod article;
pub mod author;
pub mod config;
pub mod epub;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod library;
pub mod mail;
pub mod overrides;
pub mod parse;
pub mod pipeline;
pub mod preprocess;
pub mod publish;
pub mod sanitize;

pub use article::{ExtractedArticle, Source};
pub use author::clean_byline;
pub use config::{MailAccount, Settings};
pub use epub::{BlockKind, classify_block, epub_file_name, write_epub};
pub use error::{QuireError, Result};
#[doc(hidden)]
pub use extract::{ExtractConfig, ExtractedContent, Tier};
pub use extract::{extract_content, structural_tier};
pub use fetch::{Fetch, FetchConfig, fetch_file};
#[cfg(feature = "fetch")]
pub use fetch::{HttpFetcher, fetch_url};
pub use library::{HtmlLibrary, mark_sent};
#[cfg(feature = "email")]
pub use mail::SmtpMailer;
pub use mail::{Envelope, Mailer, email_content};
pub use overrides::{DomainOverride, OverrideKind, OverrideRegistry, Verdict};
pub use parse::Document;
pub use pipeline::Pipeline;
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use publish::{Delivery, Publisher, render_text};
pub use sanitize::sanitize;
