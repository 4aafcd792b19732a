use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use quire_core::fetch::DEFAULT_USER_AGENT;
use quire_core::{
    ExtractConfig, FetchConfig, HtmlLibrary, HttpFetcher, Pipeline, Publisher, Settings, SmtpMailer, Source, render_text,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod echo;
mod interactive;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Send web articles and saved HTML pages to your Kindle as ePub
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(version)]
#[command(about = "Send web articles and saved HTML pages to your Kindle as ePub", long_about = None)]
struct Args {
    /// URL of the article to send (omit for interactive mode)
    #[arg(value_name = "URL", conflicts_with = "file")]
    url: Option<String>,

    /// Path to a local HTML file to send
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Only generate the ePub file, do not send it
    #[arg(long)]
    no_send: bool,

    /// Directory for the ePub file (default: EPUB_OUTPUT_DIR)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Only extract and print the article
    #[arg(long)]
    debug_extraction: bool,

    /// Print the extracted article as JSON and exit
    #[arg(long)]
    json: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Skip the readability pass and use selector-based extraction only
    #[arg(long)]
    no_readability: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "warn,quire_core=debug,quire=debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();
    init_logging(args.verbose);

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    let settings = Settings::from_env();
    tracing::debug!(
        epub_dir = %settings.epub_output_dir.display(),
        html_dir = %settings.html_articles_dir.display(),
        smtp_server = %settings.smtp_server,
        "settings loaded"
    );
    let fetch = FetchConfig {
        timeout: args.timeout,
        user_agent: args.user_agent.clone().unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
    };
    let extract = ExtractConfig { use_readability: !args.no_readability, ..Default::default() };
    let pipeline = Pipeline::new(fetch, extract);

    let source = match (&args.url, &args.file) {
        (Some(url), _) => Source::Url(url.trim().to_string()),
        (None, Some(path)) => Source::File(path.clone()),
        (None, None) => {
            let library = HtmlLibrary::new(settings.html_articles_dir.clone());
            let stdin = io::stdin();
            let mut session =
                interactive::Session::new(pipeline, Publisher::new(settings), library, stdin.lock(), io::stdout());
            return session.run().await;
        }
    };

    run_once(&args, &pipeline, Publisher::new(settings), &source).await
}

async fn run_once(
    args: &Args, pipeline: &Pipeline<HttpFetcher>, publisher: Publisher<SmtpMailer>, source: &Source,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut timings = Vec::new();
    let total_steps = if args.debug_extraction || args.json { 1 } else { 2 };

    if args.verbose {
        let label = match source {
            Source::Url(url) => format!("Fetching {}", url.bright_white().underline()),
            Source::File(path) => format!("Reading {}", path.display().bright_white()),
        };
        echo::print_step(1, total_steps, &label);
    }

    let step = Instant::now();
    let article = match pipeline.run(source).await {
        Ok(article) => article,
        Err(e) => {
            if e.is_retryable() {
                echo::print_warning("The request timed out, try again or raise --timeout");
            }
            return Err(anyhow::Error::new(e).context("Failed to extract article"));
        }
    };
    timings.push(("Extraction", step.elapsed()));

    if args.verbose {
        echo::print_article_details(&article);
    }

    if args.json {
        let json = article.to_json().context("Failed to serialize article")?;
        println!("{:#}", json);
        return Ok(());
    }

    if args.debug_extraction {
        println!("{}", render_text(&article));
        return Ok(());
    }

    let step = Instant::now();
    if args.no_send {
        if args.verbose {
            echo::print_step(2, total_steps, "Generating ePub");
        }

        let path = publisher
            .create_epub(&article, args.output_dir.as_deref())
            .context("Failed to create ePub")?;
        timings.push(("Packaging", step.elapsed()));

        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or_default();
        echo::print_success(&format!(
            "Created ePub file: {} ({})",
            path.display().bright_white(),
            echo::format_size(size)
        ));
        echo::print_info("File was not sent to Kindle as --no-send flag was used.");
    } else {
        if args.verbose {
            echo::print_step(2, total_steps, "Sending to Kindle");
        }
        if args.output_dir.is_some() {
            echo::print_warning("--output-dir only applies together with --no-send");
        }

        let delivery = publisher
            .send_to_device(&article, source.as_file())
            .await
            .context("Failed to send article")?;
        timings.push(("Delivery", step.elapsed()));

        echo::print_success(&format!("Sent '{}' to {}", article.title, delivery.recipient.bright_white()));
        if let Some(renamed) = delivery.marked_file {
            echo::print_info(&format!("Source file renamed to {}", renamed.display()));
        }
    }

    if args.verbose {
        echo::print_timing_summary(start.elapsed(), &timings);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_url_and_file_conflict() {
        let result = Args::try_parse_from(["quire", "https://example.com", "--file", "page.html"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["quire"]).unwrap();
        assert_eq!(args.timeout, 30);
        assert!(args.url.is_none() && args.file.is_none());
        assert!(!args.no_send && !args.no_readability);
    }
}
