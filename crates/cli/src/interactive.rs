//! The menu-driven session started when no source is given on the command line.
//!
//! Input and output are generic so the whole dialog can be driven from a
//! buffer. End of input always ends the session cleanly.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use quire_core::{ExtractedArticle, HtmlLibrary, HttpFetcher, Pipeline, Publisher, Source, SmtpMailer, render_text};

const SOURCES: [&str; 2] = ["URL", "HTML File"];
const OUTPUTS: [&str; 3] = ["Print to Console", "Generate ePub", "Send to Kindle"];

/// The article being worked on.
struct Current {
    article: ExtractedArticle,
    file: Option<PathBuf>,
}

enum Next {
    Continue,
    NewArticle,
    Exit,
}

pub struct Session<R, W> {
    pipeline: Pipeline<HttpFetcher>,
    publisher: Publisher<SmtpMailer>,
    library: HtmlLibrary,
    input: R,
    output: W,
    current: Option<Current>,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(
        pipeline: Pipeline<HttpFetcher>, publisher: Publisher<SmtpMailer>, library: HtmlLibrary, input: R, output: W,
    ) -> Self {
        Self { pipeline, publisher, library, input, output, current: None }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.print_welcome()?;

        loop {
            if self.current.is_none() {
                match self.choose_source().await? {
                    Some(current) => self.current = Some(current),
                    None => return Ok(()),
                }
            }

            match self.main_menu().await? {
                Next::Continue => {}
                Next::NewArticle => self.current = None,
                Next::Exit => return Ok(()),
            }
        }
    }

    fn print_welcome(&mut self) -> anyhow::Result<()> {
        writeln!(self.output, "\n===== Kindle Article Sender =====")?;
        writeln!(self.output, "\nUsage Instructions:")?;
        writeln!(self.output, "  Interactive Mode: quire")?;
        writeln!(self.output, "  Command Line Mode: quire [URL] [options]")?;
        writeln!(self.output, "  Help: quire --help")?;
        Ok(())
    }

    /// Writes `text` and reads one trimmed line; `None` at end of input.
    fn prompt(&mut self, text: &str) -> anyhow::Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn choose_source(&mut self) -> anyhow::Result<Option<Current>> {
        let exit = SOURCES.len() + 1;

        loop {
            writeln!(self.output, "\nHow would you like to import an article?")?;
            for (i, name) in SOURCES.iter().enumerate() {
                writeln!(self.output, "{}. From a {}", i + 1, name)?;
            }
            writeln!(self.output, "{}. Exit", exit)?;

            let Some(choice) = self.prompt(&format!("\nEnter your choice (1-{}): ", exit))? else {
                return Ok(None);
            };

            match choice.parse::<usize>() {
                Ok(1) => {
                    if let Some(current) = self.from_url().await? {
                        return Ok(Some(current));
                    }
                }
                Ok(2) => match self.from_file().await? {
                    Pick::Chosen(current) => return Ok(Some(current)),
                    Pick::Back => {}
                    Pick::Eof => return Ok(None),
                },
                Ok(n) if n == exit => {
                    writeln!(self.output, "Exiting.")?;
                    return Ok(None);
                }
                Ok(_) => writeln!(self.output, "Invalid choice. Please try again.")?,
                Err(_) => writeln!(self.output, "Invalid choice. Please enter a number.")?,
            }
        }
    }

    async fn from_url(&mut self) -> anyhow::Result<Option<Current>> {
        let Some(url) = self.prompt("\nEnter article URL: ")? else {
            return Ok(None);
        };
        if url.is_empty() {
            writeln!(self.output, "No URL provided. Returning to source selection.")?;
            return Ok(None);
        }

        self.extract(Source::Url(url)).await
    }

    async fn from_file(&mut self) -> anyhow::Result<Pick> {
        let files = match self.library.list() {
            Ok(files) => files,
            Err(e) => {
                writeln!(self.output, "\nError: {}", e)?;
                return Ok(Pick::Back);
            }
        };

        if files.is_empty() {
            writeln!(
                self.output,
                "\nNo HTML files found in {}. Save articles there and try again.",
                self.library.dir().display()
            )?;
            return Ok(Pick::Back);
        }

        writeln!(self.output, "\nAvailable HTML files:")?;
        for (i, path) in files.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, display_name(path))?;
        }

        loop {
            let Some(choice) = self.prompt("\nEnter file number (0 to go back): ")? else {
                return Ok(Pick::Eof);
            };

            match choice.parse::<usize>() {
                Ok(0) => return Ok(Pick::Back),
                Ok(n) if n <= files.len() => {
                    let path = files[n - 1].clone();
                    return Ok(match self.extract(Source::File(path)).await? {
                        Some(current) => Pick::Chosen(current),
                        None => Pick::Back,
                    });
                }
                Ok(_) => writeln!(self.output, "Invalid selection. Please try again.")?,
                Err(_) => writeln!(self.output, "Invalid input. Please enter a number.")?,
            }
        }
    }

    async fn extract(&mut self, source: Source) -> anyhow::Result<Option<Current>> {
        match self.pipeline.run(&source).await {
            Ok(article) => {
                writeln!(self.output, "\nSuccessfully extracted: '{}'", article.title)?;
                Ok(Some(Current { article, file: source.as_file().map(Path::to_path_buf) }))
            }
            Err(e) => {
                writeln!(self.output, "\nError: {}", e)?;
                if e.is_network() {
                    writeln!(self.output, "Check the address and your connection, then try again.")?;
                }
                Ok(None)
            }
        }
    }

    async fn main_menu(&mut self) -> anyhow::Result<Next> {
        let new_article = OUTPUTS.len() + 1;
        let exit = OUTPUTS.len() + 2;

        writeln!(self.output, "\nWhat would you like to do?")?;
        for (i, name) in OUTPUTS.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, name)?;
        }
        writeln!(self.output, "{}. Work on a new article", new_article)?;
        writeln!(self.output, "{}. Exit", exit)?;

        let Some(choice) = self.prompt(&format!("\nEnter your choice (1-{}): ", exit))? else {
            return Ok(Next::Exit);
        };

        match choice.parse::<usize>() {
            Ok(1) => self.print_article()?,
            Ok(2) => {
                if !self.generate_epub()? {
                    return Ok(Next::Exit);
                }
            }
            Ok(3) => self.send_to_device().await?,
            Ok(n) if n == new_article => return Ok(Next::NewArticle),
            Ok(n) if n == exit => {
                writeln!(self.output, "Exiting.")?;
                return Ok(Next::Exit);
            }
            Ok(_) => {
                writeln!(self.output, "Invalid choice. Please try again.")?;
                return Ok(Next::Continue);
            }
            Err(_) => {
                writeln!(self.output, "Invalid choice. Please enter a number.")?;
                return Ok(Next::Continue);
            }
        }

        writeln!(self.output)?;
        match self.prompt("Press Enter to continue or type 'exit' to quit: ")? {
            Some(answer) if !answer.eq_ignore_ascii_case("exit") => Ok(Next::Continue),
            _ => Ok(Next::Exit),
        }
    }

    fn print_article(&mut self) -> anyhow::Result<()> {
        if let Some(current) = &self.current {
            writeln!(self.output, "\n{}", render_text(&current.article))?;
        }
        Ok(())
    }

    /// Returns `false` when input ended at the directory prompt.
    fn generate_epub(&mut self) -> anyhow::Result<bool> {
        let Some(dir) = self.prompt("Enter output directory (or press Enter for the default directory): ")? else {
            return Ok(false);
        };
        let Some(current) = &self.current else {
            return Ok(true);
        };

        let output_dir = if dir.is_empty() { None } else { Some(PathBuf::from(dir)) };
        match self.publisher.create_epub(&current.article, output_dir.as_deref()) {
            Ok(path) => writeln!(self.output, "Created ePub file: {}", path.display())?,
            Err(e) => writeln!(self.output, "\nError: {}", e)?,
        }
        Ok(true)
    }

    async fn send_to_device(&mut self) -> anyhow::Result<()> {
        let Some(current) = &mut self.current else {
            return Ok(());
        };

        match self.publisher.send_to_device(&current.article, current.file.as_deref()).await {
            Ok(delivery) => {
                writeln!(self.output, "Sent '{}' to {}", current.article.title, delivery.recipient)?;
                if let Some(renamed) = delivery.marked_file {
                    writeln!(self.output, "Source file renamed to {}", display_name(&renamed))?;
                    current.file = Some(renamed);
                }
            }
            Err(e) => writeln!(self.output, "\nError: {}", e)?,
        }
        Ok(())
    }
}

enum Pick {
    Chosen(Current),
    Back,
    Eof,
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
