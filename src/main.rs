// src/main.rs

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod crawler;
mod indexer;
mod searcher;

use config::Config;
use crawler::Crawler;
use crawler::fetcher::{ComicSource, XkcdClient};
use indexer::schema::Comic;
use indexer::store::IndexStore;
use indexer::{Indexer, Window};
use searcher::SearchField;

#[derive(Parser)]
#[command(name = "comic_search", version, about = "Index xkcd comics and search their transcripts")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    config: Config,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch comics that are not indexed yet
    Index {
        /// How many of the most recent comics to index, or `all`
        #[arg(allow_hyphen_values = true)]
        window: Option<String>,
    },
    /// Print every indexed comic containing a phrase
    Search {
        /// Case-sensitive phrase to look for
        #[arg(allow_hyphen_values = true)]
        phrase: String,

        /// Which part of the comic to match against
        #[arg(long, value_enum, default_value_t = SearchField::Transcript)]
        field: SearchField,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// The main entry point, which dispatches to the correct mode (index or search).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let client = XkcdClient::new(cli.config.base_url.clone(), cli.config.timeout())
        .context("Failed to build HTTP client")?;

    run(cli, Arc::new(client), &mut io::stdout().lock()).await
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "comic_search=debug" } else { "comic_search=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(io::stderr)
        .init();
}

/// Loads the index, runs the command, then saves the index whatever the command did.
async fn run(cli: Cli, source: Arc<dyn ComicSource>, out: &mut impl Write) -> Result<()> {
    let mut store = IndexStore::open_or_create(&cli.config.index_path)
        .context("Unable to load index from file")?;

    let outcome = match cli.command {
        Command::Index { window } => {
            let window = window.as_deref().map(Window::parse).unwrap_or_default();
            info!("the current command is 'index' with window '{}'", window);
            let crawler = Crawler::new(source, usize::from(cli.config.concurrency));
            run_indexer(crawler, window, &mut store).await
        }
        Command::Search { phrase, field, format } => {
            info!("the current command is 'search' with search phrase '{}'", phrase);
            run_searcher(&store, &phrase, field, format, out)
        }
    };

    store
        .save()
        .with_context(|| format!("Error writing index to {}", store.path().display()))?;

    outcome
}

/// Fetches the requested window of comics into the store.
async fn run_indexer(crawler: Crawler, window: Window, store: &mut IndexStore) -> Result<()> {
    let report = Indexer::new(crawler).run(window, store).await?;

    info!(
        "Indexing complete up to comic {}: {} new, {} already indexed, {} failed. {} comics in the index.",
        report.latest,
        report.fetched,
        report.skipped,
        report.failed.len(),
        store.len()
    );
    if !report.failed.is_empty() {
        warn!("Could not index comics: {:?}", report.failed);
    }
    Ok(())
}

/// Searches the store and prints the hits to `out`.
fn run_searcher(
    store: &IndexStore,
    phrase: &str,
    field: SearchField,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    if store.is_empty() {
        warn!("The index is empty, run the indexer first with: `comic_search index`");
    }

    let hits = searcher::search(store, phrase, field)?;
    if hits.is_empty() {
        info!("No results found for '{}'", phrase);
    }

    match format {
        OutputFormat::Text => write_text(&mut *out, phrase, &hits)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &hits)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn write_text(out: &mut impl Write, phrase: &str, hits: &[&Comic]) -> io::Result<()> {
    for comic in hits {
        writeln!(
            out,
            "Found '{}' in comic {}, with transcript:\n \"{}\"\n",
            phrase, comic.num, comic.transcript
        )?;
    }
    Ok(())
}
