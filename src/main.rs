//! A3S Search Session CLI - inspect engine catalogs and suggestions.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use a3s_search_session::{
    EngineCatalog, HttpSuggestionSource, SuggestionSource, UrlTemplater, DEFAULT_ENDPOINT,
};

/// A3S Search Session - multi-engine search session tooling
#[derive(Parser)]
#[command(name = "a3s-search-session")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog in tab order
    Engines {
        /// Engine catalog (JSON array)
        #[arg(short, long)]
        catalog: PathBuf,
    },

    /// Resolve every engine's URL for a query
    Resolve {
        /// Engine catalog (JSON array)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Search query
        query: String,
    },

    /// Fetch autocomplete suggestions once
    Suggest {
        /// Text to complete
        query: String,

        /// Suggestion endpoint; the encoded query is appended
        #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Request timeout in seconds
        #[arg(short, long, default_value = "5")]
        timeout: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

#[derive(Serialize)]
struct ResolvedEngine<'a> {
    index: usize,
    name: &'a str,
    url: String,
    scheme: Option<String>,
    embeddable: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    match cli.command {
        Commands::Engines { catalog } => list_engines(&EngineCatalog::from_path(catalog)?, cli.format),
        Commands::Resolve { catalog, query } => {
            resolve(&EngineCatalog::from_path(catalog)?, &query, cli.format)
        }
        Commands::Suggest {
            query,
            endpoint,
            timeout,
        } => suggest(&query, endpoint, Duration::from_secs(timeout), cli.format).await,
    }
}

fn list_engines(catalog: &EngineCatalog, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Engines in tab order:\n");
            for (i, engine) in catalog.engines().iter().enumerate() {
                let mut flags = Vec::new();
                if !engine.embeddable {
                    flags.push("external");
                }
                if engine.preload {
                    flags.push("preload");
                }
                println!(
                    "  {:>2}. [{}] {:<20} weight {:<5} {}",
                    i + 1,
                    engine.hotkey,
                    engine.name,
                    engine.weight,
                    flags.join(", ")
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(catalog.engines())?),
    }
    Ok(())
}

fn resolve(catalog: &EngineCatalog, query: &str, format: OutputFormat) -> Result<()> {
    if query.is_empty() {
        anyhow::bail!("Query cannot be empty");
    }

    let resolved: Vec<_> = catalog
        .engines()
        .iter()
        .enumerate()
        .map(|(index, engine)| ResolvedEngine {
            index,
            name: &engine.name,
            url: UrlTemplater::resolve(engine, query),
            scheme: UrlTemplater::resolve_scheme(engine, query),
            embeddable: engine.embeddable,
        })
        .collect();

    match format {
        OutputFormat::Text => {
            for engine in &resolved {
                println!("{}. {}", engine.index + 1, engine.name);
                println!("   URL: {}", engine.url);
                if let Some(scheme) = &engine.scheme {
                    println!("   App: {}", scheme);
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
    }
    Ok(())
}

async fn suggest(query: &str, endpoint: String, timeout: Duration, format: OutputFormat) -> Result<()> {
    let source = HttpSuggestionSource::new(endpoint, timeout)?;
    let suggestions = source.suggest(query).await?;

    match format {
        OutputFormat::Text => {
            if suggestions.options.is_empty() {
                println!("No suggestions for \"{}\"", query);
            }
            for option in &suggestions.options {
                println!("{}", option);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&suggestions.options)?),
    }
    Ok(())
}
