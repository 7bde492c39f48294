use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roster_compactor::abbrev::AbbreviationConfig;
use roster_compactor::api::{build_router, state::AppState};
use roster_compactor::classify::classify_text;
use roster_compactor::config::AppConfig;
use roster_compactor::ingest::{ingest_text, IngestOptions, IngestResult};
use roster_compactor::models::FormatId;
use roster_compactor::storage::JsonlWriter;

#[derive(Parser)]
#[command(name = "roster-compactor")]
#[command(about = "Detect, parse and abbreviate pasted Warhammer 40k army lists")]
#[command(version)]
struct Cli {
    /// Path to configuration file (defaults to ./roster-compactor.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the dialect of a list
    Classify {
        /// List file, or "-" for stdin
        input: String,
    },

    /// Parse a list into the canonical tree
    Parse {
        /// List file, or "-" for stdin
        input: String,

        /// Skip detection and parse as this dialect
        #[arg(long)]
        format: Option<FormatId>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the wargear abbreviation index of a list
    Abbreviate {
        /// List file, or "-" for stdin
        input: String,
    },

    /// Ingest every file matching a glob into a JSONL file
    Batch {
        /// Glob pattern, e.g. "lists/**/*.txt"
        pattern: String,

        /// Output JSONL file
        #[arg(long)]
        out: PathBuf,
    },

    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn ingest_options(config: &AppConfig, format_override: Option<FormatId>) -> IngestOptions {
    IngestOptions {
        min_confidence: config.min_confidence,
        format_override,
    }
}

fn run_batch(
    pattern: &str,
    out: PathBuf,
    options: &IngestOptions,
    abbreviations: &AbbreviationConfig,
) -> Result<()> {
    let writer: JsonlWriter<IngestResult> = JsonlWriter::new(out);
    let mut written = 0;
    let mut failed = 0;

    for entry in glob::glob(pattern).with_context(|| format!("Invalid glob '{}'", pattern))? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Skipping unreadable path: {}", e);
                failed += 1;
                continue;
            }
        };
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                failed += 1;
                continue;
            }
        };
        match ingest_text(&text, options, abbreviations) {
            Ok(result) => {
                writer.append(&result)?;
                written += 1;
            }
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", path, e);
                failed += 1;
            }
        }
    }

    tracing::info!(
        "Batch complete: {} written to {:?}, {} skipped",
        written,
        writer.path(),
        failed
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_tracing(&level, cli.json_logs);

    tracing::debug!("Starting roster-compactor v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Classify { input } => {
            let text = read_input(&input)?;
            print_json(&classify_text(&text), true)?;
        }
        Commands::Parse {
            input,
            format,
            pretty,
        } => {
            let text = read_input(&input)?;
            let abbreviations = config.load_abbreviation_config()?;
            let result = ingest_text(&text, &ingest_options(&config, format), &abbreviations)?;
            print_json(&result, pretty)?;
        }
        Commands::Abbreviate { input } => {
            let text = read_input(&input)?;
            let abbreviations = config.load_abbreviation_config()?;
            let result = ingest_text(&text, &ingest_options(&config, None), &abbreviations)?;
            print_json(&result.abbreviations, true)?;
        }
        Commands::Batch { pattern, out } => {
            let abbreviations = config.load_abbreviation_config()?;
            run_batch(&pattern, out, &ingest_options(&config, None), &abbreviations)?;
        }
        Commands::Serve { host, port } => {
            let abbreviations = config.load_abbreviation_config()?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let app = build_router(AppState::new(&config, abbreviations));
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
